//! バッファ管理モジュール
//!
//! ギャップバッファ、位置マーク、位置ハンドル、編集記録を提供

pub mod content;
pub mod marks;
pub mod position;
pub mod store;
pub mod undo;

// 公開API
pub use content::GapContent;
pub use marks::{Mark, MarkTable};
pub use position::{Position, PositionRegistry};
pub use store::BufferStore;
pub use undo::{EditHandle, UndoRecord};
