//! gapcontent - 編集可能なテキスト文書のための文字格納エンジン
//!
//! ギャップバッファ上で、編集に追従する位置ハンドルと取り消し可能な編集記録を提供する。

// コアモジュール
pub mod config;
pub mod error;
pub mod logging;

// データ層
pub mod buffer;

// 公開API
pub use buffer::{EditHandle, GapContent, Position, UndoRecord};
pub use config::GapContentOptions;
pub use error::{ContentError, Result, UndoError};
