//! エラーハンドリング
//!
//! ギャップバッファ全体で使用されるエラー型を定義する。
//! 失敗する操作はすべて変更前に検査されるため、エラー時にバッファが部分的に書き換わることはない。

use thiserror::Error;

/// コンテンツ操作のエラー型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// 指定位置がバッファの範囲外
    #[error("Offset {index} is out of range (length {bound})")]
    OutOfRange { index: usize, bound: usize },
}

impl ContentError {
    pub(crate) fn out_of_range(index: usize, bound: usize) -> Self {
        ContentError::OutOfRange { index, bound }
    }
}

/// 取り消し・やり直し操作のエラー型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UndoError {
    /// 既に取り消し済みの編集を再度取り消そうとした
    #[error("Edit cannot be undone")]
    CannotUndo,

    /// 適用中の編集をやり直そうとした
    #[error("Edit cannot be redone")]
    CannotRedo,

    /// 記録された範囲が現在の内容と一致しない
    #[error("Content operation failed: {0}")]
    Content(#[from] ContentError),
}

/// プロジェクト標準のResult型
pub type Result<T> = std::result::Result<T, ContentError>;

/// 取り消し操作用のResult型
pub mod undo {
    pub type Result<T> = std::result::Result<T, super::UndoError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let error = ContentError::out_of_range(12, 5);
        assert_eq!(error.to_string(), "Offset 12 is out of range (length 5)");
    }

    #[test]
    fn test_content_error_converts_into_undo_error() {
        let error: UndoError = ContentError::out_of_range(3, 2).into();
        match error {
            UndoError::Content(ContentError::OutOfRange { index, bound }) => {
                assert_eq!(index, 3);
                assert_eq!(bound, 2);
            }
            _ => panic!("Expected Content error"),
        }
    }
}
