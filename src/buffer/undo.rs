//! 編集記録
//!
//! 挿入・削除ごとに取り消し可能な記録を作る。取り消しとやり直しは通常の編集と同じ
//! `replace` を経由するため、位置ハンドルも通常の編集と同じように調整される。

use crate::buffer::content::GapContent;
use crate::error::{undo, UndoError};

/// 一回の編集を表す記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoRecord {
    /// `offset` に `length` 文字を挿入した
    Insert { offset: usize, length: usize },
    /// `offset` から `removed_text` を削除した
    Delete { offset: usize, removed_text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditState {
    Done,
    Undone,
}

/// 取り消し・やり直しが可能な編集ハンドル
#[derive(Debug)]
pub struct EditHandle {
    content: GapContent,
    record: UndoRecord,
    state: EditState,
    /// 挿入の取り消し時に取り除いた文字列（やり直しで再挿入する）
    undone_text: Option<String>,
}

impl EditHandle {
    pub(crate) fn new(content: GapContent, record: UndoRecord) -> Self {
        Self {
            content,
            record,
            state: EditState::Done,
            undone_text: None,
        }
    }

    /// 編集記録
    pub fn record(&self) -> &UndoRecord {
        &self.record
    }

    pub fn can_undo(&self) -> bool {
        self.state == EditState::Done
    }

    pub fn can_redo(&self) -> bool {
        self.state == EditState::Undone
    }

    /// 編集を取り消す
    pub fn undo(&mut self) -> undo::Result<()> {
        if !self.can_undo() {
            return Err(UndoError::CannotUndo);
        }
        match &self.record {
            UndoRecord::Insert { offset, length } => {
                let removed = self.content.remove_chars(*offset, *length)?;
                self.undone_text = Some(removed);
            }
            UndoRecord::Delete {
                offset,
                removed_text,
            } => {
                let chars: Vec<char> = removed_text.chars().collect();
                self.content.insert_chars(*offset, &chars)?;
            }
        }
        self.state = EditState::Undone;
        Ok(())
    }

    /// 取り消した編集をやり直す
    pub fn redo(&mut self) -> undo::Result<()> {
        if !self.can_redo() {
            return Err(UndoError::CannotRedo);
        }
        match &self.record {
            UndoRecord::Insert { offset, .. } => {
                let text = self.undone_text.take().unwrap_or_default();
                let chars: Vec<char> = text.chars().collect();
                if let Err(error) = self.content.insert_chars(*offset, &chars) {
                    self.undone_text = Some(text);
                    return Err(error.into());
                }
            }
            UndoRecord::Delete {
                offset,
                removed_text,
            } => {
                self.content
                    .remove_chars(*offset, removed_text.chars().count())?;
            }
        }
        self.state = EditState::Done;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContentError;

    #[test]
    fn test_insert_record() {
        let content = GapContent::from_str("abc");
        let edit = content.insert(1, "XYZ").unwrap();
        assert_eq!(
            edit.record(),
            &UndoRecord::Insert {
                offset: 1,
                length: 3
            }
        );
    }

    #[test]
    fn test_delete_record_captures_text() {
        let content = GapContent::from_str("abcdef");
        let edit = content.delete(2, 3).unwrap();
        assert_eq!(
            edit.record(),
            &UndoRecord::Delete {
                offset: 2,
                removed_text: "cde".to_string()
            }
        );
        assert_eq!(content.text(), "abf");
    }

    #[test]
    fn test_undo_redo_insert() {
        let content = GapContent::from_str("abc");
        let mut edit = content.insert(3, "def").unwrap();

        edit.undo().unwrap();
        assert_eq!(content.text(), "abc");
        edit.redo().unwrap();
        assert_eq!(content.text(), "abcdef");
    }

    #[test]
    fn test_double_undo_is_rejected() {
        let content = GapContent::from_str("abc");
        let mut edit = content.delete(0, 1).unwrap();

        assert_eq!(edit.redo(), Err(UndoError::CannotRedo));
        edit.undo().unwrap();
        assert_eq!(edit.undo(), Err(UndoError::CannotUndo));
        assert_eq!(content.text(), "abc");
    }

    #[test]
    fn test_undo_fails_when_range_vanished() {
        let content = GapContent::from_str("abc");
        let mut edit = content.insert(3, "def").unwrap();
        content.delete(0, 6).unwrap();

        assert_eq!(
            edit.undo(),
            Err(UndoError::Content(ContentError::OutOfRange { index: 3, bound: 0 }))
        );
        assert!(edit.can_undo());
    }
}
