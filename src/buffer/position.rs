//! 位置ハンドル管理
//!
//! 編集に追従する論理オフセットのハンドル（`Position`）を発行する。
//! ハンドルはマークを共有し、解放はキューに積まれて次の登録時にまとめて処理される。

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use crate::buffer::content::SharedState;
use crate::buffer::marks::{Mark, MarkTable};
use crate::buffer::store::BufferStore;
use crate::error::{ContentError, Result};

/// 編集に追従する位置ハンドル
///
/// 同じ論理オフセットのハンドルは一つのマークを共有する。
/// `release` またはドロップで解放され、マークの参照数は次の
/// [`PositionRegistry::release_pending`] で減らされる。
pub struct Position {
    mark: Option<Arc<Mark>>,
    state: SharedState,
    released: Sender<Arc<Mark>>,
}

impl Position {
    pub(crate) fn new(mark: Arc<Mark>, state: SharedState, released: Sender<Arc<Mark>>) -> Self {
        Self {
            mark: Some(mark),
            state,
            released,
        }
    }

    /// 現在の論理オフセット
    pub fn offset(&self) -> usize {
        let state = self.state.read();
        match &self.mark {
            Some(mark) => mark.logical_offset(state.store.gap_start(), state.store.gap_end()),
            None => 0,
        }
    }

    /// 他のハンドルと同じマークを共有しているか
    pub fn shares_mark_with(&self, other: &Position) -> bool {
        match (&self.mark, &other.mark) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// ハンドルを明示的に解放する
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for Position {
    fn drop(&mut self) {
        if let Some(mark) = self.mark.take() {
            // 受信側はバッファ状態と同じ寿命なので送信は失敗しない
            let _ = self.released.send(mark);
        }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Position");
        if let Some(mark) = &self.mark {
            debug.field("raw", &mark.raw()).field("refs", &mark.ref_count());
        }
        debug.finish()
    }
}

/// 位置ハンドルの登録と解放キューの管理
#[derive(Debug)]
pub struct PositionRegistry {
    sender: Sender<Arc<Mark>>,
    receiver: Receiver<Arc<Mark>>,
}

impl PositionRegistry {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    /// 解放通知の送信側
    pub(crate) fn release_sender(&self) -> Sender<Arc<Mark>> {
        self.sender.clone()
    }

    /// 解放待ちのハンドル数
    pub fn pending_len(&self) -> usize {
        self.receiver.len()
    }

    /// `offset` を指すマークを取得する
    ///
    /// 既存の生存中マークが同じ論理オフセットを指していればそれを共有し、
    /// 無ければ新しいマークを挿入する。生存中のマーク数に比例する走査を行う。
    pub fn register(
        &mut self,
        store: &BufferStore,
        marks: &mut MarkTable,
        offset: usize,
    ) -> Result<Arc<Mark>> {
        let length = store.length();
        if offset > length {
            return Err(ContentError::out_of_range(offset, length));
        }

        self.release_pending(marks);

        let (gap_start, gap_end) = (store.gap_start(), store.gap_end());
        let existing = marks
            .iter()
            .find(|mark| mark.logical_offset(gap_start, gap_end) == offset)
            .cloned();

        let mark = match existing {
            Some(mark) => marks.share(&mark),
            None => marks.acquire(store.raw_offset_for_mark(offset)),
        };
        Ok(mark)
    }

    /// 解放済みハンドルをまとめて処理し、表から取り除いたマーク数を返す
    pub fn release_pending(&mut self, marks: &mut MarkTable) -> usize {
        let drained: Vec<Arc<Mark>> = self.receiver.try_iter().collect();
        if drained.is_empty() {
            return 0;
        }
        let handles = drained.len();
        let removed = marks.release_pending(drained);
        log::debug!(
            "drained {} released positions, removed {} marks",
            handles,
            removed
        );
        removed
    }
}

impl Default for PositionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GapContentOptions;

    fn setup(text: &str) -> (BufferStore, MarkTable, PositionRegistry) {
        (
            BufferStore::from_str(text, GapContentOptions::default()),
            MarkTable::new(),
            PositionRegistry::new(),
        )
    }

    #[test]
    fn test_register_shares_existing_mark() {
        let (store, mut marks, mut registry) = setup("hello");
        let first = registry.register(&store, &mut marks, 2).unwrap();
        let second = registry.register(&store, &mut marks, 2).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.ref_count(), 2);
        assert_eq!(marks.len(), 1);
    }

    #[test]
    fn test_register_rejects_offset_past_end() {
        let (store, mut marks, mut registry) = setup("abc");
        let error = registry.register(&store, &mut marks, 4).unwrap_err();
        assert_eq!(error, ContentError::OutOfRange { index: 4, bound: 3 });
        assert!(marks.is_empty());
    }

    #[test]
    fn test_release_is_deferred_until_drained() {
        let (store, mut marks, mut registry) = setup("abc");
        let mark = registry.register(&store, &mut marks, 1).unwrap();

        registry.release_sender().send(mark).unwrap();
        assert_eq!(registry.pending_len(), 1);
        assert_eq!(marks.len(), 1);

        assert_eq!(registry.release_pending(&mut marks), 1);
        assert_eq!(registry.pending_len(), 0);
        assert!(marks.is_empty());
    }

    #[test]
    fn test_register_drains_pending_releases_first() {
        let (store, mut marks, mut registry) = setup("abcdef");
        let old = registry.register(&store, &mut marks, 1).unwrap();
        registry.release_sender().send(old).unwrap();

        let fresh = registry.register(&store, &mut marks, 4).unwrap();
        assert_eq!(marks.len(), 1);
        assert_eq!(fresh.ref_count(), 1);
    }
}
