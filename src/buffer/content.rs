//! 編集可能なテキスト内容
//!
//! ギャップバッファ・マークテーブル・位置ハンドル管理を一つのロックでまとめた公開API。
//! 変更と位置登録は書き込みロック、読み取りは読み取りロックの下で行う。

use std::sync::Arc;

use parking_lot::RwLock;

use crate::buffer::marks::MarkTable;
use crate::buffer::position::{Position, PositionRegistry};
use crate::buffer::store::BufferStore;
use crate::buffer::undo::{EditHandle, UndoRecord};
use crate::config::GapContentOptions;
use crate::error::Result;

/// ロックで保護されるバッファ状態
#[derive(Debug)]
pub(crate) struct ContentState {
    pub(crate) store: BufferStore,
    pub(crate) marks: MarkTable,
    pub(crate) registry: PositionRegistry,
}

impl ContentState {
    fn new(store: BufferStore) -> Self {
        Self {
            store,
            marks: MarkTable::new(),
            registry: PositionRegistry::new(),
        }
    }

    fn insert_chars(&mut self, offset: usize, chars: &[char]) -> Result<()> {
        self.store.replace(&mut self.marks, offset, 0, chars)
    }

    fn remove_chars(&mut self, offset: usize, len: usize) -> Result<String> {
        let removed: String = self.store.read(offset, len)?.iter().collect();
        self.store.replace(&mut self.marks, offset, len, &[])?;
        Ok(removed)
    }
}

pub(crate) type SharedState = Arc<RwLock<ContentState>>;

/// ギャップバッファによるテキスト内容
///
/// `Clone` は同じ内容を共有するハンドルを作る。
#[derive(Debug, Clone)]
pub struct GapContent {
    state: SharedState,
}

impl GapContent {
    /// 空の内容を作成
    pub fn new() -> Self {
        Self::with_options(GapContentOptions::default())
    }

    /// オプションを指定して空の内容を作成
    pub fn with_options(options: GapContentOptions) -> Self {
        Self::from_store(BufferStore::new(options))
    }

    /// 文字列から内容を作成
    pub fn from_str(text: &str) -> Self {
        Self::from_str_with_options(text, GapContentOptions::default())
    }

    /// オプションを指定して文字列から内容を作成
    pub fn from_str_with_options(text: &str, options: GapContentOptions) -> Self {
        Self::from_store(BufferStore::from_str(text, options))
    }

    fn from_store(store: BufferStore) -> Self {
        Self {
            state: Arc::new(RwLock::new(ContentState::new(store))),
        }
    }

    /// 論理長（文字数）
    pub fn length(&self) -> usize {
        self.state.read().store.length()
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// 指定範囲の文字列を取得
    pub fn read(&self, offset: usize, len: usize) -> Result<String> {
        let state = self.state.read();
        let chars = state.store.read(offset, len)?;
        Ok(chars.iter().collect())
    }

    /// 指定範囲の文字を読み取りロック下で参照する
    ///
    /// 範囲がギャップをまたがなければ内部配列をコピーせずに渡す。
    pub fn with_chars<R>(&self, offset: usize, len: usize, f: impl FnOnce(&[char]) -> R) -> Result<R> {
        let state = self.state.read();
        let chars = state.store.read(offset, len)?;
        Ok(f(&chars))
    }

    /// 全文を取得
    pub fn text(&self) -> String {
        self.state.read().store.to_string()
    }

    /// 文字列を挿入し、取り消し用のハンドルを返す
    pub fn insert(&self, offset: usize, text: &str) -> Result<EditHandle> {
        let chars: Vec<char> = text.chars().collect();
        self.insert_chars(offset, &chars)?;
        Ok(EditHandle::new(
            self.clone(),
            UndoRecord::Insert {
                offset,
                length: chars.len(),
            },
        ))
    }

    /// 文字列を削除し、取り消し用のハンドルを返す
    pub fn delete(&self, offset: usize, len: usize) -> Result<EditHandle> {
        let removed_text = self.remove_chars(offset, len)?;
        Ok(EditHandle::new(
            self.clone(),
            UndoRecord::Delete {
                offset,
                removed_text,
            },
        ))
    }

    pub(crate) fn insert_chars(&self, offset: usize, chars: &[char]) -> Result<()> {
        self.state.write().insert_chars(offset, chars)
    }

    pub(crate) fn remove_chars(&self, offset: usize, len: usize) -> Result<String> {
        self.state.write().remove_chars(offset, len)
    }

    /// 編集に追従する位置ハンドルを作成
    ///
    /// 同じ論理オフセットの生存中ハンドルがあれば、そのマークを共有する。
    pub fn create_position(&self, offset: usize) -> Result<Position> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let mark = state
            .registry
            .register(&state.store, &mut state.marks, offset)?;
        let released = state.registry.release_sender();
        drop(guard);
        Ok(Position::new(mark, Arc::clone(&self.state), released))
    }

    /// 解放済みの位置ハンドルを処理し、取り除いたマーク数を返す
    pub fn release_pending(&self) -> usize {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state.registry.release_pending(&mut state.marks)
    }

    /// 範囲 `[offset, offset + len)` にある生存中の位置の論理オフセット
    pub fn positions_in_range(&self, offset: usize, len: usize) -> Vec<usize> {
        let state = self.state.read();
        let (gap_start, gap_end) = (state.store.gap_start(), state.store.gap_end());
        let end = offset.saturating_add(len);
        state
            .marks
            .iter()
            .map(|mark| mark.logical_offset(gap_start, gap_end))
            .filter(|&logical| logical >= offset && logical < end)
            .collect()
    }

    /// マークテーブルの大きさ
    pub fn mark_count(&self) -> usize {
        self.state.read().marks.len()
    }

    pub fn gap_start(&self) -> usize {
        self.state.read().store.gap_start()
    }

    pub fn gap_end(&self) -> usize {
        self.state.read().store.gap_end()
    }

    /// 内部配列の長さ
    pub fn array_length(&self) -> usize {
        self.state.read().store.array_length()
    }

    /// デバッグ用の内部表示
    pub fn dump(&self) -> String {
        let state = self.state.read();
        format!("{} marks={:?}", state.store.dump(), state.marks.raw_offsets())
    }
}

impl Default for GapContent {
    fn default() -> Self {
        Self::new()
    }
}
