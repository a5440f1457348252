//! ギャップバッファ実装
//!
//! 文字配列とギャップ（空き領域）を保持し、すべての変更を `replace` に集約する。
//! ギャップの移動・拡張・再確保のたびに、影響を受ける範囲のマークを `MarkTable` で調整する。

use std::borrow::Cow;

use crate::buffer::marks::MarkTable;
use crate::config::GapContentOptions;
use crate::error::{ContentError, Result};

/// ギャップ領域を埋める値
const GAP_FILL: char = '\0';

/// ギャップバッファ構造体
///
/// 生オフセット `[gap_start, gap_end)` が未使用領域。
/// 論理オフセット `o` は `o < gap_start` なら `o`、それ以外は `o + ギャップサイズ` に対応する。
#[derive(Debug, Clone)]
pub struct BufferStore {
    /// 内部バッファ（ギャップを含む）
    buffer: Vec<char>,
    /// ギャップの開始位置
    gap_start: usize,
    /// ギャップの終了位置（排他的）
    gap_end: usize,
    /// 拡張ポリシー
    options: GapContentOptions,
}

impl BufferStore {
    /// 空のバッファを作成
    pub fn new(options: GapContentOptions) -> Self {
        let capacity = options.effective_capacity();
        Self {
            buffer: vec![GAP_FILL; capacity],
            gap_start: 0,
            gap_end: capacity,
            options,
        }
    }

    /// 文字列からバッファを作成
    ///
    /// ギャップは内容の末尾に置かれる。
    pub fn from_str(text: &str, options: GapContentOptions) -> Self {
        let mut buffer: Vec<char> = text.chars().collect();
        let len = buffer.len();
        buffer.resize(len + options.effective_capacity(), GAP_FILL);
        Self {
            gap_end: buffer.len(),
            buffer,
            gap_start: len,
            options,
        }
    }

    /// 論理長（ギャップを除いた文字数）
    pub fn length(&self) -> usize {
        self.buffer.len() - self.gap_size()
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// 現在のギャップサイズ
    pub fn gap_size(&self) -> usize {
        self.gap_end - self.gap_start
    }

    pub fn gap_start(&self) -> usize {
        self.gap_start
    }

    pub fn gap_end(&self) -> usize {
        self.gap_end
    }

    /// 内部配列の長さ（容量）
    pub fn array_length(&self) -> usize {
        self.buffer.len()
    }

    /// 論理オフセットをマーク用の生オフセットに変換
    ///
    /// 0 は常に生オフセット 0（文書先頭の番兵）になる。
    pub fn raw_offset_for_mark(&self, offset: usize) -> usize {
        if offset >= self.gap_start && offset != 0 {
            offset + self.gap_size()
        } else {
            offset
        }
    }

    /// 指定範囲の文字を取得
    ///
    /// 範囲がギャップをまたがない場合は内部配列を借用し、またぐ場合はコピーを返す。
    pub fn read(&self, offset: usize, len: usize) -> Result<Cow<'_, [char]>> {
        let length = self.length();
        if len == 0 {
            if offset > length {
                return Err(ContentError::out_of_range(offset, length));
            }
            return Ok(Cow::Borrowed(&[]));
        }
        if offset >= length {
            return Err(ContentError::out_of_range(offset, length));
        }
        let end = checked_end(offset, len, length)?;

        if offset < self.gap_start && self.gap_start < end {
            let mut copy = Vec::with_capacity(len);
            copy.extend_from_slice(&self.buffer[offset..self.gap_start]);
            copy.extend_from_slice(&self.buffer[self.gap_end..self.gap_end + (end - self.gap_start)]);
            Ok(Cow::Owned(copy))
        } else {
            let raw = if offset < self.gap_start {
                offset
            } else {
                offset + self.gap_size()
            };
            Ok(Cow::Borrowed(&self.buffer[raw..raw + len]))
        }
    }

    /// 全文を文字列として取得
    pub fn to_string(&self) -> String {
        self.buffer[..self.gap_start]
            .iter()
            .chain(self.buffer[self.gap_end..].iter())
            .collect()
    }

    /// 唯一の変更操作
    ///
    /// `position` から `remove_size` 文字を削除し、`items` を挿入する。
    /// 範囲外の指定は何も変更せずにエラーを返す。
    pub fn replace(
        &mut self,
        marks: &mut MarkTable,
        position: usize,
        remove_size: usize,
        items: &[char],
    ) -> Result<()> {
        let length = self.length();
        if position > length {
            return Err(ContentError::out_of_range(position, length));
        }
        checked_end(position, remove_size, length)?;

        if self.gap_start != position {
            self.shift_gap(marks, position);
        }

        if remove_size > 0 {
            self.shift_gap_end_up(marks, self.gap_end + remove_size);
        }

        // ギャップを使い切らないよう、挿入サイズ以下なら再確保する
        if self.gap_size() <= items.len() {
            let new_size = self
                .options
                .grown_gap_size(items.len(), self.gap_size(), self.gap_end);
            self.shift_end(marks, new_size);
        }

        if !items.is_empty() {
            let start = self.gap_start;
            self.buffer[start..start + items.len()].copy_from_slice(items);
            self.gap_start += items.len();
        }

        debug_assert!(self.gap_start < self.gap_end);
        Ok(())
    }

    /// ギャップを `new_gap_start` に移動
    ///
    /// 間にある文字をギャップの反対側へコピーし、その範囲のマークをギャップサイズ分ずらす。
    fn shift_gap(&mut self, marks: &mut MarkTable, new_gap_start: usize) {
        if new_gap_start == self.gap_start {
            return;
        }
        let gap = self.gap_size();
        let new_gap_end = new_gap_start + gap;

        if new_gap_start < self.gap_start {
            marks.shift_range(new_gap_start, Some(self.gap_start), gap as isize);
            self.buffer
                .copy_within(new_gap_start..self.gap_start, new_gap_end);
        } else {
            marks.shift_range(self.gap_end, Some(new_gap_end), -(gap as isize));
            self.buffer
                .copy_within(self.gap_end..new_gap_end, self.gap_start);
        }

        log::trace!(
            "gap moved from [{}, {}) to [{}, {})",
            self.gap_start,
            self.gap_end,
            new_gap_start,
            new_gap_end
        );
        self.gap_start = new_gap_start;
        self.gap_end = new_gap_end;
        marks.reset_zero_marks(self.gap_start, self.gap_end);
    }

    /// ギャップ終端を右に広げて直後の文字を削除する
    ///
    /// 削除範囲内のマークは新しいギャップ終端、すなわち論理的には削除開始位置に寄せる。
    fn shift_gap_end_up(&mut self, marks: &mut MarkTable, new_gap_end: usize) {
        if new_gap_end == self.gap_end {
            return;
        }
        debug_assert!(new_gap_end > self.gap_end);
        marks.collapse_range(self.gap_end, new_gap_end, false);
        self.gap_end = new_gap_end;
        marks.reset_zero_marks(self.gap_start, self.gap_end);
    }

    /// ギャップサイズを `new_gap_size` にして配列を再確保
    fn shift_end(&mut self, marks: &mut MarkTable, new_gap_size: usize) {
        let old_gap = self.gap_size();
        debug_assert!(new_gap_size > old_gap);
        let delta = new_gap_size - old_gap;
        marks.shift_range(self.gap_end, None, delta as isize);

        let mut new_buffer = Vec::with_capacity(self.length() + new_gap_size);
        new_buffer.extend_from_slice(&self.buffer[..self.gap_start]);
        new_buffer.resize(self.gap_start + new_gap_size, GAP_FILL);
        new_buffer.extend_from_slice(&self.buffer[self.gap_end..]);

        log::debug!(
            "buffer grown from {} to {} chars (gap {} -> {})",
            self.buffer.len(),
            new_buffer.len(),
            old_gap,
            new_gap_size
        );
        self.buffer = new_buffer;
        self.gap_end = self.gap_start + new_gap_size;
    }

    /// デバッグ用に内部配列を描画する
    ///
    /// ギャップの開始を `<`、終了を `>` で示し、ギャップ内と制御文字は `.` で表す。
    pub fn dump(&self) -> String {
        let mut out = String::with_capacity(self.buffer.len() + 2);
        for (i, ch) in self.buffer.iter().enumerate() {
            if i == self.gap_start {
                out.push('<');
            }
            if i == self.gap_end {
                out.push('>');
            }
            let in_gap = i >= self.gap_start && i < self.gap_end;
            out.push(if in_gap || ch.is_control() { '.' } else { *ch });
        }
        if self.gap_end == self.buffer.len() {
            out.push('>');
        }
        out
    }
}

fn checked_end(offset: usize, len: usize, length: usize) -> Result<usize> {
    match offset.checked_add(len) {
        Some(end) if end <= length => Ok(end),
        Some(end) => Err(ContentError::out_of_range(end, length)),
        None => Err(ContentError::out_of_range(usize::MAX, length)),
    }
}
