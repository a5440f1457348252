//! マークテーブル
//!
//! 位置ハンドルが参照する生オフセットのマークを、生オフセット昇順で保持する。
//! 範囲検索はすべて二分探索で行い、影響範囲のマークだけを走査する。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 生オフセットを保持する参照カウント付きマーク
///
/// 値の書き換えはすべてバッファのロック下で行われるため、
/// アトミック型は共有のための内部可変性としてのみ使う。
#[derive(Debug)]
pub struct Mark {
    raw: AtomicUsize,
    refs: AtomicUsize,
}

impl Mark {
    fn new(raw: usize) -> Arc<Self> {
        Arc::new(Self {
            raw: AtomicUsize::new(raw),
            refs: AtomicUsize::new(0),
        })
    }

    /// 生オフセットを取得
    pub fn raw(&self) -> usize {
        self.raw.load(Ordering::Relaxed)
    }

    fn set_raw(&self, raw: usize) {
        self.raw.store(raw, Ordering::Relaxed);
    }

    /// このマークを共有している位置ハンドルの数
    pub fn ref_count(&self) -> usize {
        self.refs.load(Ordering::Relaxed)
    }

    fn retain(&self) {
        self.refs.fetch_add(1, Ordering::Relaxed);
    }

    /// 参照を一つ減らし、残りの参照数を返す
    fn release(&self) -> usize {
        let previous = self.refs.fetch_sub(1, Ordering::Relaxed);
        debug_assert!(previous > 0, "mark released more often than retained");
        previous.saturating_sub(1)
    }

    /// ギャップ位置から論理オフセットへ変換
    ///
    /// 生オフセット 0 は文書先頭の番兵で、ギャップが先頭にあっても論理 0 を表す。
    pub(crate) fn logical_offset(&self, gap_start: usize, gap_end: usize) -> usize {
        let raw = self.raw();
        debug_assert!(
            raw == 0 || raw < gap_start || raw >= gap_end,
            "mark {} inside gap [{}, {})",
            raw,
            gap_start,
            gap_end
        );
        if raw >= gap_end {
            raw - (gap_end - gap_start)
        } else {
            raw
        }
    }
}

/// 生オフセット昇順に並んだマークの表
#[derive(Debug, Default)]
pub struct MarkTable {
    marks: Vec<Arc<Mark>>,
}

impl MarkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録されているマークの数
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// 先頭から順にマークを走査
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Mark>> {
        self.marks.iter()
    }

    /// 生オフセットの一覧（昇順）
    pub fn raw_offsets(&self) -> Vec<usize> {
        self.marks.iter().map(|m| m.raw()).collect()
    }

    /// `target` 以上の生オフセットを持つ最初の添字
    fn lower_bound(&self, target: usize) -> usize {
        let mut lo = 0;
        let mut hi = self.marks.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.marks[mid].raw() < target {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// `target` より大きい生オフセットを持つ最初の添字
    fn upper_bound(&self, target: usize) -> usize {
        let mut lo = 0;
        let mut hi = self.marks.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.marks[mid].raw() <= target {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// 生オフセットを二分探索する
    ///
    /// 一致するマークがあれば最も左の添字を `Ok` で、無ければ挿入位置を `Err` で返す。
    pub fn search(&self, target: usize) -> Result<usize, usize> {
        let index = self.lower_bound(target);
        match self.marks.get(index) {
            Some(mark) if mark.raw() == target => Ok(index),
            _ => Err(index),
        }
    }

    /// `[lo, hi)`（`hi` が `None` なら末尾まで）のマークを `delta` だけずらす
    pub fn shift_range(&mut self, lo: usize, hi: Option<usize>, delta: isize) {
        let start = self.lower_bound(lo);
        let end = match hi {
            Some(hi) => self.lower_bound(hi),
            None => self.marks.len(),
        };
        for mark in &self.marks[start..end.max(start)] {
            let raw = mark.raw();
            debug_assert!(raw.checked_add_signed(delta).is_some());
            mark.set_raw(raw.saturating_add_signed(delta));
        }
        self.debug_check_sorted();
    }

    /// `[lo, hi]` のマークを `lo`（`to_start`）または `hi` に寄せる
    pub fn collapse_range(&mut self, lo: usize, hi: usize, to_start: bool) {
        let start = self.lower_bound(lo);
        let end = self.upper_bound(hi);
        let target = if to_start { lo } else { hi };
        for mark in &self.marks[start..end.max(start)] {
            mark.set_raw(target);
        }
        self.debug_check_sorted();
    }

    /// ギャップが先頭に移動した後、旧ギャップ内に残ったマークを 0 に戻す
    pub fn reset_zero_marks(&mut self, gap_start: usize, gap_end: usize) {
        if gap_start != 0 {
            return;
        }
        let end = self.upper_bound(gap_end);
        for mark in &self.marks[..end] {
            mark.set_raw(0);
        }
    }

    /// 生オフセット `raw` のマークを取得し、参照数を一つ増やす
    ///
    /// 同じ生オフセットのマークがあればそれを共有する。
    pub fn acquire(&mut self, raw: usize) -> Arc<Mark> {
        let mark = match self.search(raw) {
            Ok(index) => Arc::clone(&self.marks[index]),
            Err(index) => {
                let mark = Mark::new(raw);
                self.marks.insert(index, Arc::clone(&mark));
                mark
            }
        };
        mark.retain();
        mark
    }

    /// 既存のマークを共有し、参照数を一つ増やす
    pub(crate) fn share(&mut self, mark: &Arc<Mark>) -> Arc<Mark> {
        mark.retain();
        Arc::clone(mark)
    }

    /// 解放済みハンドルのマークの参照数を減らし、0 になったものを表から取り除く
    ///
    /// 取り除いたマークの数を返す。
    pub fn release_pending<I>(&mut self, released: I) -> usize
    where
        I: IntoIterator<Item = Arc<Mark>>,
    {
        let mut removed = 0;
        for mark in released {
            if mark.release() == 0 && self.remove(&mark) {
                removed += 1;
            }
        }
        removed
    }

    fn remove(&mut self, mark: &Arc<Mark>) -> bool {
        let start = self.lower_bound(mark.raw());
        let found = self.marks[start..]
            .iter()
            .take_while(|m| m.raw() == mark.raw())
            .position(|m| Arc::ptr_eq(m, mark));
        match found {
            Some(offset) => {
                self.marks.remove(start + offset);
                true
            }
            None => false,
        }
    }

    fn debug_check_sorted(&self) {
        debug_assert!(
            self.marks.windows(2).all(|w| w[0].raw() <= w[1].raw()),
            "mark table out of order: {:?}",
            self.raw_offsets()
        );
    }
}
