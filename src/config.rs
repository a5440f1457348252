//! 設定
//!
//! ギャップバッファの初期容量と拡張ポリシーを定義する。

use serde::Deserialize;

/// 既定の初期容量（文字数）
pub const DEFAULT_BUFSIZE: usize = 10;

/// バッファ生成時のオプション
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GapContentOptions {
    /// 初期容量（文字数）。0 を指定しても 1 に切り上げられる
    pub initial_capacity: usize,
    /// 再確保時にギャップへ追加で確保する文字数
    pub growth_padding: usize,
}

impl GapContentOptions {
    /// JSON文字列から読み込む
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// 初期容量を指定
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// 実際に確保する初期容量
    pub(crate) fn effective_capacity(&self) -> usize {
        self.initial_capacity.max(1)
    }

    /// 挿入に必要な新しいギャップサイズを計算
    ///
    /// 既存ギャップが `insert_size` 以下のときのみ呼ばれる。
    pub(crate) fn grown_gap_size(&self, insert_size: usize, gap_size: usize, gap_end: usize) -> usize {
        (insert_size - gap_size + 1) * 2 + gap_end + self.growth_padding
    }
}

impl Default for GapContentOptions {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_BUFSIZE,
            growth_padding: DEFAULT_BUFSIZE,
        }
    }
}
