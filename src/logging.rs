//! ロギングシステム
//!
//! `log` クレートのバックエンドとして動作する開発者向けロガーを提供する。
//! バッファ内部は `log::trace!` / `log::debug!` でギャップ移動や再確保を記録する。

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

/// ログレベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl LogLevel {
    fn tag(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    fn from_record(level: log::Level) -> Self {
        match level {
            log::Level::Trace | log::Level::Debug => LogLevel::Debug,
            log::Level::Info => LogLevel::Info,
            log::Level::Warn => LogLevel::Warning,
            log::Level::Error => LogLevel::Error,
        }
    }

    fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Debug => log::LevelFilter::Trace,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Error | LogLevel::Fatal => log::LevelFilter::Error,
        }
    }
}

/// ロガー
///
/// * 開発者向け詳細ログをstderrへ出力
/// * 任意でファイルにも追記する
#[derive(Debug, Clone)]
pub struct Logger {
    level: LogLevel,
    output_stderr: bool,
    output_file: Option<PathBuf>,
}

impl Logger {
    /// デフォルト構築
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            output_stderr: true,
            output_file: None,
        }
    }

    /// 開発者向けロガー
    pub fn for_development() -> Self {
        Self::new(LogLevel::Debug)
    }

    /// ログレベルを取得
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// ログレベルを変更
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// ファイル出力を設定
    pub fn with_file_output<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// 標準エラー出力を無効化（テスト向け）
    #[cfg(test)]
    pub fn without_stderr(mut self) -> Self {
        self.output_stderr = false;
        self
    }

    fn should_log(&self, level: LogLevel) -> bool {
        level >= self.level
    }

    fn write_line(&self, message: &str) {
        if self.output_stderr {
            eprintln!("{}", message);
        }

        if let Some(path) = &self.output_file {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
                let _ = writeln!(file, "{}", message);
            }
        }
    }

    fn format_line(level: LogLevel, target: &str, message: &str) -> String {
        format!("{} [{}]: {}", level.tag(), target, message)
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        self.should_log(LogLevel::from_record(metadata.level()))
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = LogLevel::from_record(record.level());
        let line = Self::format_line(level, record.target(), &record.args().to_string());
        self.write_line(&line);
    }

    fn flush(&self) {}
}

static GLOBAL_LOGGER: OnceLock<Logger> = OnceLock::new();

/// グローバルロガーを設定する
///
/// 二回目以降の呼び出しは何もしない。既に別のロガーが登録されている場合も同様。
pub fn init_logger(level: LogLevel) {
    let logger = GLOBAL_LOGGER.get_or_init(|| Logger::new(level));
    if log::set_logger(logger).is_ok() {
        log::set_max_level(logger.level().to_filter());
    }
}
