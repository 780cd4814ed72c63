pub mod core;
pub mod ticker;
pub mod utils;

// 重新导出主要类型
pub use crate::core::config::Config;
pub use crate::core::error::TickerError;
pub use crate::ticker::compute::{compute_durations, DurationMap};
pub use crate::ticker::diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, TracingSink};
pub use crate::ticker::manager::DurationTicker;
pub use crate::ticker::record::{ActiveRecord, RecordId, StartTimestamp};

// 常量定义
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000; // 1s
pub const ZERO_DURATION: &str = "00:00:00";
pub const DEFAULT_LOG_LEVEL: &str = "info";

// 结果类型别名
pub type Result<T> = std::result::Result<T, TickerError>;
