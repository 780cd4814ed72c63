use std::fmt;
use parking_lot::Mutex;
use serde::Serialize;

use crate::ticker::record::RecordId;

/// 单条记录计算时产生的诊断事件，仅用于提示，不影响计算流程
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Diagnostic {
    InvalidTimestamp {
        id: RecordId,
        raw: String,
    },
    FutureTimestamp {
        id: RecordId,
        raw: String,
        ahead_seconds: u64,
    },
}

impl Diagnostic {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTimestamp { .. } => "invalid_timestamp",
            Self::FutureTimestamp { .. } => "future_timestamp",
        }
    }

    pub fn record_id(&self) -> &RecordId {
        match self {
            Self::InvalidTimestamp { id, .. } | Self::FutureTimestamp { id, .. } => id,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTimestamp { id, raw } => {
                write!(f, "Invalid entry time for booking {}: {}", id, raw)
            }
            Self::FutureTimestamp { id, raw, ahead_seconds } => write!(
                f,
                "Entry time is in the future for booking {}: {} ({}s ahead)",
                id, raw, ahead_seconds
            ),
        }
    }
}

/// 诊断输出通道
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// 写入 tracing 日志
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::InvalidTimestamp { id, .. } => {
                tracing::error!(code = diagnostic.code(), booking = %id, "{}", diagnostic);
            }
            Diagnostic::FutureTimestamp { id, .. } => {
                tracing::warn!(code = diagnostic.code(), booking = %id, "{}", diagnostic);
            }
        }
    }
}

/// 收集所有诊断，便于检查
#[derive(Debug, Default)]
pub struct CollectingSink {
    reports: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Diagnostic> {
        self.reports.lock().clone()
    }

    pub fn count(&self, code: &str) -> usize {
        self.reports.lock().iter().filter(|d| d.code() == code).count()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.reports.lock().push(diagnostic);
    }
}

/// 丢弃所有诊断
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: Diagnostic) {}
}
