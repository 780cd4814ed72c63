use std::collections::BTreeMap;
use chrono::{DateTime, Utc};

use crate::ticker::diagnostics::{Diagnostic, DiagnosticSink};
use crate::ticker::record::{ActiveRecord, RecordId};
use crate::utils::time::{elapsed_seconds, format_hms};
use crate::ZERO_DURATION;

/// 一次计算得到的完整 id -> "HH:MM:SS" 映射
pub type DurationMap = BTreeMap<RecordId, String>;

/// 计算单条记录的显示时长，无开始字段时返回 None
pub fn record_duration(
    record: &ActiveRecord,
    now: DateTime<Utc>,
    sink: &dyn DiagnosticSink,
) -> Option<String> {
    let raw = record.start_timestamp()?;

    let Some(start) = raw.parse() else {
        sink.report(Diagnostic::InvalidTimestamp {
            id: record.id.clone(),
            raw: raw.to_string(),
        });
        return Some(ZERO_DURATION.to_string());
    };

    let delta = elapsed_seconds(now, start);
    if delta < 0 {
        sink.report(Diagnostic::FutureTimestamp {
            id: record.id.clone(),
            raw: raw.to_string(),
            ahead_seconds: delta.unsigned_abs(),
        });
        return Some(ZERO_DURATION.to_string());
    }

    Some(format_hms(delta as u64))
}

/// 对整个记录集合计算一次，每次都返回全新的映射
pub fn compute_durations(
    records: &[ActiveRecord],
    now: DateTime<Utc>,
    sink: &dyn DiagnosticSink,
) -> DurationMap {
    records
        .iter()
        .filter_map(|record| {
            record_duration(record, now, sink).map(|display| (record.id.clone(), display))
        })
        .collect()
}
