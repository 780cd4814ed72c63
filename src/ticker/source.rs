use std::path::Path;
use serde::Deserialize;

use crate::core::error::TickerError;
use crate::ticker::record::ActiveRecord;
use crate::Result;

/// 记录文件支持的两种格式
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordFile {
    List(Vec<ActiveRecord>),
    #[serde(rename_all = "camelCase")]
    Bookings { current_bookings: Vec<ActiveRecord> },
}

/// 解析记录 JSON：数组，或带 `currentBookings` 字段的对象
pub fn parse_records(path: &Path, content: &str) -> Result<Vec<ActiveRecord>> {
    if content.trim().is_empty() {
        return Err(TickerError::source_error(format!(
            "Record file is empty: {}",
            path.display()
        )));
    }

    let file: RecordFile =
        serde_json::from_str(content).map_err(|e| TickerError::record_format(path, e))?;

    Ok(match file {
        RecordFile::List(records) => records,
        RecordFile::Bookings { current_bookings } => current_bookings,
    })
}

/// 只读取一次文件，同时返回记录与原始内容
pub async fn read_records(path: &Path) -> Result<(Vec<ActiveRecord>, String)> {
    let content = tokio::fs::read_to_string(path).await?;
    let records = parse_records(path, &content)?;
    tracing::debug!("Loaded {} active records from {}", records.len(), path.display());
    Ok((records, content))
}

/// 从文件加载进行中的记录
pub async fn load_records(path: &Path) -> Result<Vec<ActiveRecord>> {
    let (records, _) = read_records(path).await?;
    Ok(records)
}
