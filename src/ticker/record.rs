use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::utils::time::{from_epoch_millis, parse_timestamp};

/// 记录标识，JSON 中的数字或字符串统一为字符串键
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        })
    }
}

/// 开始时间：文本时间戳或毫秒时间戳
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StartTimestamp {
    EpochMillis(i64),
    Text(String),
    // 其他任意 JSON 值，保证单条记录不会让整个文件解析失败
    Other(Value),
}

impl StartTimestamp {
    /// 空字符串、0、null 与 false 视为未提供
    pub fn is_empty(&self) -> bool {
        match self {
            Self::EpochMillis(millis) => *millis == 0,
            Self::Text(text) => text.is_empty(),
            Self::Other(value) => matches!(value, Value::Null | Value::Bool(false)),
        }
    }

    pub fn parse(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::EpochMillis(millis) => from_epoch_millis(*millis),
            Self::Text(text) => parse_timestamp(text),
            // 小数毫秒向零截断，其余值无法解析
            Self::Other(Value::Number(number)) => number
                .as_f64()
                .filter(|millis| millis.is_finite())
                .and_then(|millis| from_epoch_millis(millis.trunc() as i64)),
            Self::Other(_) => None,
        }
    }
}

impl fmt::Display for StartTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EpochMillis(millis) => write!(f, "{}", millis),
            Self::Text(text) => write!(f, "{:?}", text),
            Self::Other(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for StartTimestamp {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for StartTimestamp {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<DateTime<Utc>> for StartTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::EpochMillis(dt.timestamp_millis())
    }
}

/// 进行中的预订：有开始时间、尚无结束时间
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveRecord {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_time: Option<StartTimestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<StartTimestamp>,
}

impl ActiveRecord {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            entry_time: None,
            check_in_time: None,
        }
    }

    pub fn with_entry_time(mut self, ts: impl Into<StartTimestamp>) -> Self {
        self.entry_time = Some(ts.into());
        self
    }

    pub fn with_check_in_time(mut self, ts: impl Into<StartTimestamp>) -> Self {
        self.check_in_time = Some(ts.into());
        self
    }

    pub fn start_timestamp(&self) -> Option<&StartTimestamp> {
        resolve_start_timestamp(self.entry_time.as_ref(), self.check_in_time.as_ref())
    }
}

/// 取第一个非空候选，`primary` 优先
pub fn resolve_start_timestamp<'a>(
    primary: Option<&'a StartTimestamp>,
    secondary: Option<&'a StartTimestamp>,
) -> Option<&'a StartTimestamp> {
    primary
        .filter(|ts| !ts.is_empty())
        .or_else(|| secondary.filter(|ts| !ts.is_empty()))
}
