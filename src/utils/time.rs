use std::fmt::Write;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

const SECONDS_PER_HOUR: u64 = 3600;
const SECONDS_PER_MINUTE: u64 = 60;

// 不带时区的本地时间格式
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// 将秒数格式化为 `HH:MM:SS`，小时数不设上限
pub fn format_hms(total_secs: u64) -> String {
    let mut out = String::with_capacity(8);
    write_hms(&mut out, total_secs);
    out
}

pub fn write_hms(buf: &mut String, total_secs: u64) {
    buf.clear();
    let hours = total_secs / SECONDS_PER_HOUR;
    let minutes = (total_secs % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = total_secs % SECONDS_PER_MINUTE;
    let _ = write!(buf, "{hours:02}:{minutes:02}:{seconds:02}");
}

/// 计算 `now - start` 的整秒数（向下取整，可能为负）
pub fn elapsed_seconds(now: DateTime<Utc>, start: DateTime<Utc>) -> i64 {
    let millis = now.signed_duration_since(start).num_milliseconds();
    millis.div_euclid(1000)
}

/// 解析文本时间戳，无时区的日期时间按本地时区处理
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            // 夏令时切换造成的不存在时刻视为无法解析
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// 毫秒时间戳转换，超出可表示范围时返回 `None`
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(59), "00:00:59");
        assert_eq!(format_hms(60), "00:01:00");
        assert_eq!(format_hms(3661), "01:01:01");
        assert_eq!(format_hms(90061), "25:01:01");
    }

    #[test]
    fn test_format_hms_unbounded_hours() {
        assert_eq!(format_hms(360_000), "100:00:00");
        assert_eq!(format_hms(3_600_000 + 59), "1000:00:59");
    }

    #[test]
    fn test_write_hms_reuses_buffer() {
        let mut buf = String::from("stale");
        write_hms(&mut buf, 61);
        assert_eq!(buf, "00:01:01");
    }

    #[test]
    fn test_elapsed_seconds_floors() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();

        assert_eq!(elapsed_seconds(start + Duration::milliseconds(1999), start), 1);
        assert_eq!(elapsed_seconds(start + Duration::seconds(3661), start), 3661);
        assert_eq!(elapsed_seconds(start, start), 0);
        // 未来时间向下取整为负数
        assert_eq!(elapsed_seconds(start - Duration::milliseconds(1), start), -1);
        assert_eq!(elapsed_seconds(start - Duration::seconds(10), start), -10);
    }

    #[test]
    fn test_parse_rfc3339() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-01T10:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T15:30:00+05:30"), Some(expected));
        assert_eq!(parse_timestamp("  2024-05-01T10:00:00.000Z "), Some(expected));
    }

    #[test]
    fn test_parse_rfc2822() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("Wed, 01 May 2024 10:00:00 GMT"), Some(expected));
    }

    #[test]
    fn test_parse_local_datetime() {
        let naive = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_milli_opt(10, 0, 0, 250)
            .unwrap();
        let expected = Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc));

        assert_eq!(parse_timestamp("2024-05-01T10:00:00.250"), expected);
        assert_eq!(parse_timestamp("2024-05-01 10:00:00.250"), expected);
        assert!(parse_timestamp("2024-05-01T10:00").is_some());
    }

    #[test]
    fn test_parse_date_only_is_utc_midnight() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-01"), Some(expected));
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(parse_timestamp("not-a-date"), None);
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("2024-13-45T99:00:00Z"), None);
    }

    #[test]
    fn test_from_epoch_millis() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(from_epoch_millis(expected.timestamp_millis()), Some(expected));
        assert_eq!(from_epoch_millis(i64::MAX), None);
    }
}
