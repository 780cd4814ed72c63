use booking_ticker::ticker::diagnostics::NullSink;
use booking_ticker::utils::time::{format_hms, parse_timestamp};
use booking_ticker::{compute_durations, ActiveRecord};
use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn benchmark_formatting(c: &mut Criterion) {
    c.bench_function("format_hms", |b| {
        b.iter(|| {
            let display = format_hms(black_box(360_061));
            black_box(display);
        });
    });

    c.bench_function("parse_timestamp_rfc3339", |b| {
        b.iter(|| {
            let parsed = parse_timestamp(black_box("2024-05-01T10:00:00.000Z"));
            black_box(parsed);
        });
    });

    c.bench_function("parse_timestamp_local", |b| {
        b.iter(|| {
            let parsed = parse_timestamp(black_box("2024-05-01T10:00:00"));
            black_box(parsed);
        });
    });
}

fn benchmark_tick(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    // 创建测试数据：大部分有效，少量无效或未来时间
    let records: Vec<ActiveRecord> = (0..500u64)
        .map(|i| {
            let record = ActiveRecord::new(i);
            match i % 10 {
                0 => record.with_entry_time("not-a-date"),
                1 => record.with_check_in_time((now + Duration::seconds(30)).to_rfc3339()),
                _ => record.with_entry_time((now - Duration::seconds(i as i64 * 37)).to_rfc3339()),
            }
        })
        .collect();

    c.bench_function("compute_durations_500", |b| {
        b.iter(|| {
            let map = compute_durations(black_box(&records), now, &NullSink);
            black_box(map);
        });
    });
}

criterion_group!(benches, benchmark_formatting, benchmark_tick);
criterion_main!(benches);
