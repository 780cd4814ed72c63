use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::ticker::diagnostics::{Diagnostic, DiagnosticSink};

/// 循环缓冲区，只保留最近的延迟数据
#[derive(Debug)]
struct CircularBuffer<T> {
    data: Vec<T>,
    capacity: usize,
    head: usize,
    size: usize,
}

impl<T: Clone + Default> CircularBuffer<T> {
    fn new(capacity: usize) -> Self {
        Self {
            data: vec![T::default(); capacity],
            capacity,
            head: 0,
            size: 0,
        }
    }

    fn push(&mut self, item: T) {
        self.data[self.head] = item;
        self.head = (self.head + 1) % self.capacity;
        if self.size < self.capacity {
            self.size += 1;
        }
    }

    fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let (older, newer) = if self.size < self.capacity {
            (&self.data[0..0], &self.data[0..self.size])
        } else {
            (&self.data[self.head..], &self.data[..self.head])
        };
        older.iter().chain(newer.iter())
    }

    fn len(&self) -> usize {
        self.size
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickMetricsSnapshot {
    pub ticks: u64,
    pub records_computed: u64,
    pub invalid_timestamps: u64,
    pub future_timestamps: u64,
    pub tasks_started: u64,
    pub tasks_cancelled: u64,
    pub last_record_count: u64,
    pub avg_tick_latency_us: f64,
    pub last_updated: SystemTime,
    pub uptime_seconds: u64,
}

pub struct TickMetrics {
    start_time: Instant,

    // 原子计数器
    ticks: AtomicU64,
    records_computed: AtomicU64,
    invalid_timestamps: AtomicU64,
    future_timestamps: AtomicU64,
    tasks_started: AtomicU64,
    tasks_cancelled: AtomicU64,
    last_record_count: AtomicU64,

    tick_latencies: RwLock<CircularBuffer<Duration>>,
}

impl Default for TickMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TickMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            ticks: AtomicU64::new(0),
            records_computed: AtomicU64::new(0),
            invalid_timestamps: AtomicU64::new(0),
            future_timestamps: AtomicU64::new(0),
            tasks_started: AtomicU64::new(0),
            tasks_cancelled: AtomicU64::new(0),
            last_record_count: AtomicU64::new(0),
            tick_latencies: RwLock::new(CircularBuffer::new(600)),
        }
    }

    pub fn record_tick(&self, records: usize, latency: Duration) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.records_computed.fetch_add(records as u64, Ordering::Relaxed);
        self.last_record_count.store(records as u64, Ordering::Relaxed);
        self.tick_latencies.write().push(latency);
    }

    pub fn record_diagnostic(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::InvalidTimestamp { .. } => {
                self.invalid_timestamps.fetch_add(1, Ordering::Relaxed);
            }
            Diagnostic::FutureTimestamp { .. } => {
                self.future_timestamps.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    // 任务生命周期
    pub fn record_task_start(&self) {
        self.tasks_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_cancel(&self) {
        self.tasks_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    fn average_latency_us(latencies: &CircularBuffer<Duration>) -> f64 {
        if latencies.len() == 0 {
            return 0.0;
        }

        let total_us: f64 = latencies.iter().map(|d| d.as_secs_f64() * 1_000_000.0).sum();
        total_us / latencies.len() as f64
    }

    // 生成当前指标快照
    pub fn snapshot(&self) -> TickMetricsSnapshot {
        TickMetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            records_computed: self.records_computed.load(Ordering::Relaxed),
            invalid_timestamps: self.invalid_timestamps.load(Ordering::Relaxed),
            future_timestamps: self.future_timestamps.load(Ordering::Relaxed),
            tasks_started: self.tasks_started.load(Ordering::Relaxed),
            tasks_cancelled: self.tasks_cancelled.load(Ordering::Relaxed),
            last_record_count: self.last_record_count.load(Ordering::Relaxed),
            avg_tick_latency_us: Self::average_latency_us(&self.tick_latencies.read()),
            last_updated: SystemTime::now(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

/// 统计诊断数量后转发给内部通道
pub struct MetricsSink {
    inner: Arc<dyn DiagnosticSink>,
    metrics: Arc<TickMetrics>,
}

impl MetricsSink {
    pub fn new(inner: Arc<dyn DiagnosticSink>, metrics: Arc<TickMetrics>) -> Self {
        Self { inner, metrics }
    }
}

impl DiagnosticSink for MetricsSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.metrics.record_diagnostic(&diagnostic);
        self.inner.report(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticker::diagnostics::CollectingSink;
    use crate::ticker::record::RecordId;

    #[test]
    fn test_tick_metrics() {
        let metrics = TickMetrics::new();

        metrics.record_task_start();
        metrics.record_tick(3, Duration::from_micros(40));
        metrics.record_tick(2, Duration::from_micros(20));
        metrics.record_task_cancel();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.ticks, 2);
        assert_eq!(snapshot.records_computed, 5);
        assert_eq!(snapshot.last_record_count, 2);
        assert_eq!(snapshot.tasks_started, 1);
        assert_eq!(snapshot.tasks_cancelled, 1);
        assert!((snapshot.avg_tick_latency_us - 30.0).abs() < 0.001);
    }

    #[test]
    fn test_metrics_sink_counts_and_forwards() {
        let metrics = Arc::new(TickMetrics::new());
        let collecting = Arc::new(CollectingSink::new());
        let sink = MetricsSink::new(collecting.clone(), Arc::clone(&metrics));

        sink.report(Diagnostic::InvalidTimestamp {
            id: RecordId::from(1u64),
            raw: String::new(),
        });
        sink.report(Diagnostic::FutureTimestamp {
            id: RecordId::from(2u64),
            raw: String::new(),
            ahead_seconds: 4,
        });
        sink.report(Diagnostic::FutureTimestamp {
            id: RecordId::from(3u64),
            raw: String::new(),
            ahead_seconds: 1,
        });

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.invalid_timestamps, 1);
        assert_eq!(snapshot.future_timestamps, 2);
        assert_eq!(collecting.reports().len(), 3);
    }

    #[test]
    fn test_circular_buffer_wraps() {
        let mut buffer = CircularBuffer::new(3);
        for ms in [10, 20, 30, 40] {
            buffer.push(Duration::from_millis(ms));
        }

        assert_eq!(buffer.len(), 3);
        let values: Vec<Duration> = buffer.iter().cloned().collect();
        assert_eq!(
            values,
            vec![
                Duration::from_millis(20),
                Duration::from_millis(30),
                Duration::from_millis(40),
            ]
        );
    }
}
