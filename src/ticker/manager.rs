use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::core::config::Config;
use crate::ticker::clock::{Clock, SystemClock};
use crate::ticker::compute::DurationMap;
use crate::ticker::diagnostics::{DiagnosticSink, TracingSink};
use crate::ticker::metrics::{MetricsSink, TickMetrics, TickMetricsSnapshot};
use crate::ticker::record::{ActiveRecord, RecordId};
use crate::ticker::task::{DurationPublisher, TickContext, TickerTask};
use crate::{Result, ZERO_DURATION};

/// 当前观察的记录集合及其计算任务的所有者
pub struct DurationTicker {
    interval: Duration,
    ctx: TickContext,
    receiver: watch::Receiver<Arc<DurationMap>>,
    observed: Option<Observed>,
}

struct Observed {
    records: Arc<Vec<ActiveRecord>>,
    task: TickerTask,
}

impl DurationTicker {
    pub fn new(config: &Config) -> Self {
        Self::with_parts(config, Arc::new(SystemClock), Arc::new(TracingSink))
    }

    pub fn with_parts(config: &Config, clock: Arc<dyn Clock>, sink: Arc<dyn DiagnosticSink>) -> Self {
        let metrics = Arc::new(TickMetrics::new());
        let publisher = Arc::new(DurationPublisher::new());
        let receiver = publisher.subscribe();

        Self {
            interval: config.tick_interval(),
            ctx: TickContext {
                clock,
                sink: Arc::new(MetricsSink::new(sink, Arc::clone(&metrics))),
                metrics,
                publisher,
            },
            receiver,
            observed: None,
        }
    }

    /// 开始观察记录集合；集合身份变化时重建任务
    pub fn observe(&mut self, records: Arc<Vec<ActiveRecord>>) {
        if let Some(observed) = &self.observed {
            if Arc::ptr_eq(&observed.records, &records) {
                return;
            }
        }

        if let Some(mut previous) = self.observed.take() {
            previous.task.cancel();
            tracing::debug!(
                "Record set replaced, cancelled ticker task (generation {})",
                previous.task.generation()
            );
        }

        let task = TickerTask::spawn(Arc::clone(&records), self.interval, self.ctx.clone());
        tracing::info!(
            "Observing {} active records (generation {})",
            records.len(),
            task.generation()
        );
        self.observed = Some(Observed { records, task });
    }

    /// 停止观察并等待任务退出
    pub async fn stop(&mut self) -> Result<()> {
        let Some(observed) = self.observed.take() else {
            return Ok(());
        };

        self.ctx.publisher.retire();
        let generation = observed.task.generation();
        observed.task.shutdown().await?;
        tracing::info!("Ticker stopped (generation {})", generation);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.observed
            .as_ref()
            .map_or(false, |observed| !observed.task.is_finished())
    }

    pub fn records(&self) -> Option<Arc<Vec<ActiveRecord>>> {
        self.observed.as_ref().map(|observed| Arc::clone(&observed.records))
    }

    /// 最近一次计算得到的映射
    pub fn durations(&self) -> Arc<DurationMap> {
        self.receiver.borrow().clone()
    }

    pub fn duration_for(&self, id: &RecordId) -> String {
        self.receiver
            .borrow()
            .get(id)
            .cloned()
            .unwrap_or_else(|| ZERO_DURATION.to_string())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DurationMap>> {
        self.ctx.publisher.subscribe()
    }

    pub fn metrics(&self) -> TickMetricsSnapshot {
        self.ctx.metrics.snapshot()
    }
}
