use std::sync::Arc;
use std::time::{Duration, Instant};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ticker::clock::Clock;
use crate::ticker::compute::{compute_durations, DurationMap};
use crate::ticker::diagnostics::DiagnosticSink;
use crate::ticker::metrics::TickMetrics;
use crate::ticker::record::ActiveRecord;
use crate::Result;

/// 按代发布完整映射，只有当前代可以替换
pub struct DurationPublisher {
    generation: Mutex<u64>,
    sender: watch::Sender<Arc<DurationMap>>,
}

impl Default for DurationPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl DurationPublisher {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Arc::new(DurationMap::new()));
        Self {
            generation: Mutex::new(0),
            sender,
        }
    }

    /// 切换到新的代，旧代的发布将被忽略
    pub fn begin(&self) -> u64 {
        let mut generation = self.generation.lock();
        *generation += 1;
        *generation
    }

    /// 作废当前代并清空映射
    pub fn retire(&self) {
        let mut generation = self.generation.lock();
        *generation += 1;
        self.sender.send_replace(Arc::new(DurationMap::new()));
    }

    pub fn publish(&self, generation: u64, map: DurationMap) -> bool {
        let current = self.generation.lock();
        if *current != generation {
            return false;
        }
        self.sender.send_replace(Arc::new(map));
        true
    }

    pub fn current(&self) -> Arc<DurationMap> {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DurationMap>> {
        self.sender.subscribe()
    }
}

/// 任务运行所需的共享组件
#[derive(Clone)]
pub struct TickContext {
    pub clock: Arc<dyn Clock>,
    pub sink: Arc<dyn DiagnosticSink>,
    pub metrics: Arc<TickMetrics>,
    pub publisher: Arc<DurationPublisher>,
}

/// 针对一个记录集合的周期性计算任务
pub struct TickerTask {
    generation: u64,
    shutdown_sender: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
    metrics: Arc<TickMetrics>,
}

impl TickerTask {
    /// 启动周期任务，首次计算立即执行（需在 tokio 运行时内调用）
    pub fn spawn(records: Arc<Vec<ActiveRecord>>, interval: Duration, ctx: TickContext) -> Self {
        let generation = ctx.publisher.begin();
        let (shutdown_sender, shutdown_receiver) = watch::channel(false);
        let metrics = Arc::clone(&ctx.metrics);

        metrics.record_task_start();
        tracing::debug!(
            "Starting ticker task (generation {}, {} records, interval {:?})",
            generation,
            records.len(),
            interval
        );

        let handle = tokio::spawn(Self::run(records, interval, generation, ctx, shutdown_receiver));

        Self {
            generation,
            shutdown_sender,
            handle: Some(handle),
            metrics,
        }
    }

    /// 任务主循环
    async fn run(
        records: Arc<Vec<ActiveRecord>>,
        interval: Duration,
        generation: u64,
        ctx: TickContext,
        mut shutdown_receiver: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                changed = shutdown_receiver.changed() => {
                    if changed.is_err() || *shutdown_receiver.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if !Self::tick(&records, generation, &ctx) {
                        // 已被新的代取代
                        break;
                    }
                }
            }
        }

        tracing::debug!("Ticker task (generation {}) stopped", generation);
    }

    /// 执行一次计算并发布结果
    fn tick(records: &[ActiveRecord], generation: u64, ctx: &TickContext) -> bool {
        let started = Instant::now();
        let map = compute_durations(records, ctx.clock.now(), ctx.sink.as_ref());
        ctx.metrics.record_tick(map.len(), started.elapsed());
        ctx.publisher.publish(generation, map)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |handle| handle.is_finished())
    }

    /// 立即取消，不等待任务退出
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.shutdown_sender.send(true);
            handle.abort();
            self.metrics.record_task_cancel();
        }
    }

    /// 发送停止信号并等待任务退出
    pub async fn shutdown(mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        let _ = self.shutdown_sender.send(true);
        self.metrics.record_task_cancel();
        handle.await?;
        Ok(())
    }
}

impl Drop for TickerTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
