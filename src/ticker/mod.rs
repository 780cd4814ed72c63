pub mod clock;
pub mod compute;
pub mod diagnostics;
pub mod manager;
pub mod metrics;
pub mod record;
pub mod source;
pub mod task;

pub use clock::{Clock, ManualClock, SystemClock};
pub use metrics::{TickMetrics, TickMetricsSnapshot};
pub use task::{DurationPublisher, TickerTask};
