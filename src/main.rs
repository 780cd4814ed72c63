use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use booking_ticker::core::config::Config;
use booking_ticker::ticker::source::{parse_records, read_records};
use booking_ticker::{ActiveRecord, DurationMap, DurationTicker};

fn build_cli() -> Command {
    Command::new("booking-ticker")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Booking-Ticker Team")
        .about("Live elapsed-duration display for active parking bookings")
        .arg(
            Arg::new("records")
                .help("JSON file with active bookings")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("options")
                .short('o')
                .long("options")
                .help("Ticker options (comma-separated key=value)")
                .value_name("OPTIONS")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("interval_ms")
                .long("interval-ms")
                .help("Tick interval in milliseconds")
                .value_name("MS")
                .value_parser(clap::value_parser!(u64))
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("ticks")
                .long("ticks")
                .help("Stop after this many ticks")
                .value_name("COUNT")
                .value_parser(clap::value_parser!(u64))
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("no_reload")
                .long("no-reload")
                .help("Do not re-read the records file when it changes")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Enable debug logging")
                .action(clap::ArgAction::SetTrue),
        )
}

/// 解析命令行参数，命令行标志优先于 -o 选项
fn config_from_matches(matches: &ArgMatches) -> booking_ticker::Result<Config> {
    let records_file = matches
        .get_one::<String>("records")
        .map(PathBuf::from)
        .unwrap_or_default();

    let options: Vec<&str> = matches
        .get_one::<String>("options")
        .map(|s| s.split(',').collect())
        .unwrap_or_default();

    let mut config = Config::from_options(&options, records_file)?;

    if let Some(interval_ms) = matches.get_one::<u64>("interval_ms") {
        config.tick_interval_ms = *interval_ms;
    }
    if let Some(ticks) = matches.get_one::<u64>("ticks") {
        config.max_ticks = Some(*ticks);
    }
    if matches.get_flag("no_reload") {
        config.reload_on_change = false;
    }
    if matches.get_flag("debug") {
        config.log_level = "debug".to_string();
    }

    config.validate()?;
    Ok(config)
}

/// 初始化日志系统，RUST_LOG 优先
fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();
}

fn render(map: &DurationMap) -> String {
    if map.is_empty() {
        return "(no active bookings)".to_string();
    }

    map.iter()
        .map(|(id, duration)| format!("{}={}", id, duration))
        .collect::<Vec<_>>()
        .join("  ")
}

/// 文件内容变化时重新加载，返回新的记录集合
async fn reload_if_changed(
    path: &Path,
    last_content: &mut String,
) -> anyhow::Result<Option<Arc<Vec<ActiveRecord>>>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if content == *last_content {
        return Ok(None);
    }

    let records = parse_records(path, &content)?;
    *last_content = content;
    Ok(Some(Arc::new(records)))
}

async fn run(config: Config) -> anyhow::Result<()> {
    // 初始记录与比较基准来自同一次读取
    let (records, mut last_content) = read_records(&config.records_file)
        .await
        .with_context(|| format!("Failed to load records from {}", config.records_file.display()))?;

    let mut ticker = DurationTicker::new(&config);
    let mut durations = ticker.subscribe();
    ticker.observe(Arc::new(records));

    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .context("Failed to install SIGTERM handler")?;

    let mut ticks = 0u64;
    loop {
        tokio::select! {
            changed = durations.changed() => {
                if changed.is_err() {
                    break;
                }
                let map = durations.borrow_and_update().clone();
                println!("{}", render(&map));

                ticks += 1;
                if config.max_ticks.map_or(false, |max| ticks >= max) {
                    info!("Reached {} ticks, stopping", ticks);
                    break;
                }

                if config.reload_on_change {
                    match reload_if_changed(&config.records_file, &mut last_content).await {
                        Ok(Some(records)) => {
                            info!("Records file changed, {} active records", records.len());
                            ticker.observe(records);
                        }
                        Ok(None) => {}
                        Err(e) => warn!("Keeping previous records: {:#}", e),
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down...");
                break;
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }
        }
    }

    ticker.stop().await?;

    let metrics = ticker.metrics();
    info!(
        "Ticker metrics: ticks={}, records={}, invalid={}, future={}, avg_tick={:.1}us",
        metrics.ticks,
        metrics.records_computed,
        metrics.invalid_timestamps,
        metrics.future_timestamps,
        metrics.avg_tick_latency_us
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();

    let config = match config_from_matches(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(2);
        }
    };

    init_logging(&config.log_level);

    info!("Starting booking-ticker v{}", env!("CARGO_PKG_VERSION"));
    info!("Records file: {}", config.records_file.display());
    info!("Tick interval: {}ms", config.tick_interval_ms);

    if let Err(e) = run(config).await {
        error!("{:#}", e);
        process::exit(1);
    }

    info!("booking-ticker shutdown complete");
}
