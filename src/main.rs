//! Hallway Display — Main Entry Point
//!
//! Hexagonal architecture with one worker thread per signal source feeding
//! a single coordinator thread.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  DeviceController  XdotoolWindows  LogEventSink  SystemClock   │
//! │  (DisplayPort)     (WindowPort)    (EventSink)   (ClockPort)   │
//! │  Bh1750 · MotionDetector · TouchReader (signal sources)        │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Coordinator (pure logic)                  │    │
//! │  │  modes · view manager · brightness curve               │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Workers → EventQueue → Coordinator::run · ShutdownToken       │
//! └────────────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

use core::time::Duration;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use hallway_display::adapters::config_file::TomlConfigFile;
use hallway_display::adapters::log_sink::LogEventSink;
use hallway_display::adapters::time::SystemClock;
use hallway_display::adapters::windows::XdotoolWindows;
use hallway_display::app::coordinator::Coordinator;
use hallway_display::app::ports::{ClockPort, ConfigPort};
use hallway_display::config::SystemConfig;
use hallway_display::device::DeviceController;
use hallway_display::drivers::process::SystemRunner;
use hallway_display::error::ConfigError;
use hallway_display::events::{EventQueue, SignalEvent};
use hallway_display::schedule::WeeklySchedule;
use hallway_display::workers::{self, ShutdownToken, Worker};

const DEFAULT_CONFIG: &str = "/etc/hallway-display/config.toml";

#[derive(Debug, Parser)]
#[command(version, about = "Wall display coordinator")]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Write a default configuration to PATH and exit
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<PathBuf>,

    /// Log filter, overriding the configuration file (e.g. "debug")
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── 1. Configuration ──────────────────────────────────────
    if let Some(path) = &cli.write_default_config {
        TomlConfigFile::new(path)
            .save(&SystemConfig::default())
            .with_context(|| format!("writing default config to {}", path.display()))?;
        println!("Default configuration written to {}", path.display());
        return Ok(());
    }

    let store = TomlConfigFile::new(&cli.config);
    let loaded = store.load();

    // ── 2. Logging ────────────────────────────────────────────
    let level = cli.log_level.clone().unwrap_or_else(|| match &loaded {
        Ok(cfg) => cfg.runtime.log_level.clone(),
        Err(_) => SystemConfig::default().runtime.log_level,
    });
    init_logging(&level);

    info!("╔══════════════════════════════════════╗");
    info!("║  Hallway Display v{}              ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = match loaded {
        Ok(cfg) => {
            info!("Config loaded from {}", store.path().display());
            cfg
        }
        Err(ConfigError::NotFound(path)) => {
            warn!("Config file {} not found, using defaults", path);
            SystemConfig::default()
        }
        Err(e) => {
            return Err(e).with_context(|| format!("loading {}", store.path().display()));
        }
    };
    let schedule = WeeklySchedule::from_config(&config.schedule).context("parsing schedule")?;

    // ── 3. Construct adapters ─────────────────────────────────
    let clock = SystemClock::new();
    let display = DeviceController::from_config(&config.monitor, SystemRunner::new());
    info!("Power chain: {}", display.chain_names().join(" -> "));
    info!(
        "Worst-case event-to-effect latency: {:?}",
        config.monitor.worst_case_latency()
    );
    let windows = XdotoolWindows::new(&config.views, &config.monitor.x_display, SystemRunner::new());

    // ── 4. Coordinator + startup reconciliation ───────────────
    let scheduled_on = schedule.is_scheduled_on(clock.now());
    let mut coordinator = Coordinator::new(
        display,
        windows,
        LogEventSink::new(),
        clock,
        &config,
        scheduled_on,
    );
    coordinator.start();

    // ── 5. Signal sources ─────────────────────────────────────
    let queue = EventQueue::new();
    let token = ShutdownToken::new();
    let workers = spawn_workers(&config, schedule, scheduled_on, &queue, &token)?;
    spawn_signal_listener(token.clone()).context("starting signal listener")?;

    // ── 6. Event loop ─────────────────────────────────────────
    coordinator.run(&queue, &token);

    // ── 7. Shutdown ───────────────────────────────────────────
    token.cancel();
    let stuck = workers::join_all(
        workers,
        Duration::from_secs(config.runtime.join_timeout_secs),
    );
    if stuck.is_empty() {
        info!("All workers stopped");
    }
    info!("Hallway Display stopped");
    Ok(())
}

fn init_logging(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

fn spawn_workers(
    config: &SystemConfig,
    schedule: WeeklySchedule,
    scheduled_on: bool,
    queue: &std::sync::Arc<EventQueue>,
    token: &ShutdownToken,
) -> Result<Vec<Worker>> {
    let mut started = Vec::new();

    let (tx, t) = (queue.sender("schedule"), token.clone());
    let interval = Duration::from_secs(config.schedule.poll_interval_secs);
    started.push(workers::spawn("schedule", move || {
        workers::schedule_worker(schedule, scheduled_on, SystemClock::new(), interval, tx, t);
    })?);

    let (tx, t) = (queue.sender("motion-tick"), token.clone());
    let interval = Duration::from_secs(config.motion.check_interval_secs);
    started.push(workers::spawn("motion-tick", move || {
        workers::ticker(SignalEvent::MotionTimeoutTick, interval, tx, t);
    })?);

    let (tx, t) = (queue.sender("view-tick"), token.clone());
    let interval = Duration::from_secs(config.views.check_interval_secs);
    started.push(workers::spawn("view-tick", move || {
        workers::ticker(SignalEvent::InactivityTick, interval, tx, t);
    })?);

    let (tx, t) = (queue.sender("touch"), token.clone());
    let touch = config.touch.clone();
    started.push(workers::spawn("touch", move || workers::touch_worker(touch, tx, t))?);

    started.extend(spawn_sensor_workers(config, queue, token)?);
    Ok(started)
}

#[cfg(target_os = "linux")]
fn spawn_sensor_workers(
    config: &SystemConfig,
    queue: &std::sync::Arc<EventQueue>,
    token: &ShutdownToken,
) -> Result<Vec<Worker>> {
    use hallway_display::adapters::hardware;
    use hallway_display::sensors::light::LightFilter;

    let mut started = Vec::new();

    match hardware::open_motion_sensor(&config.motion) {
        Ok(detector) => {
            let (tx, t) = (queue.sender("motion"), token.clone());
            let interval = Duration::from_millis(config.motion.poll_interval_ms);
            started.push(workers::spawn("motion", move || {
                workers::motion_worker(detector, interval, tx, t);
            })?);
        }
        Err(e) => warn!("Motion sensor disabled: {}", e),
    }

    match hardware::open_light_sensor(&config.light) {
        Ok(sensor) => {
            let (tx, t) = (queue.sender("light"), token.clone());
            let light = config.light.clone();
            started.push(workers::spawn("light", move || {
                workers::light_worker(
                    sensor,
                    LightFilter::new(light.change_threshold_lux),
                    Duration::from_secs(light.poll_interval_secs),
                    Duration::from_secs(light.error_backoff_secs),
                    tx,
                    t,
                );
            })?);
        }
        Err(e) => warn!("Light sensor disabled: {}", e),
    }

    Ok(started)
}

#[cfg(not(target_os = "linux"))]
fn spawn_sensor_workers(
    _config: &SystemConfig,
    _queue: &std::sync::Arc<EventQueue>,
    _token: &ShutdownToken,
) -> Result<Vec<Worker>> {
    warn!("Motion and light sensors need Linux character devices; disabled");
    Ok(Vec::new())
}

/// Cancel `token` on SIGINT or SIGTERM.  The listener thread is detached.
fn spawn_signal_listener(token: ShutdownToken) -> std::io::Result<Worker> {
    workers::spawn("signals", move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                warn!("Signal handling unavailable: {}", e);
                return;
            }
        };
        runtime.block_on(wait_for_shutdown_signal());
        info!("Shutdown requested");
        token.cancel();
    })
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!("SIGTERM handler unavailable: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
