use facetrack_core::settings::LOG_RETENTION_DAYS;
use std::time::Duration;

/// Which D-Bus bus the daemon registers on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusKind {
    Session,
    System,
}

/// Daemon configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Display name reported in status.
    pub system_name: String,
    /// Interval between roster-promotion ticks.
    pub promotion_period: Duration,
    /// Interval between feed ticks.
    pub feed_period: Duration,
    /// Maximum recognition feed entries kept (0 = unbounded).
    pub feed_capacity: usize,
    /// Simulated delay before a camera stream reports connected.
    pub stream_connect_delay: Duration,
    /// Load the demo roster and cameras at startup.
    pub seed_fixtures: bool,
    /// Start a recognition session at startup if a camera is configured.
    pub autostart: bool,
    /// Fixed RNG seed for reproducible runs; entropy when unset.
    pub rng_seed: Option<u64>,
    /// Activity log retention in days, within `settings::LOG_RETENTION_DAYS`.
    pub log_retention_days: u32,
    /// Number of generated demo activity entries.
    pub sample_log_count: usize,
    pub bus: BusKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            system_name: "FaceTrack Pro".to_string(),
            promotion_period: facetrack_core::scheduler::DEFAULT_PROMOTION_PERIOD,
            feed_period: facetrack_core::scheduler::DEFAULT_FEED_PERIOD,
            feed_capacity: facetrack_core::event_log::DEFAULT_FEED_CAPACITY,
            stream_connect_delay: facetrack_hw::stream::DEFAULT_CONNECT_DELAY,
            seed_fixtures: true,
            autostart: true,
            rng_seed: None,
            log_retention_days: facetrack_core::activity::DEFAULT_RETENTION_DAYS,
            sample_log_count: 50,
            bus: BusKind::Session,
        }
    }
}

impl Config {
    /// Load configuration from `FACETRACK_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            system_name: std::env::var("FACETRACK_SYSTEM_NAME").unwrap_or(d.system_name),
            promotion_period: Duration::from_millis(env_u64(
                "FACETRACK_PROMOTION_PERIOD_MS",
                d.promotion_period.as_millis() as u64,
            )),
            feed_period: Duration::from_millis(env_u64(
                "FACETRACK_FEED_PERIOD_MS",
                d.feed_period.as_millis() as u64,
            )),
            feed_capacity: env_usize("FACETRACK_FEED_CAPACITY", d.feed_capacity),
            stream_connect_delay: Duration::from_millis(env_u64(
                "FACETRACK_STREAM_CONNECT_MS",
                d.stream_connect_delay.as_millis() as u64,
            )),
            seed_fixtures: env_flag("FACETRACK_SEED", d.seed_fixtures),
            autostart: env_flag("FACETRACK_AUTOSTART", d.autostart),
            rng_seed: std::env::var("FACETRACK_RNG_SEED")
                .ok()
                .and_then(|v| v.parse().ok()),
            log_retention_days: env_u32("FACETRACK_LOG_RETENTION_DAYS", d.log_retention_days),
            sample_log_count: env_usize("FACETRACK_SAMPLE_LOGS", d.sample_log_count),
            bus: match std::env::var("FACETRACK_BUS").as_deref() {
                Ok("system") => BusKind::System,
                _ => BusKind::Session,
            },
        }
    }

    /// Periods must be non-zero; tokio intervals panic otherwise. Retention
    /// must stay inside the range the settings accept.
    pub fn validated(mut self) -> Self {
        let d = Self::default();
        if self.promotion_period.is_zero() {
            tracing::warn!("FACETRACK_PROMOTION_PERIOD_MS is 0; using default");
            self.promotion_period = d.promotion_period;
        }
        if self.feed_period.is_zero() {
            tracing::warn!("FACETRACK_FEED_PERIOD_MS is 0; using default");
            self.feed_period = d.feed_period;
        }
        if !LOG_RETENTION_DAYS.contains(&self.log_retention_days) {
            tracing::warn!(
                days = self.log_retention_days,
                "FACETRACK_LOG_RETENTION_DAYS out of range; using default"
            );
            self.log_retention_days = d.log_retention_days;
        }
        self
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key).map(|v| v != "0").unwrap_or(default)
}
