//! Activity log: system, recognition, camera and user events for the logs view.

use crate::random::RandomSource;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_RETENTION_DAYS: u32 = 30;
/// How far back generated sample entries may reach.
const SAMPLE_WINDOW_HOURS: f64 = 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    System,
    Recognition,
    Camera,
    User,
}

impl LogCategory {
    pub const ALL: [LogCategory; 4] = [
        LogCategory::System,
        LogCategory::Recognition,
        LogCategory::Camera,
        LogCategory::User,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogCategory::System => "system",
            LogCategory::Recognition => "recognition",
            LogCategory::Camera => "camera",
            LogCategory::User => "user",
        }
    }
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(LogLevel::Info),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

impl FromStr for LogCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown log category: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub category: LogCategory,
    pub message: String,
}

/// Filter for [`ActivityLog::query`]. `None` fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub level: Option<LogLevel>,
    #[serde(default)]
    pub category: Option<LogCategory>,
}

impl LogQuery {
    pub fn matches(&self, entry: &LogEntry) -> bool {
        let search_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(q) => {
                let q = q.to_lowercase();
                entry.message.to_lowercase().contains(&q) || entry.category.as_str().contains(&q)
            }
        };
        search_ok
            && self.level.map_or(true, |l| l == entry.level)
            && self.category.map_or(true, |c| c == entry.category)
    }
}

/// Newest-first activity history.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
    next_id: u64,
}

const INFO_MESSAGES: &[&str] = &[
    "System started successfully",
    "Camera connection established",
    "Person recognized: Alex Johnson (87% confidence)",
    "Person recognized: Sarah Williams (93% confidence)",
    "New person added to database: Michael Chen",
    "Recognition service initialized",
    "Camera stream switched to HD resolution",
    "User login: admin@system.com",
    "Configuration updated",
    "Daily backup completed",
];

const WARNING_MESSAGES: &[&str] = &[
    "Camera connection unstable",
    "Low recognition confidence: Emily Rodriguez (65%)",
    "System resource usage high (CPU: 87%)",
    "Database approaching storage limit (85% used)",
    "Recognition service performance degraded",
];

const ERROR_MESSAGES: &[&str] = &[
    "Camera connection lost",
    "Failed to recognize person (below threshold)",
    "Database connection error",
    "Recognition service crashed",
    "Failed to save new person data",
];

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry stamped `now` and return its id.
    pub fn record(
        &mut self,
        level: LogLevel,
        category: LogCategory,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> String {
        let id = self.allocate_id();
        let entry = LogEntry {
            id: id.clone(),
            timestamp: now,
            level,
            category,
            message: message.into(),
        };
        // Keep newest-first even if a caller records out of order.
        let pos = self
            .entries
            .iter()
            .position(|e| e.timestamp <= entry.timestamp)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        id
    }

    /// Drop entries older than `retention` relative to `now`. Returns how many were removed.
    ///
    /// A window reaching past the earliest representable time keeps everything.
    pub fn prune(&mut self, now: DateTime<Utc>, retention: Duration) -> usize {
        let Some(cutoff) = now.checked_sub_signed(retention) else {
            return 0;
        };
        let before = self.entries.len();
        self.entries.retain(|e| e.timestamp >= cutoff);
        before - self.entries.len()
    }

    pub fn query(&self, query: &LogQuery) -> Vec<&LogEntry> {
        self.entries.iter().filter(|e| query.matches(e)).collect()
    }

    pub fn entries(&self) -> impl ExactSizeIterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Generate `count` demo entries spread over the last 72 hours.
    ///
    /// Levels are weighted 70% info, 20% warning, 10% error.
    pub fn sample(count: usize, rng: &mut dyn RandomSource, now: DateTime<Utc>) -> Self {
        let mut log = ActivityLog::new();
        for _ in 0..count {
            let hours_ago = (rng.next_unit() * SAMPLE_WINDOW_HOURS).floor() as i64;
            let timestamp = now - Duration::hours(hours_ago);

            let roll = rng.next_unit();
            let (level, pool) = if roll < 0.7 {
                (LogLevel::Info, INFO_MESSAGES)
            } else if roll < 0.9 {
                (LogLevel::Warning, WARNING_MESSAGES)
            } else {
                (LogLevel::Error, ERROR_MESSAGES)
            };
            let message = pool[rng.pick_index(pool.len())];
            let category = LogCategory::ALL[rng.pick_index(LogCategory::ALL.len())];

            log.record(level, category, message, timestamp);
        }
        log
    }

    fn allocate_id(&mut self) -> String {
        let id = format!("log-{}", self.next_id);
        self.next_id += 1;
        id
    }
}
