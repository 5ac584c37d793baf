use crate::config::Config;
use chrono::{DateTime, Utc};
use facetrack_core::{
    ActivityLog, Clock, EventLog, EventSource, FeedCadence, Identity, LogCategory, LogEntry,
    LogLevel, LogQuery, NewIdentity, PromotionCadence, RandomSource, RecognitionEvent, RngSource,
    Roster, RosterError, Session, SessionError, SessionSnapshot, Settings, SettingsError,
    SystemClock,
};
use facetrack_hw::{
    fixtures, CameraConfig, CameraError, CameraRegistry, NewCamera, StreamError, StreamProbe,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::ops::ControlFlow;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, Interval, MissedTickBehavior};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("roster error: {0}")]
    Roster(#[from] RosterError),
    #[error("camera error: {0}")]
    Camera(#[from] CameraError),
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),
    #[error("engine task exited")]
    ChannelClosed,
}

/// Dashboard status.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub system_name: String,
    pub version: &'static str,
    #[serde(flatten)]
    pub session: SessionSnapshot,
    pub active_cameras: usize,
    pub total_cameras: usize,
}

/// A roster entry with its presence flag.
#[derive(Debug, Clone, Serialize)]
pub struct PersonView {
    #[serde(flatten)]
    pub identity: Identity,
    pub present: bool,
}

/// A feed event joined with the identity it refers to.
#[derive(Debug, Clone, Serialize)]
pub struct FeedEntry {
    pub identity_id: String,
    pub name: String,
    pub role: String,
    pub photo_url: String,
    pub timestamp: DateTime<Utc>,
    pub confidence: u8,
    pub source: EventSource,
}

impl FeedEntry {
    fn new(event: &RecognitionEvent, identity: &Identity) -> Self {
        Self {
            identity_id: event.identity_id.clone(),
            name: identity.name.clone(),
            role: identity.role.clone(),
            photo_url: identity.photo_url.clone(),
            timestamp: event.timestamp,
            confidence: event.confidence,
            source: event.source,
        }
    }
}

/// Messages sent from handles to the engine task.
enum EngineRequest {
    StartSession {
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    StopSession {
        reply: oneshot::Sender<bool>,
    },
    ResetSession {
        reply: oneshot::Sender<()>,
    },
    Status {
        reply: oneshot::Sender<StatusReport>,
    },
    Enroll {
        form: NewIdentity,
        reply: oneshot::Sender<Result<Identity, EngineError>>,
    },
    RemovePerson {
        id: String,
        reply: oneshot::Sender<Result<Identity, EngineError>>,
    },
    People {
        search: String,
        reply: oneshot::Sender<Vec<PersonView>>,
    },
    Feed {
        limit: usize,
        reply: oneshot::Sender<Vec<FeedEntry>>,
    },
    AddCamera {
        form: NewCamera,
        reply: oneshot::Sender<Result<CameraConfig, EngineError>>,
    },
    SetCameraActive {
        id: String,
        active: bool,
        reply: oneshot::Sender<Result<CameraConfig, EngineError>>,
    },
    RemoveCamera {
        id: String,
        reply: oneshot::Sender<Result<CameraConfig, EngineError>>,
    },
    Cameras {
        reply: oneshot::Sender<Vec<CameraConfig>>,
    },
    Logs {
        query: LogQuery,
        reply: oneshot::Sender<Vec<LogEntry>>,
    },
    Settings {
        reply: oneshot::Sender<Settings>,
    },
    UpdateSettings {
        patch: serde_json::Value,
        reply: oneshot::Sender<Result<Settings, EngineError>>,
    },
    ResetSettings {
        reply: oneshot::Sender<Settings>,
    },
    Record {
        level: LogLevel,
        category: LogCategory,
        message: String,
    },
    Shutdown,
}

/// Clone-safe handle to the engine task.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
    probe: StreamProbe,
}

impl EngineHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> EngineRequest,
    ) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Activate recognition. Fails with `NoCameraConfigured` when no camera is active.
    pub async fn start_session(&self) -> Result<(), EngineError> {
        self.request(|reply| EngineRequest::StartSession { reply }).await?
    }

    /// Deactivate recognition. Returns whether a session was running.
    pub async fn stop_session(&self) -> Result<bool, EngineError> {
        self.request(|reply| EngineRequest::StopSession { reply }).await
    }

    /// Stop and clear presence and the recognition feed.
    pub async fn reset_session(&self) -> Result<(), EngineError> {
        self.request(|reply| EngineRequest::ResetSession { reply }).await
    }

    pub async fn status(&self) -> Result<StatusReport, EngineError> {
        self.request(|reply| EngineRequest::Status { reply }).await
    }

    pub async fn enroll(&self, form: NewIdentity) -> Result<Identity, EngineError> {
        self.request(|reply| EngineRequest::Enroll { form, reply }).await?
    }

    pub async fn remove_person(&self, id: &str) -> Result<Identity, EngineError> {
        let id = id.to_string();
        self.request(|reply| EngineRequest::RemovePerson { id, reply }).await?
    }

    /// Roster entries matching `search` (name or role, case-insensitive).
    pub async fn people(&self, search: &str) -> Result<Vec<PersonView>, EngineError> {
        let search = search.to_string();
        self.request(|reply| EngineRequest::People { search, reply }).await
    }

    /// Newest-first feed, orphaned events skipped. `limit == 0` returns everything.
    pub async fn feed(&self, limit: usize) -> Result<Vec<FeedEntry>, EngineError> {
        self.request(|reply| EngineRequest::Feed { limit, reply }).await
    }

    pub async fn add_camera(&self, form: NewCamera) -> Result<CameraConfig, EngineError> {
        self.request(|reply| EngineRequest::AddCamera { form, reply }).await?
    }

    pub async fn set_camera_active(
        &self,
        id: &str,
        active: bool,
    ) -> Result<CameraConfig, EngineError> {
        let id = id.to_string();
        self.request(|reply| EngineRequest::SetCameraActive { id, active, reply })
            .await?
    }

    pub async fn remove_camera(&self, id: &str) -> Result<CameraConfig, EngineError> {
        let id = id.to_string();
        self.request(|reply| EngineRequest::RemoveCamera { id, reply }).await?
    }

    pub async fn cameras(&self) -> Result<Vec<CameraConfig>, EngineError> {
        self.request(|reply| EngineRequest::Cameras { reply }).await
    }

    pub async fn logs(&self, query: LogQuery) -> Result<Vec<LogEntry>, EngineError> {
        self.request(|reply| EngineRequest::Logs { query, reply }).await
    }

    pub async fn settings(&self) -> Result<Settings, EngineError> {
        self.request(|reply| EngineRequest::Settings { reply }).await
    }

    /// Overlay `patch` (a JSON object of setting names to values) onto the
    /// current settings. Nothing changes if any key or value is rejected.
    pub async fn update_settings(&self, patch: serde_json::Value) -> Result<Settings, EngineError> {
        self.request(|reply| EngineRequest::UpdateSettings { patch, reply })
            .await?
    }

    /// Restore every setting to its default.
    pub async fn reset_settings(&self) -> Result<Settings, EngineError> {
        self.request(|reply| EngineRequest::ResetSettings { reply }).await
    }

    /// Simulate connecting to a camera's stream.
    ///
    /// The wait happens on the caller's task so the engine keeps ticking.
    pub async fn connect_camera(&self, id: &str) -> Result<(), EngineError> {
        let camera = self
            .cameras()
            .await?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| CameraError::NotFound(id.to_string()))?;

        let result = self.probe.connect(&camera.url).await;
        let (level, message) = match &result {
            Ok(()) => (
                LogLevel::Info,
                format!("Camera \"{}\" stream connected", camera.name),
            ),
            Err(e) => (LogLevel::Error, format!("Camera \"{}\": {e}", camera.name)),
        };
        self.tx
            .send(EngineRequest::Record {
                level,
                category: LogCategory::Camera,
                message,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        result.map_err(EngineError::from)
    }

    /// Stop the engine task. Pending cadence ticks never fire afterwards.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(EngineRequest::Shutdown).await;
    }
}

/// Cadence timers; present only while a session is active.
struct Timers {
    promotion: Option<Interval>,
    feed: Option<Interval>,
}

impl Timers {
    fn idle() -> Self {
        Self {
            promotion: None,
            feed: None,
        }
    }

    fn armed(&self) -> bool {
        self.promotion.is_some() || self.feed.is_some()
    }

    fn arm(&mut self, promotion_period: Duration, feed_period: Duration) {
        self.promotion = Some(cadence_timer(promotion_period));
        self.feed = Some(cadence_timer(feed_period));
    }

    fn disarm(&mut self) {
        self.promotion = None;
        self.feed = None;
    }
}

/// First tick one full period from now, like a browser interval.
fn cadence_timer(period: Duration) -> Interval {
    let mut timer = tokio::time::interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Session owner. Runs as a single task: requests and cadence ticks are
/// handled one at a time, in arrival order.
struct Engine {
    session: Session,
    cameras: CameraRegistry,
    activity: ActivityLog,
    rng: Box<dyn RandomSource + Send>,
    clock: SystemClock,
    settings: Settings,
    autostart: bool,
}

impl Engine {
    fn new(
        config: &Config,
        roster: Roster,
        mut cameras: CameraRegistry,
        mut rng: Box<dyn RandomSource + Send>,
    ) -> Self {
        let clock = SystemClock;
        let settings = Settings {
            system_name: config.system_name.clone(),
            log_retention_days: config.log_retention_days,
            ..Settings::default()
        }
        .clamped();
        cameras.set_default_protocol(settings.default_protocol.as_str());
        let session = Session::new(
            roster,
            EventLog::with_capacity(config.feed_capacity),
            PromotionCadence::new(config.promotion_period),
            FeedCadence::new(config.feed_period),
        );
        let activity = ActivityLog::sample(config.sample_log_count, rng.as_mut(), clock.now());
        Self {
            session,
            cameras,
            activity,
            rng,
            clock,
            settings,
            autostart: config.autostart,
        }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<EngineRequest>) {
        tracing::info!(
            people = self.session.roster().len(),
            cameras = self.cameras.list().len(),
            "engine task started"
        );
        let mut timers = Timers::idle();
        self.record(LogLevel::Info, LogCategory::System, "Recognition service initialized");
        if self.autostart {
            if let Err(e) = self.start_session(&mut timers) {
                tracing::debug!(error = %e, "autostart skipped");
            }
        }

        loop {
            tokio::select! {
                biased;
                _ = next_tick(&mut timers.promotion) => self.on_promotion_tick(),
                _ = next_tick(&mut timers.feed) => self.on_feed_tick(),
                req = rx.recv() => {
                    let Some(req) = req else { break };
                    if self.handle(req, &mut timers).is_break() {
                        break;
                    }
                }
            }
        }

        timers.disarm();
        self.session.stop();
        tracing::info!("engine task exiting");
    }

    fn handle(&mut self, req: EngineRequest, timers: &mut Timers) -> ControlFlow<()> {
        match req {
            EngineRequest::StartSession { reply } => {
                let _ = reply.send(self.start_session(timers));
            }
            EngineRequest::StopSession { reply } => {
                let _ = reply.send(self.stop_session(timers));
            }
            EngineRequest::ResetSession { reply } => {
                self.stop_session(timers);
                self.session.reset();
                self.record(LogLevel::Info, LogCategory::System, "Recognition session reset");
                let _ = reply.send(());
            }
            EngineRequest::Status { reply } => {
                let _ = reply.send(self.status());
            }
            EngineRequest::Enroll { form, reply } => {
                let result = self.session.enroll(form).map_err(EngineError::from);
                if let Ok(p) = &result {
                    let message = format!("New person added to database: {}", p.name);
                    self.record(LogLevel::Info, LogCategory::User, message);
                }
                let _ = reply.send(result);
            }
            EngineRequest::RemovePerson { id, reply } => {
                let result = self.session.remove_identity(&id).map_err(EngineError::from);
                if let Ok(p) = &result {
                    let message = format!("Person removed from database: {}", p.name);
                    self.record(LogLevel::Info, LogCategory::User, message);
                }
                let _ = reply.send(result);
            }
            EngineRequest::People { search, reply } => {
                let people = self
                    .session
                    .search(&search)
                    .into_iter()
                    .map(|p| PersonView {
                        identity: p.clone(),
                        present: self.session.is_present(&p.id),
                    })
                    .collect();
                let _ = reply.send(people);
            }
            EngineRequest::Feed { limit, reply } => {
                let limit = if limit == 0 { usize::MAX } else { limit };
                let entries = self
                    .session
                    .feed()
                    .resolved(self.session.roster().as_slice())
                    .take(limit)
                    .map(|(event, identity)| FeedEntry::new(event, identity))
                    .collect();
                let _ = reply.send(entries);
            }
            EngineRequest::AddCamera { form, reply } => {
                let result = self.cameras.add(form).map_err(EngineError::from);
                if let Ok(c) = &result {
                    let message = format!("Camera \"{}\" has been added", c.name);
                    self.record(LogLevel::Info, LogCategory::Camera, message);
                }
                let _ = reply.send(result);
            }
            EngineRequest::SetCameraActive { id, active, reply } => {
                let result = self
                    .cameras
                    .set_active(&id, active)
                    .cloned()
                    .map_err(EngineError::from);
                if let Ok(c) = &result {
                    let verb = if c.active { "activated" } else { "deactivated" };
                    let message = format!("Camera \"{}\" {verb}", c.name);
                    self.record(LogLevel::Info, LogCategory::Camera, message);
                    self.pause_if_unconfigured(timers);
                }
                let _ = reply.send(result);
            }
            EngineRequest::RemoveCamera { id, reply } => {
                let result = self.cameras.remove(&id).map_err(EngineError::from);
                if let Ok(c) = &result {
                    let message = format!("Camera \"{}\" has been removed", c.name);
                    self.record(LogLevel::Info, LogCategory::Camera, message);
                    self.pause_if_unconfigured(timers);
                }
                let _ = reply.send(result);
            }
            EngineRequest::Cameras { reply } => {
                let _ = reply.send(self.cameras.list().to_vec());
            }
            EngineRequest::Logs { query, reply } => {
                let entries = self.activity.query(&query).into_iter().cloned().collect();
                let _ = reply.send(entries);
            }
            EngineRequest::Settings { reply } => {
                let _ = reply.send(self.settings.clone());
            }
            EngineRequest::UpdateSettings { patch, reply } => {
                let result = match self.settings.patched(patch) {
                    Ok(updated) => {
                        self.apply_settings(updated, "System settings updated");
                        Ok(self.settings.clone())
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "settings update rejected");
                        Err(e.into())
                    }
                };
                let _ = reply.send(result);
            }
            EngineRequest::ResetSettings { reply } => {
                self.apply_settings(Settings::default(), "Settings restored to defaults");
                let _ = reply.send(self.settings.clone());
            }
            EngineRequest::Record {
                level,
                category,
                message,
            } => self.record(level, category, message),
            EngineRequest::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn start_session(&mut self, timers: &mut Timers) -> Result<(), EngineError> {
        match self.session.start(self.cameras.is_configured()) {
            Ok(()) => {
                if !timers.armed() {
                    timers.arm(self.session.promotion_period(), self.session.feed_period());
                    self.record(LogLevel::Info, LogCategory::System, "Recognition session started");
                }
                Ok(())
            }
            Err(e) => {
                self.record(
                    LogLevel::Warning,
                    LogCategory::System,
                    format!("Recognition start refused: {e}"),
                );
                Err(e.into())
            }
        }
    }

    fn stop_session(&mut self, timers: &mut Timers) -> bool {
        timers.disarm();
        let was_active = self.session.stop();
        if was_active {
            self.record(LogLevel::Info, LogCategory::System, "Recognition session stopped");
        }
        was_active
    }

    /// Replace the live settings and push them into the parts that use them.
    fn apply_settings(&mut self, settings: Settings, message: &str) {
        self.settings = settings;
        self.cameras
            .set_default_protocol(self.settings.default_protocol.as_str());
        let pruned = self
            .activity
            .prune(self.clock.now(), self.settings.log_retention());
        tracing::info!(
            system = %self.settings.system_name,
            retention_days = self.settings.log_retention_days,
            logging = self.settings.enable_logging,
            pruned,
            "settings applied"
        );
        self.record(LogLevel::Info, LogCategory::System, message);
    }

    /// An active session cannot outlive the last active camera.
    fn pause_if_unconfigured(&mut self, timers: &mut Timers) {
        if self.session.is_active() && !self.cameras.is_configured() {
            timers.disarm();
            self.session.stop();
            tracing::warn!("last active camera gone; recognition paused");
            self.record(
                LogLevel::Warning,
                LogCategory::Camera,
                "Recognition paused: no active camera",
            );
        }
    }

    fn on_promotion_tick(&mut self) {
        if let Some(event) = self.session.promote_tick(self.rng.as_mut(), &self.clock) {
            self.record_recognition(&event);
        }
    }

    fn on_feed_tick(&mut self) {
        if let Some(event) = self.session.feed_tick(self.rng.as_mut(), &self.clock) {
            self.record_recognition(&event);
        }
    }

    fn record_recognition(&mut self, event: &RecognitionEvent) {
        let Some(name) = self.session.identity(&event.identity_id).map(|p| p.name.clone()) else {
            return;
        };
        tracing::info!(
            id = %event.identity_id,
            name = %name,
            confidence = event.confidence,
            source = ?event.source,
            "recognized"
        );
        let message = format!("Person recognized: {name} ({}% confidence)", event.confidence);
        self.record(LogLevel::Info, LogCategory::Recognition, message);
    }

    fn record(&mut self, level: LogLevel, category: LogCategory, message: impl Into<String>) {
        let now = self.clock.now();
        let message = message.into();
        tracing::debug!(%level, %category, message = %message, "activity");
        if !self.settings.enable_logging {
            return;
        }
        self.activity.record(level, category, message, now);
        let pruned = self.activity.prune(now, self.settings.log_retention());
        if pruned > 0 {
            tracing::debug!(pruned, "activity entries expired");
        }
    }

    fn status(&self) -> StatusReport {
        StatusReport {
            system_name: self.settings.system_name.clone(),
            version: env!("CARGO_PKG_VERSION"),
            session: self.session.snapshot(),
            active_cameras: self.cameras.active_count(),
            total_cameras: self.cameras.list().len(),
        }
    }
}

/// Spawn the engine task on the current tokio runtime.
///
/// Seeds the roster and cameras from the embedded fixtures when enabled
/// and, with `autostart`, tries to start a session straight away.
pub fn spawn_engine(config: &Config) -> EngineHandle {
    let rng: Box<dyn RandomSource + Send> = match config.rng_seed {
        Some(seed) => {
            tracing::info!(seed, "using fixed RNG seed");
            Box::new(RngSource(StdRng::seed_from_u64(seed)))
        }
        None => Box::new(RngSource(StdRng::from_entropy())),
    };
    let (roster, cameras) = if config.seed_fixtures {
        (fixtures::sample_roster(), fixtures::sample_registry())
    } else {
        (Roster::new(), CameraRegistry::new())
    };

    let engine = Engine::new(config, roster, cameras, rng);
    spawn(engine, StreamProbe::new(config.stream_connect_delay))
}

fn spawn(engine: Engine, probe: StreamProbe) -> EngineHandle {
    let (tx, rx) = mpsc::channel::<EngineRequest>(16);
    tokio::spawn(engine.run(rx));
    EngineHandle { tx, probe }
}
