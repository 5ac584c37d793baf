//! facetrack-core: Simulated recognition engine for the FaceTrack dashboard.
//!
//! Owns the roster, presence tracking, the two recognition cadences
//! (roster promotion and feed sampling), the recognition event feed, the
//! activity log and the dashboard settings. Everything is driven by an injected random source
//! and clock so the host decides when and how time passes.

pub mod activity;
pub mod clock;
pub mod event_log;
pub mod presence;
pub mod random;
pub mod roster;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod timeline;
pub mod types;

pub use activity::{ActivityLog, LogCategory, LogEntry, LogLevel, LogQuery};
pub use clock::{Clock, ManualClock, SystemClock};
pub use event_log::EventLog;
pub use presence::PresenceSet;
pub use random::{RandomSource, RngSource, Scripted};
pub use roster::{NewIdentity, Roster, RosterError};
pub use scheduler::{FeedCadence, PromotionCadence};
pub use session::{Session, SessionError, SessionSnapshot, SessionState};
pub use settings::{
    ProcessingMode, RecognitionModel, Settings, SettingsError, StreamProtocol, StreamQuality,
};
pub use timeline::Timeline;
pub use types::{EventSource, Identity, RecognitionEvent};
