use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facetrack_core::{
    EventLog, EventSource, FeedCadence, ManualClock, PromotionCadence, RandomSource,
    RecognitionEvent, RngSource, Session, SessionSnapshot, Timeline,
};
use facetrack_hw::{fixtures, CameraRegistry};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

#[zbus::proxy(
    interface = "org.facetrack.Dashboard1",
    default_service = "org.facetrack.Dashboard1",
    default_path = "/org/facetrack/Dashboard1"
)]
trait Dashboard {
    async fn start_session(&self) -> zbus::Result<()>;
    async fn stop_session(&self) -> zbus::Result<bool>;
    async fn reset_session(&self) -> zbus::Result<()>;
    async fn status(&self) -> zbus::Result<String>;
    async fn enroll(
        &self,
        name: &str,
        role: &str,
        photo_url: &str,
        notes: &str,
    ) -> zbus::Result<String>;
    async fn remove_person(&self, id: &str) -> zbus::Result<bool>;
    async fn list_people(&self, search: &str) -> zbus::Result<String>;
    async fn feed(&self, limit: u32) -> zbus::Result<String>;
    async fn add_camera(&self, name: &str, url: &str, protocol: &str) -> zbus::Result<String>;
    async fn set_camera_active(&self, id: &str, active: bool) -> zbus::Result<String>;
    async fn remove_camera(&self, id: &str) -> zbus::Result<bool>;
    async fn list_cameras(&self) -> zbus::Result<String>;
    async fn test_camera(&self, id: &str) -> zbus::Result<bool>;
    async fn logs(&self, search: &str, level: &str, category: &str) -> zbus::Result<String>;
    async fn settings(&self) -> zbus::Result<String>;
    async fn update_settings(&self, patch: &str) -> zbus::Result<String>;
    async fn reset_settings(&self) -> zbus::Result<String>;
}

const MAX_SIMULATE_SECONDS: u64 = 86_400;

#[derive(Parser)]
#[command(name = "facetrack", about = "FaceTrack recognition dashboard CLI")]
struct Cli {
    /// Talk to a daemon on the system bus instead of the session bus
    #[arg(long, global = true)]
    system: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a recognition session
    Start,
    /// Stop the recognition session
    Stop,
    /// Stop and clear presence and the recognition feed
    Reset,
    /// Show dashboard status
    Status,
    /// Enroll a new person
    Enroll {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        role: String,
        /// Photo URL shown on the dashboard
        #[arg(short, long)]
        photo: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Remove an enrolled person
    Remove {
        /// Person ID to remove
        id: String,
    },
    /// List enrolled people, optionally filtered by name or role
    List {
        #[arg(default_value = "")]
        search: String,
    },
    /// Show the newest recognition events
    Feed {
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },
    /// List configured cameras
    Cameras,
    /// Add a camera
    CameraAdd {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        url: String,
        /// Stream protocol (defaults to rtsp)
        #[arg(long, default_value = "")]
        protocol: String,
    },
    /// Activate or deactivate a camera
    CameraToggle {
        id: String,
        /// Deactivate instead of activate
        #[arg(long)]
        off: bool,
    },
    /// Remove a camera
    CameraRemove { id: String },
    /// Run a simulated stream connection test
    CameraTest { id: String },
    /// Query the activity log
    Logs {
        #[arg(short, long, default_value = "")]
        search: String,
        /// info, warning or error
        #[arg(short, long, default_value = "")]
        level: String,
        /// system, recognition, camera or user
        #[arg(short, long, default_value = "")]
        category: String,
    },
    /// Show dashboard settings
    Settings,
    /// Change settings, e.g. `log_retention_days=7 default_protocol=hls`
    SettingsSet {
        #[arg(required = true, value_parser = parse_assignment)]
        assignments: Vec<(String, String)>,
    },
    /// Restore all settings to their defaults
    SettingsReset,
    /// Replay both recognition cadences offline on a logical clock
    Simulate {
        /// Logical seconds to simulate (at most one day)
        #[arg(
            short,
            long,
            default_value_t = 60,
            value_parser = clap::value_parser!(u64).range(1..=MAX_SIMULATE_SECONDS)
        )]
        seconds: u64,
        /// RNG seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Commands::Simulate { seconds, seed } = cli.command {
        let rng = match seed {
            Some(seed) => RngSource(StdRng::seed_from_u64(seed)),
            None => RngSource(StdRng::from_entropy()),
        };
        let (events, snapshot) = simulate(Duration::from_secs(seconds), rng);
        for line in &events {
            println!("{line}");
        }
        println!(
            "{} events, {}/{} present, average confidence {}",
            snapshot.events,
            snapshot.present_today,
            snapshot.total_people,
            snapshot
                .average_confidence
                .map_or_else(|| "n/a".to_string(), |c| format!("{c}%"))
        );
        return Ok(());
    }

    let conn = if cli.system {
        zbus::Connection::system().await
    } else {
        zbus::Connection::session().await
    }
    .context("cannot connect to D-Bus")?;
    let proxy = DashboardProxy::new(&conn)
        .await
        .context("facetrackd is not reachable")?;

    match cli.command {
        Commands::Start => {
            proxy.start_session().await?;
            println!("Recognition started");
        }
        Commands::Stop => {
            if proxy.stop_session().await? {
                println!("Recognition stopped");
            } else {
                println!("Recognition was not running");
            }
        }
        Commands::Reset => {
            proxy.reset_session().await?;
            println!("Session reset");
        }
        Commands::Status => print_json(&proxy.status().await?)?,
        Commands::Enroll {
            name,
            role,
            photo,
            notes,
        } => print_json(&proxy.enroll(&name, &role, &photo, &notes).await?)?,
        Commands::Remove { id } => {
            proxy.remove_person(&id).await?;
            println!("Removed {id}");
        }
        Commands::List { search } => print_json(&proxy.list_people(&search).await?)?,
        Commands::Feed { limit } => print_json(&proxy.feed(limit).await?)?,
        Commands::Cameras => print_json(&proxy.list_cameras().await?)?,
        Commands::CameraAdd {
            name,
            url,
            protocol,
        } => print_json(&proxy.add_camera(&name, &url, &protocol).await?)?,
        Commands::CameraToggle { id, off } => {
            print_json(&proxy.set_camera_active(&id, !off).await?)?
        }
        Commands::CameraRemove { id } => {
            proxy.remove_camera(&id).await?;
            println!("Removed camera {id}");
        }
        Commands::CameraTest { id } => {
            println!("Connecting to camera {id}...");
            if proxy.test_camera(&id).await? {
                println!("Stream connected");
            } else {
                println!("Connection failed; check the camera URL");
            }
        }
        Commands::Logs {
            search,
            level,
            category,
        } => print_json(&proxy.logs(&search, &level, &category).await?)?,
        Commands::Settings => print_json(&proxy.settings().await?)?,
        Commands::SettingsSet { assignments } => {
            let patch = settings_patch(assignments);
            print_json(&proxy.update_settings(&patch.to_string()).await?)?
        }
        Commands::SettingsReset => print_json(&proxy.reset_settings().await?)?,
        Commands::Simulate { .. } => unreachable!("handled before connecting"),
    }

    Ok(())
}

fn parse_assignment(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got `{arg}`")),
    }
}

/// Build a JSON settings patch. Values that parse as JSON (numbers, booleans)
/// keep their type; anything else is sent as a string.
fn settings_patch(assignments: Vec<(String, String)>) -> serde_json::Value {
    let fields = assignments
        .into_iter()
        .map(|(key, raw)| {
            let value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));
            (key, value)
        })
        .collect();
    serde_json::Value::Object(fields)
}

fn print_json(raw: &str) -> Result<()> {
    let value: serde_json::Value = serde_json::from_str(raw).context("malformed daemon reply")?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Run the demo roster through `span` of logical time.
///
/// Returns one rendered line per event plus the final counters.
fn simulate(span: Duration, mut rng: impl RandomSource) -> (Vec<String>, SessionSnapshot) {
    let mut session = Session::new(
        fixtures::sample_roster(),
        EventLog::unbounded(),
        PromotionCadence::new(facetrack_core::scheduler::DEFAULT_PROMOTION_PERIOD),
        FeedCadence::new(facetrack_core::scheduler::DEFAULT_FEED_PERIOD),
    );
    let cameras: CameraRegistry = fixtures::sample_registry();
    if let Err(e) = session.start(cameras.is_configured()) {
        tracing::warn!(error = %e, "simulation has nothing to do");
        return (Vec::new(), session.snapshot());
    }

    let clock = ManualClock::default();
    let origin = facetrack_core::Clock::now(&clock);
    let mut timeline = Timeline::for_session(&session);
    let events = timeline.run_for(span, &mut session, &mut rng, &clock);

    let lines = events
        .iter()
        .map(|e| render(e, &session, origin))
        .collect();
    (lines, session.snapshot())
}

fn render(
    event: &RecognitionEvent,
    session: &Session,
    origin: chrono::DateTime<chrono::Utc>,
) -> String {
    let offset = (event.timestamp - origin).num_seconds();
    let name = session
        .identity(&event.identity_id)
        .map_or(event.identity_id.as_str(), |p| p.name.as_str());
    let source = match event.source {
        EventSource::Promotion => "arrived",
        EventSource::Feed => "seen",
    };
    format!("[+{offset:>4}s] {source:<8} {name:<20} {}%", event.confidence)
}
