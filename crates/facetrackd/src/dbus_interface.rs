use crate::engine::{EngineError, EngineHandle};
use facetrack_core::{LogQuery, NewIdentity, RosterError};
use facetrack_hw::{CameraError, NewCamera};
use serde::Serialize;
use zbus::interface;

/// D-Bus interface for the FaceTrack dashboard daemon.
///
/// Bus name: org.facetrack.Dashboard1
/// Object path: /org/facetrack/Dashboard1
///
/// Structured replies are JSON strings.
pub struct DashboardService {
    engine: EngineHandle,
}

impl DashboardService {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }
}

#[interface(name = "org.facetrack.Dashboard1")]
impl DashboardService {
    /// Start recognition. Fails while no camera is active.
    async fn start_session(&self) -> zbus::fdo::Result<()> {
        tracing::info!("start_session requested");
        self.engine.start_session().await.map_err(to_fdo)
    }

    /// Stop recognition. Returns false if it was not running.
    async fn stop_session(&self) -> zbus::fdo::Result<bool> {
        tracing::info!("stop_session requested");
        self.engine.stop_session().await.map_err(to_fdo)
    }

    async fn reset_session(&self) -> zbus::fdo::Result<()> {
        tracing::info!("reset_session requested");
        self.engine.reset_session().await.map_err(to_fdo)
    }

    async fn status(&self) -> zbus::fdo::Result<String> {
        to_json(&self.engine.status().await.map_err(to_fdo)?)
    }

    /// Enroll a person. Empty `notes` means none.
    async fn enroll(
        &self,
        name: &str,
        role: &str,
        photo_url: &str,
        notes: &str,
    ) -> zbus::fdo::Result<String> {
        tracing::info!(name, role, "enroll requested");
        let form = NewIdentity {
            name: name.to_string(),
            role: role.to_string(),
            photo_url: photo_url.to_string(),
            notes: Some(notes.to_string()),
        };
        to_json(&self.engine.enroll(form).await.map_err(to_fdo)?)
    }

    async fn remove_person(&self, id: &str) -> zbus::fdo::Result<bool> {
        tracing::info!(id, "remove_person requested");
        self.engine.remove_person(id).await.map_err(to_fdo)?;
        Ok(true)
    }

    /// Roster with presence flags. Empty `search` lists everyone.
    async fn list_people(&self, search: &str) -> zbus::fdo::Result<String> {
        to_json(&self.engine.people(search).await.map_err(to_fdo)?)
    }

    /// Newest-first recognition feed. `limit` 0 returns all entries.
    async fn feed(&self, limit: u32) -> zbus::fdo::Result<String> {
        to_json(&self.engine.feed(limit as usize).await.map_err(to_fdo)?)
    }

    async fn add_camera(
        &self,
        name: &str,
        url: &str,
        protocol: &str,
    ) -> zbus::fdo::Result<String> {
        tracing::info!(name, url, "add_camera requested");
        let form = NewCamera {
            name: name.to_string(),
            url: url.to_string(),
            protocol: protocol.to_string(),
        };
        to_json(&self.engine.add_camera(form).await.map_err(to_fdo)?)
    }

    async fn set_camera_active(&self, id: &str, active: bool) -> zbus::fdo::Result<String> {
        tracing::info!(id, active, "set_camera_active requested");
        to_json(&self.engine.set_camera_active(id, active).await.map_err(to_fdo)?)
    }

    async fn remove_camera(&self, id: &str) -> zbus::fdo::Result<bool> {
        tracing::info!(id, "remove_camera requested");
        self.engine.remove_camera(id).await.map_err(to_fdo)?;
        Ok(true)
    }

    async fn list_cameras(&self) -> zbus::fdo::Result<String> {
        to_json(&self.engine.cameras().await.map_err(to_fdo)?)
    }

    /// Simulated stream connection test. Blocks for the configured connect delay.
    async fn test_camera(&self, id: &str) -> zbus::fdo::Result<bool> {
        tracing::info!(id, "test_camera requested");
        match self.engine.connect_camera(id).await {
            Ok(()) => Ok(true),
            Err(EngineError::Stream(e)) => {
                tracing::warn!(id, error = %e, "camera test failed");
                Ok(false)
            }
            Err(e) => Err(to_fdo(e)),
        }
    }

    async fn settings(&self) -> zbus::fdo::Result<String> {
        to_json(&self.engine.settings().await.map_err(to_fdo)?)
    }

    /// Apply a JSON object of setting names to values. Returns the new settings.
    async fn update_settings(&self, patch: &str) -> zbus::fdo::Result<String> {
        tracing::info!(patch, "update_settings requested");
        let patch: serde_json::Value = serde_json::from_str(patch)
            .map_err(|e| zbus::fdo::Error::InvalidArgs(format!("settings patch: {e}")))?;
        to_json(&self.engine.update_settings(patch).await.map_err(to_fdo)?)
    }

    async fn reset_settings(&self) -> zbus::fdo::Result<String> {
        tracing::info!("reset_settings requested");
        to_json(&self.engine.reset_settings().await.map_err(to_fdo)?)
    }

    /// Activity log filtered by text, level and category. Empty strings match all.
    async fn logs(
        &self,
        search: &str,
        level: &str,
        category: &str,
    ) -> zbus::fdo::Result<String> {
        let query = LogQuery {
            search: Some(search.to_string()),
            level: parse_filter(level)?,
            category: parse_filter(category)?,
        };
        to_json(&self.engine.logs(query).await.map_err(to_fdo)?)
    }
}

fn parse_filter<T>(value: &str) -> zbus::fdo::Result<Option<T>>
where
    T: std::str::FromStr<Err = String>,
{
    if value.is_empty() {
        return Ok(None);
    }
    value.parse().map(Some).map_err(zbus::fdo::Error::InvalidArgs)
}

fn to_json<T: Serialize>(value: &T) -> zbus::fdo::Result<String> {
    serde_json::to_string(value).map_err(|e| zbus::fdo::Error::Failed(e.to_string()))
}

fn to_fdo(e: EngineError) -> zbus::fdo::Error {
    match &e {
        EngineError::Roster(RosterError::MissingField(_) | RosterError::UnknownIdentity(_))
        | EngineError::Camera(CameraError::MissingField(_) | CameraError::NotFound(_))
        | EngineError::Settings(_) => {
            zbus::fdo::Error::InvalidArgs(e.to_string())
        }
        _ => zbus::fdo::Error::Failed(e.to_string()),
    }
}
