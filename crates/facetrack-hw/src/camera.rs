//! Camera configuration registry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Protocol assumed when a camera is added without one.
pub const DEFAULT_PROTOCOL: &str = "rtsp";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("camera not found: {0}")]
    NotFound(String),
    #[error("duplicate camera id: {0}")]
    DuplicateId(String),
}

/// A configured camera feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_protocol() -> String {
    DEFAULT_PROTOCOL.to_string()
}

fn default_active() -> bool {
    true
}

/// Camera setup form submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCamera {
    pub name: String,
    pub url: String,
    /// Empty means the registry default protocol.
    #[serde(default)]
    pub protocol: String,
}

/// Ordered set of configured cameras.
#[derive(Debug, Clone, Default)]
pub struct CameraRegistry {
    cameras: Vec<CameraConfig>,
    /// Overrides [`DEFAULT_PROTOCOL`] for cameras added without one.
    default_protocol: Option<String>,
}

impl CameraRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_protocol(&self) -> &str {
        self.default_protocol.as_deref().unwrap_or(DEFAULT_PROTOCOL)
    }

    pub fn set_default_protocol(&mut self, protocol: &str) {
        let protocol = protocol.trim().to_ascii_lowercase();
        self.default_protocol = (!protocol.is_empty()).then_some(protocol);
    }

    /// Add a camera. New cameras start active.
    pub fn add(&mut self, form: NewCamera) -> Result<CameraConfig, CameraError> {
        let name = form.name.trim();
        let url = form.url.trim();
        if name.is_empty() {
            return Err(CameraError::MissingField("name"));
        }
        if url.is_empty() {
            return Err(CameraError::MissingField("url"));
        }
        let protocol = match form.protocol.trim() {
            "" => self.default_protocol().to_string(),
            p => p.to_ascii_lowercase(),
        };

        let camera = CameraConfig {
            id: format!("cam-{}", uuid::Uuid::new_v4().simple()),
            name: name.to_string(),
            url: url.to_string(),
            protocol,
            active: true,
        };
        tracing::info!(
            id = %camera.id,
            name = %camera.name,
            protocol = %camera.protocol,
            "camera added"
        );
        self.cameras.push(camera.clone());
        Ok(camera)
    }

    /// Insert a pre-built camera (fixtures). Ids must stay unique.
    pub fn insert(&mut self, camera: CameraConfig) -> Result<(), CameraError> {
        if self.get(&camera.id).is_some() {
            return Err(CameraError::DuplicateId(camera.id));
        }
        self.cameras.push(camera);
        Ok(())
    }

    /// Set a camera's active flag. Returns the updated config.
    pub fn set_active(&mut self, id: &str, active: bool) -> Result<&CameraConfig, CameraError> {
        let camera = self
            .cameras
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| CameraError::NotFound(id.to_string()))?;
        if camera.active != active {
            camera.active = active;
            tracing::info!(id, name = %camera.name, active, "camera toggled");
        }
        Ok(camera)
    }

    pub fn toggle(&mut self, id: &str) -> Result<&CameraConfig, CameraError> {
        let current = self
            .get(id)
            .map(|c| c.active)
            .ok_or_else(|| CameraError::NotFound(id.to_string()))?;
        self.set_active(id, !current)
    }

    pub fn remove(&mut self, id: &str) -> Result<CameraConfig, CameraError> {
        let pos = self
            .cameras
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| CameraError::NotFound(id.to_string()))?;
        let camera = self.cameras.remove(pos);
        tracing::info!(id, name = %camera.name, "camera removed");
        Ok(camera)
    }

    pub fn get(&self, id: &str) -> Option<&CameraConfig> {
        self.cameras.iter().find(|c| c.id == id)
    }

    pub fn list(&self) -> &[CameraConfig] {
        &self.cameras
    }

    pub fn active_count(&self) -> usize {
        self.cameras.iter().filter(|c| c.active).count()
    }

    /// At least one camera is active. Gates recognition sessions.
    pub fn is_configured(&self) -> bool {
        self.active_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, url: &str, protocol: &str) -> NewCamera {
        NewCamera {
            name: name.into(),
            url: url.into(),
            protocol: protocol.into(),
        }
    }

    #[test]
    fn test_add_defaults() {
        let mut reg = CameraRegistry::new();
        assert!(!reg.is_configured());
        let cam = reg.add(form("Main Entrance", "rtsp://10.0.0.1/stream", "")).unwrap();
        assert!(cam.id.starts_with("cam-"));
        assert_eq!(cam.protocol, "rtsp");
        assert!(cam.active);
        assert!(reg.is_configured());
    }

    #[test]
    fn test_add_requires_name_and_url() {
        let mut reg = CameraRegistry::new();
        assert_eq!(reg.add(form("", "rtsp://x", "rtsp")), Err(CameraError::MissingField("name")));
        assert_eq!(reg.add(form("Lobby", " ", "rtsp")), Err(CameraError::MissingField("url")));
        assert!(reg.list().is_empty());
    }

    #[test]
    fn test_toggle_changes_configured() {
        let mut reg = CameraRegistry::new();
        let cam = reg.add(form("Lobby", "rtmp://10.0.0.2/live", "RTMP")).unwrap();
        assert_eq!(cam.protocol, "rtmp");
        assert!(!reg.toggle(&cam.id).unwrap().active);
        assert!(!reg.is_configured());
        assert!(reg.toggle(&cam.id).unwrap().active);
        assert_eq!(reg.active_count(), 1);
    }

    #[test]
    fn test_add_uses_configured_default_protocol() {
        let mut reg = CameraRegistry::new();
        reg.set_default_protocol("HLS");
        assert_eq!(reg.default_protocol(), "hls");
        let cam = reg.add(form("Garage", "https://10.0.0.3/live.m3u8", "")).unwrap();
        assert_eq!(cam.protocol, "hls");
        let cam = reg.add(form("Yard", "rtsp://10.0.0.4/s", "rtsp")).unwrap();
        assert_eq!(cam.protocol, "rtsp");

        reg.set_default_protocol("");
        assert_eq!(reg.default_protocol(), DEFAULT_PROTOCOL);
    }

    #[test]
    fn test_unknown_camera() {
        let mut reg = CameraRegistry::new();
        assert_eq!(reg.toggle("nope").unwrap_err(), CameraError::NotFound("nope".into()));
        assert_eq!(reg.remove("nope").unwrap_err(), CameraError::NotFound("nope".into()));
    }

    #[test]
    fn test_remove() {
        let mut reg = CameraRegistry::new();
        let cam = reg.add(form("Dock", "rtsp://d", "rtsp")).unwrap();
        let removed = reg.remove(&cam.id).unwrap();
        assert_eq!(removed.name, "Dock");
        assert!(reg.get(&cam.id).is_none());
        assert!(!reg.is_configured());
    }

    #[test]
    fn test_insert_duplicate() {
        let mut reg = CameraRegistry::new();
        let cam = reg.add(form("Dock", "rtsp://d", "rtsp")).unwrap();
        assert_eq!(reg.insert(cam.clone()), Err(CameraError::DuplicateId(cam.id)));
    }
}
