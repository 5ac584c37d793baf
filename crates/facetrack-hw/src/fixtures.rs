//! Demo fixtures.
//!
//! Sample people and cameras used to populate a fresh dashboard. Fixture
//! files are embedded at compile time from `contrib/seed/*.toml`.

use crate::camera::{CameraConfig, CameraRegistry};
use facetrack_core::{Identity, Roster};
use serde::Deserialize;
use std::sync::OnceLock;

const PEOPLE_TOML: &str = include_str!("../../../contrib/seed/people.toml");
const CAMERAS_TOML: &str = include_str!("../../../contrib/seed/cameras.toml");

static PEOPLE: OnceLock<Vec<Identity>> = OnceLock::new();
static CAMERAS: OnceLock<Vec<CameraConfig>> = OnceLock::new();

#[derive(Debug, Deserialize)]
struct PeopleFile {
    #[serde(default)]
    person: Vec<Identity>,
}

#[derive(Debug, Deserialize)]
struct CamerasFile {
    #[serde(default)]
    camera: Vec<CameraConfig>,
}

fn parse_people(src: &str) -> Vec<Identity> {
    match toml::from_str::<PeopleFile>(src) {
        Ok(f) => f.person,
        Err(e) => {
            tracing::error!(error = %e, "bad people fixture TOML");
            Vec::new()
        }
    }
}

fn parse_cameras(src: &str) -> Vec<CameraConfig> {
    match toml::from_str::<CamerasFile>(src) {
        Ok(f) => f.camera,
        Err(e) => {
            tracing::error!(error = %e, "bad camera fixture TOML");
            Vec::new()
        }
    }
}

/// All embedded sample people.
pub fn sample_people() -> &'static [Identity] {
    PEOPLE.get_or_init(|| parse_people(PEOPLE_TOML))
}

/// All embedded sample cameras.
pub fn sample_cameras() -> &'static [CameraConfig] {
    CAMERAS.get_or_init(|| parse_cameras(CAMERAS_TOML))
}

/// A fresh roster holding the sample people.
pub fn sample_roster() -> Roster {
    sample_people().iter().cloned().collect()
}

/// A fresh registry holding the sample cameras.
pub fn sample_registry() -> CameraRegistry {
    let mut registry = CameraRegistry::new();
    for camera in sample_cameras() {
        if let Err(e) = registry.insert(camera.clone()) {
            tracing::warn!(error = %e, "skipping sample camera");
        }
    }
    registry
}
