//! Dashboard settings.
//!
//! One flat record covering system, recognition and camera preferences.
//! The host owns the live copy, validates updates with
//! [`Settings::validate`] and can restore [`Settings::default`] at any time.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;

pub const LOG_RETENTION_DAYS: RangeInclusive<u32> = 1..=365;
pub const MIN_CONFIDENCE: RangeInclusive<u8> = 50..=99;
pub const MATCH_THRESHOLD: RangeInclusive<u8> = 60..=99;
pub const RECONNECT_ATTEMPTS: RangeInclusive<u8> = 0..=10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("unknown setting: {0}")]
    UnknownField(String),
    #[error("malformed settings: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionModel {
    Fast,
    Standard,
    Precise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    Performance,
    Balanced,
    Quality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamProtocol {
    Rtsp,
    Rtmp,
    Hls,
}

impl StreamProtocol {
    pub fn as_str(self) -> &'static str {
        match self {
            StreamProtocol::Rtsp => "rtsp",
            StreamProtocol::Rtmp => "rtmp",
            StreamProtocol::Hls => "hls",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamQuality {
    Low,
    Medium,
    High,
    Auto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    // System
    pub system_name: String,
    pub storage_path: String,
    pub auto_backup: bool,
    /// When off, nothing new is written to the activity log.
    pub enable_logging: bool,
    pub log_retention_days: u32,

    // Recognition
    pub min_confidence: u8,
    pub recognition_model: RecognitionModel,
    pub enable_notifications: bool,
    pub match_threshold: u8,
    pub processing_mode: ProcessingMode,

    // Camera defaults
    /// Protocol given to cameras added without one.
    pub default_protocol: StreamProtocol,
    pub stream_quality: StreamQuality,
    pub enable_motion_detection: bool,
    pub reconnect_attempts: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            system_name: "FaceTrack Pro".to_string(),
            storage_path: "/var/data/facetrack".to_string(),
            auto_backup: true,
            enable_logging: true,
            log_retention_days: crate::activity::DEFAULT_RETENTION_DAYS,
            min_confidence: 70,
            recognition_model: RecognitionModel::Standard,
            enable_notifications: true,
            match_threshold: 85,
            processing_mode: ProcessingMode::Balanced,
            default_protocol: StreamProtocol::Rtsp,
            stream_quality: StreamQuality::Auto,
            enable_motion_detection: true,
            reconnect_attempts: 3,
        }
    }
}

fn check_range<T>(
    field: &'static str,
    value: T,
    range: &RangeInclusive<T>,
) -> Result<(), SettingsError>
where
    T: PartialOrd + Copy + Into<u32>,
{
    if range.contains(&value) {
        return Ok(());
    }
    Err(SettingsError::OutOfRange {
        field,
        min: (*range.start()).into(),
        max: (*range.end()).into(),
        value: value.into(),
    })
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.system_name.trim().is_empty() {
            return Err(SettingsError::Empty("system_name"));
        }
        check_range("log_retention_days", self.log_retention_days, &LOG_RETENTION_DAYS)?;
        check_range("min_confidence", self.min_confidence, &MIN_CONFIDENCE)?;
        check_range("match_threshold", self.match_threshold, &MATCH_THRESHOLD)?;
        check_range("reconnect_attempts", self.reconnect_attempts, &RECONNECT_ATTEMPTS)?;
        Ok(())
    }

    /// Pull every numeric field into its allowed range.
    pub fn clamped(mut self) -> Self {
        let clamp_u32 = |v: u32, r: &RangeInclusive<u32>| v.clamp(*r.start(), *r.end());
        let clamp_u8 = |v: u8, r: &RangeInclusive<u8>| v.clamp(*r.start(), *r.end());
        self.log_retention_days = clamp_u32(self.log_retention_days, &LOG_RETENTION_DAYS);
        self.min_confidence = clamp_u8(self.min_confidence, &MIN_CONFIDENCE);
        self.match_threshold = clamp_u8(self.match_threshold, &MATCH_THRESHOLD);
        self.reconnect_attempts = clamp_u8(self.reconnect_attempts, &RECONNECT_ATTEMPTS);
        if self.system_name.trim().is_empty() {
            self.system_name = Settings::default().system_name;
        }
        self
    }

    /// Overlay the keys of a JSON object onto a copy of these settings.
    ///
    /// Unknown keys and ill-typed values are rejected; the result is validated.
    pub fn patched(&self, patch: serde_json::Value) -> Result<Settings, SettingsError> {
        let serde_json::Value::Object(patch) = patch else {
            return Err(SettingsError::Malformed("expected a JSON object".into()));
        };
        let mut merged =
            serde_json::to_value(self).map_err(|e| SettingsError::Malformed(e.to_string()))?;
        let Some(fields) = merged.as_object_mut() else {
            return Err(SettingsError::Malformed("settings did not serialize to an object".into()));
        };
        for (key, value) in patch {
            if !fields.contains_key(&key) {
                return Err(SettingsError::UnknownField(key));
            }
            fields.insert(key, value);
        }
        let updated: Settings =
            serde_json::from_value(merged).map_err(|e| SettingsError::Malformed(e.to_string()))?;
        updated.validate()?;
        Ok(updated)
    }

    /// Retention window for [`crate::ActivityLog::prune`].
    pub fn log_retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.log_retention_days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let s = Settings::default();
        s.validate().unwrap();
        assert_eq!(s.log_retention_days, 30);
        assert_eq!(s.min_confidence, 70);
        assert_eq!(s.match_threshold, 85);
        assert_eq!(s.default_protocol, StreamProtocol::Rtsp);
        assert_eq!(s.reconnect_attempts, 3);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let s = Settings {
            log_retention_days: 0,
            ..Settings::default()
        };
        assert_eq!(
            s.validate(),
            Err(SettingsError::OutOfRange {
                field: "log_retention_days",
                min: 1,
                max: 365,
                value: 0
            })
        );

        let s = Settings {
            match_threshold: 100,
            ..Settings::default()
        };
        assert!(matches!(
            s.validate(),
            Err(SettingsError::OutOfRange { field: "match_threshold", .. })
        ));

        let s = Settings {
            system_name: "  ".into(),
            ..Settings::default()
        };
        assert_eq!(s.validate(), Err(SettingsError::Empty("system_name")));
    }

    #[test]
    fn test_clamped() {
        let s = Settings {
            log_retention_days: 1_000_000_000,
            reconnect_attempts: 200,
            system_name: String::new(),
            ..Settings::default()
        }
        .clamped();
        assert_eq!(s.log_retention_days, 365);
        assert_eq!(s.reconnect_attempts, 10);
        assert_eq!(s.system_name, "FaceTrack Pro");
        s.validate().unwrap();
    }

    #[test]
    fn test_serde_lowercase_enums() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["default_protocol"], "rtsp");
        assert_eq!(json["processing_mode"], "balanced");
        assert_eq!(json["recognition_model"], "standard");

        let err = serde_json::from_str::<Settings>(r#"{"bogus": 1}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_patched_overlays_known_keys() {
        let base = Settings::default();
        let s = base
            .patched(serde_json::json!({
                "system_name": "Lobby Kiosk",
                "log_retention_days": 7,
                "default_protocol": "hls",
                "enable_logging": false
            }))
            .unwrap();
        assert_eq!(s.system_name, "Lobby Kiosk");
        assert_eq!(s.log_retention_days, 7);
        assert_eq!(s.default_protocol, StreamProtocol::Hls);
        assert!(!s.enable_logging);
        assert_eq!(s.match_threshold, base.match_threshold);
    }

    #[test]
    fn test_patched_rejects_bad_input() {
        let base = Settings::default();
        assert_eq!(
            base.patched(serde_json::json!({"volume": 11})),
            Err(SettingsError::UnknownField("volume".into()))
        );
        assert!(matches!(
            base.patched(serde_json::json!({"default_protocol": "ftp"})),
            Err(SettingsError::Malformed(_))
        ));
        assert!(matches!(
            base.patched(serde_json::json!({"log_retention_days": 4000})),
            Err(SettingsError::OutOfRange { .. })
        ));
        assert!(matches!(
            base.patched(serde_json::json!([1, 2])),
            Err(SettingsError::Malformed(_))
        ));
    }
}
