use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(target_arch = "wasm32")]
use gloo_storage::{LocalStorage, Storage};

#[cfg(target_arch = "wasm32")]
const SETTINGS_KEY: &str = "logicos.player_settings";

/// Error type for settings loading on native platforms
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file unreadable: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings file malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no configuration directory")]
    NoConfigDir,
}

/// Player settings shared by every instance on the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSettings {
    #[serde(default = "default_player_name")]
    pub player_name: String,
    #[serde(default = "default_player_version")]
    pub player_version: String,
    #[serde(default = "default_seek_step_secs")]
    pub seek_step_secs: f64,
    #[serde(default = "default_speed_step")]
    pub speed_step: f64,
    #[serde(default = "default_min_speed")]
    pub min_speed: f64,
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
    #[serde(default = "default_viewport_padding")]
    pub viewport_padding: f64,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u32,
    /// Thumbnail path with `{n}` standing in for the preview frame index.
    #[serde(default)]
    pub preview_image_pattern: Option<String>,
    #[serde(default = "default_preview_interval_secs")]
    pub preview_interval_secs: f64,
}

fn default_player_name() -> String {
    "Logicos Video Player".to_string()
}

fn default_player_version() -> String {
    "1.0".to_string()
}

fn default_seek_step_secs() -> f64 {
    5.0
}

fn default_speed_step() -> f64 {
    0.25
}

fn default_min_speed() -> f64 {
    0.25
}

fn default_max_speed() -> f64 {
    2.0
}

fn default_viewport_padding() -> f64 {
    8.0
}

fn default_probe_timeout_secs() -> u32 {
    10
}

fn default_preview_interval_secs() -> f64 {
    10.0
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            player_name: default_player_name(),
            player_version: default_player_version(),
            seek_step_secs: default_seek_step_secs(),
            speed_step: default_speed_step(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
            viewport_padding: default_viewport_padding(),
            probe_timeout_secs: default_probe_timeout_secs(),
            preview_image_pattern: None,
            preview_interval_secs: default_preview_interval_secs(),
        }
    }
}

impl PlayerSettings {
    pub fn from_json(raw: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(raw)?;
        Ok(settings.sanitized())
    }

    /// Clamp values that would break the speed cycle or the menu layout.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !self.seek_step_secs.is_finite() || self.seek_step_secs <= 0.0 {
            self.seek_step_secs = defaults.seek_step_secs;
        }
        if !self.speed_step.is_finite() || self.speed_step <= 0.0 {
            self.speed_step = defaults.speed_step;
        }
        if !self.min_speed.is_finite() || self.min_speed <= 0.0 {
            self.min_speed = defaults.min_speed;
        }
        if !self.max_speed.is_finite() || self.max_speed < self.min_speed {
            self.max_speed = self.min_speed.max(defaults.max_speed);
        }
        self.viewport_padding = if self.viewport_padding.is_finite() {
            self.viewport_padding.max(0.0)
        } else {
            defaults.viewport_padding
        };
        self.probe_timeout_secs = self.probe_timeout_secs.clamp(1, 120);
        if !self.preview_interval_secs.is_finite() || self.preview_interval_secs <= 0.0 {
            self.preview_interval_secs = defaults.preview_interval_secs;
        }
        self
    }

    /// Preview thumbnail for a timeline fraction, when a pattern is configured.
    pub fn preview_image(&self, fraction: f64, duration: f64) -> Option<String> {
        let pattern = self.preview_image_pattern.as_ref()?;
        let seconds = if duration.is_finite() { fraction * duration } else { 0.0 };
        let index = ((seconds / self.preview_interval_secs).floor() as i64).max(1);
        Some(pattern.replace("{n}", &index.to_string()))
    }

    /// Load settings from local storage, falling back to defaults.
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        match LocalStorage::get::<PlayerSettings>(SETTINGS_KEY) {
            Ok(settings) => settings.sanitized(),
            Err(err) => {
                log::debug!("using default player settings: {err}");
                Self::default()
            }
        }
    }

    /// Load settings from the user's config directory, falling back to defaults.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        match Self::load_from_config_dir() {
            Ok(settings) => settings,
            Err(SettingsError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(err) => {
                log::warn!("falling back to default player settings: {err}");
                Self::default()
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn load_from_config_dir() -> Result<Self, SettingsError> {
        let dir = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
        let raw = std::fs::read_to_string(dir.join("logicos-player").join("settings.json"))?;
        Self::from_json(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let settings = PlayerSettings::from_json(r#"{"player_name":"Studio"}"#).unwrap();
        assert_eq!(settings.player_name, "Studio");
        assert_eq!(settings.seek_step_secs, 5.0);
        assert_eq!(settings.max_speed, 2.0);
    }

    #[test]
    fn broken_values_are_sanitized() {
        let settings = PlayerSettings::from_json(
            r#"{"speed_step":0,"min_speed":1.5,"max_speed":1.0,"probe_timeout_secs":0}"#,
        )
        .unwrap();
        assert_eq!(settings.speed_step, 0.25);
        assert_eq!(settings.min_speed, 1.5);
        assert_eq!(settings.max_speed, 2.0);
        assert_eq!(settings.probe_timeout_secs, 1);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            PlayerSettings::from_json("{"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn preview_images_start_at_frame_one() {
        let settings = PlayerSettings {
            preview_image_pattern: Some("preview/frame{n}.jpg".to_string()),
            ..PlayerSettings::default()
        };
        assert_eq!(
            settings.preview_image(0.0, 120.0).as_deref(),
            Some("preview/frame1.jpg")
        );
        assert_eq!(
            settings.preview_image(0.5, 120.0).as_deref(),
            Some("preview/frame6.jpg")
        );
        assert_eq!(PlayerSettings::default().preview_image(0.5, 120.0), None);
    }
}
