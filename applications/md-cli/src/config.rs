/// CLI configuration
use crate::error::{CliError, Result};
use md_core::Wireformat;
use md_upload::UploadSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file, read from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "md.toml";

const MAX_LOOKAHEAD: usize = 16;
const MAX_SETTLE_MS: u64 = 10_000;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default = "default_device")]
    pub device: DeviceSettings,

    #[serde(default = "default_upload")]
    pub upload: UploadConfig,

    #[serde(default = "default_export")]
    pub export: ExportSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceSettings {
    /// JSON file holding the reference device between invocations
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Pause after a playback command before the status is read back
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    #[serde(default)]
    pub format: Wireformat,

    #[serde(default)]
    pub full_width_titles: bool,

    #[serde(default = "default_notify")]
    pub notify_when_finished: bool,

    #[serde(default = "default_lookahead")]
    pub lookahead: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportSettings {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    #[serde(default = "default_atracdenc_path")]
    pub atracdenc_path: PathBuf,
}

impl CliConfig {
    /// Load from `md.toml` (or `path`) and `MD_` environment variables.
    ///
    /// Nested keys use a double underscore: `MD_UPLOAD__FORMAT=LP2`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("MD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.device.state_file.as_os_str().is_empty() {
            return Err(CliError::Config(
                "device.state_file must not be empty".to_string(),
            ));
        }

        if self.device.settle_ms > MAX_SETTLE_MS {
            return Err(CliError::Config(format!(
                "device.settle_ms must be at most {} (got {})",
                MAX_SETTLE_MS, self.device.settle_ms
            )));
        }

        if self.upload.lookahead == 0 || self.upload.lookahead > MAX_LOOKAHEAD {
            return Err(CliError::Config(format!(
                "upload.lookahead must be between 1 and {} (got {})",
                MAX_LOOKAHEAD, self.upload.lookahead
            )));
        }

        if self.export.ffmpeg_path.as_os_str().is_empty() {
            return Err(CliError::Config(
                "export.ffmpeg_path must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.device.settle_ms)
    }

    /// Upload session options, with `format` overriding the configured one
    pub fn upload_settings(&self, format: Option<Wireformat>) -> UploadSettings {
        UploadSettings {
            format: format.unwrap_or(self.upload.format),
            full_width_titles: self.upload.full_width_titles,
            notify_when_finished: self.upload.notify_when_finished,
            lookahead: self.upload.lookahead,
        }
    }
}

// Default values
fn default_device() -> DeviceSettings {
    DeviceSettings {
        state_file: default_state_file(),
        settle_ms: default_settle_ms(),
    }
}

fn default_state_file() -> PathBuf {
    PathBuf::from("./md-device.json")
}

fn default_settle_ms() -> u64 {
    500
}

fn default_upload() -> UploadConfig {
    UploadConfig {
        format: Wireformat::default(),
        full_width_titles: false,
        notify_when_finished: default_notify(),
        lookahead: default_lookahead(),
    }
}

fn default_notify() -> bool {
    true
}

fn default_lookahead() -> usize {
    1
}

fn default_export() -> ExportSettings {
    ExportSettings {
        ffmpeg_path: default_ffmpeg_path(),
        atracdenc_path: default_atracdenc_path(),
    }
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_atracdenc_path() -> PathBuf {
    PathBuf::from("atracdenc")
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            upload: default_upload(),
            export: default_export(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CliConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.device.settle_ms, 500);
        assert_eq!(config.upload.format, Wireformat::Sp);
        assert_eq!(config.upload.lookahead, 1);
    }

    #[test]
    fn test_zero_lookahead_rejected() {
        let mut config = CliConfig::default();
        config.upload.lookahead = 0;
        assert!(matches!(config.validate(), Err(CliError::Config(_))));
    }

    #[test]
    fn test_long_settle_rejected() {
        let mut config = CliConfig::default();
        config.device.settle_ms = 60_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("md.toml");
        std::fs::write(
            &path,
            "[device]\nstate_file = \"deck.json\"\n\n[upload]\nformat = \"LP2\"\nlookahead = 3\n",
        )
        .unwrap();

        let config = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(config.device.state_file, PathBuf::from("deck.json"));
        assert_eq!(config.device.settle_ms, 500);
        assert_eq!(config.upload.format, Wireformat::Lp2);
        assert_eq!(config.upload.lookahead, 3);
        assert_eq!(config.export.atracdenc_path, PathBuf::from("atracdenc"));
    }

    #[test]
    fn test_upload_settings_override_format() {
        let config = CliConfig::default();
        let settings = config.upload_settings(Some(Wireformat::Lp4));
        assert_eq!(settings.format, Wireformat::Lp4);
        assert!(settings.notify_when_finished);
        assert_eq!(config.upload_settings(None).format, Wireformat::Sp);
    }
}
