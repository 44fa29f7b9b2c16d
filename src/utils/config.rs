use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::api::positioner::PositionerConfig;
use crate::api::types::InitializerConfig;
use crate::core::{DEFAULT_ACQUISITION_TIMEOUT, DEFAULT_SMOOTHING_ALPHA, HEADING_SAMPLE_TIMEOUT};
use crate::processing::OrientationFilter;
use crate::validation::{validate_alpha, ValidationError};

/// Acquisition policy as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionSettings {
    /// Maximum wait for the first location fix (milliseconds)
    pub timeout_ms: u64,
    /// Fall back to north instead of failing when location is unavailable
    pub skip_on_location_failure: bool,
    /// Age after which a fix counts as stale (seconds), no expiry if unset
    pub fix_ttl_secs: Option<u64>,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_ACQUISITION_TIMEOUT.as_secs() * 1000,
            skip_on_location_failure: false,
            fix_ttl_secs: None,
        }
    }
}

impl AcquisitionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn initializer_config(&self) -> InitializerConfig {
        let config = InitializerConfig::default()
            .with_timeout(self.timeout())
            .with_skip_on_location_failure(self.skip_on_location_failure);
        match self.fix_ttl_secs {
            Some(secs) => config.with_fix_ttl(Duration::from_secs(secs)),
            None => config,
        }
    }
}

/// Smoothing weights for the orientation filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub heading_alpha: f64,
    pub pitch_alpha: f64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            heading_alpha: DEFAULT_SMOOTHING_ALPHA,
            pitch_alpha: DEFAULT_SMOOTHING_ALPHA,
        }
    }
}

impl FilterSettings {
    pub fn build_filter(&self) -> OrientationFilter {
        OrientationFilter::new(self.heading_alpha, self.pitch_alpha)
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub acquisition: AcquisitionSettings,
    pub filter: FilterSettings,
    pub view: PositionerConfig,
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    #[error("I/O error: {message}")]
    IoError { message: String },
    #[error("serialization error: {message}")]
    SerializationError { message: String },
    #[error("no file path set for saving configuration")]
    NoFilePath,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ValidationError> for ConfigError {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::InvalidParameter {
                parameter,
                value,
                reason,
            } => ConfigError::InvalidParameter {
                parameter,
                value,
                reason,
            },
            other => ConfigError::InvalidParameter {
                parameter: "value".to_string(),
                value: String::new(),
                reason: other.to_string(),
            },
        }
    }
}

/// Outcome of validating a configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ConfigError>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// First error, if any
    pub fn into_result(self) -> ConfigResult<()> {
        match self.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.acquisition.timeout_ms == 0 {
            errors.push(ConfigError::InvalidParameter {
                parameter: "acquisition.timeout_ms".to_string(),
                value: "0".to_string(),
                reason: "timeout must be positive".to_string(),
            });
        } else if self.acquisition.timeout() < HEADING_SAMPLE_TIMEOUT {
            warnings.push(format!(
                "acquisition timeout of {} ms is shorter than a typical cold GPS start",
                self.acquisition.timeout_ms
            ));
        }
        if self.acquisition.fix_ttl_secs == Some(0) {
            warnings.push("fix_ttl_secs = 0 makes every fix stale immediately".to_string());
        }

        for (parameter, alpha) in [
            ("filter.heading_alpha", self.filter.heading_alpha),
            ("filter.pitch_alpha", self.filter.pitch_alpha),
        ] {
            match validate_alpha(parameter, alpha) {
                Ok(alpha) if alpha < 0.05 => {
                    warnings.push(format!("{} = {} reacts very slowly", parameter, alpha))
                }
                Ok(_) => {}
                Err(error) => errors.push(error.into()),
            }
        }

        if let Err(error) = self.view.validate() {
            errors.push(error.into());
        }
        if self.view.dead_band_px > 20.0 {
            warnings.push(format!(
                "view.dead_band_px = {} will visibly freeze the marker",
                self.view.dead_band_px
            ));
        }

        ValidationReport {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Loads, saves and adjusts the engine configuration
#[derive(Debug, Default)]
pub struct ConfigurationManager {
    config: EngineConfig,
    config_file_path: Option<PathBuf>,
    is_modified: bool,
}

impl ConfigurationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the whole configuration if it validates
    pub fn update_config(&mut self, config: EngineConfig) -> ConfigResult<()> {
        config.validate().into_result()?;
        self.config = config;
        self.is_modified = true;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> ConfigResult<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            message: format!("failed to read config file '{}': {}", path.display(), e),
        })?;

        let config: EngineConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::SerializationError {
                message: format!("failed to parse config file '{}': {}", path.display(), e),
            })?;
        config.validate().into_result()?;

        self.config = config;
        self.config_file_path = Some(path.to_path_buf());
        self.is_modified = false;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> ConfigResult<()> {
        let path = path.as_ref();
        let content =
            serde_json::to_string_pretty(&self.config).map_err(|e| ConfigError::SerializationError {
                message: format!("failed to serialize config: {}", e),
            })?;

        fs::write(path, content).map_err(|e| ConfigError::IoError {
            message: format!("failed to write config file '{}': {}", path.display(), e),
        })?;

        self.config_file_path = Some(path.to_path_buf());
        self.is_modified = false;
        Ok(())
    }

    /// Save to the file last loaded from or saved to
    pub fn save(&mut self) -> ConfigResult<()> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::NoFilePath),
        }
    }

    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    // Runtime adjustments; each returns the previous value

    /// Rejects timeouts that do not survive conversion to whole milliseconds
    pub fn set_acquisition_timeout(&mut self, timeout: Duration) -> ConfigResult<Duration> {
        let timeout_ms = match u64::try_from(timeout.as_millis()) {
            Ok(0) => {
                return Err(ConfigError::InvalidParameter {
                    parameter: "acquisition.timeout_ms".to_string(),
                    value: format!("{:?}", timeout),
                    reason: "timeout must be at least one millisecond".to_string(),
                })
            }
            Ok(ms) => ms,
            Err(_) => {
                return Err(ConfigError::InvalidParameter {
                    parameter: "acquisition.timeout_ms".to_string(),
                    value: format!("{:?}", timeout),
                    reason: "timeout does not fit in milliseconds".to_string(),
                })
            }
        };

        let old = self.config.acquisition.timeout();
        self.config.acquisition.timeout_ms = timeout_ms;
        self.is_modified = true;
        Ok(old)
    }

    pub fn set_skip_on_location_failure(&mut self, skip: bool) -> bool {
        let old = self.config.acquisition.skip_on_location_failure;
        self.config.acquisition.skip_on_location_failure = skip;
        self.is_modified = true;
        old
    }

    /// `None` disables expiry; a TTL must be at least one whole second
    pub fn set_fix_ttl(&mut self, ttl: Option<Duration>) -> ConfigResult<Option<Duration>> {
        let fix_ttl_secs = match ttl {
            Some(ttl) if ttl.as_secs() == 0 => {
                return Err(ConfigError::InvalidParameter {
                    parameter: "acquisition.fix_ttl_secs".to_string(),
                    value: format!("{:?}", ttl),
                    reason: "TTL must be at least one second".to_string(),
                })
            }
            Some(ttl) => Some(ttl.as_secs()),
            None => None,
        };

        let old = self.config.acquisition.fix_ttl_secs.map(Duration::from_secs);
        self.config.acquisition.fix_ttl_secs = fix_ttl_secs;
        self.is_modified = true;
        Ok(old)
    }

    pub fn set_smoothing_alpha(&mut self, heading: f64, pitch: f64) -> ConfigResult<(f64, f64)> {
        validate_alpha("filter.heading_alpha", heading)?;
        validate_alpha("filter.pitch_alpha", pitch)?;

        let old = (self.config.filter.heading_alpha, self.config.filter.pitch_alpha);
        self.config.filter.heading_alpha = heading;
        self.config.filter.pitch_alpha = pitch;
        self.is_modified = true;
        Ok(old)
    }

    pub fn set_field_of_view(
        &mut self,
        horizontal_deg: f64,
        vertical_deg: f64,
    ) -> ConfigResult<(f64, f64)> {
        self.update_view(|view| {
            let old = (view.horizontal_fov_deg, view.vertical_fov_deg);
            view.horizontal_fov_deg = horizontal_deg;
            view.vertical_fov_deg = vertical_deg;
            old
        })
    }

    pub fn set_dead_band(&mut self, dead_band_px: f64) -> ConfigResult<f64> {
        self.update_view(|view| std::mem::replace(&mut view.dead_band_px, dead_band_px))
    }

    pub fn set_follow_fraction(&mut self, fraction: f64) -> ConfigResult<f64> {
        self.update_view(|view| std::mem::replace(&mut view.follow_fraction, fraction))
    }

    pub fn set_alignment_tolerance(&mut self, tolerance_deg: f64) -> ConfigResult<f64> {
        self.update_view(|view| std::mem::replace(&mut view.alignment_tolerance_deg, tolerance_deg))
    }

    /// Apply `change` to a copy of the view settings and keep it only if valid
    fn update_view<T>(&mut self, change: impl FnOnce(&mut PositionerConfig) -> T) -> ConfigResult<T> {
        let mut view = self.config.view.clone();
        let old = change(&mut view);
        view.validate()?;

        self.config.view = view;
        self.is_modified = true;
        Ok(old)
    }
}
