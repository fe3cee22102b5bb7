use crate::error::{BinSplitError, Result};
use crate::extractor::ShortReadPolicy;
use crate::ui::{LogLevel, OutputMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default locations probed when `--settings` is not given.
pub const DEFAULT_SETTINGS_PATHS: [&str; 2] = ["binsplit.toml", ".binsplit.toml"];

/// Tool defaults read from a TOML settings file. Not to be confused with the
/// XML manifest passed through `--config`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub extract: ExtractConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Numeric threshold: 10 debug, 20 info, 30 warning, 40 error, 50 critical.
    pub level: u8,
    pub format: OutputMode,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub short_read: ShortReadPolicy,
    pub bounds_check: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Debug.as_u8(),
            format: OutputMode::Human,
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            short_read: ShortReadPolicy::Strict,
            bounds_check: true,
        }
    }
}

impl Settings {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(BinSplitError::Settings {
                message: format!("Settings file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| BinSplitError::Settings {
            message: format!("Failed to read settings file {}: {}", path.display(), e),
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|e| BinSplitError::Settings {
            message: format!("Failed to parse settings file {}: {}", path.display(), e),
        })?;

        Ok(settings)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(settings_path: Option<P>) -> Result<Self> {
        match settings_path {
            Some(path) => Self::load_from_file(path),
            None => {
                for default_path in &DEFAULT_SETTINGS_PATHS {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, overrides: &CliOverrides) {
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }

        if let Some(format) = overrides.format {
            self.logging.format = format;
        }

        if let Some(policy) = overrides.short_read {
            self.extract.short_read = policy;
        }

        if let Some(bounds_check) = overrides.bounds_check {
            self.extract.bounds_check = bounds_check;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| BinSplitError::Settings {
            message: format!("Failed to serialize settings: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| BinSplitError::Settings {
            message: format!("Failed to write settings file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.logging.level > LogLevel::Critical.as_u8() {
            return Err(BinSplitError::Settings {
                message: format!(
                    "Log level must be between 0 and {}, got {}",
                    LogLevel::Critical.as_u8(),
                    self.logging.level
                ),
            });
        }

        Ok(())
    }

    /// First default location that exists, if any.
    pub fn discovered_path() -> Option<PathBuf> {
        DEFAULT_SETTINGS_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub log_level: Option<u8>,
    pub format: Option<OutputMode>,
    pub short_read: Option<ShortReadPolicy>,
    pub bounds_check: Option<bool>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log_level(mut self, level: Option<u8>) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_format(mut self, format: Option<OutputMode>) -> Self {
        self.format = format;
        self
    }

    pub fn with_short_read(mut self, policy: Option<ShortReadPolicy>) -> Self {
        self.short_read = policy;
        self
    }

    pub fn with_bounds_check(mut self, bounds_check: Option<bool>) -> Self {
        self.bounds_check = bounds_check;
        self
    }
}
