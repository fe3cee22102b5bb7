use thiserror::Error;

#[derive(Error, Debug)]
pub enum BinSplitError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Binary config file does not exist: {path}")]
    ConfigMissing { path: String },

    #[error("Binary config file {path} is malformed: {message}")]
    ManifestParse { path: String, message: String },

    #[error("Invalid fragment '{name}': {message}")]
    InvalidFragment { name: String, message: String },

    #[error("Input binary not found: {path}")]
    InputMissing { path: String },

    #[error("Input binary cannot be read: {path}")]
    InputUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Short read for fragment '{name}': expected {expected} bytes, got {actual}")]
    ShortRead {
        name: String,
        expected: u64,
        actual: u64,
    },

    #[error("Fragment '{name}' ends past the input ({offset:#x} + {length:#x} > {input_size:#x})")]
    OutOfBounds {
        name: String,
        offset: u64,
        length: u64,
        input_size: u64,
    },

    #[error("Failed to write fragment file: {path}")]
    OutputWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings error: {message}")]
    Settings { message: String },
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for BinSplitError {
    fn user_message(&self) -> String {
        match self {
            BinSplitError::InputUnreadable { path, source } => {
                format!("Cannot read input binary {}: {}", path, source)
            }
            BinSplitError::OutputWrite { path, source } => {
                format!("Cannot write fragment {}: {}", path, source)
            }
            BinSplitError::ShortRead { name, expected, actual } => {
                format!(
                    "Input ended early while reading '{}': wanted {} bytes, only {} available",
                    name, expected, actual
                )
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            BinSplitError::ConfigMissing { .. } => Some(
                "Check the --config path points at the XML manifest.".to_string()
            ),
            BinSplitError::ManifestParse { .. } => Some(
                "Each <bin name=\"...\"> needs <offset> and <length> children holding hex values (e.g. 0x1000).".to_string()
            ),
            BinSplitError::InputMissing { .. } => Some(
                "Check the --input path points at the combined binary image.".to_string()
            ),
            BinSplitError::InputUnreadable { .. } => Some(
                "Ensure the input is a regular file and you have read permission.".to_string()
            ),
            BinSplitError::ShortRead { .. } => Some(
                "Verify the manifest matches this image, or pass --allow-short-read to keep truncated fragments.".to_string()
            ),
            BinSplitError::OutOfBounds { .. } => Some(
                "Verify the manifest offsets and lengths match this image size.".to_string()
            ),
            BinSplitError::OutputWrite { .. } => Some(
                "Ensure the output directory is writable and has enough free space.".to_string()
            ),
            BinSplitError::Settings { .. } => Some(
                "Check your settings file syntax, or regenerate one with --generate-settings.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for BinSplitError {
    fn from(error: toml::de::Error) -> Self {
        BinSplitError::Settings {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BinSplitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_friendly_messages() {
        let error = BinSplitError::InputMissing {
            path: "/tmp/flash.bin".to_string(),
        };
        assert!(error.user_message().contains("/tmp/flash.bin"));
        assert!(error.suggestion().is_some());
    }

    #[test]
    fn test_out_of_bounds_display_uses_hex() {
        let error = BinSplitError::OutOfBounds {
            name: "app.bin".to_string(),
            offset: 0x1000,
            length: 0x2000,
            input_size: 0x2000,
        };
        let message = error.to_string();
        assert!(message.contains("0x1000"));
        assert!(message.contains("app.bin"));
    }

    #[test]
    fn test_short_read_message() {
        let error = BinSplitError::ShortRead {
            name: "fs.bin".to_string(),
            expected: 16,
            actual: 4,
        };
        assert!(error.user_message().contains("only 4 available"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_error = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let error = BinSplitError::from(toml_error);
        assert!(matches!(error, BinSplitError::Settings { .. }));
    }
}
