use crate::error::{BinSplitError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};

/// One named byte range of the input image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentDescriptor {
    pub name: String,
    pub offset: u64,
    pub length: u64,
}

impl FragmentDescriptor {
    pub fn new<S: Into<String>>(name: S, offset: u64, length: u64) -> Result<Self> {
        let name = name.into();
        validate_fragment_name(&name)?;
        Ok(Self { name, offset, length })
    }

    /// Build a descriptor from the raw manifest strings.
    pub fn from_hex(name: &str, offset: &str, length: &str) -> Result<Self> {
        let offset = parse_hex(name, "offset", offset)?;
        let length = parse_hex(name, "length", length)?;
        Self::new(name, offset, length)
    }

    /// Exclusive end offset, `None` when it does not fit in a `u64`.
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.length)
    }
}

/// Parse a base-16 value the way the manifests write them: optional `+` sign,
/// optional `0x`, surrounding whitespace and `_` separators allowed. Negative
/// values are rejected.
pub fn parse_hex_u64(value: &str) -> std::result::Result<u64, String> {
    let trimmed = value.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
        .unwrap_or(unsigned);

    // from_str_radix would accept a second sign after the prefix
    if digits.starts_with(['+', '-']) {
        return Err(format!("unexpected sign in hex value '{}'", value));
    }

    if digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return Err(format!("misplaced '_' in hex value '{}'", value));
    }

    let digits = digits.replace('_', "");
    if digits.is_empty() {
        return Err("empty hex value".to_string());
    }

    u64::from_str_radix(&digits, 16).map_err(|e| format!("invalid hex value '{}': {}", value, e))
}

fn parse_hex(name: &str, field: &str, value: &str) -> Result<u64> {
    parse_hex_u64(value).map_err(|message| BinSplitError::InvalidFragment {
        name: name.to_string(),
        message: format!("{}: {}", field, message),
    })
}

/// Fragment names become file names inside the output directory, so they must
/// be a single normal path component.
pub fn validate_fragment_name(name: &str) -> Result<()> {
    let invalid = |message: &str| {
        Err(BinSplitError::InvalidFragment {
            name: name.to_string(),
            message: message.to_string(),
        })
    };

    if name.trim().is_empty() {
        return invalid("name is empty");
    }

    if name.contains('\0') {
        return invalid("name contains a NUL byte");
    }

    if name.contains('/') || name.contains('\\') {
        return invalid("name must not contain path separators");
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => invalid("name must be a plain file name"),
    }
}
