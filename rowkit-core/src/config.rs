//! Configuration types

use crate::{ConfigError, RowkitResult};
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Upper bound for [`RowkitConfig::row_capacity_hint`].
pub const MAX_ROW_CAPACITY_HINT: usize = 1 << 24;

/// Base64 alphabet used when byte sequences are rendered as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryEncoding {
    /// RFC 4648 standard alphabet, padded
    #[default]
    Standard,
    /// RFC 4648 URL-safe alphabet, padded
    UrlSafe,
}

impl BinaryEncoding {
    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            BinaryEncoding::Standard => STANDARD.encode(bytes),
            BinaryEncoding::UrlSafe => URL_SAFE.encode(bytes),
        }
    }

    pub fn decode(self, text: &str) -> Result<Vec<u8>, base64::DecodeError> {
        match self {
            BinaryEncoding::Standard => STANDARD.decode(text),
            BinaryEncoding::UrlSafe => URL_SAFE.decode(text),
        }
    }
}

impl FromStr for BinaryEncoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(BinaryEncoding::Standard),
            "url_safe" | "urlsafe" => Ok(BinaryEncoding::UrlSafe),
            _ => Err(ConfigError::InvalidValue {
                field: "binary_encoding".to_string(),
                value: s.to_string(),
                reason: "expected 'standard' or 'url_safe'".to_string(),
            }),
        }
    }
}

/// Reader and materialization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowkitConfig {
    /// Reject value access unless the reader is positioned on a row.
    /// When off, access goes straight to the cursor and its own error surfaces.
    pub strict_state: bool,
    pub binary_encoding: BinaryEncoding,
    /// Rows reserved up front by table materialization.
    pub row_capacity_hint: usize,
}

impl Default for RowkitConfig {
    fn default() -> Self {
        Self {
            strict_state: true,
            binary_encoding: BinaryEncoding::Standard,
            row_capacity_hint: 0,
        }
    }
}

impl RowkitConfig {
    /// Load from `ROWKIT_*` environment variables, defaulting unset ones.
    pub fn from_env() -> RowkitResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Unset keys keep their defaults;
    /// malformed values are rejected.
    pub fn from_lookup<F>(lookup: F) -> RowkitResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("ROWKIT_STRICT_STATE") {
            config.strict_state = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "strict_state".to_string(),
                        value: raw,
                        reason: "expected a boolean".to_string(),
                    }
                    .into())
                }
            };
        }

        if let Some(raw) = lookup("ROWKIT_BINARY_ENCODING") {
            config.binary_encoding = raw.parse()?;
        }

        if let Some(raw) = lookup("ROWKIT_ROW_CAPACITY_HINT") {
            config.row_capacity_hint =
                raw.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                        field: "row_capacity_hint".to_string(),
                        value: raw.clone(),
                        reason: e.to_string(),
                    })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> RowkitResult<()> {
        if self.row_capacity_hint > MAX_ROW_CAPACITY_HINT {
            return Err(ConfigError::InvalidValue {
                field: "row_capacity_hint".to_string(),
                value: self.row_capacity_hint.to_string(),
                reason: format!("row_capacity_hint must not exceed {}", MAX_ROW_CAPACITY_HINT),
            }
            .into());
        }
        Ok(())
    }
}
