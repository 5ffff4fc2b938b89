//! Runtime configuration.
//!
//! Conversion options are passed explicitly; server settings come from the
//! environment (a `.env` file is loaded by the binary via `dotenvy`).
//!
//! | Variable                 | Default    |
//! |--------------------------|------------|
//! | `QBANK_PORT`             | `3000`     |
//! | `QBANK_MAX_UPLOAD_BYTES` | `10485760` |

use serde::{Deserialize, Serialize};

/// Default value of the `marks` column when the source leaves it blank.
pub const DEFAULT_MARKS: &str = "1";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Options for a single conversion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Force a delimiter instead of detecting it from the header line
    pub delimiter: Option<char>,

    /// Marks given to questions with a blank `Marks` cell
    pub default_marks: String,

    /// Replace an existing output file
    #[serde(default)]
    pub overwrite: bool,

    /// Mirror the activity log to stderr and the SSE stream
    #[serde(default)]
    pub echo_log: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            default_marks: DEFAULT_MARKS.to_string(),
            overwrite: false,
            echo_log: false,
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup; unparsable values fall back
    /// to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            port: lookup("QBANK_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            max_upload_bytes: lookup("QBANK_MAX_UPLOAD_BYTES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_options() {
        let opts = ConvertOptions::default();
        assert!(opts.delimiter.is_none());
        assert_eq!(opts.default_marks, "1");
        assert!(!opts.overwrite);
        assert!(!opts.echo_log);
    }

    #[test]
    fn test_server_config_from_lookup() {
        let env: HashMap<&str, &str> = [("QBANK_PORT", "8080"), ("QBANK_MAX_UPLOAD_BYTES", "2048")].into();
        let config = ServerConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_upload_bytes, 2048);
    }

    #[test]
    fn test_server_config_bad_values_fall_back() {
        let config = ServerConfig::from_lookup(|k| match k {
            "QBANK_PORT" => Some("not-a-port".to_string()),
            _ => None,
        });
        assert_eq!(config, ServerConfig::default());
    }
}
