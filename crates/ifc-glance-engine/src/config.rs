// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Viewer configuration
//!
//! Read from URL query parameters in the browser (`?debug=1&normalize=0`) and
//! from environment variables natively (`IFC_GLANCE_DEBUG=1`). Unknown keys
//! are ignored; malformed values keep the default and produce a warning.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of native environment variables
pub const ENV_PREFIX: &str = "IFC_GLANCE_";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{key}: expected a boolean, got {value:?}")]
    InvalidBool { key: String, value: String },

    #[error("{key}: expected a number, got {value:?}")]
    InvalidNumber { key: String, value: String },

    #[error("{key}: {value} is out of range")]
    OutOfRange { key: String, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Verbose console output
    pub debug: bool,
    /// Move the model center to the origin on load
    pub normalize: bool,
    /// Multiplier applied to the framing distance
    pub fit_margin: f64,
    /// Vertical field of view in degrees
    pub fov_degrees: f64,
    /// Open a sidecar parser session per load for raw attribute queries
    pub sidecar: bool,
    /// Draw the ground grid
    pub grid: bool,
    /// Light background instead of the dark default
    pub light_theme: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            debug: false,
            normalize: true,
            fit_margin: 1.5,
            fov_degrees: 45.0,
            sidecar: true,
            grid: true,
            light_theme: false,
        }
    }
}

impl ViewerConfig {
    /// Parse a URL query string, with or without the leading `?`
    pub fn from_query(query: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Self::default();
        let mut warnings = Vec::new();
        let query = query.strip_prefix('?').unwrap_or(query);
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, "1"));
            if let Err(e) = config.apply(key, value) {
                warnings.push(e);
            }
        }
        (config, warnings)
    }

    /// Read `IFC_GLANCE_*` variables; a bare `DEBUG` also enables debug mode
    pub fn from_env() -> (Self, Vec<ConfigError>) {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> (Self, Vec<ConfigError>)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = Self::default();
        let mut warnings = Vec::new();
        for (name, value) in vars {
            let result = if name == "DEBUG" {
                config.debug = true;
                Ok(())
            } else if let Some(key) = name.strip_prefix(ENV_PREFIX) {
                config.apply(&key.to_ascii_lowercase(), &value)
            } else {
                Ok(())
            };
            if let Err(e) = result {
                warnings.push(e);
            }
        }
        (config, warnings)
    }

    /// Set one option by key
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "debug" => self.debug = parse_bool(key, value)?,
            "normalize" => self.normalize = parse_bool(key, value)?,
            "sidecar" => self.sidecar = parse_bool(key, value)?,
            "grid" => self.grid = parse_bool(key, value)?,
            "light" | "light_theme" => self.light_theme = parse_bool(key, value)?,
            "fit_margin" | "margin" => {
                let v = parse_number(key, value)?;
                if v <= 0.0 {
                    return Err(ConfigError::OutOfRange {
                        key: key.to_string(),
                        value: v,
                    });
                }
                self.fit_margin = v;
            }
            "fov" | "fov_degrees" => {
                let v = parse_number(key, value)?;
                if !(1.0..179.0).contains(&v) {
                    return Err(ConfigError::OutOfRange {
                        key: key.to_string(),
                        value: v,
                    });
                }
                self.fov_degrees = v;
            }
            _ => {}
        }
        Ok(())
    }

    pub fn fov_radians(&self) -> f64 {
        self.fov_degrees.to_radians()
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_number(key: &str, value: &str) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConfigError::InvalidNumber {
            key: key.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert!(config.normalize);
        assert_eq!(config.fit_margin, 1.5);
        assert_eq!(config.fov_degrees, 45.0);
    }

    #[test]
    fn test_from_query() {
        let (config, warnings) = ViewerConfig::from_query("?debug=1&normalize=false&fov=60&x=y");
        assert!(warnings.is_empty());
        assert!(config.debug);
        assert!(!config.normalize);
        assert_eq!(config.fov_degrees, 60.0);
        assert!(!config.light_theme);

        let (config, _) = ViewerConfig::from_query("light=1");
        assert!(config.light_theme);
    }

    #[test]
    fn test_bare_flag_and_bad_values() {
        let (config, warnings) = ViewerConfig::from_query("debug&margin=abc&fov=500");
        assert!(config.debug);
        assert_eq!(config.fit_margin, 1.5);
        assert_eq!(config.fov_degrees, 45.0);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_from_vars() {
        let vars = vec![
            ("DEBUG".to_string(), String::new()),
            ("IFC_GLANCE_SIDECAR".to_string(), "off".to_string()),
            ("PATH".to_string(), "/usr/bin".to_string()),
        ];
        let (config, warnings) = ViewerConfig::from_vars(vars);
        assert!(warnings.is_empty());
        assert!(config.debug);
        assert!(!config.sidecar);
    }
}
