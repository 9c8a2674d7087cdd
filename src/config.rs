/// Runtime configuration
///
/// Layered, later layers win:
/// 1. Built-in defaults
/// 2. `config.json` in the user's config directory, if present
///    - Linux: ~/.config/sketch-studio/config.json
///    - macOS: ~/Library/Application Support/sketch-studio/config.json
///    - Windows: %APPDATA%\sketch-studio\config.json
/// 3. `SKETCH_*` environment variables
/// 4. Command line flags (applied by `main`)
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::ConfigError;
use crate::transform::WireFormat;

pub const ENV_BACKEND_URL: &str = "SKETCH_BACKEND_URL";
pub const ENV_WIRE: &str = "SKETCH_WIRE";
pub const ENV_TIMEOUT_SECS: &str = "SKETCH_TIMEOUT_SECS";
pub const ENV_RELAY_ADDR: &str = "SKETCH_RELAY_ADDR";

/// Largest canvas side accepted from configuration
pub const MAX_CANVAS_SIDE: u32 = 4096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the image-generation backend
    pub backend_url: String,
    /// Request shape used when talking to the backend
    pub wire: WireFormat,
    /// Upper bound on a transform request
    pub timeout_secs: u64,
    /// Listen address of the local relay
    pub relay_addr: SocketAddr,
    /// Drawing surface size in pixels
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            wire: WireFormat::default(),
            timeout_secs: 30,
            relay_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            canvas_width: 512,
            canvas_height: 512,
        }
    }
}

impl Config {
    /// Load defaults, the config file and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::file_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file; missing fields keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Where the config file lives, if the platform has a config directory
    pub fn file_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("sketch-studio");
        path.push("config.json");
        Some(path)
    }

    /// Apply `SKETCH_*` overrides looked up through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.is_empty()) {
            self.backend_url = url;
        }

        if let Some(value) = lookup(ENV_WIRE) {
            self.wire = value.parse().map_err(|_| ConfigError::InvalidEnv {
                key: ENV_WIRE,
                value,
            })?;
        }

        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = value
                .trim()
                .parse()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidEnv {
                    key: ENV_TIMEOUT_SECS,
                    value,
                })?;
        }

        if let Some(value) = lookup(ENV_RELAY_ADDR) {
            self.relay_addr = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: ENV_RELAY_ADDR,
                value,
            })?;
        }

        Ok(())
    }

    /// Reject settings the drawing surface cannot be built from
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid = 1..=MAX_CANVAS_SIDE;
        if !valid.contains(&self.canvas_width) || !valid.contains(&self.canvas_height) {
            return Err(ConfigError::InvalidCanvas {
                width: self.canvas_width,
                height: self.canvas_height,
                max: MAX_CANVAS_SIDE,
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.wire, WireFormat::Multipart);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                (ENV_BACKEND_URL, "http://gpu-box:9000"),
                (ENV_WIRE, "json"),
                (ENV_TIMEOUT_SECS, "5"),
                (ENV_RELAY_ADDR, "0.0.0.0:8080"),
            ]))
            .unwrap();

        assert_eq!(config.backend_url, "http://gpu-box:9000");
        assert_eq!(config.wire, WireFormat::Json);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.relay_addr.port(), 8080);
    }

    #[test]
    fn test_invalid_env_is_reported() {
        let mut config = Config::default();
        let err = config
            .apply_env(env(&[(ENV_TIMEOUT_SECS, "0")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT_SECS));

        let err = config.apply_env(env(&[(ENV_WIRE, "carrier-pigeon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key: ENV_WIRE, .. }));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "backend_url": "http://10.0.0.2:8000", "wire": "json" }}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(config.backend_url, "http://10.0.0.2:8000");
        assert_eq!(config.wire, WireFormat::Json);
        assert_eq!(config.canvas_width, 512);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_zero_canvas_width_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "canvas_width": 0 }}"#).unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCanvas { width: 0, height: 512, .. }), "{err:?}");
    }

    #[test]
    fn test_oversized_canvas_is_rejected() {
        let config = Config {
            canvas_height: MAX_CANVAS_SIDE + 1,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            canvas_width: MAX_CANVAS_SIDE,
            canvas_height: 1,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }
}
