use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

pub const CONFIG_ENV: &str = "CANVAS_STUDIO_CONFIG";
const BIND_ENV: &str = "CANVAS_STUDIO_BIND";
const UPSTREAM_ENV: &str = "CANVAS_STUDIO_UPSTREAM";
const WEB_ROOT_ENV: &str = "CANVAS_STUDIO_WEB_ROOT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Base URL of the background removal service, ending in `/`
    pub upstream: String,
    /// Directory holding `uploads/` and `edits/`
    pub web_root: PathBuf,
    /// Largest accepted multipart upload, in bytes
    pub upload_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_owned(),
            upstream: "http://localhost:8000/".to_owned(),
            web_root: PathBuf::from("wwwroot"),
            upload_limit: 100_000_000,
        }
    }
}

impl ServerConfig {
    /// Defaults, then the file named by `CANVAS_STUDIO_CONFIG`, then the environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("Reading server config from {}", path.display());
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(bind) = lookup(BIND_ENV) {
            self.bind = bind;
        }
        if let Some(upstream) = lookup(UPSTREAM_ENV) {
            self.upstream = upstream;
        }
        if let Some(root) = lookup(WEB_ROOT_ENV) {
            self.web_root = PathBuf::from(root);
        }
        if !self.upstream.ends_with('/') {
            self.upstream.push('/');
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind.trim().is_empty() {
            return Err(ConfigError::Invalid("bind address is empty".to_owned()));
        }
        if self.upload_limit == 0 {
            return Err(ConfigError::Invalid("upload limit must be positive".to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_overrides_win_over_file_values() {
        let mut config: ServerConfig =
            serde_json::from_str(r#"{ "bind": "0.0.0.0:80", "upstream": "http://rembg:9000" }"#).unwrap();
        assert_eq!(config.upload_limit, 100_000_000);

        let env: HashMap<&str, &str> = [(WEB_ROOT_ENV, "/srv/www")].into();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.bind, "0.0.0.0:80");
        assert_eq!(config.upstream, "http://rembg:9000/");
        assert_eq!(config.web_root, PathBuf::from("/srv/www"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ServerConfig { upload_limit: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
