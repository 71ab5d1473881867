use anyhow::{Context, Result, anyhow, bail};
use chrono::{Local, NaiveDate, Utc};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".streak-habits";
const CONFIG_FILE: &str = "config.json";
const DB_FILE: &str = "streak_habits.db";
pub const DEFAULT_LIST_LIMIT: u32 = 3650;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deployment {
    #[default]
    Standalone,
    Serverless,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Clock {
    #[default]
    Local,
    Utc,
}

impl Clock {
    pub fn today(self) -> NaiveDate {
        match self {
            Clock::Local => Local::now().date_naive(),
            Clock::Utc => Utc::now().date_naive(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub deployment: Deployment,
    pub db_path: PathBuf,
    pub api_host: IpAddr,
    pub api_port: u16,
    pub serve_static: bool,
    pub list_limit: u32,
    pub clock: Clock,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            deployment: Deployment::Standalone,
            db_path: default_root_dir().join(DB_FILE),
            api_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            api_port: 8000,
            serve_static: true,
            list_limit: DEFAULT_LIST_LIMIT,
            clock: Clock::Local,
        }
    }
}

/// Everything the store and HTTP layer need, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub db_path: PathBuf,
    pub serve_static: bool,
    pub list_limit: u32,
    pub clock: Clock,
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        Ok(default_root_dir().join(CONFIG_FILE))
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.list_limit = config.list_limit.max(1);

        Ok(config)
    }

    pub fn load_or_default() -> Result<Self> {
        Self::load_or_default_from(&Self::config_path()?)
    }

    /// Only a missing file is replaced with defaults; a broken one is an error.
    pub fn load_or_default_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            return Self::load_from(config_path);
        }

        let config = Config::default();
        config.save_to(config_path)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
        set_mode_600(config_path)?;

        Ok(())
    }

    /// Serverless hosts only allow writes under the temp directory and ship
    /// no landing page.
    pub fn storage_path(&self) -> PathBuf {
        match self.deployment {
            Deployment::Standalone => self.db_path.clone(),
            Deployment::Serverless => std::env::temp_dir().join(DB_FILE),
        }
    }

    pub fn settings(&self) -> ServiceSettings {
        ServiceSettings {
            db_path: self.storage_path(),
            serve_static: self.serve_static && self.deployment == Deployment::Standalone,
            list_limit: self.list_limit,
            clock: self.clock,
        }
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match normalize_config_key(key) {
            "deployment" => {
                self.deployment = match value.trim() {
                    "standalone" => Deployment::Standalone,
                    "serverless" => Deployment::Serverless,
                    _ => bail!("deployment must be standalone/serverless"),
                };
            }
            "db_path" => {
                if value.trim().is_empty() {
                    bail!("db_path must not be empty");
                }
                self.db_path = expand_home(value.trim());
            }
            "api_host" => {
                self.api_host = value
                    .trim()
                    .parse::<IpAddr>()
                    .map_err(|_| anyhow!("api_host must be an IP address"))?;
            }
            "api_port" => {
                self.api_port = value
                    .parse::<u16>()
                    .map_err(|_| anyhow!("api_port must be a number"))?;
            }
            "serve_static" => {
                self.serve_static = value
                    .parse::<bool>()
                    .map_err(|_| anyhow!("serve_static must be true/false"))?;
            }
            "list_limit" => {
                let parsed = value
                    .parse::<u32>()
                    .map_err(|_| anyhow!("list_limit must be a number"))?;
                if parsed == 0 {
                    bail!("list_limit must be at least 1");
                }
                self.list_limit = parsed;
            }
            "clock" => {
                self.clock = match value.trim() {
                    "local" => Clock::Local,
                    "utc" => Clock::Utc,
                    _ => bail!("clock must be local/utc"),
                };
            }
            _ => {
                bail!(
                    "Unsupported config key: {key}. Supported keys: deployment|deploy.mode, db_path|db.path, api_host|api.host, api_port|api.port, serve_static|web.serve_static, list_limit|checkins.limit, clock|streak.clock"
                );
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Option<String> {
        match normalize_config_key(key) {
            "deployment" => Some(
                match self.deployment {
                    Deployment::Standalone => "standalone",
                    Deployment::Serverless => "serverless",
                }
                .to_string(),
            ),
            "db_path" => Some(self.db_path.display().to_string()),
            "storage_path" => Some(self.storage_path().display().to_string()),
            "api_host" => Some(self.api_host.to_string()),
            "api_port" => Some(self.api_port.to_string()),
            "serve_static" => Some(self.serve_static.to_string()),
            "list_limit" => Some(self.list_limit.to_string()),
            "clock" => Some(
                match self.clock {
                    Clock::Local => "local",
                    Clock::Utc => "utc",
                }
                .to_string(),
            ),
            _ => None,
        }
    }
}

fn normalize_config_key(key: &str) -> &str {
    match key {
        "deployment" | "deploy.mode" => "deployment",
        "db_path" | "db.path" => "db_path",
        "storage_path" | "db.storage_path" => "storage_path",
        "api_host" | "api.host" => "api_host",
        "api_port" | "api.port" => "api_port",
        "serve_static" | "web.serve_static" => "serve_static",
        "list_limit" | "checkins.limit" => "list_limit",
        "clock" | "streak.clock" => "clock",
        _ => key,
    }
}

pub fn expand_home(raw: &str) -> PathBuf {
    raw.strip_prefix("~/")
        .and_then(|stripped| home_dir().map(|home| home.join(stripped)))
        .unwrap_or_else(|| PathBuf::from(raw))
}

fn default_root_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn set_mode_600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set file permissions: {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Clock, Config, DEFAULT_LIST_LIMIT, Deployment};
    use std::net::{IpAddr, Ipv4Addr};
    use std::path::PathBuf;

    #[test]
    fn serverless_storage_lives_in_temp_dir_without_static_page() {
        let mut config = Config::default();
        config.set_value("deploy.mode", "serverless").expect("set deployment");

        let settings = config.settings();
        assert_eq!(settings.db_path, std::env::temp_dir().join("streak_habits.db"));
        assert!(!settings.serve_static);
    }

    #[test]
    fn standalone_storage_uses_configured_path() {
        let mut config = Config::default();
        config.set_value("db_path", "/srv/habits.db").expect("set db path");

        let settings = config.settings();
        assert_eq!(config.deployment, Deployment::Standalone);
        assert_eq!(settings.db_path, PathBuf::from("/srv/habits.db"));
        assert!(settings.serve_static);
        assert_eq!(settings.list_limit, DEFAULT_LIST_LIMIT);
    }

    #[test]
    fn rejects_invalid_values() {
        let mut config = Config::default();
        assert!(config.set_value("list_limit", "0").is_err());
        assert!(config.set_value("api_port", "eighty").is_err());
        assert!(config.set_value("clock", "mars").is_err());
        assert!(config.set_value("unknown.key", "1").is_err());
    }

    #[test]
    fn aliases_resolve_to_same_field() {
        let mut config = Config::default();
        config.set_value("api.host", "0.0.0.0").expect("set host");
        config.set_value("streak.clock", "utc").expect("set clock");

        assert_eq!(config.api_host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.clock, Clock::Utc);
        assert_eq!(config.get_value("api_host").as_deref(), Some("0.0.0.0"));
        assert_eq!(config.get_value("clock").as_deref(), Some("utc"));
    }

    #[test]
    fn saved_config_loads_back_with_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.set_value("api_port", "9100").expect("set port");
        config.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.api_port, 9100);

        std::fs::write(&path, r#"{"deployment":"serverless"}"#).expect("write partial");
        let partial = Config::load_from(&path).expect("load partial");
        assert_eq!(partial.deployment, Deployment::Serverless);
        assert_eq!(partial.api_port, 8000);
        assert_eq!(partial.list_limit, DEFAULT_LIST_LIMIT);
    }

    #[test]
    fn missing_config_is_created_with_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");

        let config = Config::load_or_default_from(&path).expect("defaults");
        assert_eq!(config.api_port, 8000);
        assert!(path.exists());
    }

    #[test]
    fn broken_config_is_reported_and_left_untouched() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        let broken = r#"{"api_port": 9100, "db_path": "/srv/mine.db",}"#;
        std::fs::write(&path, broken).expect("write broken config");

        let error = Config::load_or_default_from(&path).expect_err("parse error surfaced");
        assert!(format!("{error:#}").contains("Failed to parse config file"));
        assert_eq!(std::fs::read_to_string(&path).expect("read back"), broken);
    }
}
