use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::models::{ConnectTimeout, RetentionStrategy};

const APP_DIR: &str = "m3u-aggregator";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Where snapshots of local and content playlists are written.
    #[serde(default = "default_files_dir")]
    pub files_dir: String,

    #[serde(default)]
    pub retention_strategy: RetentionStrategy,

    #[serde(default)]
    pub connect_timeout: ConnectTimeout,

    #[serde(default = "default_ssl_verification")]
    pub ssl_verification: bool,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn data_dir() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);
    std::fs::create_dir_all(&data_dir).ok();
    data_dir
}

fn default_db_path() -> String {
    data_dir().join("playlists.db").to_string_lossy().to_string()
}

fn default_files_dir() -> String {
    data_dir().join("files").to_string_lossy().to_string()
}

fn default_ssl_verification() -> bool {
    true
}

fn default_user_agent() -> String {
    format!("m3u-aggregator/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            files_dir: default_files_dir(),
            retention_strategy: RetentionStrategy::default(),
            connect_timeout: ConnectTimeout::default(),
            ssl_verification: default_ssl_verification(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }
}

/// A setting that changed through [`Configuration`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChange {
    pub key: &'static str,
    pub old: String,
    pub new: String,
}

impl fmt::Display for ConfigChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.key, self.old, self.new)
    }
}

pub type ChangeListener = Box<dyn Fn(&Config, &ConfigChange) + Send + Sync>;

/// Mutable settings with explicit setters.
///
/// Every setter compares the old and new value and, when they differ, calls
/// each registered listener with the updated config and the change.
pub struct Configuration {
    config: Config,
    listeners: Vec<ChangeListener>,
}

impl Configuration {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            listeners: Vec::new(),
        }
    }

    pub fn get(&self) -> &Config {
        &self.config
    }

    pub fn on_change(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    pub fn set_retention_strategy(&mut self, value: RetentionStrategy) {
        let old = std::mem::replace(&mut self.config.retention_strategy, value);
        self.notify("retention_strategy", old, value);
    }

    pub fn set_connect_timeout(&mut self, value: ConnectTimeout) {
        let old = std::mem::replace(&mut self.config.connect_timeout, value);
        self.notify("connect_timeout", old, value);
    }

    pub fn set_ssl_verification(&mut self, value: bool) {
        let old = std::mem::replace(&mut self.config.ssl_verification, value);
        self.notify("ssl_verification", old, value);
    }

    fn notify<T: PartialEq + fmt::Display>(&self, key: &'static str, old: T, new: T) {
        if old == new {
            return;
        }
        let change = ConfigChange {
            key,
            old: old.to_string(),
            new: new.to_string(),
        };
        tracing::debug!("Config changed: {}", change);
        for listener in &self.listeners {
            listener(&self.config, &change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn test_config() -> Config {
        Config {
            db_path: ":memory:".to_string(),
            files_dir: "files".to_string(),
            retention_strategy: RetentionStrategy::SkipFavorite,
            connect_timeout: ConnectTimeout::Short,
            ssl_verification: true,
            user_agent: "test".to_string(),
        }
    }

    #[test]
    fn setters_notify_listeners_with_old_and_new() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut configuration = Configuration::new(test_config());
        let sink = Arc::clone(&seen);
        configuration.on_change(Box::new(move |config, change| {
            sink.lock()
                .unwrap()
                .push((change.clone(), config.connect_timeout));
        }));

        configuration.set_connect_timeout(ConnectTimeout::Long);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.key, "connect_timeout");
        assert_eq!(seen[0].0.old, "short");
        assert_eq!(seen[0].0.new, "long");
        assert_eq!(seen[0].1, ConnectTimeout::Long);
    }

    #[test]
    fn unchanged_value_does_not_notify() {
        let count = Arc::new(Mutex::new(0));
        let mut configuration = Configuration::new(test_config());
        let sink = Arc::clone(&count);
        configuration.on_change(Box::new(move |_, _| {
            *sink.lock().unwrap() += 1;
        }));

        configuration.set_retention_strategy(RetentionStrategy::SkipFavorite);
        configuration.set_ssl_verification(true);
        assert_eq!(*count.lock().unwrap(), 0);

        configuration.set_retention_strategy(RetentionStrategy::All);
        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(configuration.get().retention_strategy, RetentionStrategy::All);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = toml::from_str("db_path = \"x.db\"\n").unwrap();
        assert_eq!(config.db_path, "x.db");
        assert_eq!(config.retention_strategy, RetentionStrategy::SkipFavorite);
        assert_eq!(config.connect_timeout, ConnectTimeout::Short);
        assert!(config.ssl_verification);
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config {
            retention_strategy: RetentionStrategy::KeepAll,
            connect_timeout: ConnectTimeout::Medium,
            ..test_config()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("retention_strategy = \"keep_all\""));
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
