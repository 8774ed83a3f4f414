use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::loader::YearRange;

pub const API_URL_ENV: &str = "ELECTIONS_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
    #[serde(default = "default_min_year")]
    pub min_year: i64,
    #[serde(default = "default_max_year")]
    pub max_year: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_search_min_chars")]
    pub search_min_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub db_path: Option<PathBuf>,
    pub csv_path: Option<PathBuf>,
    pub api_url: Option<String>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/election-insights/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        let mut config = if path.exists() {
            let data = fs::read_to_string(&path)
                .with_context(|| format!("failed reading config: {}", path.display()))?;
            toml::from_str::<Self>(&data)
                .with_context(|| format!("failed parsing TOML config: {}", path.display()))?
        } else {
            Self::default()
        };
        if let Ok(url) = env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.dashboard.api_url = url.trim().to_string();
            }
        }
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(db_path) = overrides.db_path {
            self.storage.db_path = db_path.display().to_string();
        }
        if let Some(csv_path) = overrides.csv_path {
            self.loader.csv_path = csv_path.display().to_string();
        }
        if let Some(api_url) = overrides.api_url {
            self.dashboard.api_url = api_url;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    pub fn resolved_csv_path(&self) -> PathBuf {
        expand_tilde(&self.loader.csv_path)
    }

    pub fn year_range(&self) -> YearRange {
        YearRange::new(self.loader.min_year, self.loader.max_year)
    }

    pub fn default_template() -> String {
        let template = r#"[storage]
db_path = "data/elections.db"

[loader]
csv_path = "All_States_GE.csv"
min_year = 1991
max_year = 2019

[server]
host = "127.0.0.1"
port = 8000
search_min_chars = 3

[dashboard]
api_url = "http://127.0.0.1:8000"
cache_ttl_secs = 600
timeout_secs = 30
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            min_year: default_min_year(),
            max_year: default_max_year(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            search_min_chars: default_search_min_chars(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            cache_ttl_secs: default_cache_ttl_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_db_path() -> String {
    "data/elections.db".to_string()
}

fn default_csv_path() -> String {
    "All_States_GE.csv".to_string()
}

fn default_min_year() -> i64 {
    1991
}

fn default_max_year() -> i64 {
    2019
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_search_min_chars() -> usize {
    3
}

fn default_api_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    600
}

fn default_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_to_defaults() {
        let parsed: Config =
            toml::from_str(&Config::default_template()).expect("template should parse");
        let defaults = Config::default();
        assert_eq!(parsed.storage.db_path, defaults.storage.db_path);
        assert_eq!(parsed.loader.min_year, 1991);
        assert_eq!(parsed.loader.max_year, 2019);
        assert_eq!(parsed.server.port, defaults.server.port);
        assert_eq!(parsed.dashboard.cache_ttl_secs, 600);
    }

    #[test]
    fn partial_config_fills_missing_sections() {
        let parsed: Config = toml::from_str("[server]\nport = 9100\n").expect("parse");
        assert_eq!(parsed.server.port, 9100);
        assert_eq!(parsed.server.search_min_chars, 3);
        assert_eq!(parsed.loader.csv_path, "All_States_GE.csv");
    }

    #[test]
    fn overrides_replace_paths() {
        let mut config = Config::default();
        config.apply_overrides(ConfigOverrides {
            db_path: Some(PathBuf::from("/tmp/out.db")),
            csv_path: None,
            api_url: Some("http://example.test".to_string()),
        });
        assert_eq!(config.resolved_db_path(), PathBuf::from("/tmp/out.db"));
        assert_eq!(config.loader.csv_path, "All_States_GE.csv");
        assert_eq!(config.dashboard.api_url, "http://example.test");
    }
}
