use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::ui::view::Route;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  /// Custom title for header (defaults to the API host if not set)
  pub title: Option<String>,
  /// View opened on startup
  #[serde(default)]
  pub default_view: StartView,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub articles: ArticlesConfig,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// GraphQL endpoint, e.g. https://api.readflow.app/graphql
  pub url: String,
  /// Request timeout handed to the HTTP transport
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
  30
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Disable to always go to the network
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Seconds before a cached query result is refetched on open
  #[serde(default = "default_stale_secs")]
  pub stale_secs: i64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      stale_secs: default_stale_secs(),
    }
  }
}

impl CacheConfig {
  /// `stale_secs` as a duration, `None` when negative or out of range
  pub fn stale_time(&self) -> Option<chrono::Duration> {
    chrono::Duration::try_seconds(self.stale_secs).filter(|d| *d >= chrono::Duration::zero())
  }
}

fn default_true() -> bool {
  true
}

fn default_stale_secs() -> i64 {
  300
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArticlesConfig {
  /// Page size for article lists
  #[serde(default = "default_limit")]
  pub limit: u32,
}

impl Default for ArticlesConfig {
  fn default() -> Self {
    Self {
      limit: default_limit(),
    }
  }
}

fn default_limit() -> u32 {
  50
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  /// Default filter directive, overridden by RUST_LOG
  #[serde(default = "default_log_level")]
  pub level: String,
  /// Directory for log files (defaults to the data directory)
  pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      directory: None,
    }
  }
}

fn default_log_level() -> String {
  "readflow_tui=info".to_string()
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StartView {
  /// Unread articles
  #[default]
  Articles,
  /// Read articles
  History,
  Categories,
  Rules,
}

impl StartView {
  pub fn route(self) -> Route {
    match self {
      StartView::Articles => Route::unread(),
      StartView::History => Route::history(),
      StartView::Categories => Route::Categories,
      StartView::Rules => Route::Rules,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./readflow.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/readflow-tui/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/readflow-tui/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("readflow.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("readflow-tui").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Invalid config file {}: {}", path.display(), e))
  }

  /// Parse and validate a YAML document.
  pub fn parse(contents: &str) -> Result<Self> {
    let config: Config =
      serde_yaml::from_str(contents).map_err(|e| eyre!("Failed to parse config: {}", e))?;
    config.endpoint()?;
    if config.cache.stale_time().is_none() {
      return Err(eyre!(
        "cache.stale_secs must be a non-negative number of seconds, got {}",
        config.cache.stale_secs
      ));
    }
    Ok(config)
  }

  /// The GraphQL endpoint as a parsed URL.
  pub fn endpoint(&self) -> Result<Url> {
    let url = Url::parse(&self.api.url)
      .map_err(|e| eyre!("Invalid api.url '{}': {}", self.api.url, e))?;
    match url.scheme() {
      "http" | "https" => Ok(url),
      other => Err(eyre!("Unsupported api.url scheme '{}'", other)),
    }
  }

  /// Header title: configured title or the API host.
  pub fn display_title(&self) -> String {
    if let Some(title) = &self.title {
      return title.clone();
    }
    self
      .endpoint()
      .ok()
      .and_then(|u| u.host_str().map(String::from))
      .unwrap_or_else(|| self.api.url.clone())
  }

  /// Get the API token from environment variables.
  ///
  /// Checks READFLOW_TOKEN first, then READFLOW_API_KEY as fallback.
  pub fn get_api_token() -> Result<String> {
    std::env::var("READFLOW_TOKEN")
      .or_else(|_| std::env::var("READFLOW_API_KEY"))
      .map_err(|_| {
        eyre!("readflow token not found. Set READFLOW_TOKEN or READFLOW_API_KEY environment variable.")
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_minimal_config_uses_defaults() {
    let config = Config::parse("api:\n  url: https://api.readflow.app/graphql\n").unwrap();
    assert_eq!(config.api.timeout_secs, 30);
    assert!(config.cache.enabled);
    assert_eq!(config.cache.stale_secs, 300);
    assert_eq!(config.articles.limit, 50);
    assert_eq!(config.default_view, StartView::Articles);
    assert_eq!(config.display_title(), "api.readflow.app");
  }

  #[test]
  fn test_full_config() {
    let yaml = r#"
api:
  url: http://localhost:8080/graphql
  timeout_secs: 5
title: My reading list
default_view: categories
cache:
  enabled: false
  stale_secs: 10
articles:
  limit: 20
log:
  level: debug
"#;
    let config = Config::parse(yaml).unwrap();
    assert_eq!(config.api.timeout_secs, 5);
    assert!(!config.cache.enabled);
    assert_eq!(config.default_view, StartView::Categories);
    assert_eq!(config.display_title(), "My reading list");
    assert_eq!(config.log.level, "debug");
  }

  #[test]
  fn test_invalid_url_rejected() {
    assert!(Config::parse("api:\n  url: not a url\n").is_err());
    assert!(Config::parse("api:\n  url: ftp://example.com/graphql\n").is_err());
  }

  #[test]
  fn test_negative_stale_time_rejected() {
    let yaml = "api:\n  url: https://x.test/graphql\ncache:\n  stale_secs: -1\n";
    assert!(Config::parse(yaml).is_err());
  }

  #[test]
  fn test_out_of_range_stale_time_rejected() {
    let yaml = "api:\n  url: https://x.test/graphql\ncache:\n  stale_secs: 9223372036854775807\n";
    assert!(Config::parse(yaml).is_err());

    let cache = CacheConfig {
      enabled: true,
      stale_secs: i64::MAX,
    };
    assert_eq!(cache.stale_time(), None);
    assert_eq!(
      CacheConfig::default().stale_time(),
      Some(chrono::Duration::seconds(300))
    );
  }
}
