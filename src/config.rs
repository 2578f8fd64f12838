//! Configuration management for catalog endpoints, policies and paths.

use std::{
   fs,
   path::{Path, PathBuf},
   sync::OnceLock,
   time::Duration,
};

use directories::BaseDirs;
use figment::{
   Figment,
   providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::{
   error::{ConfigError, Result},
   fetch::Endpoints,
};

static CONFIG: OnceLock<Config> = OnceLock::new();

pub const DEFAULT_API_BASE_URL: &str = "https://api.unfoldingword.org/ts/txt";
pub const DEFAULT_API_VERSION: &str = "2";
pub const DEFAULT_TARGET_LANGUAGES_URL: &str = "https://td.unfoldingword.org/exports/langnames.json";
pub const DEFAULT_CHUNKS_URL_TEMPLATE: &str =
   "https://api.unfoldingword.org/bible/txt/1/{project}/chunks.json";
pub const DEFAULT_RESOURCE_ID: &str = "ulb";
pub const SOURCE_TRANSLATION_MIN_CHECKING_LEVEL: u32 = 3;

/// Application configuration loaded from config file and environment variables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
   pub api_base_url:         String,
   pub api_version:          String,
   pub target_languages_url: String,
   pub chunks_url_template:  String,
   pub request_timeout_ms:   u64,
   pub user_agent:           String,

   pub default_resource_id:         String,
   pub min_checking_level:          u32,
   pub download_min_checking_level: Option<u32>,

   pub library_dir: Option<PathBuf>,
   pub cache_dir:   Option<PathBuf>,
}

impl Default for Config {
   fn default() -> Self {
      Self {
         api_base_url: DEFAULT_API_BASE_URL.to_string(),
         api_version: DEFAULT_API_VERSION.to_string(),
         target_languages_url: DEFAULT_TARGET_LANGUAGES_URL.to_string(),
         chunks_url_template: DEFAULT_CHUNKS_URL_TEMPLATE.to_string(),
         request_timeout_ms: 20_000,
         user_agent: format!("srclib/{}", env!("CARGO_PKG_VERSION")),
         default_resource_id: DEFAULT_RESOURCE_ID.to_string(),
         min_checking_level: SOURCE_TRANSLATION_MIN_CHECKING_LEVEL,
         download_min_checking_level: None,
         library_dir: None,
         cache_dir: None,
      }
   }
}

impl Config {
   pub fn load() -> Self {
      let config_path = ensure_global_config();

      Figment::from(Serialized::defaults(Self::default()))
         .merge(Toml::file(config_path))
         .merge(Env::prefixed("SRCLIB_").lowercase(true))
         .extract()
         .inspect_err(|e| tracing::warn!("failed to parse config: {e}"))
         .unwrap_or_default()
   }

   fn create_default_config(path: &Path) {
      if let Some(parent) = path.parent() {
         let _ = fs::create_dir_all(parent);
      }
      let default_config = Self::default();
      if let Ok(toml) = toml::to_string_pretty(&default_config) {
         let _ = fs::write(path, toml);
      }
   }

   pub const fn request_timeout(&self) -> Duration {
      Duration::from_millis(self.request_timeout_ms)
   }

   /// Directory holding the durable app index and the target-language file.
   pub fn library_dir(&self) -> PathBuf {
      self
         .library_dir
         .clone()
         .unwrap_or_else(|| default_library_dir().clone())
   }

   /// Directory holding the disposable server-mirror and download indexes.
   pub fn cache_dir(&self) -> PathBuf {
      self
         .cache_dir
         .clone()
         .unwrap_or_else(|| default_cache_dir().clone())
   }

   pub fn endpoints(&self) -> Endpoints {
      Endpoints::new(&self.api_base_url, &self.api_version)
         .with_target_languages_url(&self.target_languages_url)
         .with_chunks_url_template(&self.chunks_url_template)
   }

   pub fn validate(&self) -> Result<()> {
      for url in [&self.api_base_url, &self.target_languages_url, &self.chunks_url_template] {
         if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::InvalidUrl(url.clone()).into());
         }
      }
      Ok(())
   }
}

/// Returns the global configuration instance
pub fn get() -> &'static Config {
   CONFIG.get_or_init(Config::load)
}

/// Returns the base directory for srclib data and configuration
pub fn base_dir() -> &'static PathBuf {
   static ONCE: OnceLock<PathBuf> = OnceLock::new();
   ONCE.get_or_init(|| resolve_base_dir(".srclib"))
}

fn ensure_global_config() -> PathBuf {
   let config_path = config_file_path();
   if !config_path.exists() {
      Config::create_default_config(config_path);
   }
   config_path.clone()
}

fn resolve_base_dir(dir_name: &str) -> PathBuf {
   BaseDirs::new()
      .map(|d| d.home_dir().join(dir_name))
      .or_else(|| {
         std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join(dir_name))
      })
      .unwrap_or_else(|| {
         std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(dir_name)
      })
}

macro_rules! define_paths {
   ($($fn_name:ident: $path:literal),* $(,)?) => {
      $(
         pub fn $fn_name() -> &'static PathBuf {
            static ONCE: OnceLock<PathBuf> = OnceLock::new();
            ONCE.get_or_init(|| base_dir().join($path))
         }
      )*
   };
}

define_paths! {
   config_file_path: "config.toml",
   default_library_dir: "library",
   default_cache_dir: "cache",
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn defaults_validate() {
      Config::default().validate().expect("defaults are valid");
   }

   #[test]
   fn rejects_non_http_base_url() {
      let cfg = Config { api_base_url: "ftp://example.org".to_string(), ..Config::default() };
      assert!(cfg.validate().is_err());
   }

   #[test]
   fn configured_dirs_override_defaults() {
      let cfg = Config {
         library_dir: Some(PathBuf::from("/tmp/lib")),
         cache_dir: Some(PathBuf::from("/tmp/cache")),
         ..Config::default()
      };
      assert_eq!(cfg.library_dir(), PathBuf::from("/tmp/lib"));
      assert_eq!(cfg.cache_dir(), PathBuf::from("/tmp/cache"));
   }
}
