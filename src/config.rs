use std::path::{Path, PathBuf};

use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub remote: RemoteConfig,
  /// Directory for the local cache database (defaults to the platform data
  /// directory)
  pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
  /// Supabase project URL, e.g. https://xyzcompany.supabase.co
  pub url: String,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./vitrina.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/vitrina/config.yaml
  /// 4. ~/.config/vitrina/config.yaml
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
        "No configuration file found. Create one at ~/.config/vitrina/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("vitrina.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("vitrina").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the Supabase API key from environment variables.
  ///
  /// Checks VITRINA_SUPABASE_KEY first, then SUPABASE_ANON_KEY as fallback.
  pub fn api_key() -> Result<String> {
    std::env::var("VITRINA_SUPABASE_KEY")
      .or_else(|_| std::env::var("SUPABASE_ANON_KEY"))
      .map_err(|_| {
        eyre!(
          "Supabase API key not found. Set VITRINA_SUPABASE_KEY or SUPABASE_ANON_KEY environment variable."
        )
      })
  }

  /// Path of the local cache database, when `data_dir` is configured.
  pub fn local_db_path(&self) -> Option<PathBuf> {
    self.data_dir.as_ref().map(|dir| dir.join("local.db"))
  }
}
