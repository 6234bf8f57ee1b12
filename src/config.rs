use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for shutterpost.
///
/// Holds the directory layout, the default caption template, and the upload
/// endpoint credentials. Constructed once and passed into the pipeline by
/// reference — nothing here is process-global, so tests can run against a
/// throwaway config without touching the environment.
///
/// # Loading
///
/// ```rust,no_run
/// use shutterpost::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.directories.pending_dir = "photos/queue".into();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where pending images live and where posted ones are archived.
    pub directories: Directories,
    /// Caption used when neither `--caption` nor a sidecar file applies.
    /// May contain `{VARIABLE}` placeholders.
    pub default_caption: String,
    /// Upload endpoint credentials.
    pub service: ServiceConfig,
}

/// Directory layout. Both directories are created on demand; the move from
/// pending to processed is a rename, so they must sit on one filesystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directories {
    pub pending_dir: PathBuf,
    pub processed_dir: PathBuf,
}

/// Upload endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// URL the image + caption multipart POST is sent to.
    pub endpoint: String,
    /// Bearer token for the endpoint.
    pub access_token: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directories: Directories {
                pending_dir: PathBuf::from("images"),
                processed_dir: PathBuf::from("uploaded"),
            },
            default_caption: String::new(),
            service: ServiceConfig {
                endpoint: String::new(),
                access_token: String::new(),
            },
        }
    }
}

impl Config {
    /// Resolve the config file path — same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }
}
