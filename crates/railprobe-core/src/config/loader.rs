use super::schema::RailprobeConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Where configuration is looked for, in order.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("./railprobe.yaml")];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".railprobe").join("config.yaml"));
    }
    paths
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// First existing file from [`search_paths`], else built-in defaults.
    pub async fn load_default() -> Result<RailprobeConfig, ConfigError> {
        for path in search_paths() {
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Self::load_from(&path).await;
            }
            debug!("No config at {}", path.display());
        }
        info!("No config file found, using defaults");
        Ok(RailprobeConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<RailprobeConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config: RailprobeConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        info!(
            "Loaded config from {} (site {})",
            path.display(),
            config.site.base_url
        );
        Ok(config)
    }
}
