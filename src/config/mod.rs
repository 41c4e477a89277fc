use crate::models::AppConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// File name of the host configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "fetchpub.yaml";

/// Prefix for environment overrides, e.g. `FETCHPUB_IMAGE_URL`.
pub const ENV_PREFIX: &str = "FETCHPUB";

/// Configuration manager for loading and saving `fetchpub.yaml`.
///
/// Loading layers, lowest priority first:
/// 1. [`AppConfig::default()`]
/// 2. `fetchpub.yaml` in the config directory (optional)
/// 3. `FETCHPUB_*` environment variables
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager, creating `config_dir` if needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
        })
    }

    /// Load the layered configuration.
    pub fn load_config(&self) -> Result<AppConfig> {
        self.load_config_with_env(config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Load with a caller-supplied environment source (tests inject a fixed map).
    pub fn load_config_with_env(&self, env: config::Environment) -> Result<AppConfig> {
        if !self.config_path.exists() {
            tracing::warn!("Config file not found at {}, using defaults", self.config_path);
        }

        let defaults = config::Config::try_from(&AppConfig::default())
            .context("Failed to build default configuration")?;

        let layered = config::Config::builder()
            .add_source(defaults)
            .add_source(
                config::File::from(self.config_path.as_std_path())
                    .format(config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(env.try_parsing(true))
            .build()
            .with_context(|| format!("Failed to read config: {}", self.config_path))?;

        let app_config: AppConfig = layered
            .try_deserialize()
            .with_context(|| format!("Failed to parse config: {}", self.config_path))?;

        tracing::info!(
            "Loaded config: image_url={}, workers={}, timeout={:?}",
            app_config.image_url,
            app_config.worker_threads,
            app_config.request_timeout_secs
        );
        Ok(app_config)
    }

    /// Save the configuration as YAML.
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write config: {}", self.config_path))?;

        tracing::info!("Saved config to {}", self.config_path);
        Ok(())
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}
