use crate::cli::{Cli, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

const CONFIG_FILE_NAMES: [&str; 4] = [
    "echovox.toml",
    "echovox.json",
    ".echovox.toml",
    ".echovox.json",
];

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Invalid value for {name}: {value}")]
    Environment { name: &'static str, value: String },

    #[error("Unsupported config file extension: .{0}")]
    UnsupportedFormat(String),
}

impl ConfigError {
    /// Process exit status used by the command line front end
    pub const EXIT_CODE: u8 = 7;
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

/// Where stored documents live
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage root directory
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set
    pub level: String,
    /// Emit JSON lines instead of plain text
    pub json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormatConfig,
}

/// Output format configuration (serializable version of CLI OutputFormat)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormatConfig {
    #[default]
    Human,
    Json,
}

impl From<OutputFormat> for OutputFormatConfig {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputFormatConfig::Human,
            OutputFormat::Json => OutputFormatConfig::Json,
        }
    }
}

impl From<OutputFormatConfig> for OutputFormat {
    fn from(format: OutputFormatConfig) -> Self {
        match format {
            OutputFormatConfig::Human => OutputFormat::Human,
            OutputFormatConfig::Json => OutputFormat::Json,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("echovox")
                .join("files"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

fn parse_toml(path: &Path, content: &str) -> Result<Config> {
    toml::from_str(content).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_json(path: &Path, content: &str) -> Result<Config> {
    serde_json::from_str(content).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        Self::load_config_with(&SystemEnvProvider, cli).await
    }

    /// [`load_config`](Self::load_config) reading variables from `env`
    pub async fn load_config_with(env: &impl EnvProvider, cli: &Cli) -> Result<Config> {
        let config = match &cli.config {
            Some(path) => Self::load_from_file(path).await?,
            None => Self::find_config_file().await?.unwrap_or_default(),
        };

        let config = Self::apply_environment_overrides_with(env, config)?;
        let config = Self::merge_with_cli(config, cli);
        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML or JSON file, chosen by extension
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => parse_toml(path, &content),
            Some("json") => parse_json(path, &content),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => parse_toml(path, &content).or_else(|_| parse_json(path, &content)),
        }
    }

    /// First config file found in the working directory, then in the user
    /// config directory
    pub async fn find_config_file() -> Result<Option<Config>> {
        let mut search_dirs = vec![PathBuf::from(".")];
        search_dirs.extend(dirs::config_dir().map(|dir| dir.join("echovox")));

        for dir in search_dirs {
            for name in CONFIG_FILE_NAMES {
                let path = dir.join(name);
                if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                    return Self::load_from_file(&path).await.map(Some);
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> Result<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        if let Some(directory) = env.get("ECHOVOX_STORAGE_DIR") {
            config.storage.directory = PathBuf::from(directory);
        }

        if let Some(level) = env.get("ECHOVOX_LOG_LEVEL") {
            config.logging.level = level.to_lowercase();
        }

        if let Some(json) = env.get("ECHOVOX_LOG_JSON") {
            config.logging.json = json.parse().map_err(|_| ConfigError::Environment {
                name: "ECHOVOX_LOG_JSON",
                value: json.clone(),
            })?;
        }

        if let Some(format) = env.get("ECHOVOX_FORMAT") {
            config.output.format = match format.to_lowercase().as_str() {
                "human" => OutputFormatConfig::Human,
                "json" => OutputFormatConfig::Json,
                _ => {
                    return Err(ConfigError::Environment {
                        name: "ECHOVOX_FORMAT",
                        value: format,
                    });
                }
            };
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if let Some(storage_dir) = &cli.storage_dir {
            config.storage.directory = storage_dir.clone();
        }

        if let Some(level) = cli.log_level_override() {
            config.logging.level = level.to_string();
        }
        if cli.json_logs {
            config.logging.json = true;
        }

        if let Some(format) = cli.format {
            config.output.format = format.into();
        }

        config
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if config.storage.directory.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "Storage directory must not be empty".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Invalid log level: {} (expected one of {})",
                config.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}
