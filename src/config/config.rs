use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use serde_with::DurationSeconds;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

const DEFAULT_BASE_URL: &str = "http://private-anon-71b931be7-dpcs.apiary-mock.com/vd1/";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
    pub snapshot: PathBuf,
}

// remote crash service
#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    pub base_url: String,

    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
}

// proxy config
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn fallback() -> Self {
        Config {
            api: ApiConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout: Duration::from_secs(30),
            },
            proxy: None,
            snapshot: PathBuf::from("datasets/snapshot.json"),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading configuration from: {:?}", path);

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        info!(
            "Loading configuration succeeded, File size: {} bytes",
            config_content.len()
        );

        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.validate()?;

        info!("Loaded configuration succeeded");

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.is_empty() {
            anyhow::bail!("API base url cannot be empty");
        }
        if self.api.timeout.is_zero() {
            anyhow::bail!("API timeout must be greater than 0");
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        load_config().unwrap_or_else(|e| {
            error!(
                "Failed to load config, using hardcoded default. Error: {:?}",
                e
            );
            Config::fallback()
        })
    }
}

impl ProxyConfig {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

// default load config from config/settings.toml
fn load_config() -> Result<Config> {
    let mut config_file = std::env::current_dir()?;
    config_file.push("config");
    config_file.push("settings.toml");

    Config::load(&config_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.api.base_url.ends_with("/vd1/"));
        assert_eq!(config.api.timeout, Duration::from_secs(30));
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_load_config_with_proxy() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
snapshot = "snap.json"

[api]
base_url = "http://localhost:3000/vd1/"
timeout = 5

[proxy]
host = "127.0.0.1"
port = 7890
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.api.timeout, Duration::from_secs(5));
        assert_eq!(config.snapshot, PathBuf::from("snap.json"));
        assert_eq!(config.proxy.unwrap().url(), "http://127.0.0.1:7890");
    }

    #[test]
    fn test_load_config_rejects_zero_timeout() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "snapshot = \"s.json\"\n[api]\nbase_url = \"http://x/vd1/\"\ntimeout = 0"
        )
        .unwrap();

        assert!(Config::load(file.path()).is_err());
    }
}
