use anyhow::{anyhow, bail, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncReadExt;

const CONFIG_PATH_REL_HOME: &str = ".config/pulsebot/config.toml";

/// Source of environment variables.
pub trait ReadEnv {
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment.
pub struct ProcessEnv;

impl ReadEnv for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Bot configuration
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub metrics: Metrics,
    #[serde(default)]
    pub alerts: Alerts,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct General {
    #[serde(default)]
    pub discord_token: String,
    #[serde(default = "default_prefix")]
    pub command_prefix: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Metrics {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Alerts {
    pub webhook_url: Option<String>,
    #[serde(default = "default_slow_invocation")]
    pub slow_invocation_seconds: f64,
}

fn default_prefix() -> String {
    "?".to_owned()
}

fn default_port() -> u16 {
    8000
}

fn default_refresh_interval() -> u64 {
    30
}

fn default_slow_invocation() -> f64 {
    1.0
}

impl Default for General {
    fn default() -> Self {
        Self {
            discord_token: String::new(),
            command_prefix: default_prefix(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            port: default_port(),
            refresh_interval_seconds: default_refresh_interval(),
        }
    }
}

impl Default for Alerts {
    fn default() -> Self {
        Self {
            webhook_url: None,
            slow_invocation_seconds: default_slow_invocation(),
        }
    }
}

impl Metrics {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds.max(1))
    }
}

impl Alerts {
    pub fn slow_threshold(&self) -> Duration {
        Duration::try_from_secs_f64(self.slow_invocation_seconds)
            .unwrap_or(crate::alert::DEFAULT_SLOW_THRESHOLD)
    }
}

impl Config {
    fn config_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|p| p.join(CONFIG_PATH_REL_HOME))
            .ok_or(anyhow!("Could not find home directory"))
    }

    /// Load from the home directory and the process environment.
    pub async fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path, &ProcessEnv).await
    }

    /// Read `path` if it exists, then apply environment overrides.  Fails without a token.
    pub async fn load_from(path: &Path, env: &dyn ReadEnv) -> Result<Self> {
        let mut config = if tokio::fs::try_exists(path).await.unwrap_or(false) {
            Self::read(path).await?
        } else {
            Self::default()
        };

        config.apply_env(env)?;

        if config.general.discord_token.trim().is_empty() {
            bail!(
                "No bot token: set `general.discord_token` in `{}` or BOT_TOKEN",
                path.to_string_lossy()
            );
        }
        Ok(config)
    }

    async fn read(path: &Path) -> Result<Self> {
        let mut file = tokio::fs::File::open(path).await.map_err(|e| {
            anyhow!(
                "Could not open configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).await.map_err(|e| {
            anyhow!(
                "Could not read configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        toml::from_str(&contents).map_err(|e| {
            anyhow!(
                "Could not parse configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })
    }

    fn apply_env(&mut self, env: &dyn ReadEnv) -> Result<()> {
        if let Some(token) = env.var("BOT_TOKEN") {
            self.general.discord_token = token;
        }
        if let Some(prefix) = env.var("COMMAND_PREFIX") {
            self.general.command_prefix = prefix;
        }
        if let Some(url) = env.var("SLACK_WEBHOOK_URL") {
            self.alerts.webhook_url = Some(url);
        }
        if let Some(port) = env.var("METRICS_PORT") {
            self.metrics.port = port
                .parse()
                .map_err(|e| anyhow!("Invalid METRICS_PORT `{}`: {}", port, e))?;
        }

        // An empty webhook URL means alerts are off.
        if self
            .alerts
            .webhook_url
            .as_deref()
            .is_some_and(|url| url.trim().is_empty())
        {
            self.alerts.webhook_url = None;
        }
        if self.general.command_prefix.is_empty() {
            bail!("The command prefix cannot be empty");
        }
        Ok(())
    }
}
