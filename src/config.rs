//! Application configuration.
//!
//! Priority: CLI flag > CLI env var > `PORTFOLIO_*` env > config file >
//! defaults. The config file is `--config`/`CONFIG_FILE` when given,
//! otherwise `./config.yaml` if it exists.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::contact::DEFAULT_RELAY_BASE_URL;
use crate::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL, LlmSettings, Provider};

/// Env vars consulted for the completion API key when the config has none.
const API_KEY_FALLBACK_VARS: [&str; 2] = ["GROQ_API_KEY", "LLM_API_KEY"];

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Enable rate limiting
    #[arg(long, env = "RATE_LIMIT_ENABLED")]
    pub rate_limit_enabled: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub chat: ChatConfig,
    pub contact: ContactConfig,
    pub resilience: ResilienceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Directory served under `/static`.
    pub static_dir: String,
}

#[derive(Deserialize, Clone)]
pub struct ChatConfig {
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Idle time after which a chat session is discarded.
    pub session_idle_secs: u64,
    /// Profile YAML replacing the built-in one.
    #[serde(default)]
    pub profile_path: Option<String>,
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("session_idle_secs", &self.session_idle_secs)
            .field("profile_path", &self.profile_path)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContactConfig {
    pub relay_base_url: String,
    /// Address the relay delivers to. Contact is disabled without it.
    #[serde(default)]
    pub recipient: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResilienceConfig {
    pub rate_limit_enabled: bool,
    pub requests_per_second: f32,
    pub burst_size: f32,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.static_dir", "static")?
            .set_default("chat.base_url", DEFAULT_BASE_URL)?
            .set_default("chat.model", DEFAULT_MODEL)?
            .set_default("chat.session_idle_secs", 30 * 60)?
            .set_default("contact.relay_base_url", DEFAULT_RELAY_BASE_URL)?
            .set_default("resilience.rate_limit_enabled", true)?
            .set_default("resilience.requests_per_second", 2.0)?
            .set_default("resilience.burst_size", 10.0)?
            .set_default("resilience.request_timeout_secs", 30)?;

        builder = match &cli.config {
            Some(path) => builder.add_source(File::new(path, FileFormat::Yaml).required(true)),
            None => builder.add_source(File::new("config.yaml", FileFormat::Yaml).required(false)),
        };

        // E.g. PORTFOLIO_SERVER__PORT=8000, PORTFOLIO_CHAT__API_KEY=gsk-...
        builder = builder.add_source(
            Environment::with_prefix("PORTFOLIO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(rl) = cli.rate_limit_enabled {
            builder = builder.set_override("resilience.rate_limit_enabled", rl)?;
        }

        let mut cfg: Self = builder.build()?.try_deserialize()?;

        if cfg.chat.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            cfg.chat.api_key = API_KEY_FALLBACK_VARS
                .iter()
                .find_map(|var| std::env::var(var).ok())
                .filter(|k| !k.trim().is_empty());
        }

        Ok(cfg)
    }

    /// Completion settings, or `None` when no API key is configured.
    #[must_use]
    pub fn llm_settings(&self) -> Option<LlmSettings> {
        let api_key = self.chat.api_key.clone().filter(|k| !k.trim().is_empty())?;
        Some(LlmSettings {
            provider: Provider::detect_from_url(&self.chat.base_url),
            base_url: self.chat.base_url.clone(),
            api_key,
            model: self.chat.model.clone(),
        })
    }

    /// Idle timeout for chat sessions.
    #[must_use]
    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.chat.session_idle_secs)
    }

    /// Timeout for non-streaming requests.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.resilience.request_timeout_secs)
    }

    /// Profile override path, if any.
    #[must_use]
    pub fn profile_path(&self) -> Option<PathBuf> {
        self.chat.profile_path.as_ref().map(PathBuf::from)
    }

    /// `host:port` to bind.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
