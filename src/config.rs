//! Layered application configuration and credential loading.
//!
//! Priority (lowest first): built-in defaults, YAML config file, `GAMEFORGE_`
//! environment variables, CLI flags.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use clap::Parser;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

/// Prefix for environment overrides, e.g. `GAMEFORGE_SERVER__PORT=8000`.
pub const ENV_PREFIX: &str = "GAMEFORGE";

/// Config file picked up from the working directory when no path is given.
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

pub const DEFAULT_BASE_URL: &str = "https://api.cerebras.ai/v1";
pub const DEFAULT_MODEL: &str = "qwen-3-235b-a22b-instruct-2507";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Default model identifier
    #[arg(long, env = "LLM_MODEL")]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub secrets: SecretsConfig,
    pub game: GameConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// OpenAI-compatible endpoint, with or without a trailing `/v1`.
    pub base_url: String,
    /// Model used when a session has not picked one.
    pub model: String,
    /// Models offered in the page selector. Always contains `model`.
    #[serde(default)]
    pub models: Vec<String>,
}

impl LlmConfig {
    /// Returns `requested` if it is one of the offered models, else the default.
    #[must_use]
    pub fn resolve_model<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .filter(|name| self.models.iter().any(|m| m == name))
            .unwrap_or(&self.model)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecretsConfig {
    /// Name of the API key, both as env var and as key in the secrets file.
    pub api_key_name: String,
    /// TOML file holding secrets.
    pub file: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    /// Height of the embedded game viewer in pixels.
    pub viewer_height: u32,
    /// File name offered for the downloaded game.
    pub download_file_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_args(std::env::args_os())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("llm.base_url", DEFAULT_BASE_URL)?
            .set_default("llm.model", DEFAULT_MODEL)?
            .set_default("llm.models", Vec::<String>::new())?
            .set_default("secrets.api_key_name", "CEREBRAS_API_KEY")?
            .set_default("secrets.file", "secrets.toml")?
            .set_default("game.viewer_height", 600)?
            .set_default("game.download_file_name", "ai_game.html")?
            .set_default("logging.format", "text")?;

        match cli.config.as_deref() {
            Some(path) => {
                builder = builder.add_source(File::from(Path::new(path)).required(true));
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                builder = builder.add_source(File::from(Path::new(DEFAULT_CONFIG_FILE)));
            }
            None => {}
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("llm.models"),
        );

        // CLI flags (and the env vars clap reads for them) win over everything.
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(model) = cli.model {
            builder = builder.set_override("llm.model", model)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validated()
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        url::Url::parse(&self.llm.base_url).map_err(|e| {
            ConfigError::Message(format!("invalid llm.base_url {:?}: {e}", self.llm.base_url))
        })?;

        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Message("llm.model cannot be empty".to_string()));
        }

        self.llm.models.retain(|m| !m.trim().is_empty());
        if !self.llm.models.contains(&self.llm.model) {
            self.llm.models.insert(0, self.llm.model.clone());
        }

        Ok(self)
    }
}

/// API credential for the completion service.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a key, treating blank values as absent.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let trimmed = key.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

/// Reads the API key once: environment first, then the secrets file.
///
/// `Ok(None)` means no credential is configured.
pub fn load_api_key(secrets: &SecretsConfig) -> Result<Option<ApiKey>, ConfigError> {
    if let Some(key) = std::env::var(&secrets.api_key_name).ok().and_then(ApiKey::new) {
        tracing::debug!(source = "env", key_name = %secrets.api_key_name, "API key found");
        return Ok(Some(key));
    }

    let path = Path::new(&secrets.file);
    if !path.exists() {
        return Ok(None);
    }

    let table: HashMap<String, config::Value> = Config::builder()
        .add_source(File::from(path).format(FileFormat::Toml))
        .build()?
        .try_deserialize()?;

    let key = table
        .into_iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(&secrets.api_key_name))
        .map(|(_, value)| value.into_string())
        .transpose()?
        .and_then(ApiKey::new);

    if key.is_some() {
        tracing::debug!(source = %secrets.file, key_name = %secrets.api_key_name, "API key found");
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("csk-secret").unwrap();
        assert_eq!(format!("{key:?}"), "ApiKey(****)");
        assert_eq!(key.expose(), "csk-secret");
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        assert!(ApiKey::new("   ").is_none());
        assert!(ApiKey::new("").is_none());
    }

    #[test]
    fn test_resolve_model_falls_back_to_default() {
        let llm = LlmConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "a".to_string(),
            models: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(llm.resolve_model(Some("b")), "b");
        assert_eq!(llm.resolve_model(Some("zzz")), "a");
        assert_eq!(llm.resolve_model(None), "a");
    }
}
