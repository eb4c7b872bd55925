//! Game Forge
//!
//! A web front-end that turns a natural-language game idea into a playable,
//! self-contained HTML5 game by asking a hosted language model, then lets the
//! user iterate on that game with follow-up requests.
//!
//! # Architecture
//!
//! - **Server**: Axum-based HTTP server with a server-rendered page and a JSON API
//! - **Generator**: Template selection and the submit operation
//! - **LLM**: `OpenAI`-compatible completion client behind a trait, cached per model
//!
//! # Modules
//!
//! - [`config`]: Layered configuration and credential loading
//! - [`error`]: User-facing error kinds
//! - [`generator`]: Prompt templates and the prompt-and-turn controller
//! - [`llm`]: Completion-service boundary and drivers
//! - [`session`]: Conversation, artifact, and session storage
//! - [`ui`]: Page rendering

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod error;
pub mod generator;
pub mod llm;
pub mod server;
pub mod session;
pub mod ui;

use std::sync::Arc;

use config::AppConfig;
use error::GameError;
use generator::Generator;
use llm::{ClientCache, Provider};
use session::SessionStore;
use ui::PageRenderer;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// Session store for conversation management.
    pub sessions: SessionStore,
    /// Game generator; `None` when no API key is configured.
    pub generator: Option<Generator>,
    /// Compiled page templates.
    pub pages: Arc<PageRenderer>,
}

impl AppState {
    /// Build state; pass `None` for `clients` when the credential is missing.
    pub fn new(config: AppConfig, clients: Option<ClientCache>) -> Result<Self, minijinja::Error> {
        Ok(Self {
            config: Arc::new(config),
            sessions: SessionStore::new(),
            generator: clients.map(Generator::new),
            pages: Arc::new(PageRenderer::new()?),
        })
    }

    /// Display name of the configured provider.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        Provider::detect_from_url(&self.config.llm.base_url).display_name()
    }

    /// The error every interaction reports while no credential is configured.
    #[must_use]
    pub fn config_missing(&self) -> GameError {
        GameError::ConfigMissing {
            key_name: self.config.secrets.api_key_name.clone(),
            secrets_file: self.config.secrets.file.clone(),
        }
    }
}
