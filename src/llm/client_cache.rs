//! Cached client factory.
//!
//! Clients are built lazily, once per (credential, model) pair, and shared
//! for the rest of the process.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::ApiKey;

use super::{ChatCompletionsDriver, CompletionService, LlmSettings};

/// Builds a client from settings. Swapped out in tests for a mock service.
pub type ClientFactory = Arc<dyn Fn(&LlmSettings) -> Arc<dyn CompletionService> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    api_key: ApiKey,
    model: String,
}

/// Thread-safe cache of completion clients.
#[derive(Clone)]
pub struct ClientCache {
    inner: Arc<ClientCacheInner>,
}

struct ClientCacheInner {
    base_url: String,
    api_key: ApiKey,
    factory: ClientFactory,
    clients: RwLock<HashMap<ClientKey, Arc<dyn CompletionService>>>,
}

impl std::fmt::Debug for ClientCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCache")
            .field("base_url", &self.inner.base_url)
            .field("cached", &self.len())
            .finish_non_exhaustive()
    }
}

impl ClientCache {
    /// Cache producing [`ChatCompletionsDriver`]s that share one HTTP pool.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: ApiKey) -> Self {
        let http = reqwest::Client::new();
        let factory: ClientFactory = Arc::new(move |settings: &LlmSettings| {
            Arc::new(ChatCompletionsDriver::with_client(
                http.clone(),
                settings.clone(),
            )) as Arc<dyn CompletionService>
        });
        Self::with_factory(base_url, api_key, factory)
    }

    /// Cache using a custom client factory.
    #[must_use]
    pub fn with_factory(
        base_url: impl Into<String>,
        api_key: ApiKey,
        factory: ClientFactory,
    ) -> Self {
        Self {
            inner: Arc::new(ClientCacheInner {
                base_url: base_url.into(),
                api_key,
                factory,
                clients: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Get the client for `model`, constructing it on first use.
    #[must_use]
    pub fn client_for(&self, model: &str) -> Arc<dyn CompletionService> {
        let key = ClientKey {
            api_key: self.inner.api_key.clone(),
            model: model.to_string(),
        };

        // Try read-only first
        {
            let guard = self
                .inner
                .clients
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(client) = guard.get(&key) {
                return Arc::clone(client);
            }
        }

        let mut guard = self
            .inner
            .clients
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let client = guard.entry(key).or_insert_with(|| {
            let settings =
                LlmSettings::new(self.inner.base_url.clone(), self.inner.api_key.clone(), model);
            tracing::info!(
                name: "llm.client.created",
                provider = settings.provider.display_name(),
                model = %model,
                "Completion client created"
            );
            (self.inner.factory)(&settings)
        });
        Arc::clone(client)
    }

    /// Number of clients built so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
