//! Application state
//!
//! Dependencies are constructed once at startup and injected here: the
//! listing store (real or mock), the optional generative backend, and
//! the agent built from both. No process-wide globals anywhere.

use std::sync::Arc;

use parking_lot::RwLock;

use city_living_agent::ChatAgent;
use city_living_config::{DomainVocabulary, Settings};
use city_living_llm::LlmBackend;
use city_living_store::ListingStore;

/// Shared state across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<Settings>>,
    /// Listing store; when the real store was unreachable at startup
    /// this is the mock provider and `store_degraded` is set
    pub store: Arc<dyn ListingStore>,
    /// Generative backend; absent when no API key is configured
    pub llm: Option<Arc<dyn LlmBackend>>,
    /// Chat agent; absent exactly when `llm` is absent
    pub agent: Option<Arc<ChatAgent>>,
    /// True when listing queries are served from the canned dataset
    pub store_degraded: bool,
}

impl AppState {
    pub fn new(
        config: Settings,
        store: Arc<dyn ListingStore>,
        llm: Option<Arc<dyn LlmBackend>>,
        vocab: DomainVocabulary,
        store_degraded: bool,
    ) -> Self {
        let agent = llm.as_ref().map(|llm| {
            Arc::new(ChatAgent::new(
                Arc::clone(&store),
                Arc::clone(llm),
                vocab.clone(),
            ))
        });

        Self {
            config: Arc::new(RwLock::new(config)),
            store,
            llm,
            agent,
            store_degraded,
        }
    }

    pub fn get_config(&self) -> Settings {
        self.config.read().clone()
    }
}
