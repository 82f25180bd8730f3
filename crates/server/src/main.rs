//! CityLiving server entry point
//!
//! Dependencies are constructed once here and injected into the router:
//! the listing store (falling back to the canned dataset when the
//! cluster is unreachable) and the generative backend (absent when no
//! API key is configured, which makes the chat endpoint reject
//! requests while CRUD keeps working).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use city_living_config::{load_settings, DomainVocabulary, Settings};
use city_living_llm::{GeminiBackend, GeminiConfig, LlmBackend};
use city_living_server::{create_router, AppState};
use city_living_store::{ListingStore, MockListingProvider, ScyllaConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("CITY_LIVING_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => {
            // Tracing not yet initialized, use eprintln for early logging
            eprintln!(
                "Loaded configuration from files (env: {})",
                env.as_deref().unwrap_or("default")
            );
            settings
        }
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing(&config);

    tracing::info!("Starting CityLiving server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(environment = ?config.environment, "Configuration loaded");

    // Generative backend: optional. Without it the chat endpoint answers
    // with a configuration error, everything else keeps working.
    let llm: Option<Arc<dyn LlmBackend>> = match config.llm.api_key.clone() {
        Some(api_key) => {
            let gemini_config = GeminiConfig {
                endpoint: config.llm.endpoint.clone(),
                api_key,
                model: config.llm.model.clone(),
                max_output_tokens: config.llm.max_output_tokens,
                temperature: config.llm.temperature,
                timeout: Duration::from_secs(config.llm.timeout_seconds),
            };
            match GeminiBackend::new(gemini_config) {
                Ok(backend) => {
                    tracing::info!(model = %config.llm.model, "Generative backend initialized");
                    Some(Arc::new(backend))
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to initialize generative backend");
                    None
                }
            }
        }
        None => {
            tracing::warn!(
                "GEMINI_API_KEY is not set; the chat endpoint will return a \
                 configuration error"
            );
            None
        }
    };

    // Listing store: degrade to the canned dataset rather than failing
    let scylla_config = ScyllaConfig {
        hosts: config.store.hosts.clone(),
        keyspace: config.store.keyspace.clone(),
        replication_factor: config.store.replication_factor,
    };
    let (store, store_degraded): (Arc<dyn ListingStore>, bool) =
        match city_living_store::init(scylla_config).await {
            Ok(store) => {
                tracing::info!(
                    hosts = ?config.store.hosts,
                    keyspace = %config.store.keyspace,
                    "Listing store initialized"
                );
                (Arc::new(store), false)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Listing store unreachable; serving canned sample data"
                );
                (Arc::new(MockListingProvider::new()), true)
            }
        };

    // Domain vocabulary: compiled-in defaults, overridable from YAML
    let vocab = match DomainVocabulary::load("config/vocabulary.yaml") {
        Ok(vocab) => {
            tracing::info!(cities = vocab.cities.len(), "Loaded domain vocabulary override");
            vocab
        }
        Err(_) => DomainVocabulary::default(),
    };

    let port = config.server.port;
    let state = AppState::new(config, store, llm, vocab, store_degraded);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

/// Initialize tracing from the observability settings
fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("city_living={},tower_http=debug", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
