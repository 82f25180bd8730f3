//! HTTP endpoints
//!
//! JSON API for the accommodation directory: the chat endpoint, listing
//! CRUD, the type-scoped collection views the web client renders, and
//! health/readiness probes.

use axum::{
    extract::{rejection::JsonRejection, Json, Path, Query, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use city_living_config::constants::READINESS_PROBE_TIMEOUT;
use city_living_core::{Listing, ListingDraft, ListingKind, Turn, TurnRole};
use city_living_store::{sample_listings, ListingFilter};

use crate::error::ApiError;
use crate::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.read();
    let cors_layer = build_cors_layer(&config.server.cors_origins, config.server.cors_enabled);
    drop(config);

    Router::new()
        // Conversational search
        .route("/api/chat", post(chat))
        // Listing CRUD
        .route("/api/listings", get(list_listings).post(create_listing))
        .route(
            "/api/listings/:id",
            get(get_listing).put(update_listing).delete(delete_listing),
        )
        // Type-scoped collection views
        .route("/api/hostels", get(list_hostels))
        .route("/api/pgs", get(list_pgs))
        .route("/api/mess", get(list_mess))
        // Misc collection endpoints
        .route("/api/listings/nearby", get(nearby_listings))
        .route("/api/services", get(list_services))
        .route("/api/seed", get(seed_listings))
        // Probes
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build the CORS layer from configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    messages: Vec<WireMessage>,
}

#[derive(Debug, Serialize)]
struct ChatChoice {
    message: WireMessage,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
}

/// One conversational turn. The transcript arrives in full on every
/// request; dialogue state is re-derived from it server-side.
async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    // Configuration is checked before any processing
    let agent = state.agent.clone().ok_or_else(ApiError::missing_api_key)?;

    let Json(request) = body.map_err(|e| {
        ApiError::bad_request(
            "Invalid request format. Please check your request body.",
            e.to_string(),
        )
    })?;

    if request.messages.is_empty() {
        return Err(ApiError::bad_request(
            "Invalid request body. Must include a messages array.",
            "messages array missing or empty",
        ));
    }

    let turns: Vec<Turn> = request
        .messages
        .iter()
        .map(|m| Turn::new(TurnRole::parse(&m.role), m.content.clone()))
        .collect();

    let reply = agent.process(&turns).await?;

    tracing::info!(
        stage = reply.stage.display_name(),
        turns = turns.len(),
        "Chat turn handled"
    );

    let model = state
        .llm
        .as_ref()
        .map(|l| l.model_name().to_string())
        .unwrap_or_default();

    Ok(Json(ChatResponse {
        model,
        choices: vec![ChatChoice {
            message: WireMessage {
                role: "assistant".to_string(),
                content: reply.content,
            },
        }],
    }))
}

// ---------------------------------------------------------------------------
// Listing CRUD
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ListingQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
    city: Option<String>,
    #[serde(rename = "minPrice")]
    min_price: Option<f64>,
    #[serde(rename = "maxPrice")]
    max_price: Option<f64>,
}

async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    let filter = ListingFilter {
        kind_terms: query.kind.map(|k| vec![k.to_lowercase()]).unwrap_or_default(),
        city_equals: query.city.map(|c| c.to_lowercase()),
        min_price: query.min_price,
        max_price: query.max_price,
        ..Default::default()
    };

    let listings = state.store.find(&filter, usize::MAX).await?;
    Ok(Json(listings))
}

async fn create_listing(
    State(state): State<AppState>,
    Json(draft): Json<ListingDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let listing = state.store.create(draft).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Listing>, ApiError> {
    let listing = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;
    Ok(Json(listing))
}

async fn update_listing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<ListingDraft>,
) -> Result<Json<Listing>, ApiError> {
    let listing = state.store.update(id, draft).await?;
    Ok(Json(listing))
}

async fn delete_listing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.delete(id).await?;
    Ok(Json(json!({ "message": "Listing deleted successfully" })))
}

// ---------------------------------------------------------------------------
// Type-scoped collection views
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ScopedQuery {
    id: Option<Uuid>,
    city: Option<String>,
}

async fn list_hostels(
    state: State<AppState>,
    query: Query<ScopedQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    scoped_collection(state, query, ListingKind::Hostel).await
}

async fn list_pgs(
    state: State<AppState>,
    query: Query<ScopedQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    scoped_collection(state, query, ListingKind::Pg).await
}

async fn list_mess(
    state: State<AppState>,
    query: Query<ScopedQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    scoped_collection(state, query, ListingKind::Mess).await
}

async fn scoped_collection(
    State(state): State<AppState>,
    Query(query): Query<ScopedQuery>,
    kind: ListingKind,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(id) = query.id {
        let listing = state
            .store
            .get(id)
            .await?
            .filter(|l| l.kind_parsed() == kind)
            .ok_or_else(|| ApiError::not_found(format!("{} not found", kind)))?;
        return Ok(Json(listing_to_card(&listing)));
    }

    let filter = ListingFilter {
        kind_terms: vec![kind.as_str().to_string()],
        city_equals: query.city.map(|c| c.to_lowercase()),
        ..Default::default()
    };

    let listings = state.store.find(&filter, usize::MAX).await?;
    let cards: Vec<serde_json::Value> = listings.iter().map(listing_to_card).collect();
    Ok(Json(serde_json::Value::Array(cards)))
}

/// Flatten a listing into the card shape the web client renders,
/// defaulting the metadata-derived fields
fn listing_to_card(listing: &Listing) -> serde_json::Value {
    let meta = &listing.metadata;

    json!({
        "id": listing.id,
        "name": listing.title,
        "type": listing.kind,
        "location": listing.location,
        "city": listing.city,
        "rating": meta.get("rating").cloned().unwrap_or(json!(0)),
        "price": listing.price,
        "priceUnit": meta.get("priceUnit").cloned().unwrap_or(json!("month")),
        "capacity": meta.get("capacity").cloned().unwrap_or(json!("")),
        "gender": meta.get("gender").cloned().unwrap_or(json!("mixed")),
        "amenities": listing.amenities,
        "images": listing.images,
        "description": listing.description,
        "contact": listing.contact_phone,
        "reviews": meta.get("reviews").cloned().unwrap_or(json!([])),
    })
}

// ---------------------------------------------------------------------------
// Misc collection endpoints
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct NearbyQuery {
    lat: Option<f64>,
    lng: Option<f64>,
}

/// Nearby listings by coordinates. No real geospatial search exists;
/// this serves canned entries with fixed distances, as the original
/// MVP endpoint did.
async fn nearby_listings(
    Query(query): Query<NearbyQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (Some(_lat), Some(_lng)) = (query.lat, query.lng) else {
        return Err(ApiError::bad_request(
            "Latitude and longitude are required",
            "lat and lng query parameters must both be present",
        ));
    };

    let distances = [0.5, 1.2, 0.8];
    let entries: Vec<serde_json::Value> = sample_listings()
        .iter()
        .take(distances.len())
        .zip(distances)
        .map(|(listing, distance)| {
            json!({
                "id": listing.id,
                "title": listing.title,
                "location": listing.location,
                "price": listing.price,
                "distance": distance,
                "image": listing.images.first().cloned().unwrap_or_default(),
                "type": listing.kind.to_lowercase(),
            })
        })
        .collect();

    Ok(Json(serde_json::Value::Array(entries)))
}

async fn list_services(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut services = Vec::new();
    for (id, name, kind) in [
        ("hostels", "Hostels", ListingKind::Hostel),
        ("pgs", "PGs", ListingKind::Pg),
        ("mess", "Mess", ListingKind::Mess),
        ("flats", "Flats", ListingKind::Flat),
    ] {
        let filter = ListingFilter {
            kind_terms: vec![kind.as_str().to_string()],
            ..Default::default()
        };
        let count = state.store.find(&filter, usize::MAX).await?.len();
        services.push(json!({ "id": id, "name": name, "count": count }));
    }

    Ok(Json(serde_json::Value::Array(services)))
}

/// Seed the store with the canned dataset unless it already has rows
async fn seed_listings(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let existing = state.store.count().await?;
    if existing > 0 {
        return Ok(Json(json!({
            "message": format!(
                "Database already contains {} listings. To reseed, delete existing data first.",
                existing
            )
        })));
    }

    let mut created = 0;
    for listing in sample_listings() {
        let draft = ListingDraft {
            title: listing.title,
            description: listing.description,
            price: listing.price,
            location: listing.location,
            address: listing.address,
            city: listing.city,
            kind: listing.kind,
            amenities: listing.amenities,
            images: listing.images,
            contact_name: listing.contact_name,
            contact_phone: listing.contact_phone,
            nearby_locations: listing.nearby_locations,
            metadata: listing.metadata,
        };
        state.store.create(draft).await?;
        created += 1;
    }

    tracing::info!(count = created, "Seeded listing store");

    Ok(Json(json!({
        "message": format!("Successfully seeded database with {} listings", created),
        "count": created,
    })))
}

// ---------------------------------------------------------------------------
// Probes
// ---------------------------------------------------------------------------

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let status = if state.store_degraded { "degraded" } else { "ok" };

    Json(json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "store": {
                "status": if state.store_degraded { "degraded" } else { "ok" },
                "mode": if state.store_degraded { "sample-data" } else { "scylla" },
            },
            "llm": {
                "status": if state.llm.is_some() { "configured" } else { "missing-api-key" },
            },
        },
    }))
}

async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let mut ready = true;

    let llm_status = match state.llm {
        Some(ref llm) => {
            match tokio::time::timeout(READINESS_PROBE_TIMEOUT, llm.is_available()).await {
                Ok(true) => "ok",
                Ok(false) => {
                    ready = false;
                    "unreachable"
                }
                Err(_) => {
                    ready = false;
                    "timeout"
                }
            }
        }
        None => {
            ready = false;
            "missing-api-key"
        }
    };

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(json!({
            "status": if ready { "ready" } else { "not_ready" },
            "checks": {
                "llm": { "status": llm_status },
                "store": { "degraded": state.store_degraded },
            },
        })),
    )
}
