//! Listing store trait, filter predicates and the ScyllaDB gateway
//!
//! The directory dataset is small, so the gateway loads rows and applies
//! `ListingFilter` in process. That keeps the relaxation-cascade
//! predicates pure functions shared verbatim with the mock provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use city_living_core::{Listing, ListingDraft};

use crate::client::ScyllaClient;
use crate::error::StoreError;

/// Filter predicates over the listing collection
///
/// All needles are expected lowercase; matching lowercases the listing
/// side. Empty/absent fields are unconstrained.
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    /// Accommodation kind terms; a listing passes when any term is a
    /// substring of its stored kind
    pub kind_terms: Vec<String>,
    /// Case-insensitive equality on city
    pub city_equals: Option<String>,
    /// Substring containment on city (partial-match cascade stage)
    pub city_contains: Option<String>,
    /// Price floor (HTTP listing filters)
    pub min_price: Option<f64>,
    /// Price ceiling (budget slot)
    pub max_price: Option<f64>,
    /// A listing passes when any requested amenity appears in its set
    pub amenities_any: Vec<String>,
    /// Landmark: listed in nearbyLocations, or a substring of
    /// address/location/description
    pub landmark: Option<String>,
}

impl ListingFilter {
    /// Does a single listing satisfy every predicate?
    pub fn matches(&self, listing: &Listing) -> bool {
        if !self.kind_terms.is_empty() {
            let kind = listing.kind.to_lowercase();
            if !self.kind_terms.iter().any(|t| kind.contains(t.as_str())) {
                return false;
            }
        }

        if let Some(ref city) = self.city_equals {
            if !listing.city.trim().eq_ignore_ascii_case(city) {
                return false;
            }
        }

        if let Some(ref needle) = self.city_contains {
            if !listing.city.to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }

        if let Some(min) = self.min_price {
            if listing.price < min {
                return false;
            }
        }

        if let Some(max) = self.max_price {
            if listing.price > max {
                return false;
            }
        }

        if !self.amenities_any.is_empty() {
            let has_overlap = listing.amenities.iter().any(|a| {
                let a = a.to_lowercase();
                self.amenities_any.iter().any(|want| a.contains(want.as_str()))
            });
            if !has_overlap {
                return false;
            }
        }

        if let Some(ref landmark) = self.landmark {
            let in_nearby = listing
                .nearby_locations
                .iter()
                .any(|n| n.to_lowercase().contains(landmark.as_str()));
            let in_text = listing.address.to_lowercase().contains(landmark.as_str())
                || listing.location.to_lowercase().contains(landmark.as_str())
                || listing.description.to_lowercase().contains(landmark.as_str());
            if !in_nearby && !in_text {
                return false;
            }
        }

        true
    }

    /// Apply the filter: keep matches, order by recency, cap at `limit`.
    pub fn apply(&self, listings: Vec<Listing>, limit: usize) -> Vec<Listing> {
        let mut hits: Vec<Listing> = listings.into_iter().filter(|l| self.matches(l)).collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        hits.truncate(limit);
        hits
    }
}

/// Listing store trait
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Find listings matching the filter, recency ordered, capped
    async fn find(&self, filter: &ListingFilter, limit: usize)
        -> Result<Vec<Listing>, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Listing>, StoreError>;

    async fn create(&self, draft: ListingDraft) -> Result<Listing, StoreError>;

    /// Replace the stored fields of an existing listing, preserving its
    /// id and creation timestamp
    async fn update(&self, id: Uuid, draft: ListingDraft) -> Result<Listing, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;
}

/// ScyllaDB implementation of the listing store
#[derive(Clone)]
pub struct ScyllaListingStore {
    client: ScyllaClient,
}

const LISTING_COLUMNS: &str = "id, title, description, price, location, address, city, kind, \
     amenities, images, contact_name, contact_phone, nearby_locations, metadata_json, created_at";

impl ScyllaListingStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    async fn load_all(&self) -> Result<Vec<Listing>, StoreError> {
        let query = format!(
            "SELECT {} FROM {}.listings",
            LISTING_COLUMNS,
            self.client.keyspace()
        );

        let result = self.client.session().query_unpaged(query, &[]).await?;

        let mut listings = Vec::new();
        if let Some(rows) = result.rows {
            for row in rows {
                listings.push(row_to_listing(row)?);
            }
        }

        Ok(listings)
    }

    async fn insert(&self, listing: &Listing) -> Result<(), StoreError> {
        let query = format!(
            "INSERT INTO {}.listings ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace(),
            LISTING_COLUMNS
        );

        let metadata_json = listing.metadata.to_string();

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    listing.id,
                    &listing.title,
                    &listing.description,
                    listing.price,
                    &listing.location,
                    &listing.address,
                    &listing.city,
                    &listing.kind,
                    &listing.amenities,
                    &listing.images,
                    &listing.contact_name,
                    &listing.contact_phone,
                    &listing.nearby_locations,
                    metadata_json,
                    listing.created_at.timestamp_millis(),
                ),
            )
            .await?;

        Ok(())
    }
}

#[async_trait]
impl ListingStore for ScyllaListingStore {
    async fn find(
        &self,
        filter: &ListingFilter,
        limit: usize,
    ) -> Result<Vec<Listing>, StoreError> {
        let all = self.load_all().await?;
        let hits = filter.apply(all, limit);
        tracing::debug!(hits = hits.len(), "Listing query completed");
        Ok(hits)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Listing>, StoreError> {
        let query = format!(
            "SELECT {} FROM {}.listings WHERE id = ?",
            LISTING_COLUMNS,
            self.client.keyspace()
        );

        let result = self.client.session().query_unpaged(query, (id,)).await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                return Ok(Some(row_to_listing(row)?));
            }
        }

        Ok(None)
    }

    async fn create(&self, draft: ListingDraft) -> Result<Listing, StoreError> {
        let listing = draft.into_listing(Uuid::new_v4(), Utc::now());
        self.insert(&listing).await?;

        tracing::info!(
            id = %listing.id,
            kind = %listing.kind,
            city = %listing.city,
            "Listing created"
        );

        Ok(listing)
    }

    async fn update(&self, id: Uuid, draft: ListingDraft) -> Result<Listing, StoreError> {
        let existing = self.get(id).await?.ok_or(StoreError::NotFound(id))?;
        let listing = draft.into_listing(existing.id, existing.created_at);
        self.insert(&listing).await?;

        tracing::info!(id = %id, "Listing updated");

        Ok(listing)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.get(id).await?.ok_or(StoreError::NotFound(id))?;

        let query = format!("DELETE FROM {}.listings WHERE id = ?", self.client.keyspace());
        self.client.session().query_unpaged(query, (id,)).await?;

        tracing::info!(id = %id, "Listing deleted");

        Ok(())
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let query = format!("SELECT COUNT(*) FROM {}.listings", self.client.keyspace());
        let result = self.client.session().query_unpaged(query, &[]).await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                let (count,): (i64,) = row
                    .into_typed()
                    .map_err(|e| StoreError::InvalidData(e.to_string()))?;
                return Ok(count);
            }
        }

        Ok(0)
    }
}

fn row_to_listing(row: scylla::frame::response::result::Row) -> Result<Listing, StoreError> {
    let (
        id,
        title,
        description,
        price,
        location,
        address,
        city,
        kind,
        amenities,
        images,
        contact_name,
        contact_phone,
        nearby_locations,
        metadata_json,
        created_at,
    ): (
        Uuid,
        String,
        String,
        f64,
        String,
        String,
        String,
        String,
        Option<Vec<String>>,
        Option<Vec<String>>,
        String,
        String,
        Option<Vec<String>>,
        Option<String>,
        i64,
    ) = row
        .into_typed()
        .map_err(|e| StoreError::InvalidData(e.to_string()))?;

    // Cassandra stores empty collections as null; surface them as empty
    let metadata = metadata_json
        .as_deref()
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

    Ok(Listing {
        id,
        title,
        description,
        price,
        location,
        address,
        city,
        kind,
        amenities: amenities.unwrap_or_default(),
        images: images.unwrap_or_default(),
        contact_name,
        contact_phone,
        nearby_locations: nearby_locations.unwrap_or_default(),
        metadata,
        created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_else(Utc::now),
    })
}
