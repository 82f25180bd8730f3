//! Listing store gateway for the CityLiving backend
//!
//! Provides:
//! - `ListingStore` trait over the listing collection
//! - ScyllaDB implementation with schema bootstrap
//! - `ListingFilter` predicates shared by every backend
//! - Canned sample data and the mock provider used when the store is
//!   unreachable

pub mod client;
pub mod error;
pub mod listings;
pub mod mock;
pub mod schema;

pub use client::{ScyllaClient, ScyllaConfig};
pub use error::StoreError;
pub use listings::{ListingFilter, ListingStore, ScyllaListingStore};
pub use mock::{sample_listings, MockListingProvider};

/// Connect to ScyllaDB and ensure the schema exists
pub async fn init(config: ScyllaConfig) -> Result<ScyllaListingStore, StoreError> {
    let client = ScyllaClient::connect(config).await?;
    client.ensure_schema().await?;
    Ok(ScyllaListingStore::new(client))
}
