//! Store error types

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(#[from] scylla::transport::errors::NewSessionError),

    #[error("Query error: {0}")]
    Query(#[from] scylla::transport::errors::QueryError),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid row data: {0}")]
    InvalidData(String),

    #[error("Listing not found: {0}")]
    NotFound(Uuid),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for city_living_core::Error {
    fn from(err: StoreError) -> Self {
        city_living_core::Error::Store(err.to_string())
    }
}
