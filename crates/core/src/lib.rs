//! Core types for the CityLiving backend
//!
//! This crate provides foundational types used across all other crates:
//! - Listing records and accommodation kinds
//! - Conversation turn types
//! - Error types

pub mod conversation;
pub mod listing;

pub use conversation::{Turn, TurnRole};
pub use listing::{Listing, ListingDraft, ListingKind};

use thiserror::Error;

/// Workspace-wide error type for crate seams
#[derive(Error, Debug)]
pub enum Error {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Generative service error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
