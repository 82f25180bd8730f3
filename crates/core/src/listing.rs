//! Listing records and accommodation kinds

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Accommodation categories known to the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Hostel,
    Pg,
    Flat,
    Mess,
    /// Anything the parser does not recognize
    #[default]
    Unknown,
}

impl ListingKind {
    /// Parse from free text, case-insensitively.
    ///
    /// Accepts the common aliases users type ("paying guest", "apartment")
    /// in addition to the canonical kind names.
    pub fn parse(s: &str) -> Self {
        let lower = s.to_lowercase();
        if lower.contains("hostel") {
            ListingKind::Hostel
        } else if lower.contains("paying guest") || lower.contains("pg") {
            ListingKind::Pg
        } else if lower.contains("flat") || lower.contains("apartment") {
            ListingKind::Flat
        } else if lower.contains("mess") {
            ListingKind::Mess
        } else {
            ListingKind::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Hostel => "hostel",
            ListingKind::Pg => "pg",
            ListingKind::Flat => "flat",
            ListingKind::Mess => "mess",
            ListingKind::Unknown => "unknown",
        }
    }

    /// Hand-authored similar-type terms used by the query-relaxation
    /// cascade. Matched by substring against the stored `kind` string, so
    /// the terms need not be canonical kinds themselves.
    pub fn similar_terms(&self) -> &'static [&'static str] {
        match self {
            ListingKind::Hostel => &["pg", "dormitory"],
            ListingKind::Pg => &["hostel", "flat"],
            ListingKind::Flat => &["apartment", "pg"],
            ListingKind::Mess => &["canteen", "tiffin"],
            ListingKind::Unknown => &[],
        }
    }
}

impl std::fmt::Display for ListingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingKind::Hostel => write!(f, "hostel"),
            ListingKind::Pg => write!(f, "PG"),
            ListingKind::Flat => write!(f, "flat"),
            ListingKind::Mess => write!(f, "mess"),
            ListingKind::Unknown => write!(f, "accommodation"),
        }
    }
}

fn default_metadata() -> Value {
    Value::Object(serde_json::Map::new())
}

/// A single accommodation listing
///
/// `kind` is kept as the raw stored string rather than a `ListingKind`:
/// the similar-type cascade matches terms like "dormitory" or "tiffin"
/// by substring against it, which a closed enum would erase. Use
/// [`Listing::kind_parsed`] where the canonical category is needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Monthly amount in rupees
    pub price: f64,
    pub location: String,
    pub address: String,
    pub city: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub contact_name: String,
    pub contact_phone: String,
    #[serde(default)]
    pub nearby_locations: Vec<String>,
    /// Open attribute bag: rating, capacity, gender, mealType, reviews…
    #[serde(default = "default_metadata")]
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    pub fn kind_parsed(&self) -> ListingKind {
        ListingKind::parse(&self.kind)
    }
}

/// Fields a caller supplies when creating or replacing a listing.
/// The store assigns `id` and `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub address: String,
    pub city: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub nearby_locations: Vec<String>,
    #[serde(default = "default_metadata")]
    pub metadata: Value,
}

impl ListingDraft {
    /// Materialize into a full listing with a fresh id and timestamp.
    pub fn into_listing(self, id: Uuid, created_at: DateTime<Utc>) -> Listing {
        Listing {
            id,
            title: self.title,
            description: self.description,
            price: self.price,
            location: self.location,
            address: self.address,
            city: self.city,
            kind: self.kind,
            amenities: self.amenities,
            images: self.images,
            contact_name: self.contact_name,
            contact_phone: self.contact_phone,
            nearby_locations: self.nearby_locations,
            metadata: self.metadata,
            created_at,
        }
    }
}
