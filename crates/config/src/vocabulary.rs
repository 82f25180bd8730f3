//! Domain vocabulary for slot extraction and topic classification
//!
//! The extractor works from curated word lists rather than a trained
//! model: a city gazetteer, an amenity vocabulary and two keyword lists
//! that separate accommodation talk from clearly unrelated chatter.
//! Defaults are compiled in; deployments can override them from a YAML
//! file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

/// Word lists the heuristic extraction rules run over
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainVocabulary {
    /// City gazetteer, matched case-insensitively inside user messages
    #[serde(default = "default_cities")]
    pub cities: Vec<String>,

    /// Amenity terms recognized in user messages
    #[serde(default = "default_amenities")]
    pub amenities: Vec<String>,

    /// Terms that mark a message as accommodation-related
    #[serde(default = "default_accommodation_terms")]
    pub accommodation_terms: Vec<String>,

    /// Terms from unrelated domains (sports, movies, politics…) that mark
    /// a message as off-topic
    #[serde(default = "default_unrelated_terms")]
    pub unrelated_terms: Vec<String>,
}

fn default_cities() -> Vec<String> {
    [
        "delhi",
        "mumbai",
        "bangalore",
        "hyderabad",
        "chennai",
        "kolkata",
        "pune",
        "ahmedabad",
        "jaipur",
        "lucknow",
        "chandigarh",
        "indore",
        "nagpur",
        "bhopal",
        "noida",
        "gurgaon",
        "ghaziabad",
        "kota",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_amenities() -> Vec<String> {
    [
        "wifi",
        "ac",
        "food",
        "laundry",
        "gym",
        "parking",
        "security",
        "power backup",
        "hot water",
        "tv",
        "washing machine",
        "cctv",
        "study area",
        "library",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_accommodation_terms() -> Vec<String> {
    [
        "hostel",
        "pg",
        "paying guest",
        "flat",
        "apartment",
        "mess",
        "room",
        "rent",
        "accommodation",
        "stay",
        "budget",
        "tiffin",
        "amenities",
        "landlord",
        "near",
        "listing",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_unrelated_terms() -> Vec<String> {
    [
        "movie",
        "film",
        "cricket",
        "football",
        "match",
        "ipl",
        "politics",
        "election",
        "minister",
        "song",
        "music",
        "weather",
        "stock",
        "bitcoin",
        "recipe",
        "joke",
        "game",
        "celebrity",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for DomainVocabulary {
    fn default() -> Self {
        Self {
            cities: default_cities(),
            amenities: default_amenities(),
            accommodation_terms: default_accommodation_terms(),
            unrelated_terms: default_unrelated_terms(),
        }
    }
}

impl DomainVocabulary {
    /// Load from a YAML file, filling missing sections with the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|_| ConfigError::FileNotFound(path.as_ref().display().to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Find the first gazetteer city mentioned in the text, if any.
    /// Matching is lowercase-contains; the gazetteer is stored lowercase.
    pub fn find_city(&self, lower_text: &str) -> Option<&str> {
        self.cities
            .iter()
            .find(|c| lower_text.contains(c.as_str()))
            .map(|c| c.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_gazetteer_size() {
        let vocab = DomainVocabulary::default();
        assert_eq!(vocab.cities.len(), 18);
        assert!(vocab.cities.iter().all(|c| c.chars().all(|ch| !ch.is_uppercase())));
    }

    #[test]
    fn test_find_city() {
        let vocab = DomainVocabulary::default();
        assert_eq!(vocab.find_city("i need a pg in bangalore"), Some("bangalore"));
        assert_eq!(vocab.find_city("somewhere in tokyo"), None);
    }

    #[test]
    fn test_yaml_override_fills_defaults() {
        let vocab: DomainVocabulary = serde_yaml::from_str("cities:\n  - mycity\n").unwrap();
        assert_eq!(vocab.cities, vec!["mycity"]);
        // Unspecified sections fall back to the compiled-in lists
        assert!(!vocab.amenities.is_empty());
        assert!(!vocab.unrelated_terms.is_empty());
    }
}
