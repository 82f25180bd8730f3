//! Dialogue slot-set
//!
//! The slot-set has no storage of its own: it is rebuilt from the
//! immutable transcript on every turn, which makes extraction idempotent
//! and replayable at the cost of O(transcript) work per request.

use city_living_core::ListingKind;
use serde::{Deserialize, Serialize};

/// Everything the dialogue knows about the user's request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotSet {
    /// User's name, when they volunteered it after being asked
    pub name: Option<String>,
    /// Requested accommodation kind
    pub looking_for: Option<ListingKind>,
    /// City, lowercase
    pub city: Option<String>,
    /// Free-text landmark the user wants proximity to
    pub nearby_location: Option<String>,
    /// Monthly budget ceiling in rupees
    pub budget: Option<u32>,
    /// Recognized amenity terms, lowercase
    pub amenities: Vec<String>,
    /// A result list has already been presented this conversation
    pub has_shown_results: bool,
    /// A landmark-filtered query has already been run
    pub has_queried_with_nearby: bool,
}

impl SlotSet {
    /// Both mandatory search slots are present
    pub fn is_ready_for_search(&self) -> bool {
        self.looking_for.is_some() && self.city.is_some()
    }

    /// City with the first letter upper-cased, for reply text
    pub fn city_display(&self) -> Option<String> {
        self.city.as_ref().map(|c| {
            let mut chars = c.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
    }

    /// Compact single-line form for tracing
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(ref name) = self.name {
            parts.push(format!("name={}", name));
        }
        if let Some(kind) = self.looking_for {
            parts.push(format!("kind={}", kind.as_str()));
        }
        if let Some(ref city) = self.city {
            parts.push(format!("city={}", city));
        }
        if let Some(ref landmark) = self.nearby_location {
            parts.push(format!("near={}", landmark));
        }
        if let Some(budget) = self.budget {
            parts.push(format!("budget={}", budget));
        }
        if !self.amenities.is_empty() {
            parts.push(format!("amenities={}", self.amenities.join("+")));
        }
        if self.has_shown_results {
            parts.push("shown".to_string());
        }
        if self.has_queried_with_nearby {
            parts.push("nearby-queried".to_string());
        }

        if parts.is_empty() {
            "empty".to_string()
        } else {
            parts.join(" ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_for_search() {
        let mut slots = SlotSet::default();
        assert!(!slots.is_ready_for_search());

        slots.looking_for = Some(ListingKind::Pg);
        assert!(!slots.is_ready_for_search());

        slots.city = Some("bangalore".to_string());
        assert!(slots.is_ready_for_search());
    }

    #[test]
    fn test_city_display() {
        let slots = SlotSet {
            city: Some("bangalore".to_string()),
            ..Default::default()
        };
        assert_eq!(slots.city_display().as_deref(), Some("Bangalore"));
    }

    #[test]
    fn test_summary() {
        let slots = SlotSet {
            looking_for: Some(ListingKind::Hostel),
            city: Some("delhi".to_string()),
            budget: Some(8000),
            ..Default::default()
        };
        let summary = slots.summary();
        assert!(summary.contains("kind=hostel"));
        assert!(summary.contains("city=delhi"));
        assert!(summary.contains("budget=8000"));
        assert_eq!(SlotSet::default().summary(), "empty");
    }
}
