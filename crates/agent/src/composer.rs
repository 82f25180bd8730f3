//! Reply composition
//!
//! Builds the deterministic structured listing block first, then
//! optionally asks the generative service to polish it. The polished
//! text is only accepted when it still carries the structured facts;
//! any failure falls back to the raw block, so the user always gets the
//! listing data.

use std::sync::Arc;

use city_living_core::Listing;
use city_living_llm::{LlmBackend, Message};
use city_living_nlu::SlotSet;

/// Shared system instruction for every generative call
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant for a student accommodation \
    website. You help users find hostels, PGs, flats and mess services, answer questions \
    about listings, and provide information about different areas.";

/// Turns result sets (or their absence) into reply text
pub struct ResponseComposer {
    llm: Arc<dyn LlmBackend>,
}

impl ResponseComposer {
    pub fn new(llm: Arc<dyn LlmBackend>) -> Self {
        Self { llm }
    }

    /// Apologetic reply naming what was searched for
    pub fn compose_empty(&self, slots: &SlotSet) -> String {
        let kind = slots
            .looking_for
            .map(|k| k.to_string())
            .unwrap_or_else(|| "accommodation".to_string());
        let city = slots
            .city_display()
            .unwrap_or_else(|| "your city".to_string());

        let scope = match slots.nearby_location {
            Some(ref landmark) => format!("{} listings in {} near {}", kind, city, landmark),
            None => format!("{} listings in {}", kind, city),
        };

        format!(
            "Sorry, I couldn't find any {} right now. \
             Try broadening the search - another area, a higher budget, \
             or a different type of accommodation.",
            scope
        )
    }

    /// Deterministic structured block: header, numbered listings, and a
    /// follow-up prompt that varies with what has already been offered.
    pub fn compose_results(
        &self,
        slots: &SlotSet,
        listings: &[Listing],
        used_landmark: bool,
    ) -> String {
        let mut out = match (used_landmark, slots.nearby_location.as_deref()) {
            (true, Some(landmark)) => {
                format!("I found {} listings near {}:\n\n", listings.len(), landmark)
            }
            _ => format!("I found {} listings for you:\n\n", listings.len()),
        };

        for (i, listing) in listings.iter().enumerate() {
            out.push_str(&format!("{}. **{}**\n", i + 1, listing.title));
            out.push_str(&format!("📍 {}\n", listing.address));
            out.push_str(&format!("💰 ₹{:.0} per month\n", listing.price));
            if !listing.nearby_locations.is_empty() {
                out.push_str(&format!("🏙️ Nearby: {}\n", listing.nearby_locations.join(", ")));
            }
            if !listing.amenities.is_empty() {
                out.push_str(&format!("✨ Amenities: {}\n", listing.amenities.join(", ")));
            }
            out.push_str(&format!(
                "📞 Contact: {}, {}\n\n",
                listing.contact_name, listing.contact_phone
            ));
        }

        out.push_str(follow_up_prompt(slots, used_landmark));
        out
    }

    /// Send the structured block for a generative polish. Accepted only
    /// when the reply still carries the structured facts; everything
    /// else (including service failure) returns the block verbatim.
    pub async fn polish(&self, structured: &str, last_user: &str, slots: &SlotSet) -> String {
        let messages = vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(format!(
                "Here are search results for the user:\n\n{}\n\nThe user's last message \
                 was: \"{}\". Present these results in a friendly way, keeping every \
                 listing's numbering, title, price and contact details intact.",
                structured, last_user
            )),
        ];

        match self.llm.generate(&messages).await {
            Ok(result) if retains_facts(&result.text, slots) => result.text,
            Ok(_) => {
                tracing::debug!("Polished reply dropped listing facts; using structured block");
                structured.to_string()
            }
            Err(e) => {
                tracing::debug!(error = %e, "Polish call failed; using structured block");
                structured.to_string()
            }
        }
    }
}

/// The polish kept the facts when the first listing's numbering marker
/// survives, or both the requested kind and city still appear.
fn retains_facts(polished: &str, slots: &SlotSet) -> bool {
    if polished.contains("1.") {
        return true;
    }

    let lower = polished.to_lowercase();
    match (slots.looking_for, slots.city.as_deref()) {
        (Some(kind), Some(city)) => lower.contains(kind.as_str()) && lower.contains(city),
        _ => false,
    }
}

fn follow_up_prompt(slots: &SlotSet, used_landmark: bool) -> &'static str {
    if !slots.has_shown_results {
        "Would you like to look near a specific landmark or area? \
         Just tell me a place, like \"near Delhi University\"."
    } else if used_landmark {
        "Want me to adjust the budget or try another area?"
    } else {
        "Ask about any listing, or narrow the search with a budget or amenity."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use city_living_core::ListingKind;
    use city_living_llm::{GenerationResult, LlmError};
    use uuid::Uuid;

    struct ScriptedLlm {
        reply: &'static str,
    }

    #[async_trait]
    impl LlmBackend for ScriptedLlm {
        async fn generate(&self, _messages: &[Message]) -> Result<GenerationResult, LlmError> {
            Ok(GenerationResult {
                text: self.reply.to_string(),
                total_time_ms: 1,
            })
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmBackend for FailingLlm {
        async fn generate(&self, _messages: &[Message]) -> Result<GenerationResult, LlmError> {
            Err(LlmError::Api("boom".to_string()))
        }

        async fn is_available(&self) -> bool {
            false
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    fn listing() -> Listing {
        Listing {
            id: Uuid::new_v4(),
            title: "Campus Comfort Girls Hostel".to_string(),
            description: "Near DU".to_string(),
            price: 7500.0,
            location: "Kamla Nagar, Delhi".to_string(),
            address: "8 Bungalow Rd, Kamla Nagar".to_string(),
            city: "Delhi".to_string(),
            kind: "Hostel".to_string(),
            amenities: vec!["WiFi".to_string(), "Food".to_string()],
            images: Vec::new(),
            contact_name: "Priya Mehta".to_string(),
            contact_phone: "9876543215".to_string(),
            nearby_locations: vec!["Delhi University".to_string()],
            metadata: serde_json::json!({}),
            created_at: Utc.with_ymd_and_hms(2024, 4, 6, 10, 0, 0).unwrap(),
        }
    }

    fn slots() -> SlotSet {
        SlotSet {
            looking_for: Some(ListingKind::Hostel),
            city: Some("delhi".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_structured_block_markers() {
        let composer = ResponseComposer::new(Arc::new(ScriptedLlm { reply: "" }));
        let block = composer.compose_results(&slots(), &[listing()], false);

        assert!(block.starts_with("I found 1 listings for you:"));
        assert!(block.contains("1. **Campus Comfort Girls Hostel**"));
        assert!(block.contains("📍 8 Bungalow Rd, Kamla Nagar"));
        assert!(block.contains("💰 ₹7500 per month"));
        assert!(block.contains("🏙️ Nearby: Delhi University"));
        assert!(block.contains("✨ Amenities: WiFi, Food"));
        assert!(block.contains("📞 Contact: Priya Mehta, 9876543215"));
        // First results invite the landmark refinement
        assert!(block.contains("landmark or area?"));
    }

    #[test]
    fn test_landmark_header_and_followup_variation() {
        let composer = ResponseComposer::new(Arc::new(ScriptedLlm { reply: "" }));
        let mut s = slots();
        s.nearby_location = Some("Delhi University".to_string());
        s.has_shown_results = true;

        let block = composer.compose_results(&s, &[listing()], true);
        assert!(block.starts_with("I found 1 listings near Delhi University:"));
        // The landmark offer is made only once
        assert!(!block.contains("landmark or area?"));
        assert!(block.contains("another area?"));
    }

    #[test]
    fn test_empty_result_names_the_request() {
        let composer = ResponseComposer::new(Arc::new(ScriptedLlm { reply: "" }));
        let mut s = slots();
        let msg = composer.compose_empty(&s);
        assert!(msg.contains("hostel listings in Delhi"));
        assert!(msg.contains("broadening"));

        s.nearby_location = Some("Delhi University".to_string());
        let msg = composer.compose_empty(&s);
        assert!(msg.contains("near Delhi University"));
    }

    #[test]
    fn test_retains_facts_guard() {
        let s = slots();
        assert!(retains_facts("Here you go!\n1. **Campus Comfort**", &s));
        assert!(retains_facts("A lovely hostel awaits you in Delhi!", &s));
        assert!(!retains_facts("Happy to help with anything else!", &s));
    }

    #[tokio::test]
    async fn test_polish_rejects_fact_free_reply() {
        let composer = ResponseComposer::new(Arc::new(ScriptedLlm {
            reply: "Glad to be of service!",
        }));
        let s = slots();
        let block = composer.compose_results(&s, &[listing()], false);
        let out = composer.polish(&block, "hostel in delhi", &s).await;
        assert_eq!(out, block);
    }

    #[tokio::test]
    async fn test_polish_accepts_fact_retaining_reply() {
        let composer = ResponseComposer::new(Arc::new(ScriptedLlm {
            reply: "Great news!\n1. **Campus Comfort Girls Hostel** - ₹7500 per month",
        }));
        let s = slots();
        let block = composer.compose_results(&s, &[listing()], false);
        let out = composer.polish(&block, "hostel in delhi", &s).await;
        assert!(out.starts_with("Great news!"));
    }

    #[tokio::test]
    async fn test_polish_failure_falls_back_to_block() {
        let composer = ResponseComposer::new(Arc::new(FailingLlm));
        let s = slots();
        let block = composer.compose_results(&s, &[listing()], false);
        let out = composer.polish(&block, "hostel in delhi", &s).await;
        assert_eq!(out, block);
    }
}
