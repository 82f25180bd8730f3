//! Two-pass slot extraction over the conversation transcript
//!
//! Pass 1 scans user turns for direct mentions (city gazetteer, kind
//! keywords, budget figures, amenity terms, landmark phrases). Pass 2
//! walks assistant/user turn pairs and binds answers to the questions
//! that preceded them. Direct mentions win: pass 2 only fills slots that
//! pass 1 left empty, and within a pass the first match wins.

use once_cell::sync::Lazy;
use regex::Regex;

use city_living_config::constants::{
    CITY_MAX_LEN, LANDMARK_FALLBACK_WORDS, LANDMARK_SHORT_MESSAGE_WORDS, MIN_BUDGET, NAME_MAX_LEN,
};
use city_living_config::DomainVocabulary;
use city_living_core::{ListingKind, Turn, TurnRole};

use crate::slots::SlotSet;

/// Longest landmark we keep, in characters
const LANDMARK_MAX_LEN: usize = 60;

static PG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bpgs?\b").unwrap());
static FOOD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bfood\b").unwrap());
static BUDGET_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4,6})\b\s*(?:rs|rupees|₹|inr)?").unwrap());

/// Greetings, acknowledgements and refusals that must never be read as a
/// landmark or city, however short the message is.
static SMALL_TALK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(hi|hello|hey|thanks|thank you|ok|okay|yes|yeah|no|nope|not now|nothing|sure|hmm|good (morning|afternoon|evening))\b")
        .unwrap()
});

/// Words that introduce a landmark phrase
const LANDMARK_TRIGGERS: [&str; 4] = ["close to", "nearby", "around", "near"];

/// Heuristic slot extractor
pub struct IntentExtractor {
    vocab: DomainVocabulary,
    /// Ordered landmark patterns; the first capture wins
    landmark_patterns: Vec<Regex>,
    /// Word-bounded pattern per amenity term, in vocabulary order
    amenity_patterns: Vec<(String, Regex)>,
}

impl IntentExtractor {
    pub fn new(vocab: DomainVocabulary) -> Self {
        let landmark_patterns = vec![
            Regex::new(r"(?i)\bnear\s+(?:the\s+)?(.+?)\s*(?:\.|\?|!|$)").unwrap(),
            Regex::new(r"(?i)\bclose\s+to\s+(?:the\s+)?(.+?)\s*(?:\.|\?|!|$)").unwrap(),
            Regex::new(r"(?i)\bnearby\s+(.+?)\s*(?:\.|\?|!|$)").unwrap(),
            Regex::new(r"(?i)\baround\s+(?:the\s+)?(.+?)\s*(?:\.|\?|!|$)").unwrap(),
        ];

        let amenity_patterns = vocab
            .amenities
            .iter()
            .filter_map(|term| {
                Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term)))
                    .ok()
                    .map(|re| (term.clone(), re))
            })
            .collect();

        Self {
            vocab,
            landmark_patterns,
            amenity_patterns,
        }
    }

    /// Rebuild the slot-set from the full transcript.
    ///
    /// Deterministic over a fixed transcript; there is no persisted
    /// session state, so a truncated or reordered transcript silently
    /// yields different slots.
    pub fn extract(&self, turns: &[Turn]) -> SlotSet {
        let mut slots = SlotSet::default();

        // Pass 1: direct mentions in user turns
        for turn in turns.iter().filter(|t| t.role == TurnRole::User) {
            self.scan_direct(&turn.content, &mut slots);
        }

        // Pass 2: answers bound to the assistant questions before them
        for (i, turn) in turns.iter().enumerate() {
            if turn.role != TurnRole::Assistant {
                continue;
            }
            let q = turn.content.to_lowercase();

            if q.contains("found") && (q.contains("listings") || q.contains("results")) {
                slots.has_shown_results = true;
                if q.contains("listings near") {
                    slots.has_queried_with_nearby = true;
                }
            }

            if !q.contains('?') {
                continue;
            }
            let Some(reply) = turns.get(i + 1).filter(|t| t.role == TurnRole::User) else {
                continue;
            };

            self.bind_answer(&q, &reply.content, &mut slots);
        }

        tracing::debug!(slots = %slots.summary(), "Extracted dialogue slots");
        slots
    }

    /// Pass-1 rules. Each rule fills its slot only when still empty.
    fn scan_direct(&self, content: &str, slots: &mut SlotSet) {
        let lower = content.to_lowercase();

        if slots.city.is_none() {
            if let Some(city) = self.vocab.find_city(&lower) {
                slots.city = Some(truncate(city, CITY_MAX_LEN));
            }
        }

        if slots.looking_for.is_none() {
            if let Some(kind) = kind_from_text(&lower) {
                slots.looking_for = Some(kind);
            }
        }

        if slots.budget.is_none() {
            if let Some(budget) = extract_budget(&lower) {
                slots.budget = Some(budget);
            }
        }

        for (term, pattern) in &self.amenity_patterns {
            if pattern.is_match(content) && !slots.amenities.contains(term) {
                slots.amenities.push(term.clone());
            }
        }

        if slots.nearby_location.is_none() {
            if let Some(landmark) = self.extract_landmark(content, &lower) {
                slots.nearby_location = Some(landmark);
            }
        }
    }

    /// Landmark rules, in order: regex table, then up to three words after
    /// a bare trigger, then the whole message when it is short, not a
    /// question, and not already claimed by a kind or city rule.
    fn extract_landmark(&self, content: &str, lower: &str) -> Option<String> {
        for pattern in &self.landmark_patterns {
            if let Some(caps) = pattern.captures(content) {
                if let Some(m) = caps.get(1) {
                    let cleaned = clean_phrase(m.as_str());
                    if !cleaned.is_empty() {
                        return Some(cleaned);
                    }
                }
            }
        }

        for trigger in LANDMARK_TRIGGERS {
            if let Some(pos) = lower.find(trigger) {
                // Index into the lowercased copy: byte offsets need not
                // line up with the original once case folding happens.
                let tail = &lower[pos + trigger.len()..];
                let phrase = tail
                    .split_whitespace()
                    .take(LANDMARK_FALLBACK_WORDS)
                    .collect::<Vec<_>>()
                    .join(" ");
                let cleaned = clean_phrase(&phrase);
                if !cleaned.is_empty() {
                    return Some(cleaned);
                }
            }
        }

        let words = content.split_whitespace().count();
        if words > 0
            && words <= LANDMARK_SHORT_MESSAGE_WORDS
            && !content.contains('?')
            && kind_from_text(lower).is_none()
            && self.vocab.find_city(lower).is_none()
            && !SMALL_TALK_PATTERN.is_match(content.trim())
        {
            let cleaned = clean_phrase(content);
            if !cleaned.is_empty() {
                return Some(cleaned);
            }
        }

        None
    }

    /// Pass-2 rules: bind the user's reply to the question that preceded
    /// it. Only fills gaps left by pass 1.
    fn bind_answer(&self, question: &str, reply: &str, slots: &mut SlotSet) {
        let reply_lower = reply.to_lowercase();

        if slots.name.is_none() && question.contains("name") {
            if let Some(first) = reply.split_whitespace().next() {
                let candidate = first.trim_matches(|c: char| c.is_ascii_punctuation());
                let len = candidate.chars().count();
                if (2..=19).contains(&len) {
                    slots.name = Some(truncate(candidate, NAME_MAX_LEN));
                }
            }
        }

        if slots.looking_for.is_none()
            && (question.contains("type")
                || question.contains("looking for")
                || (question.contains("hostel") && question.contains("pg")))
        {
            if let Some(kind) = kind_from_text(&reply_lower) {
                slots.looking_for = Some(kind);
            }
        }

        if slots.city.is_none() && question.contains("city") {
            if let Some(city) = self.vocab.find_city(&reply_lower) {
                slots.city = Some(truncate(city, CITY_MAX_LEN));
            } else if !question.contains("type")
                && !question.contains("looking for")
                && reply.split_whitespace().count() <= LANDMARK_SHORT_MESSAGE_WORDS
                && kind_from_text(&reply_lower).is_none()
                && !SMALL_TALK_PATTERN.is_match(reply.trim())
            {
                // A pure city question answered with a short free-text
                // reply: take it verbatim, off-gazetteer cities included.
                let cleaned = clean_phrase(&reply_lower);
                if !cleaned.is_empty() {
                    slots.city = Some(truncate(&cleaned, CITY_MAX_LEN));
                }
            }
        }

        if slots.nearby_location.is_none()
            && (question.contains("landmark")
                || question.contains("area")
                || question.contains("near"))
        {
            let reply_trimmed = reply.trim();
            if let Some(landmark) = self.extract_landmark(reply_trimmed, &reply_lower) {
                slots.nearby_location = Some(landmark);
            } else if reply_trimmed.split_whitespace().count() <= 5
                && !reply_trimmed.contains('?')
                && !SMALL_TALK_PATTERN.is_match(reply_trimmed)
                && kind_from_text(&reply_lower).is_none()
            {
                // The question asked for a landmark, so a short reply is
                // one even when it happens to contain a city name
                // ("Delhi University").
                let cleaned = clean_phrase(reply_trimmed);
                if !cleaned.is_empty() {
                    slots.nearby_location = Some(cleaned);
                }
            }
        }
    }
}

/// Kind keyword rules, in priority order
fn kind_from_text(lower: &str) -> Option<ListingKind> {
    if lower.contains("hostel") {
        Some(ListingKind::Hostel)
    } else if lower.contains("paying guest") || PG_PATTERN.is_match(lower) {
        Some(ListingKind::Pg)
    } else if lower.contains("flat") || lower.contains("apartment") {
        Some(ListingKind::Flat)
    } else if lower.contains("mess") || FOOD_PATTERN.is_match(lower) {
        Some(ListingKind::Mess)
    } else {
        None
    }
}

/// A 4-6 digit figure at or above the threshold is read as a budget.
/// Incidental numbers (years, pin codes) can slip through; the threshold
/// only rejects figures below 1000.
fn extract_budget(lower: &str) -> Option<u32> {
    let caps = BUDGET_PATTERN.captures(lower)?;
    let value: u32 = caps.get(1)?.as_str().parse().ok()?;
    (value >= MIN_BUDGET).then_some(value)
}

fn clean_phrase(s: &str) -> String {
    let trimmed = s
        .trim()
        .trim_matches(|c: char| matches!(c, '.' | ',' | '!' | '?' | ';' | ':'))
        .trim();
    truncate(trimmed, LANDMARK_MAX_LEN)
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use city_living_core::Turn;

    fn extractor() -> IntentExtractor {
        IntentExtractor::new(DomainVocabulary::default())
    }

    #[test]
    fn test_direct_kind_and_city() {
        let turns = [Turn::user("I need a PG in Bangalore")];
        let slots = extractor().extract(&turns);
        assert_eq!(slots.looking_for, Some(ListingKind::Pg));
        assert_eq!(slots.city.as_deref(), Some("bangalore"));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let turns = [
            Turn::user("hostel in delhi near the metro, budget 9000"),
            Turn::assistant("Which area?"),
            Turn::user("Kamla Nagar"),
        ];
        let ex = extractor();
        assert_eq!(ex.extract(&turns), ex.extract(&turns));
    }

    #[test]
    fn test_landmark_pattern() {
        let turns = [Turn::user("looking for a hostel near Delhi University")];
        let slots = extractor().extract(&turns);
        assert_eq!(slots.looking_for, Some(ListingKind::Hostel));
        assert_eq!(slots.nearby_location.as_deref(), Some("Delhi University"));
    }

    #[test]
    fn test_landmark_pattern_stops_at_sentence_end() {
        let turns = [Turn::user("a pg close to the IIT campus. Budget 8000")];
        let slots = extractor().extract(&turns);
        assert_eq!(slots.nearby_location.as_deref(), Some("IIT campus"));
        assert_eq!(slots.budget, Some(8000));
    }

    #[test]
    fn test_budget_threshold() {
        let slots = extractor().extract(&[Turn::user("my budget is 8000 rs")]);
        assert_eq!(slots.budget, Some(8000));

        // Small numbers are never a budget
        let slots = extractor().extract(&[Turn::user("my budget is 500")]);
        assert_eq!(slots.budget, None);

        let slots = extractor().extract(&[Turn::user("I have 2 friends")]);
        assert_eq!(slots.budget, None);
    }

    #[test]
    fn test_budget_ignores_phone_numbers() {
        let slots = extractor().extract(&[Turn::user("call me at 9876543210")]);
        assert_eq!(slots.budget, None);
    }

    #[test]
    fn test_amenities_word_bounded() {
        let slots = extractor().extract(&[Turn::user("pg in pune with wifi and ac")]);
        assert!(slots.amenities.contains(&"wifi".to_string()));
        assert!(slots.amenities.contains(&"ac".to_string()));

        // "ac" inside "accommodation" must not count
        let slots = extractor().extract(&[Turn::user("looking for accommodation in pune")]);
        assert!(!slots.amenities.contains(&"ac".to_string()));
    }

    #[test]
    fn test_first_direct_mention_wins() {
        let turns = [
            Turn::user("show me a pg in delhi"),
            Turn::assistant("Here you go. Anything else?"),
            Turn::user("what about mumbai"),
        ];
        let slots = extractor().extract(&turns);
        assert_eq!(slots.city.as_deref(), Some("delhi"));
    }

    #[test]
    fn test_name_binding() {
        let turns = [
            Turn::assistant("Hi! May I know your name?"),
            Turn::user("Ravi here"),
        ];
        let slots = extractor().extract(&turns);
        assert_eq!(slots.name.as_deref(), Some("Ravi"));
    }

    #[test]
    fn test_name_rejected_when_too_long_or_short() {
        let turns = [
            Turn::assistant("What's your name?"),
            Turn::user("Floccinaucinihilipilification Kumar"),
        ];
        assert_eq!(extractor().extract(&turns).name, None);

        let turns = [Turn::assistant("What's your name?"), Turn::user("A")];
        assert_eq!(extractor().extract(&turns).name, None);
    }

    #[test]
    fn test_city_bound_from_pure_city_question() {
        let turns = [
            Turn::assistant("Which city should I search in?"),
            Turn::user("Mysore"),
        ];
        let slots = extractor().extract(&turns);
        assert_eq!(slots.city.as_deref(), Some("mysore"));
    }

    #[test]
    fn test_welcome_question_binds_kind() {
        let turns = [
            Turn::assistant(
                "What type of accommodation are you looking for - hostel, PG, flat or mess?",
            ),
            Turn::user("a flat please"),
        ];
        let slots = extractor().extract(&turns);
        assert_eq!(slots.looking_for, Some(ListingKind::Flat));
    }

    #[test]
    fn test_landmark_bound_after_landmark_question() {
        let turns = [
            Turn::user("pg in delhi"),
            Turn::assistant(
                "I found 3 listings for you. Would you like options near a specific landmark or area?",
            ),
            Turn::user("Delhi University"),
        ];
        let slots = extractor().extract(&turns);
        assert_eq!(slots.nearby_location.as_deref(), Some("Delhi University"));
        assert!(slots.has_shown_results);
        assert!(!slots.has_queried_with_nearby);
    }

    #[test]
    fn test_negative_reply_is_not_a_landmark() {
        let turns = [
            Turn::user("pg in delhi"),
            Turn::assistant("Would you like options near a specific landmark or area?"),
            Turn::user("no thanks"),
        ];
        let slots = extractor().extract(&turns);
        assert_eq!(slots.nearby_location, None);
    }

    #[test]
    fn test_greetings_are_not_landmarks() {
        let slots = extractor().extract(&[Turn::user("hello")]);
        assert_eq!(slots.nearby_location, None);

        let slots = extractor().extract(&[Turn::user("thank you")]);
        assert_eq!(slots.nearby_location, None);
    }

    #[test]
    fn test_result_flags() {
        let turns = [
            Turn::user("hostel in delhi near DU"),
            Turn::assistant("I found 2 listings near DU:\n1. **Campus Comfort**"),
        ];
        let slots = extractor().extract(&turns);
        assert!(slots.has_shown_results);
        assert!(slots.has_queried_with_nearby);
    }

    #[test]
    fn test_city_truncation() {
        let turns = [
            Turn::assistant("Which city are you in?"),
            Turn::user("Thiruvananthapurampuramburamextra"),
        ];
        let slots = extractor().extract(&turns);
        let city = slots.city.unwrap();
        assert_eq!(city.chars().count(), 30);
    }
}
