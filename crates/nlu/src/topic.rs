//! Fast keyword topic check
//!
//! Decides whether a message is about accommodation at all before any
//! store work happens. The residual ambiguous case is left for the
//! orchestrator, which may spend a one-word generative classification on
//! it.

use city_living_config::DomainVocabulary;

/// Outcome of the keyword check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicSignal {
    /// Clearly about accommodation
    Accommodation,
    /// Clearly about something else (sports, movies, politics…)
    OffTopic,
    /// Neither keyword list fired
    Ambiguous,
}

/// Keyword-list topic classifier
pub struct TopicClassifier {
    vocab: DomainVocabulary,
}

impl TopicClassifier {
    pub fn new(vocab: DomainVocabulary) -> Self {
        Self { vocab }
    }

    /// Classify a single user message.
    ///
    /// Accommodation vocabulary wins over unrelated vocabulary: "a PG
    /// near the stadium" is on-topic even though "stadium" could appear
    /// in sports talk. City and amenity mentions count as on-topic, so
    /// bare answers like "Delhi" survive the check.
    pub fn classify(&self, message: &str) -> TopicSignal {
        let lower = message.to_lowercase();

        let on_topic = self
            .vocab
            .accommodation_terms
            .iter()
            .any(|t| lower.contains(t.as_str()))
            || self.vocab.find_city(&lower).is_some()
            || self.vocab.amenities.iter().any(|a| lower.contains(a.as_str()));

        if on_topic {
            return TopicSignal::Accommodation;
        }

        if self
            .vocab
            .unrelated_terms
            .iter()
            .any(|t| lower.contains(t.as_str()))
        {
            return TopicSignal::OffTopic;
        }

        TopicSignal::Ambiguous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> TopicClassifier {
        TopicClassifier::new(DomainVocabulary::default())
    }

    #[test]
    fn test_accommodation_vocabulary() {
        assert_eq!(
            classifier().classify("I need a PG in Bangalore"),
            TopicSignal::Accommodation
        );
        assert_eq!(
            classifier().classify("any rooms for rent?"),
            TopicSignal::Accommodation
        );
    }

    #[test]
    fn test_bare_city_is_on_topic() {
        assert_eq!(classifier().classify("Delhi"), TopicSignal::Accommodation);
    }

    #[test]
    fn test_unrelated_vocabulary() {
        assert_eq!(
            classifier().classify("who won the cricket match"),
            TopicSignal::OffTopic
        );
        assert_eq!(
            classifier().classify("recommend me a movie"),
            TopicSignal::OffTopic
        );
    }

    #[test]
    fn test_accommodation_wins_over_unrelated() {
        assert_eq!(
            classifier().classify("a hostel near the cricket stadium"),
            TopicSignal::Accommodation
        );
    }

    #[test]
    fn test_ambiguous_residual() {
        assert_eq!(
            classifier().classify("what do you think about that"),
            TopicSignal::Ambiguous
        );
    }
}
