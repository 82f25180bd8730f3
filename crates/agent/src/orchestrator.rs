//! Per-turn dialogue orchestration
//!
//! Each chat request replays the transcript into a slot-set, then
//! branches: welcome a fresh conversation, deflect off-topic chatter,
//! ask for whichever of kind/city is still missing, or run the search
//! and compose a reply. There is no session state anywhere; a new turn
//! is a fresh, independent invocation.

use std::sync::Arc;

use city_living_config::DomainVocabulary;
use city_living_core::{Turn, TurnRole};
use city_living_llm::{LlmBackend, LlmError, Message};
use city_living_nlu::{IntentExtractor, SlotSet, TopicClassifier, TopicSignal};
use city_living_store::ListingStore;

use crate::composer::{ResponseComposer, SYSTEM_PROMPT};
use crate::planner::QueryPlanner;
use crate::AgentError;

const WELCOME_FALLBACK: &str = "Hi there! I can help you find hostels, PGs, flats and mess \
    services. What type of accommodation are you looking for, and in which city?";

const OFF_TOPIC_FALLBACK: &str = "I'm best at finding student accommodation, so I'll skip \
    that one.";

const REDIRECT_PROMPT: &str = "By the way, I can help you find hostels, PGs, flats or mess \
    services - what type are you looking for, and in which city?";

/// Dialogue state inferred for the current turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueStage {
    Welcome,
    OffTopic,
    CollectingInfo,
    Searching,
    NearbyRefine,
}

impl DialogueStage {
    pub fn display_name(&self) -> &'static str {
        match self {
            DialogueStage::Welcome => "welcome",
            DialogueStage::OffTopic => "off-topic",
            DialogueStage::CollectingInfo => "collecting-info",
            DialogueStage::Searching => "searching",
            DialogueStage::NearbyRefine => "nearby-refine",
        }
    }
}

/// Reply for one turn
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub content: String,
    pub stage: DialogueStage,
}

/// The per-turn request handler
pub struct ChatAgent {
    llm: Arc<dyn LlmBackend>,
    extractor: IntentExtractor,
    topic: TopicClassifier,
    planner: QueryPlanner,
    composer: ResponseComposer,
}

impl ChatAgent {
    pub fn new(
        store: Arc<dyn ListingStore>,
        llm: Arc<dyn LlmBackend>,
        vocab: DomainVocabulary,
    ) -> Self {
        Self {
            extractor: IntentExtractor::new(vocab.clone()),
            topic: TopicClassifier::new(vocab),
            planner: QueryPlanner::new(store),
            composer: ResponseComposer::new(Arc::clone(&llm)),
            llm,
        }
    }

    /// Handle one chat turn against the full transcript.
    pub async fn process(&self, turns: &[Turn]) -> Result<ChatReply, AgentError> {
        let last_user = turns
            .iter()
            .rev()
            .find(|t| t.role == TurnRole::User)
            .ok_or_else(|| {
                AgentError::InvalidTranscript("transcript contains no user message".to_string())
            })?;

        let non_system_turns = turns.iter().filter(|t| t.role != TurnRole::System).count();
        if non_system_turns <= 1 {
            return self.welcome().await;
        }

        let slots = self.extractor.extract(turns);

        match self.topic.classify(&last_user.content) {
            TopicSignal::Accommodation => {}
            TopicSignal::OffTopic => return self.off_topic(&last_user.content).await,
            TopicSignal::Ambiguous => {
                if !self.classify_with_llm(&last_user.content).await? {
                    return self.off_topic(&last_user.content).await;
                }
            }
        }

        if slots.looking_for.is_none() {
            return Ok(ChatReply {
                content: type_question(&slots),
                stage: DialogueStage::CollectingInfo,
            });
        }

        if slots.city.is_none() {
            let kind = slots.looking_for.unwrap_or_default();
            return Ok(ChatReply {
                content: format!("Great choice! Which city should I look for a {} in?", kind),
                stage: DialogueStage::CollectingInfo,
            });
        }

        let use_landmark = slots.nearby_location.is_some() && !slots.has_queried_with_nearby;

        tracing::info!(
            slots = %slots.summary(),
            use_landmark,
            "Running accommodation search"
        );

        let results = self.planner.search(&slots, use_landmark).await;

        let content = if results.is_empty() {
            self.composer.compose_empty(&slots)
        } else {
            let block = self.composer.compose_results(&slots, &results, use_landmark);
            self.composer.polish(&block, &last_user.content, &slots).await
        };

        Ok(ChatReply {
            content,
            stage: if use_landmark {
                DialogueStage::NearbyRefine
            } else {
                DialogueStage::Searching
            },
        })
    }

    /// Fresh conversation: a generative greeting, with a fixed fallback.
    async fn welcome(&self) -> Result<ChatReply, AgentError> {
        let messages = vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(
                "Greet the user warmly in one or two sentences and ask what type of \
                 accommodation they are looking for (hostel, PG, flat or mess) and in \
                 which city.",
            ),
        ];

        let content = match self.llm.generate(&messages).await {
            Ok(result) => result.text,
            Err(LlmError::RateLimited) => return Err(AgentError::RateLimited),
            Err(e) => {
                tracing::warn!(error = %e, "Greeting generation failed; using fixed text");
                WELCOME_FALLBACK.to_string()
            }
        };

        Ok(ChatReply {
            content,
            stage: DialogueStage::Welcome,
        })
    }

    /// Answer briefly off the store path, then steer back to the search.
    async fn off_topic(&self, message: &str) -> Result<ChatReply, AgentError> {
        let messages = vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(format!(
                "The user asked something unrelated to accommodation: \"{}\". \
                 Answer briefly and politely in one or two sentences.",
                message
            )),
        ];

        let answer = match self.llm.generate(&messages).await {
            Ok(result) => result.text,
            Err(LlmError::RateLimited) => return Err(AgentError::RateLimited),
            Err(e) => {
                tracing::warn!(error = %e, "Off-topic reply generation failed; using fixed text");
                OFF_TOPIC_FALLBACK.to_string()
            }
        };

        Ok(ChatReply {
            content: format!("{}\n\n{}", answer.trim(), REDIRECT_PROMPT),
            stage: DialogueStage::OffTopic,
        })
    }

    /// One-word classification for the ambiguous residual. Accepted only
    /// when the answer is a single unambiguous word; anything else
    /// defaults to on-topic. Returns true when the message is about
    /// accommodation.
    async fn classify_with_llm(&self, message: &str) -> Result<bool, AgentError> {
        let messages = vec![Message::user(format!(
            "Classify this message from a user of an accommodation website: \"{}\". \
             Reply with exactly one word: \"accommodation\" if it is about finding a \
             place to stay or eat, otherwise \"other\".",
            message
        ))];

        match self.llm.generate(&messages).await {
            Ok(result) => {
                let text = result.text.trim().to_lowercase();
                if text.split_whitespace().count() != 1 {
                    return Ok(true);
                }
                match text.trim_matches(|c: char| c.is_ascii_punctuation()) {
                    "accommodation" => Ok(true),
                    "other" => Ok(false),
                    _ => Ok(true),
                }
            }
            Err(LlmError::RateLimited) => Err(AgentError::RateLimited),
            Err(e) => {
                tracing::warn!(error = %e, "Topic classification failed; assuming on-topic");
                Ok(true)
            }
        }
    }
}

fn type_question(slots: &SlotSet) -> String {
    match slots.name {
        Some(ref name) => format!(
            "Nice to meet you, {}! What type of accommodation are you looking for - a \
             hostel, PG, flat or mess?",
            name
        ),
        None => "What type of accommodation are you looking for - a hostel, PG, flat or mess?"
            .to_string(),
    }
}
