//! Centralized tuning constants
//!
//! Values the dialogue and search paths depend on. Kept in one place so
//! the extractor, planner and composer agree on limits.

use std::time::Duration;

/// Maximum listings returned by any search stage
pub const MAX_RESULTS: usize = 5;

/// Budget for a single store query before the race gives up on it
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Smallest monetary figure interpreted as a budget ceiling
pub const MIN_BUDGET: u32 = 1000;

/// Extracted name is cut to this many characters
pub const NAME_MAX_LEN: usize = 20;

/// Extracted city is cut to this many characters
pub const CITY_MAX_LEN: usize = 30;

/// Fraction of the city string used by the partial-match cascade stage
pub const CITY_PREFIX_RATIO: f64 = 0.7;

/// Partial city match never uses fewer characters than this
pub const CITY_PREFIX_MIN: usize = 3;

/// Words taken after a landmark trigger when no pattern matched
pub const LANDMARK_FALLBACK_WORDS: usize = 3;

/// A message this short (in words) may be taken verbatim as a landmark
pub const LANDMARK_SHORT_MESSAGE_WORDS: usize = 3;

/// Readiness probe budget for the generative-service check
pub const READINESS_PROBE_TIMEOUT: Duration = Duration::from_secs(2);
