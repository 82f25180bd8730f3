//! Query planning with progressive relaxation
//!
//! One primary filtered query, then a fixed cascade of looser queries
//! until something comes back. Every stage is capped at five results,
//! recency ordered, and raced against a timer: timeouts and store errors
//! count as zero results so the cascade (and ultimately the caller)
//! always gets an answer.

use std::sync::Arc;
use std::time::Duration;

use city_living_config::constants::{
    CITY_PREFIX_MIN, CITY_PREFIX_RATIO, MAX_RESULTS, QUERY_TIMEOUT,
};
use city_living_core::Listing;
use city_living_nlu::SlotSet;
use city_living_store::{ListingFilter, ListingStore};

/// Plans and executes the search for a slot-set
pub struct QueryPlanner {
    store: Arc<dyn ListingStore>,
    timeout: Duration,
}

impl QueryPlanner {
    pub fn new(store: Arc<dyn ListingStore>) -> Self {
        Self {
            store,
            timeout: QUERY_TIMEOUT,
        }
    }

    /// Override the per-stage timeout (tests race against short timers)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the search. `use_landmark` asks for the landmark-filtered
    /// variant first; it relaxes to kind+city and then the full cascade.
    pub async fn search(&self, slots: &SlotSet, use_landmark: bool) -> Vec<Listing> {
        let kind_terms = kind_terms(slots);
        let city = slots.city.clone();

        if use_landmark {
            if let Some(landmark) = slots.nearby_location.as_deref() {
                let filter = ListingFilter {
                    kind_terms: kind_terms.clone(),
                    city_equals: city.clone(),
                    landmark: Some(landmark.to_lowercase()),
                    ..Default::default()
                };
                let hits = self.run_stage("landmark", filter).await;
                if !hits.is_empty() {
                    return hits;
                }

                let filter = ListingFilter {
                    kind_terms: kind_terms.clone(),
                    city_equals: city.clone(),
                    ..Default::default()
                };
                let hits = self.run_stage("landmark-relaxed", filter).await;
                if !hits.is_empty() {
                    return hits;
                }
            }
        }

        self.cascade(slots, kind_terms, city).await
    }

    /// The non-landmark cascade: primary, then the relaxation stages in
    /// fixed order, stopping at the first non-empty result.
    async fn cascade(
        &self,
        slots: &SlotSet,
        kind_terms: Vec<String>,
        city: Option<String>,
    ) -> Vec<Listing> {
        let primary = ListingFilter {
            kind_terms: kind_terms.clone(),
            city_equals: city.clone(),
            max_price: slots.budget.map(f64::from),
            amenities_any: slots.amenities.clone(),
            ..Default::default()
        };
        let hits = self.run_stage("primary", primary).await;
        if !hits.is_empty() {
            return hits;
        }

        // Stage 1: tolerate spelling variants with a city prefix
        if let Some(ref city) = city {
            let filter = ListingFilter {
                kind_terms: kind_terms.clone(),
                city_contains: Some(city_prefix(city)),
                ..Default::default()
            };
            let hits = self.run_stage("city-prefix", filter).await;
            if !hits.is_empty() {
                return hits;
            }
        }

        // Stage 2: drop the city filter entirely
        let filter = ListingFilter {
            kind_terms: kind_terms.clone(),
            ..Default::default()
        };
        let hits = self.run_stage("type-only", filter).await;
        if !hits.is_empty() {
            return hits;
        }

        // Stage 3: similar accommodation types in the original city
        if let Some(kind) = slots.looking_for {
            let similar: Vec<String> =
                kind.similar_terms().iter().map(|t| t.to_string()).collect();
            if !similar.is_empty() {
                let filter = ListingFilter {
                    kind_terms: similar,
                    city_equals: city.clone(),
                    ..Default::default()
                };
                let hits = self.run_stage("similar-type", filter).await;
                if !hits.is_empty() {
                    return hits;
                }
            }
        }

        // Stage 4: last resort, the most recent listings of any kind
        self.run_stage("recent-any", ListingFilter::default()).await
    }

    /// Race one query against the timer. The query runs as its own task;
    /// when the timer wins, the task keeps running detached and its
    /// eventual result is discarded.
    async fn run_stage(&self, stage: &'static str, filter: ListingFilter) -> Vec<Listing> {
        let store = Arc::clone(&self.store);
        let handle = tokio::spawn(async move { store.find(&filter, MAX_RESULTS).await });

        tokio::select! {
            joined = handle => match joined {
                Ok(Ok(hits)) => {
                    tracing::debug!(stage, hits = hits.len(), "Search stage completed");
                    hits
                }
                Ok(Err(e)) => {
                    tracing::warn!(stage, error = %e, "Search stage failed; treating as empty");
                    Vec::new()
                }
                Err(e) => {
                    tracing::warn!(stage, error = %e, "Search task panicked; treating as empty");
                    Vec::new()
                }
            },
            _ = tokio::time::sleep(self.timeout) => {
                tracing::warn!(
                    stage,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Search stage timed out; treating as empty"
                );
                Vec::new()
            }
        }
    }
}

fn kind_terms(slots: &SlotSet) -> Vec<String> {
    slots
        .looking_for
        .map(|k| vec![k.as_str().to_string()])
        .unwrap_or_default()
}

/// First ⌈70 %⌉ of the city string, never fewer than three characters.
fn city_prefix(city: &str) -> String {
    let total = city.chars().count();
    let take = ((total as f64) * CITY_PREFIX_RATIO).ceil() as usize;
    city.chars().take(take.max(CITY_PREFIX_MIN)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use city_living_core::{ListingDraft, ListingKind};
    use city_living_store::StoreError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct StubStore {
        listings: Vec<Listing>,
        calls: AtomicUsize,
        fail: bool,
        delay: Duration,
    }

    impl StubStore {
        fn with(listings: Vec<Listing>) -> Self {
            Self {
                listings,
                calls: AtomicUsize::new(0),
                fail: false,
                delay: Duration::ZERO,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::with(Vec::new())
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ListingStore for StubStore {
        async fn find(
            &self,
            filter: &ListingFilter,
            limit: usize,
        ) -> Result<Vec<Listing>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StoreError::Unavailable("stub failure".to_string()));
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(filter.apply(self.listings.clone(), limit))
        }

        async fn get(&self, _id: Uuid) -> Result<Option<Listing>, StoreError> {
            Ok(None)
        }

        async fn create(&self, _draft: ListingDraft) -> Result<Listing, StoreError> {
            Err(StoreError::Unavailable("read-only stub".to_string()))
        }

        async fn update(&self, _id: Uuid, _draft: ListingDraft) -> Result<Listing, StoreError> {
            Err(StoreError::Unavailable("read-only stub".to_string()))
        }

        async fn delete(&self, _id: Uuid) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("read-only stub".to_string()))
        }

        async fn count(&self) -> Result<i64, StoreError> {
            Ok(self.listings.len() as i64)
        }
    }

    fn listing(kind: &str, city: &str, nearby: &[&str], day: u32) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            title: format!("{} in {}", kind, city),
            description: "Good for students".to_string(),
            price: 8000.0,
            location: city.to_string(),
            address: format!("1 Main Rd, {}", city),
            city: city.to_string(),
            kind: kind.to_string(),
            amenities: vec!["WiFi".to_string()],
            images: Vec::new(),
            contact_name: "Owner".to_string(),
            contact_phone: "9876543210".to_string(),
            nearby_locations: nearby.iter().map(|s| s.to_string()).collect(),
            metadata: serde_json::json!({}),
            created_at: Utc.with_ymd_and_hms(2024, 5, day, 0, 0, 0).unwrap(),
        }
    }

    fn slots(kind: ListingKind, city: &str) -> SlotSet {
        SlotSet {
            looking_for: Some(kind),
            city: Some(city.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_city_prefix() {
        assert_eq!(city_prefix("bangalore"), "bangalo");
        assert_eq!(city_prefix("goa"), "goa");
        // Never below the floor even for tiny strings
        assert_eq!(city_prefix("ab"), "ab");
    }

    #[tokio::test]
    async fn test_primary_hit_stops_cascade() {
        let store = Arc::new(StubStore::with(vec![listing("PG", "Bangalore", &[], 1)]));
        let planner = QueryPlanner::new(store.clone());

        let hits = planner.search(&slots(ListingKind::Pg, "bangalore"), false).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn test_city_prefix_stage_tolerates_variants() {
        // Nothing in "Bangalore" exactly, but "Bangalore City" shares the prefix
        let store = Arc::new(StubStore::with(vec![listing("PG", "Bangalore City", &[], 1)]));
        let planner = QueryPlanner::new(store.clone());

        let hits = planner.search(&slots(ListingKind::Pg, "bangalore"), false).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].city, "Bangalore City");
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn test_type_only_stage() {
        let store = Arc::new(StubStore::with(vec![listing("PG", "Pune", &[], 1)]));
        let planner = QueryPlanner::new(store.clone());

        let hits = planner.search(&slots(ListingKind::Pg, "delhi"), false).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(store.calls(), 3);
    }

    #[tokio::test]
    async fn test_similar_type_stage() {
        let store = Arc::new(StubStore::with(vec![listing("PG", "Delhi", &[], 1)]));
        let planner = QueryPlanner::new(store.clone());

        // Hostels are out, but a PG in the same city is similar enough
        let hits = planner.search(&slots(ListingKind::Hostel, "delhi"), false).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, "PG");
        assert_eq!(store.calls(), 4);
    }

    #[tokio::test]
    async fn test_last_resort_returns_recent_anything() {
        let store = Arc::new(StubStore::with(vec![listing("Mess", "Kolkata", &[], 1)]));
        let planner = QueryPlanner::new(store.clone());

        let hits = planner.search(&slots(ListingKind::Hostel, "delhi"), false).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, "Mess");
        assert_eq!(store.calls(), 5);
    }

    #[tokio::test]
    async fn test_store_errors_yield_empty_never_panic() {
        let store = Arc::new(StubStore::failing());
        let planner = QueryPlanner::new(store.clone());

        let hits = planner.search(&slots(ListingKind::Pg, "pune"), false).await;
        assert!(hits.is_empty());
        // Every stage was attempted and swallowed its error
        assert_eq!(store.calls(), 5);
    }

    #[tokio::test]
    async fn test_slow_store_times_out_to_empty() {
        let store = Arc::new(StubStore {
            delay: Duration::from_millis(80),
            ..StubStore::with(vec![listing("PG", "Pune", &[], 1)])
        });
        let planner =
            QueryPlanner::new(store.clone()).with_timeout(Duration::from_millis(5));

        let hits = planner.search(&slots(ListingKind::Pg, "pune"), false).await;
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_landmark_filter_and_relaxation() {
        let near_du = listing("Hostel", "Delhi", &["Delhi University"], 2);
        let plain = listing("Hostel", "Delhi", &[], 1);
        let store = Arc::new(StubStore::with(vec![near_du.clone(), plain]));
        let planner = QueryPlanner::new(store.clone());

        let mut s = slots(ListingKind::Hostel, "delhi");
        s.nearby_location = Some("Delhi University".to_string());

        let hits = planner.search(&s, true).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, near_du.id);
        assert_eq!(store.calls(), 1);

        // Unknown landmark relaxes to kind+city
        s.nearby_location = Some("Nowhere Special".to_string());
        let hits = planner.search(&s, true).await;
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_budget_and_amenities_only_constrain_primary() {
        let mut cheap = listing("PG", "Pune", &[], 1);
        cheap.price = 6000.0;
        let mut pricey = listing("PG", "Pune", &[], 2);
        pricey.price = 15000.0;
        let store = Arc::new(StubStore::with(vec![cheap.clone(), pricey]));
        let planner = QueryPlanner::new(store.clone());

        let mut s = slots(ListingKind::Pg, "pune");
        s.budget = Some(7000);
        let hits = planner.search(&s, false).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, cheap.id);

        // An impossible budget falls through to the relaxed stages
        s.budget = Some(1000);
        let hits = planner.search(&s, false).await;
        assert!(!hits.is_empty());
    }
}
