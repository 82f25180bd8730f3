//! Canned listings and the mock fallback provider
//!
//! When the real store is unreachable at startup the server serves this
//! dataset instead, filtered through the exact same `ListingFilter`
//! predicates as real rows. Writes are rejected; the chat path only
//! reads.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use city_living_core::{Listing, ListingDraft};

use crate::error::StoreError;
use crate::listings::{ListingFilter, ListingStore};

/// The canned dataset, also used by the seed endpoint.
///
/// Ids and timestamps are fixed so replies are stable across requests.
pub fn sample_listings() -> Vec<Listing> {
    let entries = [
        (
            1u128,
            "Cozy Studio Apartment near City Center",
            "A beautiful studio apartment with all modern amenities, located just 5 minutes from the city center. Perfect for students.",
            12000.0,
            "City Center, Bangalore",
            "123 Main St, City Center",
            "Bangalore",
            "Flat",
            vec!["WiFi", "AC", "Fully Furnished", "Power Backup"],
            "John Doe",
            "9876543210",
            vec!["City Center Metro", "Central Mall"],
            json!({ "rating": 4.2, "capacity": "1 BHK", "gender": "mixed" }),
            1,
        ),
        (
            2,
            "Spacious PG Accommodation for Girls",
            "Safe and secure PG accommodation for girls with homely food and all necessary amenities. Located near major colleges.",
            8500.0,
            "Koramangala, Bangalore",
            "456 Park Ave, Koramangala",
            "Bangalore",
            "PG",
            vec!["Food", "Laundry", "WiFi", "Security"],
            "Mary Smith",
            "9876543211",
            vec!["Christ University", "Forum Mall"],
            json!({ "rating": 4.6, "capacity": "Double Sharing", "gender": "female" }),
            2,
        ),
        (
            3,
            "Boys Hostel with Modern Facilities",
            "Modern hostel for boys with gym, study area, and recreation facilities. Close to major tech parks.",
            7000.0,
            "Electronic City, Bangalore",
            "789 Tech Park Rd, Electronic City",
            "Bangalore",
            "Hostel",
            vec!["Gym", "Study Area", "WiFi", "Hot Water"],
            "Robert Johnson",
            "9876543212",
            vec!["Infosys Campus", "Electronic City Phase 1"],
            json!({ "rating": 4.1, "capacity": "3 seater", "gender": "male" }),
            3,
        ),
        (
            4,
            "Affordable Mess Service with Home-cooked Food",
            "Healthy and hygienic home-cooked food served fresh. Monthly and daily packages available.",
            3500.0,
            "Indiranagar, Bangalore",
            "321 Food St, Indiranagar",
            "Bangalore",
            "Mess",
            vec!["Food", "TV"],
            "Sarah Williams",
            "9876543213",
            vec!["Indiranagar Metro"],
            json!({ "rating": 4.4, "mealType": "Veg & Non-Veg" }),
            4,
        ),
        (
            5,
            "Student Haven Hostel",
            "A comfortable hostel designed for students with all facilities, 5 minutes from the IIT campus with easy metro access.",
            8000.0,
            "Hauz Khas, Delhi",
            "14 Outer Ring Rd, Hauz Khas",
            "Delhi",
            "Hostel",
            vec!["WiFi", "Food", "Laundry", "AC", "Hot Water"],
            "Rahul Sharma",
            "9876543214",
            vec!["IIT Delhi", "Hauz Khas Metro"],
            json!({ "rating": 4.5, "capacity": "3 seater", "gender": "male" }),
            5,
        ),
        (
            6,
            "Campus Comfort Girls Hostel",
            "Comfortable hostel for female students with a secure environment, walking distance to Delhi University North Campus.",
            7500.0,
            "Kamla Nagar, Delhi",
            "8 Bungalow Rd, Kamla Nagar",
            "Delhi",
            "Hostel",
            vec!["WiFi", "Food", "Gym", "CCTV", "Study Area"],
            "Priya Mehta",
            "9876543215",
            vec!["Delhi University", "North Campus"],
            json!({ "rating": 4.3, "capacity": "2 seater", "gender": "female" }),
            6,
        ),
        (
            7,
            "Shanti Mess Service",
            "Authentic South Indian mess with homely food. Vegetarian and non-vegetarian options with clean dining facilities.",
            3800.0,
            "Ameerpet, Hyderabad",
            "2 Metro Lane, Ameerpet",
            "Hyderabad",
            "Mess",
            vec!["Food"],
            "Venkat Rao",
            "9876543216",
            vec!["Ameerpet Metro Station"],
            json!({ "rating": 4.5, "mealType": "Veg & Non-Veg", "speciality": "South Indian" }),
            7,
        ),
        (
            8,
            "Sea View PG for Working Women",
            "Secure PG for students and working women with homely food, close to local train stations and colleges.",
            11000.0,
            "Andheri West, Mumbai",
            "45 Link Rd, Andheri West",
            "Mumbai",
            "PG",
            vec!["WiFi", "Food", "Laundry", "Security"],
            "Anita Desai",
            "9876543217",
            vec!["Andheri Station", "Mithibai College"],
            json!({ "rating": 4.2, "capacity": "Triple Sharing", "gender": "female" }),
            8,
        ),
        (
            9,
            "Premium 2BHK Flat for Students",
            "Fully furnished 2BHK flat ideal for a group of students. All amenities included.",
            18000.0,
            "Kothrud, Pune",
            "67 College Rd, Kothrud",
            "Pune",
            "Flat",
            vec!["WiFi", "AC", "Security", "Parking"],
            "David Miller",
            "9876543218",
            vec!["MIT College", "Kothrud Depot"],
            json!({ "rating": 4.0, "capacity": "2 BHK" }),
            9,
        ),
        (
            10,
            "Aspirant Boys Hostel",
            "Quiet hostel for coaching students with dedicated study halls and mess facility on site.",
            6500.0,
            "Talwandi, Kota",
            "90 Coaching St, Talwandi",
            "Kota",
            "Hostel",
            vec!["WiFi", "Food", "Study Area", "Power Backup"],
            "Mohan Gupta",
            "9876543219",
            vec!["Allen Institute", "Talwandi Circle"],
            json!({ "rating": 4.4, "capacity": "Single Room", "gender": "male" }),
            10,
        ),
    ];

    entries
        .into_iter()
        .map(
            |(
                n,
                title,
                description,
                price,
                location,
                address,
                city,
                kind,
                amenities,
                contact_name,
                contact_phone,
                nearby,
                metadata,
                day,
            )| Listing {
                id: Uuid::from_u128(n),
                title: title.to_string(),
                description: description.to_string(),
                price,
                location: location.to_string(),
                address: address.to_string(),
                city: city.to_string(),
                kind: kind.to_string(),
                amenities: amenities.into_iter().map(String::from).collect(),
                images: Vec::new(),
                contact_name: contact_name.to_string(),
                contact_phone: contact_phone.to_string(),
                nearby_locations: nearby.into_iter().map(String::from).collect(),
                metadata,
                created_at: Utc.with_ymd_and_hms(2024, 4, day, 10, 0, 0).unwrap(),
            },
        )
        .collect()
}

/// Read-only provider over the canned dataset
pub struct MockListingProvider {
    listings: Vec<Listing>,
}

impl MockListingProvider {
    pub fn new() -> Self {
        Self {
            listings: sample_listings(),
        }
    }
}

impl Default for MockListingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ListingStore for MockListingProvider {
    async fn find(
        &self,
        filter: &ListingFilter,
        limit: usize,
    ) -> Result<Vec<Listing>, StoreError> {
        let hits = filter.apply(self.listings.clone(), limit);
        tracing::debug!(hits = hits.len(), "Served listing query from sample data");
        Ok(hits)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Listing>, StoreError> {
        Ok(self.listings.iter().find(|l| l.id == id).cloned())
    }

    async fn create(&self, _draft: ListingDraft) -> Result<Listing, StoreError> {
        Err(StoreError::Unavailable(
            "writes are disabled while the listing store is unreachable".to_string(),
        ))
    }

    async fn update(&self, _id: Uuid, _draft: ListingDraft) -> Result<Listing, StoreError> {
        Err(StoreError::Unavailable(
            "writes are disabled while the listing store is unreachable".to_string(),
        ))
    }

    async fn delete(&self, _id: Uuid) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(
            "writes are disabled while the listing store is unreachable".to_string(),
        ))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.listings.len() as i64)
    }
}
