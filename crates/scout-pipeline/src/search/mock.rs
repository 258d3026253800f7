//! Mock Search Client
//!
//! For tests, demos and offline runs. Serves static fixtures per category,
//! or scripted bodies, failures and delays set up by a test.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{SearchClient, SearchRequest, records_payload};
use crate::error::{PipelineError, Result};
use crate::model::{Domain, Record};

/// Static result sets
pub mod fixtures {
    use crate::model::{Domain, Record};

    pub const VENUE: &str = "McCormick Place, Chicago";

    fn flight(
        airline: &str,
        number: &str,
        date: &str,
        times: (&str, &str),
        price: &str,
        arrival_airport: &str,
    ) -> Record {
        let departure = format!("{date} {}", times.0);
        let arrival = format!("{date} {}", times.1);
        Record::from([
            ("airline", airline),
            ("flight_number", number),
            ("departure_time", departure.as_str()),
            ("arrival_time", arrival.as_str()),
            ("duration", "4h 15m"),
            ("stops", "Direct"),
            ("price", price),
            ("departure_airport", "SEA (Seattle)"),
            ("arrival_airport", arrival_airport),
            ("cabin_class", "Economy"),
        ])
    }

    /// Seattle to Chicago flights departing on `date`
    pub fn flights(date: &str) -> Vec<Record> {
        vec![
            flight("United Airlines", "UA 1234", date, ("08:00 AM", "02:15 PM"), "$320", "ORD (Chicago)"),
            flight("Alaska Airlines", "AS 5678", date, ("10:30 AM", "04:45 PM"), "$295", "ORD (Chicago)"),
            flight(
                "Southwest Airlines",
                "WN 9012",
                date,
                ("06:00 AM", "12:15 PM"),
                "$275",
                "MDW (Chicago Midway)",
            ),
        ]
    }

    struct Hotel {
        name: &'static str,
        address: &'static str,
        distance: &'static str,
        rating: &'static str,
        reviews: &'static str,
        price_per_night: &'static str,
        total_price: &'static str,
        amenities: [&'static str; 4],
        description: &'static str,
    }

    impl From<&Hotel> for Record {
        fn from(hotel: &Hotel) -> Self {
            Self::from([
                ("name", hotel.name),
                ("address", hotel.address),
                ("distance_to_venue", hotel.distance),
                ("rating", hotel.rating),
                ("reviews", hotel.reviews),
                ("price_per_night", hotel.price_per_night),
                ("total_price", hotel.total_price),
                ("description", hotel.description),
            ])
            .with("amenities", hotel.amenities.to_vec())
        }
    }

    const HOTELS: [Hotel; 4] = [
        Hotel {
            name: "Hyatt Regency McCormick Place",
            address: "2233 S Dr Martin Luther King Jr Dr, Chicago, IL 60616",
            distance: "0.2 miles (5 min walk)",
            rating: "4.3",
            reviews: "2,847 reviews",
            price_per_night: "$189",
            total_price: "$756 (4 nights)",
            amenities: ["Free WiFi", "Gym", "Restaurant", "Connected to convention center"],
            description: "Connected directly to McCormick Place via skybridge.",
        },
        Hotel {
            name: "Hotel Chicago Downtown, Autograph Collection",
            address: "1 W Washington St, Chicago, IL 60602",
            distance: "4.2 miles (12 min drive)",
            rating: "4.5",
            reviews: "1,234 reviews",
            price_per_night: "$175",
            total_price: "$700 (4 nights)",
            amenities: ["Free WiFi", "Gym", "Rooftop bar", "Downtown location"],
            description: "Stylish downtown hotel with easy transit access to McCormick Place.",
        },
        Hotel {
            name: "Fairfield Inn & Suites Chicago Downtown/River North",
            address: "216 E Ontario St, Chicago, IL 60611",
            distance: "5.1 miles (15 min drive)",
            rating: "4.2",
            reviews: "956 reviews",
            price_per_night: "$149",
            total_price: "$596 (4 nights)",
            amenities: ["Free breakfast", "Free WiFi", "Gym", "Near Magnificent Mile"],
            description: "Budget-friendly option in River North with complimentary breakfast.",
        },
        Hotel {
            name: "Residence Inn Chicago Downtown/Loop",
            address: "11 S LaSalle St, Chicago, IL 60603",
            distance: "4.5 miles (13 min drive)",
            rating: "4.4",
            reviews: "1,567 reviews",
            price_per_night: "$195",
            total_price: "$780 (4 nights)",
            amenities: ["Free breakfast", "Kitchenette", "Free WiFi", "Gym"],
            description: "Extended-stay hotel in the Loop with full kitchens in rooms.",
        },
    ];

    /// Hotels near the conference venue
    pub fn hotels() -> Vec<Record> {
        HOTELS.iter().map(Record::from).collect()
    }

    fn articles(category: &str) -> Vec<Record> {
        let sources = [("Reuters", "reuters.com"), ("AP News", "apnews.com"), ("The Verge", "theverge.com")];
        sources
            .iter()
            .enumerate()
            .map(|(i, &(source, host))| {
                let title = format!("{category} headline {}", i + 1);
                let url = format!("https://{host}/{category}/{}", i + 1);
                let description = format!("Latest {category} coverage from {source}.");
                Record::from([
                    ("title", title.as_str()),
                    ("author", "Staff"),
                    ("source", source),
                    ("url", url.as_str()),
                    ("description", description.as_str()),
                ])
            })
            .collect()
    }

    fn postings(category: &str) -> Vec<Record> {
        let companies = ["Contoso", "Fabrikam", "Northwind"];
        companies
            .iter()
            .enumerate()
            .map(|(i, &company)| {
                let title = format!("{category} role {}", i + 1);
                let url = format!("https://jobs.example.com/{category}/{}", i + 1);
                let description = format!("Join {company} on the {category} team.");
                Record::from([
                    ("title", title.as_str()),
                    ("company", company),
                    ("location", "Seattle, WA"),
                    ("url", url.as_str()),
                    ("description", description.as_str()),
                ])
            })
            .collect()
    }

    /// Fixture records for one category of a domain
    pub fn for_category(domain: Domain, category: &str, travel_date: &str) -> Vec<Record> {
        match domain {
            Domain::News => articles(category),
            Domain::Jobs => postings(category),
            Domain::Travel if category == "hotels" => hotels(),
            Domain::Travel => flights(travel_date),
        }
    }
}

#[derive(Clone, Debug)]
enum Scripted {
    Body(String),
    Fail(String),
}

/// Search client backed by fixtures or per-category scripts
///
/// Categories with no script get fixtures when a domain was given,
/// otherwise an empty list.
#[derive(Default)]
pub struct MockSearchClient {
    domain: Option<Domain>,
    scripted: HashMap<String, Scripted>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<SearchRequest>>,
}

impl MockSearchClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixtures(domain: Domain) -> Self {
        Self {
            domain: Some(domain),
            ..Self::default()
        }
    }

    /// Answer `category` with these records
    #[must_use]
    pub fn with_records(self, category: &str, records: Vec<Record>) -> Self {
        let body = serde_json::to_string(&records).unwrap_or_else(|_| "[]".into());
        self.with_body(category, body)
    }

    /// Answer `category` with raw text, which need not be valid JSON
    #[must_use]
    pub fn with_body(mut self, category: &str, body: impl Into<String>) -> Self {
        self.scripted
            .insert(category.to_string(), Scripted::Body(body.into()));
        self
    }

    /// Make `category` return an error
    #[must_use]
    pub fn failing(mut self, category: &str, reason: impl Into<String>) -> Self {
        self.scripted
            .insert(category.to_string(), Scripted::Fail(reason.into()));
        self
    }

    /// Delay answers for `category`
    #[must_use]
    pub fn with_delay(mut self, category: &str, delay: Duration) -> Self {
        self.delays.insert(category.to_string(), delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Categories requested, in call order
    pub async fn requested_categories(&self) -> Vec<String> {
        self.requests
            .lock()
            .await
            .iter()
            .map(|r| r.category.to_string())
            .collect()
    }
}

#[async_trait]
impl SearchClient for MockSearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request.clone());

        let category = request.category.as_str();
        if let Some(delay) = self.delays.get(category) {
            tokio::time::sleep(*delay).await;
        }

        match self.scripted.get(category) {
            Some(Scripted::Body(body)) => Ok(body.clone()),
            Some(Scripted::Fail(reason)) => Err(PipelineError::Search(reason.clone())),
            None => {
                let records = self.domain.map_or_else(Vec::new, |domain| {
                    let date = super::travel::travel_dates(request.param("travel_dates")).0;
                    fixtures::for_category(domain, category, &date)
                        .into_iter()
                        .take(request.limit)
                        .collect()
                });
                records_payload(&records)
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
