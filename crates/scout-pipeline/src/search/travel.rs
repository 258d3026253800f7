//! SerpAPI Google Flights / Google Hotels client
//!
//! Travel searches never surface an error: a missing key, a failed request
//! or an empty result all fall back to the built-in fixtures.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use super::mock::fixtures;
use super::{SERPAPI_BASE_URL, SearchClient, SearchRequest, http_client, records_payload};
use crate::error::Result;
use crate::model::Record;

pub const DEFAULT_DEPARTURE: &str = "2025-11-04";
pub const DEFAULT_RETURN: &str = "2025-11-07";
pub const DEFAULT_ORIGIN: &str = "SEA";
pub const DEFAULT_DESTINATION: &str = "ORD";
pub const DEFAULT_HOTEL_QUERY: &str = "hotels near McCormick Place Chicago";

const MAX_FLIGHTS: usize = 3;
const MAX_HOTELS: usize = 4;
const HOTEL_DESCRIPTION_CHARS: usize = 150;

/// Parse `YYYY-MM-DD to YYYY-MM-DD`, falling back to the default stay
pub fn travel_dates(raw: Option<&str>) -> (String, String) {
    let parsed = raw.and_then(|s| {
        let (start, end) = s.split_once(" to ")?;
        let start = NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d").ok()?;
        let end = NaiveDate::parse_from_str(end.trim(), "%Y-%m-%d").ok()?;
        (start <= end).then(|| (start.to_string(), end.to_string()))
    });

    parsed.unwrap_or_else(|| (DEFAULT_DEPARTURE.to_string(), DEFAULT_RETURN.to_string()))
}

fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

fn format_minutes(value: Option<&Value>) -> String {
    match value.and_then(Value::as_u64) {
        Some(minutes) => format!("{}h {}m", minutes / 60, minutes % 60),
        None => "N/A".into(),
    }
}

fn flight_record(offer: &Value, origin: &str, destination: &str) -> Record {
    let segments = offer
        .get("flights")
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice);
    let first = segments.first().unwrap_or(&Value::Null);
    let last = segments.last().unwrap_or(&Value::Null);
    let stops = match segments.len() {
        0 | 1 => "Direct".to_string(),
        n => format!("{} stop(s)", n - 1),
    };
    let price = offer
        .get("price")
        .map_or_else(|| "N/A".to_string(), |p| format!("${}", p.as_str().map_or_else(|| p.to_string(), str::to_string)));

    Record::new()
        .with("airline", str_at(first, "/airline").unwrap_or("Unknown"))
        .with("flight_number", str_at(first, "/flight_number").unwrap_or("N/A"))
        .with("departure_time", str_at(first, "/departure_airport/time").unwrap_or("N/A"))
        .with("arrival_time", str_at(last, "/arrival_airport/time").unwrap_or("N/A"))
        .with("duration", format_minutes(offer.get("total_duration")))
        .with("stops", stops)
        .with("price", price)
        .with("departure_airport", str_at(first, "/departure_airport/id").unwrap_or(origin))
        .with("arrival_airport", str_at(last, "/arrival_airport/id").unwrap_or(destination))
        .with("cabin_class", str_at(first, "/travel_class").unwrap_or("Economy"))
}

fn hotel_record(property: &Value) -> Record {
    let link = str_at(property, "/link").unwrap_or_default();
    let lowest = |pointer: &str| {
        str_at(property, pointer).map_or_else(|| "N/A".to_string(), str::to_string)
    };
    let amenities: Vec<Value> = property
        .get("amenities")
        .and_then(Value::as_array)
        .map(|a| a.iter().take(4).cloned().collect())
        .unwrap_or_default();
    let description: String = str_at(property, "/description")
        .unwrap_or_default()
        .chars()
        .take(HOTEL_DESCRIPTION_CHARS)
        .collect();

    Record::new()
        .with("name", str_at(property, "/name").unwrap_or("Unknown Hotel"))
        .with("address", str_at(property, "/address").unwrap_or(link))
        .with("link", link)
        .with(
            "distance_to_venue",
            str_at(property, "/nearby_places/0/transportations/0/duration").unwrap_or("N/A"),
        )
        .with(
            "rating",
            property
                .get("overall_rating")
                .map_or_else(|| "N/A".to_string(), Value::to_string),
        )
        .with(
            "reviews",
            format!(
                "{} reviews",
                property.get("reviews").and_then(Value::as_u64).unwrap_or(0)
            ),
        )
        .with("price_per_night", lowest("/rate_per_night/lowest"))
        .with("total_price", lowest("/total_rate/lowest"))
        .with("amenities", Value::Array(amenities))
        .with("description", format!("{description}..."))
}

/// SerpAPI travel searches, dispatched on the `flights` / `hotels` category
pub struct SerpApiTravelClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl SerpApiTravelClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            base_url: SERPAPI_BASE_URL.into(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get(&self, params: &[(&str, &str)]) -> reqwest::Result<Value> {
        self.client
            .get(format!("{}/search.json", self.base_url))
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    async fn search_flights(&self, api_key: &str, request: &SearchRequest) -> Vec<Record> {
        let (outbound, inbound) = travel_dates(request.param("travel_dates"));
        let origin = request.param("origin").unwrap_or(DEFAULT_ORIGIN);
        let destination = request.param("destination").unwrap_or(DEFAULT_DESTINATION);

        let params = [
            ("api_key", api_key),
            ("engine", "google_flights"),
            ("departure_id", origin),
            ("arrival_id", destination),
            ("outbound_date", outbound.as_str()),
            ("return_date", inbound.as_str()),
            ("currency", "USD"),
            ("hl", "en"),
        ];

        let flights: Vec<Record> = match self.get(&params).await {
            Ok(body) => body
                .get("best_flights")
                .and_then(Value::as_array)
                .map(|offers| {
                    offers
                        .iter()
                        .take(MAX_FLIGHTS)
                        .map(|o| flight_record(o, origin, destination))
                        .collect()
                })
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "SerpAPI flights failed, using fixtures");
                return fixtures::flights(&outbound).into_iter().take(2).collect();
            }
        };

        if flights.is_empty() {
            fixtures::flights(&outbound).into_iter().take(2).collect()
        } else {
            flights
        }
    }

    async fn search_hotels(&self, api_key: &str, request: &SearchRequest) -> Vec<Record> {
        let (check_in, check_out) = travel_dates(request.param("travel_dates"));
        let query = request.param("hotel_query").unwrap_or(DEFAULT_HOTEL_QUERY);

        let params = [
            ("api_key", api_key),
            ("engine", "google_hotels"),
            ("q", query),
            ("check_in_date", check_in.as_str()),
            ("check_out_date", check_out.as_str()),
            ("adults", "1"),
            ("currency", "USD"),
            ("gl", "us"),
            ("hl", "en"),
        ];

        let hotels: Vec<Record> = match self.get(&params).await {
            Ok(body) => body
                .get("properties")
                .and_then(Value::as_array)
                .map(|props| props.iter().take(MAX_HOTELS).map(hotel_record).collect())
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "SerpAPI hotels failed, using fixtures");
                Vec::new()
            }
        };

        if hotels.is_empty() {
            fixtures::hotels()
        } else {
            hotels
        }
    }
}

#[async_trait]
impl SearchClient for SerpApiTravelClient {
    async fn search(&self, request: &SearchRequest) -> Result<String> {
        let hotels = request.category.as_str() == "hotels";

        let Some(api_key) = self.api_key.as_deref() else {
            tracing::info!(category = %request.category, "No SERPAPI_API_KEY, using fixtures");
            let records = if hotels {
                fixtures::hotels()
            } else {
                fixtures::flights(&travel_dates(request.param("travel_dates")).0)
            };
            return records_payload(&records);
        };

        let records = if hotels {
            self.search_hotels(api_key, request).await
        } else {
            self.search_flights(api_key, request).await
        };
        records_payload(&records)
    }

    fn name(&self) -> &str {
        "serpapi-travel"
    }
}
