use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::{
    config::Endpoints,
    model::{Coordinates, HistoricalRecord, InstantReading, Location, Snapshot, normalize_instant},
    provider::{Backend, BackendId, day_start_timestamp},
    units::UnitSystem,
};

use super::{Geocoder, HistoricalProvider, WeatherProvider};

/// OpenWeather one-call backend.
#[derive(Debug, Clone)]
pub struct OpenWeatherBackend {
    api_key: String,
    endpoints: Endpoints,
    http: Client,
}

impl OpenWeatherBackend {
    pub fn new(api_key: String, endpoints: Endpoints, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { api_key, endpoints, http })
    }

    /// GET `url` and return the body of a successful response.
    async fn get_body(&self, url: &str, query: &[(&str, String)], what: &str) -> Result<String> {
        debug!(url, what, "sending request");

        let res = self
            .http
            .get(url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read OpenWeather {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather {} request failed with status {}: {}",
                what,
                status,
                truncate_body(&body),
            ));
        }

        Ok(body)
    }

    async fn lookup(&self, query: &[(&str, String)], what: &str) -> Result<Vec<Location>> {
        let body = self.get_body(&self.endpoints.geocode_url, query, what).await?;

        let parsed: Vec<OwGeoMatch> = serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse OpenWeather {what} JSON"))?;

        Ok(parsed.into_iter().map(Location::from).collect())
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoMatch {
    lat: f64,
    lon: f64,
    name: String,
    #[serde(default)]
    country: String,
}

impl From<OwGeoMatch> for Location {
    fn from(m: OwGeoMatch) -> Self {
        Location { lat: m.lat, lon: m.lon, name: m.name, country: m.country }
    }
}

fn coordinate_query(lat: f64, lon: f64) -> Vec<(&'static str, String)> {
    vec![("lat", lat.to_string()), ("lon", lon.to_string())]
}

#[async_trait]
impl Geocoder for OpenWeatherBackend {
    async fn geocode(&self, city: &str) -> Result<Vec<Location>> {
        let query = [("q", city.to_string()), ("limit", "1".to_string())];
        self.lookup(&query, "geocoding").await
    }

    async fn reverse_geocode(&self, coords: Coordinates) -> Result<Vec<Location>> {
        let mut query = coordinate_query(coords.lat, coords.lon);
        query.push(("limit", "1".to_string()));
        self.lookup(&query, "reverse geocoding").await
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherBackend {
    async fn fetch(&self, location: &Location, unit: UnitSystem) -> Result<Snapshot> {
        let url = format!("{}/onecall", self.endpoints.base_url.trim_end_matches('/'));

        let mut query = coordinate_query(location.lat, location.lon);
        query.push(("exclude", "minutely".to_string()));
        query.push(("units", unit.as_str().to_string()));

        let body = self.get_body(&url, &query, "one call").await?;

        let parsed: Snapshot =
            serde_json::from_str(&body).context("Failed to parse OpenWeather one call JSON")?;

        Ok(parsed.normalize())
    }
}

#[async_trait]
impl HistoricalProvider for OpenWeatherBackend {
    async fn fetch_historical(
        &self,
        location: &Location,
        date: NaiveDate,
        unit: UnitSystem,
    ) -> Result<Option<InstantReading>> {
        let mut query = coordinate_query(location.lat, location.lon);
        query.push(("dt", day_start_timestamp(date).to_string()));
        query.push(("units", unit.as_str().to_string()));

        let body = self.get_body(&self.endpoints.history_url, &query, "historical").await?;

        Ok(decode_historical(&body)?.map(|mut reading| {
            normalize_instant("historical", &mut reading);
            reading
        }))
    }
}

impl Backend for OpenWeatherBackend {
    fn id(&self) -> BackendId {
        BackendId::OpenWeather
    }
}

/// An empty body, `null` and a record without `current` all mean "no data".
fn decode_historical(body: &str) -> Result<Option<InstantReading>> {
    if body.trim().is_empty() {
        return Ok(None);
    }

    let parsed: Option<HistoricalRecord> =
        serde_json::from_str(body).context("Failed to parse OpenWeather historical JSON")?;

    Ok(parsed.and_then(|record| record.current))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
