use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::time::Duration;
use tracing::debug;

use crate::{
    mock::{MOCK_COUNTRY, MOCK_LAT, MOCK_LON, MockGenerator},
    model::{Coordinates, InstantReading, Location, Snapshot},
    provider::{Backend, BackendId, day_start_timestamp},
    resolver::DEVICE_FALLBACK_NAME,
    units::UnitSystem,
};

use super::{Geocoder, HistoricalProvider, WeatherProvider};

/// Offline backend: pinned coordinates and generated weather.
#[derive(Debug, Clone)]
pub struct MockBackend {
    delay: Duration,
}

impl MockBackend {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    async fn simulate_latency(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    fn pinned(name: &str) -> Location {
        Location {
            lat: MOCK_LAT,
            lon: MOCK_LON,
            name: name.to_string(),
            country: MOCK_COUNTRY.to_string(),
        }
    }
}

#[async_trait]
impl Geocoder for MockBackend {
    async fn geocode(&self, city: &str) -> Result<Vec<Location>> {
        Ok(vec![Self::pinned(city.trim())])
    }

    async fn reverse_geocode(&self, _coords: Coordinates) -> Result<Vec<Location>> {
        Ok(vec![Self::pinned(DEVICE_FALLBACK_NAME)])
    }
}

#[async_trait]
impl WeatherProvider for MockBackend {
    async fn fetch(&self, location: &Location, unit: UnitSystem) -> Result<Snapshot> {
        self.simulate_latency().await;
        debug!(location = %location.name, %unit, "generating mock snapshot");
        Ok(MockGenerator::from_entropy().snapshot(Utc::now().timestamp()))
    }
}

#[async_trait]
impl HistoricalProvider for MockBackend {
    async fn fetch_historical(
        &self,
        _location: &Location,
        date: NaiveDate,
        _unit: UnitSystem,
    ) -> Result<Option<InstantReading>> {
        self.simulate_latency().await;
        debug!(%date, "generating mock historical reading");
        Ok(MockGenerator::from_entropy().historical(day_start_timestamp(date)).current)
    }
}

impl Backend for MockBackend {
    fn id(&self) -> BackendId {
        BackendId::Mock
    }
}
