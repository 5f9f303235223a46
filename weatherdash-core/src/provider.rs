use crate::{
    Config,
    model::{Coordinates, InstantReading, Location, Snapshot},
    provider::{mock::MockBackend, openweather::OpenWeatherBackend},
    units::UnitSystem,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::{convert::TryFrom, fmt::Debug};

pub mod mock;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendId {
    OpenWeather,
    Mock,
}

impl BackendId {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendId::OpenWeather => "openweather",
            BackendId::Mock => "mock",
        }
    }

    pub const fn all() -> &'static [BackendId] {
        &[BackendId::OpenWeather, BackendId::Mock]
    }
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for BackendId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(BackendId::OpenWeather),
            "mock" => Ok(BackendId::Mock),
            _ => Err(anyhow::anyhow!(
                "Unknown backend '{value}'. Supported backends: openweather, mock."
            )),
        }
    }
}

/// Name lookups. An empty result means "no match", not a failure.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn geocode(&self, city: &str) -> anyhow::Result<Vec<Location>>;

    async fn reverse_geocode(&self, coords: Coordinates) -> anyhow::Result<Vec<Location>>;
}

/// Current, hourly, daily and alert data for a resolved location.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch(&self, location: &Location, unit: UnitSystem) -> anyhow::Result<Snapshot>;
}

/// Single past reading. `Ok(None)` means the call succeeded but carried no data.
#[async_trait]
pub trait HistoricalProvider: Send + Sync + Debug {
    async fn fetch_historical(
        &self,
        location: &Location,
        date: NaiveDate,
        unit: UnitSystem,
    ) -> anyhow::Result<Option<InstantReading>>;
}

/// Everything the dashboard needs from one data source.
pub trait Backend: Geocoder + WeatherProvider + HistoricalProvider {
    fn id(&self) -> BackendId;
}

/// Unix timestamp of the first second of `date`, in UTC.
pub fn day_start_timestamp(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}

/// Construct the backend selected in config.
pub fn backend_from_config(config: &Config) -> anyhow::Result<Box<dyn Backend>> {
    let id = config.backend_id()?;

    let boxed: Box<dyn Backend> = match id {
        BackendId::Mock => Box::new(MockBackend::new(config.mock_delay())),
        BackendId::OpenWeather => {
            let api_key = config.api_key().ok_or_else(|| {
                anyhow::anyhow!(
                    "No API key configured for backend '{id}'.\n\
                         Hint: run `weatherdash configure` or set WEATHERDASH_API_KEY."
                )
            })?;
            Box::new(OpenWeatherBackend::new(
                api_key.to_owned(),
                config.endpoints.clone(),
                config.request_timeout(),
            )?)
        }
    };

    tracing::debug!(backend = %boxed.id(), "backend selected");
    Ok(boxed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn backend_id_as_str_roundtrip() {
        for id in BackendId::all() {
            let s = id.as_str();
            let parsed = BackendId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_backend_error() {
        let err = BackendId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown backend"));
    }

    #[test]
    fn backend_from_config_errors_when_missing_api_key() {
        let mut cfg = Config::default();
        cfg.set_backend(BackendId::OpenWeather);
        let err = backend_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured for backend"));
    }

    #[test]
    fn backend_from_config_defaults_to_mock() {
        let backend = backend_from_config(&Config::default()).expect("mock needs no key");
        assert_eq!(backend.id(), BackendId::Mock);
    }

    #[test]
    fn backend_from_config_works_when_key_present() {
        let mut cfg = Config::default();
        cfg.set_backend(BackendId::OpenWeather);
        cfg.api_key = Some("KEY".to_string());

        let backend = backend_from_config(&cfg).expect("configured");
        assert_eq!(backend.id(), BackendId::OpenWeather);
    }

    #[test]
    fn day_start_is_utc_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).expect("valid date");
        assert_eq!(day_start_timestamp(date), 1_704_153_600);
    }
}
