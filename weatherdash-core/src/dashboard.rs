//! Session state and the fetch-then-present flow that drives it.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    Config,
    error::{DashboardError, Result},
    model::{Coordinates, Location, LocationQuery, Snapshot},
    presenter::{DashboardView, HistoricalView, present, present_historical},
    provider::{Backend, BackendId, HistoricalProvider, WeatherProvider, backend_from_config},
    resolver::LocationResolver,
    units::UnitSystem,
};

/// Why device coordinates could not be obtained.
#[derive(Debug, Clone, Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    Denied,
    #[error("geolocation is not supported")]
    Unsupported,
    #[error("location unavailable: {0}")]
    Unavailable(String),
}

/// What the dashboard currently shows.
///
/// Unit, location and snapshot are only ever replaced together.
#[derive(Debug, Clone, Default)]
pub struct Session {
    unit: UnitSystem,
    location: Option<Location>,
    snapshot: Option<Snapshot>,
}

impl Session {
    pub fn new(unit: UnitSystem) -> Self {
        Self { unit, location: None, snapshot: None }
    }

    pub fn unit(&self) -> UnitSystem {
        self.unit
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    fn install(&mut self, unit: UnitSystem, location: Location, snapshot: Snapshot) {
        self.unit = unit;
        self.location = Some(location);
        self.snapshot = Some(snapshot);
    }
}

pub struct Dashboard {
    backend: Box<dyn Backend>,
    session: Session,
    default_city: String,
    fallback_city: String,
}

impl Dashboard {
    pub fn new(
        backend: Box<dyn Backend>,
        unit: UnitSystem,
        default_city: impl Into<String>,
        fallback_city: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            session: Session::new(unit),
            default_city: default_city.into(),
            fallback_city: fallback_city.into(),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let backend = backend_from_config(config)?;
        Ok(Self::new(backend, config.units, &config.default_city, &config.fallback_city))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn backend_id(&self) -> BackendId {
        self.backend.id()
    }

    /// Re-present what is installed, without fetching.
    pub fn view(&self) -> Option<DashboardView> {
        let location = self.session.location()?;
        let snapshot = self.session.snapshot()?;
        Some(present(snapshot, location, self.session.unit()))
    }

    /// Initial load: the configured default city.
    pub async fn start(&mut self) -> Result<DashboardView> {
        let city = self.default_city.clone();
        self.search(&city).await
    }

    pub async fn search(&mut self, city: &str) -> Result<DashboardView> {
        let unit = self.session.unit();
        self.load(LocationQuery::City(city.to_string()), unit).await
    }

    /// Weather for the device position, or the fallback city when the
    /// position is unavailable or its weather cannot be fetched.
    pub async fn locate(
        &mut self,
        position: std::result::Result<Coordinates, GeolocationError>,
    ) -> Result<DashboardView> {
        let fallback = self.fallback_city.clone();

        let coords = match position {
            Ok(coords) => coords,
            Err(e) => {
                warn!("geolocation failed ({e}), using {fallback}");
                return self.search(&fallback).await;
            }
        };

        let unit = self.session.unit();
        match self.load(LocationQuery::Coordinates(coords), unit).await {
            Ok(view) => Ok(view),
            Err(e) => {
                warn!("weather for device location failed ({e}), using {fallback}");
                self.search(&fallback).await
            }
        }
    }

    /// Switch units and refetch the current location by name.
    ///
    /// Returns `Ok(None)` when the unit is unchanged or nothing is loaded yet.
    /// The new unit is only kept once its snapshot has been installed.
    pub async fn switch_unit(&mut self, unit: UnitSystem) -> Result<Option<DashboardView>> {
        if self.session.unit == unit {
            return Ok(None);
        }

        let Some(name) = self.session.location().map(|l| l.name.clone()) else {
            self.session.unit = unit;
            info!(%unit, "unit switched");
            return Ok(None);
        };

        let view = self.load(LocationQuery::City(name), unit).await?;
        info!(%unit, "unit switched");
        Ok(Some(view))
    }

    /// Weather on a past date at the current location.
    pub async fn history(&self, date: Option<NaiveDate>, today: NaiveDate) -> Result<HistoricalView> {
        let location = self
            .session
            .location()
            .ok_or_else(|| DashboardError::InvalidState("Please select a location first".into()))?;

        let date = date.ok_or_else(|| DashboardError::InvalidInput("Please select a date".into()))?;
        if date >= today {
            return Err(DashboardError::InvalidInput(format!(
                "Historical data is only available up to {}",
                today.pred_opt().unwrap_or(today)
            )));
        }

        let unit = self.session.unit();
        let reading = self
            .backend
            .fetch_historical(location, date, unit)
            .await
            .map_err(|e| log_failure(DashboardError::Fetch(e)))?
            .ok_or(DashboardError::Unavailable(date))?;

        Ok(present_historical(&reading, date, unit))
    }

    async fn load(&mut self, query: LocationQuery, unit: UnitSystem) -> Result<DashboardView> {
        let location = LocationResolver::new(self.backend.as_ref())
            .resolve(query)
            .await
            .map_err(log_failure)?;

        let snapshot = self
            .backend
            .fetch(&location, unit)
            .await
            .map_err(|e| log_failure(DashboardError::Fetch(e)))?;

        info!(
            location = %location.display_name(),
            %unit,
            hourly = snapshot.hourly.len(),
            daily = snapshot.daily.len(),
            "snapshot installed"
        );
        let view = present(&snapshot, &location, unit);
        self.session.install(unit, location, snapshot);
        Ok(view)
    }
}

fn log_failure(err: DashboardError) -> DashboardError {
    match &err {
        DashboardError::Fetch(cause) => error!("fetch failed: {cause:#}"),
        other => warn!("{other}"),
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::InstantReading,
        provider::{Geocoder, mock::MockBackend},
        resolver::DEVICE_FALLBACK_NAME,
    };
    use async_trait::async_trait;
    use std::{
        sync::{
            Arc, Mutex,
            atomic::{AtomicBool, AtomicUsize, Ordering},
        },
        time::Duration,
    };

    #[derive(Debug, Default)]
    struct Calls {
        geocode: AtomicUsize,
        fetch: AtomicUsize,
        historical: AtomicUsize,
        units: Mutex<Vec<UnitSystem>>,
        fail_fetch: AtomicBool,
    }

    /// Backend that knows a fixed set of cities and records what it was asked.
    #[derive(Debug)]
    struct ScriptedBackend {
        known: Vec<Location>,
        historical: Option<InstantReading>,
        calls: Arc<Calls>,
    }

    #[async_trait]
    impl Geocoder for ScriptedBackend {
        async fn geocode(&self, city: &str) -> anyhow::Result<Vec<Location>> {
            self.calls.geocode.fetch_add(1, Ordering::SeqCst);
            Ok(self.known.iter().filter(|l| l.name == city).cloned().collect())
        }

        async fn reverse_geocode(&self, _coords: Coordinates) -> anyhow::Result<Vec<Location>> {
            anyhow::bail!("reverse geocoding offline")
        }
    }

    #[async_trait]
    impl WeatherProvider for ScriptedBackend {
        async fn fetch(&self, location: &Location, unit: UnitSystem) -> anyhow::Result<Snapshot> {
            self.calls.fetch.fetch_add(1, Ordering::SeqCst);
            self.calls.units.lock().expect("lock").push(unit);
            if self.calls.fail_fetch.load(Ordering::SeqCst) {
                anyhow::bail!("connection reset");
            }
            let mut snap = crate::mock::MockGenerator::seeded(1).snapshot(0);
            snap.lat = location.lat;
            snap.lon = location.lon;
            snap.current.temp = match unit {
                UnitSystem::Metric => 10.0,
                UnitSystem::Imperial => 50.0,
            };
            Ok(snap)
        }
    }

    #[async_trait]
    impl HistoricalProvider for ScriptedBackend {
        async fn fetch_historical(
            &self,
            _location: &Location,
            _date: NaiveDate,
            _unit: UnitSystem,
        ) -> anyhow::Result<Option<InstantReading>> {
            self.calls.historical.fetch_add(1, Ordering::SeqCst);
            Ok(self.historical.clone())
        }
    }

    impl Backend for ScriptedBackend {
        fn id(&self) -> BackendId {
            BackendId::OpenWeather
        }
    }

    fn city(name: &str, lat: f64) -> Location {
        Location { lat, lon: 0.0, name: name.into(), country: "XX".into() }
    }

    fn scripted(historical: Option<InstantReading>) -> (Dashboard, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let backend = ScriptedBackend {
            known: vec![city("Oslo", 59.9), city("London", 51.5)],
            historical,
            calls: calls.clone(),
        };
        (Dashboard::new(Box::new(backend), UnitSystem::Metric, "Oslo", "London"), calls)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[tokio::test]
    async fn mock_kathmandu_scenario() {
        let mut dash = Dashboard::new(
            Box::new(MockBackend::new(Duration::ZERO)),
            UnitSystem::Metric,
            "Kathmandu",
            "London",
        );
        let view = dash.start().await.expect("mock never fails");

        let loc = dash.session().location().expect("installed");
        assert_eq!(
            *loc,
            Location { lat: 51.5074, lon: -0.1278, name: "Kathmandu".into(), country: "Nepal".into() }
        );
        let snap = dash.session().snapshot().expect("installed");
        assert_eq!(snap.hourly.len(), 24);
        assert_eq!(snap.daily.len(), 5);
        assert!(snap.invariant_violations().is_empty());
        assert_eq!(view.current.location, "Kathmandu, Nepal");
    }

    #[tokio::test]
    async fn successful_search_installs_location_and_snapshot_together() {
        let (mut dash, _) = scripted(None);
        dash.search("Oslo").await.expect("known city");
        let loc = dash.session().location().expect("location");
        let snap = dash.session().snapshot().expect("snapshot");
        assert_eq!(loc.name, "Oslo");
        assert_eq!(snap.lat, loc.lat);
    }

    #[tokio::test]
    async fn not_found_leaves_previous_state() {
        let (mut dash, calls) = scripted(None);
        dash.search("Oslo").await.expect("known city");
        let before = dash.session().snapshot().cloned();

        let err = dash.search("Qwxzv").await.unwrap_err();
        assert!(matches!(err, DashboardError::NotFound(_)));
        assert_eq!(dash.session().snapshot().cloned(), before);
        assert_eq!(dash.session().location().map(|l| l.name.as_str()), Some("Oslo"));
        assert_eq!(calls.fetch.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_failure_leaves_previous_state() {
        let (mut dash, calls) = scripted(None);
        dash.search("Oslo").await.expect("known city");
        let before = dash.session().snapshot().cloned();

        calls.fail_fetch.store(true, Ordering::SeqCst);
        let err = dash.search("London").await.unwrap_err();
        assert!(matches!(err, DashboardError::Fetch(_)));
        assert_eq!(dash.session().location().map(|l| l.name.as_str()), Some("Oslo"));
        assert_eq!(dash.session().snapshot().cloned(), before);
    }

    #[tokio::test]
    async fn empty_input_issues_no_call() {
        let (mut dash, calls) = scripted(None);
        let err = dash.search("  ").await.unwrap_err();
        assert!(matches!(err, DashboardError::InvalidInput(_)));
        assert_eq!(calls.geocode.load(Ordering::SeqCst), 0);
        assert!(dash.session().snapshot().is_none());
    }

    #[tokio::test]
    async fn unit_switch_round_trip_refetches() {
        let (mut dash, calls) = scripted(None);
        dash.search("Oslo").await.expect("known city");
        let first = dash.session().snapshot().cloned().expect("snapshot");
        assert_eq!(first.current.temp, 10.0);

        let imperial = dash.switch_unit(UnitSystem::Imperial).await.expect("refetch");
        assert_eq!(imperial.map(|v| v.current.temperature), Some("50°".to_string()));
        assert_eq!(dash.session().unit(), UnitSystem::Imperial);
        let second = dash.session().snapshot().cloned().expect("snapshot");
        assert_eq!(second.current.temp, 50.0);
        assert_eq!(first.current.temp, 10.0);

        dash.switch_unit(UnitSystem::Metric).await.expect("refetch");
        assert_eq!(dash.session().snapshot().map(|s| s.current.temp), Some(10.0));
        assert_eq!(second.current.temp, 50.0);
        assert_eq!(calls.fetch.load(Ordering::SeqCst), 3);
        assert_eq!(calls.geocode.load(Ordering::SeqCst), 3);
        assert_eq!(
            *calls.units.lock().expect("lock"),
            vec![UnitSystem::Metric, UnitSystem::Imperial, UnitSystem::Metric]
        );
    }

    #[tokio::test]
    async fn failed_unit_switch_keeps_previous_unit_and_snapshot() {
        let (mut dash, calls) = scripted(None);
        dash.search("Oslo").await.expect("known city");
        let before = dash.session().snapshot().cloned();
        let view_before = dash.view();

        calls.fail_fetch.store(true, Ordering::SeqCst);
        let err = dash.switch_unit(UnitSystem::Imperial).await.unwrap_err();
        assert!(matches!(err, DashboardError::Fetch(_)));
        assert_eq!(dash.session().unit(), UnitSystem::Metric);
        assert_eq!(dash.session().snapshot().cloned(), before);
        assert_eq!(dash.view(), view_before);

        calls.fail_fetch.store(false, Ordering::SeqCst);
        dash.switch_unit(UnitSystem::Imperial).await.expect("retry succeeds");
        assert_eq!(dash.session().unit(), UnitSystem::Imperial);
    }

    #[tokio::test]
    async fn same_unit_or_nothing_loaded_is_a_noop() {
        let (mut dash, calls) = scripted(None);
        assert!(dash.switch_unit(UnitSystem::Metric).await.expect("noop").is_none());
        assert!(dash.switch_unit(UnitSystem::Imperial).await.expect("noop").is_none());
        assert_eq!(dash.session().unit(), UnitSystem::Imperial);
        assert_eq!(calls.fetch.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn history_without_location_is_invalid_state() {
        let (dash, calls) = scripted(None);
        let err = dash.history(Some(date(2024, 1, 1)), date(2024, 2, 1)).await.unwrap_err();
        assert!(matches!(err, DashboardError::InvalidState(_)));
        assert_eq!(calls.historical.load(Ordering::SeqCst), 0);
        assert!(dash.session().snapshot().is_none());
    }

    #[tokio::test]
    async fn history_requires_a_past_date() {
        let (mut dash, calls) = scripted(None);
        dash.search("Oslo").await.expect("known city");

        let missing = dash.history(None, date(2024, 2, 1)).await.unwrap_err();
        assert!(matches!(missing, DashboardError::InvalidInput(_)));

        let today = dash.history(Some(date(2024, 2, 1)), date(2024, 2, 1)).await.unwrap_err();
        assert!(matches!(today, DashboardError::InvalidInput(_)));
        assert_eq!(calls.historical.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn history_without_data_is_unavailable() {
        let (mut dash, _) = scripted(None);
        dash.search("Oslo").await.expect("known city");
        let err = dash.history(Some(date(2024, 1, 31)), date(2024, 2, 1)).await.unwrap_err();
        assert!(matches!(err, DashboardError::Unavailable(d) if d == date(2024, 1, 31)));
        assert!(!err.is_failure());
    }

    #[tokio::test]
    async fn history_with_mock_backend_presents_the_reading() {
        let mut dash = Dashboard::new(
            Box::new(MockBackend::new(Duration::ZERO)),
            UnitSystem::Imperial,
            "Kathmandu",
            "London",
        );
        dash.start().await.expect("mock never fails");
        let view = dash.history(Some(date(1990, 5, 4)), date(2024, 2, 1)).await.expect("data");
        assert_eq!(view.title, "Weather on 1990-05-04");
        assert!(view.wind.ends_with(" mph"));
        assert!(view.pressure.ends_with(" hPa"));
        assert!(!view.conditions.is_empty());
    }

    #[tokio::test]
    async fn denied_geolocation_falls_back_to_default_location() {
        let (mut dash, _) = scripted(None);
        let view = dash.locate(Err(GeolocationError::Denied)).await.expect("fallback");
        assert_eq!(view.current.location, "London, XX");
    }

    #[tokio::test]
    async fn unnamed_device_position_still_fetches() {
        let (mut dash, calls) = scripted(None);
        let view = dash.locate(Ok(Coordinates { lat: 1.0, lon: 2.0 })).await.expect("fetched");
        assert_eq!(view.current.location, format!("{DEVICE_FALLBACK_NAME}, "));
        assert_eq!(dash.session().location().map(|l| l.lat), Some(1.0));
        assert_eq!(calls.fetch.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn device_fetch_failure_falls_back_then_reports() {
        let (mut dash, calls) = scripted(None);
        calls.fail_fetch.store(true, Ordering::SeqCst);
        let err = dash.locate(Ok(Coordinates { lat: 1.0, lon: 2.0 })).await.unwrap_err();
        assert!(matches!(err, DashboardError::Fetch(_)));
        // device attempt plus the fallback city
        assert_eq!(calls.fetch.load(Ordering::SeqCst), 2);
        assert!(dash.session().location().is_none());
    }

    #[tokio::test]
    async fn view_reflects_installed_state() {
        let (mut dash, _) = scripted(None);
        assert!(dash.view().is_none());
        let fetched = dash.search("Oslo").await.expect("known city");
        assert_eq!(dash.view(), Some(fetched));
    }
}
