//! Synthetic weather data for development and demos.
//!
//! Values are random but shaped: hourly and daily temperatures follow a
//! sine curve plus a little noise so charts stay smooth, and the hourly
//! condition is fixed by the hour offset so icons progress sensibly from
//! night to day.

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};

use crate::model::{
    Alert, ConditionKind, DailyReading, DailyTemperature, HistoricalRecord, HourlyReading,
    InstantReading, Snapshot, WeatherCondition,
};

pub const MOCK_LAT: f64 = 51.5074;
pub const MOCK_LON: f64 = -0.1278;
pub const MOCK_COUNTRY: &str = "Nepal";
pub const MOCK_TIMEZONE: &str = "Asia/Kathmandu";
pub const MOCK_TIMEZONE_OFFSET: i32 = 3600;

pub const HOURLY_COUNT: usize = 24;
pub const DAILY_COUNT: usize = 5;

const HOUR: i64 = 3600;
const DAY: i64 = 86_400;
const HALF_DAYLIGHT: i64 = 36_000;

const ALERT_EVENTS: [&str; 3] = ["Heat Wave", "Storm Warning", "Flood Alert"];
const ALERT_SENDER: &str = "Weather Service";
const ALERT_DESCRIPTION: &str =
    "Severe weather conditions expected in your area. Please take necessary precautions.";

/// Conditions a current or forecast slot may take.
pub fn forecast_catalog() -> Vec<WeatherCondition> {
    vec![
        WeatherCondition::new(800, ConditionKind::Clear, "clear sky", "01d"),
        WeatherCondition::new(801, ConditionKind::Clouds, "few clouds", "02d"),
        WeatherCondition::new(803, ConditionKind::Clouds, "broken clouds", "04d"),
        WeatherCondition::new(500, ConditionKind::Rain, "light rain", "10d"),
        WeatherCondition::new(600, ConditionKind::Snow, "light snow", "13d"),
        WeatherCondition::new(200, ConditionKind::Thunderstorm, "thunderstorm", "11d"),
    ]
}

/// Conditions a historical reading may take; a subset of the forecast catalog.
pub fn historical_catalog() -> Vec<WeatherCondition> {
    vec![
        WeatherCondition::new(800, ConditionKind::Clear, "clear sky", "01d"),
        WeatherCondition::new(801, ConditionKind::Clouds, "few clouds", "02d"),
        WeatherCondition::new(500, ConditionKind::Rain, "light rain", "10d"),
    ]
}

/// Hourly condition by hour offset: clear overnight, a few clouds by day.
pub fn hourly_condition(hour: usize) -> WeatherCondition {
    if hour > 18 || hour < 6 {
        WeatherCondition::new(800, ConditionKind::Clear, "clear sky", "01n")
    } else {
        WeatherCondition::new(801, ConditionKind::Clouds, "few clouds", "02d")
    }
}

/// Base temperature, sine amplitude and noise width for one daily facet.
#[derive(Debug, Clone, Copy)]
struct Band {
    base: f64,
    amplitude: f64,
    noise: f64,
}

impl Band {
    const fn new(base: f64, amplitude: f64, noise: f64) -> Self {
        Self { base, amplitude, noise }
    }

    /// One degree cooler, same shape.
    const fn cooler(self) -> Self {
        Self::new(self.base - 1.0, self.amplitude, self.noise)
    }
}

const DAY_BAND: Band = Band::new(15.0, 5.0, 3.0);
const MIN_BAND: Band = Band::new(10.0, 3.0, 2.0);
const MAX_BAND: Band = Band::new(20.0, 5.0, 3.0);
const NIGHT_BAND: Band = Band::new(12.0, 3.0, 2.0);
const EVE_BAND: Band = Band::new(16.0, 4.0, 2.0);
const MORN_BAND: Band = Band::new(13.0, 3.0, 2.0);

/// Temperature bands for single readings: `base + U[0, 15)`.
const CURRENT_TEMP_BASE: f64 = 15.0;
const HISTORICAL_TEMP_BASE: f64 = 10.0;
const TEMP_SPREAD: f64 = 15.0;

/// Generator of schema-valid weather records.
pub struct MockGenerator<R = StdRng> {
    rng: R,
}

impl MockGenerator<StdRng> {
    /// Generator seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_os_rng() }
    }

    /// Reproducible generator, mostly for tests and demos.
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl<R: Rng> MockGenerator<R> {
    /// Full snapshot anchored at `now` (unix seconds).
    pub fn snapshot(&mut self, now: i64) -> Snapshot {
        let catalog = forecast_catalog();
        let current = self.instant(now, CURRENT_TEMP_BASE, 10.0, &catalog);

        let hourly = (0..HOURLY_COUNT).map(|i| self.hourly(now, i)).collect();
        let daily = (0..DAILY_COUNT).map(|i| self.daily(now, i, &catalog)).collect();
        let alerts = self.alerts(now);

        Snapshot {
            lat: MOCK_LAT,
            lon: MOCK_LON,
            timezone: MOCK_TIMEZONE.to_string(),
            timezone_offset: MOCK_TIMEZONE_OFFSET,
            current,
            hourly,
            daily,
            alerts,
        }
    }

    /// Single reading for a past instant (unix seconds).
    pub fn historical(&mut self, timestamp: i64) -> HistoricalRecord {
        let catalog = historical_catalog();
        HistoricalRecord {
            current: Some(self.instant(timestamp, HISTORICAL_TEMP_BASE, 5.0, &catalog)),
        }
    }

    fn instant(
        &mut self,
        dt: i64,
        temp_base: f64,
        dew_base: f64,
        catalog: &[WeatherCondition],
    ) -> InstantReading {
        // feels_like is sampled independently, one degree below the temp band
        let temp = (temp_base + self.rng.random_range(0.0..TEMP_SPREAD)).round();
        let feels_like = (temp_base - 1.0 + self.rng.random_range(0.0..TEMP_SPREAD)).round();

        InstantReading {
            dt,
            sunrise: Some(dt - HALF_DAYLIGHT),
            sunset: Some(dt + HALF_DAYLIGHT),
            temp,
            feels_like,
            pressure: self.pressure(),
            humidity: self.humidity(),
            dew_point: dew_base + self.rng.random_range(0.0..5.0),
            uvi: self.rng.random_range(0.0..8.0),
            clouds: self.rng.random_range(0.0..100.0),
            visibility: 10_000.0,
            wind_speed: self.rng.random_range(0.0..10.0),
            wind_deg: self.rng.random_range(0.0..360.0),
            weather: vec![self.pick(catalog)],
        }
    }

    fn hourly(&mut self, now: i64, i: usize) -> HourlyReading {
        let wave = (i as f64 / 4.0).sin() * 8.0;
        let temp = (12.0 + wave + self.rng.random_range(0.0..3.0)).round();
        let feels_like = (11.0 + wave + self.rng.random_range(0.0..3.0)).round();

        let reading = InstantReading {
            dt: now + i as i64 * HOUR,
            sunrise: None,
            sunset: None,
            temp,
            feels_like,
            pressure: self.pressure(),
            humidity: self.humidity(),
            dew_point: 10.0 + self.rng.random_range(0.0..5.0),
            uvi: (5.0 - (12.0 - i as f64).abs()).max(0.0),
            clouds: self.rng.random_range(0.0..100.0),
            visibility: 10_000.0,
            wind_speed: self.rng.random_range(0.0..10.0),
            wind_deg: self.rng.random_range(0.0..360.0),
            weather: vec![hourly_condition(i)],
        };

        HourlyReading { reading, pop: self.pop(0.5) }
    }

    fn daily(&mut self, now: i64, i: usize, catalog: &[WeatherCondition]) -> DailyReading {
        let dt = now + i as i64 * DAY;
        let phase = (i as f64).sin();

        let temp = DailyTemperature {
            day: self.facet(DAY_BAND, phase),
            min: self.facet(MIN_BAND, phase),
            max: self.facet(MAX_BAND, phase),
            night: self.facet(NIGHT_BAND, phase),
            eve: self.facet(EVE_BAND, phase),
            morn: self.facet(MORN_BAND, phase),
        };
        let feels_like = DailyTemperature {
            day: self.facet(DAY_BAND.cooler(), phase),
            min: self.facet(MIN_BAND.cooler(), phase),
            max: self.facet(MAX_BAND.cooler(), phase),
            night: self.facet(NIGHT_BAND.cooler(), phase),
            eve: self.facet(EVE_BAND.cooler(), phase),
            morn: self.facet(MORN_BAND.cooler(), phase),
        };

        DailyReading {
            dt,
            sunrise: dt - HALF_DAYLIGHT,
            sunset: dt + HALF_DAYLIGHT,
            temp,
            feels_like,
            pressure: self.pressure(),
            humidity: self.humidity(),
            dew_point: 10.0 + self.rng.random_range(0.0..5.0),
            wind_speed: self.rng.random_range(0.0..10.0),
            wind_deg: self.rng.random_range(0.0..360.0),
            weather: vec![self.pick(catalog)],
            clouds: self.rng.random_range(0.0..100.0),
            pop: self.pop(0.7),
            uvi: 5.0 + self.rng.random_range(0.0..3.0),
        }
    }

    fn alerts(&mut self, now: i64) -> Option<Vec<Alert>> {
        if !self.rng.random_bool(0.3) {
            return None;
        }
        let event = ALERT_EVENTS[self.rng.random_range(0..ALERT_EVENTS.len())];
        Some(vec![Alert {
            sender_name: ALERT_SENDER.to_string(),
            event: event.to_string(),
            start: now,
            end: now + DAY,
            description: ALERT_DESCRIPTION.to_string(),
        }])
    }

    fn facet(&mut self, band: Band, phase: f64) -> f64 {
        (band.base + phase * band.amplitude + self.rng.random_range(0.0..band.noise)).round()
    }

    /// Zero most of the time; with 30% chance a value in `[0, max)`.
    fn pop(&mut self, max: f64) -> f64 {
        if self.rng.random_bool(0.3) { self.rng.random_range(0.0..max) } else { 0.0 }
    }

    fn pressure(&mut self) -> u32 {
        1000 + self.rng.random_range(0..20)
    }

    fn humidity(&mut self) -> u8 {
        40 + self.rng.random_range(0..50)
    }

    fn pick(&mut self, catalog: &[WeatherCondition]) -> WeatherCondition {
        catalog.choose(&mut self.rng).cloned().unwrap_or_else(WeatherCondition::unknown)
    }
}
