use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::warn;

static UNKNOWN_CONDITION: LazyLock<WeatherCondition> = LazyLock::new(WeatherCondition::unknown);

/// A resolved place. Replaced wholesale on every successful query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub country: String,
}

impl Location {
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates { lat: self.lat, lon: self.lon }
    }
}

/// Device position as reported by geolocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    City(String),
    Coordinates(Coordinates),
}

/// Condition group as reported in the `main` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionKind {
    Clear,
    Clouds,
    Rain,
    Snow,
    Thunderstorm,
    Drizzle,
    Mist,
    Smoke,
    Haze,
    Dust,
    Fog,
    Sand,
    Ash,
    Squall,
    Tornado,
    #[serde(other)]
    Other,
}

impl ConditionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::Clear => "Clear",
            ConditionKind::Clouds => "Clouds",
            ConditionKind::Rain => "Rain",
            ConditionKind::Snow => "Snow",
            ConditionKind::Thunderstorm => "Thunderstorm",
            ConditionKind::Drizzle => "Drizzle",
            ConditionKind::Mist => "Mist",
            ConditionKind::Smoke => "Smoke",
            ConditionKind::Haze => "Haze",
            ConditionKind::Dust => "Dust",
            ConditionKind::Fog => "Fog",
            ConditionKind::Sand => "Sand",
            ConditionKind::Ash => "Ash",
            ConditionKind::Squall => "Squall",
            ConditionKind::Tornado => "Tornado",
            ConditionKind::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub id: u32,
    pub main: ConditionKind,
    pub description: String,
    pub icon: String,
}

impl WeatherCondition {
    pub fn new(id: u32, main: ConditionKind, description: &str, icon: &str) -> Self {
        Self { id, main, description: description.to_string(), icon: icon.to_string() }
    }

    /// Stand-in for readings that arrive without any condition.
    pub fn unknown() -> Self {
        Self::new(0, ConditionKind::Other, "unknown", "50d")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstantReading {
    pub dt: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunrise: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunset: Option<i64>,
    pub temp: f64,
    pub feels_like: f64,
    pub pressure: u32,
    pub humidity: u8,
    #[serde(default)]
    pub dew_point: f64,
    #[serde(default)]
    pub uvi: f64,
    #[serde(default)]
    pub clouds: f64,
    #[serde(default)]
    pub visibility: f64,
    pub wind_speed: f64,
    #[serde(default)]
    pub wind_deg: f64,
    #[serde(default)]
    pub weather: Vec<WeatherCondition>,
}

impl InstantReading {
    /// First condition of the reading; the only one consumers look at.
    pub fn condition(&self) -> &WeatherCondition {
        self.weather.first().unwrap_or(&*UNKNOWN_CONDITION)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyReading {
    #[serde(flatten)]
    pub reading: InstantReading,
    #[serde(default)]
    pub pop: f64,
}

/// Per-day temperature facets.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyTemperature {
    pub day: f64,
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub max: f64,
    pub night: f64,
    pub eve: f64,
    pub morn: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReading {
    pub dt: i64,
    pub sunrise: i64,
    pub sunset: i64,
    pub temp: DailyTemperature,
    pub feels_like: DailyTemperature,
    pub pressure: u32,
    pub humidity: u8,
    #[serde(default)]
    pub dew_point: f64,
    pub wind_speed: f64,
    #[serde(default)]
    pub wind_deg: f64,
    #[serde(default)]
    pub weather: Vec<WeatherCondition>,
    #[serde(default)]
    pub clouds: f64,
    #[serde(default)]
    pub pop: f64,
    #[serde(default)]
    pub uvi: f64,
}

impl DailyReading {
    pub fn condition(&self) -> &WeatherCondition {
        self.weather.first().unwrap_or(&*UNKNOWN_CONDITION)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub sender_name: String,
    pub event: String,
    pub start: i64,
    pub end: i64,
    pub description: String,
}

/// One complete weather dataset for a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub lat: f64,
    pub lon: f64,
    pub timezone: String,
    #[serde(default)]
    pub timezone_offset: i32,
    pub current: InstantReading,
    #[serde(default)]
    pub hourly: Vec<HourlyReading>,
    #[serde(default)]
    pub daily: Vec<DailyReading>,
    #[serde(default)]
    pub alerts: Option<Vec<Alert>>,
}

impl Snapshot {
    /// Bring a provider payload inside the documented value ranges.
    ///
    /// Nothing is unit-converted here; only range corrections are applied.
    pub fn normalize(mut self) -> Self {
        normalize_instant("current", &mut self.current);
        for (i, hour) in self.hourly.iter_mut().enumerate() {
            normalize_instant(&format!("hourly[{i}]"), &mut hour.reading);
            hour.pop = clamp_logged(&format!("hourly[{i}].pop"), hour.pop, 0.0, 1.0);
        }
        for (i, day) in self.daily.iter_mut().enumerate() {
            let slot = format!("daily[{i}]");
            day.humidity = cap_humidity(&slot, day.humidity);
            day.clouds = clamp_logged(&format!("{slot}.clouds"), day.clouds, 0.0, 100.0);
            day.pop = clamp_logged(&format!("{slot}.pop"), day.pop, 0.0, 1.0);
            day.uvi = floor_logged(&format!("{slot}.uvi"), day.uvi);
            day.wind_speed = floor_logged(&format!("{slot}.wind_speed"), day.wind_speed);
            day.wind_deg = wrap_logged(&format!("{slot}.wind_deg"), day.wind_deg);
            ensure_condition(&slot, &mut day.weather);
        }
        self
    }

    /// Every violated range invariant, as human-readable strings.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut out = Vec::new();
        check_instant("current", &self.current, &mut out);
        for (i, hour) in self.hourly.iter().enumerate() {
            check_instant(&format!("hourly[{i}]"), &hour.reading, &mut out);
            if !(0.0..=1.0).contains(&hour.pop) {
                out.push(format!("hourly[{i}].pop out of range: {}", hour.pop));
            }
        }
        for (i, day) in self.daily.iter().enumerate() {
            if day.humidity > 100 {
                out.push(format!("daily[{i}].humidity out of range: {}", day.humidity));
            }
            if !(0.0..=100.0).contains(&day.clouds) {
                out.push(format!("daily[{i}].clouds out of range: {}", day.clouds));
            }
            if !(0.0..=1.0).contains(&day.pop) {
                out.push(format!("daily[{i}].pop out of range: {}", day.pop));
            }
            if day.wind_speed < 0.0 {
                out.push(format!("daily[{i}].wind_speed negative: {}", day.wind_speed));
            }
            if day.uvi < 0.0 {
                out.push(format!("daily[{i}].uvi negative: {}", day.uvi));
            }
            if !(0.0..360.0).contains(&day.wind_deg) {
                out.push(format!("daily[{i}].wind_deg out of range: {}", day.wind_deg));
            }
            if day.weather.is_empty() {
                out.push(format!("daily[{i}].weather is empty"));
            }
        }
        out
    }
}

/// Wire shape of the historical call.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HistoricalRecord {
    #[serde(default)]
    pub current: Option<InstantReading>,
}

pub(crate) fn normalize_instant(slot: &str, reading: &mut InstantReading) {
    reading.humidity = cap_humidity(slot, reading.humidity);
    reading.clouds = clamp_logged(&format!("{slot}.clouds"), reading.clouds, 0.0, 100.0);
    reading.uvi = floor_logged(&format!("{slot}.uvi"), reading.uvi);
    reading.wind_speed = floor_logged(&format!("{slot}.wind_speed"), reading.wind_speed);
    reading.wind_deg = wrap_logged(&format!("{slot}.wind_deg"), reading.wind_deg);
    ensure_condition(slot, &mut reading.weather);
}

fn check_instant(slot: &str, reading: &InstantReading, out: &mut Vec<String>) {
    if reading.humidity > 100 {
        out.push(format!("{slot}.humidity out of range: {}", reading.humidity));
    }
    if !(0.0..=100.0).contains(&reading.clouds) {
        out.push(format!("{slot}.clouds out of range: {}", reading.clouds));
    }
    if !(0.0..360.0).contains(&reading.wind_deg) {
        out.push(format!("{slot}.wind_deg out of range: {}", reading.wind_deg));
    }
    if reading.wind_speed < 0.0 {
        out.push(format!("{slot}.wind_speed negative: {}", reading.wind_speed));
    }
    if reading.uvi < 0.0 {
        out.push(format!("{slot}.uvi negative: {}", reading.uvi));
    }
    if reading.weather.is_empty() {
        out.push(format!("{slot}.weather is empty"));
    }
}

fn clamp_logged(slot: &str, value: f64, min: f64, max: f64) -> f64 {
    if value < min || value > max {
        warn!(slot, value, "clamping out-of-range value");
        value.clamp(min, max)
    } else {
        value
    }
}

fn floor_logged(slot: &str, value: f64) -> f64 {
    if value < 0.0 {
        warn!(slot, value, "raising negative value to zero");
        0.0
    } else {
        value
    }
}

fn cap_humidity(slot: &str, humidity: u8) -> u8 {
    if humidity > 100 {
        warn!(slot, humidity, "clamping humidity");
        100
    } else {
        humidity
    }
}

fn wrap_logged(slot: &str, deg: f64) -> f64 {
    let wrapped = wrap_degrees(deg);
    if wrapped != deg {
        warn!(slot, deg, wrapped, "wrapping wind direction");
    }
    wrapped
}

fn wrap_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

fn ensure_condition(slot: &str, weather: &mut Vec<WeatherCondition>) {
    if weather.is_empty() {
        warn!(slot, "reading has no weather condition, inserting placeholder");
        weather.push(WeatherCondition::unknown());
    }
}
