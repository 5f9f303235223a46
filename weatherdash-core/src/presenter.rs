//! Display-ready view models derived from a snapshot.
//!
//! Everything here is a pure function of its inputs. Rounding and unit
//! labelling happen only at this layer; stored readings are never touched.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::Serialize;

use crate::{
    model::{Alert, DailyReading, HourlyReading, InstantReading, Location, Snapshot},
    units::{UnitSystem, format_probability, format_temperature},
};

pub const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";
pub const NO_ALERTS_MESSAGE: &str = "No active alerts for your location.";

pub const HOURLY_VIEW_LEN: usize = 12;
pub const DAILY_VIEW_LEN: usize = 5;
pub const TEMPERATURE_CHART_LEN: usize = 24;

/// Particle effect a renderer may layer over the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbientEffect {
    None,
    Rain,
    Snow,
}

impl AmbientEffect {
    pub fn for_backdrop(backdrop: &str) -> Self {
        if backdrop.contains("snow") {
            AmbientEffect::Snow
        } else if backdrop.contains("rain") || backdrop.contains("drizzle") {
            AmbientEffect::Rain
        } else {
            AmbientEffect::None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentView {
    pub location: String,
    pub temperature: String,
    pub description: String,
    pub feels_like: String,
    pub humidity: String,
    pub wind: String,
    pub pressure: String,
    pub icon_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyView {
    pub time: String,
    pub icon_url: String,
    pub description: String,
    pub temperature: String,
    pub precipitation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyView {
    pub day: String,
    pub icon_url: String,
    pub description: String,
    pub high: String,
    pub low: String,
    pub precipitation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertView {
    pub event: String,
    pub sender: String,
    pub description: String,
    pub window: String,
}

/// Line chart of the next 24 hours.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureChart {
    pub labels: Vec<String>,
    pub temperature: Vec<i64>,
    pub feels_like: Vec<i64>,
}

/// Bar chart of daily precipitation probability, in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecipitationChart {
    pub labels: Vec<String>,
    pub probability: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub unit: UnitSystem,
    /// Lower-cased condition group, e.g. "rain"; used as a backdrop class.
    pub backdrop: String,
    pub effect: AmbientEffect,
    pub current: CurrentView,
    pub alerts: Vec<AlertView>,
    pub alerts_notice: Option<String>,
    pub hourly: Vec<HourlyView>,
    pub daily: Vec<DailyView>,
    pub temperature_chart: TemperatureChart,
    pub precipitation_chart: PrecipitationChart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalView {
    pub title: String,
    pub temperature: String,
    pub feels_like: String,
    pub humidity: String,
    pub wind: String,
    pub pressure: String,
    pub conditions: String,
    pub uv_index: String,
}

/// Icon reference for a condition code. Codes are not validated.
pub fn icon_url(code: &str, large: bool) -> String {
    if large {
        format!("{ICON_BASE_URL}/{code}@2x.png")
    } else {
        format!("{ICON_BASE_URL}/{code}.png")
    }
}

pub fn present(snapshot: &Snapshot, location: &Location, unit: UnitSystem) -> DashboardView {
    let offset = zone(snapshot.timezone_offset);
    let backdrop = snapshot.current.condition().main.as_str().to_lowercase();

    let (alerts, alerts_notice): (Vec<AlertView>, Option<String>) = match snapshot.alerts.as_deref() {
        Some(list) if !list.is_empty() => {
            (list.iter().map(|a| present_alert(a, offset)).collect(), None)
        }
        _ => (Vec::new(), Some(NO_ALERTS_MESSAGE.to_string())),
    };

    DashboardView {
        unit,
        effect: AmbientEffect::for_backdrop(&backdrop),
        backdrop,
        current: present_current(&snapshot.current, location, unit),
        alerts,
        alerts_notice,
        hourly: snapshot
            .hourly
            .iter()
            .take(HOURLY_VIEW_LEN)
            .map(|h| present_hour(h, offset))
            .collect(),
        daily: snapshot.daily.iter().take(DAILY_VIEW_LEN).map(|d| present_day(d, offset)).collect(),
        temperature_chart: temperature_chart(&snapshot.hourly, offset),
        precipitation_chart: precipitation_chart(&snapshot.daily, offset),
    }
}

/// View of a single past reading; needs nothing beyond the reading itself.
pub fn present_historical(
    reading: &InstantReading,
    date: NaiveDate,
    unit: UnitSystem,
) -> HistoricalView {
    HistoricalView {
        title: format!("Weather on {}", date.format("%Y-%m-%d")),
        temperature: format_temperature(reading.temp),
        feels_like: format_temperature(reading.feels_like),
        humidity: format!("{}%", reading.humidity),
        wind: unit.format_wind_speed(reading.wind_speed),
        pressure: format!("{} hPa", reading.pressure),
        conditions: reading.condition().description.clone(),
        uv_index: format!("{:.1}", reading.uvi),
    }
}

fn present_current(current: &InstantReading, location: &Location, unit: UnitSystem) -> CurrentView {
    let condition = current.condition();
    CurrentView {
        location: location.display_name(),
        temperature: format_temperature(current.temp),
        description: condition.description.clone(),
        feels_like: format_temperature(current.feels_like),
        humidity: format!("{}%", current.humidity),
        wind: unit.format_wind_speed(current.wind_speed),
        pressure: format!("{} hPa", current.pressure),
        icon_url: icon_url(&condition.icon, true),
    }
}

fn present_hour(hour: &HourlyReading, offset: FixedOffset) -> HourlyView {
    let condition = hour.reading.condition();
    HourlyView {
        time: format_local(hour.reading.dt, offset, "%H:%M"),
        icon_url: icon_url(&condition.icon, false),
        description: condition.description.clone(),
        temperature: format_temperature(hour.reading.temp),
        precipitation: format_probability(hour.pop),
    }
}

fn present_day(day: &DailyReading, offset: FixedOffset) -> DailyView {
    let condition = day.condition();
    DailyView {
        day: format_local(day.dt, offset, "%a"),
        icon_url: icon_url(&condition.icon, false),
        description: condition.description.clone(),
        high: format_temperature(day.temp.max),
        low: format_temperature(day.temp.min),
        precipitation: format_probability(day.pop),
    }
}

fn present_alert(alert: &Alert, offset: FixedOffset) -> AlertView {
    AlertView {
        event: alert.event.clone(),
        sender: alert.sender_name.clone(),
        description: alert.description.clone(),
        window: format!(
            "From: {} - To: {}",
            format_local(alert.start, offset, "%Y-%m-%d %H:%M"),
            format_local(alert.end, offset, "%Y-%m-%d %H:%M"),
        ),
    }
}

fn temperature_chart(hourly: &[HourlyReading], offset: FixedOffset) -> TemperatureChart {
    let window = &hourly[..hourly.len().min(TEMPERATURE_CHART_LEN)];
    TemperatureChart {
        labels: window.iter().map(|h| format_local(h.reading.dt, offset, "%H:%M")).collect(),
        temperature: window.iter().map(|h| h.reading.temp.round() as i64).collect(),
        feels_like: window.iter().map(|h| h.reading.feels_like.round() as i64).collect(),
    }
}

fn precipitation_chart(daily: &[DailyReading], offset: FixedOffset) -> PrecipitationChart {
    PrecipitationChart {
        labels: daily.iter().map(|d| format_local(d.dt, offset, "%a")).collect(),
        probability: daily.iter().map(|d| (d.pop * 100.0).round() as i64).collect(),
    }
}

fn zone(offset_secs: i32) -> FixedOffset {
    FixedOffset::east_opt(offset_secs).unwrap_or_else(|| Utc.fix())
}

fn format_local(ts: i64, offset: FixedOffset, pattern: &str) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|utc| utc.with_timezone(&offset).format(pattern).to_string())
        .unwrap_or_else(|| "--".to_string())
}
