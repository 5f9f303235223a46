use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

/// Measurement system requested from the provider and used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    /// Value of the `units` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [UnitSystem] {
        &[UnitSystem::Metric, UnitSystem::Imperial]
    }

    pub fn wind_speed_label(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "km/h",
            UnitSystem::Imperial => "mph",
        }
    }

    /// Wind speed as displayed: m/s becomes km/h under metric, imperial
    /// values are already in mph and are only rounded.
    pub fn display_wind_speed(&self, raw: f64) -> i64 {
        match self {
            UnitSystem::Metric => (raw * 3.6).round() as i64,
            UnitSystem::Imperial => raw.round() as i64,
        }
    }

    pub fn format_wind_speed(&self, raw: f64) -> String {
        format!("{} {}", self.display_wind_speed(raw), self.wind_speed_label())
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "metric" | "c" | "celsius" => Ok(UnitSystem::Metric),
            "imperial" | "f" | "fahrenheit" => Ok(UnitSystem::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: metric, imperial."
            )),
        }
    }
}

/// Whole-degree temperature with a trailing degree mark.
pub fn format_temperature(value: f64) -> String {
    format!("{}°", value.round() as i64)
}

/// Probability in `[0, 1]` rendered as a whole percentage.
pub fn format_probability(pop: f64) -> String {
    format!("{}%", (pop * 100.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_as_str_roundtrip() {
        for unit in UnitSystem::all() {
            let parsed = UnitSystem::try_from(unit.as_str()).expect("roundtrip should succeed");
            assert_eq!(*unit, parsed);
        }
    }

    #[test]
    fn unknown_unit_error() {
        let err = UnitSystem::try_from("kelvin").unwrap_err();
        assert!(err.to_string().contains("Unknown unit system"));
    }

    #[test]
    fn metric_wind_converts_to_kmh() {
        assert_eq!(UnitSystem::Metric.display_wind_speed(10.0), 36);
        assert_eq!(UnitSystem::Metric.format_wind_speed(2.5), "9 km/h");
    }

    #[test]
    fn imperial_wind_is_only_rounded() {
        assert_eq!(UnitSystem::Imperial.display_wind_speed(7.6), 8);
        assert_eq!(UnitSystem::Imperial.format_wind_speed(7.4), "7 mph");
    }

    #[test]
    fn temperature_has_no_decimals() {
        assert_eq!(format_temperature(21.6), "22°");
        assert_eq!(format_temperature(-0.4), "0°");
        assert_eq!(format_temperature(-3.5), "-4°");
    }

    #[test]
    fn probability_is_percent() {
        assert_eq!(format_probability(0.0), "0%");
        assert_eq!(format_probability(0.456), "46%");
        assert_eq!(format_probability(1.0), "100%");
    }
}
