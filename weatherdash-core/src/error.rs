use chrono::NaiveDate;
use thiserror::Error;

/// Failures surfaced by the dashboard pipeline.
///
/// None of these variants leave the session partially updated.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Location not found: {0}")]
    NotFound(String),

    #[error("Fetch failed: {0:#}")]
    Fetch(#[source] anyhow::Error),

    #[error("No historical data available for {0}")]
    Unavailable(NaiveDate),
}

impl DashboardError {
    /// Message suitable for showing to the user as-is.
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::InvalidInput(msg) | DashboardError::InvalidState(msg) => msg.clone(),
            DashboardError::NotFound(_) => {
                "City not found. Please try another location.".to_string()
            }
            DashboardError::Fetch(_) => "Error fetching weather data. Please try again.".to_string(),
            DashboardError::Unavailable(_) => {
                "No historical data available for this date.".to_string()
            }
        }
    }

    /// `Unavailable` is an expected outcome, everything else is a failure.
    pub fn is_failure(&self) -> bool {
        !matches!(self, DashboardError::Unavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_keeps_cause_chain() {
        let cause = anyhow::anyhow!("connection refused").context("Failed to send request");
        let err = DashboardError::Fetch(cause);
        let text = err.to_string();
        assert!(text.contains("Failed to send request"));
        assert!(text.contains("connection refused"));
        assert_eq!(err.user_message(), "Error fetching weather data. Please try again.");
    }

    #[test]
    fn unavailable_is_not_a_failure() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date");
        let err = DashboardError::Unavailable(date);
        assert!(!err.is_failure());
        assert!(DashboardError::NotFound("x".into()).is_failure());
        assert_eq!(err.user_message(), "No historical data available for this date.");
    }
}
