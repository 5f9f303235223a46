//! Core library for the `weatherdash` dashboard.
//!
//! This crate defines:
//! - Configuration handling
//! - Location resolution and the weather/historical provider abstraction
//! - A mock generator producing schema-valid weather data offline
//! - Presenters turning snapshots into display-ready view models
//! - The `Dashboard`, which owns session state and drives fetch-then-present
//!
//! It is used by `weatherdash-cli`, but can also back other front ends.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod mock;
pub mod model;
pub mod presenter;
pub mod provider;
pub mod resolver;
pub mod units;

pub use config::Config;
pub use dashboard::{Dashboard, GeolocationError, Session};
pub use error::DashboardError;
pub use model::{Coordinates, Location, LocationQuery, Snapshot};
pub use presenter::{DashboardView, HistoricalView};
pub use provider::{Backend, BackendId};
pub use units::UnitSystem;
