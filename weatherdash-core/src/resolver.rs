//! Turns what the user typed (or where the device is) into a `Location`.

use tracing::{debug, warn};

use crate::{
    error::{DashboardError, Result},
    model::{Coordinates, Location, LocationQuery},
    provider::Geocoder,
};

/// Name used when reverse geocoding cannot name the device position.
pub const DEVICE_FALLBACK_NAME: &str = "Your Location";

pub struct LocationResolver<'a, G: ?Sized> {
    geocoder: &'a G,
}

impl<'a, G: Geocoder + ?Sized> LocationResolver<'a, G> {
    pub fn new(geocoder: &'a G) -> Self {
        Self { geocoder }
    }

    pub async fn resolve(&self, query: LocationQuery) -> Result<Location> {
        debug!(?query, "resolving location");

        let location = match query {
            LocationQuery::City(name) => self.resolve_city(&name).await?,
            LocationQuery::Coordinates(coords) => self.resolve_coordinates(coords).await,
        };

        debug!(
            "resolved location: {} at ({}, {})",
            location.display_name(),
            location.lat,
            location.lon
        );
        Ok(location)
    }

    async fn resolve_city(&self, name: &str) -> Result<Location> {
        let city = name.trim();
        if city.is_empty() {
            return Err(DashboardError::InvalidInput("Please enter a city name.".to_string()));
        }

        let matches = self.geocoder.geocode(city).await.map_err(DashboardError::Fetch)?;

        matches
            .into_iter()
            .next()
            .ok_or_else(|| DashboardError::NotFound(city.to_string()))
    }

    /// Never fails: naming problems fall back to a generic label so the
    /// weather fetch can still go ahead with the device coordinates.
    async fn resolve_coordinates(&self, coords: Coordinates) -> Location {
        let (name, country) = match self.geocoder.reverse_geocode(coords).await {
            Ok(matches) => match matches.into_iter().next() {
                Some(found) if !found.name.trim().is_empty() => (found.name, found.country),
                _ => {
                    debug!("no reverse geocoding result, using generic label");
                    (DEVICE_FALLBACK_NAME.to_string(), String::new())
                }
            },
            Err(e) => {
                warn!("reverse geocoding failed: {e:#}, using generic label");
                (DEVICE_FALLBACK_NAME.to_string(), String::new())
            }
        };

        Location { lat: coords.lat, lon: coords.lon, name, country }
    }
}
