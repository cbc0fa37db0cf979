/// Shared data types for the wind analysis service.
///
/// `Observation` is one row of the `winds_data` table. Everything downstream
/// (filters, aggregation, smoothing, charts) works on slices of these.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// A single weather observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// `last_updated` column (local station time, no offset)
    pub timestamp: NaiveDateTime,
    pub wind_kph: f64,
    pub temperature_celsius: f64,
    pub feels_like_celsius: f64,
    pub location_name: String,
}

impl Observation {
    pub fn new(
        timestamp: NaiveDateTime,
        wind_kph: f64,
        temperature_celsius: f64,
        feels_like_celsius: f64,
        location_name: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            wind_kph,
            temperature_celsius,
            feels_like_celsius,
            location_name: location_name.into(),
        }
    }
}

/// Which locations an analysis run covers.
///
/// Replaces the "ALL" string sentinel used by the web form; the sentinel is
/// only understood by `from_query`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "scope", content = "location", rename_all = "snake_case")]
pub enum LocationScope {
    #[default]
    All,
    Only(String),
}

impl LocationScope {
    /// Parses a user-supplied location value. Empty input and `ALL`
    /// (case-insensitive) select every location.
    pub fn from_query(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            LocationScope::All
        } else {
            LocationScope::Only(trimmed.to_string())
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            LocationScope::All => None,
            LocationScope::Only(name) => Some(name),
        }
    }

    /// Label used in log lines and chart payloads.
    pub fn label(&self) -> &str {
        self.location().unwrap_or("all locations")
    }
}

impl From<Option<String>> for LocationScope {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(name) => LocationScope::Only(name),
            None => LocationScope::All,
        }
    }
}

/// Immutable view of the dataset as loaded at one point in time.
///
/// Cloning is cheap: observations are shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct DatasetSnapshot {
    pub observations: Arc<[Observation]>,
    pub locations: BTreeSet<String>,
    pub loaded_at: DateTime<Utc>,
}

impl DatasetSnapshot {
    /// Builds a snapshot, deriving the location list from the observations.
    pub fn from_observations(observations: Vec<Observation>) -> Self {
        let locations = observations
            .iter()
            .map(|o| o.location_name.clone())
            .collect();

        Self {
            observations: observations.into(),
            locations,
            loaded_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn has_location(&self, name: &str) -> bool {
        self.locations.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    #[test]
    fn test_scope_from_query_all_sentinel() {
        assert_eq!(LocationScope::from_query("ALL"), LocationScope::All);
        assert_eq!(LocationScope::from_query("all"), LocationScope::All);
        assert_eq!(LocationScope::from_query("  "), LocationScope::All);
    }

    #[test]
    fn test_scope_from_query_named_location() {
        let scope = LocationScope::from_query(" Kyiv ");
        assert_eq!(scope, LocationScope::Only("Kyiv".to_string()));
        assert_eq!(scope.location(), Some("Kyiv"));
        assert_eq!(scope.label(), "Kyiv");
    }

    #[test]
    fn test_scope_from_option() {
        assert_eq!(LocationScope::from(None), LocationScope::All);
        assert_eq!(
            LocationScope::from(Some("Lviv".to_string())),
            LocationScope::Only("Lviv".to_string())
        );
    }

    #[test]
    fn test_snapshot_collects_distinct_locations() {
        let snapshot = DatasetSnapshot::from_observations(vec![
            Observation::new(at(1), 10.0, 20.0, 18.0, "Kyiv"),
            Observation::new(at(2), 12.0, 21.0, 19.0, "Lviv"),
            Observation::new(at(3), 14.0, 19.0, 17.0, "Kyiv"),
        ]);

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.locations.len(), 2);
        assert!(snapshot.has_location("Lviv"));
        assert!(!snapshot.has_location("Odesa"));
    }
}
