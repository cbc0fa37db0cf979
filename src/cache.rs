/// In-memory dataset cache.
///
/// Holds the current `DatasetSnapshot` behind an `Arc`. Readers take a cheap
/// clone of the `Arc` and keep analysing it even while a refresh swaps in a
/// newer snapshot. Snapshots are never mutated in place.

use crate::db::{SourceError, WeatherSource};
use crate::model::DatasetSnapshot;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

pub struct DatasetCache {
    current: RwLock<Arc<DatasetSnapshot>>,
}

impl DatasetCache {
    pub fn new(snapshot: DatasetSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Loads the initial snapshot from `source`.
    pub fn load(source: &mut dyn WeatherSource) -> Result<Self, SourceError> {
        let snapshot = DatasetSnapshot::from_observations(source.load_dataset()?);
        info!(rows = snapshot.len(), locations = snapshot.locations.len(), "dataset loaded");
        Ok(Self::new(snapshot))
    }

    /// The snapshot analyses should run against.
    pub fn current(&self) -> Arc<DatasetSnapshot> {
        // A poisoned lock still holds a complete snapshot; the swap is one assignment.
        match self.current.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.is_stale_at(max_age, Utc::now())
    }

    pub fn is_stale_at(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        now - self.current().loaded_at > max_age
    }

    /// Reloads from `source` and swaps the new snapshot in.
    ///
    /// On failure the previous snapshot stays current.
    pub fn refresh(&self, source: &mut dyn WeatherSource) -> Result<Arc<DatasetSnapshot>, SourceError> {
        let observations = match source.load_dataset() {
            Ok(observations) => observations,
            Err(e) => {
                warn!(error = %e, "dataset refresh failed, keeping previous snapshot");
                return Err(e);
            }
        };

        let snapshot = Arc::new(DatasetSnapshot::from_observations(observations));
        match self.current.write() {
            Ok(mut guard) => *guard = Arc::clone(&snapshot),
            Err(poisoned) => *poisoned.into_inner() = Arc::clone(&snapshot),
        }

        info!(rows = snapshot.len(), "dataset refreshed");
        Ok(snapshot)
    }
}
