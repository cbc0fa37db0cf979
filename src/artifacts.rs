/// Artifact storage for analysis charts.
///
/// The analysis core never decides where chart data lives. It hands each
/// finished `Chart` to an `ArtifactStore` and gets back an opaque
/// `ArtifactId`. Identifiers must be unique across concurrent runs; the
/// in-memory store combines a millisecond timestamp with a process-wide
/// sequence number.

use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

use crate::model::LocationScope;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The four charts produced per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    WindOverTime,
    SeasonalAverage,
    TempDeltaVsWind,
    TempVsWind,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::WindOverTime,
        ChartKind::SeasonalAverage,
        ChartKind::TempDeltaVsWind,
        ChartKind::TempVsWind,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::WindOverTime => "wind-over-time",
            ChartKind::SeasonalAverage => "seasonal-average",
            ChartKind::TempDeltaVsWind => "temp-delta-vs-wind",
            ChartKind::TempVsWind => "temp-vs-wind",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a renderer needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub scope: LocationScope,
    pub payload: serde_json::Value,
}

/// Opaque identifier of a stored chart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Fresh identifier for a chart of the given kind.
    pub fn generate(kind: ChartKind) -> Self {
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        ArtifactId(format!(
            "{}-{}-{:06}",
            kind.as_str(),
            Utc::now().timestamp_millis(),
            seq
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArtifactError {
    #[error("failed to serialize chart payload: {0}")]
    Serialize(String),

    #[error("artifact store unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for ArtifactError {
    fn from(e: serde_json::Error) -> Self {
        ArtifactError::Serialize(e.to_string())
    }
}

impl<T> From<PoisonError<T>> for ArtifactError {
    fn from(_: PoisonError<T>) -> Self {
        ArtifactError::Unavailable("store lock poisoned".to_string())
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Destination for finished charts.
pub trait ArtifactStore: Send + Sync {
    fn store(&self, chart: Chart) -> Result<ArtifactId, ArtifactError>;
}

/// Keeps charts in a map, mainly for the CLI and tests.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    charts: Mutex<HashMap<ArtifactId, Chart>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ArtifactId) -> Option<Chart> {
        self.charts
            .lock()
            .ok()
            .and_then(|charts| charts.get(id).cloned())
    }

    pub fn len(&self) -> usize {
        self.charts.lock().map(|charts| charts.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every stored chart (done before each web request in the old
    /// image-directory setup).
    pub fn clear(&self) -> Result<(), ArtifactError> {
        self.charts.lock()?.clear();
        Ok(())
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn store(&self, chart: Chart) -> Result<ArtifactId, ArtifactError> {
        let id = ArtifactId::generate(chart.kind);
        self.charts.lock()?.insert(id.clone(), chart);
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
