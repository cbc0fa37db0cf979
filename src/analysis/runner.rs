/// Analysis orchestration.
///
/// `WindAnalyzer` runs the four chart analyses over a dataset:
///
/// | chart               | transform                                   |
/// |---------------------|---------------------------------------------|
/// | wind over time      | pass-through series + mean wind speed       |
/// | seasonal average    | day-of-year means, LOESS (fraction 0.2)     |
/// | temp delta vs wind  | feels-like minus actual, LOESS (0.5)        |
/// | temp vs wind        | actual temperature, LOESS (0.5)             |
///
/// Every analysis filters outliers and scopes to the location on its own
/// copy of the data. Results are reported per analysis: an empty scope or a
/// tiny sample still produces a chart (with an empty or pass-through curve),
/// while a bad smoothing parameter or a storage failure marks only that one
/// analysis as failed.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::sync::mpsc;
use std::sync::Arc;
use thiserror::Error;
use threadpool::ThreadPool;
use tracing::{debug, info, warn};

use super::filters::{count_prepared, prepare};
use super::loess::{Loess, SmoothedCurve, SmoothingError};
use super::metrics::{mean_wind_kph, temp_delta};
use super::seasonal::{aggregate_by_day_of_year, to_samples, SeasonalAggregate};
use crate::artifacts::{ArtifactError, ArtifactId, ArtifactStore, Chart, ChartKind};
use crate::config::AnalysisConfig;
use crate::model::{LocationScope, Observation};

/// Reference line for strong wind on the wind charts.
pub const STRONG_WIND_KPH: f64 = 20.0;
/// Reference line for light wind on the wind charts.
pub const LIGHT_WIND_KPH: f64 = 10.0;
/// "Feels 2 °C colder / warmer" bands on the delta chart.
pub const FEELS_LIKE_BANDS_C: [f64; 2] = [-2.0, 2.0];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(#[from] SmoothingError),

    #[error("artifact storage failed: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("analysis worker exited without a result")]
    WorkerLost,
}

fn serialize_display<S: Serializer>(error: &AnalysisError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(error)
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimePoint {
    pub timestamp: NaiveDateTime,
    pub wind_kph: f64,
}

/// Raw wind series for the time chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindOverTime {
    /// In dataset order (the loader returns rows by time).
    pub series: Vec<TimePoint>,
    /// `None` when the scope is empty.
    pub mean_wind_kph: Option<f64>,
    pub strong_wind_kph: f64,
    pub light_wind_kph: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalAverage {
    pub daily_means: SeasonalAggregate,
    pub curve: SmoothedCurve,
    pub strong_wind_kph: f64,
    pub light_wind_kph: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipMetric {
    /// Feels-like minus actual temperature
    TempDelta,
    Temperature,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub wind_kph: f64,
    pub value: f64,
}

/// Scatter of a temperature metric against wind speed, with LOESS trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindRelationship {
    pub metric: RelationshipMetric,
    /// In dataset order.
    pub samples: Vec<ScatterPoint>,
    pub trend: SmoothedCurve,
    pub reference_levels: Vec<f64>,
}

impl WindRelationship {
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }
}

/// Outcome of one analysis within a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome<T> {
    Ready {
        artifact: ArtifactId,
        data: T,
    },
    Failed {
        #[serde(serialize_with = "serialize_display")]
        error: AnalysisError,
    },
}

impl<T> AnalysisOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, AnalysisOutcome::Ready { .. })
    }

    pub fn artifact(&self) -> Option<&ArtifactId> {
        match self {
            AnalysisOutcome::Ready { artifact, .. } => Some(artifact),
            AnalysisOutcome::Failed { .. } => None,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            AnalysisOutcome::Ready { data, .. } => Some(data),
            AnalysisOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&AnalysisError> {
        match self {
            AnalysisOutcome::Ready { .. } => None,
            AnalysisOutcome::Failed { error } => Some(error),
        }
    }
}

/// All four analyses for one dataset and scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub scope: LocationScope,
    /// Rows left after outlier filtering and scoping.
    pub rows_in_scope: usize,
    pub wind_over_time: AnalysisOutcome<WindOverTime>,
    pub seasonal_average: AnalysisOutcome<SeasonalAverage>,
    pub temp_delta_vs_wind: AnalysisOutcome<WindRelationship>,
    pub temp_vs_wind: AnalysisOutcome<WindRelationship>,
}

impl AnalysisReport {
    /// Artifact per chart, in `ChartKind::ALL` order.
    pub fn artifacts(&self) -> [(ChartKind, Option<&ArtifactId>); 4] {
        [
            (ChartKind::WindOverTime, self.wind_over_time.artifact()),
            (ChartKind::SeasonalAverage, self.seasonal_average.artifact()),
            (ChartKind::TempDeltaVsWind, self.temp_delta_vs_wind.artifact()),
            (ChartKind::TempVsWind, self.temp_vs_wind.artifact()),
        ]
    }

    pub fn failures(&self) -> Vec<(ChartKind, &AnalysisError)> {
        [
            (ChartKind::WindOverTime, self.wind_over_time.error()),
            (ChartKind::SeasonalAverage, self.seasonal_average.error()),
            (ChartKind::TempDeltaVsWind, self.temp_delta_vs_wind.error()),
            (ChartKind::TempVsWind, self.temp_vs_wind.error()),
        ]
        .into_iter()
        .filter_map(|(kind, error)| error.map(|e| (kind, e)))
        .collect()
    }

    pub fn all_ready(&self) -> bool {
        self.failures().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Pure analyses
// ---------------------------------------------------------------------------

/// Wind speed series plus its mean.
pub fn wind_over_time(dataset: &[Observation], scope: &LocationScope) -> WindOverTime {
    let rows = prepare(dataset, scope);

    WindOverTime {
        series: rows
            .iter()
            .map(|o| TimePoint {
                timestamp: o.timestamp,
                wind_kph: o.wind_kph,
            })
            .collect(),
        mean_wind_kph: mean_wind_kph(&rows),
        strong_wind_kph: STRONG_WIND_KPH,
        light_wind_kph: LIGHT_WIND_KPH,
    }
}

/// Day-of-year mean wind speed across all years, smoothed.
pub fn seasonal_average(
    dataset: &[Observation],
    scope: &LocationScope,
    smoother: &Loess,
) -> Result<SeasonalAverage, SmoothingError> {
    let rows = prepare(dataset, scope);
    let daily_means = aggregate_by_day_of_year(&rows);
    let (days, means) = to_samples(&daily_means);
    let curve = smoother.smooth(&days, &means)?;

    Ok(SeasonalAverage {
        daily_means,
        curve,
        strong_wind_kph: STRONG_WIND_KPH,
        light_wind_kph: LIGHT_WIND_KPH,
    })
}

/// Feels-like delta (or plain temperature) against wind speed.
pub fn wind_relationship(
    dataset: &[Observation],
    scope: &LocationScope,
    metric: RelationshipMetric,
    smoother: &Loess,
) -> Result<WindRelationship, SmoothingError> {
    let rows = prepare(dataset, scope);

    let samples: Vec<ScatterPoint> = rows
        .iter()
        .map(|o| ScatterPoint {
            wind_kph: o.wind_kph,
            value: match metric {
                RelationshipMetric::TempDelta => temp_delta(o),
                RelationshipMetric::Temperature => o.temperature_celsius,
            },
        })
        .collect();

    let (winds, values): (Vec<f64>, Vec<f64>) =
        samples.iter().map(|s| (s.wind_kph, s.value)).unzip();
    let trend = smoother.smooth(&winds, &values)?;

    let reference_levels = match metric {
        RelationshipMetric::TempDelta => FEELS_LIKE_BANDS_C.to_vec(),
        RelationshipMetric::Temperature => Vec::new(),
    };

    Ok(WindRelationship {
        metric,
        samples,
        trend,
        reference_levels,
    })
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Runs the four analyses and publishes each chart to an artifact store.
pub struct WindAnalyzer<S: ArtifactStore> {
    config: AnalysisConfig,
    store: Arc<S>,
}

impl<S: ArtifactStore> Clone for WindAnalyzer<S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

/// Result message sent back from a pool worker.
enum Finished {
    WindOverTime(AnalysisOutcome<WindOverTime>),
    SeasonalAverage(AnalysisOutcome<SeasonalAverage>),
    TempDeltaVsWind(AnalysisOutcome<WindRelationship>),
    TempVsWind(AnalysisOutcome<WindRelationship>),
}

impl<S: ArtifactStore + 'static> WindAnalyzer<S> {
    pub fn new(config: AnalysisConfig, store: Arc<S>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Runs all four analyses one after another.
    pub fn run(&self, dataset: &[Observation], scope: &LocationScope) -> AnalysisReport {
        let rows_in_scope = self.log_scope(dataset, scope);

        AnalysisReport {
            scope: scope.clone(),
            rows_in_scope,
            wind_over_time: self.run_wind_over_time(dataset, scope),
            seasonal_average: self.run_seasonal_average(dataset, scope),
            temp_delta_vs_wind: self.run_relationship(dataset, scope, RelationshipMetric::TempDelta),
            temp_vs_wind: self.run_relationship(dataset, scope, RelationshipMetric::Temperature),
        }
    }

    /// Runs the four analyses as independent jobs on `pool`.
    ///
    /// Produces the same numbers as `run`; only artifact identifiers differ.
    pub fn run_parallel(
        &self,
        dataset: Arc<[Observation]>,
        scope: &LocationScope,
        pool: &ThreadPool,
    ) -> AnalysisReport {
        let rows_in_scope = self.log_scope(&dataset, scope);
        let (tx, rx) = mpsc::channel();

        for kind in ChartKind::ALL {
            let analyzer = self.clone();
            let dataset = Arc::clone(&dataset);
            let scope = scope.clone();
            let tx = tx.clone();

            pool.execute(move || {
                let finished = match kind {
                    ChartKind::WindOverTime => {
                        Finished::WindOverTime(analyzer.run_wind_over_time(&dataset, &scope))
                    }
                    ChartKind::SeasonalAverage => {
                        Finished::SeasonalAverage(analyzer.run_seasonal_average(&dataset, &scope))
                    }
                    ChartKind::TempDeltaVsWind => Finished::TempDeltaVsWind(
                        analyzer.run_relationship(&dataset, &scope, RelationshipMetric::TempDelta),
                    ),
                    ChartKind::TempVsWind => Finished::TempVsWind(
                        analyzer.run_relationship(&dataset, &scope, RelationshipMetric::Temperature),
                    ),
                };
                // Receiver only disappears if the caller is gone
                let _ = tx.send(finished);
            });
        }
        drop(tx);

        let mut wind_over_time = None;
        let mut seasonal_average = None;
        let mut temp_delta_vs_wind = None;
        let mut temp_vs_wind = None;

        for finished in rx {
            match finished {
                Finished::WindOverTime(o) => wind_over_time = Some(o),
                Finished::SeasonalAverage(o) => seasonal_average = Some(o),
                Finished::TempDeltaVsWind(o) => temp_delta_vs_wind = Some(o),
                Finished::TempVsWind(o) => temp_vs_wind = Some(o),
            }
        }

        AnalysisReport {
            scope: scope.clone(),
            rows_in_scope,
            wind_over_time: wind_over_time.unwrap_or_else(worker_lost),
            seasonal_average: seasonal_average.unwrap_or_else(worker_lost),
            temp_delta_vs_wind: temp_delta_vs_wind.unwrap_or_else(worker_lost),
            temp_vs_wind: temp_vs_wind.unwrap_or_else(worker_lost),
        }
    }

    fn log_scope(&self, dataset: &[Observation], scope: &LocationScope) -> usize {
        let rows_in_scope = count_prepared(dataset, scope);
        if rows_in_scope == 0 {
            warn!(scope = scope.label(), rows = dataset.len(), "no observations in scope, charts will be empty");
        } else {
            info!(scope = scope.label(), rows = rows_in_scope, "running wind analyses");
        }
        rows_in_scope
    }

    fn run_wind_over_time(
        &self,
        dataset: &[Observation],
        scope: &LocationScope,
    ) -> AnalysisOutcome<WindOverTime> {
        self.publish(ChartKind::WindOverTime, scope, Ok(wind_over_time(dataset, scope)))
    }

    fn run_seasonal_average(
        &self,
        dataset: &[Observation],
        scope: &LocationScope,
    ) -> AnalysisOutcome<SeasonalAverage> {
        let result = self
            .config
            .seasonal_smoother()
            .and_then(|smoother| seasonal_average(dataset, scope, &smoother))
            .map_err(AnalysisError::from);
        self.publish(ChartKind::SeasonalAverage, scope, result)
    }

    fn run_relationship(
        &self,
        dataset: &[Observation],
        scope: &LocationScope,
        metric: RelationshipMetric,
    ) -> AnalysisOutcome<WindRelationship> {
        let kind = match metric {
            RelationshipMetric::TempDelta => ChartKind::TempDeltaVsWind,
            RelationshipMetric::Temperature => ChartKind::TempVsWind,
        };
        let result = self
            .config
            .relationship_smoother()
            .and_then(|smoother| wind_relationship(dataset, scope, metric, &smoother))
            .map_err(AnalysisError::from);
        self.publish(kind, scope, result)
    }

    /// Stores a finished analysis and wraps it into an outcome.
    fn publish<T: Serialize>(
        &self,
        kind: ChartKind,
        scope: &LocationScope,
        result: Result<T, AnalysisError>,
    ) -> AnalysisOutcome<T> {
        let stored = result.and_then(|data| {
            let payload = serde_json::to_value(&data).map_err(ArtifactError::from)?;
            let artifact = self.store.store(Chart {
                kind,
                scope: scope.clone(),
                payload,
            })?;
            Ok((artifact, data))
        });

        match stored {
            Ok((artifact, data)) => {
                debug!(chart = %kind, %artifact, "chart stored");
                AnalysisOutcome::Ready { artifact, data }
            }
            Err(error) => {
                warn!(chart = %kind, scope = scope.label(), %error, "analysis failed");
                AnalysisOutcome::Failed { error }
            }
        }
    }
}

fn worker_lost<T>() -> AnalysisOutcome<T> {
    AnalysisOutcome::Failed {
        error: AnalysisError::WorkerLost,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
