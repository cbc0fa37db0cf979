/// Wind analysis core.
///
/// Submodules:
/// - `filters`: outlier filter (wind > 60 kph) and location scoping.
/// - `seasonal`: day-of-year aggregation across years.
/// - `loess`: locally weighted scatterplot smoothing.
/// - `metrics`: temperature delta and mean helpers.
/// - `runner`: composes the above into the four chart analyses.
///
/// Data flows one way: dataset → filter → scope → aggregate/derive →
/// smooth → chart. Nothing here holds state between calls.

pub mod filters;
pub mod loess;
pub mod metrics;
pub mod runner;
pub mod seasonal;

pub use runner::{AnalysisError, AnalysisOutcome, AnalysisReport, WindAnalyzer};
