/// winds_service: wind speed and feels-like temperature analysis.
///
/// # Module structure
///
/// ```text
/// winds_service
/// ├── model       — shared data types (Observation, LocationScope, DatasetSnapshot)
/// ├── config      — analysis and database settings (winds.toml)
/// ├── db          — Postgres connection checks and the WeatherSource seam
/// ├── cache       — in-memory dataset snapshot with atomic refresh
/// ├── artifacts   — chart artifacts and the ArtifactStore seam
/// ├── logging     — tracing subscriber setup for the binaries
/// ├── ingest
/// │   ├── weather_csv — weather repository CSV export parser
/// │   └── fixtures (test only) — trimmed CSV exports
/// └── analysis
///     ├── filters   — outlier filter and location scoping
///     ├── seasonal  — day-of-year aggregation
///     ├── loess     — LOESS smoother
///     ├── metrics   — temperature delta and means
///     └── runner    — the four chart analyses
/// ```

/// Public modules
pub mod analysis;
pub mod artifacts;
pub mod cache;
pub mod config;
pub mod db;
pub mod ingest;
pub mod logging;
pub mod model;
