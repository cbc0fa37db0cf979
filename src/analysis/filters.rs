/// Row filters applied before every analysis.
///
/// Both filters return fresh vectors and never touch their input, so each
/// analysis can take its own copy of the scoped dataset. Relative order of the
/// surviving rows is preserved for the time-series chart.

use crate::model::{LocationScope, Observation};

/// Wind speeds above this are treated as sensor errors and dropped.
pub const OUTLIER_WIND_KPH: f64 = 60.0;

/// Keeps observations with `wind_kph <= 60`.
///
/// NaN readings fail the comparison and are dropped along with the outliers.
pub fn filter_outliers(observations: &[Observation]) -> Vec<Observation> {
    observations
        .iter()
        .filter(|o| is_plausible(o))
        .cloned()
        .collect()
}

fn is_plausible(observation: &Observation) -> bool {
    observation.wind_kph <= OUTLIER_WIND_KPH
}

fn in_scope(observation: &Observation, scope: &LocationScope) -> bool {
    match scope {
        LocationScope::All => true,
        LocationScope::Only(name) => observation.location_name == *name,
    }
}

/// Restricts observations to one location (exact match).
///
/// An unknown location yields an empty vector, not an error.
pub fn scope_location(observations: &[Observation], scope: &LocationScope) -> Vec<Observation> {
    observations
        .iter()
        .filter(|o| in_scope(o, scope))
        .cloned()
        .collect()
}

/// Outlier filter followed by location scoping.
pub fn prepare(observations: &[Observation], scope: &LocationScope) -> Vec<Observation> {
    scope_location(&filter_outliers(observations), scope)
}

/// Number of rows `prepare` would return, without copying them.
pub fn count_prepared(observations: &[Observation], scope: &LocationScope) -> usize {
    observations
        .iter()
        .filter(|o| is_plausible(o) && in_scope(o, scope))
        .count()
}
