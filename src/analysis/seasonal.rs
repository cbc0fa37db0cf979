/// Day-of-year aggregation.
///
/// Collapses multi-year data onto a single calendar year: every observation
/// is keyed by its ordinal day (1..=366, Dec 31 of a leap year is 366) and
/// wind speeds are averaged per day across all years. Days without data are
/// absent from the map rather than zero-filled.

use chrono::{Datelike, NaiveDateTime};
use std::collections::BTreeMap;

use crate::model::Observation;

/// Mean wind speed per day of year, ordered by day.
pub type SeasonalAggregate = BTreeMap<u32, f64>;

/// 1-based, leap-year-aware day of year.
pub fn day_of_year(timestamp: &NaiveDateTime) -> u32 {
    timestamp.ordinal()
}

/// Groups observations by day of year and averages `wind_kph` in each group.
///
/// Values within a day are summed in sorted order so the result does not
/// depend on the order rows arrived in.
pub fn aggregate_by_day_of_year(observations: &[Observation]) -> SeasonalAggregate {
    let mut grouped: BTreeMap<u32, Vec<f64>> = BTreeMap::new();

    for obs in observations {
        grouped
            .entry(day_of_year(&obs.timestamp))
            .or_default()
            .push(obs.wind_kph);
    }

    grouped
        .into_iter()
        .map(|(day, mut winds)| {
            winds.sort_by(f64::total_cmp);
            let total: f64 = winds.iter().sum();
            (day, total / winds.len() as f64)
        })
        .collect()
}

/// Splits an aggregate into parallel x/y vectors ready for smoothing.
pub fn to_samples(aggregate: &SeasonalAggregate) -> (Vec<f64>, Vec<f64>) {
    aggregate
        .iter()
        .map(|(&day, &mean)| (f64::from(day), mean))
        .unzip()
}
