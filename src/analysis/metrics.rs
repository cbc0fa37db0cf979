/// Derived columns and summary statistics.

use crate::model::Observation;

/// Feels-like minus actual temperature (°C). Negative means it feels colder.
pub fn temp_delta(observation: &Observation) -> f64 {
    observation.feels_like_celsius - observation.temperature_celsius
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean wind speed over a set of observations.
pub fn mean_wind_kph(observations: &[Observation]) -> Option<f64> {
    let winds: Vec<f64> = observations.iter().map(|o| o.wind_kph).collect();
    mean(&winds)
}
