/// Data ingestion: turning upstream exports into `Observation`s.
///
/// - `weather_csv`: global weather repository CSV export
/// - `fixtures` (test only): trimmed sample exports

pub mod fixtures;
pub mod weather_csv;
