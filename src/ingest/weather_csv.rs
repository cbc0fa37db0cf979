/// Global weather repository CSV parser
///
/// Reads the public "GlobalWeatherRepository.csv" export (one row per
/// location per refresh, dozens of columns) and keeps the five columns the
/// wind analyses need:
///
/// | column               | type                       |
/// |----------------------|----------------------------|
/// | `last_updated`       | `YYYY-MM-DD HH:MM[:SS]`    |
/// | `wind_kph`           | number, >= 0               |
/// | `temperature_celsius`| number                     |
/// | `feels_like_celsius` | number                     |
/// | `location_name`      | text                       |
///
/// Columns are located by header name, so order and extra columns do not
/// matter. Fields may be double-quoted (location names such as
/// `"Washington, D.C."` contain commas); `""` inside quotes is a literal quote.

use chrono::NaiveDateTime;
use std::collections::HashMap;
use thiserror::Error;

use crate::model::Observation;

pub const REQUIRED_COLUMNS: [&str; 5] = [
    "last_updated",
    "wind_kph",
    "temperature_celsius",
    "feels_like_celsius",
    "location_name",
];

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CsvError {
    #[error("CSV input has no header line")]
    MissingHeader,

    #[error("CSV header is missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("line {line}: expected at least {expected} fields, found {found}")]
    ShortRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid {column} value '{value}'")]
    InvalidValue {
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("line {line}: unterminated quoted field")]
    UnterminatedQuote { line: usize },
}

/// Splits one CSV line into fields, honouring double quotes.
fn split_fields(line: &str, line_no: usize) -> Result<Vec<String>, CsvError> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err(CsvError::UnterminatedQuote { line: line_no });
    }
    fields.push(current);
    Ok(fields)
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Parses the CSV text into observations, in file order.
///
/// Blank lines are skipped. Any malformed row aborts the parse with its
/// 1-based line number.
pub fn parse_weather_csv(text: &str) -> Result<Vec<Observation>, CsvError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty());

    let (header_no, header_line) = lines.next().ok_or(CsvError::MissingHeader)?;
    let headers = split_fields(header_line, header_no)?;

    // Build column index map
    let col_map: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.trim().trim_start_matches('\u{feff}'), idx))
        .collect();

    let mut indices = [0usize; 5];
    for (slot, column) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = *col_map.get(column).ok_or(CsvError::MissingColumn(column))?;
    }
    let [ts_idx, wind_idx, temp_idx, feels_idx, loc_idx] = indices;
    let needed = indices.iter().max().map_or(0, |m| m + 1);

    let mut observations = Vec::new();

    for (line_no, line) in lines {
        let fields = split_fields(line, line_no)?;
        if fields.len() < needed {
            return Err(CsvError::ShortRow {
                line: line_no,
                expected: needed,
                found: fields.len(),
            });
        }

        let invalid = |column: &'static str, value: &str| CsvError::InvalidValue {
            line: line_no,
            column,
            value: value.to_string(),
        };
        let number = |column: &'static str, idx: usize| {
            let raw = fields[idx].trim();
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| invalid(column, raw))
        };

        let raw_ts = fields[ts_idx].trim();
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| invalid("last_updated", raw_ts))?;

        let wind_kph = number("wind_kph", wind_idx)?;
        if wind_kph < 0.0 {
            return Err(invalid("wind_kph", fields[wind_idx].trim()));
        }

        let location_name = fields[loc_idx].trim();
        if location_name.is_empty() {
            return Err(invalid("location_name", location_name));
        }

        observations.push(Observation {
            timestamp,
            wind_kph,
            temperature_celsius: number("temperature_celsius", temp_idx)?,
            feels_like_celsius: number("feels_like_celsius", feels_idx)?,
            location_name: location_name.to_string(),
        });
    }

    Ok(observations)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
