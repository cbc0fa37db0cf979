#!/usr/bin/env rust
//! Weather CSV Loader
//!
//! Loads the weather repository CSV export into the Postgres weather table:
//! 1. Parse the export, keeping last_updated, wind_kph, temperature_celsius,
//!    feels_like_celsius and location_name
//! 2. Create the table if it does not exist
//! 3. Replace the table contents with the parsed rows in one transaction
//!
//! Outliers are kept; the analyses filter them at query time.
//!
//! Usage:
//!   cargo run --bin load_weather_csv -- GlobalWeatherRepository.csv
//!
//! Environment:
//!   DATABASE_URL - PostgreSQL connection string (from .env)

use winds_service::config::{load_config, DEFAULT_CONFIG_PATH};
use winds_service::db::{connect_with_validation, ensure_table, replace_observations};
use winds_service::ingest::weather_csv::parse_weather_csv;
use winds_service::logging::{init_logging, DEFAULT_FILTER};

use std::collections::BTreeSet;
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(DEFAULT_FILTER);

    let args: Vec<String> = env::args().collect();
    let Some(path) = args.get(1) else {
        eprintln!("Usage: {} <weather.csv>", args[0]);
        std::process::exit(1);
    };

    println!("🌬  Weather CSV Loader");
    println!("=====================\n");

    let config = load_config(DEFAULT_CONFIG_PATH)?;
    let table = &config.database.table;

    println!("📋 Parsing {}...", path);
    let text = std::fs::read_to_string(path)?;
    let observations = parse_weather_csv(&text).unwrap_or_else(|e| {
        eprintln!("\n❌ {}: {}\n", path, e);
        std::process::exit(1);
    });
    let locations: BTreeSet<&str> = observations
        .iter()
        .map(|o| o.location_name.as_str())
        .collect();
    println!("✓ Parsed {} rows across {} locations\n", observations.len(), locations.len());

    println!("📊 Connecting to database...");
    let mut client = connect_with_validation().unwrap_or_else(|e| {
        eprintln!("\n{}\n", e);
        std::process::exit(1);
    });
    println!("✓ Connected\n");

    ensure_table(&mut client, table)?;

    println!("📥 Replacing contents of {}...", table);
    let inserted = replace_observations(&mut client, table, &observations)?;

    println!("\n🎉 LOAD COMPLETE");
    println!("=====================");
    println!("Rows inserted: {}", inserted);
    println!("Locations:     {}", locations.len());

    Ok(())
}
