//! Wind Analysis Service - Command Line Runner
//!
//! Loads the weather dataset and produces the four wind charts for one
//! location (or all of them):
//! 1. Wind speed over time, with the mean wind speed
//! 2. Seasonal (day-of-year) average wind speed with a LOESS trend
//! 3. Feels-like temperature delta vs wind speed
//! 4. Actual temperature vs wind speed
//!
//! Usage:
//!   cargo run --release                              # List available locations
//!   cargo run --release -- --location Kyiv           # Analyse one location
//!   cargo run --release -- --location ALL --json     # All locations, JSON report
//!   cargo run --release -- --csv weather.csv --location Lviv --parallel
//!
//! Environment:
//!   DATABASE_URL - PostgreSQL connection string (unless --csv is given)
//!   RUST_LOG     - log filter (default: winds_service=info)

use winds_service::analysis::loess::{CurveFit, SmoothedCurve};
use winds_service::analysis::runner::AnalysisOutcome;
use winds_service::analysis::{AnalysisReport, WindAnalyzer};
use winds_service::artifacts::MemoryArtifactStore;
use winds_service::cache::DatasetCache;
use winds_service::config::{load_config, DEFAULT_CONFIG_PATH};
use winds_service::db::{InMemorySource, PostgresSource, WeatherSource};
use winds_service::ingest::weather_csv::parse_weather_csv;
use winds_service::logging::{init_logging, DEFAULT_FILTER};
use winds_service::model::LocationScope;

use std::env;
use std::sync::Arc;
use threadpool::ThreadPool;

struct Args {
    location: Option<String>,
    csv: Option<String>,
    config: String,
    parallel: bool,
    json: bool,
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {} [--location NAME|ALL] [--csv FILE] [--config FILE] [--parallel] [--json]",
        program
    )
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args {
        location: None,
        csv: None,
        config: DEFAULT_CONFIG_PATH.to_string(),
        parallel: false,
        json: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--location" | "--csv" | "--config" => {
                let Some(value) = args.get(i + 1) else {
                    eprintln!("Error: {} requires a value", args[i]);
                    eprintln!("{}", usage(&args[0]));
                    std::process::exit(1);
                };
                match args[i].as_str() {
                    "--location" => parsed.location = Some(value.clone()),
                    "--csv" => parsed.csv = Some(value.clone()),
                    _ => parsed.config = value.clone(),
                }
                i += 2;
            }
            "--parallel" => {
                parsed.parallel = true;
                i += 1;
            }
            "--json" => {
                parsed.json = true;
                i += 1;
            }
            "-h" | "--help" => {
                println!("{}", usage(&args[0]));
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("{}", usage(&args[0]));
                std::process::exit(1);
            }
        }
    }

    parsed
}

fn open_source(args: &Args, table: &str) -> Result<Box<dyn WeatherSource>, Box<dyn std::error::Error>> {
    match &args.csv {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("failed to read {}: {}", path, e))?;
            let observations = parse_weather_csv(&text)?;
            println!("✓ Parsed {} rows from {}", observations.len(), path);
            Ok(Box::new(InMemorySource::new(observations)))
        }
        None => {
            let source = PostgresSource::connect(table)?;
            println!("✓ Connected to table {}", source.table());
            Ok(Box::new(source))
        }
    }
}

fn main() {
    init_logging(DEFAULT_FILTER);
    let args = parse_args();

    println!("🌬  Wind Analysis Service");
    println!("========================\n");

    let config = load_config(&args.config).unwrap_or_else(|e| {
        eprintln!("\n❌ {}\n", e);
        std::process::exit(1);
    });

    let mut source = open_source(&args, &config.database.table).unwrap_or_else(|e| {
        eprintln!("\n❌ {}\n", e);
        std::process::exit(1);
    });

    let Some(location) = &args.location else {
        match source.list_locations() {
            Ok(locations) => {
                println!("\nAvailable locations ({}):", locations.len());
                for name in &locations {
                    println!("   {}", name);
                }
                println!("\nRun with --location NAME (or --location ALL) to analyse.");
            }
            Err(e) => {
                eprintln!("\n❌ Failed to list locations: {}\n", e);
                std::process::exit(1);
            }
        }
        return;
    };

    let cache = DatasetCache::load(source.as_mut()).unwrap_or_else(|e| {
        eprintln!("\n❌ {}\n", e);
        std::process::exit(1);
    });
    let snapshot = cache.current();

    let scope = LocationScope::from_query(location);
    if let Some(name) = scope.location() {
        if !snapshot.has_location(name) {
            eprintln!("⚠ Location '{}' not found; charts will be empty", name);
        }
    }

    let analyzer = WindAnalyzer::new(config.analysis.clone(), Arc::new(MemoryArtifactStore::new()));
    let report = if args.parallel || config.analysis.parallel {
        let pool = ThreadPool::new(4);
        analyzer.run_parallel(Arc::clone(&snapshot.observations), &scope, &pool)
    } else {
        analyzer.run(&snapshot.observations, &scope)
    };

    print_summary(&report);

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("❌ Failed to serialize report: {}", e);
                std::process::exit(1);
            }
        }
    }

    if !report.all_ready() {
        std::process::exit(1);
    }
}

fn describe_curve(curve: &SmoothedCurve) -> String {
    match curve.fit {
        CurveFit::Loess { fraction, span, iterations } => format!(
            "LOESS over {} points (frac {}, span {}, {} robustness passes)",
            curve.len(),
            fraction,
            span,
            iterations
        ),
        CurveFit::Passthrough => format!("{} point(s), too few to smooth", curve.len()),
        CurveFit::Empty => "no points".to_string(),
    }
}

fn print_outcome<T>(title: &str, outcome: &AnalysisOutcome<T>, describe: impl Fn(&T) -> String) {
    match outcome {
        AnalysisOutcome::Ready { artifact, data } => {
            println!("   ✓ {:<22} {}", title, describe(data));
            println!("     artifact {}", artifact);
        }
        AnalysisOutcome::Failed { error } => {
            println!("   ✗ {:<22} {}", title, error);
        }
    }
}

fn print_summary(report: &AnalysisReport) {
    println!("\n📈 Analyses for {} ({} rows after filtering)", report.scope.label(), report.rows_in_scope);

    print_outcome("Wind over time", &report.wind_over_time, |d| match d.mean_wind_kph {
        Some(mean) => format!("{} readings, mean {:.1} kph", d.series.len(), mean),
        None => "no readings".to_string(),
    });
    print_outcome("Seasonal average", &report.seasonal_average, |d| {
        format!("{} days, {}", d.daily_means.len(), describe_curve(&d.curve))
    });
    print_outcome("Temp delta vs wind", &report.temp_delta_vs_wind, |d| {
        format!("{} samples, {}", d.samples.len(), describe_curve(&d.trend))
    });
    print_outcome("Temp vs wind", &report.temp_vs_wind, |d| {
        format!("{} samples, {}", d.samples.len(), describe_curve(&d.trend))
    });

    let failures = report.failures();
    if failures.is_empty() {
        println!("\n🎉 All charts produced");
    } else {
        println!("\n⚠ {} analysis(es) failed", failures.len());
    }
}
