/// Integration tests for the wind analysis pipeline
///
/// These tests verify:
/// 1. End-to-end run: dataset → four charts in the artifact store
/// 2. Filter, scope and aggregation properties on generated datasets
/// 3. Smoother sanity on flat and linear signals
/// 4. Repeated and parallel runs give identical numbers
/// 5. CSV export → source → cache → analyses
///
/// No database required.
///
/// Run with: cargo test --test analysis_pipeline

use winds_service::analysis::filters::{filter_outliers, scope_location, OUTLIER_WIND_KPH};
use winds_service::analysis::loess::{smooth, CurveFit, Loess};
use winds_service::analysis::seasonal::aggregate_by_day_of_year;
use winds_service::analysis::WindAnalyzer;
use winds_service::artifacts::{ChartKind, MemoryArtifactStore};
use winds_service::cache::DatasetCache;
use winds_service::config::AnalysisConfig;
use winds_service::db::{InMemorySource, WeatherSource};
use winds_service::ingest::weather_csv::parse_weather_csv;
use winds_service::model::{LocationScope, Observation};

use approx::assert_abs_diff_eq;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::sync::Arc;
use threadpool::ThreadPool;

fn noon(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap()
}

/// Three consecutive days in TestCity plus a neighbour and an outlier.
fn test_city_dataset() -> Vec<Observation> {
    vec![
        Observation::new(noon(2024, 4, 1), 10.0, 20.0, 18.0, "TestCity"),
        Observation::new(noon(2024, 4, 1), 30.0, 11.0, 6.0, "Elsewhere"),
        Observation::new(noon(2024, 4, 2), 20.0, 18.0, 15.0, "TestCity"),
        Observation::new(noon(2024, 4, 2), 95.0, 14.0, 9.0, "TestCity"),
        Observation::new(noon(2024, 4, 3), 15.0, 19.0, 17.0, "TestCity"),
    ]
}

/// Two years of daily readings rotating over three locations, some above the outlier cutoff.
fn generated_dataset() -> Vec<Observation> {
    let locations = ["Kyiv", "Lviv", "Odesa"];
    let start = noon(2022, 1, 1);

    (0..730u32)
        .map(|i| {
            let wind = ((i * 37) % 80) as f64 + 0.5;
            let temp = ((i * 13) % 35) as f64 - 5.0;
            let feels = temp - wind / 10.0;
            Observation::new(
                start + Duration::hours(i as i64 * 24 + (i % 5) as i64),
                wind,
                temp,
                feels,
                locations[(i % 3) as usize],
            )
        })
        .collect()
}

fn analyzer() -> WindAnalyzer<MemoryArtifactStore> {
    WindAnalyzer::new(AnalysisConfig::default(), Arc::new(MemoryArtifactStore::new()))
}

#[test]
fn test_end_to_end_single_location() {
    let analyzer = analyzer();
    let dataset = test_city_dataset();

    let report = analyzer.run(&dataset, &LocationScope::Only("TestCity".to_string()));

    assert!(report.all_ready(), "failures: {:?}", report.failures());
    assert_eq!(report.rows_in_scope, 3);

    let ids: HashSet<String> = report
        .artifacts()
        .iter()
        .map(|(_, id)| id.expect("every analysis should be ready").to_string())
        .collect();
    assert_eq!(ids.len(), 4);
    assert_eq!(analyzer.store().len(), 4);

    let wind = report.wind_over_time.data().unwrap();
    assert_eq!(wind.mean_wind_kph, Some(15.0));
    assert_eq!(wind.series.len(), 3);

    let delta = report.temp_delta_vs_wind.data().unwrap();
    assert_eq!(delta.values(), vec![-2.0, -3.0, -2.0]);
    assert_eq!(delta.reference_levels, vec![-2.0, 2.0]);

    let temp = report.temp_vs_wind.data().unwrap();
    assert_eq!(temp.values(), vec![20.0, 18.0, 19.0]);
}

#[test]
fn test_stored_charts_match_report() {
    let analyzer = analyzer();
    let report = analyzer.run(&test_city_dataset(), &LocationScope::Only("TestCity".to_string()));

    for (kind, id) in report.artifacts() {
        let chart = analyzer.store().get(id.unwrap()).expect("chart stored");
        assert_eq!(chart.kind, kind);
        assert_eq!(chart.scope, report.scope);
    }
}

#[test]
fn test_unknown_location_yields_empty_charts() {
    let report = analyzer().run(&test_city_dataset(), &LocationScope::from_query("Atlantis"));

    assert!(report.all_ready());
    assert_eq!(report.rows_in_scope, 0);
    assert_eq!(report.wind_over_time.data().unwrap().mean_wind_kph, None);
    assert_eq!(report.seasonal_average.data().unwrap().curve.fit, CurveFit::Empty);
    assert!(report.temp_vs_wind.data().unwrap().trend.is_empty());
}

#[test]
fn test_outlier_filter_partitions_rows() {
    let dataset = generated_dataset();
    let kept = filter_outliers(&dataset);

    assert!(kept.iter().all(|o| o.wind_kph <= OUTLIER_WIND_KPH));
    assert!(kept.iter().all(|o| dataset.contains(o)));

    let removed = dataset.len() - kept.len();
    let over = dataset.iter().filter(|o| o.wind_kph > OUTLIER_WIND_KPH).count();
    assert_eq!(removed, over);
    assert!(removed > 0, "generated data should contain outliers");
}

#[test]
fn test_scope_properties() {
    let dataset = generated_dataset();

    let all = scope_location(&dataset, &LocationScope::from_query("ALL"));
    assert_eq!(all, dataset);

    let lviv = scope_location(&dataset, &LocationScope::from_query("Lviv"));
    assert!(!lviv.is_empty());
    assert!(lviv.iter().all(|o| o.location_name == "Lviv"));
}

#[test]
fn test_equal_values_across_years_collapse() {
    let dataset = vec![
        Observation::new(noon(2022, 1, 1), 10.0, 0.0, -3.0, "Kyiv"),
        Observation::new(noon(2023, 1, 1), 10.0, 1.0, -2.0, "Kyiv"),
    ];
    let aggregate = aggregate_by_day_of_year(&dataset);
    assert_eq!(aggregate.len(), 1);
    assert_eq!(aggregate[&1], 10.0);
}

#[test]
fn test_smoother_flat_signal() {
    let xs: Vec<f64> = (1..=50).map(f64::from).collect();
    let ys = vec![7.25; xs.len()];

    let curve = smooth(&xs, &ys, 0.2).unwrap();
    assert_eq!(curve.len(), xs.len());
    for y in curve.ys() {
        assert_abs_diff_eq!(y, 7.25, epsilon = 1e-9);
    }
}

#[test]
fn test_smoother_preserves_linear_trend() {
    let xs: Vec<f64> = (0..30).map(f64::from).collect();
    let ys: Vec<f64> = xs.iter().map(|x| 0.75 * x + 3.0).collect();

    let curve = smooth(&xs, &ys, 1.0).unwrap();
    let fitted = curve.ys();
    assert_abs_diff_eq!(fitted[0], ys[0], epsilon = 1.0);
    assert_abs_diff_eq!(fitted[29], ys[29], epsilon = 1.0);
}

#[test]
fn test_repeated_runs_are_identical() {
    let analyzer = analyzer();
    let dataset = generated_dataset();
    let scope = LocationScope::from_query("Kyiv");

    let first = analyzer.run(&dataset, &scope);
    let second = analyzer.run(&dataset, &scope);

    assert_eq!(first.wind_over_time.data(), second.wind_over_time.data());
    assert_eq!(first.seasonal_average.data(), second.seasonal_average.data());
    assert_eq!(first.temp_delta_vs_wind.data(), second.temp_delta_vs_wind.data());
    assert_eq!(first.temp_vs_wind.data(), second.temp_vs_wind.data());
    assert_eq!(analyzer.store().len(), 8);
}

#[test]
fn test_parallel_matches_sequential_for_all_locations() {
    let analyzer = analyzer();
    let dataset: Arc<[Observation]> = generated_dataset().into();
    let pool = ThreadPool::new(4);

    let sequential = analyzer.run(&dataset, &LocationScope::All);
    let parallel = analyzer.run_parallel(Arc::clone(&dataset), &LocationScope::All, &pool);

    assert!(parallel.all_ready());
    assert_eq!(sequential.rows_in_scope, parallel.rows_in_scope);
    assert_eq!(sequential.wind_over_time.data(), parallel.wind_over_time.data());
    assert_eq!(sequential.seasonal_average.data(), parallel.seasonal_average.data());
    assert_eq!(sequential.temp_delta_vs_wind.data(), parallel.temp_delta_vs_wind.data());
    assert_eq!(sequential.temp_vs_wind.data(), parallel.temp_vs_wind.data());
}

#[test]
fn test_seasonal_curve_uses_configured_fraction() {
    let config = AnalysisConfig {
        seasonal_fraction: 0.3,
        ..AnalysisConfig::default()
    };
    let analyzer = WindAnalyzer::new(config, Arc::new(MemoryArtifactStore::new()));
    let report = analyzer.run(&generated_dataset(), &LocationScope::All);

    match report.seasonal_average.data().unwrap().curve.fit {
        CurveFit::Loess { fraction, .. } => assert_eq!(fraction, 0.3),
        ref other => panic!("expected a LOESS fit, got {:?}", other),
    }
}

#[test]
fn test_invalid_fraction_fails_only_affected_analyses() {
    let config = AnalysisConfig {
        relationship_fraction: 0.0,
        ..AnalysisConfig::default()
    };
    assert!(Loess::new(config.relationship_fraction).is_err());

    let analyzer = WindAnalyzer::new(config, Arc::new(MemoryArtifactStore::new()));
    let report = analyzer.run(&test_city_dataset(), &LocationScope::All);

    assert!(report.wind_over_time.is_ready());
    assert!(report.seasonal_average.is_ready());
    assert!(!report.temp_delta_vs_wind.is_ready());
    assert!(!report.temp_vs_wind.is_ready());

    let failed: Vec<ChartKind> = report.failures().into_iter().map(|(kind, _)| kind).collect();
    assert_eq!(failed, vec![ChartKind::TempDeltaVsWind, ChartKind::TempVsWind]);
    assert_eq!(analyzer.store().len(), 2);
}

const EXPORT: &str = "\
country,location_name,last_updated,temperature_celsius,wind_kph,feels_like_celsius
Ukraine,Kyiv,2024-05-16 13:15,22.0,13.0,24.6
Ukraine,Lviv,2024-05-16 13:15,18.0,9.0,18.0
Ukraine,Kyiv,2024-05-17 13:15,19.0,72.0,14.2
Ukraine,Kyiv,2024-05-18 13:15,17.0,21.0,15.5
";

#[test]
fn test_csv_to_report() {
    let observations = parse_weather_csv(EXPORT).unwrap();
    let mut source = InMemorySource::new(observations);

    let locations: Vec<String> = source.list_locations().unwrap().into_iter().collect();
    assert_eq!(locations, vec!["Kyiv", "Lviv"]);

    let cache = DatasetCache::load(&mut source).unwrap();
    let snapshot = cache.current();
    assert_eq!(snapshot.len(), 4);

    let report = analyzer().run(&snapshot.observations, &LocationScope::from_query("Kyiv"));
    assert!(report.all_ready());
    // 72 kph reading is dropped
    assert_eq!(report.rows_in_scope, 2);
    assert_eq!(report.wind_over_time.data().unwrap().mean_wind_kph, Some(17.0));

    let delta = report.temp_delta_vs_wind.data().unwrap();
    assert_abs_diff_eq!(delta.values()[0], 2.6, epsilon = 1e-9);
    assert_abs_diff_eq!(delta.values()[1], -1.5, epsilon = 1e-9);
}

#[test]
fn test_report_serializes_to_json() {
    let report = analyzer().run(&test_city_dataset(), &LocationScope::Only("TestCity".to_string()));
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["wind_over_time"]["status"], "ready");
    assert_eq!(json["wind_over_time"]["data"]["mean_wind_kph"], 15.0);
    assert_eq!(json["rows_in_scope"], 3);
}
