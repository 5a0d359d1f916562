use funnel_rater::analyzers::analyzer::analyze_file;
use funnel_rater::config::AnalysisConfig;
use funnel_rater::loader::{LoadError, load_records};
use funnel_rater::output::summary_report;

fn fixture_path() -> String {
    format!("{}/tests/fixtures/consultations.csv", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn test_full_pipeline() {
    let bundle = analyze_file(&fixture_path(), &AnalysisConfig::default()).unwrap();

    let basic = &bundle.basic_metrics;
    assert_eq!(basic.total_consultations, 13);
    assert_eq!(basic.total_conversions, 5);
    assert_eq!(basic.active_experts, 2);
    assert_eq!(basic.unique_funnels, 2);
    // India_Medical and NRI_NonMedical; the unrecognized flag defines none.
    assert_eq!(basic.unique_lead_types, 2);

    // The garbage slot timestamp is a coercion failure, not a fatal error.
    assert_eq!(bundle.data_quality.slot_start_at_unparseable, 1);
    assert_eq!(bundle.data_quality.medical_flag_unrecognized, 1);
    assert_eq!(bundle.data_quality.lead_type_undefined, 1);
}

#[test]
fn test_three_day_window_scenario() {
    // The Instagram/India_Medical cohort has 10 events, 4 converted with
    // elapsed days {1, 2, 5, -1}: only two fall inside a 3-day window.
    let bundle = analyze_file(&fixture_path(), &AnalysisConfig::default()).unwrap();

    let three_day = bundle
        .windowed
        .iter()
        .find(|w| w.window_days == 3)
        .unwrap();
    let cohort = three_day
        .rows
        .iter()
        .find(|r| r.funnel == "Instagram" && r.lead_type == "India_Medical")
        .unwrap();

    assert_eq!(cohort.population, 10);
    assert_eq!(cohort.conversions_in_window, 2);
    assert_eq!(cohort.conversion_rate, 20.0);

    // The 5-day conversion enters the 7-day window; the pre-slot payment
    // never does.
    let seven_day = bundle
        .windowed
        .iter()
        .find(|w| w.window_days == 7)
        .unwrap();
    let cohort = seven_day
        .rows
        .iter()
        .find(|r| r.funnel == "Instagram" && r.lead_type == "India_Medical")
        .unwrap();
    assert_eq!(cohort.conversions_in_window, 3);
    assert_eq!(cohort.conversion_rate, 30.0);
}

#[test]
fn test_population_conservation_across_tables() {
    let bundle = analyze_file(&fixture_path(), &AnalysisConfig::default()).unwrap();
    let total = bundle.basic_metrics.total_consultations;

    let hourly: u64 = bundle.hourly.iter().map(|r| r.population).sum();
    assert_eq!(hourly, total);

    let funnels: u64 = bundle.funnel_performance.iter().map(|r| r.population).sum();
    assert_eq!(funnels, total);

    for report in &bundle.windowed {
        let windowed: u64 = report.rows.iter().map(|r| r.population).sum();
        assert_eq!(windowed, total);
    }
}

#[test]
fn test_undefined_lead_type_segment_is_reported() {
    let bundle = analyze_file(&fixture_path(), &AnalysisConfig::default()).unwrap();

    let three_day = bundle
        .windowed
        .iter()
        .find(|w| w.window_days == 3)
        .unwrap();
    let undefined = three_day
        .rows
        .iter()
        .find(|r| r.funnel == "Facebook" && r.lead_type == "undefined")
        .unwrap();
    assert_eq!(undefined.population, 1);
    assert_eq!(undefined.conversions_in_window, 0);
    assert_eq!(undefined.conversion_rate, 0.0);
}

#[test]
fn test_insights_and_recommendations_present() {
    let bundle = analyze_file(&fixture_path(), &AnalysisConfig::default()).unwrap();

    let timing = bundle.key_insights.timing.as_ref().unwrap();
    assert_eq!(timing.peak_hours.len(), 3);

    let funnel = bundle.key_insights.funnel_performance.as_ref().unwrap();
    assert_eq!(funnel.best, "Instagram");
    assert_eq!(funnel.worst, "Facebook");
    assert!(funnel.gap > 0.0);

    let impact = bundle.recommendations.potential_impact.as_ref().unwrap();
    assert!(impact.improvement_points > 0.0);
    assert!(impact.potential_conversion_rate > impact.current_conversion_rate);
    assert!(!bundle.recommendations.immediate.is_empty());

    let report = summary_report(&bundle);
    assert!(report.contains("Best Funnel: Instagram"));
    assert!(!report.contains("N/A"));
}

#[test]
fn test_pipeline_is_idempotent() {
    let config = AnalysisConfig::default();
    let first = serde_json::to_vec(&analyze_file(&fixture_path(), &config).unwrap()).unwrap();
    let second = serde_json::to_vec(&analyze_file(&fixture_path(), &config).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_load_errors_are_distinguishable() {
    let missing = load_records("/nonexistent/consultations.csv").unwrap_err();
    assert!(matches!(missing, LoadError::Unreadable { .. }));

    let path = format!(
        "{}/funnel_rater_it_schema.csv",
        std::env::temp_dir().display()
    );
    std::fs::write(&path, "a,b,c\n1,2,3\n").unwrap();
    let schema = load_records(&path).unwrap_err();
    assert!(matches!(schema, LoadError::SchemaMismatch { .. }));
    std::fs::remove_file(&path).unwrap();
}
