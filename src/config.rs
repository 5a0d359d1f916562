use anyhow::Result;
use serde::Deserialize;

/// Tuning knobs for one analysis run.
///
/// The weights and the monthly multiplier are business policy, not part of
/// the algorithm; keep them here so a policy change never touches the
/// aggregation code.
///
/// Stored as a plain JSON object on disk when loaded from a file:
/// ```json
/// {
///   "window_days": [3, 7],
///   "monthly_multiplier": 4.0,
///   "top_hours": 3
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Cohort window lengths, in days, to compute rate tables for.
    pub window_days: Vec<i64>,
    /// Scales the dataset's consultation count to a monthly volume when
    /// projecting additional conversions.
    pub monthly_multiplier: f64,
    /// How many peak hours to surface in the timing insight.
    pub top_hours: usize,
    /// Weight of the expert-class performance gap in the blended
    /// potential-improvement estimate.
    pub class_gap_weight: f64,
    /// Weight of the funnel performance gap in the same estimate.
    pub funnel_gap_weight: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            window_days: vec![3, 7],
            monthly_multiplier: 4.0,
            top_hours: 3,
            class_gap_weight: 0.3,
            funnel_gap_weight: 0.2,
        }
    }
}

impl AnalysisConfig {
    /// Loads the config from a JSON file at `path`. Absent keys keep their
    /// defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.window_days, vec![3, 7]);
        assert_eq!(config.monthly_multiplier, 4.0);
        assert_eq!(config.top_hours, 3);
        assert_eq!(config.class_gap_weight, 0.3);
        assert_eq!(config.funnel_gap_weight, 0.2);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let path = format!("{}/funnel_rater_test_config.json", env::temp_dir().display());
        fs::write(&path, r#"{"window_days": [1, 14], "top_hours": 5}"#).unwrap();

        let config = AnalysisConfig::load(&path).unwrap();
        assert_eq!(config.window_days, vec![1, 14]);
        assert_eq!(config.top_hours, 5);
        assert_eq!(config.monthly_multiplier, 4.0);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file_is_error() {
        assert!(AnalysisConfig::load("/nonexistent/funnel_rater.json").is_err());
    }
}
