//! Planner configuration and point-file loading.
//!
//! Every section is optional in the JSON file; missing fields take their
//! defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::balancer::BalanceOptions;
use crate::error::Result;
use crate::optimizer::OptimizeOptions;
use crate::point::MaintenancePoint;
use crate::report::ReportOptions;
use crate::scorer::ScoreWeights;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub optimize: OptimizeOptions,
    pub weights: ScoreWeights,
    pub balance: BalanceOptions,
    pub report: ReportOptions,
}

impl PlannerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::from_json_str(&fs::read_to_string(path)?)?;
        tracing::debug!(path = %path.display(), "loaded planner config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.optimize.validate()?;
        self.balance.validate()
    }
}

/// Reads a JSON array of points and validates each one.
pub fn load_points(path: impl AsRef<Path>) -> Result<Vec<MaintenancePoint>> {
    let path = path.as_ref();
    let points: Vec<MaintenancePoint> = serde_json::from_str(&fs::read_to_string(path)?)?;
    for point in &points {
        point.validate()?;
    }
    tracing::info!(path = %path.display(), points = points.len(), "loaded points");
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::point::CrewType;

    #[test]
    fn partial_sections_keep_defaults() {
        let config = PlannerConfig::from_json_str(
            r#"{
                "optimize": { "max_hours": 6 },
                "weights": { "complaints": 12.5 },
                "balance": { "crews": { "asfalto": 3 } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.optimize.max_hours, 6);
        assert_eq!(config.optimize.workers, 4);
        assert_eq!(config.weights.complaints, 12.5);
        assert_eq!(config.weights.priority_base, 100.0);
        assert_eq!(config.balance.crews[&CrewType::Asphalt], 3);
        assert_eq!(config.report, ReportOptions::default());
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(PlannerConfig::from_json_str("{}").unwrap(), PlannerConfig::default());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = PlannerConfig::from_json_str(r#"{ "optimize": { "max_hours": 20 } }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(matches!(
            PlannerConfig::from_json_str("not json"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load_points("/nonexistent/points.json"),
            Err(Error::Io(_))
        ));
    }
}
