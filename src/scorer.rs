//! Multi-factor urgency scoring.
//!
//! Each factor contributes only when its trigger holds; absent factors are
//! left out of the breakdown instead of being recorded as zero.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::haversine::{haversine_km, open_path_km};
use crate::point::{LONG_JOB_MINUTES, MaintenancePoint, Priority};

pub const PRIORITY_BASE: &str = "priority_base";
pub const COMPLAINTS: &str = "complaints";
pub const CRITICAL_LOCATION: &str = "critical_location";
pub const MAIN_ROAD: &str = "main_road";
pub const TRAFFIC_IMPACT: &str = "traffic_impact";
pub const COMMERCE_IMPACT: &str = "commerce_impact";
pub const TIME_WAITING: &str = "time_waiting";
pub const CLUSTER_BONUS: &str = "cluster_bonus";
pub const EFFICIENCY_PENALTY: &str = "efficiency_penalty";

/// Factor weights and the proximity radius for the cluster bonus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub priority_base: f64,
    pub complaints: f64,
    pub critical_location: f64,
    pub main_road: f64,
    pub traffic_impact: f64,
    pub commerce_impact: f64,
    /// Per day since creation.
    pub time_waiting: f64,
    /// Per neighbouring point within `proximity_radius_km`.
    pub cluster_bonus: f64,
    /// Per minute above the long-job threshold (negative).
    pub efficiency_penalty: f64,
    pub proximity_radius_km: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            priority_base: 100.0,
            complaints: 10.0,
            critical_location: 50.0,
            main_road: 30.0,
            traffic_impact: 25.0,
            commerce_impact: 20.0,
            time_waiting: 2.0,
            cluster_bonus: 15.0,
            efficiency_penalty: -0.2,
            proximity_radius_km: 0.5,
        }
    }
}

/// A point with its total score and the factors that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityScore {
    pub point: MaintenancePoint,
    pub score: f64,
    pub factors: BTreeMap<&'static str, f64>,
}

/// Proximity groups: for each point index, the number of other points within
/// the radius. The point itself is not counted.
///
/// O(n²) pairwise scan; much cheaper than the routing clusterer.
pub fn proximity_group_sizes(points: &[MaintenancePoint], radius_km: f64) -> Vec<usize> {
    let mut sizes = vec![0usize; points.len()];
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            if haversine_km(points[i].coordinates(), points[j].coordinates()) <= radius_km {
                sizes[i] += 1;
                sizes[j] += 1;
            }
        }
    }
    sizes
}

#[derive(Debug, Clone, Default)]
pub struct Scorer {
    weights: ScoreWeights,
}

impl Scorer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Scores one point given its proximity group size.
    ///
    /// `group_size` counts the other points nearby; the cluster bonus needs
    /// at least two of them.
    pub fn score(
        &self,
        point: &MaintenancePoint,
        reference: DateTime<Utc>,
        group_size: usize,
    ) -> PriorityScore {
        let w = &self.weights;
        let mut factors = BTreeMap::new();

        factors.insert(PRIORITY_BASE, f64::from(point.priority.ordinal()) * w.priority_base);

        if point.complaints_count > 0 {
            factors.insert(COMPLAINTS, f64::from(point.complaints_count) * w.complaints);
        }
        if point.near_critical {
            factors.insert(CRITICAL_LOCATION, w.critical_location);
        }
        if point.main_road {
            factors.insert(MAIN_ROAD, w.main_road);
        }
        if point.affects_traffic {
            factors.insert(TRAFFIC_IMPACT, w.traffic_impact);
        }
        if point.affects_commerce {
            factors.insert(COMMERCE_IMPACT, w.commerce_impact);
        }

        let days_waiting = (reference - point.created_at).num_days();
        if days_waiting > 0 {
            factors.insert(TIME_WAITING, days_waiting as f64 * w.time_waiting);
        }

        if group_size > 1 {
            factors.insert(CLUSTER_BONUS, (group_size - 1) as f64 * w.cluster_bonus);
        }

        if point.estimated_time > LONG_JOB_MINUTES {
            let over = f64::from(point.estimated_time - LONG_JOB_MINUTES);
            factors.insert(EFFICIENCY_PENALTY, over * w.efficiency_penalty);
        }

        let score = factors.values().sum();
        PriorityScore {
            point: point.clone(),
            score,
            factors,
        }
    }

    /// Scores every point and sorts by score, highest first.
    ///
    /// The sort is stable: equal scores keep their input order.
    pub fn score_points(
        &self,
        points: &[MaintenancePoint],
        reference: DateTime<Utc>,
    ) -> Vec<PriorityScore> {
        let groups = proximity_group_sizes(points, self.weights.proximity_radius_km);
        let mut scores: Vec<PriorityScore> = points
            .iter()
            .zip(groups)
            .map(|(point, size)| self.score(point, reference, size))
            .collect();
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));

        tracing::debug!(points = scores.len(), "scored points");
        scores
    }

    /// Ranks candidate next stops after `current`.
    ///
    /// Closeness, priority, same crew, shared materials and same neighborhood
    /// all add to the suggestion score.
    pub fn suggest_next_points<'a>(
        &self,
        current: &MaintenancePoint,
        available: &'a [MaintenancePoint],
        max_suggestions: usize,
    ) -> Vec<(&'a MaintenancePoint, f64)> {
        let current_materials: HashSet<&str> =
            current.materials.iter().map(String::as_str).collect();

        let mut suggestions: Vec<(&MaintenancePoint, f64)> = available
            .iter()
            .filter(|p| !is_same_point(p, current))
            .map(|point| {
                let distance = haversine_km(current.coordinates(), point.coordinates());
                let mut score = (100.0 / (1.0 + distance)) * 0.4;
                score += f64::from(point.priority.ordinal()) * 20.0 * 0.3;

                if point.team_type == current.team_type {
                    score += 30.0;
                }

                let shared = point
                    .materials
                    .iter()
                    .map(String::as_str)
                    .collect::<HashSet<_>>()
                    .intersection(&current_materials)
                    .count();
                score += shared as f64 * 5.0;

                if point.neighborhood == current.neighborhood {
                    score += 20.0;
                }
                (point, score)
            })
            .collect();

        suggestions.sort_by(|a, b| b.1.total_cmp(&a.1));
        suggestions.truncate(max_suggestions);
        suggestions
    }
}

fn is_same_point(a: &MaintenancePoint, b: &MaintenancePoint) -> bool {
    match (&a.id, &b.id) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Quality metrics for an ordered route. Empty routes yield an empty map.
pub fn route_efficiency(route: &[MaintenancePoint]) -> BTreeMap<&'static str, f64> {
    let mut metrics = BTreeMap::new();
    if route.is_empty() {
        return metrics;
    }

    let n = route.len() as f64;
    let total_time: f64 = route.iter().map(|p| f64::from(p.estimated_time)).sum();
    let emergencies = route
        .iter()
        .filter(|p| p.priority == Priority::Emergency)
        .count() as f64;
    let coords: Vec<_> = route.iter().map(MaintenancePoint::coordinates).collect();
    let distance = open_path_km(&coords);
    let neighborhoods = route
        .iter()
        .map(|p| p.neighborhood.as_str())
        .collect::<HashSet<_>>()
        .len() as f64;

    let emergency_ratio = emergencies / n;
    let points_per_km = if distance > 0.0 { n / distance } else { n };
    let avg_time = total_time / n;

    metrics.insert("total_points", n);
    metrics.insert("total_time_minutes", total_time);
    metrics.insert(
        "total_complaints_resolved",
        route.iter().map(|p| f64::from(p.complaints_count)).sum(),
    );
    metrics.insert("emergency_ratio", emergency_ratio);
    metrics.insert(
        "urgency_weighted_score",
        route.iter().map(|p| f64::from(p.priority.ordinal())).sum::<f64>() / n,
    );
    metrics.insert("total_distance_km", distance);
    metrics.insert("efficiency_points_per_km", points_per_km);
    metrics.insert("neighborhood_coverage", neighborhoods);
    metrics.insert("avg_time_per_point", avg_time);

    let overall = (emergency_ratio * 50.0).min(30.0)
        + (points_per_km * 5.0).min(25.0)
        + (neighborhoods * 3.0).min(25.0)
        + (20.0 - avg_time / 3.0).max(0.0);
    metrics.insert("overall_efficiency_score", overall.min(100.0));

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::{CrewType, ProblemCategory};
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap()
    }

    fn point(id: &str, lat: f64, lng: f64, priority: Priority, minutes: u32) -> MaintenancePoint {
        MaintenancePoint::new(
            lat,
            lng,
            format!("Rua {id}"),
            ProblemCategory::Pothole,
            priority,
            CrewType::Asphalt,
            minutes,
        )
        .with_id(id)
        .with_created_at(reference())
    }

    #[test]
    fn absent_factors_are_omitted() {
        let scorer = Scorer::default();
        let s = scorer.score(&point("1", 0.0, 0.0, Priority::Medium, 30), reference(), 1);
        assert_eq!(s.factors.len(), 1);
        assert_relative_eq!(s.factors[PRIORITY_BASE], 200.0);
        assert_relative_eq!(s.score, 200.0);
    }

    #[test]
    fn every_factor_contributes() {
        let scorer = Scorer::default();
        let p = point("1", 0.0, 0.0, Priority::Emergency, 150)
            .with_complaints(3)
            .near_critical_facility()
            .on_main_road()
            .affecting_traffic()
            .affecting_commerce()
            .with_created_at(reference() - Duration::days(4));

        let s = scorer.score(&p, reference(), 3);
        assert_eq!(s.factors.len(), 9);
        assert_relative_eq!(s.factors[COMPLAINTS], 30.0);
        assert_relative_eq!(s.factors[TIME_WAITING], 8.0);
        assert_relative_eq!(s.factors[CLUSTER_BONUS], 30.0);
        assert_relative_eq!(s.factors[EFFICIENCY_PENALTY], -6.0);
        // 500 + 30 + 50 + 30 + 25 + 20 + 8 + 30 - 6
        assert_relative_eq!(s.score, 687.0);

        let pair = scorer.score(&p, reference(), 2);
        assert_relative_eq!(pair.factors[CLUSTER_BONUS], 15.0);
        assert_relative_eq!(pair.score, 672.0);
    }

    #[test]
    fn partial_days_do_not_count_as_waiting() {
        let scorer = Scorer::default();
        let p = point("1", 0.0, 0.0, Priority::Low, 30)
            .with_created_at(reference() - Duration::hours(20));
        let s = scorer.score(&p, reference(), 1);
        assert!(!s.factors.contains_key(TIME_WAITING));
    }

    #[test]
    fn proximity_groups_use_half_kilometer_radius() {
        let points = vec![
            point("a", -10.9650, -37.0570, Priority::Low, 30),
            point("b", -10.9660, -37.0575, Priority::Low, 30),
            point("c", -10.9655, -37.0580, Priority::Low, 30),
            point("far", -10.9000, -37.0000, Priority::Low, 30),
        ];
        assert_eq!(proximity_group_sizes(&points, 0.5), vec![2, 2, 2, 0]);
    }

    #[test]
    fn cluster_bonus_needs_two_neighbors() {
        let scorer = Scorer::default();
        let bonus = |points: &[MaintenancePoint]| -> Vec<Option<f64>> {
            scorer
                .score_points(points, reference())
                .into_iter()
                .map(|s| s.factors.get(CLUSTER_BONUS).copied())
                .collect()
        };

        // about 55 m apart: one neighbor each
        let pair = vec![
            point("a", -10.9650, -37.0570, Priority::Low, 30),
            point("b", -10.9655, -37.0570, Priority::Low, 30),
        ];
        assert_eq!(bonus(&pair), vec![None, None]);

        let triple = vec![
            point("a", -10.9650, -37.0570, Priority::Low, 30),
            point("b", -10.9655, -37.0570, Priority::Low, 30),
            point("c", -10.9652, -37.0575, Priority::Low, 30),
        ];
        assert_eq!(bonus(&triple), vec![Some(15.0); 3]);
    }

    #[test]
    fn scores_sorted_descending_and_stable() {
        let scorer = Scorer::default();
        let points = vec![
            point("low", 0.0, 0.0, Priority::Low, 30),
            point("tie-1", 1.0, 1.0, Priority::High, 30),
            point("emergency", 2.0, 2.0, Priority::Emergency, 30),
            point("tie-2", 3.0, 3.0, Priority::High, 30),
        ];
        let ranked: Vec<_> = scorer
            .score_points(&points, reference())
            .into_iter()
            .map(|s| s.point.id.unwrap())
            .collect();
        assert_eq!(ranked, vec!["emergency", "tie-1", "tie-2", "low"]);
    }

    #[test]
    fn suggestions_exclude_current_and_rank_by_score() {
        let scorer = Scorer::default();
        let current = point("c", -10.9650, -37.0570, Priority::Medium, 30)
            .with_location_names("Centro", "Centro")
            .with_materials(["asfalto"]);
        let available = vec![
            current.clone(),
            point("near", -10.9651, -37.0571, Priority::Low, 30)
                .with_location_names("Centro", "Centro")
                .with_materials(["asfalto"]),
            point("far", -11.2000, -37.3000, Priority::Low, 30),
        ];

        let suggestions = scorer.suggest_next_points(&current, &available, 5);
        let ids: Vec<_> = suggestions.iter().map(|(p, _)| p.id.as_deref().unwrap()).collect();
        assert_eq!(ids, vec!["near", "far"]);

        let limited = scorer.suggest_next_points(&current, &available, 1);
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn efficiency_of_empty_route_is_empty() {
        assert!(route_efficiency(&[]).is_empty());
    }

    #[test]
    fn efficiency_metrics_are_bounded() {
        let route = vec![
            point("1", -10.9655, -37.0573, Priority::Emergency, 45).with_location_names("Centro", "Centro"),
            point("2", -10.9700, -37.0600, Priority::High, 20).with_location_names("Centro", "Centro"),
            point("3", -10.9620, -37.0560, Priority::Low, 15).with_location_names("Sul", "Sul"),
        ];
        let metrics = route_efficiency(&route);
        assert_relative_eq!(metrics["total_points"], 3.0);
        assert_relative_eq!(metrics["total_time_minutes"], 80.0);
        assert_relative_eq!(metrics["neighborhood_coverage"], 2.0);
        assert_relative_eq!(metrics["urgency_weighted_score"], 3.0);
        let overall = metrics["overall_efficiency_score"];
        assert!((0.0..=100.0).contains(&overall));
    }
}
