//! Time-aware presentation of an optimized route.
//!
//! Adds per-stop arrival estimates and shift totals. Travel time comes from
//! straight-line distance at a fixed average speed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::haversine::{haversine_km, Coordinates};
use crate::optimizer::RouteResult;
use crate::point::{CrewType, Priority};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    pub average_speed_kmh: f64,
    /// Setup time charged at every stop.
    pub setup_minutes: f64,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            average_speed_kmh: 30.0,
            setup_minutes: 5.0,
        }
    }
}

impl ReportOptions {
    fn travel_minutes(&self, km: f64) -> f64 {
        if self.average_speed_kmh <= 0.0 {
            return 0.0;
        }
        km / self.average_speed_kmh * 60.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopReport {
    pub stop_number: usize,
    pub id: Option<String>,
    pub address: String,
    pub neighborhood: String,
    pub priority: Priority,
    pub estimated_time: u32,
    /// Minutes from shift start until the crew reaches this stop.
    pub arrival_minutes: f64,
    pub distance_to_next_km: Option<f64>,
    pub travel_to_next_minutes: Option<f64>,
    pub coordinates: Coordinates,
    pub complaints_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteReport {
    pub team_type: CrewType,
    pub stops: Vec<StopReport>,
    /// Closed-tour distance reported by the optimizer.
    pub total_distance_km: f64,
    pub total_work_minutes: u32,
    pub total_travel_minutes: f64,
    pub total_setup_minutes: f64,
    pub total_real_minutes: f64,
    pub efficiency_points_per_km: f64,
    pub avg_time_per_point_minutes: f64,
    pub work_time_percentage: f64,
    pub travel_time_percentage: f64,
    pub statistics: BTreeMap<&'static str, usize>,
    /// Present when the real time exceeds the shift.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl RouteReport {
    pub fn from_result(result: &RouteResult, options: &ReportOptions, max_hours: u32) -> Self {
        let route = &result.route;
        let mut stops = Vec::with_capacity(route.len());
        let mut arrival = 0.0;
        let mut total_travel = 0.0;

        for (index, point) in route.iter().enumerate() {
            if index > 0 {
                let prev = &route[index - 1];
                let travel = options.travel_minutes(haversine_km(prev.coordinates(), point.coordinates()));
                arrival += f64::from(prev.estimated_time) + travel + options.setup_minutes;
                total_travel += travel;
            }

            let to_next = route
                .get(index + 1)
                .map(|next| haversine_km(point.coordinates(), next.coordinates()));

            stops.push(StopReport {
                stop_number: index + 1,
                id: point.id.clone(),
                address: point.address.clone(),
                neighborhood: point.neighborhood.clone(),
                priority: point.priority,
                estimated_time: point.estimated_time,
                arrival_minutes: arrival,
                distance_to_next_km: to_next,
                travel_to_next_minutes: to_next.map(|km| options.travel_minutes(km)),
                coordinates: point.coordinates(),
                complaints_count: point.complaints_count,
            });
        }

        let total_work = result.total_time;
        let total_setup = route.len() as f64 * options.setup_minutes;
        let total_real = f64::from(total_work) + total_travel + total_setup;
        let percent = |part: f64| if total_real > 0.0 { part / total_real * 100.0 } else { 0.0 };

        let max_minutes = f64::from(max_hours * 60);
        let warning = (total_real > max_minutes).then(|| {
            format!(
                "route exceeds the shift by {:.1} minutes",
                total_real - max_minutes
            )
        });
        if warning.is_some() {
            tracing::warn!(
                crew_type = %result.team_type,
                total_real_minutes = total_real,
                max_minutes,
                "route exceeds shift"
            );
        }

        Self {
            team_type: result.team_type,
            stops,
            total_distance_km: result.total_distance,
            total_work_minutes: total_work,
            total_travel_minutes: total_travel,
            total_setup_minutes: total_setup,
            total_real_minutes: total_real,
            efficiency_points_per_km: if result.total_distance > 0.0 {
                route.len() as f64 / result.total_distance
            } else {
                0.0
            },
            avg_time_per_point_minutes: if route.is_empty() {
                0.0
            } else {
                f64::from(total_work) / route.len() as f64
            },
            work_time_percentage: percent(f64::from(total_work)),
            travel_time_percentage: percent(total_travel),
            statistics: result.statistics.clone(),
            warning,
        }
    }
}
