//! Greedy multi-crew assignment under a per-crew shift budget.
//!
//! Points are taken in score order and handed to the least-loaded crew of
//! their type. A point that does not fit that crew is dropped; other crews
//! of the same type are not tried. This keeps the assignment a single pass
//! and must not be "fixed" silently, since it changes scheduling outcomes.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::point::{CrewType, MaintenancePoint};
use crate::scorer::{PriorityScore, Scorer};

/// Per-type crew schedules: one point list per crew, in assignment order.
pub type CrewSchedule = BTreeMap<CrewType, Vec<Vec<MaintenancePoint>>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceOptions {
    /// Crews available per type.
    pub crews: BTreeMap<CrewType, usize>,
    /// Shift length per crew.
    pub work_hours: u32,
    /// Travel and setup allowance charged after each assigned point.
    pub transition_minutes: u32,
}

impl Default for BalanceOptions {
    fn default() -> Self {
        Self {
            crews: BTreeMap::new(),
            work_hours: 8,
            transition_minutes: 10,
        }
    }
}

impl BalanceOptions {
    pub fn with_crews(mut self, crew_type: CrewType, count: usize) -> Self {
        self.crews.insert(crew_type, count);
        self
    }

    pub fn budget_minutes(&self) -> u32 {
        self.work_hours.saturating_mul(60)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=24).contains(&self.work_hours) {
            return Err(Error::invalid_input(format!(
                "work hours must be between 1 and 24, got {}",
                self.work_hours
            )));
        }
        Ok(())
    }
}

/// Distributes scored points over crews, per crew type.
///
/// `scored` must already be in descending score order. Crew types with no
/// points are left out of the result.
pub fn balance_crews(scored: &[PriorityScore], options: &BalanceOptions) -> CrewSchedule {
    let budget = options.budget_minutes();
    let mut schedule = CrewSchedule::new();

    for (&crew_type, &crew_count) in &options.crews {
        let queue: Vec<&MaintenancePoint> = scored
            .iter()
            .map(|s| &s.point)
            .filter(|p| p.team_type == crew_type)
            .collect();
        if queue.is_empty() {
            continue;
        }

        let mut crews: Vec<Vec<MaintenancePoint>> = vec![Vec::new(); crew_count];
        let mut heap: BinaryHeap<Reverse<(u32, usize)>> =
            (0..crew_count).map(|i| Reverse((0, i))).collect();
        let mut dropped = 0usize;

        for point in queue {
            let Some(Reverse((accumulated, crew))) = heap.pop() else {
                dropped += 1;
                continue;
            };

            let finished = accumulated.saturating_add(point.estimated_time);
            if finished <= budget {
                crews[crew].push(point.clone());
                heap.push(Reverse((finished.saturating_add(options.transition_minutes), crew)));
            } else {
                // the popped crew is not returned to the heap
                dropped += 1;
            }
        }

        if dropped > 0 {
            tracing::warn!(crew_type = %crew_type, dropped, "points left unassigned");
        }
        tracing::debug!(
            crew_type = %crew_type,
            crews = crew_count,
            assigned = crews.iter().map(Vec::len).sum::<usize>(),
            "balanced crew type"
        );
        schedule.insert(crew_type, crews);
    }

    schedule
}

/// Scores `points` and balances them across crews in one call.
pub fn schedule_crews(
    points: &[MaintenancePoint],
    scorer: &Scorer,
    reference: DateTime<Utc>,
    options: &BalanceOptions,
) -> Result<CrewSchedule> {
    options.validate()?;
    let scored = scorer.score_points(points, reference);
    Ok(balance_crews(&scored, options))
}
