//! Priority-tiered selection of points that fit a shift.
//!
//! Selection works on indices into a point table so callers can map the
//! chosen stops back to their own per-point state.

use std::collections::HashMap;

use crate::point::{MaintenancePoint, Priority};

/// Setup and transit allowance added to every admitted stop, in minutes.
pub const STOP_OVERHEAD_MINUTES: u32 = 10;

/// Groups `candidates` by priority tier, keeping their order within a tier.
pub fn group_by_priority(
    points: &[MaintenancePoint],
    candidates: &[usize],
) -> HashMap<Priority, Vec<usize>> {
    let mut groups: HashMap<Priority, Vec<usize>> = HashMap::new();
    for &idx in candidates {
        groups.entry(points[idx].priority).or_default().push(idx);
    }
    groups
}

/// Greedily admits points tier by tier, emergency first.
///
/// Within a tier points are taken by urgency score, highest first. A point
/// that does not fit is skipped and the scan continues, so a shorter job
/// later in the tier can still be admitted. Selection stops after the first
/// tier that leaves the budget exhausted.
pub fn select_points(
    points: &[MaintenancePoint],
    groups: &HashMap<Priority, Vec<usize>>,
    budget_minutes: u32,
    overhead_minutes: u32,
) -> Vec<usize> {
    let mut selected = Vec::new();
    let mut time_used: u32 = 0;

    for priority in Priority::ALL_DESCENDING {
        let Some(tier) = groups.get(&priority) else {
            continue;
        };

        let mut ordered = tier.clone();
        ordered.sort_by(|&a, &b| {
            points[b]
                .urgency_score()
                .total_cmp(&points[a].urgency_score())
        });

        for idx in ordered {
            let needed = points[idx].estimated_time.saturating_add(overhead_minutes);
            if time_used.saturating_add(needed) <= budget_minutes {
                selected.push(idx);
                time_used += needed;
            }
        }

        if time_used >= budget_minutes {
            break;
        }
    }

    tracing::debug!(
        selected = selected.len(),
        time_used,
        budget_minutes,
        "selected points for shift"
    );
    selected
}
