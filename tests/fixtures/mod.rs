//! Test fixtures for repair-router.
//!
//! Provides:
//! - Real Aracaju locations (from OpenStreetMap)
//! - A builder for maintenance points with sensible defaults

#![allow(dead_code)]

pub mod aracaju_locations;

pub use aracaju_locations::*;

use repair_router::{CrewType, MaintenancePoint, Priority, ProblemCategory};

/// Point at `location` with an id, a neighborhood taken from `group` and a
/// problem category matching the crew.
pub fn point_at(
    id: &str,
    location: &Location,
    group: &str,
    priority: Priority,
    crew: CrewType,
    minutes: u32,
) -> MaintenancePoint {
    let category = match crew {
        CrewType::Asphalt => ProblemCategory::Pothole,
        CrewType::Hydraulic => ProblemCategory::WaterLeak,
        CrewType::Electrical => ProblemCategory::StreetLightOut,
        CrewType::Sanitation => ProblemCategory::CloggedDrain,
        CrewType::General => ProblemCategory::BrokenSidewalk,
    };
    MaintenancePoint::new(location.lat, location.lng, location.name, category, priority, crew, minutes)
        .with_id(id)
        .with_location_names(group, "Aracaju")
}

/// The five-point scenario: three asphalt jobs in Centro (emergency 45 min,
/// high 20 min, low 15 min) plus one hydraulic and one electrical job.
pub fn centro_scenario() -> Vec<MaintenancePoint> {
    vec![
        point_at("asphalt-emergency", &CENTRO[0], "Centro", Priority::Emergency, CrewType::Asphalt, 45)
            .on_main_road()
            .with_complaints(12),
        point_at("asphalt-high", &CENTRO[1], "Centro", Priority::High, CrewType::Asphalt, 20),
        point_at("asphalt-low", &CENTRO[2], "Centro", Priority::Low, CrewType::Asphalt, 15),
        point_at("water-leak", &CENTRO[3], "Centro", Priority::Urgent, CrewType::Hydraulic, 60),
        point_at("street-light", &CENTRO[4], "Centro", Priority::Medium, CrewType::Electrical, 30),
    ]
}

/// Asphalt jobs spread over the three neighborhood groups.
pub fn citywide_asphalt() -> Vec<MaintenancePoint> {
    let groups: [(&str, &[Location]); 3] = [("Centro", CENTRO), ("Atalaia", ATALAIA), ("Zona Norte", ZONA_NORTE)];
    let priorities = [Priority::Urgent, Priority::High, Priority::Medium, Priority::Low];

    let mut points = Vec::new();
    for (group, locations) in groups {
        for (i, location) in locations.iter().enumerate() {
            let id = format!("{}-{i}", group.to_lowercase().replace(' ', "-"));
            points.push(point_at(
                &id,
                location,
                group,
                priorities[i % priorities.len()],
                CrewType::Asphalt,
                20 + (i as u32 * 5),
            ));
        }
    }
    points
}
