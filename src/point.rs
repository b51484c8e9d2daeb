//! Maintenance point model.
//!
//! A point is an immutable repair task at a location. Enumerations are closed
//! and carry their wire names; priority ordering always goes through
//! [`Priority::ordinal`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::haversine::Coordinates;

/// Durations above this many minutes are treated as inefficient.
pub const LONG_JOB_MINUTES: u32 = 120;

macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire name used by the API and storage layers.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($wire => Ok($name::$variant),)+
                    other => Err(Error::invalid_input(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

/// Priority tier, 5 (emergency) down to 1 (low).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "emergencia")]
    Emergency,
    #[serde(rename = "urgente")]
    Urgent,
    #[serde(rename = "alta")]
    High,
    #[serde(rename = "media")]
    Medium,
    #[serde(rename = "baixa")]
    Low,
}

wire_enum!(Priority {
    Emergency => "emergencia",
    Urgent => "urgente",
    High => "alta",
    Medium => "media",
    Low => "baixa",
});

impl Priority {
    /// Tiers from most to least urgent.
    pub const ALL_DESCENDING: [Priority; 5] = [
        Priority::Emergency,
        Priority::Urgent,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    pub fn ordinal(&self) -> u8 {
        match self {
            Priority::Emergency => 5,
            Priority::Urgent => 4,
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL_DESCENDING.into_iter().find(|p| p.ordinal() == ordinal)
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ordinal().cmp(&other.ordinal())
    }
}

/// Specialised crew that can service a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CrewType {
    #[serde(rename = "asfalto")]
    Asphalt,
    #[serde(rename = "hidraulica")]
    Hydraulic,
    #[serde(rename = "eletrica")]
    Electrical,
    #[serde(rename = "saneamento")]
    Sanitation,
    #[serde(rename = "geral")]
    General,
}

wire_enum!(CrewType {
    Asphalt => "asfalto",
    Hydraulic => "hidraulica",
    Electrical => "eletrica",
    Sanitation => "saneamento",
    General => "geral",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProblemCategory {
    #[serde(rename = "buraco_asfalto")]
    Pothole,
    #[serde(rename = "vazamento_agua")]
    WaterLeak,
    #[serde(rename = "vazamento_esgoto")]
    SewerLeak,
    #[serde(rename = "poste_sem_luz")]
    StreetLightOut,
    #[serde(rename = "fiacao_exposta")]
    ExposedWiring,
    #[serde(rename = "bueiro_entupido")]
    CloggedDrain,
    #[serde(rename = "calcada_quebrada")]
    BrokenSidewalk,
    #[serde(rename = "semaforo_defeito")]
    TrafficLightFault,
}

wire_enum!(ProblemCategory {
    Pothole => "buraco_asfalto",
    WaterLeak => "vazamento_agua",
    SewerLeak => "vazamento_esgoto",
    StreetLightOut => "poste_sem_luz",
    ExposedWiring => "fiacao_exposta",
    CloggedDrain => "bueiro_entupido",
    BrokenSidewalk => "calcada_quebrada",
    TrafficLightFault => "semaforo_defeito",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProblemSize {
    #[serde(rename = "pequeno")]
    Small,
    #[default]
    #[serde(rename = "medio")]
    Medium,
    #[serde(rename = "grande")]
    Large,
}

wire_enum!(ProblemSize {
    Small => "pequeno",
    Medium => "medio",
    Large => "grande",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PointStatus {
    #[default]
    #[serde(rename = "aberto")]
    Open,
    #[serde(rename = "em_andamento")]
    InProgress,
    #[serde(rename = "resolvido")]
    Resolved,
    #[serde(rename = "cancelado")]
    Cancelled,
}

wire_enum!(PointStatus {
    Open => "aberto",
    InProgress => "em_andamento",
    Resolved => "resolvido",
    Cancelled => "cancelado",
});

/// A repair task at a location.
///
/// Values are never mutated after construction; the `with_*` builders consume
/// and return the point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenancePoint {
    /// Assigned by the storage layer; `None` until persisted.
    #[serde(default)]
    pub id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub problem_type: ProblemCategory,
    pub priority: Priority,
    pub team_type: CrewType,
    #[serde(default)]
    pub problem_size: ProblemSize,
    /// Estimated service time in minutes.
    pub estimated_time: u32,
    pub neighborhood: String,
    pub region: String,
    #[serde(default)]
    pub main_road: bool,
    #[serde(default)]
    pub complaints_count: u32,
    #[serde(default)]
    pub affects_traffic: bool,
    #[serde(default)]
    pub affects_commerce: bool,
    #[serde(default)]
    pub near_critical: bool,
    #[serde(default)]
    pub requires_road_block: bool,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: PointStatus,
    #[serde(default)]
    pub observations: String,
}

impl MaintenancePoint {
    /// Creates an open, unpersisted point with no impact flags.
    pub fn new(
        latitude: f64,
        longitude: f64,
        address: impl Into<String>,
        problem_type: ProblemCategory,
        priority: Priority,
        team_type: CrewType,
        estimated_time: u32,
    ) -> Self {
        Self {
            id: None,
            latitude,
            longitude,
            address: address.into(),
            problem_type,
            priority,
            team_type,
            problem_size: ProblemSize::default(),
            estimated_time,
            neighborhood: String::new(),
            region: String::new(),
            main_road: false,
            complaints_count: 0,
            affects_traffic: false,
            affects_commerce: false,
            near_critical: false,
            requires_road_block: false,
            dependencies: Vec::new(),
            materials: Vec::new(),
            photos: Vec::new(),
            created_at: Utc::now(),
            status: PointStatus::Open,
            observations: String::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_location_names(
        mut self,
        neighborhood: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        self.neighborhood = neighborhood.into();
        self.region = region.into();
        self
    }

    pub fn with_problem_size(mut self, size: ProblemSize) -> Self {
        self.problem_size = size;
        self
    }

    pub fn with_complaints(mut self, count: u32) -> Self {
        self.complaints_count = count;
        self
    }

    pub fn on_main_road(mut self) -> Self {
        self.main_road = true;
        self
    }

    pub fn affecting_traffic(mut self) -> Self {
        self.affects_traffic = true;
        self
    }

    pub fn affecting_commerce(mut self) -> Self {
        self.affects_commerce = true;
        self
    }

    pub fn near_critical_facility(mut self) -> Self {
        self.near_critical = true;
        self
    }

    pub fn requiring_road_block(mut self) -> Self {
        self.requires_road_block = true;
        self
    }

    pub fn with_materials<I, S>(mut self, materials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.materials = materials.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_status(mut self, status: PointStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_observations(mut self, observations: impl Into<String>) -> Self {
        self.observations = observations.into();
        self
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Static urgency derived from priority, complaints and impact flags.
    ///
    /// Long jobs (over two hours) are discounted by 20%.
    pub fn urgency_score(&self) -> f64 {
        let mut score = f64::from(self.priority.ordinal()) * 100.0;
        score += f64::from(self.complaints_count) * 10.0;

        if self.near_critical {
            score += 50.0;
        }
        if self.main_road {
            score += 30.0;
        }
        if self.affects_traffic {
            score += 25.0;
        }
        if self.affects_commerce {
            score += 20.0;
        }

        if self.estimated_time > LONG_JOB_MINUTES {
            score *= 0.8;
        }

        score
    }

    /// Boundary checks: coordinate ranges and a positive duration.
    pub fn validate(&self) -> Result<()> {
        if !self.coordinates().is_valid() {
            return Err(Error::invalid_input(format!(
                "coordinates out of range: ({}, {})",
                self.latitude, self.longitude
            )));
        }
        if self.estimated_time == 0 {
            return Err(Error::invalid_input("estimated time must be positive"));
        }
        Ok(())
    }
}
