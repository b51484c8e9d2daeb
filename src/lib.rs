//! repair-router: route planning for city maintenance crews.
//!
//! Picks the most urgent maintenance points that fit a crew's shift and
//! orders them into a short closed tour. Distances are straight-line
//! (haversine); there is no road network.

pub mod balancer;
pub mod batch;
pub mod cache;
pub mod cluster;
pub mod config;
pub mod error;
pub mod haversine;
pub mod logging;
pub mod optimizer;
pub mod point;
pub mod refine;
pub mod report;
pub mod scorer;
pub mod selector;
pub mod store;
pub mod tags;
pub mod traits;

pub use balancer::{BalanceOptions, CrewSchedule, balance_crews, schedule_crews};
pub use batch::{BatchStrategy, create_work_batches};
pub use config::{PlannerConfig, load_points};
pub use error::{Error, Result};
pub use haversine::{Coordinates, haversine_km};
pub use logging::init_tracing;
pub use optimizer::{OptimizeOptions, RouteOptimizer, RouteResult};
pub use point::{CrewType, MaintenancePoint, PointStatus, Priority, ProblemCategory, ProblemSize};
pub use report::{ReportOptions, RouteReport, StopReport};
pub use scorer::{PriorityScore, ScoreWeights, Scorer, route_efficiency};
pub use store::{InMemoryStore, RouteRequest, plan_route};
pub use tags::{Tag, TagGroup, TagLevel, TagRegistry};
pub use traits::{PointFilter, PointStore};
