pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{LocalStorage, PlannerConfig};
pub use core::{
    cache::RecommendationCache,
    catalog::Catalog,
    export::PlanExporter,
    planner::{Outcome, Plan, PlanRequest, Planner},
};
pub use utils::error::{PlannerError, Result};
