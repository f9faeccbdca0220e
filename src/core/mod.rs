pub mod cache;
pub mod catalog;
pub mod export;
pub mod filters;
pub mod forcing;
pub mod planner;
pub mod recommender;
pub mod report;
pub mod roles;
pub mod scoring;
pub mod templates;

pub use crate::domain::ports::Storage;
pub use crate::utils::error::Result;
