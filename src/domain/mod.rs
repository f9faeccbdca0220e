// Domain layer: planner vocabulary and the storage port.

pub mod model;
pub mod ports;
