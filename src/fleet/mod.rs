mod client;
mod poller;
mod store;
mod types;

pub use client::{FleetApi, FleetApiError};
pub use poller::spawn_pollers;
pub use store::{FleetSnapshot, FleetStore};
pub use types::{DroneStatus, EntitySummary, HealthReport};
