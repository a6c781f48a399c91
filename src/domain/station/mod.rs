//! Station aggregate
//!
//! The station directory: identity, location, operating hours and connector
//! inventory of each charging bunk. Read-only to the reservation engine.

pub mod model;
pub mod repository;

pub use model::{OperatingHours, Station};
pub use repository::StationRepository;
