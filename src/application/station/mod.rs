//! Station directory use-cases

pub mod service;

pub use service::{NewStation, StationChanges, StationService};
