//! Application layer - use-case orchestration over the domain

pub mod booking;
pub mod caller;
pub mod station;

pub use booking::{
    start_completion_sweep_task, AvailabilityResolver, BookingService, CancelOutcome,
};
pub use caller::{Caller, CallerRole};
pub use station::{NewStation, StationChanges, StationService};
