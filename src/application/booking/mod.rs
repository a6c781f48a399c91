//! Booking use-cases: availability, lifecycle, completion sweep

pub mod availability;
pub mod completion;
pub mod service;

pub use availability::{day_bounds, free_slots, AvailabilityResolver};
pub use completion::{start_completion_sweep_task, sweep_once};
pub use service::{BookingService, CancelOutcome};
