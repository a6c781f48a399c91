//! Domain layer: entities, value types and repository interfaces

pub mod booking;
pub mod repositories;
pub mod slot;
pub mod station;

pub use booking::{Booking, BookingLedger, BookingStatus, SlotClaim};
pub use repositories::{DomainResult, RepositoryProvider};
pub use slot::{Slot, SlotDuration, SlotGenerator, SlotKey};
pub use station::{OperatingHours, Station, StationRepository};

pub use crate::shared::errors::DomainError;
