//! In-process storage backends

mod memory;

pub use memory::{InMemoryBookingLedger, InMemoryRepositoryProvider, InMemoryStationRepository};
