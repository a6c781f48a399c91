//! Booking aggregate
//!
//! Contains the Booking entity, its status machine, and the reservation
//! ledger interface that is the only writer of booking state.

pub mod model;
pub mod repository;

pub use model::{Booking, BookingStatus, SlotClaim};
pub use repository::BookingLedger;
