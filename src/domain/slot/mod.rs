//! Bookable time slots
//!
//! Slots are derived from a station's operating hours on demand and never
//! stored. [`SlotKey`] is the one identity shared by the generator, the
//! availability resolver and the reservation ledger.

pub mod generator;
pub mod model;

pub use generator::SlotGenerator;
pub use model::{Slot, SlotDuration, SlotKey};
