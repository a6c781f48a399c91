//! Database entities module

pub mod booking;
pub mod station;

pub use booking::Entity as Booking;
pub use station::Entity as Station;
