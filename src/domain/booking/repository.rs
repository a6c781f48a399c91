//! Reservation ledger interface
//!
//! Every status change of a booking goes through this trait. Implementations
//! must make `claim` and `transfer` atomic with respect to the
//! `(station_id, slot_start)` key: the check for an existing active booking
//! and the insert are one indivisible step.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{Booking, SlotClaim};
use crate::domain::DomainResult;

#[async_trait]
pub trait BookingLedger: Send + Sync {
    /// Atomically create an active booking for `claim`.
    ///
    /// Fails with `DomainError::Conflict` when another active booking holds
    /// the same station and slot start.
    async fn claim(&self, claim: SlotClaim) -> DomainResult<Booking>;

    /// Move an active booking to `Cancelled`.
    ///
    /// Fails with `NotFound` for an unknown ID and `AlreadyTerminal` when the
    /// booking is no longer active; the stored record is left unchanged.
    async fn release(&self, booking_id: &str) -> DomainResult<Booking>;

    /// Release `booking_id` and claim `claim` as one unit.
    ///
    /// On any failure (`NotFound`, `AlreadyTerminal`, `Conflict`, storage)
    /// the old booking keeps its pre-transfer state and nothing new is stored.
    async fn transfer(&self, booking_id: &str, claim: SlotClaim) -> DomainResult<Booking>;

    async fn find_by_id(&self, booking_id: &str) -> DomainResult<Option<Booking>>;

    /// Active bookings at a station with `from <= slot_start < to`.
    async fn find_active_for_station(
        &self,
        station_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<Booking>>;

    /// All bookings (any status) at a station with `from <= slot_start < to`.
    async fn find_for_station(
        &self,
        station_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<Booking>>;

    /// Bookings of a user, latest slot first.
    async fn find_for_user(&self, user_id: &str) -> DomainResult<Vec<Booking>>;

    /// Move every active booking whose slot ended at or before `now` to
    /// `Completed`. Returns how many bookings changed. Safe to run
    /// concurrently with `release`: each booking ends in exactly one terminal
    /// state.
    async fn complete_elapsed(&self, now: DateTime<Utc>) -> DomainResult<u64>;
}
