//! Booking lifecycle controller
//!
//! Orchestrates book / cancel / reschedule against the ledger. Slot checks
//! here are pure or advisory; the only authoritative step is the ledger's
//! `claim` or `transfer`.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::{info, warn};

use super::availability::{day_bounds, AvailabilityResolver};
use crate::application::caller::Caller;
use crate::domain::{
    Booking, BookingStatus, DomainError, DomainResult, RepositoryProvider, Slot, SlotClaim,
    SlotGenerator, Station,
};

/// Result of a cancel request. Cancelling a finished booking is a benign no-op.
#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    Cancelled(Booking),
    AlreadyTerminal(Booking),
}

impl CancelOutcome {
    pub fn booking(&self) -> &Booking {
        match self {
            Self::Cancelled(b) | Self::AlreadyTerminal(b) => b,
        }
    }

    pub fn into_booking(self) -> Booking {
        match self {
            Self::Cancelled(b) | Self::AlreadyTerminal(b) => b,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Cancelled(_) => "Cancelled",
            Self::AlreadyTerminal(_) => "AlreadyCancelled",
        }
    }
}

fn conflict_to_unavailable(e: DomainError) -> DomainError {
    match e {
        DomainError::Conflict(msg) => {
            metrics::counter!("booking_conflicts_total").increment(1);
            DomainError::SlotUnavailable(msg)
        }
        other => other,
    }
}

/// Service for the booking lifecycle
pub struct BookingService {
    repos: Arc<dyn RepositoryProvider>,
    availability: AvailabilityResolver,
}

impl BookingService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, generator: SlotGenerator, hide_elapsed: bool) -> Self {
        Self {
            availability: AvailabilityResolver::new(repos.clone(), generator, hide_elapsed),
            repos,
        }
    }

    pub fn availability(&self) -> &AvailabilityResolver {
        &self.availability
    }

    fn generator(&self) -> &SlotGenerator {
        self.availability.generator()
    }

    // ── Queries ─────────────────────────────────────────────────

    pub async fn list_available_slots(&self, station_id: &str, date: NaiveDate) -> DomainResult<Vec<Slot>> {
        self.availability.list_available_slots(station_id, date).await
    }

    pub async fn get_booking(&self, caller: &Caller, booking_id: &str) -> DomainResult<Booking> {
        let booking = self.load_booking(booking_id).await?;
        if !caller.may_act_for(&booking.user_id) {
            return Err(DomainError::Forbidden(format!(
                "booking {} belongs to another user",
                booking_id
            )));
        }
        Ok(booking)
    }

    /// Bookings of the caller, latest slot first, optionally by status.
    pub async fn list_my_bookings(
        &self,
        caller: &Caller,
        status: Option<BookingStatus>,
    ) -> DomainResult<Vec<Booking>> {
        let mut bookings = self.repos.bookings().find_for_user(&caller.user_id).await?;
        if let Some(status) = status {
            bookings.retain(|b| b.status == status);
        }
        Ok(bookings)
    }

    /// Every booking of a station on `date`, any status. Operators only.
    pub async fn list_station_bookings(
        &self,
        caller: &Caller,
        station_id: &str,
        date: NaiveDate,
    ) -> DomainResult<Vec<Booking>> {
        if !caller.is_operator() {
            return Err(DomainError::Forbidden(
                "only operators may list station bookings".into(),
            ));
        }
        self.load_station(station_id).await?;

        let (from, to) = day_bounds(date);
        self.repos.bookings().find_for_station(station_id, from, to).await
    }

    // ── Commands ────────────────────────────────────────────────

    /// Book the slot of `station_id` starting at `start` on `date`.
    pub async fn book_slot(
        &self,
        caller: &Caller,
        station_id: &str,
        date: NaiveDate,
        start: NaiveTime,
    ) -> DomainResult<Booking> {
        self.create_booking(caller, station_id, date.and_time(start).and_utc())
            .await
    }

    /// Book the slot of `station_id` that begins at the instant `start`.
    pub async fn create_booking(
        &self,
        caller: &Caller,
        station_id: &str,
        start: DateTime<Utc>,
    ) -> DomainResult<Booking> {
        let station = self.load_station(station_id).await?;
        let slot = self.resolve_slot(&station, start)?;

        let booking = self
            .repos
            .bookings()
            .claim(SlotClaim::for_slot(caller.user_id.clone(), &slot))
            .await
            .map_err(conflict_to_unavailable)?;

        metrics::counter!("bookings_claimed_total").increment(1);
        info!(
            booking_id = %booking.id,
            station_id = %booking.station_id,
            slot_start = %booking.slot_start,
            user_id = %booking.user_id,
            "Slot booked"
        );
        Ok(booking)
    }

    /// Cancel a booking. A booking that already left `Active` yields
    /// `CancelOutcome::AlreadyTerminal` and is not touched.
    pub async fn cancel_booking(&self, caller: &Caller, booking_id: &str) -> DomainResult<CancelOutcome> {
        let booking = self.get_booking(caller, booking_id).await?;
        if booking.status.is_terminal() {
            return Ok(CancelOutcome::AlreadyTerminal(booking));
        }

        match self.repos.bookings().release(booking_id).await {
            Ok(cancelled) => {
                metrics::counter!("bookings_cancelled_total").increment(1);
                info!(
                    booking_id = %cancelled.id,
                    station_id = %cancelled.station_id,
                    slot_start = %cancelled.slot_start,
                    cancelled_by = %caller.user_id,
                    "Booking cancelled"
                );
                Ok(CancelOutcome::Cancelled(cancelled))
            }
            // Lost a race with another cancel or the completion sweep.
            Err(DomainError::AlreadyTerminal { .. }) => {
                let current = self.load_booking(booking_id).await?;
                Ok(CancelOutcome::AlreadyTerminal(current))
            }
            Err(e) => Err(e),
        }
    }

    /// Move a booking to another slot, possibly at another station.
    ///
    /// On any failure the original booking stays active at its original slot.
    pub async fn reschedule_booking(
        &self,
        caller: &Caller,
        booking_id: &str,
        new_station_id: &str,
        new_start: DateTime<Utc>,
    ) -> DomainResult<Booking> {
        let booking = self.get_booking(caller, booking_id).await?;
        if booking.status.is_terminal() {
            return Err(DomainError::AlreadyTerminal {
                id: booking.id,
                status: booking.status.to_string(),
            });
        }

        let station = self.load_station(new_station_id).await?;
        let slot = self.resolve_slot(&station, new_start)?;
        if slot.key() == booking.key() {
            return Err(DomainError::InvalidSlot(format!(
                "booking {} already holds {}",
                booking.id, slot
            )));
        }

        if !self.availability.is_free(&slot).await? {
            metrics::counter!("booking_conflicts_total").increment(1);
            return Err(DomainError::SlotUnavailable(format!("slot {} already held", slot.key())));
        }

        // The booking keeps its owner even when an operator moves it.
        let replacement = self
            .repos
            .bookings()
            .transfer(booking_id, SlotClaim::for_slot(booking.user_id.clone(), &slot))
            .await
            .map_err(conflict_to_unavailable)?;

        metrics::counter!("bookings_rescheduled_total").increment(1);
        info!(
            booking_id = %replacement.id,
            rescheduled_from = %booking.id,
            station_id = %replacement.station_id,
            slot_start = %replacement.slot_start,
            user_id = %replacement.user_id,
            "Booking rescheduled"
        );
        Ok(replacement)
    }

    // ── Helpers ─────────────────────────────────────────────────

    async fn load_booking(&self, booking_id: &str) -> DomainResult<Booking> {
        self.repos
            .bookings()
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", "id", booking_id))
    }

    async fn load_station(&self, station_id: &str) -> DomainResult<Station> {
        self.repos
            .stations()
            .find_by_id(station_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Station", "id", station_id))
    }

    /// The generated slot that starts at `start`, if the station is open for
    /// bookings and the slot has not begun yet.
    fn resolve_slot(&self, station: &Station, start: DateTime<Utc>) -> DomainResult<Slot> {
        if !station.is_active {
            return Err(DomainError::Validation(format!(
                "station {} is not accepting bookings",
                station.id
            )));
        }

        let slot = self.generator().slot_at(station, start).ok_or_else(|| {
            DomainError::InvalidSlot(format!(
                "{} is not the start of a {}-minute slot within {}-{} at station {}",
                start.format("%Y-%m-%dT%H:%M:%SZ"),
                self.generator().duration().minutes(),
                station.operating_hours.open().format("%H:%M"),
                station.operating_hours.close().format("%H:%M"),
                station.id
            ))
        })?;

        if slot.has_started(Utc::now()) {
            warn!(station_id = %station.id, slot = %slot, "Rejected booking for a slot in the past");
            return Err(DomainError::InvalidSlot(format!("slot {} has already started", slot)));
        }
        Ok(slot)
    }
}
