//! In-memory storage implementation
//!
//! Single-process backend for development and tests. The booking ledger keeps
//! an index of active slots keyed by [`SlotKey`]; DashMap's entry lock on that
//! key is the critical section for claims.
//!
//! Lock order: an `active_slots` entry is always taken before a `bookings`
//! entry, never the other way round.
//!
//! A transfer reserves the new key in `active_slots` before it releases the
//! old booking and only then stores the replacement. A failed transfer never
//! shows up in queries, but while one is in flight a claim on its target slot
//! is refused even if the transfer later rolls back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::{
    Booking, BookingLedger, BookingStatus, DomainError, DomainResult, RepositoryProvider,
    SlotClaim, SlotKey, Station, StationRepository,
};

fn booking_not_found(id: &str) -> DomainError {
    DomainError::not_found("Booking", "id", id)
}

// ── Stations ───────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryStationRepository {
    stations: DashMap<String, Station>,
}

impl InMemoryStationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StationRepository for InMemoryStationRepository {
    async fn save(&self, station: Station) -> DomainResult<()> {
        match self.stations.entry(station.id.clone()) {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!(
                "station {} already exists",
                station.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(station);
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Station>> {
        Ok(self.stations.get(id).map(|s| s.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<Station>> {
        let mut stations: Vec<Station> = self.stations.iter().map(|e| e.value().clone()).collect();
        stations.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(stations)
    }

    async fn update(&self, station: Station) -> DomainResult<()> {
        match self.stations.get_mut(&station.id) {
            Some(mut existing) => {
                *existing = station;
                Ok(())
            }
            None => Err(DomainError::not_found("Station", "id", station.id)),
        }
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        self.stations
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("Station", "id", id))
    }
}

// ── Bookings ───────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryBookingLedger {
    bookings: DashMap<String, Booking>,
    /// `(station, slot start)` → ID of the one active booking holding it
    active_slots: DashMap<SlotKey, String>,
}

impl InMemoryBookingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `booking` if its slot is free. The vacant entry is held across
    /// both inserts, so no other claim on the key can interleave.
    fn insert_if_free(&self, booking: Booking) -> DomainResult<Booking> {
        match self.active_slots.entry(booking.key()) {
            Entry::Occupied(held) => Err(DomainError::Conflict(format!(
                "slot {} is held by booking {}",
                held.key(),
                held.get()
            ))),
            Entry::Vacant(free) => {
                self.bookings.insert(booking.id.clone(), booking.clone());
                free.insert(booking.id.clone());
                Ok(booking)
            }
        }
    }

    /// Move an active booking to a terminal status and free its slot.
    fn finish(&self, booking_id: &str, next: BookingStatus) -> DomainResult<Booking> {
        let key = self
            .bookings
            .get(booking_id)
            .map(|b| b.value().key())
            .ok_or_else(|| booking_not_found(booking_id))?;

        let slot = self.active_slots.entry(key);
        let mut booking = self
            .bookings
            .get_mut(booking_id)
            .ok_or_else(|| booking_not_found(booking_id))?;

        if !booking.transition(next) {
            return Err(DomainError::AlreadyTerminal {
                id: booking.id.clone(),
                status: booking.status.to_string(),
            });
        }
        if let Entry::Occupied(held) = slot {
            if held.get() == booking_id {
                held.remove();
            }
        }
        Ok(booking.clone())
    }

    /// Hold `booking`'s slot without storing the booking itself.
    fn reserve(&self, booking: &Booking) -> DomainResult<()> {
        match self.active_slots.entry(booking.key()) {
            Entry::Occupied(held) => Err(DomainError::Conflict(format!(
                "slot {} is held by booking {}",
                held.key(),
                held.get()
            ))),
            Entry::Vacant(free) => {
                free.insert(booking.id.clone());
                Ok(())
            }
        }
    }

    fn unreserve(&self, booking: &Booking) {
        self.active_slots
            .remove_if(&booking.key(), |_, holder| holder == &booking.id);
    }

    fn collect<F>(&self, mut keep: F) -> Vec<Booking>
    where
        F: FnMut(&Booking) -> bool,
    {
        self.bookings
            .iter()
            .filter(|b| keep(b.value()))
            .map(|b| b.value().clone())
            .collect()
    }
}

#[async_trait]
impl BookingLedger for InMemoryBookingLedger {
    async fn claim(&self, claim: SlotClaim) -> DomainResult<Booking> {
        self.insert_if_free(Booking::from_claim(claim))
    }

    async fn release(&self, booking_id: &str) -> DomainResult<Booking> {
        self.finish(booking_id, BookingStatus::Cancelled)
    }

    async fn transfer(&self, booking_id: &str, claim: SlotClaim) -> DomainResult<Booking> {
        let old = self
            .bookings
            .get(booking_id)
            .map(|b| b.clone())
            .ok_or_else(|| booking_not_found(booking_id))?;
        if !old.is_active() {
            return Err(DomainError::AlreadyTerminal {
                id: old.id,
                status: old.status.to_string(),
            });
        }

        // Reserve the new slot first: if it is taken the old booking was never touched.
        let mut replacement = Booking::from_claim(claim);
        replacement.rescheduled_from = Some(old.id.clone());
        self.reserve(&replacement)?;

        if let Err(e) = self.finish(booking_id, BookingStatus::Cancelled) {
            self.unreserve(&replacement);
            return Err(e);
        }
        self.bookings
            .insert(replacement.id.clone(), replacement.clone());
        Ok(replacement)
    }

    async fn find_by_id(&self, booking_id: &str) -> DomainResult<Option<Booking>> {
        Ok(self.bookings.get(booking_id).map(|b| b.clone()))
    }

    async fn find_active_for_station(
        &self,
        station_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<Booking>> {
        let mut found = self.collect(|b| {
            b.is_active() && b.station_id == station_id && b.slot_start >= from && b.slot_start < to
        });
        found.sort_by_key(|b| b.slot_start);
        Ok(found)
    }

    async fn find_for_station(
        &self,
        station_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<Booking>> {
        let mut found = self
            .collect(|b| b.station_id == station_id && b.slot_start >= from && b.slot_start < to);
        found.sort_by(|a, b| a.slot_start.cmp(&b.slot_start).then(a.created_at.cmp(&b.created_at)));
        Ok(found)
    }

    async fn find_for_user(&self, user_id: &str) -> DomainResult<Vec<Booking>> {
        let mut found = self.collect(|b| b.user_id == user_id);
        found.sort_by(|a, b| b.slot_start.cmp(&a.slot_start).then(b.created_at.cmp(&a.created_at)));
        Ok(found)
    }

    async fn complete_elapsed(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        let due: Vec<String> = self
            .collect(|b| b.is_active() && b.has_elapsed(now))
            .into_iter()
            .map(|b| b.id)
            .collect();

        let mut completed = 0;
        for id in due {
            match self.finish(&id, BookingStatus::Completed) {
                Ok(_) => completed += 1,
                // Cancelled (or removed) since the scan: it already has its terminal state.
                Err(DomainError::AlreadyTerminal { .. }) | Err(DomainError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(completed)
    }
}

// ── Provider ───────────────────────────────────────────────────

/// In-memory [`RepositoryProvider`] for tests and single-instance runs
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    stations: InMemoryStationRepository,
    bookings: InMemoryBookingLedger,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn stations(&self) -> &dyn StationRepository {
        &self.stations
    }

    fn bookings(&self) -> &dyn BookingLedger {
        &self.bookings
    }
}

// ── Tests ──────────────────────────────────────────────────────
