//! Availability resolver
//!
//! Free slots are the generated slots minus those whose key is held by an
//! active booking. The result is advisory: a later claim re-checks atomically
//! in the ledger, so a stale read costs at most a `SlotUnavailable`.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::domain::{
    Booking, DomainError, DomainResult, RepositoryProvider, Slot, SlotGenerator, SlotKey, Station,
};

/// Filter `slots` down to those not held by any of `active`.
///
/// With `now` set, slots that have already started are dropped too; they
/// still exist for cancellation, they are just not offered.
pub fn free_slots(slots: Vec<Slot>, active: &[Booking], now: Option<DateTime<Utc>>) -> Vec<Slot> {
    let held: HashSet<SlotKey> = active
        .iter()
        .filter(|b| b.is_active())
        .map(Booking::key)
        .collect();

    slots
        .into_iter()
        .filter(|slot| !held.contains(&slot.key()))
        .filter(|slot| now.map_or(true, |now| !slot.has_started(now)))
        .collect()
}

/// UTC bounds `[date 00:00, date+1 00:00)` covering every slot of `date`.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

pub struct AvailabilityResolver {
    repos: Arc<dyn RepositoryProvider>,
    generator: SlotGenerator,
    hide_elapsed: bool,
}

impl AvailabilityResolver {
    pub fn new(repos: Arc<dyn RepositoryProvider>, generator: SlotGenerator, hide_elapsed: bool) -> Self {
        Self {
            repos,
            generator,
            hide_elapsed,
        }
    }

    pub fn generator(&self) -> &SlotGenerator {
        &self.generator
    }

    /// Free slots of `station_id` on `date`, in chronological order.
    ///
    /// Unknown station → `NotFound`; an inactive station has no free slots.
    pub async fn list_available_slots(&self, station_id: &str, date: NaiveDate) -> DomainResult<Vec<Slot>> {
        let station = self
            .repos
            .stations()
            .find_by_id(station_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Station", "id", station_id))?;

        self.available_for(&station, date).await
    }

    /// Free slots of an already loaded station. Reads the ledger once.
    pub async fn available_for(&self, station: &Station, date: NaiveDate) -> DomainResult<Vec<Slot>> {
        if !station.is_active {
            return Ok(Vec::new());
        }

        let slots = self.generator.generate(station, date);
        if slots.is_empty() {
            return Ok(slots);
        }

        let (from, to) = day_bounds(date);
        let active = self
            .repos
            .bookings()
            .find_active_for_station(&station.id, from, to)
            .await?;

        let now = self.hide_elapsed.then(Utc::now);
        Ok(free_slots(slots, &active, now))
    }

    /// Whether `slot` currently has no active booking. Advisory only.
    pub async fn is_free(&self, slot: &Slot) -> DomainResult<bool> {
        let start = slot.start_at();
        let held = self
            .repos
            .bookings()
            .find_active_for_station(&slot.station_id, start, start + Duration::seconds(1))
            .await?;
        Ok(held.is_empty())
    }
}
