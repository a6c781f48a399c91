//! Slot generation from operating hours
//!
//! Pure function of `(station hours, date, duration)`: the same inputs always
//! yield the same ordered, non-overlapping sequence. A trailing remainder
//! shorter than one slot is dropped.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::model::{Slot, SlotDuration};
use crate::domain::station::Station;

#[derive(Debug, Clone, Copy, Default)]
pub struct SlotGenerator {
    duration: SlotDuration,
}

impl SlotGenerator {
    pub fn new(duration: SlotDuration) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> SlotDuration {
        self.duration
    }

    /// Every slot of `station` on `date`, in chronological order.
    pub fn generate(&self, station: &Station, date: NaiveDate) -> Vec<Slot> {
        let step = self.duration.as_duration();
        let open = date.and_time(station.operating_hours.open());
        let close = date.and_time(station.operating_hours.close());

        let capacity = (station.operating_hours.span().num_minutes() / self.duration.minutes())
            .max(0) as usize;
        let mut slots = Vec::with_capacity(capacity);

        let mut start = open;
        while start + step <= close {
            slots.push(self.slot_from(station, start));
            start += step;
        }
        slots
    }

    /// The slot of `station` that begins exactly at `start`, if any.
    ///
    /// Agrees with [`generate`](Self::generate) without materializing the
    /// whole day: `start` must be a whole number of slot lengths after opening
    /// and the slot must end no later than closing.
    pub fn slot_at(&self, station: &Station, start: DateTime<Utc>) -> Option<Slot> {
        let start = start.naive_utc();
        let date = start.date();
        let open = date.and_time(station.operating_hours.open());
        let close = date.and_time(station.operating_hours.close());

        if start < open || start + self.duration.as_duration() > close {
            return None;
        }

        let offset = start - open;
        let step = self.duration.as_duration();
        if offset.num_nanoseconds()? % step.num_nanoseconds()? != 0 {
            return None;
        }
        Some(self.slot_from(station, start))
    }

    fn slot_from(&self, station: &Station, start: NaiveDateTime) -> Slot {
        let end = start + self.duration.as_duration();
        Slot {
            station_id: station.id.clone(),
            date: start.date(),
            start: start.time(),
            end: end.time(),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────
