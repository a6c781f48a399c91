//! Slot value types

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::domain::{DomainError, DomainResult};

/// Longest slot the engine accepts (12 hours).
pub const MAX_SLOT_MINUTES: u32 = 720;

/// Fixed slot length, system-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotDuration(Duration);

impl SlotDuration {
    pub fn from_minutes(minutes: u32) -> DomainResult<Self> {
        if minutes == 0 || minutes > MAX_SLOT_MINUTES {
            return Err(DomainError::Validation(format!(
                "slot duration must be between 1 and {} minutes, got {}",
                MAX_SLOT_MINUTES, minutes
            )));
        }
        Ok(Self(Duration::minutes(minutes as i64)))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn minutes(&self) -> i64 {
        self.0.num_minutes()
    }
}

impl Default for SlotDuration {
    fn default() -> Self {
        Self(Duration::minutes(30))
    }
}

/// Identity of a slot: the station plus the absolute start instant.
///
/// Equivalent to `(station_id, date, start)` because the date is part of the
/// instant. The ledger's uniqueness constraint is scoped to this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    pub station_id: String,
    pub start: DateTime<Utc>,
}

impl SlotKey {
    pub fn new(station_id: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            station_id: station_id.into(),
            start,
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.station_id, self.start.format("%Y-%m-%dT%H:%MZ"))
    }
}

/// A bookable window at a station on a given date.
///
/// Operating hours are interpreted as UTC wall-clock times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub station_id: String,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Slot {
    pub fn start_at(&self) -> DateTime<Utc> {
        self.date.and_time(self.start).and_utc()
    }

    pub fn end_at(&self) -> DateTime<Utc> {
        self.date.and_time(self.end).and_utc()
    }

    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.station_id.clone(), self.start_at())
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.start_at() <= now
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}-{}",
            self.station_id,
            self.date,
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}
