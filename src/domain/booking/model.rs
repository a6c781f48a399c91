//! Booking domain entity

use chrono::{DateTime, Utc};

use crate::domain::slot::{Slot, SlotKey};

/// Booking status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    /// Holding its slot
    Active,
    /// Released by the owner, an operator, or a reschedule
    Cancelled,
    /// Slot end has passed while still active
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Cancelled => "Cancelled",
            Self::Completed => "Completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Active" => Some(Self::Active),
            "Cancelled" => Some(Self::Cancelled),
            "Completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Allowed transitions: `Active → Cancelled` and `Active → Completed`.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (Self::Active, Self::Cancelled) | (Self::Active, Self::Completed)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request to hold one slot for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotClaim {
    pub user_id: String,
    pub station_id: String,
    pub slot_start: DateTime<Utc>,
    pub slot_end: DateTime<Utc>,
}

impl SlotClaim {
    pub fn for_slot(user_id: impl Into<String>, slot: &Slot) -> Self {
        Self {
            user_id: user_id.into(),
            station_id: slot.station_id.clone(),
            slot_start: slot.start_at(),
            slot_end: slot.end_at(),
        }
    }

    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.station_id.clone(), self.slot_start)
    }
}

/// A driver's reservation of one slot
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub station_id: String,
    pub slot_start: DateTime<Utc>,
    pub slot_end: DateTime<Utc>,
    pub status: BookingStatus,
    /// Booking this one replaced through a reschedule
    pub rescheduled_from: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// New active booking for a successful claim.
    pub fn from_claim(claim: SlotClaim) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: claim.user_id,
            station_id: claim.station_id,
            slot_start: claim.slot_start,
            slot_end: claim.slot_end,
            status: BookingStatus::Active,
            rescheduled_from: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.station_id.clone(), self.slot_start)
    }

    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Active
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Slot has fully elapsed.
    pub fn has_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.slot_end <= now
    }

    /// Move to `next` if the status machine allows it.
    ///
    /// Returns `false` and leaves the booking untouched otherwise.
    pub fn transition(&mut self, next: BookingStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.updated_at = Utc::now();
        true
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_claim() -> SlotClaim {
        let start = Utc::now() + Duration::hours(2);
        SlotClaim {
            user_id: "driver-1".into(),
            station_id: "S1".into(),
            slot_start: start,
            slot_end: start + Duration::minutes(30),
        }
    }

    #[test]
    fn claimed_booking_is_active() {
        let b = Booking::from_claim(sample_claim());
        assert!(b.is_active());
        assert!(b.is_owned_by("driver-1"));
        assert!(!b.is_owned_by("driver-2"));
        assert!(b.rescheduled_from.is_none());
        assert_eq!(b.key(), SlotKey::new("S1", b.slot_start));
    }

    #[test]
    fn active_can_be_cancelled_once() {
        let mut b = Booking::from_claim(sample_claim());
        assert!(b.transition(BookingStatus::Cancelled));
        assert_eq!(b.status, BookingStatus::Cancelled);
        assert!(!b.transition(BookingStatus::Cancelled));
        assert!(!b.transition(BookingStatus::Completed));
        assert_eq!(b.status, BookingStatus::Cancelled);
    }

    #[test]
    fn completed_is_terminal() {
        let mut b = Booking::from_claim(sample_claim());
        assert!(b.transition(BookingStatus::Completed));
        assert!(b.status.is_terminal());
        assert!(!b.transition(BookingStatus::Cancelled));
        assert!(!b.transition(BookingStatus::Active));
    }

    #[test]
    fn elapsed_after_slot_end() {
        let b = Booking::from_claim(sample_claim());
        assert!(!b.has_elapsed(Utc::now()));
        assert!(b.has_elapsed(b.slot_end));
    }

    #[test]
    fn status_parse_roundtrip() {
        for status in [
            BookingStatus::Active,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("Rescheduled"), None);
    }
}
