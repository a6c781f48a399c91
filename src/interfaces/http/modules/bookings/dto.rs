//! Booking DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::CancelOutcome;
use crate::domain::Booking;

/// Request to book a slot
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    #[validate(length(min = 1, max = 64))]
    pub station_id: String,
    /// Slot start (RFC 3339). Must be the start of a generated slot
    pub start: DateTime<Utc>,
}

/// Request to move a booking to another slot
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RescheduleBookingRequest {
    /// Target station; defaults to the booking's current station
    #[validate(length(min = 1, max = 64))]
    pub station_id: Option<String>,
    /// New slot start (RFC 3339)
    pub start: DateTime<Utc>,
}

/// Booking details in API responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingDto {
    pub id: String,
    pub user_id: String,
    pub station_id: String,
    pub slot_start: String,
    pub slot_end: String,
    /// Active, Cancelled or Completed
    pub status: String,
    /// Booking this one replaced through a reschedule
    pub rescheduled_from: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Booking> for BookingDto {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            user_id: b.user_id,
            station_id: b.station_id,
            slot_start: b.slot_start.to_rfc3339(),
            slot_end: b.slot_end.to_rfc3339(),
            status: b.status.to_string(),
            rescheduled_from: b.rescheduled_from,
            created_at: b.created_at.to_rfc3339(),
            updated_at: b.updated_at.to_rfc3339(),
        }
    }
}

/// Result of a cancel request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CancelBookingResponse {
    /// `Cancelled`, or `AlreadyCancelled` when the booking had already ended
    pub outcome: String,
    pub booking: BookingDto,
}

impl From<CancelOutcome> for CancelBookingResponse {
    fn from(outcome: CancelOutcome) -> Self {
        Self {
            outcome: outcome.label().to_string(),
            booking: outcome.into_booking().into(),
        }
    }
}

/// Filter for the caller's bookings
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct BookingListQuery {
    /// Active, Cancelled or Completed
    pub status: Option<String>,
}
