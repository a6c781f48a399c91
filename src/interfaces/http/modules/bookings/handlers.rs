//! Booking HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};

use crate::application::{BookingService, Caller};
use crate::domain::BookingStatus;
use crate::interfaces::http::common::{ok, ApiError, ApiResponse, ApiResult, ValidatedJson};

use super::dto::*;

/// Application state for booking handlers.
#[derive(Clone)]
pub struct BookingAppState {
    pub bookings: Arc<BookingService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    security(("user_id" = []), ("user_role" = [])),
    request_body = CreateBookingRequest,
    responses(
        (status = 200, description = "Slot booked", body = ApiResponse<BookingDto>),
        (status = 400, description = "Not a bookable slot of this station"),
        (status = 404, description = "Station not found"),
        (status = 409, description = "Slot already taken")
    )
)]
pub async fn create_booking(
    State(state): State<BookingAppState>,
    caller: Caller,
    ValidatedJson(request): ValidatedJson<CreateBookingRequest>,
) -> ApiResult<BookingDto> {
    let booking = state
        .bookings
        .create_booking(&caller, &request.station_id, request.start)
        .await?;
    ok(booking.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    tag = "Bookings",
    security(("user_id" = []), ("user_role" = [])),
    params(BookingListQuery),
    responses(
        (status = 200, description = "Caller's bookings, latest slot first", body = ApiResponse<Vec<BookingDto>>),
        (status = 400, description = "Unknown status filter")
    )
)]
pub async fn list_my_bookings(
    State(state): State<BookingAppState>,
    caller: Caller,
    Query(query): Query<BookingListQuery>,
) -> ApiResult<Vec<BookingDto>> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            BookingStatus::parse(s)
                .ok_or_else(|| ApiError::bad_request(format!("Unknown booking status '{}'", s)))
        })
        .transpose()?;

    let bookings = state.bookings.list_my_bookings(&caller, status).await?;
    ok(bookings.into_iter().map(BookingDto::from).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{booking_id}",
    tag = "Bookings",
    security(("user_id" = []), ("user_role" = [])),
    params(("booking_id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking details", body = ApiResponse<BookingDto>),
        (status = 403, description = "Booking belongs to another user"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    State(state): State<BookingAppState>,
    caller: Caller,
    Path(booking_id): Path<String>,
) -> ApiResult<BookingDto> {
    let booking = state.bookings.get_booking(&caller, &booking_id).await?;
    ok(booking.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{booking_id}/cancel",
    tag = "Bookings",
    security(("user_id" = []), ("user_role" = [])),
    params(("booking_id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Cancelled, or already cancelled/completed", body = ApiResponse<CancelBookingResponse>),
        (status = 403, description = "Booking belongs to another user"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn cancel_booking(
    State(state): State<BookingAppState>,
    caller: Caller,
    Path(booking_id): Path<String>,
) -> ApiResult<CancelBookingResponse> {
    let outcome = state.bookings.cancel_booking(&caller, &booking_id).await?;
    ok(outcome.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{booking_id}/reschedule",
    tag = "Bookings",
    security(("user_id" = []), ("user_role" = [])),
    params(("booking_id" = String, Path, description = "Booking ID")),
    request_body = RescheduleBookingRequest,
    responses(
        (status = 200, description = "New booking; the old one is cancelled", body = ApiResponse<BookingDto>),
        (status = 400, description = "Not a bookable slot"),
        (status = 403, description = "Booking belongs to another user"),
        (status = 404, description = "Booking or station not found"),
        (status = 409, description = "Target slot taken, or booking no longer active")
    )
)]
pub async fn reschedule_booking(
    State(state): State<BookingAppState>,
    caller: Caller,
    Path(booking_id): Path<String>,
    ValidatedJson(request): ValidatedJson<RescheduleBookingRequest>,
) -> ApiResult<BookingDto> {
    let station_id = match request.station_id {
        Some(id) => id,
        None => state.bookings.get_booking(&caller, &booking_id).await?.station_id,
    };

    let booking = state
        .bookings
        .reschedule_booking(&caller, &booking_id, &station_id, request.start)
        .await?;
    ok(booking.into())
}
