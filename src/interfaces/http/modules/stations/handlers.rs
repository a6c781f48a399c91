//! Station HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use chrono::Utc;

use crate::application::{BookingService, Caller, NewStation, StationChanges, StationService};
use crate::interfaces::http::common::{
    ok, ApiError, ApiResponse, ApiResult, EmptyData, ValidatedJson,
};
use crate::interfaces::http::modules::bookings::dto::BookingDto;

use super::dto::*;

/// Application state for station handlers.
#[derive(Clone)]
pub struct StationAppState {
    pub stations: Arc<StationService>,
    pub bookings: Arc<BookingService>,
}

fn parse_optional_time(
    field: &str,
    value: Option<&str>,
) -> Result<Option<chrono::NaiveTime>, String> {
    value.map(|v| parse_time_of_day(field, v)).transpose()
}

#[utoipa::path(
    get,
    path = "/api/v1/stations",
    tag = "Stations",
    params(StationListQuery),
    responses(
        (status = 200, description = "Station list", body = ApiResponse<Vec<StationDto>>)
    )
)]
pub async fn list_stations(
    State(state): State<StationAppState>,
    Query(query): Query<StationListQuery>,
) -> ApiResult<Vec<StationDto>> {
    let stations = state.stations.list_stations(query.active_only).await?;
    ok(stations.into_iter().map(StationDto::from).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/stations/{station_id}",
    tag = "Stations",
    params(("station_id" = String, Path, description = "Station ID")),
    responses(
        (status = 200, description = "Station details", body = ApiResponse<StationDto>),
        (status = 404, description = "Station not found")
    )
)]
pub async fn get_station(
    State(state): State<StationAppState>,
    Path(station_id): Path<String>,
) -> ApiResult<StationDto> {
    let station = state.stations.get_station(&station_id).await?;
    ok(station.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/stations",
    tag = "Stations",
    security(("user_id" = []), ("user_role" = [])),
    request_body = CreateStationRequest,
    responses(
        (status = 200, description = "Station created", body = ApiResponse<StationDto>),
        (status = 400, description = "Invalid operating hours"),
        (status = 403, description = "Caller is not an operator"),
        (status = 409, description = "Station ID already exists"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn create_station(
    State(state): State<StationAppState>,
    caller: Caller,
    ValidatedJson(request): ValidatedJson<CreateStationRequest>,
) -> ApiResult<StationDto> {
    let open =
        parse_optional_time("open", request.open.as_deref()).map_err(ApiError::bad_request)?;
    let close =
        parse_optional_time("close", request.close.as_deref()).map_err(ApiError::bad_request)?;

    let station = state
        .stations
        .create_station(
            &caller,
            NewStation {
                id: request.id,
                name: request.name,
                address: request.address,
                latitude: request.latitude,
                longitude: request.longitude,
                connector_types: request.connector_types.into_iter().collect(),
                open,
                close,
                total_capacity: request.total_capacity,
            },
        )
        .await?;
    ok(station.into())
}

#[utoipa::path(
    put,
    path = "/api/v1/stations/{station_id}",
    tag = "Stations",
    security(("user_id" = []), ("user_role" = [])),
    params(("station_id" = String, Path, description = "Station ID")),
    request_body = UpdateStationRequest,
    responses(
        (status = 200, description = "Station updated", body = ApiResponse<StationDto>),
        (status = 400, description = "Invalid operating hours"),
        (status = 403, description = "Caller is not an operator"),
        (status = 404, description = "Station not found")
    )
)]
pub async fn update_station(
    State(state): State<StationAppState>,
    caller: Caller,
    Path(station_id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateStationRequest>,
) -> ApiResult<StationDto> {
    let open =
        parse_optional_time("open", request.open.as_deref()).map_err(ApiError::bad_request)?;
    let close =
        parse_optional_time("close", request.close.as_deref()).map_err(ApiError::bad_request)?;

    let changes = StationChanges {
        name: request.name,
        address: request.address,
        latitude: request.latitude,
        longitude: request.longitude,
        connector_types: request
            .connector_types
            .map(|types| types.into_iter().collect()),
        open,
        close,
        total_capacity: request.total_capacity,
        is_active: request.is_active,
    };

    let station = state
        .stations
        .update_station(&caller, &station_id, changes)
        .await?;
    ok(station.into())
}

#[utoipa::path(
    delete,
    path = "/api/v1/stations/{station_id}",
    tag = "Stations",
    security(("user_id" = []), ("user_role" = [])),
    params(("station_id" = String, Path, description = "Station ID")),
    responses(
        (status = 200, description = "Station deleted", body = ApiResponse<EmptyData>),
        (status = 403, description = "Caller is not an operator"),
        (status = 404, description = "Station not found"),
        (status = 409, description = "Station still has active bookings")
    )
)]
pub async fn delete_station(
    State(state): State<StationAppState>,
    caller: Caller,
    Path(station_id): Path<String>,
) -> ApiResult<EmptyData> {
    state.stations.delete_station(&caller, &station_id).await?;
    ok(EmptyData {})
}

#[utoipa::path(
    get,
    path = "/api/v1/stations/{station_id}/slots",
    tag = "Slots",
    params(
        ("station_id" = String, Path, description = "Station ID"),
        DateQuery
    ),
    responses(
        (status = 200, description = "Free slots for the day", body = ApiResponse<AvailableSlotsResponse>),
        (status = 404, description = "Station not found")
    )
)]
pub async fn list_available_slots(
    State(state): State<StationAppState>,
    Path(station_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> ApiResult<AvailableSlotsResponse> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let slots = state
        .bookings
        .list_available_slots(&station_id, date)
        .await?;

    ok(AvailableSlotsResponse {
        station_id,
        date: date.to_string(),
        slot_duration_minutes: state.bookings.availability().generator().duration().minutes(),
        slots: slots.into_iter().map(SlotDto::from).collect(),
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/stations/{station_id}/bookings",
    tag = "Bookings",
    security(("user_id" = []), ("user_role" = [])),
    params(
        ("station_id" = String, Path, description = "Station ID"),
        DateQuery
    ),
    responses(
        (status = 200, description = "All bookings of the station on that day", body = ApiResponse<Vec<BookingDto>>),
        (status = 403, description = "Caller is not an operator"),
        (status = 404, description = "Station not found")
    )
)]
pub async fn list_station_bookings(
    State(state): State<StationAppState>,
    caller: Caller,
    Path(station_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Vec<BookingDto>> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let bookings = state
        .bookings
        .list_station_bookings(&caller, &station_id, date)
        .await?;
    ok(bookings.into_iter().map(BookingDto::from).collect())
}
