//! Station and slot DTOs

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::{Slot, Station};

/// Request to register a new station (operator only)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStationRequest {
    /// Operator-assigned station ID
    #[validate(length(min = 1, max = 64))]
    pub id: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 500))]
    pub address: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    /// Connector standards, e.g. `["CCS2", "Type2"]`
    #[serde(default)]
    pub connector_types: Vec<String>,
    /// Opening time `HH:MM` (UTC). Defaults to the configured opening time
    pub open: Option<String>,
    /// Closing time `HH:MM` (UTC). Defaults to the configured closing time
    pub close: Option<String>,
    /// Number of charging points
    pub total_capacity: Option<u32>,
}

/// Partial station update (operator only). Omitted fields are unchanged.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateStationRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub address: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    pub connector_types: Option<Vec<String>>,
    pub open: Option<String>,
    pub close: Option<String>,
    pub total_capacity: Option<u32>,
    pub is_active: Option<bool>,
}

/// Station details in API responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StationDto {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub connector_types: Vec<String>,
    /// `HH:MM`, UTC
    pub open: String,
    /// `HH:MM`, UTC
    pub close: String,
    pub total_capacity: u32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Station> for StationDto {
    fn from(s: Station) -> Self {
        Self {
            open: s.operating_hours.open().format("%H:%M").to_string(),
            close: s.operating_hours.close().format("%H:%M").to_string(),
            id: s.id,
            name: s.name,
            address: s.address,
            latitude: s.latitude,
            longitude: s.longitude,
            connector_types: s.connector_types.into_iter().collect(),
            total_capacity: s.total_capacity,
            is_active: s.is_active,
            created_at: s.created_at.to_rfc3339(),
            updated_at: s.updated_at.to_rfc3339(),
        }
    }
}

/// Station list filter
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct StationListQuery {
    /// Only return stations accepting bookings
    #[serde(default)]
    pub active_only: bool,
}

/// Day selector for slot and booking listings
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DateQuery {
    /// Calendar date `YYYY-MM-DD` (UTC). Defaults to today
    pub date: Option<NaiveDate>,
}

/// One bookable slot
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SlotDto {
    /// Slot start (RFC 3339, UTC); pass this as `start` when booking
    pub start: String,
    pub end: String,
}

impl From<Slot> for SlotDto {
    fn from(s: Slot) -> Self {
        Self {
            start: s.start_at().to_rfc3339(),
            end: s.end_at().to_rfc3339(),
        }
    }
}

/// Free slots of a station on one day
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AvailableSlotsResponse {
    pub station_id: String,
    pub date: String,
    pub slot_duration_minutes: i64,
    pub slots: Vec<SlotDto>,
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(field: &str, value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| format!("{}: expected HH:MM, got '{}'", field, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_of_day_formats() {
        assert_eq!(
            parse_time_of_day("open", "06:30").unwrap(),
            NaiveTime::from_hms_opt(6, 30, 0).unwrap()
        );
        assert_eq!(
            parse_time_of_day("open", "23:59:00").unwrap(),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap()
        );
        let err = parse_time_of_day("close", "25:00").unwrap_err();
        assert!(err.starts_with("close:"));
        assert!(parse_time_of_day("close", "noon").is_err());
    }

    #[test]
    fn create_request_validation() {
        let req: CreateStationRequest = serde_json::from_value(serde_json::json!({
            "id": "S1", "name": "Depot", "address": "1 Main St",
            "latitude": 12.9, "longitude": 77.6
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert!(req.connector_types.is_empty());

        let req: CreateStationRequest = serde_json::from_value(serde_json::json!({
            "id": "", "name": "Depot", "address": "1 Main St",
            "latitude": 12.9, "longitude": 181.0
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("id"));
        assert!(fields.contains_key("longitude"));
    }
}
