//! Station domain entity

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::domain::{DomainError, DomainResult};

/// Daily opening window of a station, `open < close`, both on the same day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingHours {
    open: NaiveTime,
    close: NaiveTime,
}

impl OperatingHours {
    pub fn new(open: NaiveTime, close: NaiveTime) -> DomainResult<Self> {
        if open >= close {
            return Err(DomainError::Validation(format!(
                "operating hours must open before they close (open={}, close={})",
                open.format("%H:%M"),
                close.format("%H:%M")
            )));
        }
        Ok(Self { open, close })
    }

    pub fn open(&self) -> NaiveTime {
        self.open
    }

    pub fn close(&self) -> NaiveTime {
        self.close
    }

    /// Length of the opening window.
    pub fn span(&self) -> Duration {
        self.close - self.open
    }
}

/// Charging station ("bunk")
#[derive(Debug, Clone)]
pub struct Station {
    /// Unique station ID (operator-assigned)
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Connector standards offered, e.g. "CCS2", "Type2", "CHAdeMO"
    pub connector_types: BTreeSet<String>,
    pub operating_hours: OperatingHours,
    /// Number of charging points at the station
    pub total_capacity: u32,
    /// Inactive stations expose no slots and accept no new bookings
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Station {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        latitude: f64,
        longitude: f64,
        operating_hours: OperatingHours,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            latitude,
            longitude,
            connector_types: BTreeSet::new(),
            operating_hours,
            total_capacity: 1,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_connector_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.connector_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_capacity(mut self, total_capacity: u32) -> Self {
        self.total_capacity = total_capacity;
        self
    }

    /// Check the directory invariants an operator edit must keep.
    pub fn validate(&self) -> DomainResult<()> {
        if self.id.trim().is_empty() {
            return Err(DomainError::Validation("station id must not be empty".into()));
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation("station name must not be empty".into()));
        }
        if self.address.trim().is_empty() {
            return Err(DomainError::Validation("station address must not be empty".into()));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(DomainError::Validation(format!(
                "latitude {} out of range [-90, 90]",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(DomainError::Validation(format!(
                "longitude {} out of range [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }

    pub fn supports_connector(&self, connector_type: &str) -> bool {
        self.connector_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(connector_type))
    }
}

// ── Tests ──────────────────────────────────────────────────────
