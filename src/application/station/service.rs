//! Station directory service
//!
//! Operators create and edit stations; everyone may read them. Editing hours
//! never touches existing bookings.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc};
use tracing::info;

use crate::application::caller::Caller;
use crate::domain::{
    DomainError, DomainResult, OperatingHours, RepositoryProvider, Station,
};

/// Fields of a new station. Hours fall back to the configured defaults.
#[derive(Debug, Clone, Default)]
pub struct NewStation {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub connector_types: BTreeSet<String>,
    pub open: Option<NaiveTime>,
    pub close: Option<NaiveTime>,
    pub total_capacity: Option<u32>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct StationChanges {
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub connector_types: Option<BTreeSet<String>>,
    pub open: Option<NaiveTime>,
    pub close: Option<NaiveTime>,
    pub total_capacity: Option<u32>,
    pub is_active: Option<bool>,
}

fn require_operator(caller: &Caller, action: &str) -> DomainResult<()> {
    if caller.is_operator() {
        Ok(())
    } else {
        Err(DomainError::Forbidden(format!("only operators may {}", action)))
    }
}

pub struct StationService {
    repos: Arc<dyn RepositoryProvider>,
    default_hours: OperatingHours,
}

impl StationService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, default_hours: OperatingHours) -> Self {
        Self {
            repos,
            default_hours,
        }
    }

    pub async fn get_station(&self, id: &str) -> DomainResult<Station> {
        self.repos
            .stations()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Station", "id", id))
    }

    pub async fn list_stations(&self, active_only: bool) -> DomainResult<Vec<Station>> {
        let mut stations = self.repos.stations().find_all().await?;
        if active_only {
            stations.retain(|s| s.is_active);
        }
        Ok(stations)
    }

    pub async fn create_station(&self, caller: &Caller, input: NewStation) -> DomainResult<Station> {
        require_operator(caller, "create stations")?;

        let hours = OperatingHours::new(
            input.open.unwrap_or(self.default_hours.open()),
            input.close.unwrap_or(self.default_hours.close()),
        )?;
        let station = Station::new(
            input.id,
            input.name,
            input.address,
            input.latitude,
            input.longitude,
            hours,
        )
        .with_connector_types(input.connector_types)
        .with_capacity(input.total_capacity.unwrap_or(1));
        station.validate()?;

        self.repos.stations().save(station.clone()).await?;
        info!(station_id = %station.id, name = %station.name, "Station created");
        Ok(station)
    }

    pub async fn update_station(
        &self,
        caller: &Caller,
        id: &str,
        changes: StationChanges,
    ) -> DomainResult<Station> {
        require_operator(caller, "edit stations")?;
        let mut station = self.get_station(id).await?;

        if let Some(name) = changes.name {
            station.name = name;
        }
        if let Some(address) = changes.address {
            station.address = address;
        }
        if let Some(latitude) = changes.latitude {
            station.latitude = latitude;
        }
        if let Some(longitude) = changes.longitude {
            station.longitude = longitude;
        }
        if let Some(types) = changes.connector_types {
            station.connector_types = types;
        }
        if changes.open.is_some() || changes.close.is_some() {
            station.operating_hours = OperatingHours::new(
                changes.open.unwrap_or(station.operating_hours.open()),
                changes.close.unwrap_or(station.operating_hours.close()),
            )?;
        }
        if let Some(capacity) = changes.total_capacity {
            station.total_capacity = capacity;
        }
        if let Some(active) = changes.is_active {
            station.is_active = active;
        }
        station.validate()?;
        station.updated_at = Utc::now();

        self.repos.stations().update(station.clone()).await?;
        info!(station_id = %station.id, active = station.is_active, "Station updated");
        Ok(station)
    }

    /// Remove a station. Refused while it still has active bookings;
    /// deactivate it first and let them finish or be cancelled.
    pub async fn delete_station(&self, caller: &Caller, id: &str) -> DomainResult<()> {
        require_operator(caller, "delete stations")?;
        self.get_station(id).await?;

        let (from, to) = all_time();
        let active = self
            .repos
            .bookings()
            .find_active_for_station(id, from, to)
            .await?;
        if !active.is_empty() {
            return Err(DomainError::Conflict(format!(
                "station {} still has {} active bookings",
                id,
                active.len()
            )));
        }

        self.repos.stations().delete(id).await?;
        info!(station_id = %id, "Station deleted");
        Ok(())
    }
}

/// Range wide enough for any booking, with four-digit years so textual
/// timestamps still sort chronologically.
fn all_time() -> (DateTime<Utc>, DateTime<Utc>) {
    let end = DateTime::from_timestamp(253_402_300_799, 0).unwrap_or(DateTime::<Utc>::MAX_UTC);
    (DateTime::<Utc>::UNIX_EPOCH, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SlotClaim;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use chrono::{Duration, TimeZone};

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn service() -> (Arc<InMemoryRepositoryProvider>, StationService) {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let svc = StationService::new(
            repos.clone(),
            OperatingHours::new(hm(6, 0), hm(22, 0)).unwrap(),
        );
        (repos, svc)
    }

    fn input(id: &str) -> NewStation {
        NewStation {
            id: id.into(),
            name: "Ring Road Bunk".into(),
            address: "4 Ring Rd".into(),
            latitude: 12.9,
            longitude: 77.6,
            connector_types: ["CCS2".to_string()].into_iter().collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_uses_default_hours() {
        let (_, svc) = service();
        let ops = Caller::operator("ops");
        let s = svc.create_station(&ops, input("S1")).await.unwrap();
        assert_eq!(s.operating_hours.open(), hm(6, 0));
        assert_eq!(s.operating_hours.close(), hm(22, 0));
        assert_eq!(s.total_capacity, 1);

        assert!(matches!(
            svc.create_station(&ops, input("S1")).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn drivers_cannot_manage_stations() {
        let (_, svc) = service();
        let driver = Caller::driver("alice");
        assert!(matches!(
            svc.create_station(&driver, input("S1")).await,
            Err(DomainError::Forbidden(_))
        ));
        svc.create_station(&Caller::operator("ops"), input("S1"))
            .await
            .unwrap();
        assert!(matches!(
            svc.update_station(&driver, "S1", StationChanges::default()).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            svc.delete_station(&driver, "S1").await,
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn invalid_input_is_rejected() {
        let (_, svc) = service();
        let ops = Caller::operator("ops");

        let mut bad = input("S1");
        bad.latitude = 95.0;
        assert!(matches!(
            svc.create_station(&ops, bad).await,
            Err(DomainError::Validation(_))
        ));

        let mut bad = input("S1");
        bad.open = Some(hm(20, 0));
        bad.close = Some(hm(8, 0));
        assert!(matches!(
            svc.create_station(&ops, bad).await,
            Err(DomainError::Validation(_))
        ));

        svc.create_station(&ops, input("S1")).await.unwrap();
        let err = svc
            .update_station(
                &ops,
                "S1",
                StationChanges {
                    close: Some(hm(5, 0)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let (_, svc) = service();
        let ops = Caller::operator("ops");
        svc.create_station(&ops, input("S1")).await.unwrap();

        let updated = svc
            .update_station(
                &ops,
                "S1",
                StationChanges {
                    close: Some(hm(23, 0)),
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.operating_hours.open(), hm(6, 0));
        assert_eq!(updated.operating_hours.close(), hm(23, 0));
        assert!(!updated.is_active);
        assert_eq!(updated.name, "Ring Road Bunk");

        assert_eq!(svc.list_stations(false).await.unwrap().len(), 1);
        assert!(svc.list_stations(true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_refused_while_bookings_are_active() {
        let (repos, svc) = service();
        let ops = Caller::operator("ops");
        svc.create_station(&ops, input("S1")).await.unwrap();

        let start = Utc.with_ymd_and_hms(2031, 6, 2, 9, 0, 0).unwrap();
        let booking = repos
            .bookings()
            .claim(SlotClaim {
                user_id: "alice".into(),
                station_id: "S1".into(),
                slot_start: start,
                slot_end: start + Duration::minutes(30),
            })
            .await
            .unwrap();

        assert!(matches!(
            svc.delete_station(&ops, "S1").await,
            Err(DomainError::Conflict(_))
        ));

        repos.bookings().release(&booking.id).await.unwrap();
        svc.delete_station(&ops, "S1").await.unwrap();
        assert!(matches!(
            svc.get_station("S1").await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
