//! SeaORM implementation of StationRepository

use std::collections::BTreeSet;

use async_trait::async_trait;
use log::debug;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

use crate::domain::station::{OperatingHours, Station, StationRepository};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::station;
use crate::shared::errors::InfraError;

use super::{db_err, is_unique_violation};

pub struct SeaOrmStationRepository {
    db: DatabaseConnection,
}

impl SeaOrmStationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: station::Model) -> DomainResult<Station> {
    let connector_types: BTreeSet<String> =
        serde_json::from_str(&m.connector_types).map_err(InfraError::from)?;
    let operating_hours = OperatingHours::new(m.opens_at, m.closes_at)?;

    Ok(Station {
        id: m.id,
        name: m.name,
        address: m.address,
        latitude: m.latitude,
        longitude: m.longitude,
        connector_types,
        operating_hours,
        total_capacity: m.total_capacity.max(0) as u32,
        is_active: m.is_active,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn domain_to_active(s: Station) -> DomainResult<station::ActiveModel> {
    let connector_types = serde_json::to_string(&s.connector_types).map_err(InfraError::from)?;

    Ok(station::ActiveModel {
        id: Set(s.id),
        name: Set(s.name),
        address: Set(s.address),
        latitude: Set(s.latitude),
        longitude: Set(s.longitude),
        connector_types: Set(connector_types),
        opens_at: Set(s.operating_hours.open()),
        closes_at: Set(s.operating_hours.close()),
        total_capacity: Set(s.total_capacity.min(i32::MAX as u32) as i32),
        is_active: Set(s.is_active),
        created_at: Set(s.created_at),
        updated_at: Set(s.updated_at),
    })
}

// ── StationRepository impl ──────────────────────────────────────

#[async_trait]
impl StationRepository for SeaOrmStationRepository {
    async fn save(&self, s: Station) -> DomainResult<()> {
        debug!("Saving station: {}", s.id);

        let id = s.id.clone();
        let model = domain_to_active(s)?;
        match station::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                Err(DomainError::Conflict(format!("station {}", id)))
            }
            Err(e) => Err(db_err(e)),
        }
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Station>> {
        station::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_all(&self) -> DomainResult<Vec<Station>> {
        station::Entity::find()
            .order_by_asc(station::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(model_to_domain)
            .collect()
    }

    async fn update(&self, s: Station) -> DomainResult<()> {
        debug!("Updating station: {}", s.id);

        let existing = station::Entity::find_by_id(s.id.clone())
            .one(&self.db)
            .await
            .map_err(db_err)?;

        if existing.is_none() {
            return Err(DomainError::not_found("Station", "id", s.id));
        }

        domain_to_active(s)?.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        debug!("Deleting station: {}", id);

        let result = station::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Station", "id", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::connect_test_database;
    use chrono::NaiveTime;

    fn station(id: &str) -> Station {
        let hours = OperatingHours::new(
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
        )
        .unwrap();
        Station::new(id, "Harbour Bunk", "12 Quay Rd", 51.5, -0.12, hours)
            .with_connector_types(["CCS2", "Type2"])
            .with_capacity(4)
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let repo = SeaOrmStationRepository::new(connect_test_database().await);
        repo.save(station("S1")).await.unwrap();

        let loaded = repo.find_by_id("S1").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Harbour Bunk");
        assert_eq!(loaded.total_capacity, 4);
        assert!(loaded.supports_connector("ccs2"));
        assert_eq!(
            loaded.operating_hours.close(),
            NaiveTime::from_hms_opt(22, 0, 0).unwrap()
        );
        assert!(repo.find_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_connector_types_is_storage_error() {
        let db = connect_test_database().await;
        let mut row = domain_to_active(station("S1")).unwrap();
        row.connector_types = Set("CCS2,Type2".to_string());
        station::Entity::insert(row)
            .exec_without_returning(&db)
            .await
            .unwrap();

        let err = SeaOrmStationRepository::new(db)
            .find_by_id("S1")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Storage(ref msg) if msg.starts_with("Serialization error")), "got {err:?}");
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn duplicate_id_is_conflict() {
        let repo = SeaOrmStationRepository::new(connect_test_database().await);
        repo.save(station("S1")).await.unwrap();
        let err = repo.save(station("S1")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn update_and_delete() {
        let repo = SeaOrmStationRepository::new(connect_test_database().await);
        repo.save(station("S1")).await.unwrap();

        let mut s = repo.find_by_id("S1").await.unwrap().unwrap();
        s.is_active = false;
        s.name = "Harbour Bunk (closed)".into();
        repo.update(s).await.unwrap();

        let loaded = repo.find_by_id("S1").await.unwrap().unwrap();
        assert!(!loaded.is_active);
        assert_eq!(loaded.name, "Harbour Bunk (closed)");

        repo.delete("S1").await.unwrap();
        assert!(repo.find_all().await.unwrap().is_empty());
        assert!(matches!(
            repo.delete("S1").await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            repo.update(station("S2")).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
