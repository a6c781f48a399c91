//! SeaORM implementation of BookingLedger
//!
//! Claims are plain inserts; the partial unique index on active
//! `(station_id, slot_start)` rows turns a lost race into a unique-constraint
//! violation, reported as `DomainError::Conflict`. Status changes are
//! conditional updates filtered on `status = 'Active'`, so a release and the
//! completion sweep can never both win.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::domain::{
    Booking, BookingLedger, BookingStatus, DomainError, DomainResult, SlotClaim,
};
use crate::infrastructure::database::entities::booking;

use super::{db_err, is_unique_violation};

pub struct SeaOrmBookingLedger {
    db: DatabaseConnection,
}

impl SeaOrmBookingLedger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: booking::Model) -> DomainResult<Booking> {
    let status = BookingStatus::parse(&m.status).ok_or_else(|| {
        DomainError::Storage(format!("booking {} has unknown status '{}'", m.id, m.status))
    })?;
    Ok(Booking {
        id: m.id,
        user_id: m.user_id,
        station_id: m.station_id,
        slot_start: m.slot_start,
        slot_end: m.slot_end,
        status,
        rescheduled_from: m.rescheduled_from,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn models_to_domain(models: Vec<booking::Model>) -> DomainResult<Vec<Booking>> {
    models.into_iter().map(model_to_domain).collect()
}

fn booking_not_found(id: &str) -> DomainError {
    DomainError::not_found("Booking", "id", id)
}

// ── Statements shared by the pool and open transactions ─────────

async fn insert_active<C: ConnectionTrait>(conn: &C, b: &Booking) -> DomainResult<()> {
    let model = booking::ActiveModel {
        id: Set(b.id.clone()),
        user_id: Set(b.user_id.clone()),
        station_id: Set(b.station_id.clone()),
        slot_start: Set(b.slot_start),
        slot_end: Set(b.slot_end),
        status: Set(b.status.as_str().to_string()),
        rescheduled_from: Set(b.rescheduled_from.clone()),
        created_at: Set(b.created_at),
        updated_at: Set(b.updated_at),
    };

    match booking::Entity::insert(model).exec_without_returning(conn).await {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(DomainError::Conflict(format!(
            "slot {} already held",
            b.key()
        ))),
        Err(e) => Err(db_err(e)),
    }
}

/// Conditionally move an active booking to `next` and return the stored row.
async fn finish<C: ConnectionTrait>(
    conn: &C,
    booking_id: &str,
    next: BookingStatus,
) -> DomainResult<Booking> {
    let changed = booking::Entity::update_many()
        .col_expr(booking::Column::Status, Expr::value(next.as_str()))
        .col_expr(booking::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(booking::Column::Id.eq(booking_id))
        .filter(booking::Column::Status.eq(BookingStatus::Active.as_str()))
        .exec(conn)
        .await
        .map_err(db_err)?
        .rows_affected;

    let stored = booking::Entity::find_by_id(booking_id.to_string())
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| booking_not_found(booking_id))
        .and_then(model_to_domain)?;

    if changed == 0 {
        return Err(DomainError::AlreadyTerminal {
            id: stored.id,
            status: stored.status.to_string(),
        });
    }
    Ok(stored)
}

// ── BookingLedger impl ──────────────────────────────────────────

#[async_trait]
impl BookingLedger for SeaOrmBookingLedger {
    async fn claim(&self, claim: SlotClaim) -> DomainResult<Booking> {
        debug!("Claiming slot {} for {}", claim.key(), claim.user_id);

        let booking = Booking::from_claim(claim);
        insert_active(&self.db, &booking).await?;
        Ok(booking)
    }

    async fn release(&self, booking_id: &str) -> DomainResult<Booking> {
        debug!("Releasing booking: {}", booking_id);
        finish(&self.db, booking_id, BookingStatus::Cancelled).await
    }

    async fn transfer(&self, booking_id: &str, claim: SlotClaim) -> DomainResult<Booking> {
        debug!("Transferring booking {} to slot {}", booking_id, claim.key());

        // Dropping `txn` on an early return rolls back the release.
        let txn = self.db.begin().await.map_err(db_err)?;

        finish(&txn, booking_id, BookingStatus::Cancelled).await?;

        let mut replacement = Booking::from_claim(claim);
        replacement.rescheduled_from = Some(booking_id.to_string());
        insert_active(&txn, &replacement).await?;

        txn.commit().await.map_err(db_err)?;
        Ok(replacement)
    }

    async fn find_by_id(&self, booking_id: &str) -> DomainResult<Option<Booking>> {
        booking::Entity::find_by_id(booking_id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_active_for_station(
        &self,
        station_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<Booking>> {
        let models = booking::Entity::find()
            .filter(booking::Column::StationId.eq(station_id))
            .filter(booking::Column::Status.eq(BookingStatus::Active.as_str()))
            .filter(booking::Column::SlotStart.gte(from))
            .filter(booking::Column::SlotStart.lt(to))
            .order_by_asc(booking::Column::SlotStart)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models_to_domain(models)
    }

    async fn find_for_station(
        &self,
        station_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<Booking>> {
        let models = booking::Entity::find()
            .filter(booking::Column::StationId.eq(station_id))
            .filter(booking::Column::SlotStart.gte(from))
            .filter(booking::Column::SlotStart.lt(to))
            .order_by_asc(booking::Column::SlotStart)
            .order_by_asc(booking::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models_to_domain(models)
    }

    async fn find_for_user(&self, user_id: &str) -> DomainResult<Vec<Booking>> {
        let models = booking::Entity::find()
            .filter(booking::Column::UserId.eq(user_id))
            .order_by_desc(booking::Column::SlotStart)
            .order_by_desc(booking::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models_to_domain(models)
    }

    async fn complete_elapsed(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        let result = booking::Entity::update_many()
            .col_expr(
                booking::Column::Status,
                Expr::value(BookingStatus::Completed.as_str()),
            )
            .col_expr(booking::Column::UpdatedAt, Expr::value(now))
            .filter(booking::Column::Status.eq(BookingStatus::Active.as_str()))
            .filter(booking::Column::SlotEnd.lte(now))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected > 0 {
            info!("Completed {} elapsed bookings", result.rows_affected);
        }
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::connect_test_database;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2031, 6, 2, h, m, 0).unwrap()
    }

    fn claim(user: &str, station: &str, h: u32, m: u32) -> SlotClaim {
        SlotClaim {
            user_id: user.into(),
            station_id: station.into(),
            slot_start: at(h, m),
            slot_end: at(h, m) + Duration::minutes(30),
        }
    }

    async fn ledger() -> SeaOrmBookingLedger {
        SeaOrmBookingLedger::new(connect_test_database().await)
    }

    #[tokio::test]
    async fn unique_index_rejects_second_active_claim() {
        let ledger = ledger().await;
        let first = ledger.claim(claim("alice", "S1", 9, 0)).await.unwrap();

        let err = ledger.claim(claim("bob", "S1", 9, 0)).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)), "got {err:?}");

        let stored = ledger.find_by_id(&first.id).await.unwrap().unwrap();
        assert_eq!(stored.user_id, "alice");
        assert_eq!(stored.slot_start, at(9, 0));
        assert!(stored.is_active());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_claims_have_exactly_one_winner() {
        let ledger = Arc::new(ledger().await);
        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..16 {
            let ledger = ledger.clone();
            tasks.spawn(async move { ledger.claim(claim(&format!("user-{i}"), "S1", 9, 0)).await });
        }

        let (mut won, mut lost) = (0, 0);
        while let Some(result) = tasks.join_next().await {
            match result.unwrap() {
                Ok(_) => won += 1,
                Err(DomainError::Conflict(_)) => lost += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!((won, lost), (1, 15));
    }

    #[tokio::test]
    async fn cancelled_rows_do_not_block_the_slot() {
        let ledger = ledger().await;
        let first = ledger.claim(claim("alice", "S1", 9, 0)).await.unwrap();
        let released = ledger.release(&first.id).await.unwrap();
        assert_eq!(released.status, BookingStatus::Cancelled);

        let second = ledger.claim(claim("bob", "S1", 9, 0)).await.unwrap();
        assert!(second.is_active());

        let all = ledger.find_for_station("S1", at(0, 0), at(23, 0)).await.unwrap();
        assert_eq!(all.len(), 2);
        let active = ledger
            .find_active_for_station("S1", at(0, 0), at(23, 0))
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);
    }

    #[tokio::test]
    async fn second_release_reports_terminal_state() {
        let ledger = ledger().await;
        let b = ledger.claim(claim("alice", "S1", 9, 0)).await.unwrap();
        ledger.release(&b.id).await.unwrap();

        match ledger.release(&b.id).await {
            Err(DomainError::AlreadyTerminal { id, status }) => {
                assert_eq!(id, b.id);
                assert_eq!(status, "Cancelled");
            }
            other => panic!("expected AlreadyTerminal, got {other:?}"),
        }
        assert!(matches!(
            ledger.release("missing").await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn transfer_commits_both_halves() {
        let ledger = ledger().await;
        let old = ledger.claim(claim("alice", "S1", 9, 0)).await.unwrap();

        let new = ledger
            .transfer(&old.id, claim("alice", "S1", 10, 0))
            .await
            .unwrap();
        assert_eq!(new.rescheduled_from.as_deref(), Some(old.id.as_str()));

        let old = ledger.find_by_id(&old.id).await.unwrap().unwrap();
        assert_eq!(old.status, BookingStatus::Cancelled);
        assert!(ledger.find_by_id(&new.id).await.unwrap().unwrap().is_active());

        // Old slot is free again.
        assert!(ledger.claim(claim("bob", "S1", 9, 0)).await.is_ok());
    }

    #[tokio::test]
    async fn transfer_onto_taken_slot_rolls_back() {
        let ledger = ledger().await;
        let old = ledger.claim(claim("alice", "S1", 9, 0)).await.unwrap();
        ledger.claim(claim("bob", "S1", 10, 0)).await.unwrap();

        let err = ledger
            .transfer(&old.id, claim("alice", "S1", 10, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)), "got {err:?}");

        let old = ledger.find_by_id(&old.id).await.unwrap().unwrap();
        assert!(old.is_active(), "release must roll back with the failed claim");
        assert_eq!(ledger.find_for_user("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn transfer_of_terminal_booking_stores_nothing() {
        let ledger = ledger().await;
        let old = ledger.claim(claim("alice", "S1", 9, 0)).await.unwrap();
        ledger.release(&old.id).await.unwrap();

        let err = ledger
            .transfer(&old.id, claim("alice", "S1", 11, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AlreadyTerminal { .. }));
        assert!(ledger
            .find_active_for_station("S1", at(0, 0), at(23, 0))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn sweep_is_conditional_on_active() {
        let ledger = ledger().await;
        let early = ledger.claim(claim("alice", "S1", 9, 0)).await.unwrap();
        let cancelled = ledger.claim(claim("bob", "S1", 9, 30)).await.unwrap();
        let later = ledger.claim(claim("carol", "S1", 12, 0)).await.unwrap();
        ledger.release(&cancelled.id).await.unwrap();

        assert_eq!(ledger.complete_elapsed(at(10, 0)).await.unwrap(), 1);
        assert_eq!(ledger.complete_elapsed(at(10, 0)).await.unwrap(), 0);

        for (id, expected) in [
            (early.id, BookingStatus::Completed),
            (cancelled.id, BookingStatus::Cancelled),
            (later.id, BookingStatus::Active),
        ] {
            let stored = ledger.find_by_id(&id).await.unwrap().unwrap();
            assert_eq!(stored.status, expected);
        }

        let mine = ledger.find_for_user("alice").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert!(matches!(
            ledger.release(&mine[0].id).await,
            Err(DomainError::AlreadyTerminal { .. })
        ));
    }
}
