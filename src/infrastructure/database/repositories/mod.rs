//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod booking_ledger;
pub mod repository_provider;
pub mod station_repository;

pub use booking_ledger::SeaOrmBookingLedger;
pub use repository_provider::SeaOrmRepositoryProvider;
pub use station_repository::SeaOrmStationRepository;

use sea_orm::{DbErr, SqlErr};

use crate::domain::DomainError;

fn db_err(e: DbErr) -> DomainError {
    DomainError::Storage(format!("Database error: {}", e))
}

fn is_unique_violation(e: &DbErr) -> bool {
    if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }
    // Some drivers surface the violation only in the message text.
    let msg = e.to_string();
    msg.contains("UNIQUE constraint failed") || msg.contains("duplicate key")
}
