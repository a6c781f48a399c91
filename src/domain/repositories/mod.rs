//! Repository access for the domain layer
//!
//! - `RepositoryProvider`: one handle exposing every per-aggregate repository
//! - `DomainResult`: standard result type for domain operations

use super::booking::BookingLedger;
use super::station::StationRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let station = repos.stations().find_by_id("BUNK-01").await?;
///     let booking = repos.bookings().find_by_id("…").await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn stations(&self) -> &dyn StationRepository;
    fn bookings(&self) -> &dyn BookingLedger;
}
