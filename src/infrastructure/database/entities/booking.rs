//! Booking entity
//!
//! At most one row per `(station_id, slot_start)` may have status `Active`.
//! The bookings migration enforces this with a partial unique index.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,
    pub station_id: String,

    pub slot_start: DateTimeUtc,
    pub slot_end: DateTimeUtc,

    /// Status: Active, Cancelled, Completed
    pub status: String,

    /// Booking this one replaced through a reschedule
    #[sea_orm(nullable)]
    pub rescheduled_from: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::station::Entity",
        from = "Column::StationId",
        to = "super::station::Column::Id"
    )]
    Station,
}

impl Related<super::station::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Station.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
