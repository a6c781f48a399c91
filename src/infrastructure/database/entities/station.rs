//! Station entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "stations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,

    /// JSON array of connector standards, e.g. `["CCS2","Type2"]`
    pub connector_types: String,

    /// Daily opening time (UTC wall-clock)
    pub opens_at: ChronoTime,
    /// Daily closing time (UTC wall-clock)
    pub closes_at: ChronoTime,

    pub total_capacity: i32,
    pub is_active: bool,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
