use sea_orm::entity::prelude::*;
use time::OffsetDateTime;

/// A cached NVD record. The CVE identifier is the natural key; re-ingesting
/// the same id overwrites every other column.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "cve")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// CVSS base score scaled by 10, so `9.8` is stored as `98`.
    pub score: i32,

    pub severity: String,

    pub published: OffsetDateTime,

    pub description: String,

    /// Raw upstream metrics payload, kept for traceability.
    #[sea_orm(column_type = "JsonBinary")]
    pub metrics: serde_json::Value,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
