//! Click event entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "ad_clicks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub ad_id: String,
    pub session_id: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub page: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
