//! View event entity (sustained >=50% visibility)

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "ad_views")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub ad_id: String,
    pub session_id: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub page: Option<String>,
    /// 可见时长（毫秒）
    pub view_duration: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
