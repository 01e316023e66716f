//! 广告互动事件表迁移
//!
//! 创建三张只追加的事件表：
//! - ad_impressions（曝光）
//! - ad_views（有效浏览，含 view_duration）
//! - ad_clicks（点击）
//!
//! 每张表都建立 (ad_id, created_at) 复合索引和 created_at 索引，
//! 分别服务于单广告时间范围查询和全局滚动窗口查询。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum EventColumn {
    Id,
    AdId,
    SessionId,
    Page,
    ViewDuration,
    CreatedAt,
}

#[derive(DeriveIden, Clone)]
enum AdImpressions {
    #[sea_orm(iden = "ad_impressions")]
    Table,
}

#[derive(DeriveIden, Clone)]
enum AdViews {
    #[sea_orm(iden = "ad_views")]
    Table,
}

#[derive(DeriveIden, Clone)]
enum AdClicks {
    #[sea_orm(iden = "ad_clicks")]
    Table,
}

/// 构建事件表公共结构
fn event_table<T: IntoIden + Clone + 'static>(table: T, with_duration: bool) -> TableCreateStatement {
    let mut stmt = Table::create();
    stmt.table(table)
        .if_not_exists()
        .col(
            ColumnDef::new(EventColumn::Id)
                .big_integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(EventColumn::AdId).string_len(64).not_null())
        .col(
            ColumnDef::new(EventColumn::SessionId)
                .string_len(128)
                .not_null(),
        )
        .col(ColumnDef::new(EventColumn::Page).text().null());

    if with_duration {
        stmt.col(
            ColumnDef::new(EventColumn::ViewDuration)
                .big_integer()
                .not_null()
                .default(0),
        );
    }

    stmt.col(
        ColumnDef::new(EventColumn::CreatedAt)
            .timestamp_with_time_zone()
            .not_null(),
    )
    .to_owned()
}

async fn create_event_indexes<T: IntoIden + Clone + 'static>(
    manager: &SchemaManager<'_>,
    table: T,
    prefix: &str,
) -> Result<(), DbErr> {
    manager
        .create_index(
            Index::create()
                .if_not_exists()
                .name(format!("idx_{}_ad_time", prefix))
                .table(table.clone())
                .col(EventColumn::AdId)
                .col(EventColumn::CreatedAt)
                .to_owned(),
        )
        .await?;

    manager
        .create_index(
            Index::create()
                .if_not_exists()
                .name(format!("idx_{}_created_at", prefix))
                .table(table)
                .col(EventColumn::CreatedAt)
                .to_owned(),
        )
        .await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(event_table(AdImpressions::Table, false))
            .await?;
        create_event_indexes(manager, AdImpressions::Table, "ad_impressions").await?;

        manager
            .create_table(event_table(AdViews::Table, true))
            .await?;
        create_event_indexes(manager, AdViews::Table, "ad_views").await?;

        manager
            .create_table(event_table(AdClicks::Table, false))
            .await?;
        create_event_indexes(manager, AdClicks::Table, "ad_clicks").await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for prefix in ["ad_impressions", "ad_views", "ad_clicks"] {
            manager
                .drop_index(Index::drop().name(format!("idx_{}_ad_time", prefix)).to_owned())
                .await?;
            manager
                .drop_index(
                    Index::drop()
                        .name(format!("idx_{}_created_at", prefix))
                        .to_owned(),
                )
                .await?;
        }

        manager
            .drop_table(Table::drop().table(AdClicks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AdViews::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AdImpressions::Table).to_owned())
            .await
    }
}
