//! 广告表迁移
//!
//! advertisements 表由运营方维护，追踪子系统只读。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Advertisements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Advertisements::Id)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Advertisements::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Advertisements::ImageUrl).text().not_null())
                    .col(ColumnDef::new(Advertisements::TargetUrl).text().not_null())
                    .col(
                        ColumnDef::new(Advertisements::Placement)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Advertisements::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Advertisements::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Advertisements::EndDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Advertisements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 投放位查询索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_advertisements_placement")
                    .table(Advertisements::Table)
                    .col(Advertisements::Placement)
                    .col(Advertisements::IsActive)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_advertisements_placement")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Advertisements::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Advertisements {
    #[sea_orm(iden = "advertisements")]
    Table,
    Id,
    Name,
    ImageUrl,
    TargetUrl,
    Placement,
    IsActive,
    StartDate,
    EndDate,
    CreatedAt,
}
