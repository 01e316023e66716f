pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20260301_000001_advertisements;
mod m20260301_000002_engagement_events;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_advertisements::Migration),
            Box::new(m20260301_000002_engagement_events::Migration),
        ]
    }
}
