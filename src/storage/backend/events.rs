//! EventSink implementation for SeaOrmStorage
//!
//! Each event kind has its own append-only table. Rows are inserted once and
//! never updated.

use anyhow::Context;
use async_trait::async_trait;
use sea_orm::{ActiveValue::Set, EntityTrait};
use tracing::debug;

use super::SeaOrmStorage;
use super::retry;
use crate::analytics::{EngagementEvent, EventKind, EventSink};

use migration::entities::{ad_click, ad_impression, ad_view};

#[async_trait]
impl EventSink for SeaOrmStorage {
    async fn record_event(&self, event: EngagementEvent) -> anyhow::Result<()> {
        let db = &self.db;
        let op = match event.kind {
            EventKind::Impression => "insert_impression",
            EventKind::View => "insert_view",
            EventKind::Click => "insert_click",
        };

        match event.kind {
            EventKind::Impression => {
                let model = ad_impression::ActiveModel {
                    ad_id: Set(event.ad_id.clone()),
                    session_id: Set(event.session_id.clone()),
                    page: Set(event.page.clone()),
                    created_at: Set(event.timestamp),
                    ..Default::default()
                };
                retry::with_retry(op, self.retry_config, || async {
                    ad_impression::Entity::insert(model.clone()).exec(db).await
                })
                .await
                .map(|_| ())
            }
            EventKind::View => {
                let duration = event.view_duration_ms.unwrap_or(0).min(i64::MAX as u64) as i64;
                let model = ad_view::ActiveModel {
                    ad_id: Set(event.ad_id.clone()),
                    session_id: Set(event.session_id.clone()),
                    page: Set(event.page.clone()),
                    view_duration: Set(duration),
                    created_at: Set(event.timestamp),
                    ..Default::default()
                };
                retry::with_retry(op, self.retry_config, || async {
                    ad_view::Entity::insert(model.clone()).exec(db).await
                })
                .await
                .map(|_| ())
            }
            EventKind::Click => {
                let model = ad_click::ActiveModel {
                    ad_id: Set(event.ad_id.clone()),
                    session_id: Set(event.session_id.clone()),
                    page: Set(event.page.clone()),
                    created_at: Set(event.timestamp),
                    ..Default::default()
                };
                retry::with_retry(op, self.retry_config, || async {
                    ad_click::Entity::insert(model.clone()).exec(db).await
                })
                .await
                .map(|_| ())
            }
        }
        .with_context(|| format!("failed to persist {} for ad '{}'", event.kind, event.ad_id))?;

        debug!(
            "{} recorded: ad={} session={} ({})",
            event.kind,
            event.ad_id,
            event.session_id,
            self.backend_name
        );
        Ok(())
    }
}
