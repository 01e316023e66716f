//! Advertisement directory
//!
//! Ads are owned by the operator. Tracking only reads them, except for
//! `create_ad` which backs seeding and the `ads add` command.

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Condition;
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::info;

use super::SeaOrmStorage;
use super::retry;
use crate::analytics::AdDirectory;
use crate::storage::models::{Advertisement, NewAdvertisement, Placement};

use migration::entities::advertisement;

fn model_to_ad(model: advertisement::Model) -> anyhow::Result<Advertisement> {
    let placement = model
        .placement
        .parse::<Placement>()
        .map_err(|_| anyhow!("ad '{}' has unknown placement '{}'", model.id, model.placement))?;
    Ok(Advertisement {
        id: model.id,
        name: model.name,
        image_url: model.image_url,
        target_url: model.target_url,
        placement,
        is_active: model.is_active,
        start_date: model.start_date,
        end_date: model.end_date,
        created_at: model.created_at,
    })
}

impl SeaOrmStorage {
    pub async fn create_ad(&self, ad: NewAdvertisement) -> anyhow::Result<Advertisement> {
        let now = Utc::now();
        let model = advertisement::ActiveModel {
            id: Set(ad.id.clone()),
            name: Set(ad.name),
            image_url: Set(ad.image_url),
            target_url: Set(ad.target_url),
            placement: Set(ad.placement.to_string()),
            is_active: Set(ad.is_active),
            start_date: Set(ad.start_date),
            end_date: Set(ad.end_date),
            created_at: Set(now),
        };

        let db = &self.db;
        let inserted = retry::with_retry("create_ad", self.retry_config, || async {
            advertisement::Entity::insert(model.clone())
                .exec_with_returning(db)
                .await
        })
        .await
        .with_context(|| format!("failed to create ad '{}'", ad.id))?;

        info!("Advertisement created: {} ({})", inserted.id, inserted.placement);
        model_to_ad(inserted)
    }

    pub async fn get_ad(&self, ad_id: &str) -> anyhow::Result<Option<Advertisement>> {
        advertisement::Entity::find_by_id(ad_id.to_string())
            .one(&self.db)
            .await
            .context("failed to load ad")?
            .map(model_to_ad)
            .transpose()
    }

    /// 全部广告（含停用与过期），历史报表使用
    pub async fn list_ads(&self) -> anyhow::Result<Vec<Advertisement>> {
        advertisement::Entity::find()
            .order_by_asc(advertisement::Column::CreatedAt)
            .order_by_asc(advertisement::Column::Id)
            .all(&self.db)
            .await
            .context("failed to list ads")?
            .into_iter()
            .map(model_to_ad)
            .collect()
    }
}

#[async_trait]
impl AdDirectory for SeaOrmStorage {
    async fn ad_exists(&self, ad_id: &str) -> anyhow::Result<bool> {
        let count = advertisement::Entity::find()
            .filter(advertisement::Column::Id.eq(ad_id))
            .count(&self.db)
            .await
            .context("failed to look up ad")?;
        Ok(count > 0)
    }

    async fn list_active_ads(&self, placement: Placement) -> anyhow::Result<Vec<Advertisement>> {
        let now = Utc::now();
        advertisement::Entity::find()
            .filter(advertisement::Column::Placement.eq(placement.to_string()))
            .filter(advertisement::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(advertisement::Column::EndDate.is_null())
                    .add(advertisement::Column::EndDate.gte(now)),
            )
            .order_by_asc(advertisement::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("failed to list active ads")?
            .into_iter()
            .map(model_to_ad)
            .collect()
    }
}
