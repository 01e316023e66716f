use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};
use ts_rs::TS;

use crate::analytics::TS_EXPORT_PATH;

/// 广告位
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    TS,
    EnumIter,
    EnumString,
    AsRefStr,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Placement {
    Sidebar,
    Header,
    ArticleTop,
    ArticleBottom,
    Footer,
}

impl Placement {
    /// 所有合法取值（用于错误提示）
    pub fn valid_values() -> String {
        Placement::iter()
            .map(|p| p.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct Advertisement {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub target_url: String,
    pub placement: Placement,
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Advertisement {
    /// 投放侧的有效状态：启用且未过期
    pub fn is_servable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.end_date.is_none_or(|end| end >= now)
    }
}

/// 新建广告的输入
#[derive(Debug, Clone)]
pub struct NewAdvertisement {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub target_url: String,
    pub placement: Placement,
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl NewAdvertisement {
    pub fn new(id: impl Into<String>, name: impl Into<String>, placement: Placement) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image_url: String::new(),
            target_url: String::new(),
            placement,
            is_active: true,
            start_date: Utc::now(),
            end_date: None,
        }
    }

    pub fn with_urls(mut self, image_url: impl Into<String>, target_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self.target_url = target_url.into();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn ending_at(mut self, end: DateTime<Utc>) -> Self {
        self.end_date = Some(end);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn placement_parses_kebab_case() {
        assert_eq!("article-top".parse::<Placement>(), Ok(Placement::ArticleTop));
        assert_eq!("Sidebar".parse::<Placement>(), Ok(Placement::Sidebar));
        assert!("popup".parse::<Placement>().is_err());
        assert_eq!(Placement::ArticleBottom.to_string(), "article-bottom");
        assert_eq!(
            serde_json::to_string(&Placement::ArticleTop).unwrap(),
            "\"article-top\""
        );
    }

    #[test]
    fn servable_requires_active_and_unexpired() {
        let now = Utc::now();
        let mut ad = Advertisement {
            id: "a".into(),
            name: "A".into(),
            image_url: String::new(),
            target_url: String::new(),
            placement: Placement::Footer,
            is_active: true,
            start_date: now - Duration::days(3),
            end_date: None,
            created_at: now,
        };
        assert!(ad.is_servable(now));

        ad.end_date = Some(now - Duration::seconds(1));
        assert!(!ad.is_servable(now));

        ad.end_date = Some(now + Duration::days(1));
        ad.is_active = false;
        assert!(!ad.is_servable(now));
    }
}
