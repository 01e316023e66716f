pub mod ad_click;
pub mod ad_impression;
pub mod ad_view;
pub mod advertisement;

pub use ad_click::Entity as AdClickEntity;
pub use ad_impression::Entity as AdImpressionEntity;
pub use ad_view::Entity as AdViewEntity;
pub use advertisement::Entity as AdvertisementEntity;
