mod content;
mod settings;

pub use content::{
    sort_latest_first, Event, Ministry, NewsItem, PrayerRequest, Sermon, EVENTS_COLLECTION,
    MINISTRIES_COLLECTION, NEWS_COLLECTION, PRAYERS_COLLECTION, SERMONS_COLLECTION,
};
pub use settings::{
    merge_over_default, reconcile_section_order, AboutData, HomeConfig, TenYearsData, WelcomeData,
    ABOUT_DATA_ID, DEFAULT_SECTION_ORDER, HOME_CONFIG_ID, TEN_YEARS_DATA_ID, WELCOME_DATA_ID,
};
