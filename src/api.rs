//! REST-клиент консоли: транспорт, таксономия ошибок, типы и эндпоинты.

mod client;
mod error;
mod resources;
mod types;

use reqwest::Url;

pub use client::{ApiClient, Credential, Upload};
pub use error::ApiError;
pub use resources::{ContactQuery, EntityQuery};
pub use types::{
    Contact, ContactFilter, Course, EntityKind, EntityStatus, Event, ImageSlot, NewUser,
    SortOrder, StatusAction, User,
};

#[cfg(test)]
pub use client::RequestOptions;

/// Префикс API из адреса страницы консоли: `/bot/webapp/` → `/bot/api`.
/// `/webapp` ищется только в пути; query и fragment отбрасываются.
pub fn api_base_from_page_url(page_url: &str) -> Option<String> {
    let url = Url::parse(page_url).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let path = url.path();
    let prefix = match path.find("/webapp") {
        Some(idx) => &path[..idx],
        None => path.trim_end_matches('/'),
    };
    Some(format!("{}{}/api", url.origin().ascii_serialization(), prefix))
}

/// Адрес страницы консоли: http(s) и `/webapp` в пути, а не в имени хоста.
pub fn is_webapp_page_url(page_url: &str) -> bool {
    Url::parse(page_url).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https") && url.path().contains("/webapp")
    })
}

#[cfg(test)]
mod tests {
    use super::{api_base_from_page_url, is_webapp_page_url};

    fn base(page_url: &str) -> String {
        api_base_from_page_url(page_url).expect("absolute http url")
    }

    #[test]
    fn strips_webapp_suffix() {
        assert_eq!(
            base("https://komon.tot.pub/bot179654/webapp/"),
            "https://komon.tot.pub/bot179654/api"
        );
        assert_eq!(base("https://h/bot/webapp/index.html#/events"), "https://h/bot/api");
        assert_eq!(base("https://h/webapp/"), "https://h/api");
    }

    #[test]
    fn webapp_in_host_name_is_not_a_path_prefix() {
        assert_eq!(
            base("https://webapp.komon.pub/bot/webapp/"),
            "https://webapp.komon.pub/bot/api"
        );
        assert_eq!(base("https://webapp.komon.pub/bot/"), "https://webapp.komon.pub/bot/api");
        assert!(!is_webapp_page_url("https://webapp.komon.pub/bot/"));
        assert!(is_webapp_page_url("https://webapp.komon.pub/bot/webapp/"));
    }

    #[test]
    fn drops_query_and_fragment() {
        assert_eq!(
            base("https://h:8443/bot/webapp/?tgWebAppVersion=7#/events/new"),
            "https://h:8443/bot/api"
        );
    }

    #[test]
    fn keeps_url_without_webapp_segment() {
        assert_eq!(base("http://127.0.0.1:8080/"), "http://127.0.0.1:8080/api");
    }

    #[test]
    fn relative_and_non_http_urls_are_rejected() {
        assert_eq!(api_base_from_page_url("/webapp/"), None);
        assert_eq!(api_base_from_page_url("ftp://h/bot/webapp/"), None);
        assert!(!is_webapp_page_url("/bot/webapp/"));
    }
}
