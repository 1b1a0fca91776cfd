//! Типизированные эндпоинты поверх `ApiClient::request`.

use super::client::{ApiClient, RequestOptions, Upload};
use super::error::ApiError;
use super::types::{
    Contact, ContactFilter, Course, EntityKind, EntityRef, EntityStatus, Event, ImageSlot,
    ImageUploadResponse, NewUser, Page, SortOrder, StatusAction, User,
};
use reqwest::Method;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityQuery {
    pub status: Option<EntityStatus>,
    pub search: String,
    pub limit: u32,
}

impl EntityQuery {
    pub fn path(&self, kind: EntityKind) -> String {
        let mut path = format!("/{}?limit={}", kind.collection(), self.limit);
        if let Some(status) = self.status {
            path.push_str("&status=");
            path.push_str(status.as_str());
        }
        let search = self.search.trim();
        if !search.is_empty() {
            path.push_str("&search=");
            path.push_str(&urlencoding::encode(search));
        }
        path
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactQuery {
    pub filter: ContactFilter,
    pub offset: i64,
    pub limit: u32,
    pub sort: SortOrder,
}

impl ContactQuery {
    pub fn path(&self) -> String {
        let mut path = format!(
            "/contacts?offset={}&limit={}&sort={}",
            self.offset.max(0),
            self.limit,
            self.sort.as_str()
        );
        if let Some(processed) = self.filter.is_processed() {
            path.push_str(&format!("&is_processed={}", processed));
        }
        path
    }
}

impl ApiClient {
    /// Проверка личности для Auth Gate: белый список пользователей доступен
    /// любому авторизованному администратору.
    pub async fn identity_check(&self) -> Result<(), ApiError> {
        self.request::<Vec<User>>(Method::GET, "/users", RequestOptions::new())
            .await
            .map(|_| ())
    }

    pub async fn list_events(
        &self,
        query: &EntityQuery,
        cancel: Option<CancellationToken>,
    ) -> Result<Page<Event>, ApiError> {
        self.fetch(
            Method::GET,
            &query.path(EntityKind::Event),
            RequestOptions::new().cancel_with(cancel),
        )
        .await
    }

    pub async fn list_courses(
        &self,
        query: &EntityQuery,
        cancel: Option<CancellationToken>,
    ) -> Result<Page<Course>, ApiError> {
        self.fetch(
            Method::GET,
            &query.path(EntityKind::Course),
            RequestOptions::new().cancel_with(cancel),
        )
        .await
    }

    pub async fn get_event(
        &self,
        id: i64,
        cancel: Option<CancellationToken>,
    ) -> Result<Event, ApiError> {
        self.fetch(
            Method::GET,
            &format!("/events/{}", id),
            RequestOptions::new().cancel_with(cancel),
        )
        .await
    }

    pub async fn get_course(
        &self,
        id: i64,
        cancel: Option<CancellationToken>,
    ) -> Result<Course, ApiError> {
        self.fetch(
            Method::GET,
            &format!("/courses/{}", id),
            RequestOptions::new().cancel_with(cancel),
        )
        .await
    }

    pub async fn create_entity(
        &self,
        kind: EntityKind,
        payload: serde_json::Value,
    ) -> Result<EntityRef, ApiError> {
        self.fetch(
            Method::POST,
            &format!("/{}", kind.collection()),
            RequestOptions::new().json(payload),
        )
        .await
    }

    pub async fn update_entity(
        &self,
        kind: EntityKind,
        id: i64,
        payload: serde_json::Value,
    ) -> Result<EntityRef, ApiError> {
        self.fetch(
            Method::PATCH,
            &format!("/{}/{}", kind.collection(), id),
            RequestOptions::new().json(payload),
        )
        .await
    }

    pub async fn transition_entity(
        &self,
        kind: EntityKind,
        id: i64,
        action: StatusAction,
    ) -> Result<EntityRef, ApiError> {
        self.fetch(
            Method::POST,
            &format!("/{}/{}/{}", kind.collection(), id, action.path_segment()),
            RequestOptions::new(),
        )
        .await
    }

    pub async fn delete_entity(&self, kind: EntityKind, id: i64) -> Result<(), ApiError> {
        self.request::<serde_json::Value>(
            Method::DELETE,
            &format!("/{}/{}", kind.collection(), id),
            RequestOptions::new(),
        )
        .await
        .map(|_| ())
    }

    pub async fn upload_image(
        &self,
        kind: EntityKind,
        id: i64,
        slot: ImageSlot,
        upload: Upload,
    ) -> Result<ImageUploadResponse, ApiError> {
        let mut path = format!("/{}/{}/upload-image", kind.collection(), id);
        if let Some(image_type) = slot.query() {
            path.push_str("?type=");
            path.push_str(image_type);
        }
        self.fetch(Method::POST, &path, RequestOptions::new().upload(upload))
            .await
    }

    pub async fn list_contacts(
        &self,
        query: &ContactQuery,
        cancel: Option<CancellationToken>,
    ) -> Result<Page<Contact>, ApiError> {
        self.fetch(
            Method::GET,
            &query.path(),
            RequestOptions::new().cancel_with(cancel),
        )
        .await
    }

    pub async fn set_contact_processed(
        &self,
        id: i64,
        processed: bool,
    ) -> Result<Contact, ApiError> {
        let action = if processed { "process" } else { "unprocess" };
        self.fetch(
            Method::PATCH,
            &format!("/contacts/{}/{}", id, action),
            RequestOptions::new(),
        )
        .await
    }

    pub async fn list_users(
        &self,
        cancel: Option<CancellationToken>,
    ) -> Result<Vec<User>, ApiError> {
        self.fetch(
            Method::GET,
            "/users",
            RequestOptions::new().cancel_with(cancel),
        )
        .await
    }

    pub async fn add_user(&self, user: &NewUser) -> Result<User, ApiError> {
        let payload = serde_json::to_value(user)
            .map_err(|e| ApiError::failed(format!("Некорректные данные: {}", e)))?;
        self.fetch(Method::POST, "/users", RequestOptions::new().json(payload))
            .await
    }

    pub async fn remove_user(&self, id: i64) -> Result<(), ApiError> {
        self.request::<serde_json::Value>(
            Method::DELETE,
            &format!("/users/{}", id),
            RequestOptions::new(),
        )
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_query_encodes_search_and_status() {
        let query = EntityQuery {
            status: Some(EntityStatus::Published),
            search: " мастер класс ".to_string(),
            limit: 50,
        };
        assert_eq!(
            query.path(EntityKind::Event),
            "/events?limit=50&status=published&search=%D0%BC%D0%B0%D1%81%D1%82%D0%B5%D1%80%20%D0%BA%D0%BB%D0%B0%D1%81%D1%81"
        );
    }

    #[test]
    fn entity_query_without_filters() {
        let query = EntityQuery {
            status: None,
            search: String::new(),
            limit: 20,
        };
        assert_eq!(query.path(EntityKind::Course), "/courses?limit=20");
    }

    #[test]
    fn contact_query_maps_filter_to_is_processed() {
        let mut query = ContactQuery {
            filter: ContactFilter::Unprocessed,
            offset: 40,
            limit: 20,
            sort: SortOrder::Desc,
        };
        assert_eq!(
            query.path(),
            "/contacts?offset=40&limit=20&sort=desc&is_processed=false"
        );
        query.filter = ContactFilter::All;
        query.sort = SortOrder::Asc;
        assert_eq!(query.path(), "/contacts?offset=40&limit=20&sort=asc");
    }
}
