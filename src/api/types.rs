use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    Draft,
    Published,
    Cancelled,
    Archived,
}

impl EntityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Cancelled => "cancelled",
            Self::Archived => "archived",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Draft => "Черновик",
            Self::Published => "Опубликовано",
            Self::Cancelled => "Отменено",
            Self::Archived => "Архив",
        }
    }
}

/// Сущности с общим жизненным циклом (черновик → публикация → …).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Event,
    Course,
}

impl EntityKind {
    pub fn collection(self) -> &'static str {
        match self {
            Self::Event => "events",
            Self::Course => "courses",
        }
    }

    /// Ключ черновика в хранилище.
    pub fn draft_kind(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Course => "course",
        }
    }

    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "events" => Some(Self::Event),
            "courses" => Some(Self::Course),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    Publish,
    Unpublish,
    Cancel,
    Archive,
    Reactivate,
}

impl StatusAction {
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Unpublish => "unpublish",
            Self::Cancel => "cancel",
            Self::Archive => "archive",
            Self::Reactivate => "reactivate",
        }
    }

    /// Действия, доступные из текущего статуса.
    pub fn available_from(status: EntityStatus) -> Vec<StatusAction> {
        match status {
            EntityStatus::Draft => vec![Self::Publish],
            EntityStatus::Published => vec![Self::Unpublish, Self::Cancel, Self::Archive],
            EntityStatus::Cancelled => vec![Self::Reactivate, Self::Archive],
            EntityStatus::Archived => vec![Self::Reactivate],
        }
    }
}

/// Слот изображения: обложка мероприятия или баннеры курса.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Cover,
    Desktop,
    Mobile,
}

impl ImageSlot {
    pub fn for_kind(kind: EntityKind) -> &'static [ImageSlot] {
        match kind {
            EntityKind::Event => &[Self::Cover],
            EntityKind::Course => &[Self::Desktop, Self::Mobile],
        }
    }

    pub fn query(self) -> Option<&'static str> {
        match self {
            Self::Cover => None,
            Self::Desktop => Some("desktop"),
            Self::Mobile => Some("mobile"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub event_date: Option<String>,
    pub event_time: Option<String>,
    pub cover_image: Option<String>,
    pub ticket_link: Option<String>,
    pub status: EntityStatus,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub detailed_description: Option<String>,
    #[serde(default)]
    pub schedule: String,
    pub image_desktop: Option<String>,
    pub image_mobile: Option<String>,
    #[serde(deserialize_with = "number_or_string")]
    pub cost: String,
    pub currency: String,
    pub status: EntityStatus,
    #[serde(default)]
    pub order: i64,
}

/// Decimal приходит строкой ("1500.00") или числом, в зависимости от сериализатора.
fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => "0".to_string(),
        other => other.to_string(),
    })
}

/// Минимум, нужный после create/patch/status-переходов.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityRef {
    pub id: i64,
    pub status: EntityStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    #[serde(default)]
    pub message: String,
    pub source: Option<String>,
    pub is_processed: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContactFilter {
    #[default]
    Unprocessed,
    Processed,
    All,
}

impl ContactFilter {
    pub const ALL: [ContactFilter; 3] = [Self::Unprocessed, Self::Processed, Self::All];

    pub fn is_processed(self) -> Option<bool> {
        match self {
            Self::Unprocessed => Some(false),
            Self::Processed => Some(true),
            Self::All => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unprocessed => "Новые",
            Self::Processed => "Обработанные",
            Self::All => "Все",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Desc,
    Asc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Desc => "desc",
            Self::Asc => "asc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Desc => Self::Asc,
            Self::Asc => Self::Desc,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageUploadResponse {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_cost_accepts_decimal_string_and_number() {
        let base = r#""id": 1, "title": "Керамика", "detailed_description": null,
            "image_desktop": null, "image_mobile": null, "currency": "RUB",
            "status": "draft", "created_at": "2025-01-01T10:00:00""#;
        let as_string: Course =
            serde_json::from_str(&format!(r#"{{{base}, "cost": "1500.00"}}"#)).unwrap();
        let as_number: Course = serde_json::from_str(&format!(r#"{{{base}, "cost": 1500}}"#)).unwrap();
        assert_eq!(as_string.cost, "1500.00");
        assert_eq!(as_number.cost, "1500");
    }

    #[test]
    fn status_actions_follow_lifecycle() {
        assert_eq!(
            StatusAction::available_from(EntityStatus::Draft),
            vec![StatusAction::Publish]
        );
        assert_eq!(
            StatusAction::available_from(EntityStatus::Published),
            vec![StatusAction::Unpublish, StatusAction::Cancel, StatusAction::Archive]
        );
        assert_eq!(
            StatusAction::available_from(EntityStatus::Archived),
            vec![StatusAction::Reactivate]
        );
    }
}
