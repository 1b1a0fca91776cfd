//! Платформенно-независимое описание экрана: текст + кнопки с действиями.

use crate::api::{ImageSlot, StatusAction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Navigate(String),
    Back,
    Retry,
    Refresh,
    Tab(usize),
    Page(i64),
    ToggleSort,
    Search,
    ClearSearch,
    Edit(String),
    Save,
    Transition(StatusAction),
    Delete,
    Upload(ImageSlot),
    Process(i64),
    Unprocess(i64),
    AddUser,
    RemoveUser(i64),
}

fn status_action_name(action: StatusAction) -> &'static str {
    action.path_segment()
}

fn parse_status_action(raw: &str) -> Option<StatusAction> {
    match raw {
        "publish" => Some(StatusAction::Publish),
        "unpublish" => Some(StatusAction::Unpublish),
        "cancel" => Some(StatusAction::Cancel),
        "archive" => Some(StatusAction::Archive),
        "reactivate" => Some(StatusAction::Reactivate),
        _ => None,
    }
}

fn image_slot_name(slot: ImageSlot) -> &'static str {
    match slot {
        ImageSlot::Cover => "cover",
        ImageSlot::Desktop => "desktop",
        ImageSlot::Mobile => "mobile",
    }
}

fn parse_image_slot(raw: &str) -> Option<ImageSlot> {
    match raw {
        "cover" => Some(ImageSlot::Cover),
        "desktop" => Some(ImageSlot::Desktop),
        "mobile" => Some(ImageSlot::Mobile),
        _ => None,
    }
}

impl Action {
    /// Компактная строка для callback-данных (лимит Telegram 64 байта).
    pub fn encode(&self) -> String {
        match self {
            Self::Navigate(path) => format!("nav:{}", path),
            Self::Back => "back".to_string(),
            Self::Retry => "retry".to_string(),
            Self::Refresh => "refresh".to_string(),
            Self::Tab(index) => format!("tab:{}", index),
            Self::Page(page) => format!("page:{}", page),
            Self::ToggleSort => "sort".to_string(),
            Self::Search => "search".to_string(),
            Self::ClearSearch => "search_clear".to_string(),
            Self::Edit(field) => format!("edit:{}", field),
            Self::Save => "save".to_string(),
            Self::Transition(action) => format!("st:{}", status_action_name(*action)),
            Self::Delete => "delete".to_string(),
            Self::Upload(slot) => format!("img:{}", image_slot_name(*slot)),
            Self::Process(id) => format!("proc:{}", id),
            Self::Unprocess(id) => format!("unproc:{}", id),
            Self::AddUser => "user_add".to_string(),
            Self::RemoveUser(id) => format!("user_rm:{}", id),
        }
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let (name, arg) = match raw.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (raw, None),
        };
        let action = match (name, arg) {
            ("nav", Some(path)) if path.starts_with('/') => Self::Navigate(path.to_string()),
            ("back", None) => Self::Back,
            ("retry", None) => Self::Retry,
            ("refresh", None) => Self::Refresh,
            ("tab", Some(index)) => Self::Tab(index.parse().ok()?),
            ("page", Some(page)) => Self::Page(page.parse().ok()?),
            ("sort", None) => Self::ToggleSort,
            ("search", None) => Self::Search,
            ("search_clear", None) => Self::ClearSearch,
            ("edit", Some(field)) if !field.is_empty() => Self::Edit(field.to_string()),
            ("save", None) => Self::Save,
            ("st", Some(action)) => Self::Transition(parse_status_action(action)?),
            ("delete", None) => Self::Delete,
            ("img", Some(slot)) => Self::Upload(parse_image_slot(slot)?),
            ("proc", Some(id)) => Self::Process(id.parse().ok()?),
            ("unproc", Some(id)) => Self::Unprocess(id.parse().ok()?),
            ("user_add", None) => Self::AddUser,
            ("user_rm", Some(id)) => Self::RemoveUser(id.parse().ok()?),
            _ => return None,
        };
        Some(action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: Action,
}

impl Button {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screen {
    pub text: String,
    pub rows: Vec<Vec<Button>>,
}

impl Screen {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        self.push_row(buttons);
        self
    }

    pub fn push_row(&mut self, buttons: Vec<Button>) {
        if !buttons.is_empty() {
            self.rows.push(buttons);
        }
    }

    /// Раскладывает кнопки по строкам заданной ширины.
    pub fn push_grid(&mut self, buttons: Vec<Button>, width: usize) {
        let mut buttons = buttons.into_iter().peekable();
        while buttons.peek().is_some() {
            self.push_row(buttons.by_ref().take(width.max(1)).collect());
        }
    }

    #[cfg(test)]
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.rows.iter().flatten().map(|button| &button.action)
    }
}
