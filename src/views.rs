//! Представления консоли и View Router: маршрут → представление.

mod contacts;
mod entity_form;
mod entity_list;
mod format;
mod menu;
mod users;

use crate::api::{ApiClient, ApiError, EntityKind, Upload};
use crate::console::{Action, HostChrome, RequestSlot, Route, Screen, SessionSettings, Ticket};
use crate::drafts::Drafts;
use tokio_util::sync::CancellationToken;

use contacts::ContactsView;
use entity_form::EntityFormView;
use entity_list::EntityListView;
use users::UsersView;

/// Окружение, в котором работает представление, и накопленные им эффекты:
/// переход и тосты применяет сессия после возврата из обработчика.
pub struct ViewContext<'a> {
    pub client: &'a ApiClient,
    pub host: &'a dyn HostChrome,
    pub drafts: &'a Drafts,
    scope: CancellationToken,
    navigate_to: Option<String>,
    toasts: Vec<String>,
}

impl<'a> ViewContext<'a> {
    pub fn new(client: &'a ApiClient, host: &'a dyn HostChrome, drafts: &'a Drafts) -> Self {
        Self {
            client,
            host,
            drafts,
            scope: CancellationToken::new(),
            navigate_to: None,
            toasts: Vec::new(),
        }
    }

    /// Загрузки события отменяются вместе с `scope`.
    pub fn with_scope(mut self, scope: CancellationToken) -> Self {
        self.scope = scope;
        self
    }

    pub fn ticket(&self, slot: &mut RequestSlot) -> Ticket {
        slot.begin(&self.scope)
    }

    pub fn navigate(&mut self, path: impl Into<String>) {
        self.navigate_to = Some(path.into());
    }

    pub fn toast(&mut self, message: impl Into<String>) {
        self.toasts.push(message.into());
    }

    /// Показывает ошибку тостом. Об истёкшей сессии хост уже сообщил сам.
    pub fn report(&mut self, error: &ApiError) {
        if matches!(error, ApiError::Unauthorized) {
            return;
        }
        if let Some(message) = error.user_message() {
            self.toast(message);
        }
    }

    pub fn finish(self) -> (Option<String>, Vec<String>) {
        (self.navigate_to, self.toasts)
    }
}

pub enum View {
    Menu,
    EntityList(EntityListView),
    EntityForm(EntityFormView),
    Contacts(ContactsView),
    Users(UsersView),
    NotFound(String),
}

impl View {
    pub fn for_route(route: &Route, settings: &SessionSettings) -> Self {
        let segments: Vec<&str> = route.segments.iter().map(String::as_str).collect();
        let view = match segments.as_slice() {
            [] => Some(Self::Menu),
            ["contacts"] => Some(Self::Contacts(ContactsView::new(settings.contacts_page_size))),
            ["users"] => Some(Self::Users(UsersView::default())),
            [collection] => EntityKind::from_segment(collection)
                .map(|kind| Self::EntityList(EntityListView::new(kind, settings.list_limit))),
            [collection, target] => EntityKind::from_segment(collection)
                .map(|kind| Self::EntityForm(EntityFormView::new(kind, target))),
            _ => None,
        };
        view.unwrap_or_else(|| Self::NotFound(route.path.clone()))
    }

    pub async fn load(&mut self, ctx: &mut ViewContext<'_>) {
        match self {
            Self::EntityList(view) => view.load(ctx).await,
            Self::EntityForm(view) => view.load(ctx).await,
            Self::Contacts(view) => view.load(ctx).await,
            Self::Users(view) => view.load(ctx).await,
            Self::Menu | Self::NotFound(_) => {}
        }
    }

    pub async fn handle(&mut self, action: Action, ctx: &mut ViewContext<'_>) {
        match self {
            Self::EntityList(view) => view.handle(action, ctx).await,
            Self::EntityForm(view) => view.handle(action, ctx).await,
            Self::Contacts(view) => view.handle(action, ctx).await,
            Self::Users(view) => view.handle(action, ctx).await,
            Self::Menu | Self::NotFound(_) => {
                tracing::debug!(action = ?action, "Action ignored by static view");
            }
        }
    }

    /// Текстовый ответ на запрос ввода.
    pub async fn handle_text(&mut self, text: &str, ctx: &mut ViewContext<'_>) {
        match self {
            Self::EntityList(view) => view.handle_text(text, ctx).await,
            Self::EntityForm(view) => view.handle_text(text, ctx).await,
            Self::Users(view) => view.handle_text(text, ctx).await,
            Self::Contacts(_) | Self::Menu | Self::NotFound(_) => {
                ctx.toast("Используйте кнопки под сообщением");
            }
        }
    }

    pub async fn handle_upload(&mut self, upload: Upload, ctx: &mut ViewContext<'_>) {
        match self {
            Self::EntityForm(view) => view.handle_upload(upload, ctx).await,
            _ => ctx.toast("Изображение можно загрузить только в карточке записи"),
        }
    }

    pub fn render(&self) -> Screen {
        match self {
            Self::Menu => menu::render(),
            Self::EntityList(view) => view.render(),
            Self::EntityForm(view) => view.render(),
            Self::Contacts(view) => view.render(),
            Self::Users(view) => view.render(),
            Self::NotFound(path) => Screen::new(format!("Страница не найдена: {}", path)).row(vec![
                crate::console::Button::new("🏠 В меню", Action::Navigate("/".to_string())),
            ]),
        }
    }
}
