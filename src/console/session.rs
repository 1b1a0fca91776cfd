//! Сессия консоли: Auth Gate, навигация и текущее представление одного
//! администратора. События обрабатываются по одному, до конца.

use super::auth::{AuthGate, AuthState, DenialCause};
use super::host::HostChrome;
use super::navigation::NavigationController;
use super::route::{Location, Route};
use super::screen::{Action, Button, Screen};
use crate::api::{ApiClient, Upload};
use crate::drafts::Drafts;
use crate::views::{View, ViewContext};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub list_limit: u32,
    pub contacts_page_size: u32,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Action(Action),
    /// Текстовый ответ администратора.
    Text(String),
    Upload(Upload),
}

impl SessionEvent {
    /// Уводит с текущего экрана или меняет его выборку: незавершённые
    /// загрузки прежнего состояния больше не нужны.
    pub fn supersedes_loads(&self) -> bool {
        matches!(
            self,
            Self::Action(
                Action::Back
                    | Action::Navigate(_)
                    | Action::Tab(_)
                    | Action::Page(_)
                    | Action::ToggleSort
                    | Action::Refresh
                    | Action::ClearSearch
            )
        )
    }
}

pub struct Session {
    host: Arc<dyn HostChrome>,
    client: ApiClient,
    drafts: Drafts,
    settings: SessionSettings,
    auth: AuthGate,
    navigation: NavigationController,
    view: Option<View>,
    toasts: Vec<String>,
    scope: CancellationToken,
}

impl Session {
    pub fn new(
        host: Arc<dyn HostChrome>,
        client: ApiClient,
        drafts: Drafts,
        settings: SessionSettings,
        start_path: &str,
    ) -> Self {
        host.expand();
        let auth = AuthGate::new(client.credential().is_present());
        let navigation = NavigationController::start(Location::new(start_path), host.clone());
        Self {
            host,
            client,
            drafts,
            settings,
            auth,
            navigation,
            view: None,
            toasts: Vec::new(),
            scope: CancellationToken::new(),
        }
    }

    /// Область загрузок для следующего события. Отменённая область
    /// заменяется новой.
    pub fn load_scope(&mut self) -> CancellationToken {
        if self.scope.is_cancelled() {
            self.scope = CancellationToken::new();
        }
        self.scope.clone()
    }

    /// Проверяет доступ и, если он есть, монтирует представление текущего маршрута.
    pub async fn start(&mut self) {
        self.auth.resolve(&self.client, self.host.as_ref()).await;
        if self.auth.allows_views() {
            self.mount().await;
            self.pump().await;
        }
    }

    pub async fn handle(&mut self, event: SessionEvent) {
        if let SessionEvent::Action(Action::Retry) = event {
            if self.auth.retry() {
                self.start().await;
            }
            return;
        }
        if !self.auth.allows_views() {
            tracing::debug!(state = ?self.auth.state(), "Event ignored before access is granted");
            return;
        }

        match event {
            SessionEvent::Action(Action::Back) => {
                if !self.host.back_button().click() {
                    tracing::debug!("Back pressed without a handler");
                }
            }
            SessionEvent::Action(Action::Navigate(path)) => self.navigation.navigate(&path),
            SessionEvent::Action(action) => {
                if let Some(view) = self.view.as_mut() {
                    let mut ctx = ViewContext::new(&self.client, self.host.as_ref(), &self.drafts)
                        .with_scope(self.scope.clone());
                    view.handle(action, &mut ctx).await;
                    let (navigate_to, toasts) = ctx.finish();
                    self.apply(navigate_to, toasts);
                }
            }
            SessionEvent::Text(text) => {
                if let Some(view) = self.view.as_mut() {
                    let mut ctx = ViewContext::new(&self.client, self.host.as_ref(), &self.drafts)
                        .with_scope(self.scope.clone());
                    view.handle_text(&text, &mut ctx).await;
                    let (navigate_to, toasts) = ctx.finish();
                    self.apply(navigate_to, toasts);
                }
            }
            SessionEvent::Upload(upload) => {
                if let Some(view) = self.view.as_mut() {
                    let mut ctx = ViewContext::new(&self.client, self.host.as_ref(), &self.drafts)
                        .with_scope(self.scope.clone());
                    view.handle_upload(upload, &mut ctx).await;
                    let (navigate_to, toasts) = ctx.finish();
                    self.apply(navigate_to, toasts);
                }
            }
        }
        self.pump().await;
    }

    /// Разбирает очередь уведомлений о смене адреса строго по порядку.
    async fn pump(&mut self) {
        while self.navigation.process_next() {
            self.mount().await;
        }
    }

    async fn mount(&mut self) {
        let route = self.navigation.route().clone();
        tracing::debug!(path = %route.path, "Mounting view");
        // Прежнее представление уходит первым: его незавершённые запросы отменяются.
        self.view = None;
        let mut view = View::for_route(&route, &self.settings);
        let mut ctx = ViewContext::new(&self.client, self.host.as_ref(), &self.drafts)
            .with_scope(self.scope.clone());
        view.load(&mut ctx).await;
        let (navigate_to, toasts) = ctx.finish();
        self.view = Some(view);
        self.apply(navigate_to, toasts);
    }

    fn apply(&mut self, navigate_to: Option<String>, toasts: Vec<String>) {
        self.toasts.extend(toasts);
        if let Some(path) = navigate_to {
            self.navigation.navigate(&path);
        }
    }

    pub fn route(&self) -> &Route {
        self.navigation.route()
    }

    pub fn auth_state(&self) -> &AuthState {
        self.auth.state()
    }

    pub fn take_toasts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.toasts)
    }

    pub fn screen(&self) -> Screen {
        match self.auth.state() {
            AuthState::Pending => Screen::new("Загрузка…"),
            AuthState::Unavailable | AuthState::Denied(DenialCause::Unauthenticated) => {
                Screen::new("Доступ запрещён\n\nОткройте приложение через Telegram-бот.")
            }
            AuthState::Denied(DenialCause::Unauthorized) => Screen::new(
                "Доступ запрещён\n\nВаш аккаунт не входит в список администраторов.",
            ),
            AuthState::Error(message) => {
                Screen::new(format!("Не удалось проверить доступ\n\n{}", message))
                    .row(vec![Button::new("🔄 Повторить", Action::Retry)])
            }
            AuthState::Allowed => self
                .view
                .as_ref()
                .map(View::render)
                .unwrap_or_else(|| Screen::new("Загрузка…")),
        }
    }
}
