//! Контракт хоста (оболочки, в которую встроена консоль).

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type BackHandler = Arc<dyn Fn() + Send + Sync>;

/// Диспозер обработчика «Назад»; снимается через `BackButton::off_click`.
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct BackSubscription {
    id: u64,
}

#[derive(Default)]
struct BackButtonState {
    visible: bool,
    handler: Option<(u64, BackHandler)>,
    next_id: u64,
}

/// Кнопка «Назад» хоста. Держит не более одного обработчика.
#[derive(Default)]
pub struct BackButton {
    state: Mutex<BackButtonState>,
}

impl BackButton {
    pub fn show(&self) {
        self.lock().visible = true;
    }

    pub fn hide(&self) {
        self.lock().visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.lock().visible
    }

    #[cfg(test)]
    pub fn is_bound(&self) -> bool {
        self.lock().handler.is_some()
    }

    pub fn on_click(&self, handler: BackHandler) -> BackSubscription {
        let mut state = self.lock();
        if state.handler.is_some() {
            tracing::warn!("Back handler replaced without off_click");
        }
        state.next_id += 1;
        let id = state.next_id;
        state.handler = Some((id, handler));
        BackSubscription { id }
    }

    /// Снимает обработчик, только если он всё ещё принадлежит подписке.
    pub fn off_click(&self, subscription: BackSubscription) {
        let mut state = self.lock();
        if state
            .handler
            .as_ref()
            .is_some_and(|(id, _)| *id == subscription.id)
        {
            state.handler = None;
        }
    }

    /// Нажатие пользователем. `false`, если кнопка скрыта или не привязана.
    pub fn click(&self) -> bool {
        let handler = {
            let state = self.lock();
            if !state.visible {
                return false;
            }
            state.handler.as_ref().map(|(_, handler)| handler.clone())
        };
        match handler {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BackButtonState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
pub trait HostChrome: Send + Sync {
    /// Подписанные данные запуска; `None`, если консоль открыта вне Telegram.
    fn init_data(&self) -> Option<String>;

    /// Консоль загрузилась: хост убирает свой индикатор загрузки.
    fn ready(&self);

    fn expand(&self);

    fn back_button(&self) -> &BackButton;

    async fn show_alert(&self, message: &str);

    async fn confirm(&self, message: &str) -> bool;

    async fn close(&self);
}
