//! Auth Gate: решает, можно ли монтировать представления с данными.

use super::host::HostChrome;
use crate::api::{ApiClient, ApiError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialCause {
    /// initData отсутствует или недействительна (401).
    Unauthenticated,
    /// Пользователь опознан, но не в белом списке (403).
    Unauthorized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Pending,
    Allowed,
    Denied(DenialCause),
    Unavailable,
    Error(String),
}

impl AuthState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

pub struct AuthGate {
    state: AuthState,
    ready_sent: bool,
}

impl AuthGate {
    pub fn new(has_credential: bool) -> Self {
        Self {
            state: if has_credential {
                AuthState::Pending
            } else {
                AuthState::Unavailable
            },
            ready_sent: false,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn allows_views(&self) -> bool {
        self.state == AuthState::Allowed
    }

    /// Проверяет личность, если состояние `Pending`; иначе ничего не запрашивает.
    /// Сигнал `ready` уходит хосту один раз, после выхода из `Pending`.
    pub async fn resolve(&mut self, client: &ApiClient, host: &dyn HostChrome) -> &AuthState {
        if self.state.is_pending() {
            self.state = match client.identity_check().await {
                Ok(()) => AuthState::Allowed,
                Err(ApiError::Unauthorized) => AuthState::Denied(DenialCause::Unauthenticated),
                Err(ApiError::Forbidden) => AuthState::Denied(DenialCause::Unauthorized),
                Err(ApiError::RequestFailed { message }) => AuthState::Error(message),
                Err(ApiError::Cancelled) => AuthState::Error("Запрос отменён".to_string()),
            };
            tracing::info!(state = ?self.state, "Auth gate resolved");
        }
        if !self.ready_sent && !self.state.is_pending() {
            host.ready();
            self.ready_sent = true;
        }
        &self.state
    }

    /// Повтор из `Error` возвращает в `Pending`. Из других состояний не действует.
    pub fn retry(&mut self) -> bool {
        if matches!(self.state, AuthState::Error(_)) {
            self.state = AuthState::Pending;
            true
        } else {
            false
        }
    }
}
