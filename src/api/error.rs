use thiserror::Error;

/// Исход неуспешного запроса. Транспортные ошибки и ошибки разбора
/// сводятся к `RequestFailed` и наружу не выходят.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// initData отсутствует, просрочена или подпись неверна. Сессия завершается.
    #[error("Сессия истекла")]
    Unauthorized,
    /// Пользователь опознан, но не входит в белый список.
    #[error("Доступ запрещён")]
    Forbidden,
    #[error("{message}")]
    RequestFailed { message: String },
    /// Запрос вытеснен более новым. Пользователю не показывается.
    #[error("Запрос отменён")]
    Cancelled,
}

impl ApiError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::RequestFailed {
            message: message.into(),
        }
    }

    #[cfg(test)]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Текст для тоста; `None` для ошибок, которые не показываются.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Cancelled => None,
            other => Some(other.to_string()),
        }
    }
}
