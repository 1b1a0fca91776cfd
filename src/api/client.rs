use super::error::ApiError;
use crate::console::HostChrome;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode, multipart};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const INIT_DATA_HEADER: &str = "X-Telegram-Init-Data";

const SESSION_EXPIRED_NOTICE: &str = "Сессия истекла. Откройте приложение заново.";

/// Учётные данные сессии (подписанная initData). Пустая строка = отсутствует.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential(Option<String>);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self(None)
        } else {
            Self(Some(value))
        }
    }

    #[cfg(test)]
    pub fn absent() -> Self {
        Self(None)
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }

    /// Значение заголовка: отсутствие передаётся пустой строкой, а не пропуском.
    pub fn header_value(&self) -> &str {
        self.0.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
enum Body {
    Json(serde_json::Value),
    Upload(Upload),
}

#[derive(Debug, Default)]
pub struct RequestOptions {
    body: Option<Body>,
    cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(Body::Json(body));
        self
    }

    pub fn upload(mut self, upload: Upload) -> Self {
        self.body = Some(Body::Upload(upload));
        self
    }

    pub fn cancel_with(mut self, token: Option<CancellationToken>) -> Self {
        self.cancel = token;
        self
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    credential: Credential,
    host: Arc<dyn HostChrome>,
}

impl ApiClient {
    pub fn new(
        http: reqwest::Client,
        base: impl Into<String>,
        credential: Credential,
        host: Arc<dyn HostChrome>,
    ) -> Self {
        Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
            credential,
            host,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// `Ok(None)` означает 204.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Option<T>, ApiError> {
        let RequestOptions { body, cancel } = options;
        let Some(token) = cancel else {
            return self.exchange(method, path, body).await;
        };
        if token.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!(method = %method, path = %path, "Request cancelled");
                Err(ApiError::Cancelled)
            }
            result = self.exchange(method.clone(), path, body) => result,
        }
    }

    /// Как `request`, но пустой ответ считается ошибкой.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.request(method, path, options)
            .await?
            .ok_or_else(|| ApiError::failed("Пустой ответ сервера"))
    }

    async fn exchange<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Body>,
    ) -> Result<Option<T>, ApiError> {
        let url = format!("{}{}", self.base, path);
        tracing::debug!(method = %method, path = %path, "API request");

        let builder = self
            .http
            .request(method.clone(), &url)
            .header(INIT_DATA_HEADER, self.credential.header_value());
        let builder = match body {
            Some(Body::Upload(upload)) => {
                let part = multipart::Part::bytes(upload.bytes)
                    .file_name(upload.file_name)
                    .mime_str(&upload.mime)
                    .map_err(|e| ApiError::failed(format!("Некорректный тип файла: {}", e)))?;
                builder.multipart(multipart::Form::new().part("file", part))
            }
            Some(Body::Json(value)) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(value.to_string()),
            None => builder.header(CONTENT_TYPE, "application/json"),
        };

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(method = %method, path = %path, error = %e, "API transport error");
            ApiError::failed(format!("Ошибка сети: {}", e))
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(path = %path, "API returned 401, closing session");
            self.expire_session().await;
            return Err(ApiError::Unauthorized);
        }
        if status == StatusCode::FORBIDDEN {
            tracing::warn!(path = %path, "API returned 403");
            return Err(ApiError::Forbidden);
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(ErrorBody {
                    message: Some(message),
                }) if !message.is_empty() => message,
                _ => format!("HTTP {}", status.as_u16()),
            };
            tracing::warn!(
                method = %method,
                path = %path,
                status = status.as_u16(),
                message = %message,
                "API request failed"
            );
            return Err(ApiError::RequestFailed { message });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::failed(format!("Ошибка сети: {}", e)))?;
        serde_json::from_slice::<T>(&bytes).map(Some).map_err(|e| {
            tracing::warn!(path = %path, error = %e, "API response is not valid JSON");
            ApiError::failed("Некорректный ответ сервера")
        })
    }

    async fn expire_session(&self) {
        self.host.show_alert(SESSION_EXPIRED_NOTICE).await;
        self.host.close().await;
    }
}
