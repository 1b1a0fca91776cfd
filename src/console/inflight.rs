//! Вытеснение запросов: у представления не больше одного актуального
//! запроса на ключ. Новый запрос отменяет предыдущий до своей отправки.
//! Запрос живёт внутри области события: её отмена снимает и его.

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct Ticket {
    generation: u64,
    token: CancellationToken,
}

impl Ticket {
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

#[derive(Debug, Default)]
pub struct RequestSlot {
    generation: u64,
    current: Option<CancellationToken>,
}

impl RequestSlot {
    pub fn begin(&mut self, scope: &CancellationToken) -> Ticket {
        self.cancel();
        self.generation += 1;
        let token = scope.child_token();
        self.current = Some(token.clone());
        Ticket {
            generation: self.generation,
            token,
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.generation == self.generation && self.current.is_some()
    }

    /// Завершает запрос. При `true` результат можно применять к состоянию.
    pub fn finish(&mut self, ticket: &Ticket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.current = None;
        true
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }

    pub fn is_loading(&self) -> bool {
        self.current.is_some()
    }
}

impl Drop for RequestSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, ApiError, Credential, RequestOptions};
    use crate::console::testing::{RecordingHost, spawn_server};
    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use reqwest::Method;
    use serde::Deserialize;
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[test]
    fn newer_ticket_cancels_older() {
        let scope = CancellationToken::new();
        let mut slot = RequestSlot::default();
        let first = slot.begin(&scope);
        let second = slot.begin(&scope);
        assert!(first.token().is_cancelled());
        assert!(!second.token().is_cancelled());
        assert!(!slot.finish(&first));
        assert!(slot.finish(&second));
        assert!(!slot.is_loading());
    }

    #[test]
    fn finished_ticket_cannot_be_applied_twice() {
        let scope = CancellationToken::new();
        let mut slot = RequestSlot::default();
        let ticket = slot.begin(&scope);
        assert!(slot.finish(&ticket));
        assert!(!slot.finish(&ticket));
    }

    #[test]
    fn cancelled_scope_cancels_pending_ticket() {
        let scope = CancellationToken::new();
        let mut slot = RequestSlot::default();
        let ticket = slot.begin(&scope);
        scope.cancel();
        assert!(ticket.token().is_cancelled());
        // Отмена области не делает билет чужим: исход Cancelled всё ещё его.
        assert!(slot.finish(&ticket));
    }

    #[derive(Deserialize)]
    struct Delay {
        ms: u64,
        n: u32,
    }

    #[tokio::test]
    async fn only_latest_query_is_applied() {
        let app = Router::new().route(
            "/api/contacts",
            get(|Query(delay): Query<Delay>| async move {
                tokio::time::sleep(Duration::from_millis(delay.ms)).await;
                Json(json!({"n": delay.n}))
            }),
        );
        let addr = spawn_server(app).await;
        let host = RecordingHost::new("x");
        let client = ApiClient::new(
            reqwest::Client::new(),
            format!("http://{}/api", addr),
            Credential::new("x"),
            host.clone(),
        );

        let scope = CancellationToken::new();
        let slot = Arc::new(Mutex::new(RequestSlot::default()));
        let applied = Arc::new(Mutex::new(Vec::new()));
        let outcomes = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for (n, ms) in [(1u32, 300u64), (2, 10)] {
            let ticket = slot.lock().unwrap().begin(&scope);
            let client = client.clone();
            let slot = slot.clone();
            let applied = applied.clone();
            let outcomes = outcomes.clone();
            handles.push(tokio::spawn(async move {
                let result = client
                    .request::<Value>(
                        Method::GET,
                        &format!("/contacts?ms={}&n={}", ms, n),
                        RequestOptions::new().cancel_with(Some(ticket.token())),
                    )
                    .await;
                outcomes.lock().unwrap().push((n, result.clone()));
                if slot.lock().unwrap().finish(&ticket)
                    && let Ok(Some(body)) = result
                {
                    applied.lock().unwrap().push(body["n"].as_u64().unwrap());
                }
            }));
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*applied.lock().unwrap(), vec![2]);
        let outcomes = outcomes.lock().unwrap();
        let first = outcomes.iter().find(|(n, _)| *n == 1).unwrap();
        assert_eq!(first.1, Err(ApiError::Cancelled));
    }
}
