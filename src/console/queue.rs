//! Очередь событий сессии. Пока событие обрабатывается, очередь продолжает
//! принимать новые: событие, вытесняющее загрузки, отменяет их сразу, не
//! дожидаясь ответа сервера, и обрабатывается следующим.

use super::session::{Session, SessionEvent};
use std::collections::VecDeque;
use std::future::Future;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub struct EventQueue {
    events: mpsc::UnboundedReceiver<SessionEvent>,
    backlog: VecDeque<SessionEvent>,
    open: bool,
}

impl EventQueue {
    pub fn new(events: mpsc::UnboundedReceiver<SessionEvent>) -> Self {
        Self {
            events,
            backlog: VecDeque::new(),
            open: true,
        }
    }

    /// Следующее событие по порядку поступления; `None`, когда отправители
    /// закрыты и очередь разобрана.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        if let Some(event) = self.backlog.pop_front() {
            return Some(event);
        }
        if !self.open {
            return None;
        }
        let event = self.events.recv().await;
        self.open = event.is_some();
        event
    }

    pub async fn start(&mut self, session: &mut Session) {
        let scope = session.load_scope();
        self.drive(session.start(), &scope).await;
    }

    pub async fn process(&mut self, session: &mut Session, event: SessionEvent) {
        let scope = session.load_scope();
        if self.backlog.iter().any(SessionEvent::supersedes_loads) {
            scope.cancel();
        }
        self.drive(session.handle(event), &scope).await;
    }

    async fn drive(&mut self, handling: impl Future<Output = ()>, scope: &CancellationToken) {
        tokio::pin!(handling);
        loop {
            tokio::select! {
                biased;
                () = &mut handling => return,
                next = self.events.recv(), if self.open => match next {
                    Some(event) => {
                        if event.supersedes_loads() && !scope.is_cancelled() {
                            tracing::debug!(event = ?event, "Pending loads superseded");
                            scope.cancel();
                        }
                        self.backlog.push_back(event);
                    }
                    None => self.open = false,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, Credential};
    use crate::console::testing::{RecordingHost, draft_store, spawn_server};
    use crate::console::{Action, SessionSettings};
    use axum::extract::RawQuery;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    const SETTINGS: SessionSettings = SessionSettings {
        list_limit: 50,
        contacts_page_size: 20,
    };

    /// Черновики отдаются с задержкой, остальные вкладки сразу.
    fn slow_drafts_api(completed: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route("/api/users", get(|| async { Json(json!([])) }))
            .route(
                "/api/events",
                get(move |RawQuery(query): RawQuery| {
                    let completed = completed.clone();
                    async move {
                        if query.unwrap_or_default().contains("status=draft") {
                            tokio::time::sleep(Duration::from_millis(1500)).await;
                        }
                        completed.fetch_add(1, Ordering::SeqCst);
                        Json(json!({"items": [], "total": 0}))
                    }
                }),
            )
    }

    #[tokio::test]
    async fn back_cancels_slow_tab_load_instead_of_waiting_for_it() {
        let completed = Arc::new(AtomicUsize::new(0));
        let addr = spawn_server(slow_drafts_api(completed.clone())).await;
        let (store, _dir) = draft_store().await;
        let host = RecordingHost::new("signed");
        let client = ApiClient::new(
            reqwest::Client::new(),
            format!("http://{}/api", addr),
            Credential::new("signed"),
            host.clone(),
        );
        let mut session = Session::new(host.clone(), client, store.profile(1), SETTINGS, "/events");

        let (sender, receiver) = mpsc::unbounded_channel();
        let mut queue = EventQueue::new(receiver);
        queue.start(&mut session).await;
        assert_eq!(completed.load(Ordering::SeqCst), 1);

        sender.send(SessionEvent::Action(Action::Tab(1))).unwrap();
        let late = sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            late.send(SessionEvent::Action(Action::Back)).unwrap();
        });

        let started = Instant::now();
        let tab = queue.next().await.unwrap();
        queue.process(&mut session, tab).await;
        let back = queue.next().await.unwrap();
        assert!(matches!(back, SessionEvent::Action(Action::Back)));
        queue.process(&mut session, back).await;

        assert!(started.elapsed() < Duration::from_millis(1000));
        assert!(session.route().is_root());
        assert!(session.take_toasts().is_empty());
        // Сервер ещё не ответил на загрузку черновиков, а переход уже применён.
        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn events_that_keep_the_view_do_not_cancel_loads() {
        let completed = Arc::new(AtomicUsize::new(0));
        let addr = spawn_server(slow_drafts_api(completed.clone())).await;
        let (store, _dir) = draft_store().await;
        let host = RecordingHost::new("signed");
        let client = ApiClient::new(
            reqwest::Client::new(),
            format!("http://{}/api", addr),
            Credential::new("signed"),
            host.clone(),
        );
        let mut session = Session::new(host.clone(), client, store.profile(1), SETTINGS, "/events");

        let (sender, receiver) = mpsc::unbounded_channel();
        let mut queue = EventQueue::new(receiver);
        queue.start(&mut session).await;

        sender.send(SessionEvent::Action(Action::Tab(1))).unwrap();
        sender.send(SessionEvent::Action(Action::Search)).unwrap();
        let tab = queue.next().await.unwrap();
        queue.process(&mut session, tab).await;

        assert_eq!(completed.load(Ordering::SeqCst), 2);
        assert!(session.screen().text.contains("Ничего не найдено"));
        let search = queue.next().await.unwrap();
        assert!(matches!(search, SessionEvent::Action(Action::Search)));
    }

    #[tokio::test]
    async fn closed_senders_drain_backlog_then_end() {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut queue = EventQueue::new(receiver);
        sender.send(SessionEvent::Text("a".to_string())).unwrap();
        drop(sender);
        assert!(matches!(queue.next().await, Some(SessionEvent::Text(_))));
        assert!(queue.next().await.is_none());
        assert!(queue.next().await.is_none());
    }
}
