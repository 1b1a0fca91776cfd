//! Тестовый хост и HTTP-заглушки.

use super::host::{BackButton, HostChrome};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub struct RecordingHost {
    init_data: Option<String>,
    back: BackButton,
    alerts: Mutex<Vec<String>>,
    confirms: Mutex<Vec<String>>,
    confirm_answer: AtomicBool,
    ready: AtomicUsize,
    closed: AtomicUsize,
}

impl RecordingHost {
    pub fn new(init_data: &str) -> Arc<Self> {
        Arc::new(Self {
            init_data: (!init_data.is_empty()).then(|| init_data.to_string()),
            back: BackButton::default(),
            alerts: Mutex::new(Vec::new()),
            confirms: Mutex::new(Vec::new()),
            confirm_answer: AtomicBool::new(true),
            ready: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
        })
    }

    pub fn answer_confirmations(&self, answer: bool) {
        self.confirm_answer.store(answer, Ordering::SeqCst);
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn confirmations(&self) -> Vec<String> {
        self.confirms.lock().unwrap().clone()
    }

    pub fn ready_count(&self) -> usize {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostChrome for RecordingHost {
    fn init_data(&self) -> Option<String> {
        self.init_data.clone()
    }

    fn ready(&self) {
        self.ready.fetch_add(1, Ordering::SeqCst);
    }

    fn expand(&self) {}

    fn back_button(&self) -> &BackButton {
        &self.back
    }

    async fn show_alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }

    async fn confirm(&self, message: &str) -> bool {
        self.confirms.lock().unwrap().push(message.to_string());
        self.confirm_answer.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

pub async fn spawn_server(app: axum::Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub async fn draft_store() -> (crate::drafts::DraftStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = crate::drafts::DraftStore::open(dir.path().join("drafts.sqlite"))
        .await
        .unwrap();
    (store, dir)
}
