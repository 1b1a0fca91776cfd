//! Реестр сессий: одна на чат, каждая в своей задаче с очередью событий.

use super::handlers::BotState;
use super::host::ChatHost;
use super::keyboards;
use crate::api::{ApiClient, Credential};
use crate::console::{
    AuthState, EventQueue, HostChrome, ROOT, Session, SessionEvent, SessionSettings,
};
use crate::init_data::{WebAppUser, sign_init_data};
use std::collections::HashMap;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::User;
use tokio::sync::{Mutex, mpsc};

struct ConsoleHandle {
    events: mpsc::UnboundedSender<SessionEvent>,
    host: Arc<ChatHost>,
}

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<ChatId, ConsoleHandle>>>,
}

fn signed_init_data(state: &BotState, user: &User) -> Option<String> {
    let auth_date = chrono::Utc::now().timestamp();
    match sign_init_data(&state.bot_token, &WebAppUser::from(user), auth_date) {
        Ok(signed) => Some(signed),
        Err(error) => {
            tracing::warn!(user_id = user.id.0, error = %error, "Не удалось подписать initData");
            None
        }
    }
}

impl SessionRegistry {
    /// Открывает новую сессию для чата. Прежняя сессия чата закрывается.
    pub async fn open(&self, bot: &Bot, state: &BotState, chat_id: ChatId, user: &User) {
        let host = Arc::new(ChatHost::new(
            bot.clone(),
            chat_id,
            signed_init_data(state, user),
        ));
        let credential = Credential::new(host.init_data().unwrap_or_default());
        let client = ApiClient::new(
            state.http.clone(),
            state.config.api_base(),
            credential,
            host.clone(),
        );
        let settings = SessionSettings {
            list_limit: state.config.list_limit,
            contacts_page_size: state.config.contacts_page_size,
        };
        let session = Session::new(
            host.clone(),
            client,
            state.drafts.profile(user.id.0 as i64),
            settings,
            ROOT,
        );

        let (events, receiver) = mpsc::unbounded_channel();
        let previous = self.sessions.lock().await.insert(
            chat_id,
            ConsoleHandle {
                events,
                host: host.clone(),
            },
        );
        if let Some(previous) = previous {
            tracing::info!(chat_id = chat_id.0, "Replacing console session");
            previous.host.abandon();
        }
        tracing::info!(chat_id = chat_id.0, user_id = user.id.0, "Console session opened");
        tokio::spawn(run_session(session, host, receiver, self.clone()));
    }

    /// `false`, если у чата нет открытой сессии.
    pub async fn dispatch(&self, chat_id: ChatId, event: SessionEvent) -> bool {
        self.sessions
            .lock()
            .await
            .get(&chat_id)
            .is_some_and(|handle| handle.events.send(event).is_ok())
    }

    pub async fn resolve_confirmation(&self, chat_id: ChatId, confirmation_id: u64, answer: bool) -> bool {
        self.sessions
            .lock()
            .await
            .get(&chat_id)
            .is_some_and(|handle| handle.host.resolve_confirmation(confirmation_id, answer))
    }

    pub async fn close(&self, chat_id: ChatId) -> bool {
        let handle = self.sessions.lock().await.remove(&chat_id);
        match handle {
            Some(handle) => {
                handle.host.close().await;
                true
            }
            None => false,
        }
    }

    async fn forget(&self, chat_id: ChatId, host: &Arc<ChatHost>) {
        let mut sessions = self.sessions.lock().await;
        if sessions
            .get(&chat_id)
            .is_some_and(|handle| Arc::ptr_eq(&handle.host, host))
        {
            sessions.remove(&chat_id);
        }
    }
}

async fn present(host: &ChatHost, session: &mut Session, fresh: bool) {
    let screen = session.screen();
    let show_back =
        *session.auth_state() == AuthState::Allowed && host.back_button().is_visible();
    host.render(&screen.text, keyboards::screen_keyboard(&screen, show_back), fresh)
        .await;
    for toast in session.take_toasts() {
        host.toast(&toast).await;
    }
}

async fn run_session(
    mut session: Session,
    host: Arc<ChatHost>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    registry: SessionRegistry,
) {
    let chat_id = host.chat_id();
    let mut queue = EventQueue::new(events);
    queue.start(&mut session).await;
    if !host.is_closed() {
        present(&host, &mut session, true).await;
    }

    while !host.is_closed() {
        let Some(event) = queue.next().await else {
            break;
        };
        // Ответ текстом или фото уводит экран вверх: показываем его заново под ответом.
        let fresh = !matches!(event, SessionEvent::Action(_));
        queue.process(&mut session, event).await;
        tracing::debug!(chat_id = chat_id.0, route = %session.route().path, "Event handled");
        if host.is_closed() {
            break;
        }
        present(&host, &mut session, fresh).await;
    }

    registry.forget(chat_id, &host).await;
    tracing::info!(chat_id = chat_id.0, "Console session finished");
}
