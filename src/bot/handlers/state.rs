use crate::bot::SessionRegistry;
use crate::config::Config;
use crate::drafts::DraftStore;
use std::sync::Arc;
use teloxide::types::{Message, User};

#[derive(Clone)]
pub struct BotState {
    pub config: Arc<Config>,
    pub bot_token: Arc<str>,
    pub drafts: DraftStore,
    pub http: reqwest::Client,
    pub sessions: SessionRegistry,
}

pub fn sender(msg: &Message) -> Option<&User> {
    msg.from.as_ref()
}

pub fn sender_user_id(msg: &Message) -> Option<i64> {
    sender(msg).map(|user| user.id.0 as i64)
}

/// Консоль живёт только в личном чате с ботом.
pub fn is_private_chat(msg: &Message) -> bool {
    msg.chat.is_private()
}
