use super::keyboards;
use crate::console::{BackButton, HostChrome};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId};
use tokio::sync::oneshot;

const TOAST_TTL: Duration = Duration::from_secs(3);

/// Идентификаторы подтверждений уникальны на весь процесс: кнопка из
/// прошлой сессии не ответит на вопрос новой.
static NEXT_CONFIRMATION: AtomicU64 = AtomicU64::new(1);

pub struct ChatHost {
    bot: Bot,
    chat_id: ChatId,
    init_data: Option<String>,
    back: BackButton,
    screen_message: Mutex<Option<MessageId>>,
    confirmations: Mutex<HashMap<u64, oneshot::Sender<bool>>>,
    closed: AtomicBool,
}

impl ChatHost {
    pub fn new(bot: Bot, chat_id: ChatId, init_data: Option<String>) -> Self {
        Self {
            bot,
            chat_id,
            init_data,
            back: BackButton::default(),
            screen_message: Mutex::new(None),
            confirmations: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn lock_confirmations(&self) -> MutexGuard<'_, HashMap<u64, oneshot::Sender<bool>>> {
        self.confirmations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn screen_message(&self) -> Option<MessageId> {
        *self
            .screen_message
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn set_screen_message(&self, message_id: Option<MessageId>) {
        *self
            .screen_message
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = message_id;
    }

    /// Ответ на подтверждение приходит мимо очереди сессии.
    pub fn resolve_confirmation(&self, confirmation_id: u64, answer: bool) -> bool {
        match self.lock_confirmations().remove(&confirmation_id) {
            Some(sender) => sender.send(answer).is_ok(),
            None => false,
        }
    }

    /// Сессия заменена или закрыта: ожидающие подтверждения получают «нет».
    pub fn abandon(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.lock_confirmations().clear();
    }

    /// Показывает экран. При `fresh` отправляет новым сообщением под ответом
    /// администратора, иначе редактирует текущее.
    pub async fn render(&self, text: &str, keyboard: InlineKeyboardMarkup, fresh: bool) {
        let current = self.screen_message();
        if let Some(message_id) = current
            && !fresh
        {
            match self
                .bot
                .edit_message_text(self.chat_id, message_id, text)
                .reply_markup(keyboard.clone())
                .await
            {
                Ok(_) | Err(teloxide::RequestError::Api(teloxide::ApiError::MessageNotModified)) => {
                    return;
                }
                Err(error) => {
                    tracing::debug!(
                        chat_id = self.chat_id.0,
                        error = %error,
                        "Screen edit failed, sending a new message"
                    );
                }
            }
        }

        if let Some(message_id) = current
            && let Err(error) = self
                .bot
                .edit_message_reply_markup(self.chat_id, message_id)
                .await
        {
            tracing::debug!(chat_id = self.chat_id.0, error = %error, "Stale screen keeps its buttons");
        }

        match self
            .bot
            .send_message(self.chat_id, text)
            .reply_markup(keyboard)
            .await
        {
            Ok(message) => self.set_screen_message(Some(message.id)),
            Err(error) => {
                tracing::warn!(chat_id = self.chat_id.0, error = %error, "Не удалось отправить экран консоли");
            }
        }
    }

    /// Короткое уведомление, которое само удаляется.
    pub async fn toast(&self, text: &str) {
        let message = match self
            .bot
            .send_message(self.chat_id, format!("ℹ️ {}", text))
            .await
        {
            Ok(message) => message,
            Err(error) => {
                tracing::warn!(chat_id = self.chat_id.0, error = %error, "Не удалось отправить уведомление");
                return;
            }
        };
        let bot = self.bot.clone();
        let chat_id = self.chat_id;
        tokio::spawn(async move {
            tokio::time::sleep(TOAST_TTL).await;
            if let Err(error) = bot.delete_message(chat_id, message.id).await {
                tracing::debug!(chat_id = chat_id.0, error = %error, "Toast already gone");
            }
        });
    }
}

#[async_trait]
impl HostChrome for ChatHost {
    fn init_data(&self) -> Option<String> {
        self.init_data.clone()
    }

    fn ready(&self) {
        tracing::info!(chat_id = self.chat_id.0, "Console ready");
    }

    fn expand(&self) {
        // Чат всегда развёрнут.
    }

    fn back_button(&self) -> &BackButton {
        &self.back
    }

    async fn show_alert(&self, message: &str) {
        if let Err(error) = self
            .bot
            .send_message(self.chat_id, format!("⚠️ {}", message))
            .await
        {
            tracing::warn!(chat_id = self.chat_id.0, error = %error, "Не удалось показать предупреждение");
        }
    }

    async fn confirm(&self, message: &str) -> bool {
        if self.is_closed() {
            return false;
        }
        let confirmation_id = NEXT_CONFIRMATION.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();
        self.lock_confirmations().insert(confirmation_id, sender);

        let question = match self
            .bot
            .send_message(self.chat_id, format!("❓ {}", message))
            .reply_markup(keyboards::confirm_buttons(confirmation_id))
            .await
        {
            Ok(question) => question,
            Err(error) => {
                tracing::warn!(chat_id = self.chat_id.0, error = %error, "Не удалось задать вопрос");
                self.lock_confirmations().remove(&confirmation_id);
                return false;
            }
        };

        let answer = receiver.await.unwrap_or(false);
        let verdict = if answer { "✅ Да" } else { "❌ Нет" };
        if let Err(error) = self
            .bot
            .edit_message_text(self.chat_id, question.id, format!("{} {}", message, verdict))
            .await
        {
            tracing::debug!(chat_id = self.chat_id.0, error = %error, "Confirmation message not updated");
        }
        answer
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.lock_confirmations().clear();
        if let Some(message_id) = self.screen_message()
            && let Err(error) = self
                .bot
                .edit_message_reply_markup(self.chat_id, message_id)
                .await
        {
            tracing::debug!(chat_id = self.chat_id.0, error = %error, "Screen buttons not removed");
        }
        if let Err(error) = self
            .bot
            .send_message(
                self.chat_id,
                "Сессия завершена. Отправьте /start, чтобы открыть консоль снова.",
            )
            .await
        {
            tracing::warn!(chat_id = self.chat_id.0, error = %error, "Не удалось сообщить о завершении сессии");
        }
        tracing::info!(chat_id = self.chat_id.0, "Console closed");
    }
}
