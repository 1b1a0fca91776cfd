use anyhow::anyhow;
use teloxide::prelude::*;

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub fn callback_prefix_filter(prefix: &'static str) -> impl Fn(CallbackQuery) -> Option<CallbackQuery> {
    move |q: CallbackQuery| {
        if q.data.as_deref().is_some_and(|payload| payload.starts_with(prefix)) {
            Some(q)
        } else {
            None
        }
    }
}

pub fn callback_chat_id(q: &CallbackQuery) -> Option<ChatId> {
    q.message.as_ref().map(|msg| msg.chat().id)
}

/// `confirm:<id>:yes|no` → (id, ответ).
pub fn parse_confirm_payload(data: &str, prefix: &str) -> Result<(u64, bool), anyhow::Error> {
    let payload = data
        .strip_prefix(prefix)
        .ok_or_else(|| anyhow!("Некорректный callback payload"))?;
    let (id, answer) = payload
        .split_once(':')
        .ok_or_else(|| anyhow!("Не указан ответ"))?;
    let id = id
        .parse::<u64>()
        .map_err(|_| anyhow!("Некорректный confirmation_id"))?;
    match answer {
        "yes" => Ok((id, true)),
        "no" => Ok((id, false)),
        _ => Err(anyhow!("Некорректный ответ")),
    }
}
