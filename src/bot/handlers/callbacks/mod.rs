use super::shared::{HandlerResult, callback_chat_id, callback_prefix_filter, parse_confirm_payload};
use super::state::BotState;
use crate::bot::keyboards::{CONFIRM_PREFIX, UI_PREFIX};
use crate::console::{Action, SessionEvent};
use teloxide::dptree;
use teloxide::prelude::*;

pub fn handler() -> teloxide::dispatching::UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    Update::filter_callback_query()
        .branch(dptree::filter_map(callback_prefix_filter(CONFIRM_PREFIX)).endpoint(callback_confirm))
        .branch(dptree::filter_map(callback_prefix_filter(UI_PREFIX)).endpoint(callback_ui))
}

async fn callback_confirm(bot: Bot, q: CallbackQuery, state: BotState) -> HandlerResult {
    let data = q.data.as_deref().unwrap_or("");
    let (confirmation_id, answer) = match parse_confirm_payload(data, CONFIRM_PREFIX) {
        Ok(parsed) => parsed,
        Err(error) => {
            tracing::warn!(payload = data, error = %error, "Malformed confirm callback");
            bot.answer_callback_query(q.id.clone()).text("Кнопка устарела").await?;
            return Ok(());
        }
    };
    let Some(chat_id) = callback_chat_id(&q) else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let resolved = state
        .sessions
        .resolve_confirmation(chat_id, confirmation_id, answer)
        .await;
    tracing::info!(
        chat_id = chat_id.0,
        confirmation_id = confirmation_id,
        answer = answer,
        resolved = resolved,
        "Confirm callback received"
    );
    if resolved {
        bot.answer_callback_query(q.id.clone()).await?;
    } else {
        bot.answer_callback_query(q.id.clone())
            .text("Вопрос уже закрыт")
            .await?;
    }
    Ok(())
}

async fn callback_ui(bot: Bot, q: CallbackQuery, state: BotState) -> HandlerResult {
    let data = q.data.as_deref().unwrap_or("");
    let action = data.strip_prefix(UI_PREFIX).and_then(Action::decode);
    let (Some(action), Some(chat_id)) = (action, callback_chat_id(&q)) else {
        tracing::warn!(payload = data, "Unknown ui callback");
        bot.answer_callback_query(q.id.clone()).text("Кнопка устарела").await?;
        return Ok(());
    };

    tracing::debug!(chat_id = chat_id.0, action = ?action, "Ui callback received");
    // Ответ сразу: обработка события может ждать подтверждения администратора.
    if state
        .sessions
        .dispatch(chat_id, SessionEvent::Action(action))
        .await
    {
        bot.answer_callback_query(q.id.clone()).await?;
    } else {
        bot.answer_callback_query(q.id.clone())
            .text("Сессия завершена. Отправьте /start")
            .show_alert(true)
            .await?;
    }
    Ok(())
}
