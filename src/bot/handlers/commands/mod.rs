use super::format::{help_text, welcome_text};
use super::shared::HandlerResult;
use super::state::{BotState, is_private_chat, sender};
use crate::console::{Action, ROOT, SessionEvent};
use teloxide::dptree;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum BotCommand {
    #[command(description = "Открыть консоль")]
    Start,
    #[command(description = "Главный экран")]
    Menu,
    #[command(description = "Завершить сессию")]
    Close,
    #[command(description = "Справка")]
    Help,
}

pub fn handler() -> teloxide::dispatching::UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    teloxide::filter_command::<BotCommand, _>()
        .branch(dptree::case![BotCommand::Start].endpoint(start_cmd))
        .branch(dptree::case![BotCommand::Menu].endpoint(cmd_menu))
        .branch(dptree::case![BotCommand::Close].endpoint(cmd_close))
        .branch(dptree::case![BotCommand::Help].endpoint(cmd_help))
}

pub async fn cmd_help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, help_text())
        .reply_markup(crate::bot::keyboards::admin_menu())
        .await?;
    Ok(())
}

async fn start_cmd(bot: Bot, msg: Message, state: BotState) -> HandlerResult {
    let Some(user) = sender(&msg) else {
        tracing::warn!("Received /start without sender");
        return Ok(());
    };
    if !is_private_chat(&msg) {
        bot.send_message(msg.chat.id, "Консоль открывается только в личном чате с ботом.")
            .await?;
        return Ok(());
    }
    tracing::info!(
        user_id = user.id.0,
        username = ?user.username,
        "Received /start command"
    );

    bot.send_message(msg.chat.id, welcome_text(&user.first_name))
        .reply_markup(crate::bot::keyboards::admin_menu())
        .await?;
    state.sessions.open(&bot, &state, msg.chat.id, user).await;
    Ok(())
}

pub async fn cmd_menu(bot: Bot, msg: Message, state: BotState) -> HandlerResult {
    let event = SessionEvent::Action(Action::Navigate(ROOT.to_string()));
    if !state.sessions.dispatch(msg.chat.id, event).await {
        reply_no_session(&bot, msg.chat.id).await?;
    }
    Ok(())
}

pub async fn cmd_close(bot: Bot, msg: Message, state: BotState) -> HandlerResult {
    if !state.sessions.close(msg.chat.id).await {
        reply_no_session(&bot, msg.chat.id).await?;
    }
    Ok(())
}

pub async fn reply_no_session(bot: &Bot, chat_id: ChatId) -> HandlerResult {
    bot.send_message(chat_id, "Консоль не открыта. Отправьте /start.")
        .reply_markup(crate::bot::keyboards::admin_menu())
        .await?;
    Ok(())
}
