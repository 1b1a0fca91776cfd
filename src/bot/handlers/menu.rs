use super::commands::{cmd_close, cmd_menu, reply_no_session};
use super::shared::HandlerResult;
use super::state::{BotState, sender_user_id};
use crate::api::Upload;
use crate::console::SessionEvent;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::FileId;

const IMAGE_FALLBACK_MIME: &str = "image/jpeg";

/// Кнопки reply-меню, текстовые ответы и картинки для консоли.
pub async fn handle_menu_buttons(bot: Bot, msg: Message, state: BotState) -> HandlerResult {
    let Some(user_id) = sender_user_id(&msg) else {
        return Ok(());
    };

    if let Some(text) = msg.text().map(str::to_owned) {
        match text.as_str() {
            crate::bot::keyboards::BTN_MENU => cmd_menu(bot, msg, state).await?,
            crate::bot::keyboards::BTN_CLOSE => cmd_close(bot, msg, state).await?,
            _ if text.starts_with('/') => {
                bot.send_message(msg.chat.id, "Не понял команду. Список команд: /help")
                    .reply_markup(crate::bot::keyboards::admin_menu())
                    .await?;
            }
            _ => {
                let event = SessionEvent::Text(text);
                if !state.sessions.dispatch(msg.chat.id, event).await {
                    reply_no_session(&bot, msg.chat.id).await?;
                }
            }
        }
        return Ok(());
    }

    let Some(upload) = incoming_image(&bot, &msg).await? else {
        return Ok(());
    };
    tracing::info!(
        user_id = user_id,
        file_name = %upload.file_name,
        size = upload.bytes.len(),
        "Image received"
    );
    if !state
        .sessions
        .dispatch(msg.chat.id, SessionEvent::Upload(upload))
        .await
    {
        reply_no_session(&bot, msg.chat.id).await?;
    }
    Ok(())
}

/// Фото (берётся самый крупный размер) или документ с image/* MIME.
async fn incoming_image(bot: &Bot, msg: &Message) -> Result<Option<Upload>, anyhow::Error> {
    if let Some(largest) = msg.photo().and_then(|sizes| sizes.last()) {
        let bytes = download(bot, &largest.file.id).await?;
        return Ok(Some(Upload {
            file_name: format!("{}.jpg", largest.file.unique_id.0),
            mime: IMAGE_FALLBACK_MIME.to_string(),
            bytes,
        }));
    }

    if let Some(document) = msg.document() {
        let mime = document.mime_type.as_ref().map(|mime| mime.to_string());
        if !mime.as_deref().is_some_and(|mime| mime.starts_with("image/")) {
            bot.send_message(msg.chat.id, "Нужна картинка: отправьте фото или файл изображения.")
                .await?;
            return Ok(None);
        }
        let bytes = download(bot, &document.file.id).await?;
        return Ok(Some(Upload {
            file_name: document
                .file_name
                .clone()
                .unwrap_or_else(|| format!("{}.jpg", document.file.unique_id.0)),
            mime: mime.unwrap_or_else(|| IMAGE_FALLBACK_MIME.to_string()),
            bytes,
        }));
    }

    Ok(None)
}

async fn download(bot: &Bot, file_id: &FileId) -> Result<Vec<u8>, anyhow::Error> {
    let file = bot.get_file(file_id.clone()).await?;
    let mut bytes = Vec::with_capacity(file.size as usize);
    bot.download_file(&file.path, &mut bytes).await?;
    Ok(bytes)
}
