//! Обработчики команд, кнопок и ответов администратора.

#[path = "handlers/callbacks/mod.rs"]
mod callbacks;
#[path = "handlers/commands/mod.rs"]
mod commands;
#[path = "handlers/format.rs"]
mod format;
#[path = "handlers/menu.rs"]
mod menu;
#[path = "handlers/shared.rs"]
mod shared;
#[path = "handlers/state.rs"]
mod state;

pub use state::BotState;

use teloxide::dispatching::UpdateHandler;
use teloxide::dptree;
use teloxide::prelude::*;

type DispatchError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Сообщения из групп и от ботов консоль не видит; команды там отвечают сами.
fn console_message(msg: Message) -> bool {
    msg.chat.is_private() && msg.from.as_ref().is_some_and(|user| !user.is_bot)
}

fn messages() -> UpdateHandler<DispatchError> {
    Update::filter_message()
        .branch(commands::handler())
        .branch(dptree::filter(console_message).endpoint(menu::handle_menu_buttons))
}

pub fn schema() -> UpdateHandler<DispatchError> {
    dptree::entry()
        .branch(callbacks::handler())
        .branch(messages())
}
