//! Клавиатуры бота: экран консоли inline-кнопками и постоянное reply-меню.

use crate::console::{Action, Screen};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

pub const UI_PREFIX: &str = "ui:";
pub const CONFIRM_PREFIX: &str = "confirm:";

pub const BTN_MENU: &str = "🏠 Меню";
pub const BTN_CLOSE: &str = "⏹ Завершить";

const BACK_LABEL: &str = "← Назад";

pub fn admin_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(BTN_MENU),
        KeyboardButton::new(BTN_CLOSE),
    ]])
    .resize_keyboard()
    .persistent()
}

fn ui_button(label: &str, action: &Action) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, format!("{}{}", UI_PREFIX, action.encode()))
}

/// Кнопка «Назад» идёт последней строкой, пока хост её показывает.
pub fn screen_keyboard(screen: &Screen, show_back: bool) -> InlineKeyboardMarkup {
    let mut keyboard = InlineKeyboardMarkup::default();
    for row in &screen.rows {
        keyboard = keyboard.append_row(
            row.iter()
                .map(|button| ui_button(&button.label, &button.action))
                .collect::<Vec<_>>(),
        );
    }
    if show_back {
        keyboard = keyboard.append_row(vec![ui_button(BACK_LABEL, &Action::Back)]);
    }
    keyboard
}

pub fn confirm_buttons(confirmation_id: u64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::default().append_row(vec![
        InlineKeyboardButton::callback(
            "✅ Да",
            format!("{}{}:yes", CONFIRM_PREFIX, confirmation_id),
        ),
        InlineKeyboardButton::callback(
            "❌ Нет",
            format!("{}{}:no", CONFIRM_PREFIX, confirmation_id),
        ),
    ])
}
