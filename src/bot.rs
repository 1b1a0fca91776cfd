//! Чат как хост консоли: экран-сообщение с inline-кнопками, подтверждения,
//! тосты и по одной сессии на администратора.

pub mod handlers;
mod host;
mod keyboards;
mod sessions;

pub use sessions::SessionRegistry;
