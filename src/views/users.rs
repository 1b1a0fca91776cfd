use super::ViewContext;
use super::format::{format_timestamp, user_display_name};
use crate::api::{NewUser, User};
use crate::console::{Action, Button, RequestSlot, Screen};

/// Разбирает ответ вида `123456789 @username Имя`: ID обязателен,
/// username и имя необязательны.
pub fn parse_new_user(input: &str) -> Result<NewUser, &'static str> {
    let mut parts = input.split_whitespace();
    let telegram_id = parts
        .next()
        .and_then(|part| part.parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or("Укажите Telegram ID")?;

    let mut username = None;
    let mut name = Vec::new();
    for part in parts {
        match part.strip_prefix('@') {
            Some(handle) if username.is_none() && name.is_empty() && !handle.is_empty() => {
                username = Some(handle.to_string());
            }
            _ => name.push(part),
        }
    }
    Ok(NewUser {
        telegram_id,
        username,
        first_name: (!name.is_empty()).then(|| name.join(" ")),
    })
}

#[derive(Default)]
pub struct UsersView {
    users: Vec<User>,
    loaded: bool,
    awaiting_new_user: bool,
    slot: RequestSlot,
}

impl UsersView {
    pub async fn load(&mut self, ctx: &mut ViewContext<'_>) {
        let ticket = ctx.ticket(&mut self.slot);
        let result = ctx.client.list_users(Some(ticket.token())).await;
        if !self.slot.finish(&ticket) {
            return;
        }
        match result {
            Ok(users) => {
                self.users = users;
                self.loaded = true;
            }
            Err(e) => ctx.report(&e),
        }
    }

    pub async fn handle(&mut self, action: Action, ctx: &mut ViewContext<'_>) {
        self.awaiting_new_user = false;
        match action {
            Action::AddUser => self.awaiting_new_user = true,
            Action::RemoveUser(id) => self.remove(id, ctx).await,
            Action::Refresh => self.load(ctx).await,
            other => tracing::debug!(action = ?other, "Action ignored by users"),
        }
    }

    pub async fn handle_text(&mut self, text: &str, ctx: &mut ViewContext<'_>) {
        if !self.awaiting_new_user {
            ctx.toast("Нажмите «➕ Добавить», чтобы добавить пользователя");
            return;
        }
        let user = match parse_new_user(text) {
            Ok(user) => user,
            Err(hint) => {
                ctx.toast(hint);
                return;
            }
        };
        self.awaiting_new_user = false;
        match ctx.client.add_user(&user).await {
            Ok(added) => {
                tracing::info!(telegram_id = added.telegram_id, "User added to whitelist");
                ctx.toast("Пользователь добавлен");
                self.load(ctx).await;
            }
            Err(e) => ctx.report(&e),
        }
    }

    async fn remove(&mut self, id: i64, ctx: &mut ViewContext<'_>) {
        if !ctx.host.confirm("Удалить пользователя?").await {
            return;
        }
        match ctx.client.remove_user(id).await {
            Ok(()) => {
                tracing::info!(user_id = id, "User removed from whitelist");
                ctx.toast("Пользователь удалён");
                self.load(ctx).await;
            }
            Err(e) => ctx.report(&e),
        }
    }

    pub fn render(&self) -> Screen {
        let mut lines = vec!["👥 Пользователи".to_string()];
        if !self.loaded {
            lines.push(if self.slot.is_loading() {
                "Загрузка…".to_string()
            } else {
                "Не удалось загрузить пользователей.".to_string()
            });
        } else if self.users.is_empty() {
            lines.push("Список пуст".to_string());
        } else {
            lines.push(String::new());
            for user in &self.users {
                lines.push(format!(
                    "• {} (ID {}) · с {}",
                    user_display_name(user),
                    user.telegram_id,
                    format_timestamp(&user.created_at)
                ));
            }
        }
        if self.awaiting_new_user {
            lines.push(
                "\n➕ Отправьте Telegram ID, затем при желании @username и имя.\nНапример: 123456789 @anna Анна"
                    .to_string(),
            );
        }

        let mut screen = Screen::new(lines.join("\n"));
        for user in &self.users {
            screen.push_row(vec![Button::new(
                format!("🗑 {}", user_display_name(user)),
                Action::RemoveUser(user.id),
            )]);
        }
        screen.push_row(vec![
            Button::new("➕ Добавить", Action::AddUser),
            Button::new("🔄", Action::Refresh),
        ]);
        screen
    }
}
