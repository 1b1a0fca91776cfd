pub fn help_text() -> &'static str {
    r#"Консоль KomonBot: мероприятия, курсы, заявки и доступ администраторов.

/start — открыть консоль (предыдущая сессия в этом чате закрывается)
/menu — вернуться на главный экран
/close — завершить сессию
/help — эта справка

Экран консоли — одно сообщение с кнопками, оно обновляется на месте.
Когда консоль просит ввести значение, просто отправьте его сообщением.
Картинку для мероприятия или курса отправьте фотографией или файлом.
Чтобы очистить необязательное поле, отправьте «-»."#
}

pub fn welcome_text(first_name: &str) -> String {
    if first_name.trim().is_empty() {
        "Открываю консоль KomonBot…".to_string()
    } else {
        format!("{}, открываю консоль KomonBot…", first_name.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::welcome_text;

    #[test]
    fn welcome_uses_name_when_present() {
        assert_eq!(welcome_text(" Анна "), "Анна, открываю консоль KomonBot…");
        assert_eq!(welcome_text(""), "Открываю консоль KomonBot…");
    }
}
