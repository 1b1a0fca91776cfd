use crate::console::{Action, Button, Screen};

const ENTRIES: [(&str, &str); 4] = [
    ("📅 Мероприятия", "/events"),
    ("📚 Курсы", "/courses"),
    ("📨 Заявки", "/contacts"),
    ("👥 Пользователи", "/users"),
];

pub fn render() -> Screen {
    let mut screen = Screen::new("KomonBot\n\nПанель администратора. Выберите раздел:");
    screen.push_grid(
        ENTRIES
            .iter()
            .map(|(label, path)| Button::new(*label, Action::Navigate(path.to_string())))
            .collect(),
        2,
    );
    screen
}
