use crate::api::User;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Метка времени API (`2025-01-01T10:00:00` или RFC 3339) в локальном виде.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Local).format("%d.%m.%Y %H:%M").to_string();
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|dt| dt.format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

pub fn format_date(raw: &str) -> String {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Дата от администратора: `2025-03-08` или `08.03.2025`. Возвращает ISO.
pub fn parse_date_input(input: &str) -> Option<String> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(input, "%d.%m.%Y"))
        .ok()
        .map(|date| date.format("%Y-%m-%d").to_string())
}

/// Время в формате `HH:MM`; секунды отбрасываются.
pub fn parse_time_input(input: &str) -> Option<String> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M:%S"))
        .ok()
        .map(|time| time.format("%H:%M").to_string())
}

pub fn user_display_name(user: &User) -> String {
    let full_name = [user.first_name.as_deref(), user.last_name.as_deref()]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if !full_name.is_empty() {
        return full_name;
    }
    user.username
        .as_ref()
        .map(|username| format!("@{}", username))
        .unwrap_or_else(|| format!("tg_{}", user.telegram_id))
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    short.push('…');
    short
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_input_accepts_iso_and_russian_order() {
        assert_eq!(parse_date_input("2025-03-08").as_deref(), Some("2025-03-08"));
        assert_eq!(parse_date_input(" 08.03.2025 ").as_deref(), Some("2025-03-08"));
        assert_eq!(parse_date_input("31.02.2025"), None);
    }

    #[test]
    fn time_input_is_normalized_to_minutes() {
        assert_eq!(parse_time_input("9:05").as_deref(), Some("09:05"));
        assert_eq!(parse_time_input("19:30:00").as_deref(), Some("19:30"));
        assert_eq!(parse_time_input("25:00"), None);
    }

    #[test]
    fn naive_timestamp_is_reformatted() {
        assert_eq!(format_timestamp("2025-01-02T10:05:00"), "02.01.2025 10:05");
        assert_eq!(format_timestamp("вчера"), "вчера");
        assert_eq!(format_date("2025-01-02"), "02.01.2025");
    }

    #[test]
    fn display_name_falls_back_to_username_then_id() {
        let mut user = User {
            id: 1,
            telegram_id: 42,
            username: Some("anna".to_string()),
            first_name: None,
            last_name: None,
            created_at: String::new(),
        };
        assert_eq!(user_display_name(&user), "@anna");
        user.username = None;
        assert_eq!(user_display_name(&user), "tg_42");
        user.first_name = Some("Анна".to_string());
        assert_eq!(user_display_name(&user), "Анна");
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("коротко", 10), "коротко");
        assert_eq!(truncate("очень длинный текст", 6), "очень…");
    }
}
