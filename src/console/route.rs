//! Модель маршрута: фрагмент адреса → упорядоченный список сегментов.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const ROOT: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub segments: Vec<String>,
}

impl Route {
    pub fn is_root(&self) -> bool {
        self.path == ROOT
    }
}

/// Чистая и тотальная функция: пустой фрагмент означает корень.
pub fn parse_route(fragment: &str) -> Route {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    let path = if fragment.is_empty() { ROOT } else { fragment };
    Route {
        path: path.to_string(),
        segments: path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Куда ведёт «Назад». Форма и карточка (`/x/new`, `/x/42`) считаются
/// соседями списка `/x`, а не вложенным уровнем.
pub fn back_target(segments: &[String]) -> String {
    match segments {
        [] | [_] => ROOT.to_string(),
        [first, second] if second == "new" || is_numeric(second) => format!("/{}", first),
        _ => format!("/{}", segments[..segments.len() - 1].join("/")),
    }
}

#[derive(Debug, Default)]
struct LocationState {
    fragment: String,
    notifications: VecDeque<()>,
}

/// Фрагмент адреса сессии. `navigate` только пишет фрагмент и ставит
/// уведомление в очередь; маршрут применяется, когда уведомление обработано.
#[derive(Debug, Clone, Default)]
pub struct Location {
    state: Arc<Mutex<LocationState>>,
}

impl Location {
    pub fn new(fragment: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(LocationState {
                fragment: fragment.into(),
                notifications: VecDeque::new(),
            })),
        }
    }

    pub fn fragment(&self) -> String {
        self.lock().fragment.clone()
    }

    /// Как `location.hash = path`: без изменения фрагмента уведомления нет.
    pub fn navigate(&self, path: &str) {
        let mut state = self.lock();
        if state.fragment == path {
            return;
        }
        state.fragment = path.to_string();
        state.notifications.push_back(());
    }

    /// Забирает очередное уведомление о смене адреса, в порядке поступления.
    pub fn take_notification(&self) -> bool {
        self.lock().notifications.pop_front().is_some()
    }

    #[cfg(test)]
    pub fn has_pending(&self) -> bool {
        !self.lock().notifications.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, LocationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|part| part.to_string()).collect()
    }

    #[test]
    fn empty_fragment_is_root() {
        let route = parse_route("");
        assert_eq!(route.path, "/");
        assert!(route.segments.is_empty());
        assert!(route.is_root());
        assert_eq!(parse_route("#"), route);
    }

    #[test]
    fn keeps_raw_path_and_drops_empty_segments() {
        let route = parse_route("#//events///42/");
        assert_eq!(route.path, "//events///42/");
        assert_eq!(route.segments, segments(&["events", "42"]));
        assert!(!route.is_root());
    }

    #[test]
    fn back_target_rules() {
        assert_eq!(back_target(&[]), "/");
        assert_eq!(back_target(&segments(&["events"])), "/");
        assert_eq!(back_target(&segments(&["events", "new"])), "/events");
        assert_eq!(back_target(&segments(&["events", "42"])), "/events");
        assert_eq!(back_target(&segments(&["events", "42", "sub"])), "/events/42");
    }

    // Третий уровень под "new"/id возвращает на два сегмента, а не в список.
    #[test]
    fn back_target_for_deeper_routes_drops_only_last_segment() {
        assert_eq!(back_target(&segments(&["events", "new", "photo"])), "/events/new");
        assert_eq!(back_target(&segments(&["events", "archive"])), "/events");
        assert_eq!(back_target(&segments(&["a", "b", "c", "d"])), "/a/b/c");
    }

    #[test]
    fn mixed_alphanumeric_second_segment_is_not_an_id() {
        assert_eq!(back_target(&segments(&["events", "42a"])), "/events");
        assert_eq!(back_target(&segments(&["events", "42a", "x"])), "/events/42a");
    }

    #[test]
    fn navigate_queues_one_notification_per_change() {
        let location = Location::new("/");
        location.navigate("/events");
        location.navigate("/events");
        location.navigate("/events/new");
        assert_eq!(location.fragment(), "/events/new");
        assert!(location.take_notification());
        assert!(location.take_notification());
        assert!(!location.take_notification());
    }
}
