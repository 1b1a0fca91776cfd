use super::host::{BackSubscription, HostChrome};
use super::route::{Location, Route, back_target, parse_route};
use std::sync::Arc;

/// Владелец текущего маршрута и единственный, кто пишет обработчик «Назад».
pub struct NavigationController {
    location: Location,
    route: Route,
    host: Arc<dyn HostChrome>,
    back_subscription: Option<BackSubscription>,
}

impl NavigationController {
    pub fn start(location: Location, host: Arc<dyn HostChrome>) -> Self {
        let route = parse_route(&location.fragment());
        let mut controller = Self {
            location,
            route,
            host,
            back_subscription: None,
        };
        controller.bind_back_button();
        controller
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn navigate(&self, path: &str) {
        tracing::debug!(from = %self.route.path, to = %path, "Navigate");
        self.location.navigate(path);
    }

    /// Пересчитывает маршрут и перепривязывает «Назад» синхронно, до
    /// обработки следующего уведомления.
    pub fn on_location_change(&mut self) {
        self.route = parse_route(&self.location.fragment());
        self.bind_back_button();
    }

    /// Обрабатывает одно уведомление из очереди. `false`, если очередь пуста.
    pub fn process_next(&mut self) -> bool {
        if !self.location.take_notification() {
            return false;
        }
        self.on_location_change();
        true
    }

    fn bind_back_button(&mut self) {
        let back = self.host.back_button();
        if let Some(subscription) = self.back_subscription.take() {
            back.off_click(subscription);
        }
        if self.route.is_root() {
            back.hide();
            return;
        }

        let location = self.location.clone();
        let segments = self.route.segments.clone();
        back.show();
        self.back_subscription = Some(back.on_click(Arc::new(move || {
            location.navigate(&back_target(&segments));
        })));
    }
}

impl Drop for NavigationController {
    fn drop(&mut self) {
        if let Some(subscription) = self.back_subscription.take() {
            self.host.back_button().off_click(subscription);
        }
    }
}
