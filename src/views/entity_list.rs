use super::ViewContext;
use super::format::{format_date, truncate};
use crate::api::{Course, EntityKind, EntityQuery, EntityStatus, Event};
use crate::console::{Action, Button, RequestSlot, Screen};

const TABS: [(Option<EntityStatus>, &str); 5] = [
    (None, "Все"),
    (Some(EntityStatus::Draft), "Черновики"),
    (Some(EntityStatus::Published), "Опубликованные"),
    (Some(EntityStatus::Cancelled), "Отменённые"),
    (Some(EntityStatus::Archived), "Архив"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct ListItem {
    id: i64,
    title: String,
    status: EntityStatus,
    details: String,
}

impl From<Event> for ListItem {
    fn from(event: Event) -> Self {
        let when = [
            event.event_date.as_deref().map(format_date),
            event
                .event_time
                .as_deref()
                .map(|time| time.chars().take(5).collect()),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
        let details = [when, event.location]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" · ");
        Self {
            id: event.id,
            title: event.title,
            status: event.status,
            details,
        }
    }
}

impl From<Course> for ListItem {
    fn from(course: Course) -> Self {
        let price = format!("{} {}", course.cost, course.currency);
        let details = [price, course.schedule]
            .into_iter()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" · ");
        Self {
            id: course.id,
            title: course.title,
            status: course.status,
            details,
        }
    }
}

pub struct EntityListView {
    kind: EntityKind,
    limit: u32,
    tab: usize,
    search: String,
    awaiting_search: bool,
    items: Vec<ListItem>,
    total: i64,
    loaded: bool,
    slot: RequestSlot,
}

impl EntityListView {
    pub fn new(kind: EntityKind, limit: u32) -> Self {
        Self {
            kind,
            limit,
            tab: 0,
            search: String::new(),
            awaiting_search: false,
            items: Vec::new(),
            total: 0,
            loaded: false,
            slot: RequestSlot::default(),
        }
    }

    fn query(&self) -> EntityQuery {
        EntityQuery {
            status: TABS[self.tab].0,
            search: self.search.clone(),
            limit: self.limit,
        }
    }

    /// Каждая смена вкладки или поиска вытесняет предыдущую загрузку.
    pub async fn load(&mut self, ctx: &mut ViewContext<'_>) {
        let query = self.query();
        let ticket = ctx.ticket(&mut self.slot);
        let result = match self.kind {
            EntityKind::Event => ctx
                .client
                .list_events(&query, Some(ticket.token()))
                .await
                .map(|page| (page.items.into_iter().map(ListItem::from).collect(), page.total)),
            EntityKind::Course => ctx
                .client
                .list_courses(&query, Some(ticket.token()))
                .await
                .map(|page| (page.items.into_iter().map(ListItem::from).collect(), page.total)),
        };
        if !self.slot.finish(&ticket) {
            return;
        }
        match result {
            Ok((items, total)) => {
                self.items = items;
                self.total = total;
                self.loaded = true;
            }
            Err(e) => ctx.report(&e),
        }
    }

    pub async fn handle(&mut self, action: Action, ctx: &mut ViewContext<'_>) {
        self.awaiting_search = false;
        match action {
            Action::Tab(index) if index < TABS.len() => {
                if index != self.tab {
                    self.tab = index;
                    self.load(ctx).await;
                }
            }
            Action::Search => self.awaiting_search = true,
            Action::ClearSearch => {
                if !self.search.is_empty() {
                    self.search.clear();
                    self.load(ctx).await;
                }
            }
            Action::Refresh => self.load(ctx).await,
            other => tracing::debug!(action = ?other, "Action ignored by list"),
        }
    }

    pub async fn handle_text(&mut self, text: &str, ctx: &mut ViewContext<'_>) {
        if !self.awaiting_search {
            ctx.toast("Нажмите «🔍 Поиск», чтобы искать по названию");
            return;
        }
        self.awaiting_search = false;
        self.search = text.trim().to_string();
        self.load(ctx).await;
    }

    pub fn render(&self) -> Screen {
        let heading = match self.kind {
            EntityKind::Event => "📅 Мероприятия",
            EntityKind::Course => "📚 Курсы",
        };
        let mut lines = vec![heading.to_string()];
        if !self.search.is_empty() {
            lines.push(format!("Поиск: «{}»", self.search));
        }
        if !self.loaded {
            lines.push(if self.slot.is_loading() {
                "Загрузка…".to_string()
            } else {
                "Не удалось загрузить список.".to_string()
            });
        } else if self.items.is_empty() {
            lines.push("Ничего не найдено".to_string());
        } else {
            lines.push(format!("Найдено: {}", self.total));
            lines.push(String::new());
            for item in &self.items {
                lines.push(format!(
                    "#{} {} [{}]",
                    item.id,
                    truncate(&item.title, 60),
                    item.status.label()
                ));
                if !item.details.is_empty() {
                    lines.push(format!("   {}", item.details));
                }
            }
        }
        if self.awaiting_search {
            lines.push("\n🔍 Отправьте текст для поиска".to_string());
        }

        let mut screen = Screen::new(lines.join("\n"));
        screen.push_grid(
            TABS.iter()
                .enumerate()
                .map(|(index, (_, label))| {
                    let label = if index == self.tab {
                        format!("• {}", label)
                    } else {
                        label.to_string()
                    };
                    Button::new(label, Action::Tab(index))
                })
                .collect(),
            3,
        );
        for item in &self.items {
            screen.push_row(vec![Button::new(
                truncate(&item.title, 40),
                Action::Navigate(format!("/{}/{}", self.kind.collection(), item.id)),
            )]);
        }
        let mut tools = vec![Button::new("🔍 Поиск", Action::Search)];
        if !self.search.is_empty() {
            tools.push(Button::new("✖️ Сбросить поиск", Action::ClearSearch));
        }
        tools.push(Button::new("🔄", Action::Refresh));
        screen.push_row(tools);
        screen.push_row(vec![Button::new(
            "+ Создать",
            Action::Navigate(format!("/{}/new", self.kind.collection())),
        )]);
        screen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, Credential};
    use crate::console::testing::{RecordingHost, draft_store, spawn_server};
    use axum::extract::RawQuery;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn tabs_and_search_drive_the_query() {
        let queries = Arc::new(Mutex::new(Vec::<String>::new()));
        let seen = queries.clone();
        let app = Router::new().route(
            "/api/events",
            get(move |RawQuery(query): RawQuery| {
                seen.lock().unwrap().push(query.unwrap_or_default());
                async {
                    Json(json!({
                        "items": [{
                            "id": 4, "title": "Джаз", "description": "", "location": "Клуб",
                            "event_date": "2025-03-08", "event_time": "19:00:00", "cover_image": null,
                            "ticket_link": null, "status": "draft", "order": 0,
                            "created_at": "2025-01-01T10:00:00"
                        }],
                        "total": 1
                    }))
                }
            }),
        );
        let addr = spawn_server(app).await;
        let (store, _dir) = draft_store().await;
        let drafts = store.profile(1);
        let host = RecordingHost::new("signed");
        let client = ApiClient::new(
            reqwest::Client::new(),
            format!("http://{}/api", addr),
            Credential::new("signed"),
            host.clone(),
        );
        let mut ctx = ViewContext::new(&client, host.as_ref(), &drafts);

        let mut view = EntityListView::new(EntityKind::Event, 50);
        view.load(&mut ctx).await;
        view.handle(Action::Tab(1), &mut ctx).await;
        view.handle(Action::Search, &mut ctx).await;
        view.handle_text("джаз", &mut ctx).await;

        assert_eq!(
            *queries.lock().unwrap(),
            vec![
                "limit=50".to_string(),
                "limit=50&status=draft".to_string(),
                "limit=50&status=draft&search=%D0%B4%D0%B6%D0%B0%D0%B7".to_string(),
            ]
        );

        let screen = view.render();
        assert!(screen.text.contains("08.03.2025 19:00 · Клуб"));
        assert!(screen.actions().any(|a| *a == Action::Navigate("/events/4".to_string())));
        assert!(screen.actions().any(|a| *a == Action::Navigate("/events/new".to_string())));
    }

    #[tokio::test]
    async fn text_without_search_prompt_is_not_a_query() {
        let (store, _dir) = draft_store().await;
        let drafts = store.profile(1);
        let host = RecordingHost::new("signed");
        let client = ApiClient::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9/api",
            Credential::new("signed"),
            host.clone(),
        );
        let mut ctx = ViewContext::new(&client, host.as_ref(), &drafts);
        let mut view = EntityListView::new(EntityKind::Course, 50);
        view.handle_text("керамика", &mut ctx).await;
        assert_eq!(view.search, "");
    }
}
