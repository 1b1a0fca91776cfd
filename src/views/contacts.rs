//! Заявки с сайта: вкладки по статусу обработки, страницы, сортировка.

use super::ViewContext;
use super::format::{format_timestamp, truncate};
use crate::api::{Contact, ContactFilter, ContactQuery, SortOrder};
use crate::console::{Action, Button, RequestSlot, Screen};

pub struct ContactsView {
    filter: ContactFilter,
    sort: SortOrder,
    page: i64,
    page_size: u32,
    items: Vec<Contact>,
    total: i64,
    loaded: bool,
    slot: RequestSlot,
}

impl ContactsView {
    pub fn new(page_size: u32) -> Self {
        Self {
            filter: ContactFilter::default(),
            sort: SortOrder::default(),
            page: 0,
            page_size: page_size.max(1),
            items: Vec::new(),
            total: 0,
            loaded: false,
            slot: RequestSlot::default(),
        }
    }

    fn page_count(&self) -> i64 {
        let size = i64::from(self.page_size);
        ((self.total + size - 1) / size).max(1)
    }

    fn query(&self) -> ContactQuery {
        ContactQuery {
            filter: self.filter,
            offset: self.page * i64::from(self.page_size),
            limit: self.page_size,
            sort: self.sort,
        }
    }

    pub async fn load(&mut self, ctx: &mut ViewContext<'_>) {
        loop {
            let query = self.query();
            let ticket = ctx.ticket(&mut self.slot);
            let result = ctx.client.list_contacts(&query, Some(ticket.token())).await;
            if !self.slot.finish(&ticket) {
                return;
            }
            match result {
                Ok(page) => {
                    self.items = page.items;
                    self.total = page.total;
                    self.loaded = true;
                    // После обработки последней заявки на странице её может не остаться.
                    if self.items.is_empty() && self.page > 0 && self.page >= self.page_count() {
                        self.page = self.page_count() - 1;
                        continue;
                    }
                    return;
                }
                Err(e) => {
                    ctx.report(&e);
                    return;
                }
            }
        }
    }

    pub async fn handle(&mut self, action: Action, ctx: &mut ViewContext<'_>) {
        match action {
            Action::Tab(index) => {
                let Some(filter) = ContactFilter::ALL.get(index).copied() else {
                    return;
                };
                if filter != self.filter {
                    self.filter = filter;
                    self.page = 0;
                    self.load(ctx).await;
                }
            }
            Action::Page(page) if page >= 0 && page < self.page_count() => {
                self.page = page;
                self.load(ctx).await;
            }
            Action::ToggleSort => {
                self.sort = self.sort.toggled();
                self.page = 0;
                self.load(ctx).await;
            }
            Action::Process(id) => self.set_processed(id, true, ctx).await,
            Action::Unprocess(id) => self.set_processed(id, false, ctx).await,
            Action::Refresh => self.load(ctx).await,
            other => tracing::debug!(action = ?other, "Action ignored by contacts"),
        }
    }

    async fn set_processed(&mut self, id: i64, processed: bool, ctx: &mut ViewContext<'_>) {
        match ctx.client.set_contact_processed(id, processed).await {
            Ok(_) => {
                ctx.toast(if processed {
                    "Заявка обработана"
                } else {
                    "Заявка возвращена в новые"
                });
                self.load(ctx).await;
            }
            Err(e) => ctx.report(&e),
        }
    }

    pub fn render(&self) -> Screen {
        let mut lines = vec!["📨 Заявки".to_string()];
        let sort_label = match self.sort {
            SortOrder::Desc => "сначала новые",
            SortOrder::Asc => "сначала старые",
        };
        if !self.loaded {
            lines.push(if self.slot.is_loading() {
                "Загрузка…".to_string()
            } else {
                "Не удалось загрузить заявки.".to_string()
            });
        } else if self.items.is_empty() {
            lines.push("Заявок нет".to_string());
        } else {
            lines.push(format!(
                "Всего: {} · стр. {}/{} · {}",
                self.total,
                self.page + 1,
                self.page_count(),
                sort_label
            ));
            for contact in &self.items {
                lines.push(String::new());
                let mark = if contact.is_processed { "✅" } else { "🆕" };
                lines.push(format!(
                    "{} #{} {} · {}",
                    mark,
                    contact.id,
                    contact.name,
                    format_timestamp(&contact.created_at)
                ));
                lines.push(format!("📞 {}", contact.phone));
                if let Some(email) = contact.email.as_deref().filter(|e| !e.is_empty()) {
                    lines.push(format!("✉️ {}", email));
                }
                if let Some(source) = contact.source.as_deref().filter(|s| !s.is_empty()) {
                    lines.push(format!("Источник: {}", source));
                }
                if !contact.message.is_empty() {
                    lines.push(format!("💬 {}", truncate(&contact.message, 300)));
                }
            }
        }

        let mut screen = Screen::new(lines.join("\n"));
        screen.push_row(
            ContactFilter::ALL
                .iter()
                .enumerate()
                .map(|(index, filter)| {
                    let label = if *filter == self.filter {
                        format!("• {}", filter.label())
                    } else {
                        filter.label().to_string()
                    };
                    Button::new(label, Action::Tab(index))
                })
                .collect(),
        );
        screen.push_grid(
            self.items
                .iter()
                .map(|contact| {
                    if contact.is_processed {
                        Button::new(format!("↩️ #{} в новые", contact.id), Action::Unprocess(contact.id))
                    } else {
                        Button::new(format!("✅ #{} обработана", contact.id), Action::Process(contact.id))
                    }
                })
                .collect(),
            2,
        );

        let mut pager = Vec::new();
        if self.page > 0 {
            pager.push(Button::new("◀️", Action::Page(self.page - 1)));
        }
        pager.push(Button::new(
            format!("⇅ {}", sort_label),
            Action::ToggleSort,
        ));
        if self.page + 1 < self.page_count() {
            pager.push(Button::new("▶️", Action::Page(self.page + 1)));
        }
        screen.push_row(pager);
        screen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, Credential};
    use crate::console::testing::{RecordingHost, draft_store, spawn_server};
    use axum::extract::{Path, Query};
    use axum::routing::{get, patch};
    use axum::{Json, Router};
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Deserialize)]
    struct ListParams {
        offset: i64,
        limit: i64,
        sort: String,
        is_processed: Option<bool>,
    }

    #[derive(Default)]
    struct Fake {
        processed: Vec<i64>,
        queries: Vec<String>,
    }

    fn contact(id: i64, processed: bool) -> serde_json::Value {
        json!({
            "id": id, "name": format!("Клиент {}", id), "phone": "+79990000000",
            "email": null, "message": "Хочу на курс", "source": "site",
            "is_processed": processed, "created_at": "2025-01-01T10:00:00"
        })
    }

    #[tokio::test]
    async fn paging_sorting_and_processing() {
        let fake = Arc::new(Mutex::new(Fake::default()));
        let list_state = fake.clone();
        let process_state = fake.clone();
        let app = Router::new()
            .route(
                "/api/contacts",
                get(move |Query(params): Query<ListParams>| {
                    let mut fake = list_state.lock().unwrap();
                    fake.queries.push(format!(
                        "{}/{}/{}/{:?}",
                        params.offset, params.limit, params.sort, params.is_processed
                    ));
                    let items: Vec<_> = (params.offset..(params.offset + params.limit).min(3))
                        .filter(|id| !fake.processed.contains(id))
                        .map(|id| contact(id, false))
                        .collect();
                    let total = 3 - fake.processed.len() as i64;
                    async move { Json(json!({"items": items, "total": total})) }
                }),
            )
            .route(
                "/api/contacts/:id/process",
                patch(move |Path(id): Path<i64>| {
                    process_state.lock().unwrap().processed.push(id);
                    async move { Json(contact(id, true)) }
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

        let mut view = ContactsView::new(2);
        view.load(&mut ctx).await;
        assert_eq!(view.page_count(), 2);
        assert!(view.render().actions().any(|a| *a == Action::Page(1)));

        view.handle(Action::Page(1), &mut ctx).await;
        view.handle(Action::Page(5), &mut ctx).await;
        view.handle(Action::ToggleSort, &mut ctx).await;
        view.handle(Action::Process(0), &mut ctx).await;
        view.handle(Action::Tab(2), &mut ctx).await;

        let fake = fake.lock().unwrap();
        assert_eq!(fake.processed, vec![0]);
        assert_eq!(
            fake.queries,
            vec![
                "0/2/desc/Some(false)".to_string(),
                "2/2/desc/Some(false)".to_string(),
                "0/2/asc/Some(false)".to_string(),
                "0/2/asc/Some(false)".to_string(),
                "0/2/asc/None".to_string(),
            ]
        );
        let (_, toasts) = ctx.finish();
        assert_eq!(toasts, vec!["Заявка обработана".to_string()]);
    }
}
