//! Форма мероприятия или курса: создание (`/x/new`) и редактирование (`/x/<id>`).

use super::ViewContext;
use super::format::{format_date, parse_date_input, parse_time_input, truncate};
use crate::api::{Course, EntityKind, EntityStatus, Event, ImageSlot, StatusAction, Upload};
use crate::console::{Action, Button, RequestSlot, Screen};
use crate::drafts::Draft;
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Date,
    Time,
    Url,
    Integer,
    Money,
    Currency,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub required: bool,
    /// Пустое значение уходит в API как `null`.
    pub nullable: bool,
    pub kind: FieldKind,
}

const fn field(name: &'static str, label: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        label,
        required: false,
        nullable: false,
        kind,
    }
}

const fn required(spec: FieldSpec) -> FieldSpec {
    FieldSpec {
        required: true,
        ..spec
    }
}

const fn nullable(spec: FieldSpec) -> FieldSpec {
    FieldSpec {
        nullable: true,
        ..spec
    }
}

const EVENT_FIELDS: &[FieldSpec] = &[
    required(field("title", "Название", FieldKind::Text)),
    field("description", "Описание", FieldKind::Text),
    required(field("location", "Место", FieldKind::Text)),
    required(nullable(field("event_date", "Дата", FieldKind::Date))),
    required(nullable(field("event_time", "Время", FieldKind::Time))),
    nullable(field("ticket_link", "Ссылка на билеты", FieldKind::Url)),
    field("order", "Порядок", FieldKind::Integer),
];

const COURSE_FIELDS: &[FieldSpec] = &[
    required(field("title", "Название", FieldKind::Text)),
    field("description", "Краткое описание", FieldKind::Text),
    nullable(field("detailed_description", "Подробное описание", FieldKind::Text)),
    field("schedule", "Расписание", FieldKind::Text),
    field("cost", "Стоимость", FieldKind::Money),
    field("currency", "Валюта", FieldKind::Currency),
    field("order", "Порядок", FieldKind::Integer),
];

const DEFAULT_CURRENCY: &str = "RUB";

pub fn fields_for(kind: EntityKind) -> &'static [FieldSpec] {
    match kind {
        EntityKind::Event => EVENT_FIELDS,
        EntityKind::Course => COURSE_FIELDS,
    }
}

fn default_form(kind: EntityKind) -> Draft {
    let mut form: Draft = fields_for(kind)
        .iter()
        .map(|spec| (spec.name.to_string(), String::new()))
        .collect();
    form.insert("order".to_string(), "0".to_string());
    if kind == EntityKind::Course {
        form.insert("cost".to_string(), "0".to_string());
        form.insert("currency".to_string(), DEFAULT_CURRENCY.to_string());
    }
    form
}

fn parse_money(raw: &str) -> Option<f64> {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}

impl FieldSpec {
    /// Проверяет ввод администратора. «-» очищает поле.
    pub fn normalize(&self, input: &str) -> Result<String, String> {
        let input = input.trim();
        if input == "-" || input.is_empty() {
            return Ok(String::new());
        }
        match self.kind {
            FieldKind::Text => Ok(input.to_string()),
            FieldKind::Date => parse_date_input(input)
                .ok_or_else(|| "Дата в формате ГГГГ-ММ-ДД или ДД.ММ.ГГГГ".to_string()),
            FieldKind::Time => {
                parse_time_input(input).ok_or_else(|| "Время в формате ЧЧ:ММ".to_string())
            }
            FieldKind::Url => {
                if input.starts_with("https://") || input.starts_with("http://") {
                    Ok(input.to_string())
                } else {
                    Err("Ссылка должна начинаться с http:// или https://".to_string())
                }
            }
            FieldKind::Integer => input
                .parse::<u32>()
                .map(|n| n.to_string())
                .map_err(|_| "Введите целое неотрицательное число".to_string()),
            FieldKind::Money => parse_money(input)
                .map(|_| input.replace(',', "."))
                .ok_or_else(|| "Введите неотрицательную сумму".to_string()),
            FieldKind::Currency => {
                if (1..=3).contains(&input.chars().count())
                    && input.chars().all(|c| c.is_ascii_alphabetic())
                {
                    Ok(input.to_ascii_uppercase())
                } else {
                    Err("Код валюты из трёх латинских букв, например RUB".to_string())
                }
            }
        }
    }
}

/// Тело POST/PATCH: числа приводятся к числам, пустые необязательные поля становятся `null`.
pub fn build_payload(kind: EntityKind, form: &Draft) -> Value {
    let mut payload = Map::new();
    for spec in fields_for(kind) {
        let raw = form.get(spec.name).map(|value| value.trim()).unwrap_or("");
        let value = match spec.kind {
            FieldKind::Integer => json!(raw.parse::<i64>().ok().filter(|n| *n >= 0).unwrap_or(0)),
            FieldKind::Money => json!(parse_money(raw).unwrap_or(0.0)),
            FieldKind::Currency if raw.is_empty() => json!(DEFAULT_CURRENCY),
            _ if spec.nullable && raw.is_empty() => Value::Null,
            _ => Value::String(raw.to_string()),
        };
        payload.insert(spec.name.to_string(), value);
    }
    Value::Object(payload)
}

struct LoadedRecord {
    form: Draft,
    status: EntityStatus,
    images: Vec<(ImageSlot, Option<String>)>,
}

fn text(pairs: &[(&str, String)]) -> Draft {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

impl From<Event> for LoadedRecord {
    fn from(event: Event) -> Self {
        let time = event
            .event_time
            .as_deref()
            .map(|raw| parse_time_input(raw).unwrap_or_else(|| raw.chars().take(5).collect()))
            .unwrap_or_default();
        Self {
            form: text(&[
                ("title", event.title),
                ("description", event.description),
                ("location", event.location),
                ("event_date", event.event_date.unwrap_or_default()),
                ("event_time", time),
                ("ticket_link", event.ticket_link.unwrap_or_default()),
                ("order", event.order.to_string()),
            ]),
            status: event.status,
            images: vec![(ImageSlot::Cover, event.cover_image)],
        }
    }
}

impl From<Course> for LoadedRecord {
    fn from(course: Course) -> Self {
        Self {
            form: text(&[
                ("title", course.title),
                ("description", course.description),
                (
                    "detailed_description",
                    course.detailed_description.unwrap_or_default(),
                ),
                ("schedule", course.schedule),
                ("cost", course.cost),
                ("currency", course.currency),
                ("order", course.order.to_string()),
            ]),
            status: course.status,
            images: vec![
                (ImageSlot::Desktop, course.image_desktop),
                (ImageSlot::Mobile, course.image_mobile),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    New,
    Existing(i64),
    Invalid(String),
}

#[derive(Debug, Clone, Copy)]
enum Prompt {
    Field(&'static FieldSpec),
    Image(ImageSlot),
}

fn slot_label(slot: ImageSlot) -> &'static str {
    match slot {
        ImageSlot::Cover => "Обложка",
        ImageSlot::Desktop => "Баннер (десктоп)",
        ImageSlot::Mobile => "Баннер (мобильный)",
    }
}

fn transition_label(action: StatusAction) -> &'static str {
    match action {
        StatusAction::Publish => "🚀 Опубликовать",
        StatusAction::Unpublish => "⏸ Снять с публикации",
        StatusAction::Cancel => "✖️ Отменить",
        StatusAction::Archive => "🗄 В архив",
        StatusAction::Reactivate => "↩️ В черновики",
    }
}

fn transition_notice(action: StatusAction) -> &'static str {
    match action {
        StatusAction::Publish => "Опубликовано",
        StatusAction::Unpublish => "Снято с публикации",
        StatusAction::Cancel => "Отменено",
        StatusAction::Archive => "Перенесено в архив",
        StatusAction::Reactivate => "Возвращено в черновики",
    }
}

pub struct EntityFormView {
    kind: EntityKind,
    target: Target,
    form: Draft,
    status: EntityStatus,
    images: Vec<(ImageSlot, Option<String>)>,
    loaded: bool,
    prompt: Option<Prompt>,
    slot: RequestSlot,
}

impl EntityFormView {
    pub fn new(kind: EntityKind, target: &str) -> Self {
        let target = match target {
            "new" => Target::New,
            other => other
                .parse::<i64>()
                .map(Target::Existing)
                .unwrap_or_else(|_| Target::Invalid(other.to_string())),
        };
        Self {
            kind,
            target,
            form: default_form(kind),
            status: EntityStatus::Draft,
            images: ImageSlot::for_kind(kind)
                .iter()
                .map(|slot| (*slot, None))
                .collect(),
            loaded: false,
            prompt: None,
            slot: RequestSlot::default(),
        }
    }

    pub fn value(&self, name: &str) -> &str {
        self.form.get(name).map(String::as_str).unwrap_or("")
    }

    #[cfg(test)]
    pub fn status(&self) -> EntityStatus {
        self.status
    }

    pub async fn load(&mut self, ctx: &mut ViewContext<'_>) {
        match self.target {
            Target::New => {
                let draft = ctx.drafts.load(self.kind.draft_kind()).await;
                if draft.get("title").is_some_and(|title| !title.trim().is_empty()) {
                    for (name, value) in draft {
                        if self.form.contains_key(&name) {
                            self.form.insert(name, value);
                        }
                    }
                    tracing::debug!(kind = self.kind.draft_kind(), "Draft restored");
                }
                self.loaded = true;
            }
            Target::Existing(id) => {
                let ticket = ctx.ticket(&mut self.slot);
                let result = match self.kind {
                    EntityKind::Event => ctx
                        .client
                        .get_event(id, Some(ticket.token()))
                        .await
                        .map(LoadedRecord::from),
                    EntityKind::Course => ctx
                        .client
                        .get_course(id, Some(ticket.token()))
                        .await
                        .map(LoadedRecord::from),
                };
                if !self.slot.finish(&ticket) {
                    return;
                }
                match result {
                    Ok(record) => {
                        self.form = record.form;
                        self.status = record.status;
                        self.images = record.images;
                        self.loaded = true;
                    }
                    Err(e) => ctx.report(&e),
                }
            }
            Target::Invalid(_) => {}
        }
    }

    pub async fn handle(&mut self, action: Action, ctx: &mut ViewContext<'_>) {
        self.prompt = None;
        match action {
            Action::Edit(name) => match fields_for(self.kind).iter().find(|spec| spec.name == name) {
                Some(spec) if self.loaded => self.prompt = Some(Prompt::Field(spec)),
                Some(_) => ctx.toast("Запись ещё не загружена"),
                None => tracing::warn!(field = %name, "Unknown form field"),
            },
            Action::Save => self.submit(ctx).await,
            Action::Transition(transition) => self.transition(transition, ctx).await,
            Action::Delete => self.delete(ctx).await,
            Action::Upload(slot) => {
                if !matches!(self.target, Target::Existing(_)) {
                    ctx.toast("Сначала сохраните запись");
                } else if ImageSlot::for_kind(self.kind).contains(&slot) {
                    self.prompt = Some(Prompt::Image(slot));
                }
            }
            Action::Refresh => self.load(ctx).await,
            other => tracing::debug!(action = ?other, "Action ignored by form"),
        }
    }

    pub async fn handle_text(&mut self, input: &str, ctx: &mut ViewContext<'_>) {
        let Some(Prompt::Field(spec)) = self.prompt else {
            ctx.toast("Выберите поле для редактирования");
            return;
        };
        let value = match spec.normalize(input) {
            Ok(value) => value,
            Err(hint) => {
                ctx.toast(hint);
                return;
            }
        };
        self.form.insert(spec.name.to_string(), value);
        self.prompt = None;

        if self.target == Target::New
            && let Err(e) = ctx.drafts.save(self.kind.draft_kind(), &self.form).await
        {
            tracing::warn!(kind = self.kind.draft_kind(), error = %e, "Failed to save draft");
        }
    }

    pub async fn handle_upload(&mut self, upload: Upload, ctx: &mut ViewContext<'_>) {
        let Target::Existing(id) = self.target else {
            ctx.toast("Сначала сохраните запись");
            return;
        };
        let slot = match (self.prompt.take(), ImageSlot::for_kind(self.kind)) {
            (Some(Prompt::Image(slot)), _) => slot,
            (_, [only]) => *only,
            _ => {
                ctx.toast("Выберите, какое изображение загрузить");
                return;
            }
        };
        match ctx.client.upload_image(self.kind, id, slot, upload).await {
            Ok(uploaded) => {
                if let Some(entry) = self.images.iter_mut().find(|(s, _)| *s == slot) {
                    entry.1 = Some(uploaded.url);
                }
                ctx.toast("Изображение загружено");
            }
            Err(e) => ctx.report(&e),
        }
    }

    async fn submit(&mut self, ctx: &mut ViewContext<'_>) {
        if !self.loaded {
            return;
        }
        if let Some(missing) = fields_for(self.kind)
            .iter()
            .find(|spec| spec.required && self.value(spec.name).trim().is_empty())
        {
            ctx.toast(format!("Заполните поле «{}»", missing.label));
            return;
        }

        let payload = build_payload(self.kind, &self.form);
        match self.target {
            Target::New => match ctx.client.create_entity(self.kind, payload).await {
                Ok(created) => {
                    if let Err(e) = ctx.drafts.clear(self.kind.draft_kind()).await {
                        tracing::warn!(kind = self.kind.draft_kind(), error = %e, "Failed to clear draft");
                    }
                    tracing::info!(kind = self.kind.collection(), id = created.id, "Record created");
                    ctx.toast(match self.kind {
                        EntityKind::Event => "Мероприятие создано",
                        EntityKind::Course => "Курс создан",
                    });
                    ctx.navigate(format!("/{}/{}", self.kind.collection(), created.id));
                }
                Err(e) => ctx.report(&e),
            },
            Target::Existing(id) => match ctx.client.update_entity(self.kind, id, payload).await {
                Ok(updated) => {
                    self.status = updated.status;
                    ctx.toast("Сохранено");
                }
                Err(e) => ctx.report(&e),
            },
            Target::Invalid(_) => {}
        }
    }

    async fn transition(&mut self, action: StatusAction, ctx: &mut ViewContext<'_>) {
        let Target::Existing(id) = self.target else {
            return;
        };
        if !StatusAction::available_from(self.status).contains(&action) {
            tracing::debug!(status = ?self.status, action = ?action, "Stale status action");
            return;
        }
        match ctx.client.transition_entity(self.kind, id, action).await {
            Ok(updated) => {
                self.status = updated.status;
                ctx.toast(transition_notice(action));
            }
            Err(e) => ctx.report(&e),
        }
    }

    async fn delete(&mut self, ctx: &mut ViewContext<'_>) {
        let Target::Existing(id) = self.target else {
            return;
        };
        if self.status == EntityStatus::Published {
            ctx.toast("Сначала снимите запись с публикации");
            return;
        }
        let question = match self.kind {
            EntityKind::Event => "Удалить мероприятие?",
            EntityKind::Course => "Удалить курс?",
        };
        if !ctx.host.confirm(question).await {
            return;
        }
        match ctx.client.delete_entity(self.kind, id).await {
            Ok(()) => {
                ctx.toast("Удалено");
                ctx.navigate(format!("/{}", self.kind.collection()));
            }
            Err(e) => ctx.report(&e),
        }
    }

    fn heading(&self) -> String {
        match (&self.target, self.kind) {
            (Target::New, EntityKind::Event) => "📅 Новое мероприятие".to_string(),
            (Target::New, EntityKind::Course) => "📚 Новый курс".to_string(),
            (Target::Existing(id), EntityKind::Event) => format!("📅 Мероприятие #{}", id),
            (Target::Existing(id), EntityKind::Course) => format!("📚 Курс #{}", id),
            (Target::Invalid(raw), _) => format!("Запись «{}» не найдена", raw),
        }
    }

    pub fn render(&self) -> Screen {
        let mut lines = vec![self.heading()];
        if let Target::Invalid(_) = self.target {
            return Screen::new(lines.join("\n"));
        }
        if !self.loaded {
            if self.slot.is_loading() {
                lines.push("Загрузка…".to_string());
                return Screen::new(lines.join("\n"));
            }
            lines.push("Не удалось загрузить запись.".to_string());
            return Screen::new(lines.join("\n"))
                .row(vec![Button::new("🔄 Повторить", Action::Refresh)]);
        }

        if let Target::Existing(_) = self.target {
            lines.push(format!("Статус: {}", self.status.label()));
        }
        lines.push(String::new());
        for spec in fields_for(self.kind) {
            let value = self.value(spec.name);
            let shown = match (spec.kind, value.is_empty()) {
                (_, true) => "—".to_string(),
                (FieldKind::Date, false) => format_date(value),
                (_, false) => truncate(value, 200),
            };
            let marker = if spec.required { "*" } else { "" };
            lines.push(format!("{}{}: {}", spec.label, marker, shown));
        }
        if let Target::Existing(_) = self.target {
            for (slot, url) in &self.images {
                let state = if url.is_some() { "загружено" } else { "нет" };
                lines.push(format!("{}: {}", slot_label(*slot), state));
            }
        }
        match self.prompt {
            Some(Prompt::Field(spec)) => lines.push(format!(
                "\n✏️ Отправьте значение для «{}» (или «-», чтобы очистить)",
                spec.label
            )),
            Some(Prompt::Image(slot)) => lines.push(format!(
                "\n🖼 Отправьте фото для «{}»",
                slot_label(slot)
            )),
            None => {}
        }

        let mut screen = Screen::new(lines.join("\n"));
        screen.push_grid(
            fields_for(self.kind)
                .iter()
                .map(|spec| {
                    Button::new(
                        format!("✏️ {}", spec.label),
                        Action::Edit(spec.name.to_string()),
                    )
                })
                .collect(),
            2,
        );
        let save_label = if self.target == Target::New {
            "💾 Создать"
        } else {
            "💾 Сохранить"
        };
        screen.push_row(vec![Button::new(save_label, Action::Save)]);

        if let Target::Existing(_) = self.target {
            screen.push_grid(
                StatusAction::available_from(self.status)
                    .into_iter()
                    .map(|action| Button::new(transition_label(action), Action::Transition(action)))
                    .collect(),
                2,
            );
            screen.push_row(
                ImageSlot::for_kind(self.kind)
                    .iter()
                    .map(|slot| Button::new(format!("🖼 {}", slot_label(*slot)), Action::Upload(*slot)))
                    .collect(),
            );
            if self.status != EntityStatus::Published {
                screen.push_row(vec![Button::new("🗑 Удалить", Action::Delete)]);
            }
        }
        screen
    }
}
