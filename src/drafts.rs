//! SQLite-хранилище черновиков форм создания. Черновик привязан к профилю
//! (Telegram ID администратора) и виду сущности.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Префикс ключа черновика: `komonbot_event_draft`, `komonbot_course_draft`.
const KEY_PREFIX: &str = "komonbot";

pub type Draft = BTreeMap<String, String>;

pub fn draft_key(kind: &str) -> String {
    format!("{}_{}_draft", KEY_PREFIX, kind)
}

fn current_unix_timestamp() -> Result<i64, anyhow::Error> {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .map_err(|err| anyhow::anyhow!("Системное время меньше UNIX_EPOCH: {}", err))
}

#[derive(Clone)]
pub struct DraftStore {
    pool: SqlitePool,
}

impl DraftStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("Не удалось создать директорию для черновиков: {}", e))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(opts)
            .await
            .map_err(|e| anyhow::anyhow!("Не удалось подключиться к SQLite: {}", e))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS drafts (
                profile INTEGER NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (profile, key)
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Миграция черновиков: {}", e))?;
        Ok(())
    }

    pub fn profile(&self, profile: i64) -> Drafts {
        Drafts {
            pool: self.pool.clone(),
            profile,
        }
    }
}

/// Черновики одного администратора.
#[derive(Clone)]
pub struct Drafts {
    pool: SqlitePool,
    profile: i64,
}

impl Drafts {
    /// Отсутствующий или повреждённый черновик читается как пустой.
    pub async fn load(&self, kind: &str) -> Draft {
        let key = draft_key(kind);
        let raw = sqlx::query_scalar::<_, String>(
            "SELECT value FROM drafts WHERE profile = ? AND key = ?",
        )
        .bind(self.profile)
        .bind(&key)
        .fetch_optional(&self.pool)
        .await;

        match raw {
            Ok(Some(raw)) => parse_draft(&raw).unwrap_or_else(|| {
                tracing::warn!(profile = self.profile, key = %key, "Повреждённый черновик проигнорирован");
                Draft::new()
            }),
            Ok(None) => Draft::new(),
            Err(e) => {
                tracing::warn!(profile = self.profile, key = %key, error = %e, "Не удалось прочитать черновик");
                Draft::new()
            }
        }
    }

    pub async fn save(&self, kind: &str, draft: &Draft) -> Result<(), anyhow::Error> {
        let now = current_unix_timestamp()?;
        let value = serde_json::to_string(draft)?;
        sqlx::query(
            "INSERT INTO drafts (profile, key, value, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(profile, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(self.profile)
        .bind(draft_key(kind))
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn clear(&self, kind: &str) -> Result<(), anyhow::Error> {
        sqlx::query("DELETE FROM drafts WHERE profile = ? AND key = ?")
            .bind(self.profile)
            .bind(draft_key(kind))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Значения приводятся к строкам: числовое `order` из старых черновиков
/// остаётся читаемым.
fn parse_draft(raw: &str) -> Option<Draft> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let draft = object
        .iter()
        .filter_map(|(field, value)| {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((field.clone(), value))
        })
        .collect();
    Some(draft)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (DraftStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = DraftStore::open(dir.path().join("nested").join("drafts.sqlite"))
            .await
            .unwrap();
        (store, dir)
    }

    fn draft(pairs: &[(&str, &str)]) -> Draft {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn keys_are_namespaced_by_kind() {
        assert_eq!(draft_key("event"), "komonbot_event_draft");
        assert_eq!(draft_key("course"), "komonbot_course_draft");
    }

    #[tokio::test]
    async fn saved_draft_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drafts.sqlite");
        {
            let store = DraftStore::open(&path).await.unwrap();
            store
                .profile(1)
                .save("event", &draft(&[("title", "Концерт"), ("order", "2")]))
                .await
                .unwrap();
        }
        let store = DraftStore::open(&path).await.unwrap();
        let loaded = store.profile(1).load("event").await;
        assert_eq!(loaded, draft(&[("title", "Концерт"), ("order", "2")]));
    }

    #[tokio::test]
    async fn drafts_are_isolated_per_profile_and_kind() {
        let (store, _dir) = store().await;
        store
            .profile(1)
            .save("event", &draft(&[("title", "A")]))
            .await
            .unwrap();
        assert!(store.profile(2).load("event").await.is_empty());
        assert!(store.profile(1).load("course").await.is_empty());
    }

    #[tokio::test]
    async fn save_overwrites_and_clear_removes() {
        let (store, _dir) = store().await;
        let drafts = store.profile(7);
        drafts.save("course", &draft(&[("title", "A")])).await.unwrap();
        drafts.save("course", &draft(&[("title", "B")])).await.unwrap();
        assert_eq!(drafts.load("course").await, draft(&[("title", "B")]));
        drafts.clear("course").await.unwrap();
        assert!(drafts.load("course").await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_value_reads_as_empty() {
        let (store, _dir) = store().await;
        sqlx::query("INSERT INTO drafts (profile, key, value, updated_at) VALUES (3, ?, '{not json', 0)")
            .bind(draft_key("event"))
            .execute(&store.pool)
            .await
            .unwrap();
        assert!(store.profile(3).load("event").await.is_empty());
    }

    #[test]
    fn numeric_values_are_read_as_strings() {
        let parsed = parse_draft(r#"{"title":"X","order":3,"extra":null}"#).unwrap();
        assert_eq!(parsed, draft(&[("title", "X"), ("order", "3")]));
        assert_eq!(parse_draft("[1,2]"), None);
    }
}
