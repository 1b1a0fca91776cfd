//! Подпись Telegram WebApp initData для администратора, открывшего консоль
//! в чате. API проверяет её так же, как данные из Mini App.

use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const SECRET_KEY_SALT: &[u8] = b"WebAppData";

#[derive(Debug, Error)]
pub enum InitDataError {
    #[error("Некорректный ключ подписи")]
    Key(#[from] hmac::digest::InvalidLength),
    #[error("Не удалось сериализовать пользователя: {0}")]
    User(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct WebAppUser {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

impl From<&teloxide::types::User> for WebAppUser {
    fn from(user: &teloxide::types::User) -> Self {
        Self {
            id: user.id.0 as i64,
            first_name: Some(user.first_name.clone()).filter(|name| !name.is_empty()),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            language_code: user.language_code.clone(),
        }
    }
}

fn mac(key: &[u8], message: &[u8]) -> Result<Vec<u8>, InitDataError> {
    let mut mac = HmacSha256::new_from_slice(key)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Хэш по строке проверки: пары `k=v`, отсортированные по ключу, через `\n`.
fn signature(bot_token: &str, pairs: &[(&str, String)]) -> Result<String, InitDataError> {
    let mut sorted: Vec<&(&str, String)> = pairs.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let check_string = sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("\n");
    let secret = mac(SECRET_KEY_SALT, bot_token.as_bytes())?;
    Ok(hex::encode(mac(&secret, check_string.as_bytes())?))
}

/// Строка initData в формате query string, как её передаёт Telegram.
pub fn sign_init_data(
    bot_token: &str,
    user: &WebAppUser,
    auth_date: i64,
) -> Result<String, InitDataError> {
    let pairs = vec![
        ("auth_date", auth_date.to_string()),
        ("user", serde_json::to_string(user)?),
    ];
    let hash = signature(bot_token, &pairs)?;
    let mut query: Vec<String> = pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect();
    query.push(format!("hash={}", hash));
    Ok(query.join("&"))
}
