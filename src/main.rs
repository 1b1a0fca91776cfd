//! komon-console — консоль администратора KomonBot в чате Telegram.

mod api;
mod bot;
mod config;
mod console;
mod drafts;
mod init_data;
mod views;

use std::path::PathBuf;
use std::sync::Arc;
use teloxide::dispatching::Dispatcher;
use teloxide::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/etc/komon-console.toml"));
    tracing::info!(
        "Starting komon-console with config {}",
        config_path.display()
    );

    let config = Arc::new(config::Config::load(&config_path)?);
    let token = config.bot_token()?;
    tracing::info!(
        api_base = %config.api_base(),
        drafts_db_path = %config.drafts_db_path.display(),
        list_limit = config.list_limit,
        contacts_page_size = config.contacts_page_size,
        request_timeout_secs = config.request_timeout().as_secs(),
        "Configuration loaded"
    );

    let drafts = drafts::DraftStore::open(&config.drafts_db_path).await?;
    let http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()?;

    let bot = Bot::new(token.clone());
    let state = bot::handlers::BotState {
        config,
        bot_token: Arc::from(token),
        drafts,
        http,
        sessions: bot::SessionRegistry::default(),
    };
    tracing::info!("Dispatcher initialized, bot is ready");

    Dispatcher::builder(bot, bot::handlers::schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
