use std::sync::Arc;

use anyhow::Context;
use glif_bridge::{Orchestrator, RetentionPolicy, RetentionScheduler};
use glif_core::config::{AppConfig, DEFAULT_CONFIG_PATH};
use glif_core::types::{ContentType, HandleOutcome, InboundMessage, Reply};
use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::{debug, info};

#[derive(Clone)]
struct BotState {
    orchestrator: Arc<Orchestrator>,
    help_text: Arc<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        // 默认用 info 级别，若设置 RUST_LOG 则以环境变量为准。
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .with_target(false)
        .compact()
        .init();

    let config_path =
        std::env::var("GLIF_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("load config failed: path={config_path}"))?;
    config.validate()?;

    let orchestrator = Orchestrator::from_config(&config)?;
    info!(
        "glif bridge ready: endpoint={} triggers={} image_dir={}",
        config.glif.endpoint,
        orchestrator.triggers().phrases().count(),
        orchestrator.store().dir().display()
    );

    let scheduler = RetentionScheduler::spawn(
        orchestrator.store().dir().to_path_buf(),
        RetentionPolicy::from_config(&config.retention),
    );

    let state = BotState {
        help_text: Arc::new(orchestrator.triggers().help_text()),
        orchestrator: Arc::new(orchestrator),
    };

    let bot = Bot::new(config.telegram.bot_token.clone());
    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    scheduler.stop().await;
    info!("glif bridge stopped");
    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, state: BotState) -> anyhow::Result<()> {
    let inbound = inbound_from(&msg);
    if inbound.content_type == ContentType::Text && is_help_command(&inbound.text) {
        bot.send_message(msg.chat.id, state.help_text.as_str())
            .await
            .context("send help reply failed")?;
        return Ok(());
    }

    match state.orchestrator.handle(&inbound).await {
        HandleOutcome::Continue => {
            debug!("handle_message: ignored chat_id={}", msg.chat.id.0);
        }
        HandleOutcome::Break(Reply::Image(bytes)) => {
            bot.send_photo(msg.chat.id, InputFile::memory(bytes).file_name("image.png"))
                .await
                .context("send image reply failed")?;
        }
        HandleOutcome::Break(Reply::Error(text)) => {
            bot.send_message(msg.chat.id, text)
                .await
                .context("send error reply failed")?;
        }
    }
    Ok(())
}

fn inbound_from(msg: &Message) -> InboundMessage {
    if let Some(text) = msg.text() {
        return InboundMessage::text(text);
    }
    let content_type = if msg.photo().is_some() {
        ContentType::Image
    } else if msg.voice().is_some() || msg.audio().is_some() {
        ContentType::Voice
    } else if msg.document().is_some() {
        ContentType::File
    } else {
        ContentType::Other
    };
    InboundMessage {
        content_type,
        text: msg.caption().unwrap_or_default().to_string(),
    }
}

fn is_help_command(text: &str) -> bool {
    let Some(first) = text.split_whitespace().next() else {
        return false;
    };
    let command = first.split('@').next().unwrap_or(first);
    matches!(command, "/start" | "/help")
}
