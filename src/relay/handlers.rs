//! dptree endpoints wiring Telegram updates to the relay.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::CallbackQuery;

use super::{Relay, Reply, TelegramClient};

pub async fn handle_message(
    msg: Message,
    relay: Arc<Relay>,
    telegram: Arc<TelegramClient>,
) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let username = msg.from.as_ref().and_then(|u| u.username.as_deref());

    if let Some(reply) = relay.on_message(username, text).await {
        telegram.send_reply(msg.chat.id, &reply).await.ok();
    }

    Ok(())
}

/// The notice goes out twice: as the button toast and as a chat message.
pub async fn handle_callback(
    query: CallbackQuery,
    relay: Arc<Relay>,
    telegram: Arc<TelegramClient>,
) -> ResponseResult<()> {
    let Some(data) = query.data.as_deref() else {
        return Ok(());
    };

    let Some(notice) = relay.on_callback(query.from.username.as_deref(), data).await else {
        return Ok(());
    };

    telegram.answer_callback(&query, &notice).await.ok();
    if let Some(message) = &query.message {
        telegram.send_reply(message.chat().id, &Reply::text(notice)).await.ok();
    }

    Ok(())
}
