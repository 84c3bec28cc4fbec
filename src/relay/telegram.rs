//! Telegram client using teloxide.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, Me};
use tracing::{info, warn};

use super::{Command, Reply};

/// Slack on top of the long-poll timeout so Telegram answers before reqwest gives up.
const HTTP_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

/// HTTP timeout for the bot client given the getUpdates long-poll timeout.
pub fn http_timeout(poll_timeout: Duration) -> Duration {
    poll_timeout + HTTP_TIMEOUT_MARGIN
}

/// Build a bot whose HTTP client outlives a full long poll.
pub fn build_bot(token: &str, poll_timeout: Duration) -> Result<Bot, reqwest::Error> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(http_timeout(poll_timeout))
        .build()?;
    Ok(Bot::with_client(token, client))
}

/// Telegram API client.
#[derive(Clone)]
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Verify the token by fetching the bot's own account.
    pub async fn get_me(&self) -> Result<Me, String> {
        self.bot
            .get_me()
            .await
            .map_err(|e| format!("Failed to reach Telegram: {e}"))
    }

    /// Register the command menu shown by Telegram clients.
    pub async fn set_commands(&self) -> Result<(), String> {
        self.bot.set_my_commands(Command::menu()).await.map_err(|e| {
            let msg = format!("Failed to set commands: {e}");
            warn!("{}", msg);
            msg
        })?;

        info!("Registered command menu");
        Ok(())
    }

    pub async fn send_reply(&self, chat_id: ChatId, reply: &Reply) -> Result<(), String> {
        let mut request = self.bot.send_message(chat_id, reply.text.as_str());

        if let Some(keyboard) = &reply.keyboard {
            request = request.reply_markup(keyboard.clone());
        }

        request.await.map(|_| ()).map_err(|e| {
            let msg = format!("Failed to send: {e}");
            warn!("{}", msg);
            msg
        })
    }

    /// Answer a button press with a toast notification.
    pub async fn answer_callback(&self, query: &CallbackQuery, text: &str) -> Result<(), String> {
        self.bot
            .answer_callback_query(query.id.clone())
            .text(text)
            .await
            .map(|_| ())
            .map_err(|e| {
                let msg = format!("Failed to answer callback: {e}");
                warn!("{}", msg);
                msg
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_timeout_exceeds_poll_timeout() {
        for secs in [0, 17, 60, 300] {
            let poll = Duration::from_secs(secs);
            assert!(http_timeout(poll) > poll, "poll timeout {secs}s");
        }
        assert_eq!(http_timeout(Duration::from_secs(60)), Duration::from_secs(70));
    }

    #[test]
    fn test_build_bot_keeps_token() {
        let bot = build_bot("123456789:ABCdef", Duration::from_secs(60)).unwrap();
        assert_eq!(bot.token(), "123456789:ABCdef");
    }
}
