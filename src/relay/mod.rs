//! Relay module - turns chat commands and zone buttons into robot API calls.

pub mod callback;
pub mod command;
pub mod handlers;
pub mod telegram;


use std::sync::Arc;

use teloxide::types::InlineKeyboardMarkup;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::valetudo::{self, BasicAction, DeviceStatus, ZoneId};

pub use callback::Selection;
pub use command::Command;
pub use telegram::TelegramClient;

/// Outbound chat message.
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), keyboard: None }
    }
}

/// Stateless dispatcher between Telegram updates and the robot.
pub struct Relay {
    config: Arc<Config>,
    client: valetudo::Client,
}

impl Relay {
    pub fn new(config: Arc<Config>, client: valetudo::Client) -> Self {
        Self { config, client }
    }

    /// Handle a text message. `None` means stay silent.
    pub async fn on_message(&self, username: Option<&str>, text: &str) -> Option<Reply> {
        if !self.config.is_authorized(username) {
            debug!("Dropping message from unauthorized user {:?}", username);
            return None;
        }
        let command = Command::parse(text)?;
        info!("📨 {:?} from {}", command, username.unwrap_or("?"));
        self.dispatch(command).await
    }

    /// Handle an inline button press. Returns the notice to show the user.
    pub async fn on_callback(&self, username: Option<&str>, data: &str) -> Option<String> {
        if !self.config.is_authorized(username) {
            debug!("Dropping callback from unauthorized user {:?}", username);
            return None;
        }
        info!("🔘 Callback {:?} from {}", data, username.unwrap_or("?"));
        Some(self.select(Selection::parse(data)).await)
    }

    pub async fn dispatch(&self, command: Command) -> Option<Reply> {
        match command {
            Command::Zones => Some(self.zones().await),
            Command::Pause => Some(self.basic_control(BasicAction::Pause, "Pausing").await),
            Command::Home => Some(self.basic_control(BasicAction::Home, "Going back to the dock").await),
            Command::Status => Some(self.status().await),
            Command::Start => None,
            Command::Unknown(_) => Some(Reply::text("Unknown command")),
        }
    }

    async fn zones(&self) -> Reply {
        match self.client.list_zone_presets().await {
            Ok(presets) => Reply {
                text: "Available zones:".to_string(),
                keyboard: Some(callback::zones_keyboard(&presets)),
            },
            Err(e) => {
                warn!("Failed to list zone presets: {e}");
                Reply::text(e.to_string())
            }
        }
    }

    async fn basic_control(&self, action: BasicAction, confirmation: &str) -> Reply {
        match self.client.set_basic_control(action).await {
            Ok(()) => Reply::text(confirmation),
            Err(e) => {
                warn!("Basic control {action} failed: {e}");
                Reply::text(e.to_string())
            }
        }
    }

    async fn status(&self) -> Reply {
        match self.client.get_state_attributes().await {
            Ok(attributes) => Reply::text(DeviceStatus::from_attributes(&attributes).to_string()),
            Err(e) => {
                warn!("Failed to fetch state attributes: {e}");
                Reply::text(e.to_string())
            }
        }
    }

    async fn select(&self, selection: Selection<'_>) -> String {
        match selection {
            Selection::All => match self.client.set_basic_control(BasicAction::Start).await {
                Ok(()) => "Starting cleanup".to_string(),
                Err(e) => {
                    warn!("Full cleanup failed: {e}");
                    e.to_string()
                }
            },
            Selection::Zone { id, name } => {
                let zone_id = match ZoneId::parse(id) {
                    Ok(zone_id) => zone_id,
                    Err(e) => {
                        warn!("Rejected zone identifier {:?}", id);
                        return e.to_string();
                    }
                };
                match self.client.trigger_zone_preset(&zone_id).await {
                    Ok(()) => format!("Starting cleanup for zone: {}", name.unwrap_or(id)),
                    Err(e) => {
                        warn!("Zone cleanup {} failed: {e}", id);
                        e.to_string()
                    }
                }
            }
        }
    }
}
