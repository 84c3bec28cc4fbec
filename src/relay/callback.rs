//! Inline keyboard for zone selection.
//!
//! The keyboard is the only place the selection lives between `/zones` and
//! the button press: each button carries `all` or `{id}|{name}` as its
//! callback data, and nothing is stored server side.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::warn;

use crate::valetudo::{ZoneId, ZonePreset};

pub const ALL_PAYLOAD: &str = "all";

/// Telegram rejects callback data longer than this.
const MAX_PAYLOAD_BYTES: usize = 64;

/// What a pressed zone button asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<'a> {
    All,
    Zone { id: &'a str, name: Option<&'a str> },
}

impl<'a> Selection<'a> {
    pub fn parse(data: &'a str) -> Self {
        let (id, name) = match data.split_once('|') {
            Some((id, name)) => (id, Some(name).filter(|n| !n.is_empty())),
            None => (data, None),
        };
        if id == ALL_PAYLOAD {
            Self::All
        } else {
            Self::Zone { id, name }
        }
    }
}

pub fn zone_payload(preset: &ZonePreset) -> String {
    let budget = MAX_PAYLOAD_BYTES.saturating_sub(preset.id.len() + 1);
    let name = truncate_bytes(&preset.name, budget);
    if name.is_empty() {
        preset.id.clone()
    } else {
        format!("{}|{}", preset.id, name)
    }
}

/// One row: "All" first, then a button per preset.
///
/// Presets whose id could never be triggered (and may not fit in callback
/// data) are left out, since Telegram rejects the whole keyboard otherwise.
pub fn zones_keyboard(presets: &[ZonePreset]) -> InlineKeyboardMarkup {
    let row: Vec<InlineKeyboardButton> = std::iter::once(InlineKeyboardButton::callback("All", ALL_PAYLOAD))
        .chain(
            presets
                .iter()
                .filter(|preset| {
                    let usable = ZoneId::parse(&preset.id).is_ok();
                    if !usable {
                        warn!("Skipping zone preset {:?} with unusable id {:?}", preset.name, preset.id);
                    }
                    usable
                })
                .map(|preset| InlineKeyboardButton::callback(preset.name.clone(), zone_payload(preset))),
        )
        .collect();

    InlineKeyboardMarkup::new(vec![row])
}

fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
