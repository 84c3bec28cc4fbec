//! Client for the robot's local Valetudo REST API.
//!
//! Only the handful of capabilities the bot exposes are covered: basic
//! control, zone cleaning presets and the state attribute list.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const JSON_UTF8: &str = "application/json; charset=utf-8";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

static ZONE_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("zone id pattern is valid"));

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Received error with status code: {0}")]
    Status(u16),
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid zone identifier")]
    InvalidZoneId,
}

/// Actions accepted by `BasicControlCapability`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicAction {
    Start,
    Pause,
    Home,
}

impl BasicAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Home => "home",
        }
    }
}

impl fmt::Display for BasicAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize)]
struct ActionRequest<'a> {
    action: &'a str,
}

/// A named cleaning zone stored on the robot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ZonePreset {
    pub id: String,
    pub name: String,
}

/// Identifier of a zone preset, safe to place in a URL path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneId(String);

impl ZoneId {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        if ZONE_ID_PATTERN.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(Error::InvalidZoneId)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One entry of `/robot/state/attributes`, discriminated by `__class`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "__class")]
pub enum StateAttribute {
    #[serde(rename = "StatusStateAttribute")]
    Status {
        value: String,
        #[serde(default)]
        flag: Option<String>,
    },
    #[serde(rename = "BatteryStateAttribute")]
    Battery { level: u32 },
    /// Consumables, attachments, presets and anything newer firmware adds.
    #[serde(other)]
    Other,
}

/// Status summary extracted from the attribute list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceStatus {
    pub status: Option<String>,
    pub battery_level: Option<u32>,
}

impl DeviceStatus {
    pub fn from_attributes(attributes: &[StateAttribute]) -> Self {
        let mut summary = Self::default();
        for attribute in attributes {
            match attribute {
                StateAttribute::Status { value, .. } => summary.status = Some(value.clone()),
                StateAttribute::Battery { level } => summary.battery_level = Some(*level),
                StateAttribute::Other => {}
            }
        }
        summary
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Status: {}", self.status.as_deref().unwrap_or("unknown"))?;
        match self.battery_level {
            Some(level) => write!(f, "Battery: {level}%"),
            None => write!(f, "Battery: unknown"),
        }
    }
}

/// Valetudo API client.
pub struct Client {
    base_url: String,
    http: reqwest::Client,
}

impl Client {
    /// `base_url` includes the API prefix, e.g. "http://192.168.1.20/api/v2".
    pub fn new(base_url: &str) -> Result<Self, Error> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_http(base_url, http))
    }

    pub fn with_http(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub async fn set_basic_control(&self, action: BasicAction) -> Result<(), Error> {
        let request = self
            .request(Method::PUT, "/robot/capabilities/BasicControlCapability")
            .json(&ActionRequest { action: action.as_str() });
        self.send(request).await?;
        Ok(())
    }

    /// Presets sorted by name.
    pub async fn list_zone_presets(&self) -> Result<Vec<ZonePreset>, Error> {
        let request = self.request(Method::GET, "/robot/capabilities/ZoneCleaningCapability/presets");
        let body = self.send(request).await?;
        let presets: BTreeMap<String, ZonePreset> = serde_json::from_str(&body)?;

        let mut presets: Vec<ZonePreset> = presets.into_values().collect();
        presets.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(presets)
    }

    pub async fn trigger_zone_preset(&self, id: &ZoneId) -> Result<(), Error> {
        let path = format!("/robot/capabilities/ZoneCleaningCapability/presets/{}", id.as_str());
        let request = self
            .request(Method::PUT, &path)
            .json(&ActionRequest { action: "clean" });
        self.send(request).await?;
        Ok(())
    }

    pub async fn get_state_attributes(&self) -> Result<Vec<StateAttribute>, Error> {
        let request = self.request(Method::GET, "/robot/state/attributes");
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header(CONTENT_TYPE, JSON_UTF8)
            .header(ACCEPT, JSON_UTF8)
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, Error> {
        let response = request.send().await?;
        let status = response.status();
        debug!("{} {}", status, response.url());

        if !(200..400).contains(&status.as_u16()) {
            return Err(Error::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_state_attributes() {
        let body = r#"[
            {"__class": "StatusStateAttribute", "metaData": {}, "value": "docked", "flag": "none"},
            {"__class": "BatteryStateAttribute", "metaData": {}, "level": 87, "flag": "charging"},
            {"__class": "ConsumableStateAttribute", "type": "brush", "remaining": {"value": 100}}
        ]"#;
        let attributes: Vec<StateAttribute> = serde_json::from_str(body).unwrap();
        assert_eq!(
            attributes,
            vec![
                StateAttribute::Status { value: "docked".into(), flag: Some("none".into()) },
                StateAttribute::Battery { level: 87 },
                StateAttribute::Other,
            ]
        );
    }

    #[test]
    fn test_status_format() {
        let attributes = vec![
            StateAttribute::Status { value: "X".into(), flag: None },
            StateAttribute::Battery { level: 42 },
        ];
        let status = DeviceStatus::from_attributes(&attributes);
        assert_eq!(status.to_string(), "Status: X\nBattery: 42%");
    }

    #[test]
    fn test_status_format_with_missing_attributes() {
        let status = DeviceStatus::from_attributes(&[StateAttribute::Other]);
        assert_eq!(status.to_string(), "Status: unknown\nBattery: unknown");
    }

    #[test]
    fn test_basic_action_names() {
        assert_eq!(BasicAction::Home.as_str(), "home");
        assert_eq!(BasicAction::Pause.to_string(), "pause");
        assert_eq!(BasicAction::Start.as_str(), "start");
    }

    #[test]
    fn test_zone_id_accepts_uuid() {
        let id = ZoneId::parse("3b1fd1a6-6a14-4a5c-9d6c-7a5e3d0e4b21").unwrap();
        assert_eq!(id.as_str(), "3b1fd1a6-6a14-4a5c-9d6c-7a5e3d0e4b21");
    }

    #[test]
    fn test_zone_id_rejects_path_tricks() {
        for raw in ["", "../state", "a/b", "id?x=1", "id#frag", "zone id", &"a".repeat(65)] {
            assert!(ZoneId::parse(raw).is_err(), "{raw:?} accepted");
        }
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = Client::with_http("http://robot.local/api/v2/", reqwest::Client::new());
        assert_eq!(client.base_url, "http://robot.local/api/v2");
    }
}
