//! Shared types for pocket-mcp components.
//!
//! This crate provides the tool catalogue records returned by `tools/list`, the
//! `initialize` handshake payload, and the argument payloads for the device
//! capability tools. All types are serializable for RPC transport.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// MCP protocol version sent during `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Client name reported during `initialize`
pub const CLIENT_NAME: &str = "PocketMCPRustClient";

/// Optional string arguments are omitted when absent or empty
#[allow(clippy::ref_option)] // serde's skip_serializing_if passes &Option<T>
fn is_unset(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

#[allow(clippy::ref_option)] // serde's skip_serializing_if passes &Option<T>
fn is_empty_map(value: &Option<BTreeMap<String, String>>) -> bool {
    value.as_ref().is_none_or(BTreeMap::is_empty)
}

/// Deserialize a string that may be null or missing (both become empty string)
fn deserialize_null_as_empty_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// Deserialize free text that servers sometimes send as a structured value.
/// Null or missing becomes `None`; any other non-string keeps its JSON text.
fn deserialize_lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

// ============================================================================
// Handshake
// ============================================================================

/// Client identity reported to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// Parameters of the `initialize` request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    pub client_info: ClientInfo,
    pub capabilities: Map<String, Value>,
}

impl InitializeParams {
    #[must_use]
    pub fn new(client_version: impl Into<String>) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            client_info: ClientInfo {
                name: CLIENT_NAME.to_string(),
                version: client_version.into(),
            },
            capabilities: Map::new(),
        }
    }
}

// ============================================================================
// Tool catalogue
// ============================================================================

/// One entry of the `tools/list` result as the server reports it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
    #[serde(default, deserialize_with = "deserialize_null_as_empty_string")]
    pub name: String,

    #[serde(
        default,
        deserialize_with = "deserialize_lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,

    /// Remaining members (`title`, `annotations`, `outputSchema`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Tool schema in the shape agent frameworks expect (`input_schema`, never absent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl From<ToolInfo> for ToolSchema {
    fn from(tool: ToolInfo) -> Self {
        Self {
            name: tool.name,
            description: tool.description.unwrap_or_default(),
            input_schema: tool
                .input_schema
                .unwrap_or_else(|| serde_json::json!({"type": "object", "properties": {}})),
        }
    }
}

// ============================================================================
// Capability arguments
// ============================================================================

/// Arguments for the `send_message` tool
#[derive(Debug, Clone, Serialize)]
pub struct SendMessage {
    pub app: String,
    pub message: String,
    pub strict_screen_state: bool,
    #[serde(skip_serializing_if = "is_unset")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "is_unset")]
    pub contact_name: Option<String>,
    #[serde(skip_serializing_if = "is_unset")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "is_unset")]
    pub whatsapp_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict_contact_match: Option<bool>,
}

impl SendMessage {
    #[must_use]
    pub fn new(app: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            message: message.into(),
            strict_screen_state: true,
            phone_number: None,
            contact_name: None,
            username: None,
            whatsapp_type: None,
            strict_contact_match: None,
        }
    }
}

/// Arguments for the `send_whatsapp_business_message` tool
#[derive(Debug, Clone, Serialize)]
pub struct WhatsAppBusinessMessage {
    pub contact_name: String,
    pub message: String,
    pub strict_contact_match: bool,
    pub strict_screen_state: bool,
    #[serde(skip_serializing_if = "is_unset")]
    pub phone_number: Option<String>,
}

impl WhatsAppBusinessMessage {
    #[must_use]
    pub fn new(contact_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            contact_name: contact_name.into(),
            message: message.into(),
            strict_contact_match: true,
            strict_screen_state: true,
            phone_number: None,
        }
    }
}

/// Arguments for the `whatsapp_automation` tool
#[derive(Debug, Clone, Serialize)]
pub struct WhatsAppAutomation {
    pub action: String,
    pub whatsapp_type: String,
    #[serde(skip_serializing_if = "is_unset")]
    pub contact_name: Option<String>,
    #[serde(skip_serializing_if = "is_unset")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "is_unset")]
    pub phone_number: Option<String>,
}

impl WhatsAppAutomation {
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            whatsapp_type: "business".to_string(),
            contact_name: None,
            message: None,
            phone_number: None,
        }
    }
}

/// Arguments for the `social_media` tool
#[derive(Debug, Clone, Serialize)]
pub struct SocialMedia {
    pub platform: String,
    pub action: String,
    pub strict_screen_state: bool,
    #[serde(skip_serializing_if = "is_unset")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "is_unset")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "is_unset")]
    pub content_url: Option<String>,
    #[serde(skip_serializing_if = "is_unset")]
    pub text: Option<String>,
}

impl SocialMedia {
    #[must_use]
    pub fn new(platform: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            action: action.into(),
            strict_screen_state: true,
            query: None,
            username: None,
            content_url: None,
            text: None,
        }
    }
}

/// Arguments for the `notifications` tool
///
/// `query` and `index` are sent whenever they are set, even when empty.
#[derive(Debug, Clone, Serialize)]
pub struct Notifications {
    pub action: String,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
}

impl Default for Notifications {
    fn default() -> Self {
        Self {
            action: "list".to_string(),
            limit: 20,
            query: None,
            index: None,
        }
    }
}

/// Arguments for the `tap` tool
///
/// Either a text selector (`text` / `content_description`) or both coordinates
/// must be present.
#[derive(Debug, Clone, Serialize)]
pub struct Tap {
    pub strict_screen_state: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<i64>,
}

impl Default for Tap {
    fn default() -> Self {
        Self {
            strict_screen_state: true,
            text: None,
            content_description: None,
            x: None,
            y: None,
        }
    }
}

impl Tap {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn at(x: i64, y: i64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }
}

/// Arguments for the `volume_control` tool
#[derive(Debug, Clone, Serialize)]
pub struct VolumeControl {
    pub action: String,
    pub stream: String,
    pub steps: u32,
    pub show_ui: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

impl Default for VolumeControl {
    fn default() -> Self {
        Self {
            action: "status".to_string(),
            stream: "music".to_string(),
            steps: 1,
            show_ui: false,
            level: None,
        }
    }
}

/// Arguments for the `voice_record` tool
#[derive(Debug, Clone, Serialize)]
pub struct VoiceRecord {
    pub action: String,
    pub duration_seconds: u32,
    #[serde(skip_serializing_if = "is_unset")]
    pub filename_prefix: Option<String>,
}

impl Default for VoiceRecord {
    fn default() -> Self {
        Self {
            action: "record".to_string(),
            duration_seconds: 6,
            filename_prefix: None,
        }
    }
}

/// Arguments for the `transcribe_audio` tool
#[derive(Debug, Clone, Serialize)]
pub struct TranscribeAudio {
    pub action: String,
    pub duration_seconds: u32,
    pub language_tag: String,
    pub prefer_offline: bool,
    #[serde(skip_serializing_if = "is_unset")]
    pub audio_path: Option<String>,
}

impl Default for TranscribeAudio {
    fn default() -> Self {
        Self {
            action: "listen".to_string(),
            duration_seconds: 8,
            language_tag: "en-US".to_string(),
            prefer_offline: true,
            audio_path: None,
        }
    }
}

/// Arguments for the `transcribe_whatsapp_audio` tool
#[derive(Debug, Clone, Serialize)]
pub struct TranscribeWhatsAppAudio {
    pub whatsapp_type: String,
    pub language_tag: String,
    pub prefer_offline: bool,
    #[serde(skip_serializing_if = "is_unset")]
    pub contact_name: Option<String>,
    #[serde(skip_serializing_if = "is_unset")]
    pub raw_command: Option<String>,
}

impl Default for TranscribeWhatsAppAudio {
    fn default() -> Self {
        Self {
            whatsapp_type: "business".to_string(),
            language_tag: "en-US".to_string(),
            prefer_offline: true,
            contact_name: None,
            raw_command: None,
        }
    }
}

/// Arguments for the `http_request` tool (the device performs the request)
#[derive(Debug, Clone, Serialize)]
pub struct HttpRequest {
    pub url: String,
    pub method: String,
    pub timeout_seconds: u32,
    #[serde(skip_serializing_if = "is_empty_map")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl HttpRequest {
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            timeout_seconds: 20,
            headers: None,
            body: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_initialize_params_serialization() {
        let params = InitializeParams::new("1.2.3");
        let value = serde_json::to_value(&params).unwrap();

        assert_eq!(value["protocolVersion"], "2024-11-05");
        assert_eq!(value["clientInfo"]["name"], CLIENT_NAME);
        assert_eq!(value["clientInfo"]["version"], "1.2.3");
        assert_eq!(value["capabilities"], json!({}));
    }

    #[test]
    fn test_tool_info_deserialization() {
        let json = r#"{"name":"shell","description":"Run a command","inputSchema":{"type":"object"}}"#;
        let tool: ToolInfo = serde_json::from_str(json).unwrap();

        assert_eq!(tool.name, "shell");
        assert_eq!(tool.description.as_deref(), Some("Run a command"));
        assert_eq!(tool.input_schema, Some(json!({"type": "object"})));
    }

    #[test]
    fn test_tool_info_missing_fields() {
        let tool: ToolInfo = serde_json::from_str(r#"{"name":null}"#).unwrap();
        assert_eq!(tool.name, "");
        assert!(tool.description.is_none());
        assert!(tool.input_schema.is_none());
    }

    #[test]
    fn test_tool_info_keeps_extra_members() {
        let entry = json!({
            "name": "shell",
            "title": "Shell",
            "description": {"en": "Run a command"},
            "inputSchema": {"type": "object"},
            "annotations": {"destructiveHint": true}
        });
        let tool: ToolInfo = serde_json::from_value(entry).unwrap();

        assert_eq!(tool.description.as_deref(), Some(r#"{"en":"Run a command"}"#));
        assert_eq!(tool.extra["title"], "Shell");
        assert_eq!(tool.extra["annotations"], json!({"destructiveHint": true}));
        assert!(!tool.extra.contains_key("inputSchema"));

        let rendered = serde_json::to_value(&tool).unwrap();
        assert_eq!(rendered["title"], "Shell");
        assert_eq!(rendered["annotations"]["destructiveHint"], true);
        assert_eq!(rendered["inputSchema"], json!({"type": "object"}));
    }

    #[test]
    fn test_tool_schema_defaults() {
        let schema = ToolSchema::from(ToolInfo {
            name: "device_info".to_string(),
            ..Default::default()
        });

        assert_eq!(schema.name, "device_info");
        assert_eq!(schema.description, "");
        assert_eq!(
            schema.input_schema,
            json!({"type": "object", "properties": {}})
        );
    }

    #[test]
    fn test_send_message_omits_empty_optionals() {
        let mut args = SendMessage::new("whatsapp", "hi");
        args.phone_number = Some(String::new());
        args.contact_name = Some("Alice".to_string());

        let value = serde_json::to_value(&args).unwrap();
        assert_eq!(
            value,
            json!({
                "app": "whatsapp",
                "message": "hi",
                "strict_screen_state": true,
                "contact_name": "Alice"
            })
        );
    }

    #[test]
    fn test_send_message_keeps_explicit_false_match() {
        let mut args = SendMessage::new("sms", "");
        args.strict_contact_match = Some(false);

        let value = serde_json::to_value(&args).unwrap();
        assert_eq!(value["strict_contact_match"], false);
    }

    #[test]
    fn test_notifications_keeps_empty_query() {
        let args = Notifications {
            query: Some(String::new()),
            ..Default::default()
        };

        let value = serde_json::to_value(&args).unwrap();
        assert_eq!(value, json!({"action": "list", "limit": 20, "query": ""}));
    }

    #[test]
    fn test_tap_coordinates() {
        let value = serde_json::to_value(Tap::at(10, 20)).unwrap();
        assert_eq!(
            value,
            json!({"strict_screen_state": true, "x": 10, "y": 20})
        );
    }

    #[test]
    fn test_http_request_skips_empty_headers() {
        let mut args = HttpRequest::get("https://example.com");
        args.headers = Some(BTreeMap::new());
        args.body = Some(String::new());

        let value = serde_json::to_value(&args).unwrap();
        assert!(value.get("headers").is_none());
        assert_eq!(value["body"], "");
        assert_eq!(value["timeout_seconds"], 20);
    }

    #[test]
    fn test_defaults_match_tool_contract() {
        let volume = serde_json::to_value(VolumeControl::default()).unwrap();
        assert_eq!(
            volume,
            json!({"action": "status", "stream": "music", "steps": 1, "show_ui": false})
        );

        let transcribe = serde_json::to_value(TranscribeAudio::default()).unwrap();
        assert_eq!(transcribe["language_tag"], "en-US");
        assert_eq!(transcribe["duration_seconds"], 8);

        let automation = serde_json::to_value(WhatsAppAutomation::new("open_chat")).unwrap();
        assert_eq!(automation["whatsapp_type"], "business");
    }
}
