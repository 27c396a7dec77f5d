//! Device capability wrappers.
//!
//! One method per server tool. Each checks its required arguments, then
//! makes a single [`call_tool`](PocketClient::call_tool) and returns the
//! decoded result.

use pocket_types::{
    HttpRequest, Notifications, SendMessage, SocialMedia, Tap, TranscribeAudio,
    TranscribeWhatsAppAudio, VoiceRecord, VolumeControl, WhatsAppAutomation,
    WhatsAppBusinessMessage,
};
use serde_json::{Map, Value, json};

use crate::client::PocketClient;
use crate::error::{ClientError, Result};
use crate::helpers::require_non_empty;

pub const DEFAULT_CONTACT_LIMIT: u32 = 10;
pub const DEFAULT_APP_LIMIT: u32 = 50;
pub const DEFAULT_SHELL_TIMEOUT_SECS: u32 = 10;
pub const DEFAULT_SCROLL_RATIO: f64 = 0.55;
pub const DEFAULT_SCROLL_DURATION_MS: u32 = 320;
pub const DEFAULT_LANGUAGE_TAG: &str = "en-US";

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Shared argument object for `launch_app` / `close_app`.
fn app_target(package_name: Option<&str>, app_name: Option<&str>) -> Result<Map<String, Value>> {
    let package_name = non_empty(package_name);
    let app_name = non_empty(app_name);
    if package_name.is_none() && app_name.is_none() {
        return Err(ClientError::validation("Provide package_name or app_name"));
    }

    let mut args = Map::new();
    if let Some(package_name) = package_name {
        args.insert("package_name".into(), json!(package_name));
    }
    if let Some(app_name) = app_name {
        args.insert("app_name".into(), json!(app_name));
    }
    Ok(args)
}

/// A tap needs a text selector or a full coordinate pair.
fn check_tap(tap: &Tap) -> Result<()> {
    let has_selector = [&tap.text, &tap.content_description]
        .into_iter()
        .any(|s| s.as_deref().is_some_and(|s| !s.trim().is_empty()));

    match (tap.x, tap.y) {
        (Some(_), None) | (None, Some(_)) => Err(ClientError::validation(
            "Both x and y are required when tapping by coordinates",
        )),
        (None, None) if !has_selector => Err(ClientError::validation(
            "Provide text/content_description or both x and y",
        )),
        _ => Ok(()),
    }
}

fn check_http_request(request: &HttpRequest) -> Result<()> {
    require_non_empty(&request.url, "url")?;
    if !(request.url.starts_with("http://") || request.url.starts_with("https://")) {
        return Err(ClientError::validation(
            "url must start with http:// or https://",
        ));
    }
    require_non_empty(&request.method, "method")
}

impl PocketClient {
    // ------------------------------------------------------------------
    // Device state
    // ------------------------------------------------------------------

    /// # Errors
    ///
    /// Any error from [`call_tool`](Self::call_tool).
    pub async fn device_info(&mut self) -> Result<Value> {
        self.call_tool("device_info", None).await
    }

    /// # Errors
    ///
    /// Any error from [`call_tool`](Self::call_tool).
    pub async fn get_location(&mut self) -> Result<Value> {
        self.call_tool("get_location", None).await
    }

    /// Query the notification shade (`list`, `search`, `open`, `dismiss`, ...).
    ///
    /// # Errors
    ///
    /// `ClientError::Validation` if `action` is empty.
    pub async fn notifications(&mut self, args: &Notifications) -> Result<Value> {
        require_non_empty(&args.action, "action")?;
        self.call_tool_with("notifications", args).await
    }

    /// # Errors
    ///
    /// `ClientError::Validation` if `action` is empty.
    pub async fn flashlight(&mut self, action: &str, camera_id: Option<&str>) -> Result<Value> {
        require_non_empty(action, "action")?;
        let mut args = json!({ "action": action });
        if let Some(camera_id) = non_empty(camera_id) {
            args["camera_id"] = json!(camera_id);
        }
        self.call_tool("flashlight", Some(args)).await
    }

    /// # Errors
    ///
    /// `ClientError::Validation` if `action` or `stream` is empty.
    pub async fn volume_control(&mut self, args: &VolumeControl) -> Result<Value> {
        require_non_empty(&args.action, "action")?;
        require_non_empty(&args.stream, "stream")?;
        self.call_tool_with("volume_control", args).await
    }

    /// Ring and/or vibrate the phone (`ring`, `vibrate`, `both`).
    ///
    /// # Errors
    ///
    /// `ClientError::Validation` if `action` is empty.
    pub async fn phone_alert(&mut self, action: &str, duration_seconds: u32) -> Result<Value> {
        require_non_empty(action, "action")?;
        self.call_tool(
            "phone_alert",
            Some(json!({ "action": action, "duration_seconds": duration_seconds })),
        )
        .await
    }

    /// # Errors
    ///
    /// Any error from [`call_tool`](Self::call_tool).
    pub async fn ring_phone(&mut self, duration_seconds: u32) -> Result<Value> {
        self.phone_alert("ring", duration_seconds).await
    }

    /// # Errors
    ///
    /// Any error from [`call_tool`](Self::call_tool).
    pub async fn vibrate_phone(&mut self, duration_seconds: u32) -> Result<Value> {
        self.phone_alert("vibrate", duration_seconds).await
    }

    // ------------------------------------------------------------------
    // Contacts and messaging
    // ------------------------------------------------------------------

    /// # Errors
    ///
    /// `ClientError::Validation` if `query` is empty.
    pub async fn search_contacts(&mut self, query: &str, limit: u32) -> Result<Value> {
        require_non_empty(query, "query")?;
        self.call_tool(
            "search_contacts",
            Some(json!({ "query": query, "limit": limit })),
        )
        .await
    }

    /// # Errors
    ///
    /// `ClientError::Validation` if `phone_number` is empty.
    pub async fn make_call(
        &mut self,
        phone_number: &str,
        contact_name: Option<&str>,
    ) -> Result<Value> {
        require_non_empty(phone_number, "phone_number")?;
        let mut args = json!({ "phone_number": phone_number });
        if let Some(contact_name) = non_empty(contact_name) {
            args["contact_name"] = json!(contact_name);
        }
        self.call_tool("make_call", Some(args)).await
    }

    /// # Errors
    ///
    /// `ClientError::Validation` if `app` is empty.
    pub async fn send_message(&mut self, args: &SendMessage) -> Result<Value> {
        require_non_empty(&args.app, "app")?;
        self.call_tool_with("send_message", args).await
    }

    /// # Errors
    ///
    /// `ClientError::Validation` if `contact_name` or `message` is empty.
    pub async fn send_whatsapp_business_message(
        &mut self,
        args: &WhatsAppBusinessMessage,
    ) -> Result<Value> {
        require_non_empty(&args.contact_name, "contact_name")?;
        require_non_empty(&args.message, "message")?;
        self.call_tool_with("send_whatsapp_business_message", args)
            .await
    }

    /// # Errors
    ///
    /// `ClientError::Validation` if `action` is empty.
    pub async fn whatsapp_automation(&mut self, args: &WhatsAppAutomation) -> Result<Value> {
        require_non_empty(&args.action, "action")?;
        self.call_tool_with("whatsapp_automation", args).await
    }

    /// # Errors
    ///
    /// `ClientError::Validation` if `platform` or `action` is empty.
    pub async fn social_media(&mut self, args: &SocialMedia) -> Result<Value> {
        require_non_empty(&args.platform, "platform")?;
        require_non_empty(&args.action, "action")?;
        self.call_tool_with("social_media", args).await
    }

    /// App-specific action; `extra` is merged into the arguments.
    ///
    /// # Errors
    ///
    /// `ClientError::Validation` if `app` or `action` is empty.
    pub async fn app_actions(
        &mut self,
        app: &str,
        action: &str,
        extra: Map<String, Value>,
    ) -> Result<Value> {
        require_non_empty(app, "app")?;
        require_non_empty(action, "action")?;

        let mut args = extra;
        args.insert("app".into(), json!(app));
        args.insert("action".into(), json!(action));
        self.call_tool("app_actions", Some(Value::Object(args)))
            .await
    }

    // ------------------------------------------------------------------
    // Apps and screen
    // ------------------------------------------------------------------

    /// # Errors
    ///
    /// `ClientError::Validation` unless a package or app name is given.
    pub async fn launch_app(
        &mut self,
        package_name: Option<&str>,
        app_name: Option<&str>,
    ) -> Result<Value> {
        let args = app_target(package_name, app_name)?;
        self.call_tool("launch_app", Some(Value::Object(args)))
            .await
    }

    /// Close an app. The server handles this through `launch_app` with
    /// `action: "close"`.
    ///
    /// # Errors
    ///
    /// `ClientError::Validation` unless a package or app name is given.
    pub async fn close_app(
        &mut self,
        package_name: Option<&str>,
        app_name: Option<&str>,
    ) -> Result<Value> {
        let mut args = app_target(package_name, app_name)?;
        args.insert("action".into(), json!("close"));
        self.call_tool("launch_app", Some(Value::Object(args)))
            .await
    }

    /// # Errors
    ///
    /// Any error from [`call_tool`](Self::call_tool).
    pub async fn list_apps(&mut self, query: Option<&str>, limit: u32) -> Result<Value> {
        let mut args = json!({ "limit": limit });
        if let Some(query) = non_empty(query) {
            args["query"] = json!(query);
        }
        self.call_tool("list_apps", Some(args)).await
    }

    /// Accessibility global action (`back`, `home`, `recents`, ...).
    ///
    /// # Errors
    ///
    /// `ClientError::Validation` if `action` is empty.
    pub async fn global_action(&mut self, action: &str) -> Result<Value> {
        require_non_empty(action, "action")?;
        self.call_tool("global_action", Some(json!({ "action": action })))
            .await
    }

    /// # Errors
    ///
    /// `ClientError::Validation` if `direction` is empty.
    pub async fn scroll_screen(
        &mut self,
        direction: &str,
        distance_ratio: f64,
        duration_ms: u32,
    ) -> Result<Value> {
        require_non_empty(direction, "direction")?;
        self.call_tool(
            "scroll_screen",
            Some(json!({
                "direction": direction,
                "distance_ratio": distance_ratio,
                "duration_ms": duration_ms,
            })),
        )
        .await
    }

    /// # Errors
    ///
    /// `ClientError::Validation` if only one coordinate is given, or neither
    /// a text selector nor coordinates are.
    pub async fn tap(&mut self, args: &Tap) -> Result<Value> {
        check_tap(args)?;
        self.call_tool_with("tap", args).await
    }

    // ------------------------------------------------------------------
    // Audio
    // ------------------------------------------------------------------

    /// # Errors
    ///
    /// `ClientError::Validation` if `action` is empty.
    pub async fn voice_record(&mut self, args: &VoiceRecord) -> Result<Value> {
        require_non_empty(&args.action, "action")?;
        self.call_tool_with("voice_record", args).await
    }

    /// # Errors
    ///
    /// Any error from [`call_tool`](Self::call_tool).
    pub async fn record_voice_note(
        &mut self,
        duration_seconds: u32,
        filename_prefix: &str,
    ) -> Result<Value> {
        let args = VoiceRecord {
            duration_seconds,
            filename_prefix: Some(filename_prefix.to_string()),
            ..VoiceRecord::default()
        };
        self.voice_record(&args).await
    }

    /// # Errors
    ///
    /// `ClientError::Validation` if `action` or `language_tag` is empty.
    pub async fn transcribe_audio(&mut self, args: &TranscribeAudio) -> Result<Value> {
        require_non_empty(&args.action, "action")?;
        require_non_empty(&args.language_tag, "language_tag")?;
        self.call_tool_with("transcribe_audio", args).await
    }

    /// Record from the microphone and transcribe.
    ///
    /// # Errors
    ///
    /// `ClientError::Validation` if `language_tag` is empty.
    pub async fn listen_and_transcribe(
        &mut self,
        duration_seconds: u32,
        language_tag: &str,
        prefer_offline: bool,
    ) -> Result<Value> {
        let args = TranscribeAudio {
            action: "listen".to_string(),
            duration_seconds,
            language_tag: language_tag.to_string(),
            prefer_offline,
            audio_path: None,
        };
        self.transcribe_audio(&args).await
    }

    /// # Errors
    ///
    /// `ClientError::Validation` if `audio_path` or `language_tag` is empty.
    pub async fn transcribe_file(
        &mut self,
        audio_path: &str,
        language_tag: &str,
        prefer_offline: bool,
    ) -> Result<Value> {
        require_non_empty(audio_path, "audio_path")?;
        require_non_empty(language_tag, "language_tag")?;
        self.call_tool(
            "transcribe_file",
            Some(json!({
                "audio_path": audio_path,
                "language_tag": language_tag,
                "prefer_offline": prefer_offline,
            })),
        )
        .await
    }

    /// # Errors
    ///
    /// `ClientError::Validation` if `whatsapp_type` or `language_tag` is empty.
    pub async fn transcribe_whatsapp_audio(
        &mut self,
        args: &TranscribeWhatsAppAudio,
    ) -> Result<Value> {
        require_non_empty(&args.whatsapp_type, "whatsapp_type")?;
        require_non_empty(&args.language_tag, "language_tag")?;
        self.call_tool_with("transcribe_whatsapp_audio", args)
            .await
    }

    // ------------------------------------------------------------------
    // General purpose
    // ------------------------------------------------------------------

    /// # Errors
    ///
    /// `ClientError::Validation` if `command` is empty.
    pub async fn shell(&mut self, command: &str, timeout_seconds: u32) -> Result<Value> {
        require_non_empty(command, "command")?;
        self.call_tool(
            "shell",
            Some(json!({ "command": command, "timeout_seconds": timeout_seconds })),
        )
        .await
    }

    /// Free-form instruction for the on-device agent.
    ///
    /// # Errors
    ///
    /// `ClientError::Validation` if `command` is empty.
    pub async fn human_command(&mut self, command: &str) -> Result<Value> {
        require_non_empty(command, "command")?;
        self.call_tool("human_command", Some(json!({ "command": command })))
            .await
    }

    /// Have the device perform an HTTP request.
    ///
    /// # Errors
    ///
    /// `ClientError::Validation` if `url` is empty or not http(s), or `method`
    /// is empty.
    pub async fn http_request(&mut self, args: &HttpRequest) -> Result<Value> {
        check_http_request(args)?;
        self.call_tool_with("http_request", args).await
    }

    /// # Errors
    ///
    /// `ClientError::Validation` if `path` is empty.
    pub async fn read_file(&mut self, path: &str, max_bytes: Option<u64>) -> Result<Value> {
        require_non_empty(path, "path")?;
        let mut args = json!({ "path": path });
        if let Some(max_bytes) = max_bytes {
            args["max_bytes"] = json!(max_bytes);
        }
        self.call_tool("read_file", Some(args)).await
    }
}
