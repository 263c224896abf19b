use std::collections::HashMap;
use std::fs;
use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SettingsError;

/// Current settings schema version. Documents at older versions are migrated
/// by [`migrate`] before deserialization.
pub const SETTINGS_VERSION: u32 = 2;

/// Per-event notification rule.
///
/// Rules are keyed by event name in [`Settings::notifications`]. The `title`
/// and `body` templates may reference any payload field of the event with
/// `{field}` placeholders; elapsed times arrive pre-formatted as `H:MM:SS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRule {
    /// Whether this event produces a notification at all.
    #[serde(default)]
    pub enabled: bool,

    /// Template for the mail subject line.
    #[serde(default)]
    pub title: String,

    /// Template for the mail body text.
    #[serde(default)]
    pub body: String,

    /// Whether to attach a webcam snapshot to the notification.
    #[serde(default)]
    pub snapshot: bool,

    /// Percent granularity for progress notifications. Only meaningful for
    /// the `Progress` rule; a value of 10 fires at 10%, 20%, ... 90%.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<u32>,
}

/// Notification settings loaded from the JSON settings file with
/// environment-variable overrides.
///
/// The SMTP password is deliberately not part of the settings document; it is
/// resolved out-of-band from the `MAIL_PASSWORD` environment variable when
/// the mailer is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Settings schema version.
    #[serde(default = "latest_version")]
    pub version: u32,

    /// Address notifications are sent to.
    /// Environment variable: `RECIPIENT_ADDRESS`
    #[serde(default)]
    pub recipient_address: String,

    /// SMTP server hostname.
    /// Environment variable: `MAIL_SERVER`
    #[serde(default)]
    pub mail_server: String,

    /// SMTP username, also used as the sender address.
    /// Environment variable: `MAIL_USERNAME`
    #[serde(default)]
    pub mail_username: String,

    /// SMTP submission port.
    /// Environment variable: `MAIL_PORT`
    #[serde(default = "default_mail_port")]
    pub mail_port: u16,

    /// Webcam snapshot URL. When unset, rules requesting a snapshot send
    /// text-only notifications.
    /// Environment variable: `SNAPSHOT_URL`
    #[serde(default)]
    pub snapshot_url: Option<String>,

    /// Per-event notification rules, keyed by event name.
    #[serde(default = "default_notifications")]
    pub notifications: HashMap<String, NotificationRule>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            recipient_address: String::new(),
            mail_server: String::new(),
            mail_username: String::new(),
            mail_port: constants::DEFAULT_MAIL_PORT,
            snapshot_url: None,
            notifications: default_notifications(),
        }
    }
}

impl Settings {
    /// Load settings from the JSON file named by `SETTINGS_FILE` (default
    /// `./settings.json`), migrating older schema versions, then apply
    /// environment-variable overrides for the flat keys.
    ///
    /// A missing settings file is not an error; defaults are used.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if an environment override holds an unparseable value.
    pub fn load() -> Result<Self, SettingsError> {
        let path =
            std::env::var("SETTINGS_FILE").unwrap_or_else(|_| "./settings.json".to_string());

        let mut settings = match fs::read_to_string(&path) {
            Ok(raw) => {
                let mut doc: Value =
                    serde_json::from_str(&raw).map_err(|e| SettingsError::ParseError {
                        path: path.clone(),
                        reason: e.to_string(),
                    })?;
                migrate(&mut doc)?;
                serde_json::from_value(doc).map_err(|e| SettingsError::ParseError {
                    path: path.clone(),
                    reason: e.to_string(),
                })?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Settings::default(),
            Err(e) => {
                return Err(SettingsError::FileReadError {
                    path,
                    reason: e.to_string(),
                });
            }
        };

        settings.apply_env_overrides()?;
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) -> Result<(), SettingsError> {
        if let Ok(value) = std::env::var("RECIPIENT_ADDRESS") {
            self.recipient_address = value;
        }
        if let Ok(value) = std::env::var("MAIL_SERVER") {
            self.mail_server = value;
        }
        if let Ok(value) = std::env::var("MAIL_USERNAME") {
            self.mail_username = value;
        }
        if let Ok(value) = std::env::var("MAIL_PORT") {
            self.mail_port = value
                .parse()
                .map_err(|e: std::num::ParseIntError| SettingsError::InvalidValue {
                    field: "MAIL_PORT".to_string(),
                    value,
                    reason: e.to_string(),
                })?;
        }
        if let Ok(value) = std::env::var("SNAPSHOT_URL") {
            self.snapshot_url = Some(value);
        }
        Ok(())
    }
}

/// Migrate a raw settings document to the current schema version in place.
///
/// Version 1 documents carried three flat notification switches (`enabled`,
/// `include_snapshot`, `message_format`) and no per-event rule map. Migration
/// removes the obsolete keys and resets `notifications` to the current
/// defaults; `recipient_address`, `mail_server` and `mail_username` are
/// preserved as-is.
///
/// Returns `true` if the document was changed.
pub fn migrate(doc: &mut Value) -> Result<bool, SettingsError> {
    let Some(obj) = doc.as_object_mut() else {
        return Ok(false);
    };

    // Documents without a version predate the versioned schema.
    let current = obj.get("version").and_then(Value::as_u64).unwrap_or(1);
    if current >= SETTINGS_VERSION as u64 {
        return Ok(false);
    }

    obj.remove("enabled");
    obj.remove("include_snapshot");
    obj.remove("message_format");

    let defaults =
        serde_json::to_value(default_notifications()).map_err(|e| SettingsError::ParseError {
            path: "built-in defaults".to_string(),
            reason: e.to_string(),
        })?;
    obj.insert("notifications".to_string(), defaults);
    obj.insert("version".to_string(), Value::from(SETTINGS_VERSION));

    Ok(true)
}

/// Stock notification rules for the print lifecycle events.
pub fn default_notifications() -> HashMap<String, NotificationRule> {
    HashMap::from([
        (
            "PrintStarted".to_string(),
            NotificationRule {
                enabled: true,
                title: "Print started {name}".to_string(),
                body: "{name} print started".to_string(),
                snapshot: false,
                step: None,
            },
        ),
        (
            "PrintDone".to_string(),
            NotificationRule {
                enabled: true,
                title: "Print complete: {name}".to_string(),
                body: "{name} done in {time}.".to_string(),
                snapshot: true,
                step: None,
            },
        ),
        (
            "Progress".to_string(),
            NotificationRule {
                enabled: true,
                title: "Printing progress: {name}".to_string(),
                body: "Printing is at {progress}%".to_string(),
                snapshot: true,
                step: Some(10),
            },
        ),
    ])
}

fn latest_version() -> u32 {
    SETTINGS_VERSION
}

fn default_mail_port() -> u16 {
    constants::DEFAULT_MAIL_PORT
}

/// Application constants used throughout the system.
pub mod constants {
    /// Request timeout for webcam snapshot fetches, in seconds.
    pub const HTTP_TIMEOUT_SECONDS: u64 = 10;

    /// Connection and delivery timeout for SMTP sends, in seconds.
    pub const SMTP_TIMEOUT_SECONDS: u64 = 30;

    /// Default SMTP submission port (STARTTLS).
    pub const DEFAULT_MAIL_PORT: u16 = 587;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_cover_the_stock_lifecycle_events() {
        let notifications = default_notifications();
        assert_eq!(notifications.len(), 3);

        let started = &notifications["PrintStarted"];
        assert!(started.enabled);
        assert!(!started.snapshot);
        assert_eq!(started.title, "Print started {name}");

        let done = &notifications["PrintDone"];
        assert!(done.snapshot);
        assert_eq!(done.body, "{name} done in {time}.");

        let progress = &notifications["Progress"];
        assert!(progress.snapshot);
        assert_eq!(progress.step, Some(10));
    }

    #[test]
    fn migrate_resets_rules_and_preserves_mail_settings() {
        let mut doc = json!({
            "recipient_address": "owner@example.com",
            "mail_server": "smtp.example.com",
            "mail_username": "printer@example.com",
            "enabled": true,
            "include_snapshot": false,
            "message_format": "%(filename)s",
        });

        let changed = migrate(&mut doc).expect("migration succeeds");
        assert!(changed);

        let obj = doc.as_object().expect("settings document is an object");
        assert!(obj.get("enabled").is_none());
        assert!(obj.get("include_snapshot").is_none());
        assert!(obj.get("message_format").is_none());
        assert_eq!(obj["version"], json!(SETTINGS_VERSION));

        let settings: Settings = serde_json::from_value(doc).expect("migrated document parses");
        assert_eq!(settings.recipient_address, "owner@example.com");
        assert_eq!(settings.mail_server, "smtp.example.com");
        assert_eq!(settings.mail_username, "printer@example.com");
        assert_eq!(settings.notifications, default_notifications());
    }

    #[test]
    fn migrate_is_a_noop_at_the_current_version() {
        let mut doc = json!({
            "version": SETTINGS_VERSION,
            "recipient_address": "owner@example.com",
            "notifications": {
                "PrintDone": {
                    "enabled": false,
                    "title": "custom",
                    "body": "custom",
                    "snapshot": false,
                }
            }
        });
        let before = doc.clone();

        let changed = migrate(&mut doc).expect("migration succeeds");
        assert!(!changed);
        assert_eq!(doc, before);
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let settings: Settings = serde_json::from_value(json!({})).expect("empty document parses");
        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.mail_port, constants::DEFAULT_MAIL_PORT);
        assert!(settings.snapshot_url.is_none());
        assert_eq!(settings.notifications, default_notifications());
    }

    #[test]
    fn rule_step_roundtrips_through_json() {
        let rule = NotificationRule {
            enabled: true,
            title: "t".to_string(),
            body: "b".to_string(),
            snapshot: true,
            step: Some(25),
        };
        let value = serde_json::to_value(&rule).expect("rule serializes");
        assert_eq!(value["step"], json!(25));

        let back: NotificationRule = serde_json::from_value(value).expect("rule deserializes");
        assert_eq!(back, rule);
    }
}
