use log::{debug, error, info, warn};
use serde_json::Value;

use crate::config::{NotificationRule, Settings};
use crate::mailer::{BodyPart, MailTransport};
use crate::snapshot::SnapshotSource;
use crate::template::{self, Payload};

/// Event name of the dedicated progress rule.
pub const PROGRESS_EVENT: &str = "Progress";

/// Payload field carrying elapsed seconds, converted to `H:MM:SS` before
/// rendering.
const ELAPSED_TIME_FIELD: &str = "time";

/// Event-to-notification pipeline.
///
/// For each host event the dispatcher looks up the per-event rule, renders
/// the title and body templates from the event payload, optionally fetches a
/// webcam snapshot, and hands the composed message to the mail transport.
///
/// Dispatching never fails from the caller's point of view: a notification
/// problem must not disrupt the host's event flow, so every failure is logged
/// and swallowed here. There is no retry and no queueing; each call sends
/// zero or one message.
pub struct NotificationDispatcher {
    settings: Settings,
    mailer: Box<dyn MailTransport>,
    snapshots: Option<Box<dyn SnapshotSource>>,
}

impl NotificationDispatcher {
    /// Create a new NotificationDispatcher.
    ///
    /// # Arguments
    ///
    /// * `settings` - Configuration snapshot (rules, recipient)
    /// * `mailer` - Mail-sending collaborator
    /// * `snapshots` - Snapshot source; `None` when no snapshot URL is
    ///   configured, in which case rules requesting a snapshot degrade to
    ///   text-only notifications
    pub fn new(
        settings: Settings,
        mailer: Box<dyn MailTransport>,
        snapshots: Option<Box<dyn SnapshotSource>>,
    ) -> Self {
        Self {
            settings,
            mailer,
            snapshots,
        }
    }

    /// Handle a host lifecycle event.
    ///
    /// Looks up the rule registered for `event`; when present and enabled,
    /// renders the templates from `payload` and sends the notification.
    /// Unknown and disabled events are no-ops.
    pub fn dispatch(&self, event: &str, payload: &Payload) {
        let Some(rule) = self.settings.notifications.get(event) else {
            debug!("No notification registered for event '{}'", event);
            return;
        };
        if !rule.enabled {
            debug!("Notification for event '{}' is disabled", event);
            return;
        }

        let payload = humanize_elapsed_time(payload);
        let title = template::render(&rule.title, &payload);
        let body = template::render(&rule.body, &payload);

        self.compose_and_send(event, rule, title, body);
    }

    /// Handle a print-progress tick.
    ///
    /// Fires only for the `Progress` rule, and only when its `step` divides
    /// `progress` evenly, excluding 0% and 100% (completion is covered by the
    /// finished-print event). The synthesized payload carries `progress` and,
    /// when known, the current job's file `name`.
    pub fn dispatch_progress(&self, progress: u32, job_name: Option<&str>) {
        let Some(rule) = self.settings.notifications.get(PROGRESS_EVENT) else {
            return;
        };
        if !rule.enabled {
            return;
        }

        let step = rule.step.unwrap_or(0);
        if step == 0 || progress == 0 || progress % step != 0 || progress == 100 {
            return;
        }

        let mut payload = Payload::new();
        payload.insert("progress".to_string(), Value::from(progress));
        if let Some(name) = job_name {
            payload.insert("name".to_string(), Value::from(name));
        }

        let title = template::render(&rule.title, &payload);
        let body = template::render(&rule.body, &payload);

        self.compose_and_send(PROGRESS_EVENT, rule, title, body);
    }

    /// Compose the body parts (text plus optional snapshot) and hand the
    /// message to the mail transport. Both the snapshot fetch and the send
    /// are best-effort; failures are logged and terminal for this dispatch.
    fn compose_and_send(&self, event: &str, rule: &NotificationRule, title: String, body: String) {
        let mut parts = vec![BodyPart::Text(body)];

        if rule.snapshot {
            match self.snapshots.as_deref() {
                Some(source) => match source.fetch() {
                    Ok(data) => {
                        let filename =
                            format!("snapshot_{}.jpg", chrono::Utc::now().timestamp());
                        parts.push(BodyPart::Attachment { filename, data });
                    }
                    Err(e) => {
                        warn!(
                            "Snapshot error (sending email notification without image): {}",
                            e
                        );
                    }
                },
                None => {
                    warn!(
                        "Notification for '{}' requests a snapshot but no snapshot URL is configured",
                        event
                    );
                }
            }
        }

        match self
            .mailer
            .send(&self.settings.recipient_address, &title, &parts)
        {
            Ok(()) => {
                info!(
                    "{} notification sent to {}",
                    event, self.settings.recipient_address
                );
            }
            Err(e) => {
                error!("Email notification error: {}", e);
            }
        }
    }
}

/// Replace a raw-seconds `time` field with its `H:MM:SS` rendering. All other
/// fields pass through unchanged.
fn humanize_elapsed_time(payload: &Payload) -> Payload {
    let mut payload = payload.clone();
    if let Some(seconds) = payload.get(ELAPSED_TIME_FIELD).and_then(Value::as_f64) {
        payload.insert(
            ELAPSED_TIME_FIELD.to_string(),
            Value::String(template::format_duration(seconds.round() as u64)),
        );
    }
    payload
}
