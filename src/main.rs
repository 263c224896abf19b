use std::io::{self, BufRead};
use std::time::Duration;

use anyhow::Result;
use log::{info, warn};
use serde::Deserialize;

// Module declarations
mod config;
mod dispatcher;
mod error;
mod mailer;
mod snapshot;
mod template;

// Import our modules
use config::{Settings, constants};
use dispatcher::NotificationDispatcher;
use mailer::SmtpMailer;
use snapshot::{SnapshotFetcher, SnapshotSource};
use template::Payload;

/// One host event, decoded from a line of the stdin stream.
///
/// Lifecycle events carry a name and payload; progress ticks carry a percent
/// and optionally the current job's file name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HostEvent {
    Lifecycle {
        event: String,
        #[serde(default)]
        payload: Payload,
    },
    Progress {
        progress: u32,
        #[serde(default)]
        job: Option<String>,
    },
}

/// print-notifier - email notifications for 3D-printer host events.
///
/// Bridges a printer host's event stream into email notifications: reads
/// newline-delimited JSON events from stdin, matches each against the
/// configured per-event rules, and sends templated messages (optionally with
/// a webcam snapshot attached) via SMTP.
///
/// # Event stream format
///
/// ```text
/// {"event": "PrintStarted", "payload": {"name": "benchy.gcode"}}
/// {"event": "PrintDone", "payload": {"name": "benchy.gcode", "time": 5520}}
/// {"progress": 40, "job": "benchy.gcode"}
/// ```
///
/// # Configuration
///
/// Settings come from the JSON file named by `SETTINGS_FILE` (default
/// `./settings.json`), with environment overrides:
/// * `RECIPIENT_ADDRESS` - Address notifications are sent to
/// * `MAIL_SERVER` - SMTP server hostname
/// * `MAIL_USERNAME` - SMTP username, also the sender address
/// * `MAIL_PORT` - SMTP submission port (default: 587)
/// * `SNAPSHOT_URL` - Webcam snapshot URL (optional)
/// * `MAIL_PASSWORD` - SMTP password, never stored in the settings file
///
/// # Usage
///
/// ```bash
/// export MAIL_SERVER="smtp.example.com"
/// export MAIL_USERNAME="printer@example.com"
/// export MAIL_PASSWORD="..."
/// export RECIPIENT_ADDRESS="owner@example.com"
/// export SNAPSHOT_URL="http://camera.local/snapshot.jpg"
/// host-event-stream | ./print-notifier
/// ```
fn main() -> Result<()> {
    // Initialize logger to output to stdout, using RUST_LOG env var or info level by default
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stdout)
        .filter_level(
            std::env::var("RUST_LOG")
                .ok()
                .and_then(|level| level.parse().ok())
                .unwrap_or(log::LevelFilter::Info),
        )
        .init();

    let settings = Settings::load()?;

    info!("print-notifier starting...");
    info!(
        "Using mail server {}:{} as {}",
        settings.mail_server, settings.mail_port, settings.mail_username
    );
    info!(
        "Notifications configured for {} event(s)",
        settings.notifications.len()
    );

    if settings.recipient_address.is_empty() {
        warn!("No recipient address configured; every delivery will fail");
    }

    let mailer = SmtpMailer::new(
        settings.mail_server.clone(),
        settings.mail_port,
        settings.mail_username.clone(),
        std::env::var("MAIL_PASSWORD").ok(),
        Duration::from_secs(constants::SMTP_TIMEOUT_SECONDS),
    );

    let snapshots: Option<Box<dyn SnapshotSource>> = match &settings.snapshot_url {
        Some(url) => {
            let fetcher = SnapshotFetcher::new(
                url.clone(),
                Duration::from_secs(constants::HTTP_TIMEOUT_SECONDS),
            )?;
            info!("Snapshot source: {}", fetcher.url());
            Some(Box::new(fetcher))
        }
        None => {
            info!("No snapshot URL configured; notifications will be text-only");
            None
        }
    };

    let dispatcher = NotificationDispatcher::new(settings, Box::new(mailer), snapshots);

    info!("print-notifier ready. Reading host events from stdin...");

    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<HostEvent>(line) {
            Ok(HostEvent::Lifecycle { event, payload }) => dispatcher.dispatch(&event, &payload),
            Ok(HostEvent::Progress { progress, job }) => {
                dispatcher.dispatch_progress(progress, job.as_deref())
            }
            Err(e) => warn!("Ignoring malformed host event line: {}", e),
        }
    }

    info!("Host event stream closed, shutting down");
    Ok(())
}
