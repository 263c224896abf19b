//! print-notifier - email notifications for 3D-printer host events.
//!
//! This library turns host lifecycle events (print started, print done,
//! progress ticks) into templated email notifications, optionally attaching a
//! webcam snapshot.
//!
//! # Core Components
//!
//! * [`config`] - Settings model, defaults, env overrides and schema migration
//! * [`template`] - Tolerant `{field}` substitution and duration formatting
//! * [`dispatcher`] - The event-to-notification pipeline
//! * [`snapshot`] - Webcam snapshot fetching
//! * [`mailer`] - SMTP mail transport with attachment support
//! * [`error`] - Typed error enums for the service seams
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use print_notifier::*;
//!
//! let settings = Settings::load().expect("settings load");
//! let mailer = SmtpMailer::new(
//!     settings.mail_server.clone(),
//!     settings.mail_port,
//!     settings.mail_username.clone(),
//!     std::env::var("MAIL_PASSWORD").ok(),
//!     Duration::from_secs(30),
//! );
//! let dispatcher = NotificationDispatcher::new(settings, Box::new(mailer), None);
//!
//! let mut payload = Payload::new();
//! payload.insert("name".to_string(), "benchy.gcode".into());
//! dispatcher.dispatch("PrintStarted", &payload);
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod mailer;
pub mod snapshot;
pub mod template;

// Re-export commonly used types for convenience
pub use config::{NotificationRule, Settings};
pub use dispatcher::NotificationDispatcher;
pub use error::{MailError, SettingsError, SnapshotError};
pub use mailer::{BodyPart, MailTransport, SmtpMailer};
pub use snapshot::{SnapshotFetcher, SnapshotSource};
pub use template::Payload;
