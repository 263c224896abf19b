use std::fmt;

/// Custom error types for the print-notifier services.
///
/// Each service module has its own error enum so that callers can tell a
/// configuration problem apart from a delivery problem. The dispatcher itself
/// never surfaces these to its caller; it logs them and moves on.

/// Errors raised while loading or migrating the settings document.
#[derive(Debug)]
pub enum SettingsError {
    /// Settings file exists but could not be read.
    FileReadError { path: String, reason: String },

    /// Settings document is not valid JSON or does not match the schema.
    ParseError { path: String, reason: String },

    /// A setting (from file or environment override) has an invalid value.
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Errors raised while fetching a webcam snapshot.
#[derive(Debug)]
pub enum SnapshotError {
    /// The HTTP request itself failed (connection, timeout, TLS).
    RequestFailed { url: String, reason: String },

    /// The camera endpoint answered with a non-success status.
    BadStatus { url: String, status: u16 },
}

/// Errors raised while composing or sending a mail message.
#[derive(Debug)]
pub enum MailError {
    /// A sender or recipient address could not be parsed.
    InvalidAddress { address: String, reason: String },

    /// The MIME message could not be assembled.
    BuildFailed { reason: String },

    /// SMTP transport-level failure (connection, authentication, delivery).
    Transport { reason: String },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::FileReadError { path, reason } => {
                write!(f, "Failed to read settings file '{}': {}", path, reason)
            }
            SettingsError::ParseError { path, reason } => {
                write!(f, "Failed to parse settings from '{}': {}", path, reason)
            }
            SettingsError::InvalidValue {
                field,
                value,
                reason,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for setting '{}': {}",
                    value, field, reason
                )
            }
        }
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::RequestFailed { url, reason } => {
                write!(f, "Failed to fetch snapshot from '{}': {}", url, reason)
            }
            SnapshotError::BadStatus { url, status } => {
                write!(f, "Snapshot request to '{}' returned HTTP {}", url, status)
            }
        }
    }
}

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailError::InvalidAddress { address, reason } => {
                write!(f, "Invalid mail address '{}': {}", address, reason)
            }
            MailError::BuildFailed { reason } => {
                write!(f, "Failed to build mail message: {}", reason)
            }
            MailError::Transport { reason } => {
                write!(f, "SMTP transport error: {}", reason)
            }
        }
    }
}

impl std::error::Error for SettingsError {}
impl std::error::Error for SnapshotError {}
impl std::error::Error for MailError {}
