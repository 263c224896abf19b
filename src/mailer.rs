use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::error::MailError;

/// One ordered element of a notification body: plain text or a named binary
/// attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyPart {
    /// Plain text content.
    Text(String),

    /// Binary attachment with the filename shown to the recipient.
    Attachment { filename: String, data: Vec<u8> },
}

/// Mail-sending collaborator the dispatcher hands composed messages to.
///
/// Implemented by [`SmtpMailer`] in production and by recording mocks in
/// tests.
pub trait MailTransport {
    /// Send one message to `to` with the given subject and body parts.
    ///
    /// # Errors
    ///
    /// Returns an error if an address is invalid, the message cannot be
    /// assembled, or SMTP delivery fails.
    fn send(&self, to: &str, subject: &str, parts: &[BodyPart]) -> Result<(), MailError>;
}

/// SMTP mail transport.
///
/// Connects per send over STARTTLS, authenticating with the configured
/// username when a password is available. The username doubles as the sender
/// address. Connection and delivery are bounded by a timeout so a stalled
/// SMTP server cannot hang the event-delivery thread.
pub struct SmtpMailer {
    server: String,
    port: u16,
    username: String,
    password: Option<String>,
    timeout: Duration,
}

impl SmtpMailer {
    /// Create a new SmtpMailer.
    ///
    /// # Arguments
    ///
    /// * `server` - SMTP server hostname
    /// * `port` - SMTP submission port (typically 587)
    /// * `username` - SMTP username, also used as the From address
    /// * `password` - SMTP password; `None` sends unauthenticated
    /// * `timeout` - Bound on connecting and delivering one message
    pub fn new(
        server: String,
        port: u16,
        username: String,
        password: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            server,
            port,
            username,
            password,
            timeout,
        }
    }

    fn build_transport(&self) -> Result<SmtpTransport, MailError> {
        let mut builder = SmtpTransport::starttls_relay(&self.server)
            .map_err(|e| MailError::Transport {
                reason: e.to_string(),
            })?
            .port(self.port)
            .timeout(Some(self.timeout));

        if let Some(password) = &self.password {
            builder = builder.credentials(Credentials::new(
                self.username.clone(),
                password.clone(),
            ));
        }

        Ok(builder.build())
    }

    fn build_message(
        &self,
        to: &str,
        subject: &str,
        parts: &[BodyPart],
    ) -> Result<Message, MailError> {
        let from: Mailbox = self
            .username
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError::InvalidAddress {
                address: self.username.clone(),
                reason: e.to_string(),
            })?;
        let to: Mailbox =
            to.parse()
                .map_err(|e: lettre::address::AddressError| MailError::InvalidAddress {
                    address: to.to_string(),
                    reason: e.to_string(),
                })?;

        let builder = Message::builder().from(from).to(to).subject(subject);

        let has_attachment = parts
            .iter()
            .any(|p| matches!(p, BodyPart::Attachment { .. }));

        if !has_attachment {
            let text = parts
                .iter()
                .filter_map(|p| match p {
                    BodyPart::Text(text) => Some(text.as_str()),
                    BodyPart::Attachment { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n");
            return builder
                .header(ContentType::TEXT_PLAIN)
                .body(text)
                .map_err(|e| MailError::BuildFailed {
                    reason: e.to_string(),
                });
        }

        let mut multipart = MultiPart::mixed().build();
        for part in parts {
            match part {
                BodyPart::Text(text) => {
                    multipart = multipart.singlepart(SinglePart::plain(text.clone()));
                }
                BodyPart::Attachment { filename, data } => {
                    let content_type = ContentType::parse(sniff_content_type(data)).map_err(
                        |e| MailError::BuildFailed {
                            reason: e.to_string(),
                        },
                    )?;
                    multipart = multipart.singlepart(
                        Attachment::new(filename.clone()).body(data.clone(), content_type),
                    );
                }
            }
        }

        builder
            .multipart(multipart)
            .map_err(|e| MailError::BuildFailed {
                reason: e.to_string(),
            })
    }
}

impl MailTransport for SmtpMailer {
    fn send(&self, to: &str, subject: &str, parts: &[BodyPart]) -> Result<(), MailError> {
        let message = self.build_message(to, subject, parts)?;
        let transport = self.build_transport()?;
        transport.send(&message).map_err(|e| MailError::Transport {
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

/// Guess an attachment content type from its leading bytes.
///
/// Webcam endpoints mostly serve JPEG but some are configured for PNG; the
/// attachment header should match what was actually fetched.
fn sniff_content_type(data: &[u8]) -> &'static str {
    match image::guess_format(data) {
        Ok(image::ImageFormat::Jpeg) => "image/jpeg",
        Ok(image::ImageFormat::Png) => "image/png",
        Ok(image::ImageFormat::Gif) => "image/gif",
        Ok(image::ImageFormat::WebP) => "image/webp",
        _ => "application/octet-stream",
    }
}
