use std::fs;
use std::path::PathBuf;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::SmtpSettings;
use crate::error::{BillError, Result};

/// One outbound notification: bodies, attachment, and the invoice
/// number it belongs to (used in error reporting).
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub reference: String,
    pub to: String,
    pub subject: String,
    pub plain_body: String,
    pub html_body: String,
    pub attachment_name: String,
    pub attachment: Vec<u8>,
    pub sender_name: String,
}

/// Delivers a notification message. Send is fire-once: no internal
/// retry, failures surface to the caller.
pub trait Messenger {
    fn send(&self, message: &OutgoingMessage) -> Result<()>;
}

/// SMTP delivery via lettre, multipart plain+HTML with the rendered
/// invoice attached.
pub struct SmtpMessenger {
    settings: SmtpSettings,
}

impl SmtpMessenger {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    fn delivery_err(reference: &str, reason: impl ToString) -> BillError {
        BillError::Delivery {
            invoice: reference.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl Messenger for SmtpMessenger {
    fn send(&self, message: &OutgoingMessage) -> Result<()> {
        let from: Mailbox = format!("{} <{}>", message.sender_name, self.settings.from_email)
            .parse()
            .map_err(|e| Self::delivery_err(&message.reference, e))?;
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| Self::delivery_err(&message.reference, e))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone())
            .multipart(
                MultiPart::mixed()
                    .multipart(
                        MultiPart::alternative()
                            .singlepart(
                                SinglePart::builder()
                                    .header(ContentType::TEXT_PLAIN)
                                    .body(message.plain_body.clone()),
                            )
                            .singlepart(
                                SinglePart::builder()
                                    .header(ContentType::TEXT_HTML)
                                    .body(message.html_body.clone()),
                            ),
                    )
                    .singlepart(
                        Attachment::new(message.attachment_name.clone())
                            .body(message.attachment.clone(), ContentType::TEXT_HTML),
                    ),
            )
            .map_err(|e| Self::delivery_err(&message.reference, e))?;

        let transport = SmtpTransport::starttls_relay(&self.settings.host)
            .map_err(|e| Self::delivery_err(&message.reference, e))?
            .port(self.settings.port)
            .credentials(Credentials::new(
                self.settings.username.clone(),
                self.settings.password.clone(),
            ))
            .build();

        transport
            .send(&email)
            .map_err(|e| Self::delivery_err(&message.reference, e))?;

        tracing::info!(to = %message.to, subject = %message.subject, "email sent");
        Ok(())
    }
}

/// File-outbox delivery: each message becomes a metadata JSON, the two
/// bodies, and the attachment, dropped into the outbox directory.
/// Default channel when no [smtp] section is configured; also what the
/// integration tests inspect.
pub struct OutboxMessenger {
    dir: PathBuf,
}

impl OutboxMessenger {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl Messenger for OutboxMessenger {
    fn send(&self, message: &OutgoingMessage) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let seq = fs::read_dir(&self.dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .count()
            + 1;
        let stem = format!("msg-{seq:04}");

        let meta = serde_json::json!({
            "reference": message.reference,
            "to": message.to,
            "subject": message.subject,
            "sender_name": message.sender_name,
            "attachment": message.attachment_name,
        });
        fs::write(
            self.dir.join(format!("{stem}.json")),
            serde_json::to_string_pretty(&meta).map_err(|e| BillError::Delivery {
                invoice: message.reference.clone(),
                reason: e.to_string(),
            })?,
        )?;
        fs::write(self.dir.join(format!("{stem}.txt")), &message.plain_body)?;
        fs::write(self.dir.join(format!("{stem}.html")), &message.html_body)?;
        fs::write(
            self.dir.join(format!("{stem}-{}", message.attachment_name)),
            &message.attachment,
        )?;

        tracing::info!(to = %message.to, subject = %message.subject,
            outbox = %self.dir.display(), "message written to outbox");
        Ok(())
    }
}
