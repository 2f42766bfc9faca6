use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub company: Company,
    pub invoice: InvoiceSettings,
    pub output: OutputSettings,
    #[serde(default)]
    pub smtp: Option<SmtpSettings>,
}

/// Seller profile. `state` holds the canonical "Name (Code)" string
/// used for intra/inter-state tax resolution.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Company {
    pub name: String,
    pub email: String,
    pub gstin: String,
    pub address: String,
    pub state: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct InvoiceSettings {
    /// Invoice numbers are `<prefix>-NNN`, zero-padded, monotonic.
    pub prefix: String,
    #[serde(default = "default_due_days")]
    pub due_days: i64,
    /// Default reminder cadence for freshly sent invoices, in days.
    #[serde(default = "default_follow_up_days")]
    pub follow_up_days: i64,
}

fn default_due_days() -> i64 {
    15
}

fn default_follow_up_days() -> i64 {
    3
}

#[derive(Debug, Deserialize, Serialize)]
pub struct OutputSettings {
    /// Where rendered invoice documents are written.
    pub dir: String,
    /// Outbox directory used when no [smtp] section is configured.
    pub outbox_dir: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SmtpSettings {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
}

fn default_smtp_port() -> u16 {
    587
}
