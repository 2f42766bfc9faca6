use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{InvoiceSettings, TrackerEntry};
use crate::error::{BillError, Result};
use crate::invoice::Invoice;
use crate::mail::Messenger;
use crate::render::{notification_bodies, subject_for, DocumentRenderer};

/// Invoice lifecycle status. The stored strings are the canonical
/// forms; anything else fails to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Draft,
    Ready,
    Sent,
    Paid,
    #[serde(rename = "Stop Follow-up")]
    StopFollowup,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "Draft",
            Status::Ready => "Ready",
            Status::Sent => "Sent",
            Status::Paid => "Paid",
            Status::StopFollowup => "Stop Follow-up",
        }
    }

    pub fn parse(s: &str) -> Result<Status> {
        match s {
            "Draft" => Ok(Status::Draft),
            "Ready" => Ok(Status::Ready),
            "Sent" => Ok(Status::Sent),
            "Paid" => Ok(Status::Paid),
            "Stop Follow-up" => Ok(Status::StopFollowup),
            other => Err(BillError::InvalidStatus(other.to_string())),
        }
    }

    /// Paid and Stop Follow-up rows never receive reminders again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Paid | Status::StopFollowup)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reminder cadence unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowUpUnit {
    Minutes,
    Hours,
    Days,
}

impl FollowUpUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowUpUnit::Minutes => "Minutes",
            FollowUpUnit::Hours => "Hours",
            FollowUpUnit::Days => "Days",
        }
    }

    pub fn parse(s: &str) -> Result<FollowUpUnit> {
        match s {
            "Minutes" => Ok(FollowUpUnit::Minutes),
            "Hours" => Ok(FollowUpUnit::Hours),
            "Days" => Ok(FollowUpUnit::Days),
            other => Err(BillError::InvalidFollowUpUnit(other.to_string())),
        }
    }

    pub fn offset(&self, value: i64) -> Duration {
        match self {
            FollowUpUnit::Minutes => Duration::minutes(value),
            FollowUpUnit::Hours => Duration::hours(value),
            FollowUpUnit::Days => Duration::days(value),
        }
    }
}

impl fmt::Display for FollowUpUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a status edit is in the transition table.
///
/// "Ready" is the trigger edit for the history-flow send and is
/// accepted from Draft or Sent; Paid and Stop Follow-up close the
/// reminder loop from anywhere. Direct edits to Draft or Sent are
/// rejected: Sent is only reachable through a send flow.
pub fn status_edit_allowed(from: Status, to: Status) -> bool {
    match (from, to) {
        (Status::Draft | Status::Sent, Status::Ready) => true,
        (from, Status::Paid) => from != Status::Paid,
        (from, Status::StopFollowup) => from != Status::StopFollowup,
        _ => false,
    }
}

/// Form-flow save mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Send,
    Draft,
}

/// What kind of send a dispatch is; drives subject and notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchKind {
    Initial,
    Manual,
    Reminder,
}

/// Tracker row for a freshly composed invoice. Sent rows start their
/// reminder clock at now + the configured default cadence; drafts have
/// no clock.
pub fn new_entry(
    invoice: &Invoice,
    settings: &InvoiceSettings,
    now: DateTime<Utc>,
    mode: FormMode,
) -> TrackerEntry {
    let sent = mode == FormMode::Send;
    TrackerEntry {
        number: invoice.number.clone(),
        client: invoice.buyer.name.clone(),
        email: invoice.buyer.email.clone(),
        grand_total: invoice.totals.grand_total,
        invoice_date: invoice.date,
        due_date: invoice.due_date,
        status: if sent { Status::Sent } else { Status::Draft },
        follow_up_value: settings.follow_up_days.max(1),
        follow_up_unit: FollowUpUnit::Days,
        last_sent_at: sent.then_some(now),
        next_due_at: sent.then(|| now + Duration::days(settings.follow_up_days.max(1))),
        notes: if sent {
            "Initial Invoice Sent".to_string()
        } else {
            "Draft saved manually".to_string()
        },
    }
}

/// Apply the history-flow send (status edited to "Ready") to a row.
pub fn mark_sent_manual(entry: &mut TrackerEntry, now: DateTime<Utc>, follow_up_days: i64) {
    entry.status = Status::Sent;
    entry.last_sent_at = Some(now);
    entry.next_due_at = Some(now + Duration::days(follow_up_days.max(1)));
    entry.notes = "Manually Sent".to_string();
}

/// Apply a reminder send to a row. next_due is re-derived from `now`
/// with the row's own cadence, so it always moves strictly forward; a
/// second invocation in the same instant finds the row no longer due.
pub fn mark_reminder_sent(entry: &mut TrackerEntry, now: DateTime<Utc>) {
    entry.last_sent_at = Some(now);
    entry.next_due_at = Some(now + entry.follow_up_unit.offset(entry.follow_up_value.max(1)));
    entry.notes = "Auto-Reminder Sent".to_string();
}

/// Apply a terminal transition (Paid or Stop Follow-up): the reminder
/// clock is cleared and never recomputed afterwards.
pub fn mark_terminal(entry: &mut TrackerEntry, to: Status) {
    debug_assert!(to.is_terminal());
    entry.status = to;
    entry.next_due_at = None;
}

/// Whether a row qualifies for a reminder at `now`.
pub fn is_due(entry: &TrackerEntry, now: DateTime<Utc>) -> bool {
    entry.status == Status::Sent && entry.next_due_at.is_some_and(|due| due <= now)
}

/// Render the invoice document, save it under `output_dir`, and hand
/// it to the messaging channel. Returns the saved document path. Any
/// failure surfaces before the caller persists a Sent status.
pub fn dispatch(
    invoice: &Invoice,
    kind: DispatchKind,
    renderer: &dyn DocumentRenderer,
    messenger: &dyn Messenger,
    output_dir: &Path,
) -> Result<PathBuf> {
    let document = renderer.render(invoice)?;

    fs::create_dir_all(output_dir)?;
    let document_path = output_dir.join(&document.file_name);
    fs::write(&document_path, &document.html)?;

    let (plain_body, html_body) = notification_bodies(invoice, kind);
    let message = crate::mail::OutgoingMessage {
        reference: invoice.number.clone(),
        to: invoice.buyer.email.clone(),
        subject: subject_for(invoice, kind),
        plain_body,
        html_body,
        attachment_name: document.file_name.clone(),
        attachment: document.html.clone().into_bytes(),
        sender_name: invoice.seller.name.clone(),
    };

    messenger.send(&message)?;

    tracing::info!(
        invoice = %invoice.number,
        to = %invoice.buyer.email,
        document = %document_path.display(),
        "invoice dispatched"
    );

    Ok(document_path)
}
