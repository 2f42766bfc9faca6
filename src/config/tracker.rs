use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::invoice::{FollowUpUnit, Status};

/// Persistent tracker state: the invoice counter plus one row per
/// invoice. Rewritten whole on every mutation, so a transition's
/// status/follow-up fields land in a single write.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Tracker {
    pub counter: Counter,
    #[serde(default)]
    pub invoices: Vec<TrackerEntry>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Counter {
    pub last_number: u32,
}

/// One tracker row. Column order follows the tracker table layout:
/// number, client, email, amount, dates, status, follow-up cadence,
/// send timestamps, notes.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TrackerEntry {
    pub number: String,
    pub client: String,
    pub email: String,
    pub grand_total: f64,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: Status,
    pub follow_up_value: i64,
    pub follow_up_unit: FollowUpUnit,
    #[serde(default)]
    pub last_sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
}

impl Tracker {
    /// Next invoice number for `prefix`, without consuming it.
    pub fn next_number(&self, prefix: &str) -> String {
        format!("{}-{:03}", prefix, self.counter.last_number + 1)
    }

    /// Consume and return the next invoice number.
    pub fn take_number(&mut self, prefix: &str) -> String {
        self.counter.last_number += 1;
        format!("{}-{:03}", prefix, self.counter.last_number)
    }

    pub fn find(&self, number: &str) -> Option<&TrackerEntry> {
        self.invoices.iter().find(|e| e.number == number)
    }

    pub fn find_mut(&mut self, number: &str) -> Option<&mut TrackerEntry> {
        self.invoices.iter_mut().find(|e| e.number == number)
    }
}

/// Append-only item archive; reconstruction reads rows back by
/// invoice number.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Archive {
    #[serde(default)]
    pub items: Vec<ArchivedItem>,
}

/// One archived line item, keyed by invoice number.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ArchivedItem {
    pub invoice: String,
    pub serial: u32,
    pub name: String,
    pub hsn: String,
    pub qty: f64,
    pub rate: f64,
    pub discount: f64,
    pub taxable: f64,
    pub gst_rate: f64,
    pub cgst: f64,
    pub sgst: f64,
    pub igst: f64,
    pub line_total: f64,
}

impl Archive {
    /// All archived items for one invoice, in serial order.
    pub fn items_for(&self, number: &str) -> Vec<&ArchivedItem> {
        self.items.iter().filter(|i| i.invoice == number).collect()
    }
}
