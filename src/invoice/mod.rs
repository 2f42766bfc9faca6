mod composer;
mod lifecycle;
mod sweep;

pub use composer::{
    catalog_by_name, clients_by_name, compose, reconstruct, Header, Invoice, LineItem, RawLine,
    Totals,
};
pub use lifecycle::{
    dispatch, is_due, mark_reminder_sent, mark_sent_manual, mark_terminal, new_entry,
    status_edit_allowed, DispatchKind, FollowUpUnit, FormMode, Status,
};
pub use sweep::{sweep, SweepOutcome};
