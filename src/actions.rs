//! Edit-action dispatcher.
//!
//! Interactive changes to the tracker arrive as a structured edit
//! (table, row, column, new value) and are routed from one place to
//! the matching lifecycle transition. A status edit to "Ready" fires
//! the history-flow send; Paid / Stop Follow-up close the reminder
//! loop; cadence edits are validated in place. Everything else is
//! explicitly ignored.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::config::{
    load_archive, load_clients, load_config, load_products, load_tracker, resolve_dir,
    save_tracker,
};
use crate::error::{BillError, Result};
use crate::invoice::{
    catalog_by_name, clients_by_name, dispatch, mark_sent_manual, mark_terminal, reconstruct,
    status_edit_allowed, DispatchKind, FollowUpUnit, Status,
};
use crate::mail::Messenger;
use crate::render::DocumentRenderer;

/// Tracker column numbers, 1-indexed in table order.
pub const COL_STATUS: usize = 7;
pub const COL_FOLLOW_UP_VALUE: usize = 8;
pub const COL_FOLLOW_UP_UNIT: usize = 9;

/// Which table an edit landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableId {
    Tracker,
    Clients,
    Products,
}

/// A structured edit event: 1-based row and column plus the new value.
#[derive(Debug, Clone)]
pub struct EditAction {
    pub table: TableId,
    pub row: usize,
    pub column: usize,
    pub value: String,
}

/// What the dispatcher did with an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Ready edit completed the history-flow send.
    InvoiceSent(String),
    /// Terminal status persisted.
    StatusSet(Status),
    /// Follow-up cadence updated.
    FollowUpSet,
    /// Edit is not one the lifecycle reacts to.
    Ignored,
}

/// Route one edit to the appropriate lifecycle transition.
///
/// Transitions either complete fully or leave the row at its prior
/// state: a Ready edit that fails reconstruction or delivery persists
/// nothing, which is the revert the caller observes.
pub fn dispatch_edit(
    cfg_dir: &Path,
    action: &EditAction,
    now: DateTime<Utc>,
    renderer: &dyn DocumentRenderer,
    messenger: &dyn Messenger,
) -> Result<EditOutcome> {
    if action.table != TableId::Tracker {
        return Ok(EditOutcome::Ignored);
    }

    match action.column {
        COL_STATUS => edit_status(cfg_dir, action, now, renderer, messenger),
        COL_FOLLOW_UP_VALUE => edit_follow_up_value(cfg_dir, action),
        COL_FOLLOW_UP_UNIT => edit_follow_up_unit(cfg_dir, action),
        _ => Ok(EditOutcome::Ignored),
    }
}

fn entry_index(row: usize, len: usize) -> Result<usize> {
    if row == 0 || row > len {
        return Err(BillError::InvalidInvoiceIndex(row.to_string()));
    }
    Ok(row - 1)
}

fn edit_status(
    cfg_dir: &Path,
    action: &EditAction,
    now: DateTime<Utc>,
    renderer: &dyn DocumentRenderer,
    messenger: &dyn Messenger,
) -> Result<EditOutcome> {
    let to = Status::parse(&action.value)?;

    let mut tracker = load_tracker(cfg_dir)?;
    let idx = entry_index(action.row, tracker.invoices.len())?;
    let from = tracker.invoices[idx].status;
    let number = tracker.invoices[idx].number.clone();

    if !status_edit_allowed(from, to) {
        return Err(BillError::InvalidTransition {
            invoice: number,
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        });
    }

    match to {
        Status::Ready => {
            let config = load_config(cfg_dir)?;
            let clients = clients_by_name(&load_clients(cfg_dir)?);
            let catalog = catalog_by_name(&load_products(cfg_dir)?);
            let archive = load_archive(cfg_dir)?;

            let invoice = reconstruct(
                &tracker.invoices[idx],
                &archive,
                &clients,
                &catalog,
                &config.company,
            )?;

            let output_dir = resolve_dir(&config.output.dir, cfg_dir);
            dispatch(&invoice, DispatchKind::Manual, renderer, messenger, &output_dir)?;

            mark_sent_manual(&mut tracker.invoices[idx], now, config.invoice.follow_up_days);
            save_tracker(cfg_dir, &tracker)?;
            Ok(EditOutcome::InvoiceSent(number))
        }
        Status::Paid | Status::StopFollowup => {
            mark_terminal(&mut tracker.invoices[idx], to);
            save_tracker(cfg_dir, &tracker)?;
            Ok(EditOutcome::StatusSet(to))
        }
        // Draft and Sent are unreachable: the transition table rejects
        // direct edits to them.
        _ => unreachable!("transition table admitted {to}"),
    }
}

fn edit_follow_up_value(cfg_dir: &Path, action: &EditAction) -> Result<EditOutcome> {
    let value: i64 = action
        .value
        .parse()
        .map_err(|_| BillError::InvalidFollowUpValue)?;
    if value < 1 {
        return Err(BillError::InvalidFollowUpValue);
    }

    let mut tracker = load_tracker(cfg_dir)?;
    let idx = entry_index(action.row, tracker.invoices.len())?;
    tracker.invoices[idx].follow_up_value = value;
    save_tracker(cfg_dir, &tracker)?;
    Ok(EditOutcome::FollowUpSet)
}

fn edit_follow_up_unit(cfg_dir: &Path, action: &EditAction) -> Result<EditOutcome> {
    let unit = FollowUpUnit::parse(&action.value)?;

    let mut tracker = load_tracker(cfg_dir)?;
    let idx = entry_index(action.row, tracker.invoices.len())?;
    tracker.invoices[idx].follow_up_unit = unit;
    save_tracker(cfg_dir, &tracker)?;
    Ok(EditOutcome::FollowUpSet)
}
