use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::config::{
    load_archive, load_clients, load_config, load_products, load_tracker, resolve_dir,
    save_tracker,
};
use crate::error::Result;
use crate::invoice::{
    catalog_by_name, clients_by_name, dispatch, is_due, mark_reminder_sent, reconstruct,
    DispatchKind,
};
use crate::mail::Messenger;
use crate::render::DocumentRenderer;

/// What a sweep pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    pub attempted: usize,
    pub succeeded: usize,
}

/// Scan the tracker for Sent invoices whose reminder is due and
/// re-send each one. Each invoice number fires at most once per pass.
/// The row's clock is advanced and written out before the dispatch is
/// attempted, so a duplicate invocation converging on the same row
/// finds it no longer due. Per-row failures are logged and skipped;
/// the sweep always runs to completion.
pub fn sweep(
    cfg_dir: &Path,
    now: DateTime<Utc>,
    renderer: &dyn DocumentRenderer,
    messenger: &dyn Messenger,
) -> Result<SweepOutcome> {
    let config = load_config(cfg_dir)?;
    let clients = clients_by_name(&load_clients(cfg_dir)?);
    let catalog = catalog_by_name(&load_products(cfg_dir)?);
    let archive = load_archive(cfg_dir)?;
    let mut tracker = load_tracker(cfg_dir)?;

    let output_dir = resolve_dir(&config.output.dir, cfg_dir);

    let due_numbers: Vec<String> = {
        let mut seen = HashSet::new();
        tracker
            .invoices
            .iter()
            .filter(|e| is_due(e, now))
            .filter(|e| seen.insert(e.number.clone()))
            .map(|e| e.number.clone())
            .collect()
    };

    let mut outcome = SweepOutcome::default();

    for number in due_numbers {
        outcome.attempted += 1;

        let Some(current) = tracker.find(&number).cloned() else {
            continue;
        };

        let invoice = match reconstruct(&current, &archive, &clients, &catalog, &config.company) {
            Ok(invoice) => invoice,
            Err(e) => {
                tracing::error!(invoice = %number, error = %e,
                    "reminder skipped: reconstruction failed");
                continue;
            }
        };

        // Advance the clock and persist before dispatching.
        if let Some(entry) = tracker.find_mut(&number) {
            mark_reminder_sent(entry, now);
        }
        save_tracker(cfg_dir, &tracker)?;

        match dispatch(
            &invoice,
            DispatchKind::Reminder,
            renderer,
            messenger,
            &output_dir,
        ) {
            Ok(_) => outcome.succeeded += 1,
            Err(e) => {
                tracing::error!(invoice = %number, error = %e, "reminder delivery failed");
            }
        }
    }

    tracing::info!(
        attempted = outcome.attempted,
        succeeded = outcome.succeeded,
        "follow-up sweep complete"
    );

    Ok(outcome)
}
