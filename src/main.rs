mod actions;
mod config;
mod error;
mod invoice;
mod mail;
mod render;
mod states;
mod tax;
mod words;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::EnvFilter;

use crate::actions::{dispatch_edit, EditAction, EditOutcome, TableId, COL_FOLLOW_UP_UNIT, COL_FOLLOW_UP_VALUE, COL_STATUS};
use crate::config::{
    config_dir, load_archive, load_clients, load_config, load_products, load_tracker, resolve_dir,
    save_archive, save_tracker, ArchivedItem, Config, CLIENTS_TEMPLATE, CONFIG_TEMPLATE,
    PRODUCTS_TEMPLATE,
};
use crate::error::{BillError, Result};
use crate::invoice::{
    catalog_by_name, clients_by_name, compose, dispatch, new_entry, reconstruct, sweep,
    DispatchKind, FormMode, Header, RawLine, Status,
};
use crate::mail::{Messenger, OutboxMessenger, SmtpMessenger};
use crate::render::{format_inr, DocumentRenderer, HtmlRenderer};

#[derive(Parser)]
#[command(name = "gstbill")]
#[command(version, about = "CLI GST invoicing and payment follow-up assistant", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.gstbill or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with template files
    Init,

    /// Compose an invoice and send it to the client
    Send {
        /// Client identifier from clients.toml
        #[arg(short, long)]
        client: String,

        /// Line items as "product:quantity" or "product:quantity:discount" (repeatable)
        #[arg(short, long, value_name = "PRODUCT:QTY[:DISC]")]
        item: Vec<String>,

        /// Invoice date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Compose an invoice and save it as a draft (no dispatch)
    Draft {
        /// Client identifier from clients.toml
        #[arg(short, long)]
        client: String,

        /// Line items as "product:quantity" or "product:quantity:discount" (repeatable)
        #[arg(short, long, value_name = "PRODUCT:QTY[:DISC]")]
        item: Vec<String>,

        /// Invoice date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// List tracked invoices with status and follow-up state
    List {
        /// Number of invoices to show (default: all)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List configured clients
    Clients,

    /// List the product catalog
    Products,

    /// Show config summary and the next invoice number
    Status,

    /// List the canonical state codes used for tax resolution
    States,

    /// Edit an invoice's status cell ("Ready" re-sends it; "Paid" and
    /// "Stop Follow-up" end the reminder loop)
    SetStatus {
        /// Invoice number or index from 'list' (e.g. 1 or INV-001)
        invoice: String,

        /// New status value
        status: String,
    },

    /// Edit an invoice's reminder cadence
    SetFollowUp {
        /// Invoice number or index from 'list' (e.g. 1 or INV-001)
        invoice: String,

        /// Interval value (>= 1)
        value: i64,

        /// Interval unit: Minutes, Hours or Days
        unit: String,
    },

    /// Send due payment reminders (run this from cron, e.g. hourly)
    Sweep {
        /// Override the sweep clock (RFC3339), mainly for testing
        #[arg(long)]
        now: Option<String>,
    },

    /// Re-render an invoice document from the archive without sending
    Regenerate {
        /// Invoice number or index from 'list' (e.g. 1 or INV-001)
        invoice: String,
    },
}

fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Audit log setup: stderr, quiet by default, RUST_LOG overrides.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Send { client, item, date } => {
            cmd_compose(&cfg_dir, &client, &item, date, FormMode::Send)
        }
        Commands::Draft { client, item, date } => {
            cmd_compose(&cfg_dir, &client, &item, date, FormMode::Draft)
        }
        Commands::List { limit } => cmd_list(&cfg_dir, limit),
        Commands::Clients => cmd_clients(&cfg_dir),
        Commands::Products => cmd_products(&cfg_dir),
        Commands::Status => cmd_status(&cfg_dir),
        Commands::States => cmd_states(),
        Commands::SetStatus { invoice, status } => cmd_set_status(&cfg_dir, &invoice, &status),
        Commands::SetFollowUp {
            invoice,
            value,
            unit,
        } => cmd_set_follow_up(&cfg_dir, &invoice, value, &unit),
        Commands::Sweep { now } => cmd_sweep(&cfg_dir, now),
        Commands::Regenerate { invoice } => cmd_regenerate(&cfg_dir, &invoice),
    }
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(BillError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::create_dir_all(cfg_dir.join("output"))?;
    fs::create_dir_all(cfg_dir.join("outbox"))?;

    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;
    fs::write(cfg_dir.join("clients.toml"), CLIENTS_TEMPLATE)?;
    fs::write(cfg_dir.join("products.toml"), PRODUCTS_TEMPLATE)?;

    println!("Initialized gstbill config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit your company details:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!(
        "  2. Add your clients:           $EDITOR {}/clients.toml",
        cfg_dir.display()
    );
    println!(
        "  3. Configure products:         $EDITOR {}/products.toml",
        cfg_dir.display()
    );
    println!();
    println!("Then send your first invoice:");
    println!("  gstbill send --client <client-id> --item <product>:<quantity>");
    println!();
    println!("For automatic payment reminders, schedule an hourly sweep:");
    println!("  0 * * * * gstbill sweep");

    Ok(())
}

// Table row structs for tabled
#[derive(Tabled)]
struct ClientRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "EMAIL")]
    email: String,
    #[tabled(rename = "STATE")]
    state: String,
}

#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "HSN")]
    hsn: String,
    #[tabled(rename = "RATE")]
    rate: String,
    #[tabled(rename = "GST")]
    gst: String,
}

#[derive(Tabled)]
struct InvoiceRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "NUMBER")]
    number: String,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "TOTAL")]
    total: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "NEXT FOLLOW-UP")]
    next_follow_up: String,
    #[tabled(rename = "CLIENT")]
    client: String,
}

fn messenger_for(config: &Config, cfg_dir: &Path) -> Box<dyn Messenger> {
    match &config.smtp {
        Some(settings) => Box::new(SmtpMessenger::new(settings.clone())),
        None => Box::new(OutboxMessenger::new(resolve_dir(
            &config.output.outbox_dir,
            cfg_dir,
        ))),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| BillError::InvalidDate(s.to_string()))
}

/// Resolve an invoice reference to the actual invoice number.
/// Accepts either an index (1-based, newest first) from 'list' or the
/// full invoice number.
fn resolve_invoice_number(cfg_dir: &Path, reference: &str) -> Result<String> {
    let tracker = load_tracker(cfg_dir)?;

    if let Ok(idx) = reference.parse::<usize>() {
        if idx == 0 {
            return Err(BillError::InvalidInvoiceIndex(reference.to_string()));
        }
        let invoices: Vec<_> = tracker.invoices.iter().rev().collect();
        if idx > invoices.len() {
            return Err(BillError::InvalidInvoiceIndex(reference.to_string()));
        }
        return Ok(invoices[idx - 1].number.clone());
    }

    if tracker.invoices.iter().any(|e| e.number == reference) {
        Ok(reference.to_string())
    } else {
        Err(BillError::InvoiceNotFound(reference.to_string()))
    }
}

/// Storage row (1-based) of an invoice, as the edit dispatcher counts.
fn tracker_row_of(cfg_dir: &Path, number: &str) -> Result<usize> {
    let tracker = load_tracker(cfg_dir)?;
    tracker
        .invoices
        .iter()
        .position(|e| e.number == number)
        .map(|i| i + 1)
        .ok_or_else(|| BillError::InvoiceNotFound(number.to_string()))
}

/// Compose a new invoice from the command line and either send it or
/// park it as a draft.
fn cmd_compose(
    cfg_dir: &Path,
    client_id: &str,
    items_input: &[String],
    date: Option<String>,
    mode: FormMode,
) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(BillError::ConfigNotFound(cfg_dir.to_path_buf()));
    }

    if items_input.is_empty() {
        return Err(BillError::NoItems);
    }

    let config = load_config(cfg_dir)?;
    let clients = load_clients(cfg_dir)?;
    let catalog = catalog_by_name(&load_products(cfg_dir)?);
    let mut tracker = load_tracker(cfg_dir)?;
    let mut archive = load_archive(cfg_dir)?;

    let buyer = clients
        .get(client_id)
        .ok_or_else(|| BillError::ClientNotFound(client_id.to_string()))?
        .clone();

    let raw_lines: Vec<RawLine> = items_input
        .iter()
        .map(|input| RawLine::parse(input))
        .collect::<Result<_>>()?;

    let invoice_date = match date {
        Some(s) => parse_date(&s)?,
        None => chrono::Local::now().date_naive(),
    };
    let due_date = invoice_date + Duration::days(config.invoice.due_days);

    let header = Header {
        number: tracker.next_number(&config.invoice.prefix),
        date: invoice_date,
        due_date,
    };

    let invoice = compose(&header, &buyer, &config.company, &raw_lines, &catalog)?;

    // Dispatch before anything is persisted: a delivery failure leaves
    // no Sent row and the invoice number unconsumed.
    let mut document_path = None;
    if mode == FormMode::Send {
        let messenger = messenger_for(&config, cfg_dir);
        let output_dir = resolve_dir(&config.output.dir, cfg_dir);
        document_path = Some(dispatch(
            &invoice,
            DispatchKind::Initial,
            &HtmlRenderer,
            messenger.as_ref(),
            &output_dir,
        )?);
    }

    let number = tracker.take_number(&config.invoice.prefix);
    debug_assert_eq!(number, invoice.number);

    archive.items.extend(invoice.items.iter().map(|line| ArchivedItem {
        invoice: invoice.number.clone(),
        serial: line.serial,
        name: line.name.clone(),
        hsn: line.hsn.clone(),
        qty: line.qty,
        rate: line.rate,
        discount: line.discount,
        taxable: line.taxable,
        gst_rate: line.gst_rate,
        cgst: line.cgst,
        sgst: line.sgst,
        igst: line.igst,
        line_total: line.line_total,
    }));
    save_archive(cfg_dir, &archive)?;

    tracker
        .invoices
        .push(new_entry(&invoice, &config.invoice, Utc::now(), mode));
    save_tracker(cfg_dir, &tracker)?;

    match mode {
        FormMode::Send => {
            println!("Sent {}", invoice.number);
        }
        FormMode::Draft => {
            println!("Saved draft {}", invoice.number);
        }
    }
    println!("  Client: {}", invoice.buyer.name);
    println!("  Total:  \u{20b9} {}", format_inr(invoice.totals.grand_total));
    if let Some(path) = document_path {
        println!("  Saved:  {}", path.display());
    }

    Ok(())
}

/// List tracked invoices with a dashboard footer
fn cmd_list(cfg_dir: &Path, limit: Option<usize>) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(BillError::ConfigNotFound(cfg_dir.to_path_buf()));
    }

    let tracker = load_tracker(cfg_dir)?;

    if tracker.invoices.is_empty() {
        println!("No invoices yet.");
        return Ok(());
    }

    let invoices: Vec<_> = tracker.invoices.iter().rev().enumerate().collect();
    let invoices = match limit {
        Some(n) => &invoices[..n.min(invoices.len())],
        None => &invoices[..],
    };

    let rows: Vec<InvoiceRow> = invoices
        .iter()
        .map(|(idx, entry)| InvoiceRow {
            index: idx + 1,
            number: entry.number.clone(),
            date: entry.invoice_date.to_string(),
            total: format_inr(entry.grand_total),
            status: entry.status.to_string(),
            next_follow_up: entry
                .next_due_at
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
            client: entry.client.clone(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    // Dashboard totals over the whole tracker
    let today = chrono::Local::now().date_naive();
    let invoiced: f64 = tracker.invoices.iter().map(|e| e.grand_total).sum();
    let collected: f64 = tracker
        .invoices
        .iter()
        .filter(|e| e.status == Status::Paid)
        .map(|e| e.grand_total)
        .sum();
    let outstanding = invoiced - collected;
    let overdue = tracker
        .invoices
        .iter()
        .filter(|e| e.status != Status::Paid && e.due_date < today)
        .count();

    println!();
    println!("Total invoiced:  \u{20b9} {}", format_inr(invoiced));
    println!("Collected:       \u{20b9} {}", format_inr(collected));
    println!("Outstanding:     \u{20b9} {}", format_inr(outstanding));
    println!("Overdue:         {overdue} invoice(s)");
    println!();
    println!("Use index number with set-status/set-follow-up/regenerate (e.g., 'gstbill set-status 1 Paid')");

    Ok(())
}

/// List configured clients
fn cmd_clients(cfg_dir: &Path) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(BillError::ConfigNotFound(cfg_dir.to_path_buf()));
    }

    let clients = load_clients(cfg_dir)?;

    if clients.is_empty() {
        println!("No clients configured.");
        println!("Add clients to: {}/clients.toml", cfg_dir.display());
        return Ok(());
    }

    let mut sorted: Vec<_> = clients.iter().collect();
    sorted.sort_by_key(|(k, _)| *k);

    let rows: Vec<ClientRow> = sorted
        .iter()
        .map(|(id, client)| ClientRow {
            id: id.to_string(),
            name: client.name.clone(),
            email: client.email.clone(),
            state: client.state.clone(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

/// List the product catalog
fn cmd_products(cfg_dir: &Path) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(BillError::ConfigNotFound(cfg_dir.to_path_buf()));
    }

    let products = load_products(cfg_dir)?;

    if products.is_empty() {
        println!("No products configured.");
        println!("Add products to: {}/products.toml", cfg_dir.display());
        return Ok(());
    }

    let mut sorted: Vec<_> = products.iter().collect();
    sorted.sort_by_key(|(k, _)| *k);

    let rows: Vec<ProductRow> = sorted
        .iter()
        .map(|(id, product)| ProductRow {
            id: id.to_string(),
            name: product.name.clone(),
            hsn: product.hsn.clone(),
            rate: format_inr(product.rate),
            gst: format!("{:.0}%", product.gst_rate * 100.0),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

/// Show config summary and next invoice number
fn cmd_status(cfg_dir: &Path) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(BillError::ConfigNotFound(cfg_dir.to_path_buf()));
    }

    let config = load_config(cfg_dir)?;
    let clients = load_clients(cfg_dir)?;
    let products = load_products(cfg_dir)?;
    let tracker = load_tracker(cfg_dir)?;

    println!("gstbill status");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", cfg_dir.display());
    println!("Company:          {}", config.company.name);
    println!("State:            {}", config.company.state);
    println!(
        "Delivery:         {}",
        if config.smtp.is_some() { "SMTP" } else { "file outbox" }
    );
    println!("Clients:          {}", clients.len());
    println!("Products:         {}", products.len());
    println!(
        "Next invoice:     {}",
        tracker.next_number(&config.invoice.prefix)
    );

    if !tracker.invoices.is_empty() {
        println!();
        println!("Recent invoices:");
        for entry in tracker.invoices.iter().rev().take(5) {
            println!(
                "  {} - {} - \u{20b9} {} ({})",
                entry.number,
                entry.client,
                format_inr(entry.grand_total),
                entry.status
            );
        }
    }

    Ok(())
}

/// List the canonical state strings client and company records use
fn cmd_states() -> Result<()> {
    for state in states::state_list() {
        println!("{state}");
    }
    Ok(())
}

/// Edit an invoice's status cell through the action dispatcher
fn cmd_set_status(cfg_dir: &Path, invoice_ref: &str, status: &str) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(BillError::ConfigNotFound(cfg_dir.to_path_buf()));
    }

    let number = resolve_invoice_number(cfg_dir, invoice_ref)?;
    let row = tracker_row_of(cfg_dir, &number)?;

    let config = load_config(cfg_dir)?;
    let messenger = messenger_for(&config, cfg_dir);

    let action = EditAction {
        table: TableId::Tracker,
        row,
        column: COL_STATUS,
        value: status.to_string(),
    };

    match dispatch_edit(cfg_dir, &action, Utc::now(), &HtmlRenderer, messenger.as_ref())? {
        EditOutcome::InvoiceSent(number) => println!("Sent {number}"),
        EditOutcome::StatusSet(status) => println!("Marked {number} as {status}"),
        _ => {}
    }

    Ok(())
}

/// Edit an invoice's reminder cadence through the action dispatcher
fn cmd_set_follow_up(cfg_dir: &Path, invoice_ref: &str, value: i64, unit: &str) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(BillError::ConfigNotFound(cfg_dir.to_path_buf()));
    }

    let number = resolve_invoice_number(cfg_dir, invoice_ref)?;
    let row = tracker_row_of(cfg_dir, &number)?;

    let config = load_config(cfg_dir)?;
    let messenger = messenger_for(&config, cfg_dir);

    for (column, cell_value) in [
        (COL_FOLLOW_UP_VALUE, value.to_string()),
        (COL_FOLLOW_UP_UNIT, unit.to_string()),
    ] {
        let action = EditAction {
            table: TableId::Tracker,
            row,
            column,
            value: cell_value,
        };
        dispatch_edit(cfg_dir, &action, Utc::now(), &HtmlRenderer, messenger.as_ref())?;
    }

    println!("Follow-up for {number} set to every {value} {unit}");
    Ok(())
}

/// Run the reminder sweep once
fn cmd_sweep(cfg_dir: &Path, now_override: Option<String>) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(BillError::ConfigNotFound(cfg_dir.to_path_buf()));
    }

    let now: DateTime<Utc> = match now_override {
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map_err(|_| BillError::InvalidDate(s.clone()))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let config = load_config(cfg_dir)?;
    let messenger = messenger_for(&config, cfg_dir);

    let outcome = sweep(cfg_dir, now, &HtmlRenderer, messenger.as_ref())?;

    if outcome.attempted == 0 {
        println!("No due invoices found.");
    } else {
        println!(
            "Sent {} of {} due follow-up reminder(s).",
            outcome.succeeded, outcome.attempted
        );
    }

    Ok(())
}

/// Re-render an invoice document from the archive
fn cmd_regenerate(cfg_dir: &Path, invoice_ref: &str) -> Result<()> {
    use std::fs;

    if !cfg_dir.exists() {
        return Err(BillError::ConfigNotFound(cfg_dir.to_path_buf()));
    }

    let number = resolve_invoice_number(cfg_dir, invoice_ref)?;

    let config = load_config(cfg_dir)?;
    let clients = clients_by_name(&load_clients(cfg_dir)?);
    let catalog = catalog_by_name(&load_products(cfg_dir)?);
    let archive = load_archive(cfg_dir)?;
    let tracker = load_tracker(cfg_dir)?;

    let entry = tracker
        .find(&number)
        .ok_or_else(|| BillError::InvoiceNotFound(number.clone()))?;

    let invoice = reconstruct(entry, &archive, &clients, &catalog, &config.company)?;
    let document = HtmlRenderer.render(&invoice)?;

    let output_dir = resolve_dir(&config.output.dir, cfg_dir);
    fs::create_dir_all(&output_dir)?;
    let path = output_dir.join(&document.file_name);
    fs::write(&path, &document.html)?;

    println!("Regenerated {number}");
    println!("  Saved: {}", path.display());

    Ok(())
}
