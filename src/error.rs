use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillError {
    #[error("Config directory not found at {0}. Run 'gstbill init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Client name is required")]
    MissingClientName,

    #[error("Client '{0}' not found in clients.toml")]
    ClientNotFound(String),

    #[error("No line items. Use --item <product>:<quantity>[:<discount>] to add them.")]
    NoItems,

    #[error("Invalid quantity '{qty}' for item '{item}': {reason}")]
    InvalidQuantity {
        item: String,
        qty: String,
        reason: String,
    },

    #[error("Invalid item format '{0}'. Expected 'product:quantity' or 'product:quantity:discount'")]
    InvalidItemFormat(String),

    #[error("Invoice '{0}' not found in tracker")]
    InvoiceNotFound(String),

    #[error("Invalid invoice index '{0}'. Use 'gstbill list' to see available invoices.")]
    InvalidInvoiceIndex(String),

    #[error("No archived items for invoice '{0}'")]
    NoArchivedItems(String),

    #[error("Invalid status '{0}'. Valid values: Draft, Ready, Sent, Paid, Stop Follow-up")]
    InvalidStatus(String),

    #[error("Cannot change status of invoice '{invoice}' from '{from}' to '{to}'")]
    InvalidTransition {
        invoice: String,
        from: String,
        to: String,
    },

    #[error("Invalid follow-up unit '{0}'. Valid values: Minutes, Hours, Days")]
    InvalidFollowUpUnit(String),

    #[error("Follow-up value must be at least 1")]
    InvalidFollowUpValue,

    #[error("Invalid date value '{0}'")]
    InvalidDate(String),

    #[error("Failed to render invoice document: {0}")]
    Render(String),

    #[error("Failed to deliver invoice '{invoice}': {reason}")]
    Delivery { invoice: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BillError>;
