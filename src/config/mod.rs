mod client;
mod company;
mod product;
pub mod tracker;

pub use client::Client;
pub use company::{Company, Config, InvoiceSettings, OutputSettings, SmtpSettings};
pub use product::Product;
pub use tracker::{Archive, ArchivedItem, Tracker, TrackerEntry};

use crate::error::{BillError, Result};
use crate::states::is_known_state;
use directories::ProjectDirs;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.gstbill/)
pub fn config_dir() -> Result<PathBuf> {
    // First try XDG-style directories
    if let Some(proj_dirs) = ProjectDirs::from("", "", "gstbill") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // Fallback to ~/.gstbill/
    let home = dirs_home().ok_or_else(|| {
        BillError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".gstbill"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = dirs_home() {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}

/// Resolve a configured directory relative to the config dir.
pub fn resolve_dir(configured: &str, config_dir: &Path) -> PathBuf {
    let expanded = expand_path(configured);
    if expanded.is_absolute() {
        expanded
    } else {
        config_dir.join(expanded)
    }
}

fn parse_file<T: serde::de::DeserializeOwned>(path: PathBuf) -> Result<T> {
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| BillError::ConfigParse { path, source: e })
}

/// Load the main config.toml; warns when the seller state is not a
/// canonical "Name (Code)" value, since tax resolution compares it
/// verbatim.
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Err(BillError::ConfigFileNotFound(path));
    }
    let config: Config = parse_file(path)?;
    if !is_known_state(&config.company.state) {
        tracing::warn!(state = %config.company.state, "company state is not a canonical state code");
    }
    Ok(config)
}

/// Load clients.toml as a map of client id to record.
pub fn load_clients(config_dir: &Path) -> Result<HashMap<String, Client>> {
    let path = config_dir.join("clients.toml");
    if !path.exists() {
        return Err(BillError::ConfigFileNotFound(path));
    }
    let clients: HashMap<String, Client> = parse_file(path)?;
    for client in clients.values() {
        if !is_known_state(&client.state) {
            tracing::warn!(client = %client.name, state = %client.state,
                "client state is not a canonical state code");
        }
    }
    Ok(clients)
}

/// Load products.toml as a map of product id to record.
pub fn load_products(config_dir: &Path) -> Result<HashMap<String, Product>> {
    let path = config_dir.join("products.toml");
    if !path.exists() {
        return Err(BillError::ConfigFileNotFound(path));
    }
    parse_file(path)
}

/// Load tracker.toml (creates default if missing)
pub fn load_tracker(config_dir: &Path) -> Result<Tracker> {
    let path = config_dir.join("tracker.toml");
    if !path.exists() {
        return Ok(Tracker::default());
    }
    parse_file(path)
}

/// Save tracker.toml in one write.
pub fn save_tracker(config_dir: &Path, tracker: &Tracker) -> Result<()> {
    let path = config_dir.join("tracker.toml");
    let content = toml::to_string_pretty(tracker).map_err(|e| {
        BillError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })?;
    fs::write(path, content)?;
    Ok(())
}

/// Load archive.toml (creates default if missing)
pub fn load_archive(config_dir: &Path) -> Result<Archive> {
    let path = config_dir.join("archive.toml");
    if !path.exists() {
        return Ok(Archive::default());
    }
    parse_file(path)
}

/// Save archive.toml. The archive is append-only: callers extend
/// `items` and never rewrite existing rows.
pub fn save_archive(config_dir: &Path, archive: &Archive) -> Result<()> {
    let path = config_dir.join("archive.toml");
    let content = toml::to_string_pretty(archive).map_err(|e| {
        BillError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })?;
    fs::write(path, content)?;
    Ok(())
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[company]
name = "Your Company Name"
email = "billing@yourcompany.example"
gstin = "07AABCU9603R1Z2"
address = "123 Business Street, New Delhi"
state = "Delhi (07)"          # canonical "Name (Code)" form

[invoice]
prefix = "INV"                # invoice numbers become INV-001, INV-002, ...
due_days = 15
follow_up_days = 3            # reminder cadence after the first send

[output]
dir = "output"                # rendered invoice documents
outbox_dir = "outbox"         # messages land here when [smtp] is absent

# Uncomment to deliver by email instead of the file outbox:
# [smtp]
# host = "smtp.example.com"
# port = 587
# username = "billing@yourcompany.example"
# password = "app-password"
# from_email = "billing@yourcompany.example"
"#;

/// Template content for clients.toml
pub const CLIENTS_TEMPLATE: &str = r#"# Define your clients here. The table name (e.g., [acme]) is used
# as the client identifier in the send command.
#
# Example:
#   gstbill send --client acme --item "Website Design:1"
#
# state must use the canonical "Name (Code)" form, e.g. "Karnataka (29)".

[example-client]
name = "Example Client Pvt Ltd"
email = "accounts@example.com"
gstin = "29AAACE1234F1Z5"
address = "456 Client Avenue, Bengaluru"
state = "Karnataka (29)"
"#;

/// Template content for products.toml
pub const PRODUCTS_TEMPLATE: &str = r#"# Define your products/services here. Line items reference the
# product by its `name` field.
#
# Example:
#   gstbill send --client example-client --item "Website Design:1" --item "Consulting:8:500"
#
# gst_rate is a fraction (0.18 = 18%).

[website-design]
name = "Website Design"
description = "Design and development of a marketing website"
hsn = "998314"
rate = 25000.00
gst_rate = 0.18

[consulting]
name = "Consulting"
description = "Technical consulting (per hour)"
hsn = "998313"
rate = 1500.00
gst_rate = 0.18
"#;
