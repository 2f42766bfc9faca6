pub mod actions;
pub mod config;
pub mod error;
pub mod invoice;
pub mod mail;
pub mod render;
pub mod states;
pub mod tax;
pub mod words;

pub use config::{Archive, Client, Company, Config, Product, Tracker, TrackerEntry};
pub use error::{BillError, Result};
pub use invoice::{compose, reconstruct, Invoice, Status};
