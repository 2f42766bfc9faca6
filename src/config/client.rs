use serde::{Deserialize, Serialize};

/// A buyer record from clients.toml.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Client {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub gstin: String,
    pub address: String,
    pub state: String,
}
