use serde::{Deserialize, Serialize};

/// A catalog entry from products.toml. Line items reference products
/// by `name`; `rate` and `gst_rate` are the per-unit defaults.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Product {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hsn: String,
    pub rate: f64,
    /// Fraction, e.g. 0.18 for 18% GST. Absent means untaxed.
    #[serde(default)]
    pub gst_rate: f64,
}
