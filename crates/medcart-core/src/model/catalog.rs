use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Price in the smallest currency unit.
    pub price: u64,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub category_id: Option<u64>,
    #[serde(default)]
    pub pharmacy_id: Option<u64>,
    /// Prescription-only products cannot be added to a cart directly.
    #[serde(default)]
    pub requires_prescription: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pharmacy {
    pub id: u64,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub pharmacist_name: Option<String>,
    #[serde(default)]
    pub operational_hours: Option<String>,
}
