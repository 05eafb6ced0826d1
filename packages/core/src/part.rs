// ABOUTME: Normalized part record produced by every vendor integration
// ABOUTME: Immutable once constructed; vendor listings are never merged

use serde::{Deserialize, Serialize};

use crate::vendor::VendorId;

/// A single vendor listing for a part, normalized from the vendor's native shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartRecord {
    pub vendor: VendorId,
    pub vendor_part_number: String,
    pub manufacturer_part_number: String,
    pub description: String,
    pub datasheet_url: Option<String>,
    pub unit_price: f64,
    pub currency: String,
    pub quantity_available: i64,
    pub package_type: Option<String>,
}

impl PartRecord {
    /// Manufacturer part number normalized for cross-vendor grouping
    pub fn normalized_mpn(&self) -> String {
        self.manufacturer_part_number
            .trim()
            .to_ascii_uppercase()
    }
}
