//! JSON Schema validation of the offers catalogue.
//!
//! Offer rows are checked against `schemas/offer.json` (Draft 7, embedded
//! at compile time) before they are typed. Rows that fail are left out of
//! the catalogue and reported, so one bad line does not sink a run.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use offer_funnel::validation::{is_valid_offer, validate_offer};
//!
//! let offer = json!({
//!     "offer_id": "ae264e3637204a6fb9bb56bc8210ddfd",
//!     "offer_type": "bogo",
//!     "difficulty": 10, "reward": 10, "duration": 7
//! });
//! assert!(is_valid_offer(&offer));
//!
//! let broken = json!({ "offer_id": "", "offer_type": "bogo" });
//! assert!(validate_offer(&broken).is_err());
//! ```

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

use crate::models::Offer;

static OFFER_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/offer.json"))
        .expect("Invalid embedded schema")
});

/// Validate a JSON value against a JSON schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with every violation otherwise
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick true/false check.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate an offer row against the embedded offer schema.
pub fn validate_offer(data: &Value) -> Result<(), Vec<String>> {
    validate(&OFFER_SCHEMA, data)
}

pub fn is_valid_offer(data: &Value) -> bool {
    is_valid(&OFFER_SCHEMA, data)
}

/// An offer row that was left out of the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedOffer {
    /// Zero-based data row index
    pub row: usize,
    pub errors: Vec<String>,
}

/// Validated offers plus what was rejected on the way.
#[derive(Debug, Clone, Default)]
pub struct OfferCatalog {
    pub offers: Vec<Offer>,
    pub rejected: Vec<RejectedOffer>,
    /// Rows whose offer id was already taken by an earlier row
    pub duplicates: usize,
}

/// Counters describing an [`OfferCatalog`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub loaded: usize,
    pub rejected: usize,
    pub duplicates: usize,
}

impl OfferCatalog {
    /// Validate and type offer rows. The first row for an offer id wins.
    pub fn from_rows(rows: Vec<Value>) -> Self {
        let mut catalog = Self::default();
        let mut seen = HashSet::new();

        for (row, data) in rows.into_iter().enumerate() {
            if let Err(errors) = validate_offer(&data) {
                catalog.rejected.push(RejectedOffer { row, errors });
                continue;
            }

            let offer: Offer = match serde_json::from_value(data) {
                Ok(offer) => offer,
                Err(e) => {
                    catalog.rejected.push(RejectedOffer {
                        row,
                        errors: vec![e.to_string()],
                    });
                    continue;
                }
            };

            if !seen.insert(offer.offer_id.clone()) {
                catalog.duplicates += 1;
                continue;
            }
            catalog.offers.push(offer);
        }

        catalog
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            loaded: self.offers.len(),
            rejected: self.rejected.len(),
            duplicates: self.duplicates,
        }
    }
}
