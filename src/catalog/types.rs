use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{COMPANIES_KEY, PRODUCTS_KEY};

/// The two collections managed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
  Companies,
  Products,
}

impl EntityKind {
  /// Remote table name.
  pub fn table(&self) -> &'static str {
    match self {
      EntityKind::Companies => "companies",
      EntityKind::Products => "products",
    }
  }

  /// Local snapshot key, kept byte-compatible with the original web storage.
  pub fn snapshot_key(&self) -> &'static str {
    match self {
      EntityKind::Companies => COMPANIES_KEY,
      EntityKind::Products => PRODUCTS_KEY,
    }
  }
}

impl fmt::Display for EntityKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.table())
  }
}

/// A vendor whose products appear in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub logo: Option<String>,
  pub created_at: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub updated_at: Option<DateTime<Utc>>,
}

/// A catalog item belonging to exactly one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: String,
  pub name: String,
  /// Id of the owning [`Company`].
  pub company: String,
  pub price: f64,
  pub stock: i64,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub photos: Vec<String>,
  #[serde(default)]
  pub tags: Vec<String>,
  #[serde(default)]
  pub specs: BTreeMap<String, String>,
  pub created_at: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub updated_at: Option<DateTime<Utc>>,
}

/// Raw form input for creating a company. Fields are cleaned and validated
/// before anything is persisted.
#[derive(Debug, Clone, Default)]
pub struct CompanyDraft {
  pub name: String,
  pub description: String,
  pub logo: Option<String>,
}

/// Raw form input for creating a product.
///
/// `price` and `stock` arrive as the raw text the form submitted; parsing is
/// deliberately lenient (see [`validate`](super::validate)).
#[derive(Debug, Clone, Default)]
pub struct ProductDraft {
  pub name: String,
  pub company: String,
  pub price: Option<String>,
  pub stock: Option<String>,
  pub description: String,
  pub photos: Vec<String>,
  pub tags: Vec<String>,
  pub specs: BTreeMap<String, String>,
}

/// Partial update for a company. `None` leaves the field untouched; for
/// `logo` the inner option distinguishes clearing from keeping.
#[derive(Debug, Clone, Default)]
pub struct CompanyPatch {
  pub name: Option<String>,
  pub description: Option<String>,
  pub logo: Option<Option<String>>,
}

/// Partial update for a product. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
  pub name: Option<String>,
  pub company: Option<String>,
  pub price: Option<String>,
  pub stock: Option<String>,
  pub description: Option<String>,
  pub photos: Option<Vec<String>>,
  pub tags: Option<Vec<String>>,
  pub specs: Option<BTreeMap<String, String>>,
}

/// Aggregate catalog counters for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
  pub total_products: usize,
  pub total_companies: usize,
  pub in_stock_products: usize,
  pub out_of_stock_products: usize,
  /// Sum of price times stock over all products, formatted to two decimals.
  pub total_value: String,
}

/// Whole-catalog snapshot for backup and migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportBundle {
  pub companies: Vec<Company>,
  pub products: Vec<Product>,
  pub exported_at: DateTime<Utc>,
}
