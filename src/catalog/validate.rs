//! Field cleaning and validation applied before any write reaches the
//! remote store, the cache, or the sync queue.
//!
//! All functions here are pure; the repository calls them first so that an
//! invalid draft or patch can never be partially persisted.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::StoreError;

use super::types::{CompanyDraft, CompanyPatch, ProductDraft, ProductPatch};

/// Matches `<script>...</script>` fragments, case-insensitive, spanning
/// newlines. Non-greedy so multiple fragments are removed independently.
static SCRIPT_FRAGMENT: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?is)<script\b.*?</script>").expect("script fragment regex"));

/// Strip embedded `<script>` fragments and trim surrounding whitespace.
///
/// This guards stored text against naive markup injection; it is not a
/// substitute for output encoding at render time.
pub fn sanitize_text(input: &str) -> String {
  SCRIPT_FRAGMENT.replace_all(input, "").trim().to_string()
}

/// Parse a raw price field.
///
/// Absent or blank input is a missing field. An unparsable value coerces to
/// `0.0` rather than failing, matching the historical form behavior; a value
/// that does parse but is negative is out of range.
pub fn parse_price(raw: Option<&str>) -> Result<f64, StoreError> {
  let raw = raw
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .ok_or(StoreError::MissingField("price"))?;
  let value = raw.parse::<f64>().unwrap_or(0.0);
  if value < 0.0 {
    return Err(StoreError::InvalidRange { field: "price", value });
  }
  Ok(value)
}

/// Parse a raw stock field. Same lenient rules as [`parse_price`], with the
/// result constrained to a whole number.
pub fn parse_stock(raw: Option<&str>) -> Result<i64, StoreError> {
  let raw = raw
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .ok_or(StoreError::MissingField("stock"))?;
  let value = raw.parse::<i64>().unwrap_or(0);
  if value < 0 {
    return Err(StoreError::InvalidRange { field: "stock", value: value as f64 });
  }
  Ok(value)
}

/// Cleaned fields of a valid company draft.
#[derive(Debug, Clone)]
pub struct CompanyFields {
  pub name: String,
  pub description: String,
  pub logo: Option<String>,
}

/// Cleaned fields of a valid product draft.
#[derive(Debug, Clone)]
pub struct ProductFields {
  pub name: String,
  pub company: String,
  pub price: f64,
  pub stock: i64,
  pub description: String,
  pub photos: Vec<String>,
  pub tags: Vec<String>,
  pub specs: std::collections::BTreeMap<String, String>,
}

/// Validate and clean a company draft.
pub fn company_fields(draft: &CompanyDraft) -> Result<CompanyFields, StoreError> {
  let name = sanitize_text(&draft.name);
  if name.is_empty() {
    return Err(StoreError::MissingField("name"));
  }
  Ok(CompanyFields {
    name,
    description: sanitize_text(&draft.description),
    logo: draft.logo.clone(),
  })
}

/// Validate and clean a product draft.
pub fn product_fields(draft: &ProductDraft) -> Result<ProductFields, StoreError> {
  let name = sanitize_text(&draft.name);
  if name.is_empty() {
    return Err(StoreError::MissingField("name"));
  }
  let company = sanitize_text(&draft.company);
  if company.is_empty() {
    return Err(StoreError::MissingField("company"));
  }
  let price = parse_price(draft.price.as_deref())?;
  let stock = parse_stock(draft.stock.as_deref())?;
  Ok(ProductFields {
    name,
    company,
    price,
    stock,
    description: sanitize_text(&draft.description),
    photos: draft.photos.clone(),
    tags: draft.tags.clone(),
    specs: draft.specs.clone(),
  })
}

/// Validate a company patch into the JSON fields to merge and send.
///
/// Only supplied fields are validated and included, so a patch can never
/// blank out a field it does not mention.
pub fn company_patch_fields(patch: &CompanyPatch) -> Result<Map<String, Value>, StoreError> {
  let mut fields = Map::new();
  if let Some(name) = &patch.name {
    let name = sanitize_text(name);
    if name.is_empty() {
      return Err(StoreError::MissingField("name"));
    }
    fields.insert("name".into(), Value::String(name));
  }
  if let Some(description) = &patch.description {
    fields.insert("description".into(), Value::String(sanitize_text(description)));
  }
  if let Some(logo) = &patch.logo {
    let value = match logo {
      Some(url) => Value::String(url.clone()),
      None => Value::Null,
    };
    fields.insert("logo".into(), value);
  }
  Ok(fields)
}

/// Validate a product patch into the JSON fields to merge and send.
pub fn product_patch_fields(patch: &ProductPatch) -> Result<Map<String, Value>, StoreError> {
  let mut fields = Map::new();
  if let Some(name) = &patch.name {
    let name = sanitize_text(name);
    if name.is_empty() {
      return Err(StoreError::MissingField("name"));
    }
    fields.insert("name".into(), Value::String(name));
  }
  if let Some(company) = &patch.company {
    let company = sanitize_text(company);
    if company.is_empty() {
      return Err(StoreError::MissingField("company"));
    }
    fields.insert("company".into(), Value::String(company));
  }
  if let Some(price) = &patch.price {
    let price = parse_price(Some(price))?;
    fields.insert("price".into(), Value::from(price));
  }
  if let Some(stock) = &patch.stock {
    let stock = parse_stock(Some(stock))?;
    fields.insert("stock".into(), Value::from(stock));
  }
  if let Some(description) = &patch.description {
    fields.insert("description".into(), Value::String(sanitize_text(description)));
  }
  if let Some(photos) = &patch.photos {
    let items = photos.iter().map(|p| Value::String(p.clone())).collect();
    fields.insert("photos".into(), Value::Array(items));
  }
  if let Some(tags) = &patch.tags {
    let items = tags.iter().map(|t| Value::String(t.clone())).collect();
    fields.insert("tags".into(), Value::Array(items));
  }
  if let Some(specs) = &patch.specs {
    let entries = specs
      .iter()
      .map(|(k, v)| (k.clone(), Value::String(v.clone())))
      .collect();
    fields.insert("specs".into(), Value::Object(entries));
  }
  Ok(fields)
}
