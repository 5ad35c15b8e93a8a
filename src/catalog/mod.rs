//! Catalog domain: entities, validation, and the repository façade.

mod filter;
mod store;
mod types;
pub mod validate;

pub use filter::{matches_search, ProductFilter};
pub use store::{generate_id, CatalogStore};
pub use types::{
  Company, CompanyDraft, CompanyPatch, EntityKind, ExportBundle, Product, ProductDraft,
  ProductPatch, Stats,
};
