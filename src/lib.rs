//! Offline-first data layer for a small storefront catalog.
//!
//! The crate manages two collections, companies and products, against a
//! hosted Supabase backend. Reads come from an in-memory working copy loaded
//! at startup; writes round-trip through the remote store while it is
//! reachable and fall back to a durable sync queue while it is not. Every
//! state change is mirrored into a local SQLite snapshot cache so a session
//! can start with no network at all.

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod remote;
pub mod seed;
pub mod sync;

pub use catalog::CatalogStore;
pub use error::StoreError;
