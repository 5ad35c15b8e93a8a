use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::cache::{CacheError, SnapshotCache};
use crate::error::StoreError;
use crate::remote::{RemoteError, RemoteStore};
use crate::sync::{OpKind, PendingOp, SyncQueue};

use super::filter::{matches_search, ProductFilter};
use super::types::{
  Company, CompanyDraft, CompanyPatch, EntityKind, ExportBundle, Product, ProductDraft,
  ProductPatch, Stats,
};
use super::validate;

/// The façade combining the remote store, the local snapshot cache and the
/// sync queue into one CRUD API over the two catalog collections.
///
/// The in-memory collections are the authoritative working copy for the
/// session; the cache and the remote store are durable mirrors, reconciled
/// at initialization and after every queue drain. Mutations branch on the
/// connectivity flag: online they must round-trip through the remote store
/// before committing, offline they commit locally and queue for replay.
pub struct CatalogStore {
  companies: RwLock<Vec<Company>>,
  products: RwLock<Vec<Product>>,
  remote: Arc<dyn RemoteStore>,
  cache: SnapshotCache,
  queue: SyncQueue,
  online: AtomicBool,
}

impl CatalogStore {
  /// Build a store over the given backend and cache. The store starts
  /// online; run a connectivity probe to set the real state, and call
  /// [`init`](Self::init) before first use.
  pub fn new(remote: Arc<dyn RemoteStore>, cache: SnapshotCache) -> Self {
    Self {
      companies: RwLock::new(Vec::new()),
      products: RwLock::new(Vec::new()),
      remote,
      queue: SyncQueue::new(cache.clone()),
      cache,
      online: AtomicBool::new(true),
    }
  }

  // The collections hold plain data, so a poisoned lock (a panicked writer)
  // still guards the best copy we have; recover instead of propagating.
  fn read_companies(&self) -> RwLockReadGuard<'_, Vec<Company>> {
    self.companies.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn write_companies(&self) -> RwLockWriteGuard<'_, Vec<Company>> {
    self.companies.write().unwrap_or_else(PoisonError::into_inner)
  }

  fn read_products(&self) -> RwLockReadGuard<'_, Vec<Product>> {
    self.products.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn write_products(&self) -> RwLockWriteGuard<'_, Vec<Product>> {
    self.products.write().unwrap_or_else(PoisonError::into_inner)
  }

  // ===== Initialization =====

  /// Load the working copy: remote first, local snapshots as fallback.
  ///
  /// Consumes the force-refresh marker; when it was set, both snapshots are
  /// dropped before loading so a remote failure cannot resurrect the stale
  /// cache. Never fails: with no remote and no snapshots the collections
  /// simply start empty.
  pub async fn init(&self) {
    let force_refresh = match self.cache.take_force_refresh() {
      Ok(set) => set,
      Err(e) => {
        warn!(error = %e, "failed to read force-refresh marker");
        false
      }
    };
    if force_refresh {
      info!("force refresh requested, dropping local snapshots");
      if let Err(e) = self.cache.clear_collections() {
        warn!(error = %e, "failed to drop local snapshots");
      }
    }

    if !self.is_online() {
      self.load_snapshots();
      return;
    }

    if let Err(e) = self.load_remote().await {
      warn!(error = %e, "remote load failed, falling back to local snapshots");
      self.load_snapshots();
    }
  }

  /// Replace the working copy from the remote store and refresh snapshots.
  async fn load_remote(&self) -> Result<(), StoreError> {
    let companies: Vec<Company> = self.fetch_collection(EntityKind::Companies).await?;
    let products: Vec<Product> = self.fetch_collection(EntityKind::Products).await?;
    info!(companies = companies.len(), products = products.len(), "loaded catalog from remote");
    *self.write_companies() = companies;
    *self.write_products() = products;
    self.persist(EntityKind::Companies);
    self.persist(EntityKind::Products);
    Ok(())
  }

  async fn fetch_collection<T: DeserializeOwned>(&self, kind: EntityKind) -> Result<Vec<T>, StoreError> {
    let rows = self.remote.select(kind.table()).await?;
    let items = rows
      .into_iter()
      .map(serde_json::from_value)
      .collect::<Result<Vec<T>, _>>()
      .map_err(RemoteError::from)?;
    Ok(items)
  }

  fn load_snapshots(&self) {
    match self.cache.load_collection::<Company>(EntityKind::Companies.snapshot_key()) {
      Ok(Some(companies)) => *self.write_companies() = companies,
      Ok(None) => {}
      Err(e) => warn!(error = %e, "failed to read companies snapshot"),
    }
    match self.cache.load_collection::<Product>(EntityKind::Products.snapshot_key()) {
      Ok(Some(products)) => *self.write_products() = products,
      Ok(None) => {}
      Err(e) => warn!(error = %e, "failed to read products snapshot"),
    }
  }

  /// Persist one collection snapshot, best-effort.
  fn persist(&self, kind: EntityKind) {
    let result = match kind {
      EntityKind::Companies => {
        self.cache.save_collection(kind.snapshot_key(), &self.read_companies())
      }
      EntityKind::Products => {
        self.cache.save_collection(kind.snapshot_key(), &self.read_products())
      }
    };
    if let Err(e) = result {
      warn!(table = %kind, error = %e, "snapshot write failed, continuing on in-memory state");
    }
  }

  // ===== Connectivity =====

  /// Whether the store currently considers the remote reachable.
  pub fn is_online(&self) -> bool {
    self.online.load(Ordering::SeqCst)
  }

  /// Flip to offline. Later mutations commit locally and queue for replay.
  pub fn go_offline(&self) {
    if self.online.swap(false, Ordering::SeqCst) {
      info!("connectivity lost, deferring writes to the sync queue");
    }
  }

  /// Flip to online. On the offline-to-online edge the queue is drained
  /// exactly once; flipping while already online does nothing.
  pub async fn go_online(&self) {
    let was_online = self.online.swap(true, Ordering::SeqCst);
    if !was_online {
      info!("connectivity restored, draining sync queue");
      self.sync_pending().await;
    }
  }

  // ===== Queries =====

  /// Defensive copy of the companies collection.
  pub fn companies(&self) -> Vec<Company> {
    self.read_companies().clone()
  }

  pub fn company_by_id(&self, id: &str) -> Option<Company> {
    self.read_companies().iter().find(|c| c.id == id).cloned()
  }

  /// Defensive copy of the products collection.
  pub fn products(&self) -> Vec<Product> {
    self.read_products().clone()
  }

  pub fn product_by_id(&self, id: &str) -> Option<Product> {
    self.read_products().iter().find(|p| p.id == id).cloned()
  }

  /// Products referencing the given company id.
  pub fn products_by_company(&self, company_id: &str) -> Vec<Product> {
    self
      .read_products()
      .iter()
      .filter(|p| p.company == company_id)
      .cloned()
      .collect()
  }

  /// Products with stock remaining.
  pub fn available_products(&self) -> Vec<Product> {
    self.read_products().iter().filter(|p| p.stock > 0).cloned().collect()
  }

  /// Products matching every criterion of `filter`.
  pub fn filter_products(&self, filter: &ProductFilter) -> Vec<Product> {
    self.read_products().iter().filter(|p| filter.matches(p)).cloned().collect()
  }

  /// Case-insensitive search over product names, descriptions and tags.
  pub fn search_products(&self, query: &str) -> Vec<Product> {
    self
      .read_products()
      .iter()
      .filter(|p| matches_search(p, query))
      .cloned()
      .collect()
  }

  /// Aggregate counters for the admin dashboard.
  pub fn stats(&self) -> Stats {
    let total_companies = self.read_companies().len();
    let products = self.read_products();
    let total_products = products.len();
    let in_stock_products = products.iter().filter(|p| p.stock > 0).count();
    let total_value: f64 = products.iter().map(|p| p.price * p.stock as f64).sum();
    Stats {
      total_products,
      total_companies,
      in_stock_products,
      out_of_stock_products: total_products - in_stock_products,
      total_value: format!("{total_value:.2}"),
    }
  }

  /// Number of queued offline writes.
  pub fn pending_ops(&self) -> usize {
    self.queue.len()
  }

  // ===== Company mutations =====

  /// Validate, clean and persist a new company.
  ///
  /// Online, the remote insert must succeed before the company becomes
  /// visible; offline, it commits locally and queues for replay.
  pub async fn add_company(&self, draft: CompanyDraft) -> Result<Company, StoreError> {
    let fields = validate::company_fields(&draft)?;
    let company = Company {
      id: generate_id(),
      name: fields.name,
      description: fields.description,
      logo: fields.logo,
      created_at: Utc::now(),
      updated_at: None,
    };
    let row = to_row(&company)?;

    let stored = if self.is_online() {
      let rows = self.remote.insert(EntityKind::Companies.table(), row).await?;
      first_row(rows)?
    } else {
      self.queue.enqueue(EntityKind::Companies, OpKind::Insert, row);
      company
    };

    self.write_companies().push(stored.clone());
    self.persist(EntityKind::Companies);
    Ok(stored)
  }

  /// Merge `patch` into the company with the given id.
  ///
  /// Returns `Ok(None)` when no such company exists. Unsupplied fields stay
  /// untouched; `updated_at` is stamped on every successful update.
  pub async fn update_company(&self, id: &str, patch: CompanyPatch) -> Result<Option<Company>, StoreError> {
    let Some(current) = self.company_by_id(id) else {
      return Ok(None);
    };

    let mut fields = validate::company_patch_fields(&patch)?;
    fields.insert("updated_at".into(), timestamp_value());

    if self.is_online() {
      self
        .remote
        .update(EntityKind::Companies.table(), id, Value::Object(fields.clone()))
        .await?;
    } else {
      let mut payload = fields.clone();
      payload.insert("id".into(), Value::String(id.to_string()));
      self.queue.enqueue(EntityKind::Companies, OpKind::Update, Value::Object(payload));
    }

    let updated: Company = merge_record(&current, &fields)?;
    {
      let mut companies = self.write_companies();
      if let Some(slot) = companies.iter_mut().find(|c| c.id == id) {
        *slot = updated.clone();
      }
    }
    self.persist(EntityKind::Companies);
    Ok(Some(updated))
  }

  /// Delete a company.
  ///
  /// Fails with [`StoreError::ReferentialConstraint`] while any product
  /// still references the id; returns `Ok(false)` for an unknown id.
  pub async fn delete_company(&self, id: &str) -> Result<bool, StoreError> {
    let product_count = self.read_products().iter().filter(|p| p.company == id).count();
    if product_count > 0 {
      return Err(StoreError::ReferentialConstraint { id: id.to_string(), product_count });
    }
    if self.company_by_id(id).is_none() {
      return Ok(false);
    }

    if self.is_online() {
      self.remote.delete(EntityKind::Companies.table(), id).await?;
    } else {
      self.queue.enqueue(EntityKind::Companies, OpKind::Delete, json!({ "id": id }));
    }

    self.write_companies().retain(|c| c.id != id);
    self.persist(EntityKind::Companies);
    Ok(true)
  }

  // ===== Product mutations =====

  /// Validate, clean and persist a new product.
  pub async fn add_product(&self, draft: ProductDraft) -> Result<Product, StoreError> {
    let fields = validate::product_fields(&draft)?;
    let product = Product {
      id: generate_id(),
      name: fields.name,
      company: fields.company,
      price: fields.price,
      stock: fields.stock,
      description: fields.description,
      photos: fields.photos,
      tags: fields.tags,
      specs: fields.specs,
      created_at: Utc::now(),
      updated_at: None,
    };
    let row = to_row(&product)?;

    let stored = if self.is_online() {
      let rows = self.remote.insert(EntityKind::Products.table(), row).await?;
      first_row(rows)?
    } else {
      self.queue.enqueue(EntityKind::Products, OpKind::Insert, row);
      product
    };

    self.write_products().push(stored.clone());
    self.persist(EntityKind::Products);
    Ok(stored)
  }

  /// Merge `patch` into the product with the given id. Same contract as
  /// [`update_company`](Self::update_company).
  pub async fn update_product(&self, id: &str, patch: ProductPatch) -> Result<Option<Product>, StoreError> {
    let Some(current) = self.product_by_id(id) else {
      return Ok(None);
    };

    let mut fields = validate::product_patch_fields(&patch)?;
    fields.insert("updated_at".into(), timestamp_value());

    if self.is_online() {
      self
        .remote
        .update(EntityKind::Products.table(), id, Value::Object(fields.clone()))
        .await?;
    } else {
      let mut payload = fields.clone();
      payload.insert("id".into(), Value::String(id.to_string()));
      self.queue.enqueue(EntityKind::Products, OpKind::Update, Value::Object(payload));
    }

    let updated: Product = merge_record(&current, &fields)?;
    {
      let mut products = self.write_products();
      if let Some(slot) = products.iter_mut().find(|p| p.id == id) {
        *slot = updated.clone();
      }
    }
    self.persist(EntityKind::Products);
    Ok(Some(updated))
  }

  /// Delete a product. Returns `Ok(false)` for an unknown id.
  pub async fn delete_product(&self, id: &str) -> Result<bool, StoreError> {
    if self.product_by_id(id).is_none() {
      return Ok(false);
    }

    if self.is_online() {
      self.remote.delete(EntityKind::Products.table(), id).await?;
    } else {
      self.queue.enqueue(EntityKind::Products, OpKind::Delete, json!({ "id": id }));
    }

    self.write_products().retain(|p| p.id != id);
    self.persist(EntityKind::Products);
    Ok(true)
  }

  // ===== Sync =====

  /// Replay queued operations against the remote store.
  ///
  /// Records are replayed in enqueue order; a failing record is logged and
  /// skipped rather than aborting the drain. When at least one record went
  /// through, the queue is cleared and the working copy is reloaded from the
  /// remote store; when none did, the queue is kept for the next attempt.
  pub async fn sync_pending(&self) {
    let ops = self.queue.load();
    if ops.is_empty() {
      return;
    }

    let mut replayed = 0usize;
    for op in &ops {
      match self.replay(op).await {
        Ok(()) => replayed += 1,
        Err(e) => {
          warn!(table = %op.entity, op = ?op.op, error = %e, "replay failed, skipping record");
        }
      }
    }

    if replayed == 0 {
      info!(pending = ops.len(), "sync made no progress, keeping queue");
      return;
    }

    self.queue.clear();
    if let Err(e) = self.load_remote().await {
      warn!(error = %e, "reload after sync failed");
    }
    info!(replayed, total = ops.len(), "sync queue drained");
  }

  async fn replay(&self, op: &PendingOp) -> Result<(), RemoteError> {
    let table = op.entity.table();
    match op.op {
      OpKind::Insert => {
        self.remote.insert(table, op.payload.clone()).await?;
      }
      OpKind::Update => {
        let id = payload_id(&op.payload)?;
        self.remote.update(table, id, op.payload.clone()).await?;
      }
      OpKind::Delete => {
        let id = payload_id(&op.payload)?;
        self.remote.delete(table, id).await?;
      }
    }
    Ok(())
  }

  // ===== Maintenance =====

  /// Snapshot both collections for export.
  pub fn export_bundle(&self) -> ExportBundle {
    ExportBundle {
      companies: self.companies(),
      products: self.products(),
      exported_at: Utc::now(),
    }
  }

  /// Replace both collections from an exported bundle.
  ///
  /// Local-only: snapshots are refreshed but nothing is written to the
  /// remote store or the queue; the next refresh reconciles.
  pub fn import_bundle(&self, bundle: ExportBundle) {
    *self.write_companies() = bundle.companies;
    *self.write_products() = bundle.products;
    self.persist(EntityKind::Companies);
    self.persist(EntityKind::Products);
  }

  /// Drop both local snapshots. The in-memory working copy is untouched.
  pub fn reset_local(&self) {
    if let Err(e) = self.cache.clear_collections() {
      warn!(error = %e, "failed to drop local snapshots");
    }
  }

  /// Ask the next initialization to bypass and clear the local cache.
  pub fn flag_force_refresh(&self) -> Result<(), CacheError> {
    self.cache.set_force_refresh()
  }
}

/// Generate a collision-unlikely id: unix millis plus a random base36 tail.
pub fn generate_id() -> String {
  const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
  let mut rng = rand::thread_rng();
  let tail: String = (0..9)
    .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
    .collect();
  format!("id_{}_{}", Utc::now().timestamp_millis(), tail)
}

fn to_row<T: Serialize>(entity: &T) -> Result<Value, StoreError> {
  Ok(serde_json::to_value(entity).map_err(RemoteError::from)?)
}

fn first_row<T: DeserializeOwned>(rows: Vec<Value>) -> Result<T, StoreError> {
  let row = rows.into_iter().next().ok_or(RemoteError::EmptyReply)?;
  let entity = serde_json::from_value(row).map_err(RemoteError::from)?;
  Ok(entity)
}

/// Merge patch fields into the JSON image of `current` and read the result
/// back as the entity type. One merge path serves both the local working
/// copy and the snapshot, so they cannot drift.
fn merge_record<T>(current: &T, fields: &Map<String, Value>) -> Result<T, StoreError>
where
  T: Serialize + DeserializeOwned,
{
  let mut image = serde_json::to_value(current).map_err(RemoteError::from)?;
  if let Value::Object(map) = &mut image {
    for (key, value) in fields {
      map.insert(key.clone(), value.clone());
    }
  }
  let merged = serde_json::from_value(image).map_err(RemoteError::from)?;
  Ok(merged)
}

fn timestamp_value() -> Value {
  serde_json::to_value(Utc::now()).unwrap_or(Value::Null)
}

fn payload_id(payload: &Value) -> Result<&str, RemoteError> {
  payload
    .get("id")
    .and_then(Value::as_str)
    .ok_or(RemoteError::Api { status: 400, message: String::from("queued payload has no id") })
}
