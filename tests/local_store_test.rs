//! Catalog store over the real SQLite-backed local store.

use std::sync::Arc;

use tempfile::TempDir;
use vitrina::cache::{SnapshotCache, SqliteLocal};
use vitrina::catalog::{CatalogStore, CompanyDraft, ProductDraft};
use vitrina::remote::MemoryRemote;

fn open_store(dir: &TempDir, remote: Arc<MemoryRemote>) -> CatalogStore {
  let local = SqliteLocal::open_at(&dir.path().join("local.db")).expect("open sqlite store");
  CatalogStore::new(remote, SnapshotCache::new(Arc::new(local)))
}

#[tokio::test]
async fn test_snapshots_survive_process_restart() {
  let dir = TempDir::new().unwrap();
  let remote = Arc::new(MemoryRemote::new());

  let store = open_store(&dir, remote.clone());
  let company = store
    .add_company(CompanyDraft {
      name: "Acme".into(),
      description: "tools".into(),
      logo: None,
    })
    .await
    .unwrap();
  store
    .add_product(ProductDraft {
      name: "Widget".into(),
      company: company.id.clone(),
      price: Some("9.99".into()),
      stock: Some("3".into()),
      description: "a widget".into(),
      ..Default::default()
    })
    .await
    .unwrap();
  drop(store);

  // reopen the same database with the remote gone
  remote.set_reachable(false);
  let reopened = open_store(&dir, remote);
  reopened.init().await;

  assert_eq!(reopened.companies().len(), 1);
  assert_eq!(reopened.products().len(), 1);
  let product = &reopened.products()[0];
  assert_eq!(product.name, "Widget");
  assert_eq!(product.price, 9.99);
  assert_eq!(product.stock, 3);
}

#[tokio::test]
async fn test_queue_survives_process_restart() {
  let dir = TempDir::new().unwrap();
  let remote = Arc::new(MemoryRemote::new());

  let store = open_store(&dir, remote.clone());
  store.go_offline();
  store
    .add_company(CompanyDraft { name: "Queued".into(), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(store.pending_ops(), 1);
  drop(store);

  let reopened = open_store(&dir, remote.clone());
  assert_eq!(reopened.pending_ops(), 1);

  reopened.init().await;
  reopened.sync_pending().await;

  assert_eq!(reopened.pending_ops(), 0);
  assert_eq!(remote.stored_rows("companies").len(), 1);
}

#[tokio::test]
async fn test_force_refresh_flag_survives_restart() {
  let dir = TempDir::new().unwrap();
  let remote = Arc::new(MemoryRemote::new());

  let store = open_store(&dir, remote.clone());
  store.add_company(CompanyDraft { name: "Old".into(), ..Default::default() }).await.unwrap();
  store.flag_force_refresh().unwrap();
  drop(store);

  // the flag set in the previous session clears the cache before this load
  remote.set_reachable(false);
  let reopened = open_store(&dir, remote);
  reopened.init().await;
  assert!(reopened.companies().is_empty());
}
