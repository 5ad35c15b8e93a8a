//! End-to-end tests of the catalog store over in-memory backends.

use std::sync::Arc;

use serde_json::json;
use vitrina::cache::{LocalStore, MemoryLocal, SnapshotCache, COMPANIES_KEY};
use vitrina::catalog::{CatalogStore, CompanyDraft, CompanyPatch, ProductDraft, ProductFilter, ProductPatch};
use vitrina::remote::{MemoryRemote, RemoteStore};
use vitrina::sync::{OpKind, SyncQueue};
use vitrina::StoreError;

struct Harness {
  store: CatalogStore,
  remote: Arc<MemoryRemote>,
  local: Arc<MemoryLocal>,
}

fn harness() -> Harness {
  let remote = Arc::new(MemoryRemote::new());
  let local = Arc::new(MemoryLocal::new());
  let store = CatalogStore::new(remote.clone(), SnapshotCache::new(local.clone()));
  Harness { store, remote, local }
}

fn company_draft(name: &str) -> CompanyDraft {
  CompanyDraft {
    name: name.into(),
    description: format!("{name} test vendor"),
    logo: None,
  }
}

fn product_draft(name: &str, company: &str, price: &str, stock: &str) -> ProductDraft {
  ProductDraft {
    name: name.into(),
    company: company.into(),
    price: Some(price.into()),
    stock: Some(stock.into()),
    description: "test product".into(),
    ..Default::default()
  }
}

fn queue_of(local: &Arc<MemoryLocal>) -> SyncQueue {
  SyncQueue::new(SnapshotCache::new(local.clone()))
}

// ===== Online CRUD =====

#[tokio::test]
async fn test_add_company_round_trips_through_remote() {
  let h = harness();
  let company = h.store.add_company(company_draft("Acme")).await.unwrap();

  assert!(company.id.starts_with("id_"));
  assert_eq!(company.name, "Acme");

  let rows = h.remote.stored_rows("companies");
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0]["id"], json!(company.id));

  let snapshot = h.local.load(COMPANIES_KEY).unwrap().unwrap();
  assert!(snapshot.contains(&company.id));
}

#[tokio::test]
async fn test_add_rejects_missing_name() {
  let h = harness();
  let err = h.store.add_company(company_draft("")).await.unwrap_err();
  assert!(matches!(err, StoreError::MissingField("name")));

  // nothing was sent, queued, or cached
  assert!(h.remote.calls().is_empty());
  assert_eq!(h.store.pending_ops(), 0);
  assert!(h.local.load(COMPANIES_KEY).unwrap().is_none());
}

#[tokio::test]
async fn test_add_product_requires_price_and_stock() {
  let h = harness();
  let company = h.store.add_company(company_draft("Acme")).await.unwrap();

  let mut draft = product_draft("Widget", &company.id, "1.0", "1");
  draft.price = None;
  assert!(matches!(
    h.store.add_product(draft).await.unwrap_err(),
    StoreError::MissingField("price")
  ));

  let mut draft = product_draft("Widget", &company.id, "1.0", "1");
  draft.stock = Some("  ".into());
  assert!(matches!(
    h.store.add_product(draft).await.unwrap_err(),
    StoreError::MissingField("stock")
  ));
}

#[tokio::test]
async fn test_unparsable_numbers_coerce_to_zero_but_negatives_fail() {
  let h = harness();
  let company = h.store.add_company(company_draft("Acme")).await.unwrap();

  let product = h
    .store
    .add_product(product_draft("Odd", &company.id, "not-a-number", "12"))
    .await
    .unwrap();
  assert_eq!(product.price, 0.0);
  assert_eq!(product.stock, 12);

  let err = h
    .store
    .add_product(product_draft("Bad", &company.id, "-5", "1"))
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::InvalidRange { field: "price", .. }));
}

#[tokio::test]
async fn test_script_fragments_are_stripped_before_any_write() {
  let h = harness();
  let company = h
    .store
    .add_company(CompanyDraft {
      name: "<script>alert(1)</script>Acme".into(),
      description: "  clean <script>\nnested()\n</script> me  ".into(),
      logo: None,
    })
    .await
    .unwrap();

  assert_eq!(company.name, "Acme");
  assert_eq!(company.description, "clean  me");

  let rows = h.remote.stored_rows("companies");
  assert_eq!(rows[0]["name"], json!("Acme"));
}

#[tokio::test]
async fn test_lists_return_defensive_copies() {
  let h = harness();
  h.store.add_company(company_draft("Acme")).await.unwrap();

  let mut copy = h.store.companies();
  copy.clear();
  assert_eq!(h.store.companies().len(), 1);
}

#[tokio::test]
async fn test_unknown_ids_are_not_errors() {
  let h = harness();
  assert!(h.store.company_by_id("nope").is_none());
  assert!(h.store.update_product("nope", ProductPatch::default()).await.unwrap().is_none());
  assert!(!h.store.delete_product("nope").await.unwrap());
  // none of those should have touched the network
  assert!(h.remote.calls().is_empty());
}

#[tokio::test]
async fn test_update_merges_only_supplied_fields() {
  let h = harness();
  let company = h.store.add_company(company_draft("Acme")).await.unwrap();
  let product = h
    .store
    .add_product(product_draft("Widget", &company.id, "19.99", "4"))
    .await
    .unwrap();

  let patch = ProductPatch { stock: Some("3".into()), ..Default::default() };
  let updated = h.store.update_product(&product.id, patch).await.unwrap().unwrap();

  assert_eq!(updated.stock, 3);
  assert_eq!(updated.name, "Widget");
  assert_eq!(updated.price, 19.99);
  assert_eq!(updated.created_at, product.created_at);
  assert!(updated.updated_at.is_some());

  let rows = h.remote.stored_rows("products");
  assert_eq!(rows[0]["stock"], json!(3));
  assert_eq!(rows[0]["name"], json!("Widget"));
}

#[tokio::test]
async fn test_delete_company_refused_while_products_reference_it() {
  let h = harness();
  let company = h.store.add_company(company_draft("Acme")).await.unwrap();
  let product = h
    .store
    .add_product(product_draft("Widget", &company.id, "1.0", "1"))
    .await
    .unwrap();

  match h.store.delete_company(&company.id).await {
    Err(StoreError::ReferentialConstraint { product_count, .. }) => assert_eq!(product_count, 1),
    other => panic!("expected ReferentialConstraint, got {other:?}"),
  }
  assert!(h.store.company_by_id(&company.id).is_some());

  assert!(h.store.delete_product(&product.id).await.unwrap());
  assert!(h.store.delete_company(&company.id).await.unwrap());
  assert!(h.store.companies().is_empty());
  assert!(h.remote.stored_rows("companies").is_empty());
}

// ===== Online failures vs offline queueing =====

#[tokio::test]
async fn test_online_remote_failure_surfaces_and_queues_nothing() {
  let h = harness();
  h.remote.set_reachable(false);

  // the store still believes it is online, so the failure must surface
  let err = h.store.add_company(company_draft("Acme")).await.unwrap_err();
  assert!(matches!(err, StoreError::RemoteUnavailable(_)));
  assert_eq!(h.store.pending_ops(), 0);
  assert!(h.store.companies().is_empty());
}

#[tokio::test]
async fn test_offline_add_commits_locally_and_queues() {
  let h = harness();
  h.store.go_offline();

  let company = h.store.add_company(company_draft("Acme")).await.unwrap();

  assert_eq!(h.store.companies().len(), 1);
  assert_eq!(h.store.pending_ops(), 1);
  assert!(h.remote.calls().is_empty());

  let ops = queue_of(&h.local).load();
  assert_eq!(ops[0].op, OpKind::Insert);
  assert_eq!(ops[0].payload["id"], json!(company.id));
}

#[tokio::test]
async fn test_going_online_drains_queue_exactly_once() {
  let h = harness();
  h.store.go_offline();
  let product_id;
  {
    let company = h.store.add_company(company_draft("Acme")).await.unwrap();
    let product = h
      .store
      .add_product(product_draft("Widget", &company.id, "9.99", "2"))
      .await
      .unwrap();
    product_id = product.id;
  }
  assert_eq!(h.store.pending_ops(), 2);

  h.store.go_online().await;

  assert_eq!(h.store.pending_ops(), 0);
  let inserts: Vec<_> = h.remote.calls().into_iter().filter(|c| c.op == "insert").collect();
  assert_eq!(inserts.len(), 2);
  assert_eq!(h.remote.stored_rows("products").len(), 1);

  // flipping online again is a no-op, nothing is replayed twice
  let calls_before = h.remote.calls().len();
  h.store.go_online().await;
  assert_eq!(h.remote.calls().len(), calls_before);

  // the optimistic id survived the replay
  assert!(h.store.product_by_id(&product_id).is_some());
}

#[tokio::test]
async fn test_offline_update_and_delete_replay_in_order() {
  let h = harness();
  let company = h.store.add_company(company_draft("Acme")).await.unwrap();
  let keep = h
    .store
    .add_product(product_draft("Keep", &company.id, "5.00", "1"))
    .await
    .unwrap();
  let discard = h
    .store
    .add_product(product_draft("Discard", &company.id, "6.00", "1"))
    .await
    .unwrap();

  h.store.go_offline();
  h.store
    .update_product(&keep.id, ProductPatch { stock: Some("9".into()), ..Default::default() })
    .await
    .unwrap();
  h.store.delete_product(&discard.id).await.unwrap();

  let ops = queue_of(&h.local).load();
  assert_eq!(ops.len(), 2);
  assert_eq!(ops[0].op, OpKind::Update);
  assert_eq!(ops[1].op, OpKind::Delete);

  h.store.go_online().await;

  let rows = h.remote.stored_rows("products");
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0]["id"], json!(keep.id));
  assert_eq!(rows[0]["stock"], json!(9));
}

#[tokio::test]
async fn test_partial_drain_skips_failures_and_clears_queue() {
  let h = harness();
  h.store.go_offline();
  let a = h.store.add_company(company_draft("Alpha")).await.unwrap();
  let b = h.store.add_company(company_draft("Beta")).await.unwrap();

  // another writer took Beta's id in the meantime, so that replay conflicts
  h.remote
    .insert(
      "companies",
      json!({
        "id": b.id,
        "name": "Foreign Beta",
        "description": "",
        "created_at": "2026-01-01T00:00:00Z"
      }),
    )
    .await
    .unwrap();

  h.store.go_online().await;

  // one success is enough to clear the queue; the failed record is dropped
  assert_eq!(h.store.pending_ops(), 0);
  let names: Vec<String> = h
    .store
    .companies()
    .into_iter()
    .map(|c| c.name)
    .collect();
  assert!(names.contains(&"Alpha".to_string()));
  assert!(names.contains(&"Foreign Beta".to_string()));
  assert!(h.store.company_by_id(&a.id).is_some());
}

#[tokio::test]
async fn test_failed_drain_keeps_queue_for_next_attempt() {
  let h = harness();
  h.store.go_offline();
  h.store.add_company(company_draft("Acme")).await.unwrap();

  h.remote.set_reachable(false);
  h.store.sync_pending().await;
  assert_eq!(h.store.pending_ops(), 1);

  h.remote.set_reachable(true);
  h.store.sync_pending().await;
  assert_eq!(h.store.pending_ops(), 0);
  assert_eq!(h.remote.stored_rows("companies").len(), 1);
}

// ===== Initialization, snapshots, restarts =====

#[tokio::test]
async fn test_init_loads_from_remote_and_seeds_snapshots() {
  let h = harness();
  h.remote
    .insert(
      "companies",
      json!({
        "id": "c_1",
        "name": "Seeded",
        "description": "",
        "created_at": "2026-01-01T00:00:00Z"
      }),
    )
    .await
    .unwrap();

  h.store.init().await;

  assert_eq!(h.store.companies().len(), 1);
  assert!(h.local.load(COMPANIES_KEY).unwrap().unwrap().contains("Seeded"));
}

#[tokio::test]
async fn test_init_falls_back_to_snapshots_when_remote_fails() {
  let remote = Arc::new(MemoryRemote::new());
  let local = Arc::new(MemoryLocal::new());

  let first = CatalogStore::new(remote.clone(), SnapshotCache::new(local.clone()));
  first.add_company(company_draft("Cached")).await.unwrap();
  drop(first);

  remote.set_reachable(false);
  let second = CatalogStore::new(remote.clone(), SnapshotCache::new(local.clone()));
  second.init().await;

  assert_eq!(second.companies().len(), 1);
  assert_eq!(second.companies()[0].name, "Cached");
}

#[tokio::test]
async fn test_corrupt_snapshot_reads_as_empty() {
  let h = harness();
  h.local.save(COMPANIES_KEY, "{definitely not json").unwrap();
  h.remote.set_reachable(false);

  h.store.init().await;
  assert!(h.store.companies().is_empty());
}

#[tokio::test]
async fn test_restart_replays_offline_work() {
  let remote = Arc::new(MemoryRemote::new());
  let local = Arc::new(MemoryLocal::new());

  // first session: offline, one optimistic write
  let first = CatalogStore::new(remote.clone(), SnapshotCache::new(local.clone()));
  first.go_offline();
  let company = first.add_company(company_draft("Acme")).await.unwrap();
  drop(first);

  // second session, still offline: the snapshot carries the commit
  remote.set_reachable(false);
  let second = CatalogStore::new(remote.clone(), SnapshotCache::new(local.clone()));
  second.go_offline();
  second.init().await;
  assert!(second.company_by_id(&company.id).is_some());
  drop(second);

  // third session, online again: startup flush lands the queued insert
  remote.set_reachable(true);
  let third = CatalogStore::new(remote.clone(), SnapshotCache::new(local.clone()));
  third.init().await;
  third.sync_pending().await;

  assert_eq!(third.pending_ops(), 0);
  assert_eq!(remote.stored_rows("companies").len(), 1);
  assert!(third.company_by_id(&company.id).is_some());
}

#[tokio::test]
async fn test_force_refresh_bypasses_and_clears_cache() {
  let remote = Arc::new(MemoryRemote::new());
  let local = Arc::new(MemoryLocal::new());

  let first = CatalogStore::new(remote.clone(), SnapshotCache::new(local.clone()));
  first.add_company(company_draft("Stale")).await.unwrap();
  drop(first);

  // remote gained a row the snapshot does not know about
  remote
    .insert(
      "companies",
      json!({
        "id": "c_new",
        "name": "Fresh",
        "description": "",
        "created_at": "2026-02-01T00:00:00Z"
      }),
    )
    .await
    .unwrap();

  let second = CatalogStore::new(remote.clone(), SnapshotCache::new(local.clone()));
  second.flag_force_refresh().unwrap();
  second.init().await;

  let names: Vec<String> = second.companies().into_iter().map(|c| c.name).collect();
  assert!(names.contains(&"Fresh".to_string()));
  assert!(names.contains(&"Stale".to_string()));
}

#[tokio::test]
async fn test_force_refresh_with_dead_remote_cannot_resurrect_cache() {
  let remote = Arc::new(MemoryRemote::new());
  let local = Arc::new(MemoryLocal::new());

  let first = CatalogStore::new(remote.clone(), SnapshotCache::new(local.clone()));
  first.add_company(company_draft("Stale")).await.unwrap();
  drop(first);

  remote.set_reachable(false);
  let second = CatalogStore::new(remote.clone(), SnapshotCache::new(local.clone()));
  second.flag_force_refresh().unwrap();
  second.init().await;

  // snapshots were dropped before the load attempt, so nothing comes back
  assert!(second.companies().is_empty());
}

// ===== Queries and maintenance =====

#[tokio::test]
async fn test_stats_counts_and_formats_value() {
  let h = harness();
  let company = h.store.add_company(company_draft("Acme")).await.unwrap();
  h.store.add_product(product_draft("A", &company.id, "10.00", "2")).await.unwrap();
  h.store.add_product(product_draft("B", &company.id, "5.00", "0")).await.unwrap();

  let stats = h.store.stats();
  assert_eq!(stats.total_products, 2);
  assert_eq!(stats.total_companies, 1);
  assert_eq!(stats.in_stock_products, 1);
  assert_eq!(stats.out_of_stock_products, 1);
  assert_eq!(stats.total_value, "20.00");
}

#[tokio::test]
async fn test_filters_and_search() {
  let h = harness();
  let acme = h.store.add_company(company_draft("Acme")).await.unwrap();
  let globex = h.store.add_company(company_draft("Globex")).await.unwrap();

  let mut speaker = product_draft("Smart Speaker", &acme.id, "49.99", "5");
  speaker.tags = vec!["audio".into(), "smart-home".into()];
  h.store.add_product(speaker).await.unwrap();

  let mut lamp = product_draft("Desk Lamp", &globex.id, "19.99", "0");
  lamp.tags = vec!["lighting".into()];
  h.store.add_product(lamp).await.unwrap();

  let by_company = h.store.filter_products(&ProductFilter {
    company: Some(acme.id.clone()),
    ..Default::default()
  });
  assert_eq!(by_company.len(), 1);
  assert_eq!(by_company[0].name, "Smart Speaker");

  let in_stock = h.store.filter_products(&ProductFilter { in_stock: true, ..Default::default() });
  assert_eq!(in_stock.len(), 1);

  let priced = h.store.filter_products(&ProductFilter {
    min_price: Some(15.0),
    max_price: Some(25.0),
    ..Default::default()
  });
  assert_eq!(priced.len(), 1);
  assert_eq!(priced[0].name, "Desk Lamp");

  let tagged = h.store.filter_products(&ProductFilter {
    tags: vec!["audio".into()],
    ..Default::default()
  });
  assert_eq!(tagged.len(), 1);

  assert_eq!(h.store.search_products("SPEAKER").len(), 1);
  assert_eq!(h.store.search_products("lighting").len(), 1);
  assert_eq!(h.store.available_products().len(), 1);
  assert_eq!(h.store.products_by_company(&globex.id).len(), 1);
}

#[tokio::test]
async fn test_export_import_round_trip() {
  let h = harness();
  let company = h.store.add_company(company_draft("Acme")).await.unwrap();
  h.store.add_product(product_draft("Widget", &company.id, "9.99", "3")).await.unwrap();

  let bundle = h.store.export_bundle();
  assert_eq!(bundle.companies.len(), 1);
  assert_eq!(bundle.products.len(), 1);

  let fresh = harness();
  let calls_before = fresh.remote.calls().len();
  fresh.store.import_bundle(bundle);

  assert_eq!(fresh.store.companies().len(), 1);
  assert_eq!(fresh.store.products().len(), 1);
  // import stays local; the remote store saw nothing
  assert_eq!(fresh.remote.calls().len(), calls_before);
}

#[tokio::test]
async fn test_negative_stock_counts_as_out_of_stock() {
  let h = harness();
  let company = h.store.add_company(company_draft("Acme")).await.unwrap();
  h.store.add_product(product_draft("Widget", &company.id, "9.99", "3")).await.unwrap();

  // an imported bundle can carry values draft validation would refuse
  let mut bundle = h.store.export_bundle();
  bundle.products[0].stock = -3;
  h.store.import_bundle(bundle);

  assert!(h.store.available_products().is_empty());
  let in_stock = h.store.filter_products(&ProductFilter { in_stock: true, ..Default::default() });
  assert!(in_stock.is_empty());

  let stats = h.store.stats();
  assert_eq!(stats.in_stock_products, 0);
  assert_eq!(stats.out_of_stock_products, 1);
}

#[tokio::test]
async fn test_update_company_patch_paths() {
  let h = harness();
  let company = h
    .store
    .add_company(CompanyDraft {
      name: "Acme".into(),
      description: "old".into(),
      logo: Some("https://example.com/logo.png".into()),
    })
    .await
    .unwrap();

  let updated = h
    .store
    .update_company(&company.id, CompanyPatch {
      description: Some("new".into()),
      logo: Some(None),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();

  assert_eq!(updated.name, "Acme");
  assert_eq!(updated.description, "new");
  assert!(updated.logo.is_none());
  assert!(updated.updated_at.is_some());
}
