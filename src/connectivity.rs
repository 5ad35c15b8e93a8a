//! Network reachability probing for the catalog store.
//!
//! Connectivity is binary: online or offline. The offline-to-online edge is
//! what matters, because that is when the store drains its sync queue; the
//! reverse edge only flips the flag mutations branch on.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::catalog::CatalogStore;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const MONITOR_INTERVAL: Duration = Duration::from_secs(30);

/// One-shot reachability check against the remote base URL.
///
/// Any HTTP response counts as reachable; an auth rejection still proves the
/// network path. Only transport failures (connect, DNS, timeout) count as
/// offline.
pub async fn probe(url: &str) -> bool {
  let client = match reqwest::Client::builder().timeout(PROBE_TIMEOUT).build() {
    Ok(client) => client,
    Err(e) => {
      warn!(error = %e, "could not build probe client");
      return false;
    }
  };
  match client.head(url).send().await {
    Ok(resp) => {
      debug!(status = %resp.status(), "connectivity probe succeeded");
      true
    }
    Err(e) => {
      debug!(error = %e, "connectivity probe failed");
      false
    }
  }
}

/// Periodic monitor: probe every 30 seconds and apply transitions until the
/// task is dropped or the runtime shuts down.
pub async fn run_monitor(url: String, store: Arc<CatalogStore>) {
  info!(target = %url, "connectivity monitor started");
  let mut ticker = tokio::time::interval(MONITOR_INTERVAL);
  loop {
    ticker.tick().await;
    let reachable = probe(&url).await;
    if reachable != store.is_online() {
      info!(online = reachable, "connectivity changed");
    }
    if reachable {
      store.go_online().await;
    } else {
      store.go_offline();
    }
  }
}
