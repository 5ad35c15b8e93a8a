use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{RemoteError, RemoteStore};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Supabase PostgREST client for the catalog tables.
///
/// Requests carry the anon key as both the `apikey` header and a bearer
/// token; writes ask for `return=representation` so the stored row comes
/// back in the response.
#[derive(Clone)]
pub struct SupabaseRemote {
  http: reqwest::Client,
  base: Url,
  api_key: String,
}

impl SupabaseRemote {
  /// Build a client for the project at `base_url` (e.g.
  /// `https://xyzcompany.supabase.co`) authenticating with `api_key`.
  pub fn new(base_url: &str, api_key: &str) -> Result<Self, RemoteError> {
    let base = Url::parse(base_url)?.join("rest/v1/")?;
    let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    Ok(Self { http, base, api_key: api_key.to_string() })
  }

  fn table_url(&self, table: &str) -> Result<Url, RemoteError> {
    Ok(self.base.join(table)?)
  }

  fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    req.header("apikey", &self.api_key).bearer_auth(&self.api_key)
  }

  /// Read the response as a row array, mapping non-success statuses to
  /// [`RemoteError::Api`] with the body as the message.
  async fn rows(resp: Response) -> Result<Vec<Value>, RemoteError> {
    let status = resp.status();
    if !status.is_success() {
      let message = resp.text().await.unwrap_or_default();
      return Err(RemoteError::Api { status: status.as_u16(), message });
    }
    if status == StatusCode::NO_CONTENT {
      return Ok(Vec::new());
    }
    let body = resp.bytes().await?;
    if body.is_empty() {
      return Ok(Vec::new());
    }
    let rows = serde_json::from_slice(&body)?;
    Ok(rows)
  }
}

#[async_trait]
impl RemoteStore for SupabaseRemote {
  async fn select(&self, table: &str) -> Result<Vec<Value>, RemoteError> {
    let mut url = self.table_url(table)?;
    url
      .query_pairs_mut()
      .append_pair("select", "*")
      .append_pair("order", "created_at.asc");
    debug!(table, "remote select");
    let resp = self.authed(self.http.get(url)).send().await?;
    Self::rows(resp).await
  }

  async fn insert(&self, table: &str, record: Value) -> Result<Vec<Value>, RemoteError> {
    let url = self.table_url(table)?;
    debug!(table, "remote insert");
    let resp = self
      .authed(self.http.post(url))
      .header("Prefer", "return=representation")
      .json(&[record])
      .send()
      .await?;
    Self::rows(resp).await
  }

  async fn update(&self, table: &str, id: &str, fields: Value) -> Result<Vec<Value>, RemoteError> {
    let mut url = self.table_url(table)?;
    url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
    debug!(table, id, "remote update");
    let resp = self
      .authed(self.http.patch(url))
      .header("Prefer", "return=representation")
      .json(&fields)
      .send()
      .await?;
    Self::rows(resp).await
  }

  async fn delete(&self, table: &str, id: &str) -> Result<Vec<Value>, RemoteError> {
    let mut url = self.table_url(table)?;
    url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
    debug!(table, id, "remote delete");
    let resp = self
      .authed(self.http.delete(url))
      .header("Prefer", "return=representation")
      .send()
      .await?;
    Self::rows(resp).await
  }
}
