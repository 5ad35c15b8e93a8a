use crate::remote::RemoteError;

/// Errors surfaced by [`CatalogStore`](crate::catalog::CatalogStore) operations.
///
/// Validation failures are raised before any remote or local write is
/// attempted. `RemoteUnavailable` is only produced on the online path; an
/// offline mutation commits locally and queues instead of failing. Local
/// cache failures never appear here; they are logged and the operation
/// proceeds on in-memory state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// A required field was absent or blank.
  #[error("missing required field `{0}`")]
  MissingField(&'static str),

  /// A numeric field parsed to a negative value.
  #[error("field `{field}` must be non-negative, got {value}")]
  InvalidRange { field: &'static str, value: f64 },

  /// A company cannot be deleted while products still reference it.
  #[error("company `{id}` still has {product_count} product(s)")]
  ReferentialConstraint { id: String, product_count: usize },

  /// The remote store failed or rejected an online call.
  #[error("remote store unavailable")]
  RemoteUnavailable(#[from] RemoteError),
}
