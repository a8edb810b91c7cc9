/* crates/strata-axum/src/error.rs */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use strata_core::StrataError;

/// Newtype wrapper to implement `IntoResponse` for `StrataError`.
/// Required because Rust's orphan rule prevents `impl IntoResponse for
/// StrataError` when both types are foreign to this crate.
pub(crate) struct AxumError(pub StrataError);

impl IntoResponse for AxumError {
  fn into_response(self) -> Response {
    let err = self.0;
    let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = serde_json::json!({
      "ok": false,
      "error": {
        "code": err.code(),
        "message": err.message(),
      }
    });
    (status, axum::Json(body)).into_response()
  }
}

impl From<StrataError> for AxumError {
  fn from(err: StrataError) -> Self {
    Self(err)
  }
}
