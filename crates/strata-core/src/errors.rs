/* crates/strata-core/src/errors.rs */

use std::fmt;

#[derive(Debug, Clone)]
pub struct StrataError {
  code: String,
  message: String,
  status: u16,
}

fn default_status(code: &str) -> u16 {
  match code {
    "VALIDATION_ERROR" => 400,
    "UNAUTHORIZED" => 401,
    "FORBIDDEN" => 403,
    "NOT_FOUND" => 404,
    "CONFIG_ERROR" => 500,
    "RENDER_ERROR" => 500,
    "CONTENT_ERROR" => 502,
    "INTERNAL_ERROR" => 500,
    _ => 500,
  }
}

impl StrataError {
  pub fn new(code: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
    Self { code: code.into(), message: message.into(), status }
  }

  pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
    let code = code.into();
    let status = default_status(&code);
    Self { code, message: message.into(), status }
  }

  pub fn validation(msg: impl Into<String>) -> Self {
    Self::with_code("VALIDATION_ERROR", msg)
  }

  pub fn not_found(msg: impl Into<String>) -> Self {
    Self::with_code("NOT_FOUND", msg)
  }

  pub fn config(msg: impl Into<String>) -> Self {
    Self::with_code("CONFIG_ERROR", msg)
  }

  pub fn render(msg: impl Into<String>) -> Self {
    Self::with_code("RENDER_ERROR", msg)
  }

  pub fn content(msg: impl Into<String>) -> Self {
    Self::with_code("CONTENT_ERROR", msg)
  }

  pub fn internal(msg: impl Into<String>) -> Self {
    Self::with_code("INTERNAL_ERROR", msg)
  }

  pub fn code(&self) -> &str {
    &self.code
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  pub fn status(&self) -> u16 {
    self.status
  }
}

impl fmt::Display for StrataError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.code, self.message)
  }
}

impl std::error::Error for StrataError {}

impl From<std::io::Error> for StrataError {
  fn from(err: std::io::Error) -> Self {
    Self::config(err.to_string())
  }
}

impl From<serde_json::Error> for StrataError {
  fn from(err: serde_json::Error) -> Self {
    Self::config(err.to_string())
  }
}
