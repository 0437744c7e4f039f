// opkit/src/core/status.rs

//! The response status table: named outcome reasons and their numeric codes.
//!
//! Error reasons and success reasons live in two disjoint sub-tables. Both
//! keep insertion order, which decides which reason a shared code maps back
//! to (`500` resolves to `internal_server_error`, not its `internal_server`
//! alias).

use crate::error::{OpkitError, OpkitResult};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::sync::Arc;
use tracing::{event, Level};

pub const ERROR_RESPONSE_STATUS: &[(&str, u16)] = &[
  ("bad_request", 400),
  ("not_authorized", 401),
  ("forbidden", 403),
  ("not_found", 404),
  ("unprocessable_entity", 422),
  ("internal_server_error", 500),
  // compatibility alias
  ("internal_server", 500),
  ("not_implemented", 501),
];

pub const SUCCESS_RESPONSE_STATUS: &[(&str, u16)] = &[("ok", 200), ("created", 201)];

/// Status every operation starts in.
pub const INITIAL_STATUS: &str = "bad_request";

/// A status given either by reason name or by numeric code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
  Reason(String),
  Code(u16),
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Status::Reason(reason) => f.write_str(reason),
      Status::Code(code) => write!(f, "{}", code),
    }
  }
}

impl From<&str> for Status {
  fn from(reason: &str) -> Self {
    Status::Reason(reason.to_string())
  }
}

impl From<String> for Status {
  fn from(reason: String) -> Self {
    Status::Reason(reason)
  }
}

impl From<u16> for Status {
  fn from(code: u16) -> Self {
    Status::Code(code)
  }
}

#[derive(Debug, Clone)]
pub struct StatusTable {
  errors: IndexMap<String, u16>,
  successes: IndexMap<String, u16>,
}

impl Default for StatusTable {
  fn default() -> Self {
    Self::new()
  }
}

impl StatusTable {
  /// A table holding the built-in error and success reasons.
  pub fn new() -> Self {
    Self {
      errors: ERROR_RESPONSE_STATUS
        .iter()
        .map(|(reason, code)| ((*reason).to_string(), *code))
        .collect(),
      successes: SUCCESS_RESPONSE_STATUS
        .iter()
        .map(|(reason, code)| ((*reason).to_string(), *code))
        .collect(),
    }
  }

  /// Inserts or overwrites an error reason.
  pub fn register(&mut self, reason: &str, code: u16) -> OpkitResult<()> {
    if self.successes.contains_key(reason) {
      return Err(OpkitError::ReasonConflict {
        reason: reason.to_string(),
        existing: "success",
      });
    }
    event!(Level::DEBUG, %reason, code, "Registering error response status.");
    self.errors.insert(reason.to_string(), code);
    Ok(())
  }

  /// Inserts or overwrites a success reason.
  pub fn register_success(&mut self, reason: &str, code: u16) -> OpkitResult<()> {
    if self.errors.contains_key(reason) {
      return Err(OpkitError::ReasonConflict {
        reason: reason.to_string(),
        existing: "error",
      });
    }
    event!(Level::DEBUG, %reason, code, "Registering success response status.");
    self.successes.insert(reason.to_string(), code);
    Ok(())
  }

  pub fn code_for(&self, reason: &str) -> Option<u16> {
    self.errors.get(reason).or_else(|| self.successes.get(reason)).copied()
  }

  pub fn reason_for(&self, code: u16) -> Option<&str> {
    self
      .errors
      .iter()
      .chain(self.successes.iter())
      .find(|(_, c)| **c == code)
      .map(|(reason, _)| reason.as_str())
  }

  /// Resolves a status to its `(reason, code)` pair.
  pub fn resolve(&self, status: &Status) -> OpkitResult<(String, u16)> {
    let resolved = match status {
      Status::Reason(reason) => self.code_for(reason).map(|code| (reason.clone(), code)),
      Status::Code(code) => self.reason_for(*code).map(|reason| (reason.to_string(), *code)),
    };
    resolved.ok_or_else(|| OpkitError::UnknownStatus {
      status: status.to_string(),
    })
  }

  pub fn is_error_reason(&self, reason: &str) -> bool {
    self.errors.contains_key(reason)
  }

  pub fn is_success_reason(&self, reason: &str) -> bool {
    self.successes.contains_key(reason)
  }

  pub fn error_reasons(&self) -> impl Iterator<Item = (&str, u16)> {
    self.errors.iter().map(|(reason, code)| (reason.as_str(), *code))
  }

  pub fn success_reasons(&self) -> impl Iterator<Item = (&str, u16)> {
    self.successes.iter().map(|(reason, code)| (reason.as_str(), *code))
  }
}

/// Shared, lockable handle to a [`StatusTable`].
///
/// Clones point at the same table. Guards must not be held while invoking
/// callbacks.
#[derive(Debug, Clone, Default)]
pub struct SharedStatusTable(Arc<RwLock<StatusTable>>);

static GLOBAL_STATUS_TABLE: Lazy<SharedStatusTable> = Lazy::new(SharedStatusTable::default);

impl SharedStatusTable {
  pub fn new(table: StatusTable) -> Self {
    SharedStatusTable(Arc::new(RwLock::new(table)))
  }

  /// The process-wide table used by operations built without an explicit environment.
  pub fn global() -> Self {
    GLOBAL_STATUS_TABLE.clone()
  }

  pub fn read(&self) -> RwLockReadGuard<'_, StatusTable> {
    self.0.read()
  }

  pub fn write(&self) -> RwLockWriteGuard<'_, StatusTable> {
    self.0.write()
  }

  /// Registers an error reason; every operation sharing this table can report it right away.
  pub fn register(&self, reason: &str, code: u16) -> OpkitResult<()> {
    self.write().register(reason, code)
  }

  pub fn register_success(&self, reason: &str, code: u16) -> OpkitResult<()> {
    self.write().register_success(reason, code)
  }

  pub fn code_for(&self, reason: &str) -> Option<u16> {
    self.read().code_for(reason)
  }

  pub fn reason_for(&self, code: u16) -> Option<String> {
    self.read().reason_for(code).map(str::to_string)
  }
}
