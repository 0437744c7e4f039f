// opkit/src/crud/mod.rs

//! Create/update/delete/action templates built on top of [`Service`](crate::Service).
//!
//! Each template is a wrapper implementing [`Operation`](crate::Operation)
//! around a user type implementing the matching kind trait. The wrapper
//! sequences the kind's hooks and reports; the user type supplies the
//! permission checks and the persistence calls.

pub mod action;
pub mod create;
pub mod delete;
pub mod update;

use crate::core::entry::RecordErrors;
use crate::core::options::{filter_options, Options};
use crate::service::state::OperationState;
use serde_json::Value;

pub use action::{Action, ActionOperation, ACTION_SERVICE};
pub use create::{Create, CreateOperation, CREATE_SERVICE};
pub use delete::{Delete, DeleteOperation, DELETE_SERVICE};
pub use update::{Update, UpdateOperation, UPDATE_SERVICE};

/// Lineage name shared by the create, update and delete templates.
pub const CRUD_SERVICE: &str = "CrudService";

/// Option key holding the attributes a caller wants written to the record.
pub const ATTRIBUTES_OPTION: &str = "attributes";

/// The domain record an operation works on. Opaque apart from its own validity.
pub trait Record: Send {
  fn is_valid(&self) -> bool {
    true
  }

  fn errors(&self) -> RecordErrors {
    RecordErrors::new()
  }

  /// Current attribute values, used to compute changed attributes.
  fn attributes(&self) -> Options {
    Options::new()
  }
}

/// The `attributes` option of `state`, or an empty map.
pub fn record_attributes(state: &OperationState) -> Options {
  state
    .option(ATTRIBUTES_OPTION)
    .and_then(Value::as_object)
    .cloned()
    .unwrap_or_default()
}

/// `attributes` restricted to `whitelist`.
pub fn allowed_attributes(attributes: &Options, whitelist: &[&str]) -> Options {
  filter_options(attributes, whitelist)
}

/// Reports `forbidden` with `key` unless an earlier report already made the
/// operation invalid. Always `false`.
pub(crate) fn forbid_unless_reported(state: &mut OperationState, key: String) -> bool {
  if state.is_valid() {
    state.forbidden_error_and_fail(key)
  } else {
    false
  }
}
