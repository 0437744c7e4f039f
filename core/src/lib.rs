// src/lib.rs

//! opkit: service objects with a uniform outcome, hooks and message-keyed errors.
//!
//! An operation wraps one unit of application work with:
//!  - A precondition gate and a step body, run at most once per instance.
//!  - A uniform outcome: success flag, ordered error list, response status and code.
//!  - Named `before_*`/`after_*` hook points, with callbacks at instance and type level.
//!  - Error reporters per status reason (`not_found_error`, `forbidden_error_and_fail`, ...).
//!  - Message keys translated through a pluggable translator.
//!  - Create/update/delete/action templates over an opaque record.

/*
    Typical use:
    1. Implement `Operation` (or one of the `crud` kind traits) for a collaborator type.
    2. Optionally register class-level callbacks on `CallbackRegistry::global()`.
    3. Build `Service::new(collaborator, options!{..})`, attach a user if needed.
    4. Call `execute()` and read `is_success()`, `response_status()` and `errors()`.
*/

pub mod config;
pub mod core;
pub mod crud;
pub mod error;
pub mod registry;
pub mod service;

// Re-exported for the `options!` macro.
pub use serde_json;

pub use crate::config::{configuration, configure, Configuration, Environment, MessageCatalog, Translate};
pub use crate::core::{ErrorEntry, ErrorPayload, Hook, Options, RecordErrors, SharedStatusTable, Status, StatusTable};
pub use crate::error::{OpkitError, OpkitResult};
pub use crate::registry::{Action as CallbackAction, CallbackRegistry, FanOut};
pub use crate::service::{Operation, OperationState, Phase, Service};
