// opkit/src/service/state.rs

//! Contains `OperationState`, the per-instance outcome state machine: the error
//! list, the response status, the executed and success flags, and the record
//! of which callbacks fired.
//!
//! Callback bodies receive `&mut OperationState`, so everything a hook may do
//! (report errors, report success, register more callbacks) lives here.

use crate::config::{Configuration, Environment};
use crate::core::entry::{ErrorEntry, ErrorPayload};
use crate::core::hook::Hook;
use crate::core::options::Options;
use crate::core::status::{SharedStatusTable, Status, INITIAL_STATUS};
use crate::error::{OpkitError, OpkitResult};
use crate::registry::{Action, CallbackRegistry};
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{event, Level};

/// Where an operation is in its single `execute` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Pending,
  Running,
  Succeeded,
  Failed,
}

pub struct OperationState {
  pub(crate) type_name: &'static str,
  pub(crate) lineage: Vec<&'static str>,
  pub(crate) options: Options,
  pub(crate) errors: Vec<ErrorEntry>,
  pub(crate) status: String,
  pub(crate) status_code: u16,
  pub(crate) executed: bool,
  pub(crate) running: bool,
  pub(crate) success: bool,
  // sticky: never cleared by a later error report
  pub(crate) success_reported: bool,
  pub(crate) step_failure: Option<OpkitError>,
  pub(crate) fired: IndexSet<String>,
  pub(crate) custom_fired: IndexSet<String>,
  // hook -> normalized action names
  pub(crate) instance_callbacks: IndexMap<String, Vec<String>>,
  pub(crate) instance_actions: HashMap<String, Action>,
  pub(crate) user: Option<Arc<dyn Any + Send + Sync>>,
  pub(crate) registry: CallbackRegistry,
  pub(crate) statuses: SharedStatusTable,
  pub(crate) config: Arc<Configuration>,
}

impl fmt::Debug for OperationState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("OperationState")
      .field("type_name", &self.type_name)
      .field("status", &self.status)
      .field("status_code", &self.status_code)
      .field("executed", &self.executed)
      .field("success", &self.success)
      .field("success_reported", &self.success_reported)
      .field("step_failure", &self.step_failure)
      .field("errors", &self.errors)
      .field("fired", &self.fired)
      .field("custom_fired", &self.custom_fired)
      .finish()
  }
}

impl OperationState {
  /// Builds the state of a new instance and fires its `initialize` hooks.
  ///
  /// `lineage` lists the type itself first, then its ancestors; it decides
  /// where class-level actions are looked up.
  ///
  /// # Panics
  ///
  /// When the status table of `env` does not know the initial `bad_request` status.
  pub fn new(type_name: &'static str, lineage: Vec<&'static str>, options: Options, env: Environment) -> Self {
    let lineage = if lineage.first() == Some(&type_name) {
      lineage
    } else {
      std::iter::once(type_name).chain(lineage).collect()
    };

    let mut state = Self {
      type_name,
      lineage,
      options,
      errors: Vec::new(),
      status: String::new(),
      status_code: 0,
      executed: false,
      running: false,
      success: false,
      success_reported: false,
      step_failure: None,
      fired: IndexSet::new(),
      custom_fired: IndexSet::new(),
      instance_callbacks: IndexMap::new(),
      instance_actions: HashMap::new(),
      user: None,
      registry: env.registry,
      statuses: env.statuses,
      config: env.config,
    };

    state.with_callbacks(Hook::Initialize, |state| state.set_response_status(INITIAL_STATUS));
    event!(Level::DEBUG, operation = %type_name, "Operation initialized.");
    state
  }

  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  pub fn lineage(&self) -> &[&'static str] {
    &self.lineage
  }

  pub fn registry(&self) -> &CallbackRegistry {
    &self.registry
  }

  pub fn statuses(&self) -> &SharedStatusTable {
    &self.statuses
  }

  pub fn config(&self) -> &Configuration {
    &self.config
  }

  // --- Options ---

  pub fn options(&self) -> &Options {
    &self.options
  }

  pub fn option(&self, key: &str) -> Option<&Value> {
    self.options.get(key)
  }

  pub fn option_exists(&self, key: &str) -> bool {
    self.options.contains_key(key)
  }

  /// True only when the option is present and exactly `true`.
  pub fn option_enabled(&self, key: &str) -> bool {
    matches!(self.options.get(key), Some(Value::Bool(true)))
  }

  pub fn option_disabled(&self, key: &str) -> bool {
    !self.option_enabled(key)
  }

  // --- User ---

  pub fn set_user<U: Any + Send + Sync>(&mut self, user: U) {
    self.user = Some(Arc::new(user));
  }

  pub fn set_shared_user(&mut self, user: Arc<dyn Any + Send + Sync>) {
    self.user = Some(user);
  }

  pub fn user<U: Any>(&self) -> Option<&U> {
    self.user.as_deref().and_then(|user| user.downcast_ref::<U>())
  }

  /// Whether the current user is of the configured user type.
  pub fn valid_user(&self) -> OpkitResult<bool> {
    let expected = self.config.user_type().ok_or(OpkitError::UserTypeNotConfigured)?;
    Ok(
      self
        .user
        .as_deref()
        .map_or(false, |user| user.type_id() == expected.id),
    )
  }

  // --- Outcome ---

  pub fn errors(&self) -> &[ErrorEntry] {
    &self.errors
  }

  /// Appends an already resolved entry without touching status or flags.
  pub fn add_error(&mut self, entry: ErrorEntry) {
    self.errors.push(entry);
  }

  pub fn response_status(&self) -> &str {
    &self.status
  }

  pub fn response_status_code(&self) -> u16 {
    self.status_code
  }

  pub fn is_executed(&self) -> bool {
    self.executed
  }

  pub fn is_valid(&self) -> bool {
    self.errors.is_empty()
  }

  pub fn is_success(&self) -> bool {
    self.success && self.is_valid()
  }

  pub fn is_fail(&self) -> bool {
    !self.is_success()
  }

  /// Whether a success was ever reported on this instance, even if an error came after it.
  pub fn success_reported(&self) -> bool {
    self.success_reported
  }

  /// The error the step body returned, if any, with its source chain intact.
  ///
  /// `errors()` only carries its message.
  pub fn step_failure(&self) -> Option<&OpkitError> {
    self.step_failure.as_ref()
  }

  pub fn phase(&self) -> Phase {
    if self.executed {
      if self.is_success() {
        Phase::Succeeded
      } else {
        Phase::Failed
      }
    } else if self.running {
      Phase::Running
    } else {
      Phase::Pending
    }
  }

  /// Sets status and code from a reason or a code.
  ///
  /// # Panics
  ///
  /// When the status is not in the status table.
  pub fn set_response_status(&mut self, status: impl Into<Status>) {
    if let Err(err) = self.try_set_response_status(status) {
      panic!("opkit setup error: {}", err);
    }
  }

  pub fn try_set_response_status(&mut self, status: impl Into<Status>) -> OpkitResult<()> {
    let (reason, code) = self.statuses.read().resolve(&status.into())?;
    self.status = reason;
    self.status_code = code;
    Ok(())
  }

  /// Records an error: clears the success flag, sets the status and appends
  /// the resolved message, between the `before_error` and `after_error` hooks.
  /// Returns the recorded entry.
  ///
  /// # Panics
  ///
  /// When the status is not in the status table.
  pub fn report_error(&mut self, status: impl Into<Status>, payload: impl Into<ErrorPayload>) -> ErrorEntry {
    self.report_error_with(status, payload, &Options::new())
  }

  /// Like [`report_error`](Self::report_error), with interpolation variables for the message.
  pub fn report_error_with(
    &mut self,
    status: impl Into<Status>,
    payload: impl Into<ErrorPayload>,
    vars: &Options,
  ) -> ErrorEntry {
    let status = status.into();
    let payload = payload.into();
    self.success = false;

    self.with_callbacks(Hook::Error, |state| {
      state.set_response_status(status);
      let entry = state.resolve_error_message(payload, vars);
      event!(Level::DEBUG, operation = %state.type_name, status = %state.status, error = %entry, "Error reported.");
      state.add_error(entry.clone());
      entry
    })
  }

  /// Same as [`report_error`](Self::report_error) but always returns `false`,
  /// for `return state.report_error_and_fail(..)` guards in precondition checks.
  pub fn report_error_and_fail(&mut self, status: impl Into<Status>, payload: impl Into<ErrorPayload>) -> bool {
    self.report_error(status, payload);
    false
  }

  /// Marks the operation successful with the given success reason.
  ///
  /// # Panics
  ///
  /// When `reason` is not a registered success reason.
  pub fn report_success(&mut self, reason: &str) {
    if let Err(err) = self.try_report_success(reason) {
      panic!("opkit setup error: {}", err);
    }
  }

  pub fn try_report_success(&mut self, reason: &str) -> OpkitResult<()> {
    if !self.statuses.read().is_success_reason(reason) {
      return Err(OpkitError::InvalidSuccessStatus {
        reason: reason.to_string(),
      });
    }

    self.with_callbacks(Hook::Success, |state| {
      state.success = true;
      state.success_reported = true;
      state.set_response_status(reason);
    });
    event!(Level::DEBUG, operation = %self.type_name, status = %reason, "Success reported.");
    Ok(())
  }

  pub fn report_ok(&mut self) {
    self.report_success("ok");
  }

  pub fn report_created(&mut self) {
    self.report_success("created");
  }

  /// Resolves a message key under `<namespace>.errors`, falling back to a
  /// diagnostic string when the translator fails.
  pub fn translate_error_key(&self, key: &str, vars: &Options) -> String {
    let full_key = format!("{}.{}", self.config.i18n_errors_namespace(), key);
    match self.config.translate(&full_key, vars) {
      Ok(message) => message,
      Err(err @ OpkitError::TranslationMissing { .. }) => {
        event!(Level::WARN, key = %full_key, "Translation missing for error key.");
        err.to_string()
      }
      Err(err) => {
        event!(Level::WARN, key = %full_key, error = %err, "Translator failed for error key.");
        format!("Can't fetch key {} - {}", full_key, err)
      }
    }
  }

  fn resolve_error_message(&self, payload: ErrorPayload, vars: &Options) -> ErrorEntry {
    match payload {
      ErrorPayload::Key(key) => ErrorEntry::Message(self.translate_error_key(&key, vars)),
      ErrorPayload::Message(message) => ErrorEntry::Message(message),
      ErrorPayload::Structured(reasons) => ErrorEntry::Structured(reasons),
      ErrorPayload::Record(errors) => ErrorEntry::Record(errors),
    }
  }
}
