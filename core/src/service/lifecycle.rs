// opkit/src/service/lifecycle.rs

//! Contains the `Operation` trait collaborators implement and `Service<O>`,
//! which drives a single idempotent `execute` run over it.

use crate::config::Environment;
use crate::core::entry::ErrorPayload;
use crate::core::hook::Hook;
use crate::core::naming::short_type_name;
use crate::core::options::{with_default_options, Options};
use crate::error::OpkitError;
use crate::service::state::{OperationState, Phase};
use std::any::Any;
use std::ops::{Deref, DerefMut};
use tracing::{event, instrument, Level};

/// Lineage name shared by every operation.
pub const BASE_SERVICE: &str = "Service";

/// Reason recorded when a step body returns an error.
pub const STEP_FAILURE_STATUS: &str = "unprocessable_entity";

/// The collaborator side of an operation: a precondition and a step body.
pub trait Operation: Send {
  /// Name under which class-level callbacks of this type are registered.
  fn type_name(&self) -> &'static str {
    short_type_name::<Self>()
  }

  /// This type followed by its ancestors, nearest first.
  fn lineage(&self) -> Vec<&'static str> {
    vec![self.type_name(), BASE_SERVICE]
  }

  /// Defaults the caller's options are merged over.
  fn default_options(&self) -> Options {
    Options::new()
  }

  /// Precondition gate. Report the reason through `state` when returning `false`.
  fn can_execute(&mut self, state: &mut OperationState) -> bool;

  /// The step body. An `Err` is recorded as an `unprocessable_entity` error.
  fn perform(&mut self, state: &mut OperationState) -> anyhow::Result<()>;
}

/// An operation instance: the collaborator plus its outcome state.
///
/// Derefs to [`OperationState`] for status, errors and callback registration.
pub struct Service<O: Operation> {
  operation: O,
  state: OperationState,
}

impl<O: Operation> Service<O> {
  /// Builds an instance wired to the process-wide registry, status table and configuration.
  pub fn new(operation: O, options: Options) -> Self {
    Self::with_environment(operation, options, Environment::global())
  }

  pub fn with_environment(operation: O, options: Options, env: Environment) -> Self {
    let options = with_default_options(operation.default_options(), options);
    let state = OperationState::new(operation.type_name(), operation.lineage(), options, env);
    Self { operation, state }
  }

  pub fn with_user<U: Any + Send + Sync>(mut self, user: U) -> Self {
    self.state.set_user(user);
    self
  }

  /// Runs the operation once.
  ///
  /// Later calls return immediately. Step failures never propagate: they end
  /// up in `errors()` with the `unprocessable_entity` status, and in
  /// `step_failure()` as [`OpkitError::StepFailed`].
  #[instrument(
    name = "Service::execute",
    skip_all,
    fields(operation = %self.state.type_name())
  )]
  pub fn execute(&mut self) -> &mut Self {
    if self.state.executed {
      event!(Level::DEBUG, "Operation already executed, skipping.");
      return self;
    }

    event!(Level::DEBUG, "Operation execution starting.");
    let Self { operation, state } = self;
    state.running = true;
    state.fire_before(Hook::Execute);

    if operation.can_execute(state) {
      if let Err(source) = operation.perform(state) {
        let message = source.to_string();
        let failure = OpkitError::StepFailed {
          operation: state.type_name().to_string(),
          source,
        };
        event!(Level::ERROR, error = %failure, "Step failed; recording it as an error.");
        state.step_failure = Some(failure);
        state.report_error(STEP_FAILURE_STATUS, ErrorPayload::Message(message));
      }
    } else {
      event!(Level::DEBUG, status = %state.response_status(), "Precondition not met; step skipped.");
    }

    state.executed = true;
    state.running = false;
    state.fire_after(Hook::Execute);

    event!(Level::DEBUG, success = state.is_success(), status = %state.response_status(), "Operation execution finished.");
    self
  }

  pub fn phase(&self) -> Phase {
    self.state.phase()
  }

  pub fn operation(&self) -> &O {
    &self.operation
  }

  pub fn operation_mut(&mut self) -> &mut O {
    &mut self.operation
  }

  pub fn state(&self) -> &OperationState {
    &self.state
  }

  pub fn state_mut(&mut self) -> &mut OperationState {
    &mut self.state
  }

  pub fn into_parts(self) -> (O, OperationState) {
    (self.operation, self.state)
  }
}

impl<O: Operation> Deref for Service<O> {
  type Target = OperationState;

  fn deref(&self) -> &OperationState {
    &self.state
  }
}

impl<O: Operation> DerefMut for Service<O> {
  fn deref_mut(&mut self) -> &mut OperationState {
    &mut self.state
  }
}
