// opkit/src/crud/action.rs

use crate::core::hook::Hook;
use crate::core::naming::short_type_name;
use crate::core::options::Options;
use crate::service::lifecycle::{Operation, BASE_SERVICE};
use crate::service::state::OperationState;

pub const ACTION_SERVICE: &str = "ActionService";

/// A generic action collaborator: anything that is not a plain create/update/delete.
pub trait ActionOperation: Send {
  /// Used in the `<key>.cant_execute_<action_name>` message key.
  fn action_name(&self) -> &str;

  fn record_error_key(&self) -> String;

  fn default_options(&self) -> Options {
    Options::new()
  }

  fn user_can_execute_action(&mut self, state: &mut OperationState) -> bool;

  fn execute_service_action(&mut self, state: &mut OperationState) -> anyhow::Result<()>;

  /// Structured errors reported as `bad_request` when the action left the operation invalid.
  fn action_errors(&self, _state: &OperationState) -> Vec<Options> {
    Vec::new()
  }
}

/// Action template: permission check, `execute_service_action`, `ok` when still valid.
pub struct Action<A: ActionOperation> {
  inner: A,
}

impl<A: ActionOperation> Action<A> {
  pub fn new(inner: A) -> Self {
    Self { inner }
  }

  pub fn inner(&self) -> &A {
    &self.inner
  }

  pub fn inner_mut(&mut self) -> &mut A {
    &mut self.inner
  }
}

impl<A: ActionOperation> Operation for Action<A> {
  fn type_name(&self) -> &'static str {
    short_type_name::<A>()
  }

  fn lineage(&self) -> Vec<&'static str> {
    vec![short_type_name::<A>(), ACTION_SERVICE, BASE_SERVICE]
  }

  fn default_options(&self) -> Options {
    self.inner.default_options()
  }

  fn can_execute(&mut self, state: &mut OperationState) -> bool {
    if !self.inner.user_can_execute_action(state) {
      if !state.is_valid() {
        return false;
      }
      let key = format!("{}.cant_execute_{}", self.inner.record_error_key(), self.inner.action_name());
      return state.unprocessable_entity_error_and_fail(key);
    }
    true
  }

  fn perform(&mut self, state: &mut OperationState) -> anyhow::Result<()> {
    state.with_callbacks(Hook::Action, |state| -> anyhow::Result<()> {
      let inner = &mut self.inner;
      state.with_callbacks(Hook::ExecuteServiceAction, |state| inner.execute_service_action(state))?;

      if state.is_valid() {
        state.report_ok();
      } else {
        let errors = self.inner.action_errors(state);
        if !errors.is_empty() {
          state.bad_request_error(errors);
        }
      }
      Ok(())
    })
  }
}
