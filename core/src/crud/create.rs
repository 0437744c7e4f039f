// opkit/src/crud/create.rs

use crate::core::entry::ErrorPayload;
use crate::core::hook::Hook;
use crate::core::naming::{record_error_key, short_type_name};
use crate::core::options::Options;
use crate::crud::{allowed_attributes, forbid_unless_reported, record_attributes, Record, CRUD_SERVICE};
use crate::service::lifecycle::{Operation, BASE_SERVICE};
use crate::service::state::OperationState;
use tracing::{event, Level};

pub const CREATE_SERVICE: &str = "CreateService";

/// A create-kind collaborator.
pub trait CreateOperation: Send {
  type Record: Record;

  fn record_type(&self) -> &'static str {
    short_type_name::<Self::Record>()
  }

  /// Namespace of this operation's message keys (`widgets` for `Widget`).
  fn record_error_key(&self) -> String {
    record_error_key(self.record_type())
  }

  /// Attribute names copied from the caller's attributes into the new record.
  fn whitelist_attributes(&self) -> &'static [&'static str] {
    &[]
  }

  fn record_attributes(&self, state: &OperationState) -> Options {
    record_attributes(state)
  }

  fn default_options(&self) -> Options {
    Options::new()
  }

  fn can_execute(&mut self, _state: &mut OperationState) -> bool {
    true
  }

  fn can_create_record(&mut self, state: &mut OperationState) -> bool;

  fn build_record(&mut self, attributes: Options, state: &mut OperationState) -> anyhow::Result<Self::Record>;

  fn save_record(&mut self, record: &mut Self::Record, state: &mut OperationState) -> anyhow::Result<()>;
}

/// Create template: permission check, `build_record`, save, `created` or the record's errors.
pub struct Create<C: CreateOperation> {
  inner: C,
  record: Option<C::Record>,
}

impl<C: CreateOperation> Create<C> {
  pub fn new(inner: C) -> Self {
    Self { inner, record: None }
  }

  pub fn inner(&self) -> &C {
    &self.inner
  }

  pub fn inner_mut(&mut self) -> &mut C {
    &mut self.inner
  }

  /// The built record, once `build_record` succeeded.
  pub fn record(&self) -> Option<&C::Record> {
    self.record.as_ref()
  }

  pub fn into_record(self) -> Option<C::Record> {
    self.record
  }

  fn can_execute_action(&mut self, state: &mut OperationState) -> bool {
    if !self.inner.can_create_record(state) {
      let key = format!("{}.cant_create", self.inner.record_error_key());
      return forbid_unless_reported(state, key);
    }
    true
  }
}

impl<C: CreateOperation> Operation for Create<C> {
  fn type_name(&self) -> &'static str {
    short_type_name::<C>()
  }

  fn lineage(&self) -> Vec<&'static str> {
    vec![short_type_name::<C>(), CREATE_SERVICE, CRUD_SERVICE, BASE_SERVICE]
  }

  fn default_options(&self) -> Options {
    self.inner.default_options()
  }

  fn can_execute(&mut self, state: &mut OperationState) -> bool {
    self.inner.can_execute(state)
  }

  fn perform(&mut self, state: &mut OperationState) -> anyhow::Result<()> {
    state.with_callbacks(Hook::Create, |state| -> anyhow::Result<()> {
      if !self.can_execute_action(state) {
        return Ok(());
      }

      let attributes = allowed_attributes(&self.inner.record_attributes(state), self.inner.whitelist_attributes());
      let inner = &mut self.inner;
      let mut record = state.with_callbacks(Hook::BuildRecord, |state| inner.build_record(attributes, state))?;

      let saved = match self.inner.save_record(&mut record, state) {
        Ok(()) => record.is_valid(),
        Err(err) => {
          event!(Level::WARN, error = %err, "Saving the new record failed.");
          state.unprocessable_entity_error(ErrorPayload::message(err.to_string()));
          false
        }
      };

      if saved {
        state.report_created();
      } else if state.is_valid() {
        state.unprocessable_entity_error(record.errors());
      }

      self.record = Some(record);
      Ok(())
    })
  }
}
