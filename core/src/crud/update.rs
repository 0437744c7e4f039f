// opkit/src/crud/update.rs

use crate::core::entry::RecordErrors;
use crate::core::hook::Hook;
use crate::core::naming::{record_error_key, short_type_name};
use crate::core::options::{changed_attributes, Options};
use crate::crud::{allowed_attributes, forbid_unless_reported, record_attributes, Record, CRUD_SERVICE};
use crate::service::lifecycle::{Operation, BASE_SERVICE};
use crate::service::state::OperationState;

pub const UPDATE_SERVICE: &str = "UpdateService";

/// An update-kind collaborator.
pub trait UpdateOperation: Send {
  type Record: Record;

  fn record_type(&self) -> &'static str {
    short_type_name::<Self::Record>()
  }

  fn record_error_key(&self) -> String {
    record_error_key(self.record_type())
  }

  fn whitelist_attributes(&self) -> &'static [&'static str] {
    &[]
  }

  fn record_attributes(&self, state: &OperationState) -> Options {
    record_attributes(state)
  }

  fn default_options(&self) -> Options {
    Options::new()
  }

  /// Whether `execute` requires a user of the configured user type.
  fn validate_user(&self) -> bool {
    true
  }

  /// The record's own permission check for the current user.
  fn user_can_update_record(&mut self, record: &Self::Record, state: &mut OperationState) -> bool;

  fn update_record(
    &mut self,
    record: &mut Self::Record,
    attributes: Options,
    state: &mut OperationState,
  ) -> anyhow::Result<()>;

  fn update_errors(&self, record: &Self::Record) -> RecordErrors {
    record.errors()
  }
}

/// Update template: record and user checks, permission check,
/// `update_record`, `ok` or the record's errors.
pub struct Update<U: UpdateOperation> {
  inner: U,
  record: Option<U::Record>,
  previous_attributes: Option<Options>,
}

impl<U: UpdateOperation> Update<U> {
  /// `record` is `None` when the caller could not find it; `execute` then reports `not_found`.
  pub fn new(inner: U, record: Option<U::Record>) -> Self {
    Self {
      inner,
      record,
      previous_attributes: None,
    }
  }

  pub fn inner(&self) -> &U {
    &self.inner
  }

  pub fn record(&self) -> Option<&U::Record> {
    self.record.as_ref()
  }

  pub fn into_record(self) -> Option<U::Record> {
    self.record
  }

  /// Allowed attributes whose value changed. Empty when the operation failed.
  pub fn changed_attributes(&self, state: &OperationState) -> Vec<String> {
    if state.is_fail() {
      return Vec::new();
    }
    let (Some(previous), Some(record)) = (&self.previous_attributes, &self.record) else {
      return Vec::new();
    };
    let keys: Vec<String> = allowed_attributes(&self.inner.record_attributes(state), self.inner.whitelist_attributes())
      .keys()
      .cloned()
      .collect();
    changed_attributes(previous, &record.attributes(), &keys)
  }

  pub fn is_changed(&self, state: &OperationState) -> bool {
    !self.changed_attributes(state).is_empty()
  }
}

impl<U: UpdateOperation> Operation for Update<U> {
  fn type_name(&self) -> &'static str {
    short_type_name::<U>()
  }

  fn lineage(&self) -> Vec<&'static str> {
    vec![short_type_name::<U>(), UPDATE_SERVICE, CRUD_SERVICE, BASE_SERVICE]
  }

  fn default_options(&self) -> Options {
    self.inner.default_options()
  }

  fn can_execute(&mut self, state: &mut OperationState) -> bool {
    let key = self.inner.record_error_key();
    if self.record.is_none() {
      return state.not_found_error_and_fail(format!("{}.not_found", key));
    }

    if self.inner.validate_user() {
      match state.valid_user() {
        Ok(true) => {}
        Ok(false) => return state.not_found_error_and_fail(format!("{}.invalid_user", key)),
        Err(err) => panic!("opkit setup error: {}", err),
      }
    }

    true
  }

  fn perform(&mut self, state: &mut OperationState) -> anyhow::Result<()> {
    state.with_callbacks(Hook::Update, |state| -> anyhow::Result<()> {
      let key = self.inner.record_error_key();
      let attributes = allowed_attributes(&self.inner.record_attributes(state), self.inner.whitelist_attributes());
      let Update {
        inner,
        record,
        previous_attributes,
      } = self;
      let Some(record) = record.as_mut() else {
        return Ok(());
      };

      if !inner.user_can_update_record(record, state) {
        forbid_unless_reported(state, format!("{}.user_cant_update", key));
        return Ok(());
      }

      *previous_attributes = Some(record.attributes());
      state.with_callbacks(Hook::UpdateRecord, |state| inner.update_record(&mut *record, attributes, state))?;

      if record.is_valid() {
        state.report_ok();
      } else {
        let errors = inner.update_errors(record);
        if !errors.is_empty() {
          state.unprocessable_entity_error(errors);
        }
      }
      Ok(())
    })
  }
}
