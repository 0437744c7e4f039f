// opkit/src/crud/delete.rs

use crate::core::hook::Hook;
use crate::core::naming::{record_error_key, short_type_name};
use crate::core::options::Options;
use crate::crud::{forbid_unless_reported, Record, CRUD_SERVICE};
use crate::service::lifecycle::{Operation, BASE_SERVICE};
use crate::service::state::OperationState;

pub const DELETE_SERVICE: &str = "DeleteService";

/// A delete-kind collaborator.
pub trait DeleteOperation: Send {
  type Record: Record;

  fn record_type(&self) -> &'static str {
    short_type_name::<Self::Record>()
  }

  fn record_error_key(&self) -> String {
    record_error_key(self.record_type())
  }

  fn default_options(&self) -> Options {
    Options::new()
  }

  fn can_execute(&mut self, _state: &mut OperationState) -> bool {
    true
  }

  fn can_delete_record(&mut self, record: &Self::Record, state: &mut OperationState) -> bool;

  /// Deletes the record. `Ok(false)` means the record refused; its errors get reported.
  fn delete_record(&mut self, record: &mut Self::Record, state: &mut OperationState) -> anyhow::Result<bool>;
}

/// Delete template: record check, permission check, `delete_record`, `ok` or the record's errors.
pub struct Delete<D: DeleteOperation> {
  inner: D,
  record: Option<D::Record>,
}

impl<D: DeleteOperation> Delete<D> {
  pub fn new(inner: D, record: Option<D::Record>) -> Self {
    Self { inner, record }
  }

  pub fn inner(&self) -> &D {
    &self.inner
  }

  pub fn record(&self) -> Option<&D::Record> {
    self.record.as_ref()
  }
}

impl<D: DeleteOperation> Operation for Delete<D> {
  fn type_name(&self) -> &'static str {
    short_type_name::<D>()
  }

  fn lineage(&self) -> Vec<&'static str> {
    vec![short_type_name::<D>(), DELETE_SERVICE, CRUD_SERVICE, BASE_SERVICE]
  }

  fn default_options(&self) -> Options {
    self.inner.default_options()
  }

  fn can_execute(&mut self, state: &mut OperationState) -> bool {
    if self.record.is_none() {
      return state.not_found_error_and_fail(format!("{}.not_found", self.inner.record_error_key()));
    }
    self.inner.can_execute(state)
  }

  fn perform(&mut self, state: &mut OperationState) -> anyhow::Result<()> {
    state.with_callbacks(Hook::Delete, |state| -> anyhow::Result<()> {
      let key = self.inner.record_error_key();
      let Delete { inner, record } = self;
      let Some(record) = record.as_mut() else {
        return Ok(());
      };

      if !inner.can_delete_record(record, state) {
        forbid_unless_reported(state, format!("{}.cant_delete", key));
        return Ok(());
      }

      let deleted = state.with_callbacks(Hook::DeleteRecord, |state| inner.delete_record(&mut *record, state))?;
      if deleted {
        state.report_ok();
      } else {
        state.unprocessable_entity_error(record.errors());
      }
      Ok(())
    })
  }
}
