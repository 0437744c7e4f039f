// opkit/src/service/reporters.rs

//! Named error reporters.
//!
//! Every error reason `r` in the status table has a reporter pair named
//! `<r>_error` and `<r>_error!`. The built-in reasons get real methods
//! generated below; reasons registered at runtime are reached through
//! [`OperationState::call_error_method`], which reads the live table.

use crate::core::entry::{ErrorEntry, ErrorPayload};
use crate::core::naming::{normalized_callback_name, ERROR_METHOD_SUFFIX};
use crate::error::{OpkitError, OpkitResult};
use crate::service::state::OperationState;

macro_rules! error_reporters {
  ($( $reason:literal => $report:ident, $report_and_fail:ident; )*) => {
    impl OperationState {
      $(
        #[doc = concat!("Reports a `", $reason, "` error. See [`OperationState::report_error`].")]
        pub fn $report(&mut self, payload: impl Into<ErrorPayload>) -> ErrorEntry {
          self.report_error($reason, payload)
        }

        #[doc = concat!("Reports a `", $reason, "` error and returns `false`.")]
        pub fn $report_and_fail(&mut self, payload: impl Into<ErrorPayload>) -> bool {
          self.report_error_and_fail($reason, payload)
        }
      )*
    }
  };
}

error_reporters! {
  "bad_request" => bad_request_error, bad_request_error_and_fail;
  "not_authorized" => not_authorized_error, not_authorized_error_and_fail;
  "forbidden" => forbidden_error, forbidden_error_and_fail;
  "not_found" => not_found_error, not_found_error_and_fail;
  "unprocessable_entity" => unprocessable_entity_error, unprocessable_entity_error_and_fail;
  "internal_server_error" => internal_server_error, internal_server_error_and_fail;
  "not_implemented" => not_implemented_error, not_implemented_error_and_fail;
}

impl OperationState {
  /// Names of the reporters available for the reasons currently in the status table.
  pub fn error_methods(&self) -> Vec<String> {
    let table = self.statuses.read();
    let mut names: Vec<String> = Vec::new();
    for (reason, _) in table.error_reasons() {
      let name = normalized_callback_name(reason, ERROR_METHOD_SUFFIX);
      if !names.contains(&name) {
        names.push(name);
      }
    }
    names
  }

  /// Reason and code behind a reporter name.
  ///
  /// A reason spelled exactly like the name wins (`internal_server_error`).
  /// Otherwise the last reason normalizing to the name is used (`gone` for `gone_error`).
  pub fn error_method_reason(&self, method_name: &str) -> Option<(String, u16)> {
    let method_name = method_name.strip_suffix('!').unwrap_or(method_name);
    let table = self.statuses.read();
    if table.is_error_reason(method_name) {
      return table.code_for(method_name).map(|code| (method_name.to_string(), code));
    }
    table
      .error_reasons()
      .filter(|(reason, _)| normalized_callback_name(reason, ERROR_METHOD_SUFFIX) == method_name)
      .map(|(reason, code)| (reason.to_string(), code))
      .last()
  }

  pub fn error_method_code(&self, method_name: &str) -> Option<u16> {
    self.error_method_reason(method_name).map(|(_, code)| code)
  }

  /// Calls a reporter by name.
  ///
  /// `"not_found_error"` behaves like `report_error` and returns the entry;
  /// `"not_found_error!"` behaves like `report_error_and_fail` and returns `None`.
  pub fn call_error_method(
    &mut self,
    method_name: &str,
    payload: impl Into<ErrorPayload>,
  ) -> OpkitResult<Option<ErrorEntry>> {
    let (reason, _) = self
      .error_method_reason(method_name)
      .ok_or_else(|| OpkitError::UnknownErrorMethod {
        method_name: method_name.to_string(),
      })?;

    let entry = self.report_error(reason.as_str(), payload);
    if method_name.ends_with('!') {
      Ok(None)
    } else {
      Ok(Some(entry))
    }
  }
}
