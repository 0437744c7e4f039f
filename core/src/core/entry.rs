// opkit/src/core/entry.rs

//! What gets recorded in an operation's error list, and what callers hand to
//! the error reporters.

use crate::core::options::Options;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Nested error collection of a domain record: attribute name to its messages.
pub type RecordErrors = IndexMap<String, Vec<String>>;

/// One entry of an operation's error list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorEntry {
  /// A resolved, human-readable message.
  Message(String),
  /// Structured reason maps passed through unchanged.
  Structured(Vec<Options>),
  /// A record's own error collection passed through unchanged.
  Record(RecordErrors),
}

impl ErrorEntry {
  pub fn as_message(&self) -> Option<&str> {
    match self {
      ErrorEntry::Message(message) => Some(message),
      _ => None,
    }
  }
}

impl fmt::Display for ErrorEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ErrorEntry::Message(message) => f.write_str(message),
      ErrorEntry::Structured(reasons) => {
        let rendered = serde_json::to_string(reasons).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
      }
      ErrorEntry::Record(errors) => {
        let mut first = true;
        for (attribute, messages) in errors {
          for message in messages {
            if !first {
              f.write_str(", ")?;
            }
            write!(f, "{} {}", attribute, message)?;
            first = false;
          }
        }
        Ok(())
      }
    }
  }
}

/// Input of an error report.
///
/// Plain strings are message keys, resolved against the configured
/// translator under the errors namespace. Everything else is recorded as is.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorPayload {
  Key(String),
  Message(String),
  Structured(Vec<Options>),
  Record(RecordErrors),
}

impl ErrorPayload {
  /// A literal message that skips translation.
  pub fn message(text: impl Into<String>) -> Self {
    ErrorPayload::Message(text.into())
  }
}

impl From<&str> for ErrorPayload {
  fn from(key: &str) -> Self {
    ErrorPayload::Key(key.to_string())
  }
}

impl From<String> for ErrorPayload {
  fn from(key: String) -> Self {
    ErrorPayload::Key(key)
  }
}

impl From<&String> for ErrorPayload {
  fn from(key: &String) -> Self {
    ErrorPayload::Key(key.clone())
  }
}

impl From<Vec<Options>> for ErrorPayload {
  fn from(reasons: Vec<Options>) -> Self {
    ErrorPayload::Structured(reasons)
  }
}

impl From<RecordErrors> for ErrorPayload {
  fn from(errors: RecordErrors) -> Self {
    ErrorPayload::Record(errors)
  }
}
