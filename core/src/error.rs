// opkit/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpkitError {
  #[error("Unknown response status: {status}")]
  UnknownStatus { status: String },

  #[error("'{reason}' is not a valid success response status")]
  InvalidSuccessStatus { reason: String },

  #[error("Reason '{reason}' is already registered as a {existing} status")]
  ReasonConflict { reason: String, existing: &'static str },

  #[error("No error reporter named '{method_name}'")]
  UnknownErrorMethod { method_name: String },

  #[error("translation missing: {key}")]
  TranslationMissing { key: String },

  #[error("Invalid user type. Use Configuration::with_user_type::<YourUser>()")]
  UserTypeNotConfigured,

  #[error("Step failed for operation '{operation}'. Source: {source}")]
  StepFailed {
    operation: String,
    #[source]
    source: AnyhowError,
  },

  #[error("Configuration error: {message}")]
  Configuration { message: String },
}

pub type OpkitResult<T, E = OpkitError> = std::result::Result<T, E>;
