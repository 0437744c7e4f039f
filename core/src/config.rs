// opkit/src/config.rs

//! Process-level configuration: message translation, the i18n namespace used
//! to build error keys, and the user type checked by `valid_user`.
//!
//! [`Environment`] bundles a configuration with the callback registry and
//! status table an operation should use, so tests and embedders can inject
//! their own instead of the process-wide defaults.

use crate::core::options::Options;
use crate::core::status::SharedStatusTable;
use crate::error::{OpkitError, OpkitResult};
use crate::registry::CallbackRegistry;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde_json::Value;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{event, Level};

pub const DEFAULT_I18N_NAMESPACE: &str = "opkit";

/// Environment variable read by [`Configuration::from_env`].
pub const I18N_NAMESPACE_ENV: &str = "OPKIT_I18N_NAMESPACE";

/// Resolves a fully qualified message key to a human-readable message.
pub trait Translate: Send + Sync {
  fn translate(&self, key: &str, vars: &Options) -> OpkitResult<String>;
}

impl<F> Translate for F
where
  F: Fn(&str, &Options) -> OpkitResult<String> + Send + Sync,
{
  fn translate(&self, key: &str, vars: &Options) -> OpkitResult<String> {
    self(key, vars)
  }
}

/// In-memory translator: dotted keys to message templates.
///
/// Templates may reference report variables as `%{name}`.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
  messages: HashMap<String, String>,
}

impl MessageCatalog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
    self.insert(key, template);
    self
  }

  pub fn insert(&mut self, key: impl Into<String>, template: impl Into<String>) {
    self.messages.insert(key.into(), template.into());
  }

  fn interpolate(template: &str, vars: &Options) -> String {
    let mut message = template.to_string();
    for (name, value) in vars {
      let rendered = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
      };
      message = message.replace(&format!("%{{{}}}", name), &rendered);
    }
    message
  }
}

impl Translate for MessageCatalog {
  fn translate(&self, key: &str, vars: &Options) -> OpkitResult<String> {
    self
      .messages
      .get(key)
      .map(|template| Self::interpolate(template, vars))
      .ok_or_else(|| OpkitError::TranslationMissing { key: key.to_string() })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserType {
  pub id: TypeId,
  pub name: &'static str,
}

#[derive(Clone)]
pub struct Configuration {
  i18n_namespace: String,
  translator: Arc<dyn Translate>,
  user_type: Option<UserType>,
}

impl fmt::Debug for Configuration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Configuration")
      .field("i18n_namespace", &self.i18n_namespace)
      .field("user_type", &self.user_type.map(|u| u.name))
      .finish()
  }
}

impl Default for Configuration {
  fn default() -> Self {
    Self::new()
  }
}

impl Configuration {
  pub fn new() -> Self {
    Self {
      i18n_namespace: DEFAULT_I18N_NAMESPACE.to_string(),
      translator: Arc::new(MessageCatalog::new()),
      user_type: None,
    }
  }

  /// Defaults, with the namespace taken from `OPKIT_I18N_NAMESPACE` when set.
  ///
  /// An unusable value is logged and ignored; see [`try_from_env`](Self::try_from_env).
  pub fn from_env() -> Self {
    Self::try_from_env().unwrap_or_else(|err| {
      event!(Level::WARN, error = %err, "Ignoring environment configuration.");
      Self::new()
    })
  }

  /// Like [`from_env`](Self::from_env), but rejects a namespace that is blank,
  /// not unicode, or contains whitespace.
  pub fn try_from_env() -> OpkitResult<Self> {
    let mut config = Self::new();
    let namespace = match std::env::var(I18N_NAMESPACE_ENV) {
      Ok(namespace) => namespace,
      Err(std::env::VarError::NotPresent) => return Ok(config),
      Err(std::env::VarError::NotUnicode(_)) => {
        return Err(OpkitError::Configuration {
          message: format!("{} is not valid unicode", I18N_NAMESPACE_ENV),
        })
      }
    };

    let namespace = namespace.trim();
    if namespace.is_empty() || namespace.contains(char::is_whitespace) {
      return Err(OpkitError::Configuration {
        message: format!("{} must be a non-blank key prefix, got '{}'", I18N_NAMESPACE_ENV, namespace),
      });
    }
    config.set_i18n_namespace(namespace);
    Ok(config)
  }

  pub fn with_i18n_namespace(mut self, namespace: impl Into<String>) -> Self {
    self.set_i18n_namespace(namespace);
    self
  }

  pub fn with_translator(mut self, translator: impl Translate + 'static) -> Self {
    self.set_translator(translator);
    self
  }

  pub fn with_user_type<U: 'static>(mut self) -> Self {
    self.set_user_type::<U>();
    self
  }

  pub fn set_i18n_namespace(&mut self, namespace: impl Into<String>) {
    self.i18n_namespace = namespace.into();
  }

  pub fn set_translator(&mut self, translator: impl Translate + 'static) {
    self.translator = Arc::new(translator);
  }

  pub fn set_user_type<U: 'static>(&mut self) {
    self.user_type = Some(UserType {
      id: TypeId::of::<U>(),
      name: std::any::type_name::<U>(),
    });
  }

  pub fn i18n_namespace(&self) -> &str {
    &self.i18n_namespace
  }

  pub fn i18n_errors_namespace(&self) -> String {
    format!("{}.errors", self.i18n_namespace)
  }

  pub fn user_type(&self) -> Option<UserType> {
    self.user_type
  }

  pub fn translate(&self, key: &str, vars: &Options) -> OpkitResult<String> {
    self.translator.translate(key, vars)
  }
}

static CONFIGURATION: Lazy<RwLock<Arc<Configuration>>> = Lazy::new(|| RwLock::new(Arc::new(Configuration::from_env())));

/// Snapshot of the process-wide configuration.
pub fn configuration() -> Arc<Configuration> {
  CONFIGURATION.read().clone()
}

/// Updates the process-wide configuration. Operations already constructed
/// keep the snapshot they were built with.
///
/// `update` runs with no lock held, so it may read [`configuration()`].
pub fn configure(update: impl FnOnce(&mut Configuration)) {
  let mut next = (*configuration()).clone();
  update(&mut next);
  event!(Level::DEBUG, config = ?next, "Process configuration updated.");
  *CONFIGURATION.write() = Arc::new(next);
}

/// The shared collaborators an operation is wired to.
#[derive(Debug, Clone)]
pub struct Environment {
  pub registry: CallbackRegistry,
  pub statuses: SharedStatusTable,
  pub config: Arc<Configuration>,
}

impl Default for Environment {
  fn default() -> Self {
    Self::global()
  }
}

impl Environment {
  /// The process-wide registry, status table and current configuration.
  pub fn global() -> Self {
    Self {
      registry: CallbackRegistry::global(),
      statuses: SharedStatusTable::global(),
      config: configuration(),
    }
  }

  /// A fresh registry and status table with default configuration, sharing nothing.
  pub fn isolated() -> Self {
    Self {
      registry: CallbackRegistry::new(),
      statuses: SharedStatusTable::default(),
      config: Arc::new(Configuration::new()),
    }
  }

  pub fn with_registry(mut self, registry: CallbackRegistry) -> Self {
    self.registry = registry;
    self
  }

  pub fn with_statuses(mut self, statuses: SharedStatusTable) -> Self {
    self.statuses = statuses;
    self
  }

  pub fn with_config(mut self, config: Configuration) -> Self {
    self.config = Arc::new(config);
    self
  }
}
