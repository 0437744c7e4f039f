// opkit/src/registry.rs

//! Defines `CallbackRegistry`, the class-level store of hook points,
//! registered callbacks and callback actions, keyed by operation type name.
//!
//! Registration is append-only. A callback registered for one type is, by
//! default, fired for instances of every type (see [`FanOut`]).

use crate::core::hook::{default_hook_points, Hook};
use crate::core::naming::callback_name;
use crate::service::state::OperationState;
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{event, Level};

/// A callback body. It runs against the state of the instance that fired it.
pub type Action = Arc<dyn Fn(&mut OperationState) + Send + Sync>;

/// Which types' class-level callbacks an instance fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanOut {
  /// Every type that ever registered a callback for the hook.
  #[default]
  Global,
  /// Only the types in the firing instance's lineage.
  Lineage,
}

/// A class-level callback matched for a hook, as handed to the dispatcher.
#[derive(Clone)]
pub(crate) struct ClassCallback {
  pub type_name: String,
  pub action: String,
  pub body: Option<Action>,
}

struct RegistryInner {
  hook_points: IndexSet<String>,
  // type -> hook -> normalized action names
  callbacks: IndexMap<String, IndexMap<String, Vec<String>>>,
  // type -> normalized action name -> body
  actions: IndexMap<String, HashMap<String, Action>>,
  fan_out: FanOut,
}

impl RegistryInner {
  fn attach(&mut self, type_name: &str, hook: &str, action: String) {
    if !self.hook_points.contains(hook) {
      event!(Level::WARN, %hook, %type_name, "Registering callback on an undeclared hook point.");
    }
    event!(Level::DEBUG, %type_name, %hook, %action, "Class callback registered.");
    self
      .callbacks
      .entry(type_name.to_string())
      .or_default()
      .entry(hook.to_string())
      .or_default()
      .push(action);
  }

  fn define(&mut self, type_name: &str, action: String, body: Action) {
    event!(Level::TRACE, %type_name, %action, "Class callback action defined.");
    self.actions.entry(type_name.to_string()).or_default().insert(action, body);
  }
}

/// Shared handle to a callback registry. Clones point at the same store.
#[derive(Clone)]
pub struct CallbackRegistry(Arc<RwLock<RegistryInner>>);

static GLOBAL_REGISTRY: Lazy<CallbackRegistry> = Lazy::new(CallbackRegistry::new);

impl fmt::Debug for CallbackRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let inner = self.0.read();
    f.debug_struct("CallbackRegistry")
      .field("fan_out", &inner.fan_out)
      .field("hook_points", &inner.hook_points.len())
      .field("types_with_callbacks", &inner.callbacks.keys().collect::<Vec<_>>())
      .field("types_with_actions", &inner.actions.keys().collect::<Vec<_>>())
      .finish()
  }
}

impl Default for CallbackRegistry {
  fn default() -> Self {
    Self::new()
  }
}

impl CallbackRegistry {
  /// Creates an empty registry knowing the default hook points.
  pub fn new() -> Self {
    CallbackRegistry(Arc::new(RwLock::new(RegistryInner {
      hook_points: default_hook_points().map(str::to_string).collect(),
      callbacks: IndexMap::new(),
      actions: IndexMap::new(),
      fan_out: FanOut::default(),
    })))
  }

  /// The process-wide registry used by operations built without an explicit environment.
  pub fn global() -> Self {
    GLOBAL_REGISTRY.clone()
  }

  pub fn with_fan_out(self, fan_out: FanOut) -> Self {
    self.set_fan_out(fan_out);
    self
  }

  pub fn set_fan_out(&self, fan_out: FanOut) {
    self.0.write().fan_out = fan_out;
  }

  pub fn fan_out(&self) -> FanOut {
    self.0.read().fan_out
  }

  /// Makes `name` a recognized lifecycle point.
  pub fn declare_hook_point(&self, name: &str) {
    if self.0.write().hook_points.insert(name.to_string()) {
      event!(Level::DEBUG, hook = %name, "Hook point declared.");
    }
  }

  pub fn is_hook_point(&self, name: &str) -> bool {
    self.0.read().hook_points.contains(name)
  }

  pub fn hook_points(&self) -> Vec<String> {
    self.0.read().hook_points.iter().cloned().collect()
  }

  /// Registers `body` as action `action_id` and fires it on `hook`.
  ///
  /// Both entries are written under one lock, so no dispatch sees the
  /// callback without its body.
  pub fn register_callback<F>(&self, type_name: &str, hook: &str, action_id: &str, body: F)
  where
    F: Fn(&mut OperationState) + Send + Sync + 'static,
  {
    let action = callback_name(action_id);
    let mut inner = self.0.write();
    inner.define(type_name, action.clone(), Arc::new(body));
    inner.attach(type_name, hook, action);
  }

  /// Fires the already defined action `action_id` on `hook`.
  pub fn attach_callback(&self, type_name: &str, hook: &str, action_id: &str) {
    self.0.write().attach(type_name, hook, callback_name(action_id));
  }

  /// Defines a class-level action under the normalized `action_id`.
  pub fn register_callback_action<F>(&self, type_name: &str, action_id: &str, body: F)
  where
    F: Fn(&mut OperationState) + Send + Sync + 'static,
  {
    self.0.write().define(type_name, callback_name(action_id), Arc::new(body));
  }

  /// Defines the `before_<hook>` action of `type_name`.
  pub fn before<F>(&self, type_name: &str, hook: Hook, body: F)
  where
    F: Fn(&mut OperationState) + Send + Sync + 'static,
  {
    self.register_callback_action(type_name, hook.before(), body);
  }

  /// Defines the `after_<hook>` action of `type_name`.
  pub fn after<F>(&self, type_name: &str, hook: Hook, body: F)
  where
    F: Fn(&mut OperationState) + Send + Sync + 'static,
  {
    self.register_callback_action(type_name, hook.after(), body);
  }

  /// Types that have registered at least one class callback, in registration order.
  pub fn registered_types(&self) -> Vec<String> {
    self.0.read().callbacks.keys().cloned().collect()
  }

  /// Normalized action names registered by `type_name` for `hook`.
  pub fn callbacks_for(&self, type_name: &str, hook: &str) -> Vec<String> {
    self
      .0
      .read()
      .callbacks
      .get(type_name)
      .and_then(|hooks| hooks.get(hook))
      .cloned()
      .unwrap_or_default()
  }

  /// Looks `name` up among the class-level actions of `lineage`, nearest type first.
  pub(crate) fn class_action(&self, lineage: &[&'static str], name: &str) -> Option<Action> {
    let name = callback_name(name);
    let inner = self.0.read();
    lineage
      .iter()
      .find_map(|type_name| inner.actions.get(*type_name).and_then(|actions| actions.get(&name)))
      .cloned()
  }

  /// Class callbacks an instance of `lineage` fires on `hook`, honoring the fan-out mode.
  pub(crate) fn class_callbacks(&self, hook: &str, lineage: &[&'static str]) -> Vec<ClassCallback> {
    let inner = self.0.read();
    let mut matched = Vec::new();
    for (type_name, hooks) in &inner.callbacks {
      if inner.fan_out == FanOut::Lineage && !lineage.contains(&type_name.as_str()) {
        continue;
      }
      let Some(actions) = hooks.get(hook) else {
        continue;
      };
      for action in actions {
        let body = inner.actions.get(type_name).and_then(|defined| defined.get(action)).cloned();
        matched.push(ClassCallback {
          type_name: type_name.clone(),
          action: action.clone(),
          body,
        });
      }
    }
    matched
  }
}
