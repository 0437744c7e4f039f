// opkit/src/service/hooks.rs

//! Contains the callback dispatcher (`fire`, `with_callbacks`) and the
//! instance-level registration methods of `OperationState`.

use crate::core::hook::Hook;
use crate::core::naming::callback_name;
use crate::service::state::OperationState;
use std::sync::Arc;
use tracing::{event, span, Level};

impl OperationState {
  /// Registers `body` as instance action `action_id` and fires it on `hook`.
  pub fn register_callback<F>(&mut self, hook: &str, action_id: &str, body: F)
  where
    F: Fn(&mut OperationState) + Send + Sync + 'static,
  {
    self.attach_callback(hook, action_id);
    self.register_callback_action(action_id, body);
  }

  /// Fires the already defined instance action `action_id` on `hook`.
  pub fn attach_callback(&mut self, hook: &str, action_id: &str) {
    let action = callback_name(action_id);
    event!(Level::DEBUG, operation = %self.type_name, %hook, %action, "Instance callback registered.");
    self
      .instance_callbacks
      .entry(hook.to_string())
      .or_default()
      .push(action);
  }

  /// Defines an instance action under the normalized `action_id`.
  ///
  /// An action named after a hook point (`before_success`) acts as that hook's
  /// direct method on this instance.
  pub fn register_callback_action<F>(&mut self, action_id: &str, body: F)
  where
    F: Fn(&mut OperationState) + Send + Sync + 'static,
  {
    self.instance_actions.insert(callback_name(action_id), Arc::new(body));
  }

  /// Whether a hook point or a custom action has fired on this instance.
  pub fn callback_fired(&self, name: &str) -> bool {
    self.fired.contains(name) || self.custom_fired.contains(name) || self.custom_fired.contains(&callback_name(name))
  }

  /// Hook points fired so far, in first-fired order.
  pub fn fired_callbacks(&self) -> impl Iterator<Item = &str> {
    self.fired.iter().map(String::as_str)
  }

  /// Custom actions fired so far, normalized, in first-fired order.
  pub fn fired_custom_callbacks(&self) -> impl Iterator<Item = &str> {
    self.custom_fired.iter().map(String::as_str)
  }

  /// Fires `hook`: its direct method, then the instance callbacks, then the
  /// class callbacks of every type selected by the registry's fan-out mode.
  pub fn fire(&mut self, hook: &str) -> &mut Self {
    let hook_span = span!(Level::TRACE, "fire", operation = self.type_name, hook);
    let _hook_span_guard = hook_span.enter();

    self.fired.insert(hook.to_string());

    // Direct method: instance action first, then the nearest type in the lineage.
    let direct_name = callback_name(hook);
    let direct = self
      .instance_actions
      .get(&direct_name)
      .cloned()
      .or_else(|| self.registry.class_action(&self.lineage, &direct_name));
    if let Some(action) = direct {
      event!(Level::TRACE, action = %direct_name, "Invoking direct hook method.");
      action(self);
    }

    let instance_callbacks = self.instance_callbacks.get(hook).cloned().unwrap_or_default();
    for action_name in instance_callbacks {
      if let Some(action) = self.instance_actions.get(&action_name).cloned() {
        event!(Level::TRACE, action = %action_name, "Invoking instance callback.");
        self.custom_fired.insert(action_name);
        action(self);
      }
    }

    let class_callbacks = self.registry.class_callbacks(hook, &self.lineage);
    for callback in class_callbacks {
      self.custom_fired.insert(callback.action.clone());
      let body = self
        .instance_actions
        .get(&callback.action)
        .cloned()
        .or_else(|| self.registry.class_action(&self.lineage, &callback.action))
        .or(callback.body);
      match body {
        Some(action) => {
          event!(Level::TRACE, action = %callback.action, registered_by = %callback.type_name, "Invoking class callback.");
          action(self);
        }
        None => {
          event!(Level::TRACE, action = %callback.action, registered_by = %callback.type_name, "Class callback has no body; skipped.");
        }
      }
    }

    self
  }

  /// Fires `before_<basename>`, runs `body`, fires `after_<basename>`, and
  /// returns what `body` returned.
  pub fn with_callbacks<T>(&mut self, basename: impl AsRef<str>, body: impl FnOnce(&mut Self) -> T) -> T {
    let basename = basename.as_ref();
    self.fire(&format!("before_{}", basename));
    let response = body(self);
    self.fire(&format!("after_{}", basename));
    response
  }

  /// Fires the `before_*` point of a built-in hook.
  pub fn fire_before(&mut self, hook: Hook) -> &mut Self {
    self.fire(hook.before())
  }

  /// Fires the `after_*` point of a built-in hook.
  pub fn fire_after(&mut self, hook: Hook) -> &mut Self {
    self.fire(hook.after())
  }
}
