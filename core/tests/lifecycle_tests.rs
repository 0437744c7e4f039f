// tests/lifecycle_tests.rs
mod common;

use common::*;
use opkit::{configuration, configure, options, Configuration, ErrorEntry, OpkitError, Phase, Service};
use parking_lot::Mutex;
use serial_test::serial;
use std::sync::Arc;

#[test]
fn test_execute_runs_step_once() {
  setup_tracing();
  let operation = CountingOperation::default();
  let mut service = Service::with_environment(operation.clone(), options! {}, test_env());

  service.execute();
  service.execute();

  assert_eq!(operation.runs(), 1);
  assert!(service.is_executed());
  assert!(service.is_success());
  assert!(service.step_failure().is_none());
  assert_eq!(service.response_status(), "ok");
  assert_eq!(service.phase(), Phase::Succeeded);
  assert_eq!(
    service.fired_callbacks().filter(|hook| *hook == "before_execute").count(),
    1
  );
}

#[test]
fn test_step_failure_is_recorded_not_propagated() {
  setup_tracing();
  let operation = CountingOperation {
    fail_with: Some("database unavailable"),
    ..CountingOperation::default()
  };
  let mut service = Service::with_environment(operation, options! {}, test_env());

  service.execute();

  assert!(service.is_executed());
  assert!(!service.is_success());
  assert_eq!(service.errors(), &[ErrorEntry::Message("database unavailable".to_string())]);
  assert_eq!(service.response_status(), "unprocessable_entity");
  assert_eq!(service.response_status_code(), 422);
  assert!(service.callback_fired("after_execute"));
  assert_eq!(service.phase(), Phase::Failed);

  let failure = service.step_failure().expect("step failure kept");
  assert!(matches!(failure, OpkitError::StepFailed { operation, .. } if operation == "CountingOperation"));
  assert_eq!(
    failure.to_string(),
    "Step failed for operation 'CountingOperation'. Source: database unavailable"
  );
  let source = std::error::Error::source(failure).map(|err| err.to_string());
  assert_eq!(source.as_deref(), Some("database unavailable"));
}

#[test]
fn test_failed_precondition_skips_step() {
  setup_tracing();
  let operation = CountingOperation {
    refuse: true,
    ..CountingOperation::default()
  };
  let mut service = Service::with_environment(operation.clone(), options! {}, test_env());

  service.execute();

  assert_eq!(operation.runs(), 0);
  assert!(service.is_executed());
  assert!(service.is_fail());
  assert_eq!(service.response_status(), "not_authorized");
  assert_eq!(service.response_status_code(), 401);
  assert_eq!(
    service.errors()[0].as_message(),
    Some("translation missing: opkit.errors.counting.refused")
  );
}

#[test]
fn test_phase_is_running_inside_execute() {
  setup_tracing();
  let seen = Arc::new(Mutex::new(Vec::new()));
  let mut service = Service::with_environment(CountingOperation::default(), options! {}, test_env());

  let s = seen.clone();
  service.register_callback("before_execute", "track_phase", move |state| s.lock().push(state.phase()));
  let s = seen.clone();
  service.register_callback("after_execute", "track_phase_after", move |state| s.lock().push(state.phase()));

  assert_eq!(service.phase(), Phase::Pending);
  service.execute();

  assert_eq!(*seen.lock(), vec![Phase::Running, Phase::Succeeded]);
}

#[test]
fn test_caller_options_override_defaults() {
  let service = Service::with_environment(CountingOperation::default(), options! { "limit" => 3 }, test_env());

  assert!(service.option_enabled("notify"));
  assert_eq!(service.option("limit"), Some(&serde_json::json!(3)));
  assert_eq!(service.type_name(), "CountingOperation");
  assert_eq!(service.lineage(), &["CountingOperation", "Service"]);
}

#[test]
fn test_into_parts_returns_operation_and_state() {
  let mut service = Service::with_environment(CountingOperation::default(), options! {}, test_env());
  service.execute();
  let (operation, state) = service.into_parts();
  assert_eq!(operation.runs(), 1);
  assert!(state.is_success());
}

#[test]
#[serial]
fn test_configure_updates_later_operations_only() {
  setup_tracing();
  let before = Service::new(CountingOperation::default(), options! {});
  let previous = configuration().i18n_namespace().to_string();

  configure(|config| config.set_i18n_namespace("billing"));
  let mut after = Service::new(
    CountingOperation {
      refuse: true,
      ..CountingOperation::default()
    },
    options! {},
  );
  after.execute();

  assert_eq!(before.config().i18n_namespace(), previous);
  assert_eq!(
    after.errors()[0].as_message(),
    Some("translation missing: billing.errors.counting.refused")
  );

  configure(|config| config.set_i18n_namespace(previous));
}

#[test]
#[serial]
fn test_configure_closure_may_read_current_configuration() {
  setup_tracing();
  let previous = configuration().i18n_namespace().to_string();

  configure(|config| {
    let current = configuration();
    config.set_i18n_namespace(format!("{}_nested", current.i18n_namespace()));
  });

  assert_eq!(configuration().i18n_namespace(), format!("{}_nested", previous));
  configure(|config| config.set_i18n_namespace(previous));
}

#[test]
#[serial]
fn test_namespace_from_environment_is_validated() {
  setup_tracing();
  let key = "OPKIT_I18N_NAMESPACE";

  std::env::set_var(key, "  billing ");
  let config = Configuration::try_from_env().unwrap();
  assert_eq!(config.i18n_namespace(), "billing");

  for bad in ["   ", "bill ing"] {
    std::env::set_var(key, bad);
    assert!(
      matches!(Configuration::try_from_env(), Err(OpkitError::Configuration { .. })),
      "{:?} rejected",
      bad
    );
    assert_eq!(Configuration::from_env().i18n_namespace(), "opkit");
  }

  std::env::remove_var(key);
  assert_eq!(Configuration::try_from_env().unwrap().i18n_namespace(), "opkit");
}
