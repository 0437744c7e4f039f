// tests/outcome_tests.rs
mod common;

use common::*;
use opkit::core::status::StatusTable;
use opkit::{
  options, Configuration, Environment, ErrorEntry, ErrorPayload, MessageCatalog, OperationState, OpkitError,
  OpkitResult, Options, Phase, RecordErrors, Status,
};

fn fresh_state(env: Environment) -> OperationState {
  OperationState::new("Sample", vec!["Service"], options! {}, env)
}

fn fresh_state_with_config(config: Configuration) -> OperationState {
  fresh_state(Environment::isolated().with_config(config))
}

#[test]
fn test_fresh_state_is_valid_but_not_successful() {
  setup_tracing();
  let state = fresh_state(test_env());

  assert!(state.is_valid());
  assert!(!state.is_success());
  assert!(state.is_fail());
  assert!(!state.is_executed());
  assert_eq!(state.response_status(), "bad_request");
  assert_eq!(state.response_status_code(), 400);
  assert_eq!(state.phase(), Phase::Pending);
  assert!(state.callback_fired("before_initialize"));
  assert!(state.callback_fired("after_initialize"));
}

#[test]
fn test_report_error_sets_code_for_every_registered_reason() {
  setup_tracing();
  let table = StatusTable::new();
  for (reason, code) in table.error_reasons() {
    let mut state = fresh_state(test_env());
    let entry = state.report_error(reason, "sample.failed");

    assert_eq!(state.response_status_code(), code, "code for {}", reason);
    assert_eq!(state.errors().len(), 1, "one entry for {}", reason);
    assert_eq!(state.errors()[0], entry);
    assert!(!state.is_success());
  }
}

#[test]
fn test_report_error_and_fail_is_always_false() {
  setup_tracing();
  let mut state = fresh_state(test_env());
  assert!(!state.report_error_and_fail("forbidden", "sample.forbidden"));
  assert!(!state.not_found_error_and_fail("sample.missing"));
  assert_eq!(state.errors().len(), 2);
  assert_eq!(state.response_status(), "not_found");
}

#[test]
fn test_error_after_success_revokes_success_but_keeps_the_report() {
  setup_tracing();
  let mut state = fresh_state(test_env());
  state.report_ok();
  assert!(state.is_success());
  assert_eq!(state.response_status_code(), 200);

  state.unprocessable_entity_error("sample.late_failure");

  assert!(!state.is_success());
  assert!(state.is_fail());
  assert!(state.success_reported());
  assert_eq!(state.response_status_code(), 422);
}

#[test]
fn test_report_created_uses_201() {
  setup_tracing();
  let mut state = fresh_state(test_env());
  state.report_created();
  assert!(state.is_success());
  assert_eq!(state.response_status(), "created");
  assert_eq!(state.response_status_code(), 201);
}

#[test]
#[should_panic(expected = "opkit setup error")]
fn test_report_success_with_error_reason_panics() {
  let mut state = fresh_state(test_env());
  state.report_success("not_found");
}

#[test]
fn test_try_report_success_rejects_unknown_reason() {
  let mut state = fresh_state(test_env());
  let err = state.try_report_success("accepted").unwrap_err();
  assert!(matches!(err, OpkitError::InvalidSuccessStatus { reason } if reason == "accepted"));
  assert!(!state.success_reported());
}

#[test]
#[should_panic(expected = "opkit setup error")]
fn test_unknown_response_status_panics() {
  let mut state = fresh_state(test_env());
  state.set_response_status("teapot");
}

#[test]
fn test_set_response_status_by_code_uses_first_reason() {
  let mut state = fresh_state(test_env());
  state.set_response_status(500u16);
  assert_eq!(state.response_status(), "internal_server_error");
  assert_eq!(state.response_status_code(), 500);

  assert!(state.try_set_response_status(Status::Code(418)).is_err());
  assert_eq!(state.response_status_code(), 500);
}

#[test]
fn test_missing_translation_falls_back_to_diagnostic_message() {
  setup_tracing();
  let mut state = fresh_state(test_env());
  let entry = state.not_found_error("posts.not_found");
  assert_eq!(entry.as_message(), Some("translation missing: opkit.errors.posts.not_found"));
}

#[test]
fn test_catalog_messages_are_interpolated() {
  setup_tracing();
  let catalog = MessageCatalog::new().with("shop.errors.orders.not_found", "Order %{id} for %{customer} not found");
  let config = Configuration::new().with_i18n_namespace("shop").with_translator(catalog);
  let mut state = fresh_state_with_config(config);

  let vars = options! { "id" => 7, "customer" => "ada" };
  let entry = state.report_error_with("not_found", "orders.not_found", &vars);

  assert_eq!(entry.as_message(), Some("Order 7 for ada not found"));
  assert_eq!(entry.to_string(), "Order 7 for ada not found");
}

#[test]
fn test_failing_translator_yields_cant_fetch_message() {
  let translator = |_key: &str, _vars: &Options| -> OpkitResult<String> {
    Err(OpkitError::Configuration {
      message: "backend offline".to_string(),
    })
  };
  let mut state = fresh_state_with_config(Configuration::new().with_translator(translator));

  let entry = state.bad_request_error("orders.invalid");
  let message = entry.as_message().unwrap_or_default().to_string();
  assert!(message.starts_with("Can't fetch key opkit.errors.orders.invalid - "), "{}", message);
  assert!(message.contains("backend offline"));
}

#[test]
fn test_literal_and_structured_payloads_pass_through() {
  let mut state = fresh_state(test_env());

  state.bad_request_error(ErrorPayload::message("plain text"));
  let reasons = vec![options! { "field" => "email", "reason" => "taken" }];
  state.bad_request_error(reasons.clone());
  let mut record = RecordErrors::new();
  record.insert("name".to_string(), vec!["is too short".to_string()]);
  state.unprocessable_entity_error(record.clone());

  assert_eq!(
    state.errors(),
    &[
      ErrorEntry::Message("plain text".to_string()),
      ErrorEntry::Structured(reasons),
      ErrorEntry::Record(record),
    ]
  );
  assert_eq!(
    serde_json::to_value(&state.errors()[2]).unwrap(),
    serde_json::json!({ "name": ["is too short"] })
  );
}

#[test]
fn test_registered_reason_gets_a_reporter() {
  setup_tracing();
  let env = test_env();
  env.statuses.register("payment_required", 402).unwrap();
  let mut state = fresh_state(env);

  assert!(state.error_methods().contains(&"payment_required_error".to_string()));
  assert!(state.error_methods().contains(&"internal_server_error".to_string()));

  let entry = state.call_error_method("payment_required_error", "billing.unpaid").unwrap();
  assert!(entry.is_some());
  assert_eq!(state.response_status(), "payment_required");
  assert_eq!(state.response_status_code(), 402);

  let bang = state.call_error_method("payment_required_error!", "billing.unpaid").unwrap();
  assert!(bang.is_none());
  assert_eq!(state.errors().len(), 2);

  let unknown = state.call_error_method("teapot_error", "x");
  assert!(matches!(unknown, Err(OpkitError::UnknownErrorMethod { .. })));
}

#[test]
fn test_internal_server_alias_reports_500() {
  let mut state = fresh_state(test_env());
  state.call_error_method("internal_server_error", "boom").unwrap();
  assert_eq!(state.response_status_code(), 500);
  assert_eq!(state.response_status(), "internal_server_error");
  assert_eq!(state.error_method_code("internal_server_error!"), Some(500));
}

#[test]
fn test_reporter_for_reason_sharing_a_code_records_its_own_reason() {
  setup_tracing();
  let env = test_env();
  env.statuses.register("gone", 404).unwrap();

  let mut direct = fresh_state(env.clone());
  direct.report_error("gone", "posts.gone");

  let mut named = fresh_state(env.clone());
  named.call_error_method("gone_error", "posts.gone").unwrap();

  let mut named_and_fail = fresh_state(env);
  assert!(named_and_fail.call_error_method("gone_error!", "posts.gone").unwrap().is_none());

  for state in [&direct, &named, &named_and_fail] {
    assert_eq!(state.response_status(), "gone");
    assert_eq!(state.response_status_code(), 404);
  }
  assert_eq!(named.error_method_reason("gone_error"), Some(("gone".to_string(), 404)));
  assert_eq!(named.error_method_reason("not_found_error"), Some(("not_found".to_string(), 404)));
}

#[test]
fn test_option_helpers() {
  let options = options! { "notify" => true, "dry_run" => "yes", "limit" => 3 };
  let state = OperationState::new("Sample", vec![], options, test_env());

  assert!(state.option_exists("dry_run"));
  assert!(state.option_enabled("notify"));
  assert!(state.option_disabled("dry_run"), "Only literal true enables an option");
  assert!(state.option_disabled("missing"));
  assert_eq!(state.option("limit"), Some(&serde_json::json!(3)));
}

#[test]
fn test_valid_user_checks_configured_type() {
  let mut state = fresh_state(test_env());
  assert!(!state.valid_user().unwrap());

  state.set_user(TestUser::guest());
  assert!(state.valid_user().unwrap());
  assert_eq!(state.user::<TestUser>().map(|u| u.name.as_str()), Some("guest"));

  state.set_user("not a user");
  assert!(!state.valid_user().unwrap());
}

#[test]
fn test_valid_user_without_configured_type_is_an_error() {
  let state = fresh_state(Environment::isolated());
  assert!(matches!(state.valid_user(), Err(OpkitError::UserTypeNotConfigured)));
}
