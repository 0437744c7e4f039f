// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use opkit::crud::{ActionOperation, CreateOperation, DeleteOperation, Record, UpdateOperation};
use opkit::{options, Environment, OperationState, Options, RecordErrors};
use serde_json::Value;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

// --- Helper for Tracing Setup ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// Fresh registry, status table and configuration, with the test user type configured.
pub fn test_env() -> Environment {
  let env = Environment::isolated();
  let config = (*env.config).clone().with_user_type::<TestUser>();
  env.with_config(config)
}

// --- Users ---
#[derive(Clone, Debug, PartialEq)]
pub struct TestUser {
  pub name: String,
  pub admin: bool,
}

impl TestUser {
  pub fn admin() -> Self {
    Self {
      name: "root".to_string(),
      admin: true,
    }
  }

  pub fn guest() -> Self {
    Self {
      name: "guest".to_string(),
      admin: false,
    }
  }
}

fn is_admin(state: &OperationState) -> bool {
  state.user::<TestUser>().map_or(false, |user| user.admin)
}

// --- Plain operation ---

/// Counts its step runs; optionally fails its step or its precondition.
#[derive(Clone, Default)]
pub struct CountingOperation {
  pub runs: Arc<AtomicUsize>,
  pub fail_with: Option<&'static str>,
  pub refuse: bool,
}

impl CountingOperation {
  pub fn runs(&self) -> usize {
    self.runs.load(Ordering::SeqCst)
  }
}

impl opkit::Operation for CountingOperation {
  fn default_options(&self) -> Options {
    options! { "notify" => true, "limit" => 10 }
  }

  fn can_execute(&mut self, state: &mut OperationState) -> bool {
    if self.refuse {
      return state.not_authorized_error_and_fail("counting.refused");
    }
    true
  }

  fn perform(&mut self, state: &mut OperationState) -> anyhow::Result<()> {
    self.runs.fetch_add(1, Ordering::SeqCst);
    if let Some(message) = self.fail_with {
      anyhow::bail!(message);
    }
    state.report_ok();
    Ok(())
  }
}

// --- Record ---
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Post {
  pub title: String,
  pub body: String,
  pub deleted: bool,
  pub locked: bool,
}

impl Record for Post {
  fn is_valid(&self) -> bool {
    !self.title.is_empty()
  }

  fn errors(&self) -> RecordErrors {
    let mut errors = RecordErrors::new();
    if self.title.is_empty() {
      errors.insert("title".to_string(), vec!["can't be blank".to_string()]);
    }
    if self.locked {
      errors.insert("base".to_string(), vec!["is locked".to_string()]);
    }
    errors
  }

  fn attributes(&self) -> Options {
    options! { "title" => self.title.clone(), "body" => self.body.clone() }
  }
}

fn string_attribute(attributes: &Options, key: &str) -> Option<String> {
  attributes.get(key).and_then(Value::as_str).map(str::to_string)
}

// --- Crud collaborators ---
#[derive(Default)]
pub struct PostCreate {
  pub saved: Vec<Post>,
}

impl CreateOperation for PostCreate {
  type Record = Post;

  fn whitelist_attributes(&self) -> &'static [&'static str] {
    &["title", "body"]
  }

  fn can_create_record(&mut self, state: &mut OperationState) -> bool {
    is_admin(state)
  }

  fn build_record(&mut self, attributes: Options, _state: &mut OperationState) -> anyhow::Result<Post> {
    Ok(Post {
      title: string_attribute(&attributes, "title").unwrap_or_default(),
      body: string_attribute(&attributes, "body").unwrap_or_default(),
      ..Post::default()
    })
  }

  fn save_record(&mut self, record: &mut Post, _state: &mut OperationState) -> anyhow::Result<()> {
    if record.is_valid() {
      self.saved.push(record.clone());
    }
    Ok(())
  }
}

#[derive(Default)]
pub struct PostUpdate;

impl UpdateOperation for PostUpdate {
  type Record = Post;

  fn whitelist_attributes(&self) -> &'static [&'static str] {
    &["title", "body"]
  }

  fn user_can_update_record(&mut self, record: &Post, state: &mut OperationState) -> bool {
    is_admin(state) && !record.locked
  }

  fn update_record(&mut self, record: &mut Post, attributes: Options, _state: &mut OperationState) -> anyhow::Result<()> {
    if let Some(title) = string_attribute(&attributes, "title") {
      record.title = title;
    }
    if let Some(body) = string_attribute(&attributes, "body") {
      record.body = body;
    }
    Ok(())
  }
}

#[derive(Default)]
pub struct PostDelete;

impl DeleteOperation for PostDelete {
  type Record = Post;

  fn can_delete_record(&mut self, _record: &Post, state: &mut OperationState) -> bool {
    is_admin(state)
  }

  fn delete_record(&mut self, record: &mut Post, _state: &mut OperationState) -> anyhow::Result<bool> {
    if record.locked {
      return Ok(false);
    }
    record.deleted = true;
    Ok(true)
  }
}

/// Publishes a post; refuses guests and empty titles.
pub struct PublishPost {
  pub post: Post,
  pub published: bool,
}

impl ActionOperation for PublishPost {
  fn action_name(&self) -> &str {
    "publish"
  }

  fn record_error_key(&self) -> String {
    "posts".to_string()
  }

  fn user_can_execute_action(&mut self, state: &mut OperationState) -> bool {
    is_admin(state)
  }

  fn execute_service_action(&mut self, state: &mut OperationState) -> anyhow::Result<()> {
    if self.post.title.is_empty() {
      state.add_error(opkit::ErrorEntry::Message("title missing".to_string()));
      return Ok(());
    }
    self.published = true;
    Ok(())
  }

  fn action_errors(&self, _state: &OperationState) -> Vec<Options> {
    if self.post.title.is_empty() {
      vec![options! { "field" => "title", "reason" => "blank" }]
    } else {
      Vec::new()
    }
  }
}
