// opkit_core/examples/crud_operations.rs

use opkit::crud::{Create, CreateOperation, Record, Update, UpdateOperation};
use opkit::{configure, options, CallbackRegistry, MessageCatalog, OperationState, Options, RecordErrors, Service};
use serde_json::Value;
use tracing::info;

// 1. The domain record and the user type
#[derive(Clone, Debug, Default)]
struct Article {
  title: String,
  author: String,
}

impl Record for Article {
  fn is_valid(&self) -> bool {
    !self.title.is_empty()
  }

  fn errors(&self) -> RecordErrors {
    let mut errors = RecordErrors::new();
    if self.title.is_empty() {
      errors.insert("title".to_string(), vec!["can't be blank".to_string()]);
    }
    errors
  }

  fn attributes(&self) -> Options {
    options! { "title" => self.title.clone() }
  }
}

#[derive(Debug)]
struct Editor {
  name: String,
}

fn editor_name(state: &OperationState) -> Option<String> {
  state.user::<Editor>().map(|editor| editor.name.clone())
}

// 2. Collaborators supplying the permission checks and the persistence calls
struct CreateArticle;

impl CreateOperation for CreateArticle {
  type Record = Article;

  fn whitelist_attributes(&self) -> &'static [&'static str] {
    &["title"]
  }

  fn can_create_record(&mut self, state: &mut OperationState) -> bool {
    editor_name(state).is_some()
  }

  fn build_record(&mut self, attributes: Options, state: &mut OperationState) -> anyhow::Result<Article> {
    Ok(Article {
      title: attributes.get("title").and_then(Value::as_str).unwrap_or_default().to_string(),
      author: editor_name(state).unwrap_or_default(),
    })
  }

  fn save_record(&mut self, record: &mut Article, _state: &mut OperationState) -> anyhow::Result<()> {
    info!(title = %record.title, author = %record.author, "Article stored.");
    Ok(())
  }
}

struct RenameArticle;

impl UpdateOperation for RenameArticle {
  type Record = Article;

  fn whitelist_attributes(&self) -> &'static [&'static str] {
    &["title"]
  }

  fn user_can_update_record(&mut self, record: &Article, state: &mut OperationState) -> bool {
    editor_name(state).as_deref() == Some(record.author.as_str())
  }

  fn update_record(&mut self, record: &mut Article, attributes: Options, _state: &mut OperationState) -> anyhow::Result<()> {
    if let Some(title) = attributes.get("title").and_then(Value::as_str) {
      record.title = title.to_string();
    }
    Ok(())
  }
}

fn main() {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- CRUD Operations Example ---");

  // 3. Process-wide setup: messages, user type and a callback on every operation
  configure(|config| {
    config.set_user_type::<Editor>();
    config.set_translator(
      MessageCatalog::new()
        .with("opkit.errors.articles.cant_create", "You are not allowed to create articles")
        .with("opkit.errors.articles.user_cant_update", "Only the author may rename an article"),
    );
  });
  CallbackRegistry::global().register_callback("Service", "after_success", "announce", |state| {
    info!(operation = state.type_name(), status = state.response_status(), "Operation succeeded.");
  });

  // 4. Anonymous create: refused with 403
  let attributes = options! { "attributes" => serde_json::json!({ "title": "Hello" }) };
  let mut anonymous = Service::new(Create::new(CreateArticle), attributes.clone());
  anonymous.execute();
  info!(status = anonymous.response_status_code(), errors = ?anonymous.errors(), "Anonymous create finished.");

  // 5. Editor create: 201 and the built record
  let mut create = Service::new(Create::new(CreateArticle), attributes).with_user(Editor {
    name: "ada".to_string(),
  });
  create.execute();
  info!(status = create.response_status_code(), "Editor create finished.");

  // 6. Rename by the author, reporting which attributes changed
  let article = create.operation().record().cloned();
  let rename_attributes = options! { "attributes" => serde_json::json!({ "title": "Hello, world" }) };
  let mut rename = Service::new(Update::new(RenameArticle, article), rename_attributes).with_user(Editor {
    name: "ada".to_string(),
  });
  rename.execute();

  let (operation, state) = rename.into_parts();
  info!(
    status = state.response_status_code(),
    changed = ?operation.changed_attributes(&state),
    title = ?operation.record().map(|article| article.title.as_str()),
    "Rename finished."
  );
}
