// opkit/src/core/hook.rs

//! The fixed set of lifecycle points every operation exposes.

/// A lifecycle point. Each one fires as a `before_<name>` / `after_<name>` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
  Initialize,
  Execute,
  Success,
  Error,
  Action,
  Create,
  Update,
  Delete,
  BuildRecord,
  UpdateRecord,
  DeleteRecord,
  ExecuteServiceAction,
}

impl Hook {
  pub const ALL: [Hook; 12] = [
    Hook::Initialize,
    Hook::Execute,
    Hook::Success,
    Hook::Error,
    Hook::Action,
    Hook::Create,
    Hook::Update,
    Hook::Delete,
    Hook::BuildRecord,
    Hook::UpdateRecord,
    Hook::DeleteRecord,
    Hook::ExecuteServiceAction,
  ];

  pub fn basename(self) -> &'static str {
    match self {
      Hook::Initialize => "initialize",
      Hook::Execute => "execute",
      Hook::Success => "success",
      Hook::Error => "error",
      Hook::Action => "action",
      Hook::Create => "create",
      Hook::Update => "update",
      Hook::Delete => "delete",
      Hook::BuildRecord => "build_record",
      Hook::UpdateRecord => "update_record",
      Hook::DeleteRecord => "delete_record",
      Hook::ExecuteServiceAction => "execute_service_action",
    }
  }

  pub fn before(self) -> &'static str {
    match self {
      Hook::Initialize => "before_initialize",
      Hook::Execute => "before_execute",
      Hook::Success => "before_success",
      Hook::Error => "before_error",
      Hook::Action => "before_action",
      Hook::Create => "before_create",
      Hook::Update => "before_update",
      Hook::Delete => "before_delete",
      Hook::BuildRecord => "before_build_record",
      Hook::UpdateRecord => "before_update_record",
      Hook::DeleteRecord => "before_delete_record",
      Hook::ExecuteServiceAction => "before_execute_service_action",
    }
  }

  pub fn after(self) -> &'static str {
    match self {
      Hook::Initialize => "after_initialize",
      Hook::Execute => "after_execute",
      Hook::Success => "after_success",
      Hook::Error => "after_error",
      Hook::Action => "after_action",
      Hook::Create => "after_create",
      Hook::Update => "after_update",
      Hook::Delete => "after_delete",
      Hook::BuildRecord => "after_build_record",
      Hook::UpdateRecord => "after_update_record",
      Hook::DeleteRecord => "after_delete_record",
      Hook::ExecuteServiceAction => "after_execute_service_action",
    }
  }
}

impl AsRef<str> for Hook {
  fn as_ref(&self) -> &str {
    self.basename()
  }
}

/// Every `before_*` / `after_*` hook point name, in declaration order.
pub fn default_hook_points() -> impl Iterator<Item = &'static str> {
  Hook::ALL.into_iter().flat_map(|hook| [hook.before(), hook.after()])
}
