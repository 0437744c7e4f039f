// opkit/src/service/mod.rs

//! Defines the operation instance: its outcome state, the callback
//! dispatcher, the named error reporters and the `execute` lifecycle.

pub mod hooks;
pub mod lifecycle;
pub mod reporters;
pub mod state;

pub use lifecycle::{Operation, Service, BASE_SERVICE};
pub use state::{OperationState, Phase};
