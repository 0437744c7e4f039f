// opkit/src/core/mod.rs

//! Building blocks shared by the service and crud layers: hook points,
//! status tables, error entries, option maps and name normalization.

pub mod entry;
pub mod hook;
pub mod naming;
pub mod options;
pub mod status;

pub use entry::{ErrorEntry, ErrorPayload, RecordErrors};
pub use hook::Hook;
pub use options::Options;
pub use status::{SharedStatusTable, Status, StatusTable};
