//! Cairn Object
//!
//! The session-side object cache.
//!
//! Responsibilities:
//! - Resolve paths and identifiers to node and property snapshots
//! - Load remote nodes lazily, a configurable number of levels at a time
//! - Apply local mutations to the cached view immediately
//! - Record them in a change log and commit it as one batch

mod changes;
mod error;
mod manager;

pub use changes::ChangeLog;
pub use error::{ObjectError, ObjectResult};
pub use manager::ObjectManager;
