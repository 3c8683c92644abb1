//! Cairn Session
//!
//! Client-side sessions against a remote content repository.
//!
//! Responsibilities:
//! - Log in to a workspace and keep a registry of live sessions
//! - Resolve paths and identifiers through the object cache
//! - Collect local changes and save them in one transaction
//! - Export subtrees as system view or document view XML
//! - Report unsupported operations with typed errors

mod binary;
mod config;
mod error;
mod export;
mod registry;
mod repository;
mod save;
mod session;
mod workspace;

pub use binary::LazyBinary;
pub use config::{RepositoryConfig, SessionOption};
pub use error::{SessionError, SessionResult};
pub use registry::{SessionContext, SessionKey, SessionRegistry};
pub use repository::Repository;
pub use save::SaveOutcome;
pub use session::{AccessControlManager, ImportUuidBehavior, Lookup, RetentionManager, Session};
pub use workspace::Workspace;
