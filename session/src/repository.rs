//! Repository handle.

use std::fmt;
use std::sync::Arc;

use cairn_transport::{Credentials, Transport};

use crate::{RepositoryConfig, Session, SessionRegistry, SessionResult};

/// Entry point: a remote repository reached through a transport.
///
/// Cloning is cheap; clones share the transport, the configuration and the
/// registry of live sessions.
#[derive(Clone)]
pub struct Repository {
    transport: Arc<dyn Transport>,
    config: Arc<RepositoryConfig>,
    sessions: Arc<SessionRegistry>,
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("config", &self.config)
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Create a repository with the default configuration.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, RepositoryConfig::default())
    }

    pub fn with_config(transport: Arc<dyn Transport>, config: RepositoryConfig) -> Self {
        Self {
            transport,
            config: Arc::new(config),
            sessions: Arc::new(SessionRegistry::new()),
        }
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// The registry of live sessions.
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    #[doc(hidden)]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Log in to `workspace`, or to the configured default workspace.
    pub fn login(&self, credentials: Credentials, workspace: Option<&str>) -> SessionResult<Session> {
        let workspace = workspace.unwrap_or(&self.config.default_workspace);
        Session::new(self, workspace, credentials, self.transport.clone())
    }
}
