//! Cairn Transport
//!
//! The seam between a session and the remote repository.
//!
//! Responsibilities:
//! - Define the `Transport` contract consumed by the object and transaction managers
//! - Define the wire types exchanged over it (node data, change batches)
//! - Carry login credentials
//! - Provide `MemoryTransport`, an in-process repository backend

mod credentials;
mod error;
mod memory;
mod transport;
mod wire;

pub use credentials::Credentials;
pub use error::{TransportError, TransportResult};
pub use memory::{MemoryTransport, MemoryTransportBuilder, TransportStats, Tree};
pub use transport::{LoginId, Transport};
pub use wire::{ChangeBatch, NodeData, Operation};
