//! Client for stateful execution contexts on a managed compute cluster.
//!
//! Commands (SQL or Scala) are submitted into a per-language remote context
//! held by a [`ContextRegistry`], polled until terminal, and returned as raw
//! JSON rows. See [`Executor::execute`] for the main entry point.

pub mod command;
pub mod config;
pub mod connection;
pub mod context;
pub mod error;
pub mod guard;
pub mod logging;
pub mod metadata;
pub mod poller;
pub mod printer;
pub mod recovery;
pub mod scala;
pub mod transport;

pub use command::{CommandHandle, Executor};
pub use connection::ConnectionInfo;
pub use context::{ContextRegistry, ExecutionContext, Language};
pub use error::{Error, Result};
pub use transport::{HttpResponse, HttpTransport, Transport};
