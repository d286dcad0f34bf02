//! # sqlx-sqlite-connector
//!
//! Connection lifecycle for the SQLite repository: open a connection on demand,
//! close it when the call that needed it is done.
//!
//! ## Core Types
//!
//! - **[`Connector`]**: Immutable, cloneable factory built from a connection string
//! - **[`ConnectorConfig`]**: Connection string and open/busy timeouts
//! - **[`Connection`]**: An open connection owned by one call
//! - **[`Error`]**: Error type for connection operations
//!
//! ## Architecture
//!
//! - **No pooling**: each `acquire()` opens a new connection; reuse is the caller's business
//! - **Scoped release**: `Connection::close()` releases deterministically, drop is the fallback
//! - **Caller-owned transactions**: `Connection::begin()` hands the transaction to the caller,
//!   which commits or rolls back

mod config;
mod connector;
mod error;

// Re-export public types
pub use config::ConnectorConfig;
pub use connector::{Connection, Connector};
pub use error::{Error, Result};
