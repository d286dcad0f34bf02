//! Open-on-demand SQLite connections

use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection as _, Sqlite, Transaction};
use tracing::debug;

use crate::config::ConnectorConfig;
use crate::error::{Error, Result};

/// Factory for SQLite connections, built once from a [`ConnectorConfig`].
///
/// ## Lifecycle
///
/// ```text
/// 1. Connector::new parses the connection string (once)
/// 2. acquire() opens a fresh connection for one call
/// 3. Connection::close() (or drop) releases it
/// ```
///
/// There is no pool and no retry: every [`acquire`](Self::acquire) opens a new
/// connection. The connector itself is immutable and cheap to clone, so it can
/// be shared across tasks.
#[derive(Debug, Clone)]
pub struct Connector {
   options: Arc<SqliteConnectOptions>,
   config: Arc<ConnectorConfig>,
}

impl Connector {
   /// Parse the configured connection string and build a connector.
   pub fn new(config: ConnectorConfig) -> Result<Self> {
      let options = SqliteConnectOptions::from_str(&config.connection_string)
         .map_err(|source| Error::InvalidConnectionString {
            connection_string: config.connection_string.clone(),
            source,
         })?
         .busy_timeout(config.busy_timeout)
         .create_if_missing(config.create_if_missing);

      Ok(Self {
         options: Arc::new(options),
         config: Arc::new(config),
      })
   }

   /// Shorthand for `Connector::new(ConnectorConfig::new(connection_string))`.
   pub fn from_connection_string(connection_string: impl Into<String>) -> Result<Self> {
      Self::new(ConnectorConfig::new(connection_string))
   }

   pub fn config(&self) -> &ConnectorConfig {
      &self.config
   }

   /// Open a new connection, bounded by `connect_timeout`.
   pub async fn acquire(&self) -> Result<Connection> {
      let timeout = self.config.connect_timeout;
      let conn = tokio::time::timeout(timeout, self.options.connect())
         .await
         .map_err(|_| Error::ConnectTimeout(timeout))??;

      let target = self.options.get_filename().display().to_string();
      debug!("Opened connection to {}", target);

      Ok(Connection { conn, target })
   }
}

/// An open SQLite connection owned by a single call.
///
/// Dereferences to [`SqliteConnection`], so it can be used directly as an SQLx
/// executor (`&mut *conn`). Call [`close`](Self::close) to release it and observe
/// any error; dropping it also closes the underlying connection.
#[must_use = "if unused, the connection is immediately closed"]
#[derive(Debug)]
pub struct Connection {
   conn: SqliteConnection,
   target: String,
}

impl Connection {
   /// Database file this connection was opened against.
   pub fn target(&self) -> &str {
      &self.target
   }

   /// Start a transaction owned by the caller.
   ///
   /// The transaction rolls back when dropped without [`Transaction::commit`].
   pub async fn begin(&mut self) -> Result<Transaction<'_, Sqlite>> {
      debug!("Beginning transaction on {}", self.target);
      Ok(self.conn.begin().await?)
   }

   /// Close the connection, surfacing any error from the driver.
   ///
   /// Closing (or dropping) is the only way to abandon work on a connection;
   /// there is no separate cancellation primitive.
   pub async fn close(self) -> Result<()> {
      let target = self.target;
      self.conn.close().await?;
      debug!("Closed connection to {}", target);
      Ok(())
   }
}

impl Deref for Connection {
   type Target = SqliteConnection;

   fn deref(&self) -> &Self::Target {
      &self.conn
   }
}

impl DerefMut for Connection {
   fn deref_mut(&mut self) -> &mut Self::Target {
      &mut self.conn
   }
}
