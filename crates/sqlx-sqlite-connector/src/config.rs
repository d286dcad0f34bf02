//! Configuration for opening SQLite connections

use std::time::Duration;

use serde::Deserialize;

/// Configuration for a [`Connector`](crate::Connector)
///
/// # Examples
///
/// ```
/// use sqlx_sqlite_connector::ConnectorConfig;
/// use std::time::Duration;
///
/// // Use defaults for everything but the connection string
/// let config = ConnectorConfig::new("sqlite://app.db");
///
/// // Override just one field
/// let config = ConnectorConfig {
///     connect_timeout: Duration::from_secs(3),
///     ..ConnectorConfig::new("sqlite://app.db")
/// };
/// ```
///
/// Deserializes from JSON with durations given in whole seconds:
///
/// ```
/// use sqlx_sqlite_connector::ConnectorConfig;
///
/// let config: ConnectorConfig =
///     serde_json::from_str(r#"{ "connection_string": "sqlite://app.db", "busy_timeout": 1 }"#)
///         .unwrap();
/// assert_eq!(config.busy_timeout.as_secs(), 1);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
   /// SQLx SQLite connection string, e.g. `sqlite://data/app.db` or `sqlite::memory:`
   ///
   /// Note that every connection to `sqlite::memory:` is a distinct, empty database.
   pub connection_string: String,

   /// Upper bound on opening a single connection
   ///
   /// Default: 15 seconds
   #[serde(with = "whole_seconds")]
   pub connect_timeout: Duration,

   /// How long SQLite waits on a locked database before failing a statement
   ///
   /// Default: 5 seconds
   #[serde(with = "whole_seconds")]
   pub busy_timeout: Duration,

   /// Create the database file when it does not exist yet
   ///
   /// Default: true
   pub create_if_missing: bool,
}

impl ConnectorConfig {
   /// Default configuration for the given connection string.
   pub fn new(connection_string: impl Into<String>) -> Self {
      Self {
         connection_string: connection_string.into(),
         ..Default::default()
      }
   }
}

impl Default for ConnectorConfig {
   fn default() -> Self {
      Self {
         connection_string: String::new(),
         connect_timeout: Duration::from_secs(15),
         busy_timeout: Duration::from_secs(5),
         create_if_missing: true,
      }
   }
}

mod whole_seconds {
   use std::time::Duration;

   use serde::{Deserialize, Deserializer};

   pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
      u64::deserialize(deserializer).map(Duration::from_secs)
   }
}
