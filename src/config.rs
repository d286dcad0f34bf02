//! Named connection strings.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use sqlx_sqlite_connector::{Connector, ConnectorConfig};

use crate::error::{Error, Result};

/// Name used when a repository is built without naming a connection.
pub const DEFAULT_CONNECTION_NAME: &str = "DefaultDB";

/// Key of the connection string section in an application settings document.
const SECTION: &str = "ConnectionStrings";

/// Connection strings by name, in the order they were configured.
///
/// Each entry is either a plain connection string or a full
/// [`ConnectorConfig`] object:
///
/// ```
/// use sqlx_sqlite_repository::ConnectionStrings;
///
/// let strings = ConnectionStrings::from_json(r#"{
///    "DefaultDB": "sqlite://data/app.db",
///    "Reporting": { "connection_string": "sqlite://data/reports.db", "busy_timeout": 30 }
/// }"#)
/// .unwrap();
///
/// assert_eq!(strings.get("DefaultDB"), Some("sqlite://data/app.db"));
/// assert_eq!(strings.config("Reporting").unwrap().busy_timeout.as_secs(), 30);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ConnectionStrings {
   entries: IndexMap<String, ConnectionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ConnectionEntry {
   Plain(String),
   Detailed(ConnectorConfig),
}

impl ConnectionStrings {
   pub fn new() -> Self {
      Self::default()
   }

   /// Parse a JSON object of name → entry.
   ///
   /// A settings document whose top-level object has a `ConnectionStrings`
   /// section is accepted too; only that section is read.
   pub fn from_json(json: &str) -> Result<Self> {
      let mut value: JsonValue = serde_json::from_str(json)?;
      if let Some(section) = value.get_mut(SECTION) {
         value = section.take();
      }
      Ok(serde_json::from_value(value)?)
   }

   /// Add or replace a plain connection string.
   pub fn insert(&mut self, name: impl Into<String>, connection_string: impl Into<String>) {
      self
         .entries
         .insert(name.into(), ConnectionEntry::Plain(connection_string.into()));
   }

   /// Builder-style [`insert`](Self::insert).
   pub fn with(mut self, name: impl Into<String>, connection_string: impl Into<String>) -> Self {
      self.insert(name, connection_string);
      self
   }

   /// The connection string configured under `name`.
   pub fn get(&self, name: &str) -> Option<&str> {
      self.entries.get(name).map(|entry| match entry {
         ConnectionEntry::Plain(s) => s.as_str(),
         ConnectionEntry::Detailed(config) => config.connection_string.as_str(),
      })
   }

   /// Connector settings for `name`; plain strings get default timeouts.
   pub fn config(&self, name: &str) -> Result<ConnectorConfig> {
      match self.entries.get(name) {
         Some(ConnectionEntry::Plain(s)) => Ok(ConnectorConfig::new(s.clone())),
         Some(ConnectionEntry::Detailed(config)) => Ok(config.clone()),
         None => Err(Error::UnknownConnectionString(name.to_string())),
      }
   }

   /// Build a connector for the entry named `name`.
   pub fn connector(&self, name: &str) -> Result<Connector> {
      Ok(Connector::new(self.config(name)?)?)
   }

   /// Build a connector for [`DEFAULT_CONNECTION_NAME`].
   pub fn default_connector(&self) -> Result<Connector> {
      self.connector(DEFAULT_CONNECTION_NAME)
   }
}
