//! Error types for sqlx-sqlite-connector

use std::time::Duration;

use thiserror::Error;

/// Errors that may occur while opening or closing connections
#[derive(Error, Debug)]
pub enum Error {
   /// Error from the sqlx library. Standard sqlx errors are converted to this variant
   #[error("Sqlx error: {0}")]
   Sqlx(#[from] sqlx::Error),

   /// The configured connection string could not be parsed
   #[error("Invalid connection string '{connection_string}': {source}")]
   InvalidConnectionString {
      connection_string: String,
      #[source]
      source: sqlx::Error,
   },

   /// Opening a connection took longer than the configured connect timeout
   #[error("Timed out after {0:?} opening connection")]
   ConnectTimeout(Duration),
}

/// A type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
