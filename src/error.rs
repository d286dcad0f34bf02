use std::time::Duration;

use crate::params::Params;

/// Result type alias for repository operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for repository operations.
///
/// Nothing here is retried or swallowed; every failure reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Opening or closing a connection failed.
   #[error(transparent)]
   Connection(#[from] sqlx_sqlite_connector::Error),

   /// The SELECT could not be rewritten into page and count statements.
   #[error(transparent)]
   Rewrite(#[from] sqlx_sqlite_pager::Error),

   /// The store rejected a statement or a row could not be mapped.
   ///
   /// Carries the statement text and the parameters it was bound with.
   #[error("{source} (statement: {statement})")]
   DataAccess {
      statement: String,
      params: Params,
      #[source]
      source: sqlx::Error,
   },

   /// A named placeholder in the statement has no value in the parameters.
   #[error("no value for parameter '{name}' in statement: {statement}")]
   MissingParameter { name: String, statement: String },

   /// A value that cannot be bound as a statement parameter.
   #[error("unsupported parameter value: {0}")]
   UnsupportedParameter(String),

   /// An entity cannot be turned into an INSERT, UPDATE or DELETE.
   #[error("invalid entity for table '{entity}': {reason}")]
   InvalidEntity { entity: String, reason: String },

   /// Table or column name contains invalid characters.
   ///
   /// Names must match `[a-zA-Z_][a-zA-Z0-9_]*`.
   #[error("invalid column name '{name}': must match [a-zA-Z_][a-zA-Z0-9_]*")]
   InvalidColumnName { name: String },

   /// Single-row query returned more than one row.
   #[error("single-row query returned {0} or more rows, expected 0 or 1")]
   MultipleRowsReturned(usize),

   /// SQLite value that cannot be mapped to JSON.
   #[error("unsupported datatype: {0}")]
   UnsupportedDatatype(String),

   /// A statement ran longer than the repository's command timeout.
   #[error("statement timed out after {after:?}: {statement}")]
   Timeout { statement: String, after: Duration },

   /// No connection string is configured under this name.
   #[error("no connection string named '{0}'")]
   UnknownConnectionString(String),

   /// Connection string configuration could not be read.
   #[error("invalid connection string configuration: {0}")]
   Config(#[from] serde_json::Error),
}

impl Error {
   /// Extract a structured error code from the error type.
   ///
   /// This provides machine-readable error codes for the application
   /// boundary to translate.
   pub fn error_code(&self) -> String {
      match self {
         Error::Connection(sqlx_sqlite_connector::Error::ConnectTimeout(_)) => {
            "CONNECT_TIMEOUT".to_string()
         }
         Error::Connection(_) => "CONNECTION_ERROR".to_string(),
         Error::Rewrite(e) => e.error_code(),
         Error::DataAccess { source, .. } => {
            if let Some(code) = source.as_database_error().and_then(|db_err| db_err.code()) {
               return format!("SQLITE_{}", code);
            }
            "DATA_ACCESS_ERROR".to_string()
         }
         Error::MissingParameter { .. } => "MISSING_PARAMETER".to_string(),
         Error::UnsupportedParameter(_) => "UNSUPPORTED_PARAMETER".to_string(),
         Error::InvalidEntity { .. } => "INVALID_ENTITY".to_string(),
         Error::InvalidColumnName { .. } => "INVALID_COLUMN_NAME".to_string(),
         Error::MultipleRowsReturned(_) => "MULTIPLE_ROWS_RETURNED".to_string(),
         Error::UnsupportedDatatype(_) => "UNSUPPORTED_DATATYPE".to_string(),
         Error::Timeout { .. } => "TIMEOUT".to_string(),
         Error::UnknownConnectionString(_) => "UNKNOWN_CONNECTION_STRING".to_string(),
         Error::Config(_) => "CONFIG_ERROR".to_string(),
      }
   }
}
