/// Result type alias for rewrite operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for statement rewriting.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// The statement has no `FROM` outside parentheses, so it cannot be split
   /// into a select-list and a source.
   #[error("no top-level FROM clause found in statement: {sql}")]
   UnbalancedFrom { sql: String },
}

impl Error {
   /// Extract a structured error code from the error type.
   pub fn error_code(&self) -> String {
      match self {
         Error::UnbalancedFrom { .. } => "UNBALANCED_FROM".to_string(),
      }
   }
}
