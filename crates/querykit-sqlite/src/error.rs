/// Result type alias for SQLite data-access operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for running query descriptions against SQLite.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error from SQLx operations, including SQL errors caused by unknown
   /// field names in a predicate or order term.
   #[error(transparent)]
   Sqlx(#[from] sqlx::Error),

   /// Error while assembling or paginating the query description.
   #[error(transparent)]
   Query(#[from] querykit_core::Error),

   /// I/O error when accessing database files.
   #[error("io error: {0}")]
   Io(#[from] std::io::Error),

   /// Database has been closed and cannot be used.
   #[error("database has been closed")]
   DatabaseClosed,

   /// SQLite type that cannot be mapped to JSON.
   #[error("unsupported datatype: {0}")]
   UnsupportedDatatype(String),

   /// `PRAGMA table_info` returned no columns.
   #[error("table not found: {0}")]
   TableNotFound(String),

   /// A preload's local key is missing from the parent rows.
   #[error("preload key column '{column}' not found in parent rows")]
   PreloadKeyNotFound { column: String },
}

impl Error {
   /// Extract a structured error code from the error type.
   ///
   /// Query errors keep the code of the underlying query-building error.
   pub fn error_code(&self) -> String {
      match self {
         Error::Sqlx(e) => {
            if let Some(code) = e.as_database_error().and_then(|db_err| db_err.code()) {
               return format!("SQLITE_{}", code);
            }
            "SQLX_ERROR".to_string()
         }
         Error::Query(e) => e.error_code(),
         Error::Io(_) => "IO_ERROR".to_string(),
         Error::DatabaseClosed => "DATABASE_CLOSED".to_string(),
         Error::UnsupportedDatatype(_) => "UNSUPPORTED_DATATYPE".to_string(),
         Error::TableNotFound(_) => "TABLE_NOT_FOUND".to_string(),
         Error::PreloadKeyNotFound { .. } => "PRELOAD_KEY_NOT_FOUND".to_string(),
      }
   }
}
