/// Result type alias for query-building operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for predicate composition, query assembly, and pagination.
///
/// None of these involve I/O. Backend failures (for example a misspelled
/// field name) are reported by the data-access layer that runs the query.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Cursor token is not valid base64, not a JSON object, or does not carry
   /// a scalar value for the cursor field.
   #[error("malformed cursor token: {reason}")]
   MalformedCursorToken { reason: String },

   /// Select and omit projections were both requested.
   #[error("select and omit projections cannot be combined")]
   IncompatibleProjection,

   /// Omit projection could not be resolved because the table columns are unknown.
   #[error("omit projection on '{table}' requires the table's column list")]
   UnresolvedProjection { table: String },

   /// Offset pagination page numbers are 1-based.
   #[error("page number must be 1 or greater, got {0}")]
   InvalidPageNumber(i64),

   /// Page size must be greater than zero.
   #[error("page size must be greater than zero")]
   InvalidPageSize,

   /// Value cannot be bound as a query parameter (e.g. NaN or infinite floats).
   #[error("unsupported parameter value: {0}")]
   UnsupportedValue(String),

   /// Cursor field missing from a fetched row.
   #[error("cursor column '{column}' not found in row")]
   CursorColumnNotFound { column: String },

   /// Base query handed to a pager already carries ORDER BY, LIMIT, or OFFSET.
   #[error("paginated base query must not have its own ORDER BY, LIMIT, or OFFSET")]
   InvalidPaginationQuery,

   /// Sort order string is neither `asc` nor `desc`.
   #[error("invalid sort order '{0}': expected 'asc' or 'desc'")]
   InvalidSortOrder(String),

   /// Cursor token could not be serialized.
   #[error("failed to encode cursor token: {0}")]
   Json(#[from] serde_json::Error),
}

impl Error {
   /// Extract a structured error code from the error type.
   pub fn error_code(&self) -> String {
      match self {
         Error::MalformedCursorToken { .. } => "MALFORMED_CURSOR_TOKEN".to_string(),
         Error::IncompatibleProjection => "INCOMPATIBLE_PROJECTION".to_string(),
         Error::UnresolvedProjection { .. } => "UNRESOLVED_PROJECTION".to_string(),
         Error::InvalidPageNumber(_) => "INVALID_PAGE_NUMBER".to_string(),
         Error::InvalidPageSize => "INVALID_PAGE_SIZE".to_string(),
         Error::UnsupportedValue(_) => "UNSUPPORTED_VALUE".to_string(),
         Error::CursorColumnNotFound { .. } => "CURSOR_COLUMN_NOT_FOUND".to_string(),
         Error::InvalidPaginationQuery => "INVALID_PAGINATION_QUERY".to_string(),
         Error::InvalidSortOrder(_) => "INVALID_SORT_ORDER".to_string(),
         Error::Json(_) => "JSON_ERROR".to_string(),
      }
   }
}
