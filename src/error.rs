use serde::{Serialize, ser::Serializer};

/// Result type alias for list operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the list facade.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Invalid request parameters, token, or query description.
   #[error(transparent)]
   Query(#[from] querykit_core::Error),

   /// Failure while running the query.
   #[error(transparent)]
   Database(#[from] querykit_sqlite::Error),
}

impl Error {
   /// Extract a structured error code from the error type.
   pub fn error_code(&self) -> String {
      match self {
         Error::Query(e) => e.error_code(),
         Error::Database(e) => e.error_code(),
      }
   }

   /// Whether the error was caused by the request rather than the backend.
   ///
   /// Only bad paging parameters count: a malformed cursor, a page number
   /// below 1, a zero page size, or an unknown sort order. Backend failures,
   /// unknown field names, and invalid query descriptions are internal errors.
   pub fn is_client_error(&self) -> bool {
      match self {
         Error::Query(e) | Error::Database(querykit_sqlite::Error::Query(e)) => {
            is_request_fault(e)
         }
         Error::Database(_) => false,
      }
   }
}

fn is_request_fault(err: &querykit_core::Error) -> bool {
   use querykit_core::Error as E;

   matches!(
      err,
      E::MalformedCursorToken { .. }
         | E::InvalidPageNumber(_)
         | E::InvalidPageSize
         | E::InvalidSortOrder(_)
   )
}

/// Error response body: `{"code": …, "message": …}`.
#[derive(Serialize)]
struct ErrorResponse {
   code: String,
   message: String,
}

impl Serialize for Error {
   fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
   where
      S: Serializer,
   {
      ErrorResponse {
         code: self.error_code(),
         message: self.to_string(),
      }
      .serialize(serializer)
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_error_code_passthrough() {
      let err = Error::from(querykit_core::Error::InvalidPageSize);
      assert_eq!(err.error_code(), "INVALID_PAGE_SIZE");
      assert!(err.is_client_error());

      let err = Error::from(querykit_sqlite::Error::DatabaseClosed);
      assert_eq!(err.error_code(), "DATABASE_CLOSED");
      assert!(!err.is_client_error());
   }

   #[test]
   fn test_only_paging_parameter_faults_are_client_errors() {
      let client = [
         querykit_core::Error::MalformedCursorToken {
            reason: "invalid base64".into(),
         },
         querykit_core::Error::InvalidPageNumber(0),
         querykit_core::Error::InvalidSortOrder("sideways".into()),
      ];
      for err in client {
         assert!(Error::from(err).is_client_error());
      }
      let wrapped = querykit_sqlite::Error::from(querykit_core::Error::InvalidPageNumber(-1));
      assert!(Error::from(wrapped).is_client_error());

      let internal = [
         querykit_core::Error::CursorColumnNotFound {
            column: "id".into(),
         },
         querykit_core::Error::IncompatibleProjection,
         querykit_core::Error::UnresolvedProjection {
            table: "products".into(),
         },
         querykit_core::Error::InvalidPaginationQuery,
      ];
      for err in internal {
         assert!(!Error::from(err).is_client_error());
      }
      let wrapped = querykit_sqlite::Error::from(querykit_core::Error::CursorColumnNotFound {
         column: "id".into(),
      });
      assert!(!Error::from(wrapped).is_client_error());
   }

   #[test]
   fn test_error_serializes_code_and_message() {
      let err = Error::from(querykit_core::Error::MalformedCursorToken {
         reason: "invalid base64".into(),
      });
      let json = serde_json::to_value(&err).unwrap();
      assert_eq!(json["code"], "MALFORMED_CURSOR_TOKEN");
      assert_eq!(json["message"], "malformed cursor token: invalid base64");
   }
}
