//! Schema introspection for resolving omit projections.

use sqlx::{Pool, Row, Sqlite};
use tracing::trace;

use crate::{Error, Result};

/// Column names of `table_name` in declaration order.
///
/// Fails with [`Error::TableNotFound`] when `PRAGMA table_info` returns no
/// rows.
pub async fn table_columns(pool: &Pool<Sqlite>, table_name: &str) -> Result<Vec<String>> {
   // PRAGMA table_info returns: cid, name, type, notnull, dflt_value, pk
   let pragma = format!("PRAGMA table_info({})", quote_identifier(table_name));

   let rows = sqlx::query(&pragma).fetch_all(pool).await?;
   if rows.is_empty() {
      return Err(Error::TableNotFound(table_name.to_string()));
   }

   let mut columns: Vec<(i64, String)> = Vec::with_capacity(rows.len());
   for row in &rows {
      columns.push((row.try_get("cid")?, row.try_get("name")?));
   }
   columns.sort_by_key(|(cid, _)| *cid);

   trace!(table = table_name, count = columns.len(), "Resolved table columns");
   Ok(columns.into_iter().map(|(_, name)| name).collect())
}

/// Quotes a SQLite identifier to prevent SQL injection.
fn quote_identifier(name: &str) -> String {
   // Double any existing double quotes and wrap in double quotes
   format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_quote_identifier() {
      assert_eq!(quote_identifier("products"), "\"products\"");
      assert_eq!(quote_identifier("my table"), "\"my table\"");
      assert_eq!(quote_identifier("foo\"bar"), "\"foo\"\"bar\"");
   }
}
