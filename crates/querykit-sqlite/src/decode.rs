//! Conversions between SQLite values, bound parameters, and JSON rows.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use indexmap::IndexMap;
use querykit_core::Value;
use serde_json::Value as JsonValue;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow, SqliteValueRef};
use sqlx::{Column, Row as _, Sqlite, TypeInfo, Value as _, ValueRef};

use crate::{Error, Result};

/// A decoded row, keyed by column name in result-column order.
pub type Row = IndexMap<String, JsonValue>;

/// Bind one parameter value to a query.
pub(crate) fn bind_value<'q>(
   query: Query<'q, Sqlite, SqliteArguments<'q>>,
   value: Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
   match value {
      Value::Bool(b) => query.bind(b),
      Value::Int(i) => query.bind(i),
      Value::Float(f) => query.bind(f),
      Value::Text(s) => query.bind(s),
   }
}

/// Bind every parameter in placeholder order.
pub(crate) fn bind_all<'q>(
   sql: &'q str,
   values: Vec<Value>,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
   values
      .into_iter()
      .fold(sqlx::query(sql), |q, value| bind_value(q, value))
}

/// Map one SQLite value to JSON.
///
/// BLOBs become standard base64 strings. Dates and times are returned as the
/// text SQLite stores them as.
pub(crate) fn to_json(value: SqliteValueRef<'_>) -> Result<JsonValue> {
   if value.is_null() {
      return Ok(JsonValue::Null);
   }

   let owned = ValueRef::to_owned(&value);
   let type_name = value.type_info().name().to_string();
   let json = match type_name.as_str() {
      "TEXT" | "DATE" | "TIME" | "DATETIME" => JsonValue::String(owned.try_decode::<String>()?),
      "REAL" => JsonValue::from(owned.try_decode::<f64>()?),
      "INTEGER" => JsonValue::from(owned.try_decode::<i64>()?),
      "BOOLEAN" | "NUMERIC" => match owned.try_decode_unchecked::<i64>() {
         Ok(i) => JsonValue::from(i),
         Err(_) => JsonValue::from(owned.try_decode_unchecked::<f64>()?),
      },
      "BLOB" => JsonValue::String(STANDARD.encode(owned.try_decode::<Vec<u8>>()?)),
      "NULL" => JsonValue::Null,
      _ => return Err(Error::UnsupportedDatatype(type_name)),
   };
   Ok(json)
}

/// Decode SQLite rows to JSON maps, preserving column order.
pub(crate) fn decode_rows(rows: Vec<SqliteRow>) -> Result<Vec<Row>> {
   let mut decoded = Vec::with_capacity(rows.len());
   for row in rows {
      let mut map = Row::with_capacity(row.len());
      for (i, column) in row.columns().iter().enumerate() {
         let v = row.try_get_raw(i)?;
         map.insert(column.name().to_string(), to_json(v)?);
      }
      decoded.push(map);
   }
   Ok(decoded)
}
