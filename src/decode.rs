//! SQLite values to JSON, for rows read without a typed shape.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use sqlx::error::BoxDynError;
use sqlx::sqlite::{Sqlite, SqliteRow, SqliteValueRef};
use sqlx::{Column, Decode, Row, TypeInfo, ValueRef};

use crate::error::{Error, Result};
use crate::params::BoundStatement;

/// Convert one SQLite value to JSON by its storage class.
///
/// INTEGER → number, REAL → number (`null` when not finite), TEXT → string,
/// BLOB → base64 string, NULL → `null`.
pub fn to_json(value: SqliteValueRef<'_>) -> Result<JsonValue> {
   if value.is_null() {
      return Ok(JsonValue::Null);
   }

   let type_name = value.type_info().name().to_string();

   let decoded: std::result::Result<JsonValue, BoxDynError> = match type_name.as_str() {
      "INTEGER" | "BOOLEAN" => <i64 as Decode<'_, Sqlite>>::decode(value).map(JsonValue::from),
      "REAL" | "NUMERIC" => <f64 as Decode<'_, Sqlite>>::decode(value)
         .map(|v| serde_json::Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number)),
      "TEXT" | "DATE" | "TIME" | "DATETIME" => {
         <String as Decode<'_, Sqlite>>::decode(value).map(JsonValue::String)
      }
      "BLOB" => <Vec<u8> as Decode<'_, Sqlite>>::decode(value)
         .map(|bytes| JsonValue::String(STANDARD.encode(bytes))),
      _ => return Err(Error::UnsupportedDatatype(type_name.clone())),
   };

   decoded.map_err(|e| Error::UnsupportedDatatype(format!("{type_name}: {e}")))
}

/// Decode every column of a row, keeping column order.
pub(crate) fn row_to_json(row: &SqliteRow, statement: &BoundStatement<'_>) -> Result<IndexMap<String, JsonValue>> {
   let mut value = IndexMap::default();
   for (i, column) in row.columns().iter().enumerate() {
      let raw = row.try_get_raw(i).map_err(|e| statement.data_access(e))?;
      value.insert(column.name().to_string(), to_json(raw)?);
   }
   Ok(value)
}
