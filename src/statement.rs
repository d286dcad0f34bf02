//! SQL text for entity CRUD.
//!
//! Table and column names come from [`Entity`](crate::Entity) implementations,
//! not from callers at runtime, but they are still validated and quoted before
//! being interpolated. Values are never interpolated; each column is bound
//! through a `:column` placeholder.

use crate::error::{Error, Result};
use crate::params::{Params, SqlValue};

/// Parameter name used for the key in [`select_by_key`].
pub(crate) const KEY_PARAM: &str = "id";

/// Validate that a table or column name is safe for SQL interpolation.
///
/// Accepts names matching `[a-zA-Z_][a-zA-Z0-9_]*`. The same name doubles as a
/// placeholder name, which is why qualified names (`table.column`) are not
/// accepted here.
pub(crate) fn validate_column_name(name: &str) -> Result<()> {
   let mut chars = name.chars();
   let valid = match chars.next() {
      Some(first) => {
         (first.is_ascii_alphabetic() || first == '_')
            && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
      }
      None => false,
   };

   if valid {
      Ok(())
   } else {
      Err(Error::InvalidColumnName {
         name: name.to_string(),
      })
   }
}

/// Quote a name with double-quote identifiers.
///
/// Any embedded double quotes are doubled per SQL standard (`"` → `""`).
pub(crate) fn quote_identifier(name: &str) -> String {
   format!("\"{}\"", name.replace('"', "\"\""))
}

/// `SELECT * FROM "<table>" WHERE "<key>" = :id`
pub(crate) fn select_by_key(table: &str, key: &str) -> Result<String> {
   validate_column_name(table)?;
   validate_column_name(key)?;

   Ok(format!(
      "SELECT * FROM {} WHERE {} = :{KEY_PARAM}",
      quote_identifier(table),
      quote_identifier(key)
   ))
}

/// `INSERT INTO "<table>" ("a", "b") VALUES (:a, :b)`
///
/// The key column must be present in `params`. When its value is null it is
/// left out so the store generates it.
pub(crate) fn insert(table: &str, key: &str, params: &Params) -> Result<String> {
   validate_column_name(table)?;
   let (_, key_value) = require_key(table, key, params)?;
   let skip_key = key_value.is_null();

   let mut columns = Vec::with_capacity(params.len());
   let mut values = Vec::with_capacity(params.len());
   for (column, _) in params.iter() {
      if skip_key && column.eq_ignore_ascii_case(key) {
         continue;
      }
      validate_column_name(column)?;
      columns.push(quote_identifier(column));
      values.push(format!(":{column}"));
   }

   if columns.is_empty() {
      return Ok(format!("INSERT INTO {} DEFAULT VALUES", quote_identifier(table)));
   }

   Ok(format!(
      "INSERT INTO {} ({}) VALUES ({})",
      quote_identifier(table),
      columns.join(", "),
      values.join(", ")
   ))
}

/// `UPDATE "<table>" SET "a" = :a, "b" = :b WHERE "<key>" = :<key>`
pub(crate) fn update(table: &str, key: &str, params: &Params) -> Result<String> {
   validate_column_name(table)?;
   let key_name = require_non_null_key(table, key, params)?;

   let mut assignments = Vec::with_capacity(params.len());
   for (column, _) in params.iter() {
      if column == key_name {
         continue;
      }
      validate_column_name(column)?;
      assignments.push(format!("{} = :{column}", quote_identifier(column)));
   }

   if assignments.is_empty() {
      return Err(Error::InvalidEntity {
         entity: table.to_string(),
         reason: "no columns to update besides the key".into(),
      });
   }

   Ok(format!(
      "UPDATE {} SET {} WHERE {} = :{key_name}",
      quote_identifier(table),
      assignments.join(", "),
      quote_identifier(key_name)
   ))
}

/// `DELETE FROM "<table>" WHERE "<key>" = :<key>`
pub(crate) fn delete(table: &str, key: &str, params: &Params) -> Result<String> {
   validate_column_name(table)?;
   let key_name = require_non_null_key(table, key, params)?;

   Ok(format!(
      "DELETE FROM {} WHERE {} = :{key_name}",
      quote_identifier(table),
      quote_identifier(key_name)
   ))
}

/// Find the key column in `params` ignoring case, as SQLite resolves column names.
fn require_key<'p>(table: &str, key: &str, params: &'p Params) -> Result<(&'p str, &'p SqlValue)> {
   validate_column_name(key)?;
   params.find_ignore_case(key).ok_or_else(|| Error::InvalidEntity {
      entity: table.to_string(),
      reason: format!("key column '{key}' is missing"),
   })
}

fn require_non_null_key<'p>(table: &str, key: &str, params: &'p Params) -> Result<&'p str> {
   let (name, value) = require_key(table, key, params)?;
   if value.is_null() {
      return Err(Error::InvalidEntity {
         entity: table.to_string(),
         reason: format!("key column '{key}' is null"),
      });
   }
   validate_column_name(name)?;
   Ok(name)
}
