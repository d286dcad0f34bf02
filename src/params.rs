//! Named statement parameters and their binding.
//!
//! Statements use named placeholders, `:name` or `@name`. A placeholder is
//! found by scanning the statement outside literals and comments, and its
//! value is looked up in [`Params`] by the bare name (without the prefix).
//!
//! The SQLite driver only binds numbered parameters, so before execution each
//! distinct placeholder is rewritten to `?N`, numbered in order of first
//! appearance. A repeated placeholder reuses its number and its value is bound
//! once. Errors still report the statement as written.

use std::ops::Range;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use sqlx::sqlite::SqliteArguments;
use sqlx::Arguments;
use sqlx_sqlite_pager::scan::{is_identifier_byte, scan};
use time::{Date, OffsetDateTime};

use crate::error::{Error, Result};

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
   Null,
   Text(String),
   Integer(i64),
   Real(f64),
   Bool(bool),
   DateTime(OffsetDateTime),
   Date(Date),
}

impl SqlValue {
   pub fn is_null(&self) -> bool {
      matches!(self, SqlValue::Null)
   }

   fn add_to<'q>(&self, args: &mut SqliteArguments<'q>) -> std::result::Result<(), sqlx::error::BoxDynError> {
      match self {
         SqlValue::Null => args.add(None::<String>),
         SqlValue::Text(v) => args.add(v.clone()),
         SqlValue::Integer(v) => args.add(*v),
         SqlValue::Real(v) => args.add(*v),
         SqlValue::Bool(v) => args.add(*v),
         SqlValue::DateTime(v) => args.add(*v),
         SqlValue::Date(v) => args.add(*v),
      }
   }
}

macro_rules! impl_from_for_sql_value {
   ($($ty:ty => $variant:ident),* $(,)?) => {
      $(
         impl From<$ty> for SqlValue {
            fn from(value: $ty) -> Self {
               SqlValue::$variant(value.into())
            }
         }
      )*
   };
}

impl_from_for_sql_value! {
   String => Text,
   &str => Text,
   i64 => Integer,
   i32 => Integer,
   i16 => Integer,
   u32 => Integer,
   u8 => Integer,
   f64 => Real,
   f32 => Real,
   bool => Bool,
   OffsetDateTime => DateTime,
   Date => Date,
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
   fn from(value: Option<T>) -> Self {
      value.map_or(SqlValue::Null, Into::into)
   }
}

/// Request-level JSON at the boundary. Arrays and objects have no column
/// representation and are rejected.
impl TryFrom<JsonValue> for SqlValue {
   type Error = Error;

   fn try_from(value: JsonValue) -> Result<Self> {
      match value {
         JsonValue::Null => Ok(SqlValue::Null),
         JsonValue::Bool(b) => Ok(SqlValue::Bool(b)),
         JsonValue::String(s) => Ok(SqlValue::Text(s)),
         JsonValue::Number(number) => {
            // Preserve integer precision by binding as i64 when possible
            if let Some(int_val) = number.as_i64() {
               Ok(SqlValue::Integer(int_val))
            } else if let Some(float_val) = number.as_f64() {
               Ok(SqlValue::Real(float_val))
            } else {
               Err(Error::UnsupportedParameter(number.to_string()))
            }
         }
         other @ (JsonValue::Array(_) | JsonValue::Object(_)) => {
            Err(Error::UnsupportedParameter(other.to_string()))
         }
      }
   }
}

/// Ordered parameter name → value mapping.
///
/// ```
/// use sqlx_sqlite_repository::Params;
///
/// let params = Params::new().with("category", "tech").with("min_score", 80);
/// assert_eq!(params.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(IndexMap<String, SqlValue>);

impl Params {
   pub fn new() -> Self {
      Self::default()
   }

   /// Builder-style [`insert`](Self::insert).
   pub fn with(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
      self.insert(name, value);
      self
   }

   /// Set a value, replacing any previous value under the same name.
   pub fn insert(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
      self.0.insert(name.into(), value.into());
   }

   pub fn get(&self, name: &str) -> Option<&SqlValue> {
      self.0.get(name)
   }

   /// Look up a name ignoring ASCII case, returning the stored name too.
   pub fn find_ignore_case(&self, name: &str) -> Option<(&str, &SqlValue)> {
      self
         .0
         .iter()
         .find(|(k, _)| k.eq_ignore_ascii_case(name))
         .map(|(k, v)| (k.as_str(), v))
   }

   pub fn len(&self) -> usize {
      self.0.len()
   }

   pub fn is_empty(&self) -> bool {
      self.0.is_empty()
   }

   pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
      self.0.iter().map(|(k, v)| (k.as_str(), v))
   }

   /// Build parameters from a JSON object, as received at a request boundary.
   pub fn from_json(value: JsonValue) -> Result<Self> {
      match value {
         JsonValue::Object(map) => map
            .into_iter()
            .map(|(k, v)| Ok((k, SqlValue::try_from(v)?)))
            .collect(),
         JsonValue::Null => Ok(Self::new()),
         other => Err(Error::UnsupportedParameter(other.to_string())),
      }
   }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for Params {
   fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
      Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
   }
}

/// Byte ranges of every named placeholder occurrence in `sql`.
fn placeholder_spans(sql: &str) -> Vec<Range<usize>> {
   let mut spans = Vec::new();

   scan::<()>(sql, |bytes, i, _depth| {
      let prefix = bytes[i];
      if prefix != b':' && prefix != b'@' {
         return None;
      }
      if i > 0 && (is_identifier_byte(bytes[i - 1]) || bytes[i - 1] == b':') {
         return None;
      }

      let mut end = i + 1;
      while end < bytes.len() && is_identifier_byte(bytes[end]) {
         end += 1;
      }
      if end > i + 1 {
         spans.push(i..end);
      }
      None
   });

   spans
}

/// Distinct named placeholders in `sql`, in order of first appearance.
///
/// Each entry is the full token including its prefix (`:id`, `@id`). SQLite
/// treats `:id` and `@id` as different parameters, so both are kept.
pub fn placeholders(sql: &str) -> Vec<&str> {
   let mut found: Vec<&str> = Vec::new();
   for span in placeholder_spans(sql) {
      let token = &sql[span];
      if !found.contains(&token) {
         found.push(token);
      }
   }
   found
}

/// A statement paired with the parameters it will be bound with.
///
/// Construction checks that every placeholder has a value, so binding later
/// cannot miss one, and produces the numbered text the driver executes.
#[derive(Debug)]
pub struct BoundStatement<'a> {
   sql: &'a str,
   numbered: String,
   names: Vec<&'a str>,
   params: &'a Params,
}

impl<'a> BoundStatement<'a> {
   pub fn new(sql: &'a str, params: &'a Params) -> Result<Self> {
      let mut tokens: Vec<&'a str> = Vec::new();
      let mut names = Vec::new();
      let mut numbered = String::with_capacity(sql.len());
      let mut copied = 0;

      for span in placeholder_spans(sql) {
         let token = &sql[span.clone()];
         let index = match tokens.iter().position(|t| *t == token) {
            Some(index) => index,
            None => {
               let name = &token[1..];
               if params.get(name).is_none() {
                  return Err(Error::MissingParameter {
                     name: name.to_string(),
                     statement: sql.to_string(),
                  });
               }
               tokens.push(token);
               names.push(name);
               tokens.len() - 1
            }
         };

         numbered.push_str(&sql[copied..span.start]);
         numbered.push_str(&format!("?{}", index + 1));
         copied = span.end;
      }
      numbered.push_str(&sql[copied..]);

      Ok(Self {
         sql,
         numbered,
         names,
         params,
      })
   }

   /// The statement as written.
   pub fn sql(&self) -> &'a str {
      self.sql
   }

   /// The statement with placeholders rewritten to `?N`, as executed.
   pub fn numbered_sql(&self) -> &str {
      &self.numbered
   }

   pub fn params(&self) -> &'a Params {
      self.params
   }

   /// Positional SQLx arguments, one per distinct placeholder, in the order
   /// of their numbers.
   pub fn arguments(&self) -> std::result::Result<SqliteArguments<'a>, sqlx::Error> {
      let mut args = SqliteArguments::default();
      for name in &self.names {
         if let Some(value) = self.params.get(name) {
            value.add_to(&mut args).map_err(sqlx::Error::Encode)?;
         }
      }
      Ok(args)
   }

   /// Wrap a driver error with this statement and its parameters.
   pub fn data_access(&self, source: sqlx::Error) -> Error {
      Error::DataAccess {
         statement: self.sql.to_string(),
         params: self.params.clone(),
         source,
      }
   }
}
