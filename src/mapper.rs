//! Turning result rows into caller types.
//!
//! [`RowMapper`] is the seam between fetching rows and shaping them. Most
//! calls use [`EntityRows`], which maps each row through [`sqlx::FromRow`].
//! Joined statements use [`Join2`] or [`Join3`]: the row is cut into
//! contiguous column segments at caller-named split columns, each segment is
//! read into its own component type, and a caller function combines them.
//!
//! ```text
//! SELECT o.Id, o.Total, c.Id, c.Name FROM Orders o JOIN Customers c ON ...
//!        └── Order ───────┘ └── Customer ─┘
//!                           ^ split on "Id"
//! ```

use std::marker::PhantomData;
use std::ops::Range;

use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::{Column, Decode, FromRow, Row, Type, ValueRef};

/// Maps one row to a `T`.
pub trait RowMapper<T> {
   fn map_row(&self, row: &SqliteRow) -> Result<T, sqlx::Error>;
}

/// Maps whole rows through [`FromRow`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityRows;

impl<T> RowMapper<T> for EntityRows
where
   T: for<'r> FromRow<'r, SqliteRow>,
{
   fn map_row(&self, row: &SqliteRow) -> Result<T, sqlx::Error> {
      T::from_row(row)
   }
}

/// Columns that start each component after the first.
///
/// Given as a comma-separated list. With fewer names than boundaries, the
/// last name is reused, so a single `"Id"` splits at every following `Id`.
/// Matching ignores ASCII case and the `:N` suffix SQLite appends to repeated
/// names in a derived table, which is how joined columns come back from a
/// page statement (`Id`, `Id:1`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOn(Vec<String>);

impl SplitOn {
   pub fn new(columns: &str) -> Self {
      Self(
         columns
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect(),
      )
   }

   /// Column ranges for `components` segments of a row with these column names.
   ///
   /// The search for boundary `k` starts one column after the start of
   /// segment `k - 1`, so a split column leading the row belongs to the first
   /// segment.
   pub fn segments(&self, columns: &[&str], components: usize) -> Result<Vec<Range<usize>>, sqlx::Error> {
      if components > 1 && self.0.is_empty() {
         return Err(sqlx::Error::Decode("split-on column list is empty".into()));
      }

      let mut starts = vec![0];
      for k in 1..components {
         let name = &self.0[(k - 1).min(self.0.len() - 1)];
         let from = starts[k - 1] + 1;
         let found = columns
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, column)| same_column(column, name))
            .map(|(i, _)| i)
            .ok_or_else(|| sqlx::Error::ColumnNotFound(name.clone()))?;
         starts.push(found);
      }

      let mut ranges = Vec::with_capacity(components);
      for (k, &start) in starts.iter().enumerate() {
         let end = starts.get(k + 1).copied().unwrap_or(columns.len());
         ranges.push(start..end);
      }
      Ok(ranges)
   }

   fn split_row<'r>(&self, row: &'r SqliteRow, components: usize) -> Result<Vec<RowSegment<'r>>, sqlx::Error> {
      let columns: Vec<&str> = row.columns().iter().map(|c| c.name()).collect();
      Ok(self
         .segments(&columns, components)?
         .into_iter()
         .map(|range| RowSegment { row, range })
         .collect())
   }
}

/// Compare a result column name with a requested name.
fn same_column(column: &str, name: &str) -> bool {
   let base = match column.rsplit_once(':') {
      Some((base, n)) if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) => base,
      _ => column,
   };
   base.eq_ignore_ascii_case(name)
}

impl From<&str> for SplitOn {
   fn from(columns: &str) -> Self {
      Self::new(columns)
   }
}

/// A contiguous range of a row's columns, indexed from zero.
#[derive(Clone)]
pub struct RowSegment<'r> {
   row: &'r SqliteRow,
   range: Range<usize>,
}

impl std::fmt::Debug for RowSegment<'_> {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("RowSegment")
         .field("range", &self.range)
         .field("columns", &self.columns().collect::<Vec<_>>())
         .finish()
   }
}

impl<'r> RowSegment<'r> {
   /// Segment covering the whole row.
   pub fn whole(row: &'r SqliteRow) -> Self {
      Self {
         row,
         range: 0..row.columns().len(),
      }
   }

   pub fn len(&self) -> usize {
      self.range.len()
   }

   pub fn is_empty(&self) -> bool {
      self.range.is_empty()
   }

   /// Column names in this segment.
   pub fn columns(&self) -> impl Iterator<Item = &str> {
      self.row.columns()[self.range.clone()].iter().map(|c| c.name())
   }

   fn absolute(&self, index: usize) -> Result<usize, sqlx::Error> {
      if index < self.len() {
         Ok(self.range.start + index)
      } else {
         Err(sqlx::Error::ColumnIndexOutOfBounds {
            index,
            len: self.len(),
         })
      }
   }

   /// Decode the column at `index` within the segment.
   pub fn get<V>(&self, index: usize) -> Result<V, sqlx::Error>
   where
      V: Decode<'r, Sqlite> + Type<Sqlite>,
   {
      self.row.try_get(self.absolute(index)?)
   }

   /// Decode the first column in the segment with this name, ignoring case.
   pub fn get_named<V>(&self, name: &str) -> Result<V, sqlx::Error>
   where
      V: Decode<'r, Sqlite> + Type<Sqlite>,
   {
      let index = self
         .columns()
         .position(|c| same_column(c, name))
         .ok_or_else(|| sqlx::Error::ColumnNotFound(name.to_string()))?;
      self.get(index)
   }

   pub fn is_null(&self, index: usize) -> Result<bool, sqlx::Error> {
      Ok(self.row.try_get_raw(self.absolute(index)?)?.is_null())
   }
}

/// A component type read from one segment of a row.
///
/// Implementations usually read columns positionally in declaration order:
///
/// ```
/// use sqlx_sqlite_repository::{FromSegment, RowSegment};
///
/// struct Customer {
///    id: i64,
///    name: String,
/// }
///
/// impl FromSegment for Customer {
///    fn from_segment(segment: &RowSegment<'_>) -> Result<Self, sqlx::Error> {
///       Ok(Customer {
///          id: segment.get(0)?,
///          name: segment.get(1)?,
///       })
///    }
/// }
/// ```
pub trait FromSegment: Sized {
   fn from_segment(segment: &RowSegment<'_>) -> Result<Self, sqlx::Error>;
}

/// `None` when the segment's first column is NULL, as an unmatched LEFT JOIN
/// produces.
impl<C: FromSegment> FromSegment for Option<C> {
   fn from_segment(segment: &RowSegment<'_>) -> Result<Self, sqlx::Error> {
      if segment.is_empty() || segment.is_null(0)? {
         Ok(None)
      } else {
         C::from_segment(segment).map(Some)
      }
   }
}

/// Maps a row split into two components.
pub struct Join2<A, B, F> {
   split_on: SplitOn,
   combine: F,
   _components: PhantomData<fn() -> (A, B)>,
}

impl<A, B, F> Join2<A, B, F> {
   pub fn new(split_on: impl Into<SplitOn>, combine: F) -> Self {
      Self {
         split_on: split_on.into(),
         combine,
         _components: PhantomData,
      }
   }
}

impl<A, B, T, F> RowMapper<T> for Join2<A, B, F>
where
   A: FromSegment,
   B: FromSegment,
   F: Fn(A, B) -> T,
{
   fn map_row(&self, row: &SqliteRow) -> Result<T, sqlx::Error> {
      let segments = self.split_on.split_row(row, 2)?;
      let a = A::from_segment(&segments[0])?;
      let b = B::from_segment(&segments[1])?;
      Ok((self.combine)(a, b))
   }
}

/// Maps a row split into three components.
pub struct Join3<A, B, C, F> {
   split_on: SplitOn,
   combine: F,
   _components: PhantomData<fn() -> (A, B, C)>,
}

impl<A, B, C, F> Join3<A, B, C, F> {
   pub fn new(split_on: impl Into<SplitOn>, combine: F) -> Self {
      Self {
         split_on: split_on.into(),
         combine,
         _components: PhantomData,
      }
   }
}

impl<A, B, C, T, F> RowMapper<T> for Join3<A, B, C, F>
where
   A: FromSegment,
   B: FromSegment,
   C: FromSegment,
   F: Fn(A, B, C) -> T,
{
   fn map_row(&self, row: &SqliteRow) -> Result<T, sqlx::Error> {
      let segments = self.split_on.split_row(row, 3)?;
      let a = A::from_segment(&segments[0])?;
      let b = B::from_segment(&segments[1])?;
      let c = C::from_segment(&segments[2])?;
      Ok((self.combine)(a, b, c))
   }
}
