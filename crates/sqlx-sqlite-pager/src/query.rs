//! Page requests and the row window they select.

/// ORDER BY used when the caller does not care about row order.
///
/// `ROW_NUMBER()` requires an ordering; ordering by a constant keeps whatever
/// order the store produces.
pub const DEFAULT_ORDER_BY: &str = "ORDER BY (SELECT NULL)";

/// Everything one rewrite-and-execute cycle needs: the statement, which page,
/// how big, in what order, and whether to count or peek.
///
/// # Example
///
/// ```
/// use sqlx_sqlite_pager::PageQuery;
///
/// let query = PageQuery::new("SELECT id, title FROM posts WHERE category = :category", 2, 20)
///    .order_by("ORDER BY id DESC")
///    .peek(true);
///
/// assert_eq!(query.window().start, 21);
/// assert_eq!(query.window().end, 41);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
   sql: String,
   page: i64,
   psize: i64,
   order_by: Option<String>,
   peek: bool,
}

impl PageQuery {
   /// A count-mode query for `page` (1-based) of `psize` rows.
   ///
   /// Values below 1 are accepted here and clamped when the window is
   /// computed; the query keeps what the caller passed.
   pub fn new(sql: impl Into<String>, page: i64, psize: i64) -> Self {
      Self {
         sql: sql.into(),
         page,
         psize,
         order_by: None,
         peek: false,
      }
   }

   /// Set the full `ORDER BY …` clause used inside `ROW_NUMBER() OVER (…)`.
   pub fn order_by(mut self, clause: impl Into<String>) -> Self {
      self.order_by = Some(clause.into());
      self
   }

   /// Skip the count statement and over-fetch one row to learn whether a
   /// further page exists.
   pub fn peek(mut self, peek: bool) -> Self {
      self.peek = peek;
      self
   }

   pub fn sql(&self) -> &str {
      &self.sql
   }

   /// The page as the caller requested it, before clamping.
   pub fn page(&self) -> i64 {
      self.page
   }

   /// The page size as the caller requested it, before clamping.
   pub fn psize(&self) -> i64 {
      self.psize
   }

   pub fn is_peek(&self) -> bool {
      self.peek
   }

   /// The ORDER BY clause, or [`DEFAULT_ORDER_BY`] when none was set.
   pub fn order_by_clause(&self) -> &str {
      match &self.order_by {
         Some(clause) if !clause.trim().is_empty() => clause.trim(),
         _ => DEFAULT_ORDER_BY,
      }
   }

   /// Clamped page window for this query.
   pub fn window(&self) -> PageWindow {
      PageWindow::new(self.page, self.psize, self.peek)
   }
}

/// The 1-based, inclusive `ROW_NUMBER()` range a page covers.
///
/// `start = psize * (page - 1) + 1` and `end = psize * page`, plus one extra
/// row in peek mode. `page` and `psize` are clamped to at least 1; the
/// arithmetic saturates rather than overflowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
   pub page: i64,
   pub psize: i64,
   pub start: i64,
   pub end: i64,
   pub peek: bool,
}

impl PageWindow {
   pub fn new(page: i64, psize: i64, peek: bool) -> Self {
      let page = page.max(1);
      let psize = psize.max(1);

      let start = psize.saturating_mul(page - 1).saturating_add(1);
      let mut end = psize.saturating_mul(page);
      if peek {
         end = end.saturating_add(1);
      }

      Self {
         page,
         psize,
         start,
         end,
         peek,
      }
   }

   /// Page size as a length, for truncating fetched rows.
   pub fn psize_len(&self) -> usize {
      usize::try_from(self.psize).unwrap_or(usize::MAX)
   }
}
