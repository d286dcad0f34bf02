//! Row-number pagination by statement rewriting.
//!
//! Turns an ordinary SELECT into two statements: one that returns a single
//! page of rows using `ROW_NUMBER()`, and one that counts every row the
//! original statement would return. Callers write the query once, without
//! any pagination SQL.
//!
//! # How It Works
//!
//! The statement is split at the `FROM` that belongs to the outer SELECT (a
//! `FROM` inside a parenthesized subquery in the select-list is skipped). The
//! select-list gets a `ROW_NUMBER() OVER (<order by>)` column appended and the
//! whole statement is wrapped in an outer SELECT that filters on that column:
//!
//! ```text
//! SELECT id, title FROM posts WHERE category = :category
//!
//! page 2, psize 10, ORDER BY id:
//!    SELECT * FROM (SELECT id, title, ROW_NUMBER() OVER (ORDER BY id) AS page_row_number
//!       FROM posts WHERE category = :category) AS page_window
//!       WHERE page_row_number BETWEEN 11 AND 20 ORDER BY page_row_number
//!
//! count:
//!    SELECT COUNT(0) FROM posts WHERE category = :category LIMIT 1
//! ```
//!
//! The `LIMIT 1` on the count statement bounds the aggregate's output rows,
//! not the count. A statement whose rows are groups or distinct values is
//! counted over the whole statement instead, since `COUNT(0) <tail>` would
//! count the first group:
//!
//! ```text
//! SELECT COUNT(0) FROM (SELECT category, COUNT(*) FROM posts GROUP BY category) AS count_window LIMIT 1
//! ```
//!
//! Comments are dropped before rewriting.
//!
//! # Example
//!
//! ```
//! use sqlx_sqlite_pager::{PageQuery, rewrite};
//!
//! let statements = rewrite(&PageQuery::new("SELECT id FROM posts", 1, 5)).unwrap();
//! assert!(statements.page.ends_with("BETWEEN 1 AND 5 ORDER BY page_row_number"));
//! assert_eq!(statements.count, "SELECT COUNT(0) FROM posts LIMIT 1");
//! ```

use tracing::trace;

use crate::error::{Error, Result};
use crate::query::{PageQuery, PageWindow};
use crate::scan::{is_keyword_at, scan_top_level, strip_comments};

/// Name of the row-number column added to the page statement.
pub const ROW_NUMBER_COLUMN: &str = "page_row_number";

/// Alias of the derived table the page statement selects from.
pub const WINDOW_ALIAS: &str = "page_window";

/// Alias of the derived table a grouped or distinct statement is counted over.
pub const COUNT_ALIAS: &str = "count_window";

/// The two statements derived from one [`PageQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedStatements {
   /// Returns the rows of the requested page (plus one in peek mode).
   pub page: String,
   /// Returns the total row count. Not needed in peek mode.
   pub count: String,
   /// The clamped window the page statement selects.
   pub window: PageWindow,
}

/// Byte offset of the first `FROM` keyword outside any parentheses, literal,
/// quoted identifier or comment.
pub fn find_top_level_from(sql: &str) -> Option<usize> {
   scan_top_level(sql, |bytes, i| is_keyword_at(bytes, i, b"FROM").then_some(i))
}

/// Split a statement into its select-list and its `FROM …` tail.
pub fn split_at_from(sql: &str) -> Result<(&str, &str)> {
   let from = find_top_level_from(sql).ok_or_else(|| Error::UnbalancedFrom {
      sql: sql.to_string(),
   })?;
   Ok((sql[..from].trim_end(), &sql[from..]))
}

fn has_top_level_keyword(sql: &str, keyword: &[u8]) -> bool {
   scan_top_level(sql, |bytes, i| is_keyword_at(bytes, i, keyword).then_some(())).is_some()
}

/// Derive the page and count statements for `query`.
///
/// Pure and deterministic: nothing is executed, and the same query always
/// produces byte-identical statements. The input is not validated beyond
/// locating its outer `FROM`; malformed SQL yields malformed statements.
pub fn rewrite(query: &PageQuery) -> Result<PagedStatements> {
   let stripped = strip_comments(query.sql());
   let sql = stripped.trim().trim_end_matches(';').trim_end();
   let (select_list, from_tail) = split_at_from(sql)?;
   let window = query.window();

   let page = format!(
      "SELECT * FROM ({select_list}, ROW_NUMBER() OVER ({order_by}) AS {ROW_NUMBER_COLUMN} {from_tail}) AS {WINDOW_ALIAS} WHERE {ROW_NUMBER_COLUMN} BETWEEN {start} AND {end} ORDER BY {ROW_NUMBER_COLUMN}",
      order_by = query.order_by_clause(),
      start = window.start,
      end = window.end,
   );
   let grouped = has_top_level_keyword(select_list, b"DISTINCT") || has_top_level_keyword(from_tail, b"GROUP");
   let count = if grouped {
      format!("SELECT COUNT(0) FROM ({sql}) AS {COUNT_ALIAS} LIMIT 1")
   } else {
      format!("SELECT COUNT(0) {from_tail} LIMIT 1")
   };

   trace!("Rewrote page statement: {}", page);

   Ok(PagedStatements {
      page,
      count,
      window,
   })
}
