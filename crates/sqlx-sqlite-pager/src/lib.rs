//! # sqlx-sqlite-pager
//!
//! Page-number pagination for hand-written SELECT statements, with no I/O.
//!
//! - **[`rewrite`]**: derive a `ROW_NUMBER()` page statement and a count statement
//! - **[`PageQuery`]** / **[`PageWindow`]**: what to fetch and the row range it maps to
//! - **[`Page`]**: the fetched rows plus count-mode or peek-mode metadata
//! - **[`scan`]**: the literal- and comment-aware scanner the rewriter is built on

pub mod page;
pub mod pagination;
pub mod query;
pub mod scan;

mod error;

pub use error::{Error, Result};
pub use page::{Page, PageTotals};
pub use pagination::{COUNT_ALIAS, PagedStatements, ROW_NUMBER_COLUMN, WINDOW_ALIAS, rewrite};
pub use query::{DEFAULT_ORDER_BY, PageQuery, PageWindow};
