//! # sqlx-sqlite-repository
//!
//! A generic repository over SQLite: entity CRUD, statements with named
//! parameters, multi-table row mapping and page-number pagination of
//! hand-written SELECT statements.
//!
//! ## Core Types
//!
//! - **[`Repository`]**: data access for one row type, holding a [`Connector`]
//! - **[`Entity`]**: table, key column and column values of a stored type
//! - **[`Params`]** / **[`SqlValue`]**: named parameter values
//! - **[`PageQuery`]** / **[`Page`]**: what page to fetch and what came back
//! - **[`RowMapper`]**, **[`Join2`]**, **[`Join3`]**: row shaping, including joined rows
//! - **[`ConnectionStrings`]**: named connection strings, `DefaultDB` by default
//!
//! ## Architecture
//!
//! - **Per-call connections**: a call without a caller connection opens one and closes it
//!   before returning; there is no pool and no shared connection state
//! - **Caller-owned transactions**: pass `Some(&mut *tx)` to run calls in a transaction
//! - **Pure rewriting**: pagination derives page and count statements from the SELECT text,
//!   see [`sqlx_sqlite_pager`]

mod config;
pub mod decode;
mod error;
mod mapper;
mod params;
mod repository;
mod session;
mod statement;

// Re-export public types
pub use config::{ConnectionStrings, DEFAULT_CONNECTION_NAME};
pub use error::{Error, Result};
pub use mapper::{EntityRows, FromSegment, Join2, Join3, RowMapper, RowSegment, SplitOn};
pub use params::{BoundStatement, Params, SqlValue, placeholders};
pub use repository::{Entity, Repository, RepositoryConfig};

pub use sqlx_sqlite_connector::{Connection, Connector, ConnectorConfig};
pub use sqlx_sqlite_pager::{Page, PageQuery, PageTotals, PageWindow};
