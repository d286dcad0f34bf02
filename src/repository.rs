//! The generic repository.
//!
//! Every operation takes an optional caller connection as its last argument:
//!
//! - `None`: a connection is opened for the call and closed before it returns
//! - `Some(conn)`: the call runs on the caller's connection, typically inside a
//!   transaction the caller commits or rolls back
//!
//! ```no_run
//! # async fn example() -> sqlx_sqlite_repository::Result<()> {
//! use sqlx_sqlite_repository::{ConnectionStrings, Params, PageQuery, Repository};
//!
//! #[derive(sqlx::FromRow)]
//! struct Post {
//!    id: i64,
//!    title: String,
//! }
//!
//! let strings = ConnectionStrings::new().with("DefaultDB", "sqlite://blog.db");
//! let posts: Repository<Post> = Repository::new(strings.default_connector()?);
//!
//! let query = PageQuery::new("SELECT id, title FROM posts WHERE category = :category", 2, 20)
//!    .order_by("ORDER BY id DESC");
//! let page = posts
//!    .page_list(&query, &Params::new().with("category", "tech"), None)
//!    .await?;
//! println!("{} of {} pages", page.page, page.page_count());
//!
//! // Two calls in one transaction
//! let mut conn = posts.connector().acquire().await?;
//! let mut tx = conn.begin().await?;
//! posts.execute("DELETE FROM posts WHERE id = :id", &Params::new().with("id", 1), Some(&mut *tx)).await?;
//! posts.execute("DELETE FROM comments WHERE post_id = :id", &Params::new().with("id", 1), Some(&mut *tx)).await?;
//! tx.commit().await.map_err(sqlx_sqlite_connector::Error::from)?;
//! # Ok(())
//! # }
//! ```

use std::marker::PhantomData;
use std::time::Duration;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use sqlx::sqlite::{Sqlite, SqliteConnection, SqliteRow};
use sqlx::{Decode, FromRow, Row, Type};
use sqlx_sqlite_connector::Connector;
use sqlx_sqlite_pager::scan::split_statements;
use sqlx_sqlite_pager::{Page, PageQuery, pagination};
use tracing::debug;

use crate::decode::row_to_json;
use crate::error::{Error, Result};
use crate::mapper::{EntityRows, RowMapper};
use crate::params::{BoundStatement, Params, SqlValue};
use crate::session::Session;
use crate::statement;

/// A row type stored in one table.
///
/// Rows are read back through [`FromRow`]; writes use [`to_params`](Entity::to_params),
/// whose names are the column names.
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
   fn table_name() -> &'static str;

   /// Primary key column. Defaults to `"Id"`.
   fn key_column() -> &'static str {
      "Id"
   }

   /// Column values in declaration order, key included.
   ///
   /// A null key on insert means the store generates it.
   fn to_params(&self) -> Params;
}

/// Per-repository settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepositoryConfig {
   /// Upper bound on each statement; `None` waits indefinitely.
   ///
   /// When a statement times out on a caller connection, the connection is
   /// left in an unknown state and should be closed.
   pub command_timeout: Option<Duration>,
}

/// Data access for rows of type `T`.
///
/// Holds only a [`Connector`] and immutable settings; cloning is cheap and
/// clones can be used from any task.
pub struct Repository<T> {
   connector: Connector,
   config: RepositoryConfig,
   _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
   fn clone(&self) -> Self {
      Self {
         connector: self.connector.clone(),
         config: self.config,
         _entity: PhantomData,
      }
   }
}

impl<T> std::fmt::Debug for Repository<T> {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("Repository")
         .field("connector", &self.connector)
         .field("config", &self.config)
         .finish()
   }
}

impl<T> Repository<T> {
   pub fn new(connector: Connector) -> Self {
      Self::with_config(connector, RepositoryConfig::default())
   }

   pub fn with_config(connector: Connector, config: RepositoryConfig) -> Self {
      Self {
         connector,
         config,
         _entity: PhantomData,
      }
   }

   pub fn connector(&self) -> &Connector {
      &self.connector
   }

   pub fn config(&self) -> &RepositoryConfig {
      &self.config
   }

   async fn session<'t>(&self, tx: Option<&'t mut SqliteConnection>) -> Result<Session<'t>> {
      Session::open(&self.connector, tx, self.config.command_timeout).await
   }

   /// Run a statement, returning the number of rows affected.
   pub async fn execute(&self, sql: &str, params: &Params, tx: Option<&mut SqliteConnection>) -> Result<u64> {
      let statement = BoundStatement::new(sql, params)?;
      let mut session = self.session(tx).await?;
      let result = session.execute(&statement).await.map(|r| r.rows_affected());
      session.finish(result).await
   }

   /// First column of the first row, or `None` when there are no rows.
   pub async fn execute_scalar<R>(
      &self,
      sql: &str,
      params: &Params,
      tx: Option<&mut SqliteConnection>,
   ) -> Result<Option<R>>
   where
      R: for<'r> Decode<'r, Sqlite> + Type<Sqlite> + Send,
   {
      let statement = BoundStatement::new(sql, params)?;
      let mut session = self.session(tx).await?;
      let result = match session.fetch_optional(&statement).await {
         Ok(Some(row)) => row.try_get(0).map(Some).map_err(|e| statement.data_access(e)),
         Ok(None) => Ok(None),
         Err(e) => Err(e),
      };
      session.finish(result).await
   }

   /// All rows, each read into `R` through [`FromRow`].
   ///
   /// `R` need not be `T`; scalar tuples such as `(i64,)` work too.
   pub async fn get_list_as<R>(&self, sql: &str, params: &Params, tx: Option<&mut SqliteConnection>) -> Result<Vec<R>>
   where
      R: for<'r> FromRow<'r, SqliteRow> + Send,
   {
      self.get_list_with(sql, params, &EntityRows, tx).await
   }

   /// All rows as ordered column → JSON maps.
   pub async fn fetch_dynamic(
      &self,
      sql: &str,
      params: &Params,
      tx: Option<&mut SqliteConnection>,
   ) -> Result<Vec<IndexMap<String, JsonValue>>> {
      let statement = BoundStatement::new(sql, params)?;
      let mut session = self.session(tx).await?;
      let result = match session.fetch_all(&statement).await {
         Ok(rows) => rows.iter().map(|row| row_to_json(row, &statement)).collect(),
         Err(e) => Err(e),
      };
      session.finish(result).await
   }

   /// Run a `;`-separated batch, returning the rows of each statement as
   /// ordered column → JSON maps.
   ///
   /// Statements run in order on one connection and are bound independently,
   /// so each needs values only for the placeholders it contains. A statement
   /// that returns no rows contributes an empty set.
   pub async fn query_multiple(
      &self,
      sql: &str,
      params: &Params,
      tx: Option<&mut SqliteConnection>,
   ) -> Result<Vec<Vec<IndexMap<String, JsonValue>>>> {
      let statements = split_statements(sql)
         .into_iter()
         .map(|piece| BoundStatement::new(piece, params))
         .collect::<Result<Vec<_>>>()?;

      debug!("Running batch of {} statements", statements.len());

      let mut session = self.session(tx).await?;
      let result = fetch_result_sets(&mut session, &statements).await;
      session.finish(result).await
   }

   /// All rows, each mapped by `mapper`.
   pub async fn get_list_with<R, M>(
      &self,
      sql: &str,
      params: &Params,
      mapper: &M,
      tx: Option<&mut SqliteConnection>,
   ) -> Result<Vec<R>>
   where
      M: RowMapper<R> + Sync,
      R: Send,
   {
      let statement = BoundStatement::new(sql, params)?;
      let mut session = self.session(tx).await?;
      let result = match session.fetch_all(&statement).await {
         Ok(rows) => map_rows(&statement, &rows, mapper),
         Err(e) => Err(e),
      };
      session.finish(result).await
   }

   /// One page of rows, each mapped by `mapper`.
   ///
   /// The statement in `query` is rewritten into a page statement and, in
   /// count mode, a count statement; both run on the same connection. Each
   /// is bound only with the placeholders it contains.
   pub async fn page_list_with<R, M>(
      &self,
      query: &PageQuery,
      params: &Params,
      mapper: &M,
      tx: Option<&mut SqliteConnection>,
   ) -> Result<Page<R>>
   where
      M: RowMapper<R> + Sync,
      R: Send,
   {
      let statements = pagination::rewrite(query)?;
      let page_statement = BoundStatement::new(&statements.page, params)?;
      let count_statement = if query.is_peek() {
         None
      } else {
         Some(BoundStatement::new(&statements.count, params)?)
      };

      debug!(
         "Fetching page {} of size {} ({})",
         statements.window.page,
         statements.window.psize,
         if query.is_peek() { "peek" } else { "count" }
      );

      let mut session = self.session(tx).await?;
      let result = fetch_page(
         &mut session,
         &page_statement,
         count_statement.as_ref(),
         &statements.window,
         mapper,
      )
      .await;
      session.finish(result).await
   }
}

impl<T> Repository<T>
where
   T: for<'r> FromRow<'r, SqliteRow> + Send,
{
   /// All rows as `T`.
   pub async fn get_list(&self, sql: &str, params: &Params, tx: Option<&mut SqliteConnection>) -> Result<Vec<T>> {
      self.get_list_with(sql, params, &EntityRows, tx).await
   }

   /// Zero or one row as `T`. More than one row is an error.
   pub async fn get_by_sql(&self, sql: &str, params: &Params, tx: Option<&mut SqliteConnection>) -> Result<Option<T>> {
      let statement = BoundStatement::new(sql, params)?;
      let mut session = self.session(tx).await?;
      let result = single_row(&mut session, &statement).await;
      session.finish(result).await
   }

   /// One page of rows as `T`.
   pub async fn page_list(
      &self,
      query: &PageQuery,
      params: &Params,
      tx: Option<&mut SqliteConnection>,
   ) -> Result<Page<T>> {
      self.page_list_with(query, params, &EntityRows, tx).await
   }
}

impl<T: Entity> Repository<T> {
   /// The row whose key equals `id`, if any.
   pub async fn get(&self, id: impl Into<SqlValue>, tx: Option<&mut SqliteConnection>) -> Result<Option<T>> {
      let sql = statement::select_by_key(T::table_name(), T::key_column())?;
      let params = Params::new().with(statement::KEY_PARAM, id);
      self.get_by_sql(&sql, &params, tx).await
   }

   /// Insert `entity`, returning the new row id. `None` inserts nothing and
   /// returns `-1`.
   pub async fn insert(&self, entity: Option<&T>, tx: Option<&mut SqliteConnection>) -> Result<i64> {
      let Some(entity) = entity else {
         return Ok(-1);
      };

      let params = entity.to_params();
      let sql = statement::insert(T::table_name(), T::key_column(), &params)?;
      let statement = BoundStatement::new(&sql, &params)?;

      let mut session = self.session(tx).await?;
      let result = session.execute(&statement).await.map(|r| r.last_insert_rowid());
      session.finish(result).await
   }

   /// Update every non-key column of `entity` by key. Returns whether a row
   /// changed. `None` updates nothing and returns `true`.
   pub async fn update(&self, entity: Option<&T>, tx: Option<&mut SqliteConnection>) -> Result<bool> {
      let Some(entity) = entity else {
         return Ok(true);
      };

      let params = entity.to_params();
      let sql = statement::update(T::table_name(), T::key_column(), &params)?;
      self.execute(&sql, &params, tx).await.map(|n| n > 0)
   }

   /// Delete `entity` by key. Returns whether a row was removed. `None`
   /// deletes nothing and returns `true`.
   pub async fn delete(&self, entity: Option<&T>, tx: Option<&mut SqliteConnection>) -> Result<bool> {
      let Some(entity) = entity else {
         return Ok(true);
      };

      let params = entity.to_params();
      let sql = statement::delete(T::table_name(), T::key_column(), &params)?;
      self.execute(&sql, &params, tx).await.map(|n| n > 0)
   }
}

fn map_rows<R>(statement: &BoundStatement<'_>, rows: &[SqliteRow], mapper: &impl RowMapper<R>) -> Result<Vec<R>> {
   rows
      .iter()
      .map(|row| mapper.map_row(row).map_err(|e| statement.data_access(e)))
      .collect()
}

async fn fetch_result_sets(
   session: &mut Session<'_>,
   statements: &[BoundStatement<'_>],
) -> Result<Vec<Vec<IndexMap<String, JsonValue>>>> {
   let mut sets = Vec::with_capacity(statements.len());
   for statement in statements {
      let rows = session.fetch_all(statement).await?;
      sets.push(
         rows
            .iter()
            .map(|row| row_to_json(row, statement))
            .collect::<Result<Vec<_>>>()?,
      );
   }
   Ok(sets)
}

async fn single_row<T>(session: &mut Session<'_>, statement: &BoundStatement<'_>) -> Result<Option<T>>
where
   T: for<'r> FromRow<'r, SqliteRow>,
{
   // Two rows are enough to tell "one" from "more than one"
   let rows = session.fetch_up_to(statement, 2).await?;
   match rows.len() {
      0 => Ok(None),
      1 => T::from_row(&rows[0]).map(Some).map_err(|e| statement.data_access(e)),
      count => Err(Error::MultipleRowsReturned(count)),
   }
}

async fn fetch_page<R, M>(
   session: &mut Session<'_>,
   page_statement: &BoundStatement<'_>,
   count_statement: Option<&BoundStatement<'_>>,
   window: &sqlx_sqlite_pager::PageWindow,
   mapper: &M,
) -> Result<Page<R>>
where
   M: RowMapper<R>,
{
   let rows = session.fetch_all(page_statement).await?;
   let items = map_rows(page_statement, &rows, mapper)?;

   let Some(count_statement) = count_statement else {
      return Ok(Page::peeked(window, items));
   };

   let total = match session.fetch_optional(count_statement).await? {
      Some(row) => row
         .try_get::<Option<i64>, _>(0)
         .map_err(|e| count_statement.data_access(e))?
         .unwrap_or(0),
      None => 0,
   };

   Ok(Page::counted(window, items, total))
}
