use std::future::Future;
use std::time::Duration;

use futures::TryStreamExt;
use sqlx::sqlite::{SqliteConnection, SqliteQueryResult, SqliteRow};
use sqlx_sqlite_connector::{Connection, Connector};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::params::BoundStatement;

/// The connection one repository call runs on.
///
/// Either opened for the call and closed by [`finish`](Session::finish), or
/// borrowed from a caller that owns a transaction. A borrowed connection is
/// never committed, rolled back or closed here.
pub(crate) struct Session<'t> {
   handle: Handle<'t>,
   command_timeout: Option<Duration>,
}

enum Handle<'t> {
   Owned(Connection),
   Borrowed(&'t mut SqliteConnection),
}

impl<'t> Session<'t> {
   pub async fn open(
      connector: &Connector,
      tx: Option<&'t mut SqliteConnection>,
      command_timeout: Option<Duration>,
   ) -> Result<Self> {
      let handle = match tx {
         Some(conn) => {
            debug!("Running on caller-owned connection");
            Handle::Borrowed(conn)
         }
         None => Handle::Owned(connector.acquire().await?),
      };

      Ok(Self {
         handle,
         command_timeout,
      })
   }

   fn conn(&mut self) -> &mut SqliteConnection {
      match &mut self.handle {
         Handle::Owned(conn) => &mut **conn,
         Handle::Borrowed(conn) => &mut **conn,
      }
   }

   /// Release an owned connection and hand back the call's result.
   ///
   /// The call's own error wins over an error from closing.
   pub async fn finish<R>(self, result: Result<R>) -> Result<R> {
      match self.handle {
         Handle::Owned(conn) => {
            let closed = conn.close().await;
            let value = result?;
            closed?;
            Ok(value)
         }
         Handle::Borrowed(_) => result,
      }
   }

   /// Run one statement future under the command timeout, attributing any
   /// failure to `statement`.
   async fn run<R>(
      command_timeout: Option<Duration>,
      statement: &BoundStatement<'_>,
      fut: impl Future<Output = std::result::Result<R, sqlx::Error>>,
   ) -> Result<R> {
      trace!("Executing statement: {}", statement.sql());

      let result = match command_timeout {
         Some(after) => tokio::time::timeout(after, fut).await.map_err(|_| Error::Timeout {
            statement: statement.sql().to_string(),
            after,
         })?,
         None => fut.await,
      };

      result.map_err(|source| statement.data_access(source))
   }

   pub async fn execute(&mut self, statement: &BoundStatement<'_>) -> Result<SqliteQueryResult> {
      let timeout = self.command_timeout;
      let conn = self.conn();
      Self::run(timeout, statement, async move {
         sqlx::query_with(statement.numbered_sql(), statement.arguments()?)
            .execute(conn)
            .await
      })
      .await
   }

   pub async fn fetch_all(&mut self, statement: &BoundStatement<'_>) -> Result<Vec<SqliteRow>> {
      let timeout = self.command_timeout;
      let conn = self.conn();
      Self::run(timeout, statement, async move {
         sqlx::query_with(statement.numbered_sql(), statement.arguments()?)
            .fetch_all(conn)
            .await
      })
      .await
   }

   /// Fetch at most `limit` rows, leaving the rest of the result unread.
   pub async fn fetch_up_to(&mut self, statement: &BoundStatement<'_>, limit: usize) -> Result<Vec<SqliteRow>> {
      let timeout = self.command_timeout;
      let conn = self.conn();
      Self::run(timeout, statement, async move {
         let mut rows = Vec::with_capacity(limit);
         let mut stream = sqlx::query_with(statement.numbered_sql(), statement.arguments()?).fetch(conn);
         while rows.len() < limit {
            match stream.try_next().await? {
               Some(row) => rows.push(row),
               None => break,
            }
         }
         Ok(rows)
      })
      .await
   }

   pub async fn fetch_optional(&mut self, statement: &BoundStatement<'_>) -> Result<Option<SqliteRow>> {
      Ok(self.fetch_up_to(statement, 1).await?.into_iter().next())
   }
}
