use std::time::Duration;

use sqlx_sqlite_repository::{
   Connector, ConnectorConfig, Entity, EntityRows, Error, FromSegment, Join2, Join3, Page, PageQuery,
   Params, Repository, RepositoryConfig, RowMapper, RowSegment,
};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
#[sqlx(rename_all = "PascalCase")]
struct User {
   id: Option<i64>,
   name: String,
   email: Option<String>,
}

impl User {
   fn new(name: &str, email: Option<&str>) -> Self {
      Self {
         id: None,
         name: name.to_string(),
         email: email.map(str::to_string),
      }
   }
}

impl Entity for User {
   fn table_name() -> &'static str {
      "Users"
   }

   fn to_params(&self) -> Params {
      Params::new()
         .with("Id", self.id)
         .with("Name", self.name.as_str())
         .with("Email", self.email.as_deref())
   }
}

#[derive(Debug, PartialEq)]
struct Order {
   id: i64,
   total: f64,
}

impl FromSegment for Order {
   fn from_segment(segment: &RowSegment<'_>) -> Result<Self, sqlx::Error> {
      Ok(Order {
         id: segment.get(0)?,
         total: segment.get(1)?,
      })
   }
}

#[derive(Debug, PartialEq)]
struct Customer {
   id: i64,
   name: String,
}

impl FromSegment for Customer {
   fn from_segment(segment: &RowSegment<'_>) -> Result<Self, sqlx::Error> {
      Ok(Customer {
         id: segment.get(0)?,
         name: segment.get_named("Name")?,
      })
   }
}

#[derive(Debug, PartialEq)]
struct Shipment {
   id: i64,
   carrier: String,
}

impl FromSegment for Shipment {
   fn from_segment(segment: &RowSegment<'_>) -> Result<Self, sqlx::Error> {
      Ok(Shipment {
         id: segment.get(0)?,
         carrier: segment.get(1)?,
      })
   }
}

fn test_connector(temp_dir: &TempDir) -> Connector {
   let db_path = temp_dir.path().join("test.db");
   Connector::from_connection_string(format!("sqlite://{}", db_path.display()))
      .expect("Failed to build connector")
}

async fn create_test_repo() -> (Repository<User>, TempDir) {
   let temp_dir = TempDir::new().expect("Failed to create temp directory");
   let repo = Repository::new(test_connector(&temp_dir));

   repo
      .execute(
         "CREATE TABLE Users (Id INTEGER PRIMARY KEY, Name TEXT NOT NULL, Email TEXT)",
         &Params::new(),
         None,
      )
      .await
      .expect("Failed to create Users");

   (repo, temp_dir)
}

async fn seed_users(repo: &Repository<User>, count: usize) {
   let mut conn = repo.connector().acquire().await.unwrap();
   let mut tx = conn.begin().await.unwrap();
   for i in 1..=count {
      let user = User::new(&format!("user{i:03}"), None);
      repo.insert(Some(&user), Some(&mut *tx)).await.unwrap();
   }
   tx.commit().await.unwrap();
   conn.close().await.unwrap();
}

/// Seed orders, customers and shipments.
///
/// ```text
/// Orders               Customers        Shipments
/// Id | Cust | Total    Id | Name        Id | OrderId | Carrier
/// ---|------|------    ---|------       ---|---------|--------
/// 10 |   1  | 25.5      1 | Ada         100|   10    | post
/// 11 |   2  | 10.0      2 | Grace       101|   12    | courier
/// 12 |   1  | 99.9
/// ```
async fn seed_orders(repo: &Repository<User>) {
   for sql in [
      "CREATE TABLE Customers (Id INTEGER PRIMARY KEY, Name TEXT NOT NULL)",
      "CREATE TABLE Orders (Id INTEGER PRIMARY KEY, CustomerId INTEGER NOT NULL, Total REAL NOT NULL)",
      "CREATE TABLE Shipments (Id INTEGER PRIMARY KEY, OrderId INTEGER NOT NULL, Carrier TEXT NOT NULL)",
      "INSERT INTO Customers (Id, Name) VALUES (1, 'Ada'), (2, 'Grace')",
      "INSERT INTO Orders (Id, CustomerId, Total) VALUES (10, 1, 25.5), (11, 2, 10.0), (12, 1, 99.9)",
      "INSERT INTO Shipments (Id, OrderId, Carrier) VALUES (100, 10, 'post'), (101, 12, 'courier')",
   ] {
      repo.execute(sql, &Params::new(), None).await.unwrap();
   }
}

const ORDERS_WITH_CUSTOMERS: &str =
   "SELECT o.Id, o.Total, c.Id, c.Name FROM Orders o JOIN Customers c ON c.Id = o.CustomerId";

// ─── Entity CRUD ───

#[tokio::test]
async fn insert_then_get_by_key() {
   let (repo, _temp) = create_test_repo().await;

   let id = repo
      .insert(Some(&User::new("Ada", Some("ada@example.com"))), None)
      .await
      .unwrap();
   assert_eq!(id, 1);

   let user = repo.get(id, None).await.unwrap().unwrap();
   assert_eq!(
      user,
      User {
         id: Some(1),
         name: "Ada".into(),
         email: Some("ada@example.com".into()),
      }
   );

   assert_eq!(repo.get(999, None).await.unwrap(), None);
}

#[tokio::test]
async fn insert_with_explicit_key() {
   let (repo, _temp) = create_test_repo().await;

   let user = User {
      id: Some(42),
      ..User::new("Grace", None)
   };
   assert_eq!(repo.insert(Some(&user), None).await.unwrap(), 42);
   assert_eq!(repo.get(42, None).await.unwrap(), Some(user));
}

#[tokio::test]
async fn update_and_delete_report_whether_a_row_changed() {
   let (repo, _temp) = create_test_repo().await;
   let id = repo.insert(Some(&User::new("Ada", None)), None).await.unwrap();

   let mut user = repo.get(id, None).await.unwrap().unwrap();
   user.email = Some("ada@example.com".into());
   assert!(repo.update(Some(&user), None).await.unwrap());
   assert_eq!(
      repo.get(id, None).await.unwrap().unwrap().email.as_deref(),
      Some("ada@example.com")
   );

   let missing = User {
      id: Some(999),
      ..User::new("Nobody", None)
   };
   assert!(!repo.update(Some(&missing), None).await.unwrap());

   assert!(repo.delete(Some(&user), None).await.unwrap());
   assert!(!repo.delete(Some(&user), None).await.unwrap());
   assert_eq!(repo.get(id, None).await.unwrap(), None);
}

#[tokio::test]
async fn absent_entities_return_sentinels_without_touching_the_store() {
   // The directory does not exist and may not be created, so any open fails
   let temp_dir = TempDir::new().unwrap();
   let db_path = temp_dir.path().join("missing").join("test.db");
   let connector = Connector::new(ConnectorConfig {
      create_if_missing: false,
      ..ConnectorConfig::new(format!("sqlite://{}", db_path.display()))
   })
   .unwrap();
   let repo: Repository<User> = Repository::new(connector);

   assert_eq!(repo.insert(None, None).await.unwrap(), -1);
   assert!(repo.update(None, None).await.unwrap());
   assert!(repo.delete(None, None).await.unwrap());

   // A real call does reach the store
   let err = repo.get(1, None).await.unwrap_err();
   assert_eq!(err.error_code(), "CONNECTION_ERROR");
}

#[tokio::test]
async fn update_without_key_is_invalid_entity() {
   let (repo, _temp) = create_test_repo().await;

   let err = repo
      .update(Some(&User::new("Ada", None)), None)
      .await
      .unwrap_err();
   assert!(matches!(err, Error::InvalidEntity { ref entity, .. } if entity == "Users"));
}

// ─── Queries ───

#[tokio::test]
async fn get_list_and_get_by_sql() {
   let (repo, _temp) = create_test_repo().await;
   seed_users(&repo, 5).await;

   let users = repo
      .get_list(
         "SELECT * FROM Users WHERE Id > :min ORDER BY Id",
         &Params::new().with("min", 3),
         None,
      )
      .await
      .unwrap();
   let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
   assert_eq!(names, vec!["user004", "user005"]);

   let one = repo
      .get_by_sql(
         "SELECT * FROM Users WHERE Name = @name",
         &Params::new().with("name", "user002"),
         None,
      )
      .await
      .unwrap();
   assert_eq!(one.and_then(|u| u.id), Some(2));
}

#[tokio::test]
async fn get_by_sql_rejects_multiple_rows() {
   let (repo, _temp) = create_test_repo().await;
   seed_users(&repo, 3).await;

   let err = repo
      .get_by_sql("SELECT * FROM Users", &Params::new(), None)
      .await
      .unwrap_err();
   assert!(matches!(err, Error::MultipleRowsReturned(2)));
}

#[tokio::test]
async fn scalar_and_tuple_results() {
   let (repo, _temp) = create_test_repo().await;
   seed_users(&repo, 4).await;

   let count: Option<i64> = repo
      .execute_scalar("SELECT COUNT(*) FROM Users", &Params::new(), None)
      .await
      .unwrap();
   assert_eq!(count, Some(4));

   let none: Option<String> = repo
      .execute_scalar("SELECT Name FROM Users WHERE Id = :id", &Params::new().with("id", 99), None)
      .await
      .unwrap();
   assert_eq!(none, None);

   let pairs: Vec<(i64, String)> = repo
      .get_list_as("SELECT Id, Name FROM Users WHERE Id <= 2 ORDER BY Id", &Params::new(), None)
      .await
      .unwrap();
   assert_eq!(pairs, vec![(1, "user001".into()), (2, "user002".into())]);
}

#[tokio::test]
async fn fetch_dynamic_preserves_column_order_and_types() {
   let (repo, _temp) = create_test_repo().await;

   let rows = repo
      .fetch_dynamic(
         "SELECT 'x' AS zeta, 1 AS alpha, 2.5 AS mid, NULL AS nothing, X'00FF' AS bytes",
         &Params::new(),
         None,
      )
      .await
      .unwrap();

   let row = &rows[0];
   let keys: Vec<&str> = row.keys().map(String::as_str).collect();
   assert_eq!(keys, vec!["zeta", "alpha", "mid", "nothing", "bytes"]);
   assert_eq!(row["zeta"], serde_json::json!("x"));
   assert_eq!(row["alpha"], serde_json::json!(1));
   assert_eq!(row["mid"], serde_json::json!(2.5));
   assert_eq!(row["nothing"], serde_json::Value::Null);
   assert_eq!(row["bytes"], serde_json::json!("AP8="));
}

#[tokio::test]
async fn json_params_bind_at_the_boundary() {
   let (repo, _temp) = create_test_repo().await;
   seed_users(&repo, 3).await;

   let params = Params::from_json(serde_json::json!({ "id": 2 })).unwrap();
   let user = repo
      .get_by_sql("SELECT * FROM Users WHERE Id = :id", &params, None)
      .await
      .unwrap();
   assert_eq!(user.map(|u| u.name), Some("user002".into()));
}

#[tokio::test]
async fn repeated_placeholder_binds_once() {
   let (repo, _temp) = create_test_repo().await;
   seed_users(&repo, 5).await;

   let ids: Vec<(i64,)> = repo
      .get_list_as(
         "SELECT Id FROM Users WHERE Id >= :n AND Id <= :n + 1 ORDER BY Id",
         &Params::new().with("n", 2),
         None,
      )
      .await
      .unwrap();
   assert_eq!(ids, vec![(2,), (3,)]);
}

#[tokio::test]
async fn both_placeholder_prefixes_bind_by_name() {
   let (repo, _temp) = create_test_repo().await;
   seed_users(&repo, 5).await;

   let names: Vec<(String,)> = repo
      .get_list_as(
         "SELECT Name FROM Users WHERE Id > @low AND Id < :high AND Name <> ':high' ORDER BY Id",
         &Params::new().with("low", 1).with("high", 4),
         None,
      )
      .await
      .unwrap();
   assert_eq!(names, vec![("user002".to_string(),), ("user003".to_string(),)]);
}

#[tokio::test]
async fn query_multiple_returns_one_set_per_statement() {
   let (repo, _temp) = create_test_repo().await;
   seed_users(&repo, 3).await;

   let sets = repo
      .query_multiple(
         "SELECT Name FROM Users WHERE Id = :id;
          SELECT COUNT(*) AS n FROM Users;
          UPDATE Users SET Email = 'b@example.com' WHERE Id = :id;
          SELECT Email FROM Users WHERE Id = :id; -- done",
         &Params::new().with("id", 2),
         None,
      )
      .await
      .unwrap();

   assert_eq!(sets.len(), 4);
   assert_eq!(sets[0][0]["Name"], serde_json::json!("user002"));
   assert_eq!(sets[1][0]["n"], serde_json::json!(3));
   assert!(sets[2].is_empty());
   assert_eq!(sets[3][0]["Email"], serde_json::json!("b@example.com"));
}

#[tokio::test]
async fn query_multiple_checks_every_statement_before_running() {
   let (repo, _temp) = create_test_repo().await;
   seed_users(&repo, 1).await;

   let err = repo
      .query_multiple(
         "DELETE FROM Users; SELECT * FROM Users WHERE Id = :id",
         &Params::new(),
         None,
      )
      .await
      .unwrap_err();
   assert!(matches!(err, Error::MissingParameter { ref name, .. } if name == "id"));

   // The DELETE never ran
   assert_eq!(repo.get(1, None).await.unwrap().map(|u| u.id), Some(Some(1)));
}

// ─── Errors ───

#[tokio::test]
async fn driver_errors_carry_the_statement() {
   let (repo, _temp) = create_test_repo().await;

   let err = repo
      .execute("INSERT INTO Nope (a) VALUES (:a)", &Params::new().with("a", 1), None)
      .await
      .unwrap_err();

   match err {
      Error::DataAccess {
         ref statement,
         ref params,
         ..
      } => {
         assert_eq!(statement, "INSERT INTO Nope (a) VALUES (:a)");
         assert_eq!(params.len(), 1);
      }
      ref other => panic!("expected DataAccess, got {other:?}"),
   }
   assert!(err.error_code().starts_with("SQLITE_"));
}

#[tokio::test]
async fn missing_parameter_fails_before_execution() {
   let (repo, _temp) = create_test_repo().await;

   let err = repo
      .get_list("SELECT * FROM Users WHERE Name = :name", &Params::new(), None)
      .await
      .unwrap_err();
   assert!(matches!(err, Error::MissingParameter { ref name, .. } if name == "name"));
}

#[tokio::test]
async fn command_timeout_stops_a_long_statement() {
   let temp_dir = TempDir::new().unwrap();
   let repo: Repository<User> = Repository::with_config(
      test_connector(&temp_dir),
      RepositoryConfig {
         command_timeout: Some(Duration::from_millis(50)),
      },
   );

   // Unbounded row generator
   let err = repo
      .get_list_as::<(i64,)>(
         "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) SELECT x FROM c",
         &Params::new(),
         None,
      )
      .await
      .unwrap_err();
   assert!(matches!(err, Error::Timeout { after, .. } if after == Duration::from_millis(50)));
}

// ─── Paging ───

#[tokio::test]
async fn count_mode_reports_totals() {
   let (repo, _temp) = create_test_repo().await;
   seed_users(&repo, 101).await;

   let query = PageQuery::new("SELECT * FROM Users", 1, 20).order_by("ORDER BY Id");
   let page = repo.page_list(&query, &Params::new(), None).await.unwrap();

   assert_eq!((page.page, page.psize), (1, 20));
   assert_eq!((page.total_count(), page.page_count()), (101, 6));
   assert_eq!(page.items.len(), 20);
   assert_eq!(page.items[0].id, Some(1));
   assert!(!page.has_next());

   // Last page holds the remainder
   let query = PageQuery::new("SELECT * FROM Users", 6, 20).order_by("ORDER BY Id");
   let page = repo.page_list(&query, &Params::new(), None).await.unwrap();
   assert_eq!(page.items.len(), 1);
   assert_eq!(page.items[0].name, "user101");
}

#[tokio::test]
async fn page_past_the_end_is_clamped() {
   let (repo, _temp) = create_test_repo().await;
   seed_users(&repo, 101).await;

   let query = PageQuery::new("SELECT * FROM Users", 9, 20).order_by("ORDER BY Id");
   let page = repo.page_list(&query, &Params::new(), None).await.unwrap();

   assert_eq!(page.page, 6);
   assert!(page.items.is_empty());
}

#[tokio::test]
async fn out_of_range_page_and_size_are_clamped_to_one() {
   let (repo, _temp) = create_test_repo().await;
   seed_users(&repo, 3).await;

   let query = PageQuery::new("SELECT * FROM Users", 0, -1).order_by("ORDER BY Id");
   let page = repo.page_list(&query, &Params::new(), None).await.unwrap();

   assert_eq!((page.page, page.psize), (1, 1));
   assert_eq!(page.items.len(), 1);
   assert_eq!(page.page_count(), 3);
}

#[tokio::test]
async fn empty_result_has_zero_pages() {
   let (repo, _temp) = create_test_repo().await;

   let query = PageQuery::new("SELECT * FROM Users", 1, 10);
   let page = repo.page_list(&query, &Params::new(), None).await.unwrap();

   assert_eq!((page.page, page.total_count(), page.page_count()), (0, 0, 0));
   assert!(page.items.is_empty());
}

#[tokio::test]
async fn peek_mode_detects_next_page() {
   let (repo, _temp) = create_test_repo().await;
   seed_users(&repo, 11).await;

   let query = PageQuery::new("SELECT * FROM Users", 1, 10)
      .order_by("ORDER BY Id")
      .peek(true);
   let page = repo.page_list(&query, &Params::new(), None).await.unwrap();
   assert!(page.has_next());
   assert_eq!(page.items.len(), 10);
   assert_eq!((page.total_count(), page.page_count()), (0, 0));

   repo
      .execute("DELETE FROM Users WHERE Id = 11", &Params::new(), None)
      .await
      .unwrap();
   let page = repo.page_list(&query, &Params::new(), None).await.unwrap();
   assert!(!page.has_next());
   assert_eq!(page.items.len(), 10);
}

#[tokio::test]
async fn paging_with_filter_parameters() {
   let (repo, _temp) = create_test_repo().await;
   seed_users(&repo, 30).await;

   let query = PageQuery::new("SELECT * FROM Users WHERE Id > :after", 2, 5).order_by("ORDER BY Id DESC");
   let page = repo
      .page_list(&query, &Params::new().with("after", 10), None)
      .await
      .unwrap();

   let ids: Vec<i64> = page.items.iter().filter_map(|u| u.id).collect();
   assert_eq!(ids, vec![25, 24, 23, 22, 21]);
   assert_eq!((page.total_count(), page.page_count()), (20, 4));
}

#[tokio::test]
async fn grouped_paging_counts_groups() {
   let (repo, _temp) = create_test_repo().await;
   seed_orders(&repo).await;

   let query = PageQuery::new("SELECT CustomerId, COUNT(*) AS n FROM Orders GROUP BY Total", 2, 1)
      .order_by("ORDER BY Total");
   let page: Page<(i64, i64)> = repo
      .page_list_with(&query, &Params::new(), &EntityRows, None)
      .await
      .unwrap();

   assert_eq!(page.page, 2);
   assert_eq!((page.total_count(), page.page_count()), (3, 3));
   assert_eq!(page.items, vec![(1, 1)]);
}

#[tokio::test]
async fn paging_accepts_a_trailing_comment() {
   let (repo, _temp) = create_test_repo().await;
   seed_users(&repo, 3).await;

   let query = PageQuery::new("SELECT * FROM Users -- all users", 1, 2).order_by("ORDER BY Id");
   let page = repo.page_list(&query, &Params::new(), None).await.unwrap();

   assert_eq!(page.items.len(), 2);
   assert_eq!((page.total_count(), page.page_count()), (3, 2));
}

#[tokio::test]
async fn paging_serializes_with_wire_names() {
   let (repo, _temp) = create_test_repo().await;
   seed_users(&repo, 3).await;

   let query = PageQuery::new("SELECT Id, Name FROM Users", 2, 2).order_by("ORDER BY Id");
   let page = repo
      .page_list_with(&query, &Params::new(), &NamesOnly, None)
      .await
      .unwrap();

   assert_eq!(
      serde_json::to_value(&page).unwrap(),
      serde_json::json!({ "page": 2, "psize": 2, "totalcount": 3, "pagecount": 2, "Items": ["user003"] })
   );
}

/// Reads the `Name` column of every row.
struct NamesOnly;

impl RowMapper<String> for NamesOnly {
   fn map_row(&self, row: &sqlx::sqlite::SqliteRow) -> Result<String, sqlx::Error> {
      RowSegment::whole(row).get_named("name")
   }
}

// ─── Multi-Table Mapping ───

#[tokio::test]
async fn two_way_join_splits_on_id() {
   let (repo, _temp) = create_test_repo().await;
   seed_orders(&repo).await;

   let mapper = Join2::new("Id", |order: Order, customer: Customer| (order, customer));
   let rows = repo
      .get_list_with(
         &format!("{ORDERS_WITH_CUSTOMERS} ORDER BY o.Id"),
         &Params::new(),
         &mapper,
         None,
      )
      .await
      .unwrap();

   assert_eq!(rows.len(), 3);
   assert_eq!(rows[0].0, Order { id: 10, total: 25.5 });
   assert_eq!(
      rows[0].1,
      Customer {
         id: 1,
         name: "Ada".into(),
      }
   );
   assert_eq!(rows[1].1.name, "Grace");
}

#[tokio::test]
async fn three_way_join_with_optional_component() {
   let (repo, _temp) = create_test_repo().await;
   seed_orders(&repo).await;

   let mapper = Join3::new(
      "Id",
      |order: Order, customer: Customer, shipment: Option<Shipment>| {
         (order.id, customer.name, shipment.map(|s| s.carrier))
      },
   );
   let rows = repo
      .get_list_with(
         "SELECT o.Id, o.Total, c.Id, c.Name, s.Id, s.Carrier FROM Orders o \
          JOIN Customers c ON c.Id = o.CustomerId \
          LEFT JOIN Shipments s ON s.OrderId = o.Id ORDER BY o.Id",
         &Params::new(),
         &mapper,
         None,
      )
      .await
      .unwrap();

   assert_eq!(
      rows,
      vec![
         (10, "Ada".to_string(), Some("post".to_string())),
         (11, "Grace".to_string(), None),
         (12, "Ada".to_string(), Some("courier".to_string())),
      ]
   );
}

#[tokio::test]
async fn paged_join_uses_the_outer_from() {
   let (repo, _temp) = create_test_repo().await;
   seed_orders(&repo).await;

   let mapper = Join2::new("Id", |order: Order, customer: Customer| {
      (order.id, order.total, customer.id)
   });
   let query = PageQuery::new(
      "SELECT o.Id, (SELECT MAX(Total) FROM Orders) AS Total, c.Id, c.Name \
       FROM Orders o JOIN Customers c ON c.Id = o.CustomerId WHERE c.Name = :name",
      1,
      1,
   )
   .order_by("ORDER BY o.Id DESC");
   let page = repo
      .page_list_with(&query, &Params::new().with("name", "Ada"), &mapper, None)
      .await
      .unwrap();

   assert_eq!(page.items, vec![(12, 99.9, 1)]);
   assert_eq!((page.total_count(), page.page_count()), (2, 2));
}

#[tokio::test]
async fn missing_split_column_is_a_data_access_error() {
   let (repo, _temp) = create_test_repo().await;
   seed_orders(&repo).await;

   let mapper = Join2::new("CustomerKey", |order: Order, customer: Customer| (order, customer));
   let err = repo
      .get_list_with(ORDERS_WITH_CUSTOMERS, &Params::new(), &mapper, None)
      .await
      .unwrap_err();

   assert!(matches!(
      err,
      Error::DataAccess {
         source: sqlx::Error::ColumnNotFound(_),
         ..
      }
   ));
}

// ─── Transactions ───

#[tokio::test]
async fn calls_share_a_caller_transaction() {
   let (repo, _temp) = create_test_repo().await;

   let mut conn = repo.connector().acquire().await.unwrap();
   let mut tx = conn.begin().await.unwrap();

   let id = repo
      .insert(Some(&User::new("Ada", None)), Some(&mut *tx))
      .await
      .unwrap();
   // Visible inside the transaction
   assert!(repo.get(id, Some(&mut *tx)).await.unwrap().is_some());

   tx.rollback().await.unwrap();
   conn.close().await.unwrap();

   assert_eq!(repo.get(id, None).await.unwrap(), None);
}

#[tokio::test]
async fn committed_transaction_is_visible_to_later_calls() {
   let (repo, _temp) = create_test_repo().await;

   let mut conn = repo.connector().acquire().await.unwrap();
   let mut tx = conn.begin().await.unwrap();
   repo.insert(Some(&User::new("Ada", None)), Some(&mut *tx)).await.unwrap();
   repo.insert(Some(&User::new("Grace", None)), Some(&mut *tx)).await.unwrap();
   tx.commit().await.unwrap();
   conn.close().await.unwrap();

   let count: Option<i64> = repo
      .execute_scalar("SELECT COUNT(*) FROM Users", &Params::new(), None)
      .await
      .unwrap();
   assert_eq!(count, Some(2));
}

#[tokio::test]
async fn paging_inside_a_transaction() {
   let (repo, _temp) = create_test_repo().await;

   let mut conn = repo.connector().acquire().await.unwrap();
   let mut tx = conn.begin().await.unwrap();
   for name in ["a", "b", "c"] {
      repo.insert(Some(&User::new(name, None)), Some(&mut *tx)).await.unwrap();
   }

   let query = PageQuery::new("SELECT * FROM Users", 2, 2).order_by("ORDER BY Name");
   let page = repo.page_list(&query, &Params::new(), Some(&mut *tx)).await.unwrap();
   assert_eq!(page.items.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(), vec!["c"]);
   assert_eq!(page.total_count(), 3);

   drop(tx);
   conn.close().await.unwrap();
}
