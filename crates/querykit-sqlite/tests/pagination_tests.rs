use std::sync::Arc;

use querykit_core::{
   BackwardOrder, CursorOptions, CursorPager, CursorState, CursorToken, Join, OffsetEnvelope,
   Predicate, Preload, QueryModifier, SelectQuery, SortOrder, Value, is_in,
};
use querykit_sqlite::{Error, Row, SqliteDatabase};
use serde_json::json;
use tempfile::TempDir;

async fn create_test_db() -> (Arc<SqliteDatabase>, TempDir) {
   let _ = tracing_subscriber::fmt().with_test_writer().try_init();

   let temp_dir = TempDir::new().expect("Failed to create temp directory");
   let db_path = temp_dir.path().join("test.db");
   let db = SqliteDatabase::connect(&db_path, None)
      .await
      .expect("Failed to connect to test database");

   (db, temp_dir)
}

/// Seed 3 categories and 25 products.
///
/// ```text
/// product id | category_id      | quantity | status
/// -----------|------------------|----------|----------------------------------
///  1..=25    | (id - 1) % 3 + 1 | id % 4   | Discontinued when id % 5 == 0
/// ```
async fn seed(db: &SqliteDatabase) {
   db.execute(
      "CREATE TABLE categories (id INTEGER PRIMARY KEY, name TEXT NOT NULL)".into(),
      vec![],
   )
   .await
   .unwrap();
   db.execute(
      "CREATE TABLE products (id INTEGER PRIMARY KEY, name TEXT NOT NULL, category_id INTEGER NOT NULL, price INTEGER NOT NULL, quantity INTEGER NOT NULL, status TEXT NOT NULL)".into(),
      vec![],
   )
   .await
   .unwrap();

   for (id, name) in [(1, "Phones"), (2, "Laptops"), (3, "Tablets")] {
      db.execute(
         "INSERT INTO categories (id, name) VALUES (?, ?)".into(),
         vec![Value::from(id), Value::from(name)],
      )
      .await
      .unwrap();
   }

   for id in 1..=25i64 {
      let status = if id % 5 == 0 { "Discontinued" } else { "Available" };
      db.execute(
         "INSERT INTO products (id, name, category_id, price, quantity, status) VALUES (?, ?, ?, ?, ?, ?)".into(),
         vec![
            Value::from(id),
            Value::from(format!("Product {id:02}")),
            Value::from((id - 1) % 3 + 1),
            Value::from(id * 100),
            Value::from(id % 4),
            Value::from(status),
         ],
      )
      .await
      .unwrap();
   }
}

fn ids(rows: &[Row]) -> Vec<i64> {
   rows.iter().map(|r| r["id"].as_i64().unwrap()).collect()
}

fn pager(sort: SortOrder, limit: u64, token: Option<String>, options: CursorOptions) -> CursorPager {
   CursorPager::new(CursorState::new("id", sort, limit, token), options).unwrap()
}

fn decode(token: &str) -> CursorToken {
   CursorToken::decode(token, "id").unwrap()
}

// ─── Cursor Pagination ───

#[tokio::test]
async fn cursor_walk_forward_and_back() {
   let (db, _temp) = create_test_db().await;
   seed(&db).await;
   let products = || SelectQuery::table("products");
   let options = CursorOptions::default();

   // ── Page 1 ──
   //    SELECT * FROM products ORDER BY id ASC LIMIT 11
   let page1 = db
      .fetch_cursor_page(products(), pager(SortOrder::Asc, 10, None, options))
      .await
      .unwrap();
   assert_eq!(ids(&page1.rows), (1..=10).collect::<Vec<_>>());
   assert!(page1.has_more);
   assert!(page1.pagination.prev.is_empty());
   assert_eq!(
      decode(&page1.pagination.next),
      CursorToken::new(Value::Int(10), true)
   );

   // ── Page 2 ──
   //    SELECT * FROM products WHERE id > ? ORDER BY id ASC LIMIT 11   bind: [10]
   let page2 = db
      .fetch_cursor_page(
         products(),
         pager(SortOrder::Asc, 10, Some(page1.pagination.next.clone()), options),
      )
      .await
      .unwrap();
   assert_eq!(ids(&page2.rows), (11..=20).collect::<Vec<_>>());
   assert_eq!(
      decode(&page2.pagination.prev),
      CursorToken::new(Value::Int(11), false)
   );

   // ── Back to page 1 ──
   //    SELECT * FROM products WHERE id < ? ORDER BY id DESC LIMIT 11   bind: [11]
   let back = db
      .fetch_cursor_page(
         products(),
         pager(SortOrder::Asc, 10, Some(page2.pagination.prev.clone()), options),
      )
      .await
      .unwrap();
   assert_eq!(ids(&back.rows), (1..=10).rev().collect::<Vec<_>>());
   assert!(back.pagination.prev.is_empty());
   assert_eq!(back.pagination.next, page1.pagination.next);

   // ── Page 3 (last) ──
   let page3 = db
      .fetch_cursor_page(
         products(),
         pager(SortOrder::Asc, 10, Some(page2.pagination.next), options),
      )
      .await
      .unwrap();
   assert_eq!(ids(&page3.rows), (21..=25).collect::<Vec<_>>());
   assert!(!page3.has_more);
   assert!(page3.pagination.next.is_empty());
   assert_eq!(
      decode(&page3.pagination.prev),
      CursorToken::new(Value::Int(21), false)
   );

   db.remove().await.unwrap();
}

#[tokio::test]
async fn cursor_backward_rows_can_be_restored() {
   let (db, _temp) = create_test_db().await;
   seed(&db).await;

   let options = CursorOptions {
      backward_order: BackwardOrder::Restored,
      ..Default::default()
   };
   let token = CursorToken::new(Value::Int(21), false).encode("id").unwrap();
   let page = db
      .fetch_cursor_page(
         SelectQuery::table("products"),
         pager(SortOrder::Asc, 10, Some(token), options),
      )
      .await
      .unwrap();

   assert_eq!(ids(&page.rows), (11..=20).collect::<Vec<_>>());
   assert_eq!(
      decode(&page.pagination.prev),
      CursorToken::new(Value::Int(11), false)
   );
   assert_eq!(
      decode(&page.pagination.next),
      CursorToken::new(Value::Int(20), true)
   );

   db.remove().await.unwrap();
}

#[tokio::test]
async fn cursor_descending_with_filter() {
   let (db, _temp) = create_test_db().await;
   seed(&db).await;

   let available = || SelectQuery::table("products").filter(Predicate::equal("status", "Available"));

   // Available ids descending: 24 23 22 21 19 18 17 16 14 ...
   let page1 = db
      .fetch_cursor_page(
         available(),
         pager(SortOrder::Desc, 4, None, CursorOptions::default()),
      )
      .await
      .unwrap();
   assert_eq!(ids(&page1.rows), vec![24, 23, 22, 21]);

   let page2 = db
      .fetch_cursor_page(
         available(),
         pager(SortOrder::Desc, 4, Some(page1.pagination.next), CursorOptions::default()),
      )
      .await
      .unwrap();
   assert_eq!(ids(&page2.rows), vec![19, 18, 17, 16]);
   assert_eq!(
      decode(&page2.pagination.prev),
      CursorToken::new(Value::Int(19), false)
   );

   db.remove().await.unwrap();
}

#[tokio::test]
async fn cursor_blank_token_is_first_page() {
   let (db, _temp) = create_test_db().await;
   seed(&db).await;

   let page = db
      .fetch_cursor_page(
         SelectQuery::table("products"),
         pager(SortOrder::Asc, 5, Some("\"\"".into()), CursorOptions::default()),
      )
      .await
      .unwrap();
   assert_eq!(ids(&page.rows), vec![1, 2, 3, 4, 5]);

   db.remove().await.unwrap();
}

// ─── Offset Pagination ───

#[tokio::test]
async fn offset_pages() {
   let (db, _temp) = create_test_db().await;
   seed(&db).await;

   let page = db
      .fetch_offset_page(SelectQuery::table("products"), 2, 10)
      .order_by(["id"])
      .sort_order(SortOrder::Desc)
      .await
      .unwrap();
   assert_eq!(ids(&page.rows), (6..=15).rev().collect::<Vec<_>>());
   assert_eq!(
      page.pagination,
      OffsetEnvelope {
         current_page: 2,
         per_page: 10,
         total_page: 3,
      }
   );

   let last = db
      .fetch_offset_page(SelectQuery::table("products"), 3, 10)
      .order_by(["id"])
      .sort_order(SortOrder::Desc)
      .await
      .unwrap();
   assert_eq!(ids(&last.rows), vec![5, 4, 3, 2, 1]);

   // Past the end: empty rows, metadata still reported
   let beyond = db
      .fetch_offset_page(SelectQuery::table("products"), 9, 10)
      .order_by(["id"])
      .await
      .unwrap();
   assert!(beyond.rows.is_empty());
   assert_eq!(beyond.pagination.total_page, 3);

   db.remove().await.unwrap();
}

#[tokio::test]
async fn offset_total_pages_respect_filter() {
   let (db, _temp) = create_test_db().await;
   seed(&db).await;

   let query = SelectQuery::table("products").filter(Predicate::equal("status", "Discontinued"));
   let page = db
      .fetch_offset_page(query, 1, 2)
      .order_by(["category_id", "id"])
      .await
      .unwrap();

   // Discontinued: 5 (cat 2), 10 (cat 1), 15 (cat 3), 20 (cat 2), 25 (cat 1)
   assert_eq!(ids(&page.rows), vec![10, 25]);
   assert_eq!(page.pagination.total_page, 3);

   db.remove().await.unwrap();
}

#[tokio::test]
async fn offset_rejects_page_zero() {
   let (db, _temp) = create_test_db().await;
   seed(&db).await;

   let err = db
      .fetch_offset_page(SelectQuery::table("products"), 0, 10)
      .order_by(["id"])
      .await
      .unwrap_err();
   assert_eq!(err.error_code(), "INVALID_PAGE_NUMBER");

   db.remove().await.unwrap();
}

// ─── Modifiers, Joins, Preloads ───

#[tokio::test]
async fn join_with_projection() {
   let (db, _temp) = create_test_db().await;
   seed(&db).await;

   let query = SelectQuery::table("products")
      .apply(
         QueryModifier::new()
            .select(["products.id", "categories.name AS category"])
            .filter(Predicate::equal("categories.name", "Laptops"))
            .order_by("products.id", SortOrder::Asc)
            .limit(3)
            .associate(Join::inner(
               "categories",
               [Predicate::raw("categories.id = products.category_id", vec![])],
            )),
      )
      .unwrap();

   let rows = db.fetch_all(query).await.unwrap();
   assert_eq!(ids(&rows), vec![2, 5, 8]);
   assert_eq!(rows[0]["category"], json!("Laptops"));
   assert_eq!(rows[0].len(), 2);

   db.remove().await.unwrap();
}

#[tokio::test]
async fn omit_projection_is_resolved_from_schema() {
   let (db, _temp) = create_test_db().await;
   seed(&db).await;

   let query = SelectQuery::table("products")
      .apply(QueryModifier::new().omit(["price", "quantity"]).limit(1))
      .unwrap();
   let rows = db.fetch_all(query).await.unwrap();

   let columns: Vec<&str> = rows[0].keys().map(String::as_str).collect();
   assert_eq!(columns, vec!["id", "name", "category_id", "status"]);

   db.remove().await.unwrap();
}

#[tokio::test]
async fn preloads_attach_children_per_parent() {
   let (db, _temp) = create_test_db().await;
   seed(&db).await;

   let query = SelectQuery::table("categories")
      .apply(
         QueryModifier::new()
            .order_by("id", SortOrder::Asc)
            .associate(
               Preload::new("products", "category_id", "id")
                  .filter([Predicate::equal("status", "Available")])
                  .order_by("id", SortOrder::Asc),
            ),
      )
      .unwrap();

   let rows = db.fetch_all(query).await.unwrap();
   assert_eq!(rows.len(), 3);

   let phones: Vec<i64> = rows[0]["products"]
      .as_array()
      .unwrap()
      .iter()
      .map(|p| p["id"].as_i64().unwrap())
      .collect();
   assert_eq!(phones, vec![1, 4, 7, 13, 16, 19, 22]);

   // The preload filter never reaches the parent query
   assert_eq!(rows[1]["name"], json!("Laptops"));

   db.remove().await.unwrap();
}

#[tokio::test]
async fn preload_limit_caps_total_children() {
   let (db, _temp) = create_test_db().await;
   seed(&db).await;

   let query = SelectQuery::table("categories")
      .apply(
         QueryModifier::new()
            .order_by("id", SortOrder::Asc)
            .associate(Preload::new("products", "category_id", "id").order_by("id", SortOrder::Asc)),
      )
      .unwrap();

   let rows = db.fetch_all(query).preload_limit(2).await.unwrap();
   let counts: Vec<usize> = rows
      .iter()
      .map(|r| r["products"].as_array().unwrap().len())
      .collect();
   assert_eq!(counts, vec![1, 1, 0]);

   db.remove().await.unwrap();
}

#[tokio::test]
async fn in_predicates_and_count() {
   let (db, _temp) = create_test_db().await;
   seed(&db).await;

   let query = SelectQuery::table("products").filter(Predicate::and([
      is_in!("category_id", [1, 3]),
      Predicate::or([
         Predicate::equal("quantity", 0),
         Predicate::between("id", 1, 3),
      ]),
   ]));

   // category 1 or 3 and (quantity 0 or id 1..=3): 1, 3, 4, 12, 16, 24
   assert_eq!(db.count(&query).await.unwrap(), 6);
   let rows = db
      .fetch_all(query.apply(QueryModifier::new().order_by("id", SortOrder::Asc)).unwrap())
      .await
      .unwrap();
   assert_eq!(ids(&rows), vec![1, 3, 4, 12, 16, 24]);

   let none = SelectQuery::table("products").filter(Predicate::is_in("id", Vec::<i64>::new()));
   assert_eq!(db.count(&none).await.unwrap(), 0);

   db.remove().await.unwrap();
}

// ─── Errors ───

#[tokio::test]
async fn unknown_field_surfaces_as_backend_error() {
   let (db, _temp) = create_test_db().await;
   seed(&db).await;

   let err = db
      .fetch_all(SelectQuery::table("products").filter(Predicate::equal("no_such_field", 1)))
      .await
      .unwrap_err();
   assert!(matches!(err, Error::Sqlx(_)));

   db.remove().await.unwrap();
}

#[tokio::test]
async fn malformed_token_is_rejected() {
   let result = CursorPager::new(
      CursorState::new("id", SortOrder::Asc, 10, Some("not-a-token".into())),
      CursorOptions::default(),
   );
   let err = Error::from(result.unwrap_err());
   assert_eq!(err.error_code(), "MALFORMED_CURSOR_TOKEN");
}

#[tokio::test]
async fn cursor_page_rejects_preordered_base_query() {
   let (db, _temp) = create_test_db().await;
   seed(&db).await;

   let query = SelectQuery::table("products")
      .apply(
         QueryModifier::new()
            .order_by("name", SortOrder::Asc)
            .offset(3),
      )
      .unwrap();
   let err = db
      .fetch_cursor_page(query, pager(SortOrder::Asc, 5, None, CursorOptions::default()))
      .await
      .unwrap_err();
   assert_eq!(err.error_code(), "INVALID_PAGINATION_QUERY");

   db.remove().await.unwrap();
}

#[tokio::test]
async fn offset_page_rejects_preordered_base_query() {
   let (db, _temp) = create_test_db().await;
   seed(&db).await;

   let query = SelectQuery::table("products")
      .apply(QueryModifier::new().order_by("name", SortOrder::Desc))
      .unwrap();
   let err = db
      .fetch_offset_page(query, 1, 10)
      .order_by(["id"])
      .await
      .unwrap_err();
   assert_eq!(err.error_code(), "INVALID_PAGINATION_QUERY");

   let limited = SelectQuery::table("products")
      .apply(QueryModifier::new().limit(3))
      .unwrap();
   let err = db
      .fetch_offset_page(limited, 1, 10)
      .order_by(["id"])
      .await
      .unwrap_err();
   assert_eq!(err.error_code(), "INVALID_PAGINATION_QUERY");

   db.remove().await.unwrap();
}

#[tokio::test]
async fn closed_database_rejects_queries() {
   let (db, _temp) = create_test_db().await;
   seed(&db).await;

   db.close().await.unwrap();
   let err = db.fetch_all(SelectQuery::table("products")).await.unwrap_err();
   assert!(matches!(err, Error::DatabaseClosed));
}

#[tokio::test]
async fn decodes_nulls_and_blobs() {
   let (db, _temp) = create_test_db().await;
   db.execute(
      "CREATE TABLE t (id INTEGER PRIMARY KEY, txt TEXT, num REAL, data BLOB)".into(),
      vec![],
   )
   .await
   .unwrap();
   db.execute(
      "INSERT INTO t (id, txt, num, data) VALUES (1, NULL, 1.5, X'48656C6C6F')".into(),
      vec![],
   )
   .await
   .unwrap();

   let rows = db.fetch_all(SelectQuery::table("t")).await.unwrap();
   assert_eq!(rows[0]["txt"], json!(null));
   assert_eq!(rows[0]["num"], json!(1.5));
   assert_eq!(rows[0]["data"], json!("SGVsbG8="));

   db.remove().await.unwrap();
}
