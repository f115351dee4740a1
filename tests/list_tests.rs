use std::sync::Arc;

use querykit::{ListParams, Lister, Pagination, PagingConfig};
use querykit_core::{
   BackwardOrder, CursorOptions, CursorToken, DecodeFailure, Predicate, Preload, QueryModifier,
   SelectQuery, SortOrder, Value,
};
use querykit_sqlite::SqliteDatabase;
use serde_json::{Value as JsonValue, json};
use tempfile::TempDir;

async fn create_lister(config: PagingConfig) -> (Lister, Arc<SqliteDatabase>, TempDir) {
   let temp_dir = TempDir::new().expect("Failed to create temp directory");
   let db = SqliteDatabase::connect(temp_dir.path().join("shop.db"), None)
      .await
      .expect("Failed to connect to test database");

   db.execute(
      "CREATE TABLE categories (id INTEGER PRIMARY KEY, name TEXT NOT NULL)".into(),
      vec![],
   )
   .await
   .unwrap();
   db.execute(
      "CREATE TABLE products (id INTEGER PRIMARY KEY, name TEXT NOT NULL, category_id INTEGER NOT NULL)".into(),
      vec![],
   )
   .await
   .unwrap();
   for (id, name) in [(1, "Phones"), (2, "Laptops")] {
      db.execute(
         "INSERT INTO categories (id, name) VALUES (?, ?)".into(),
         vec![Value::from(id), Value::from(name)],
      )
      .await
      .unwrap();
   }
   for id in 1..=25i64 {
      db.execute(
         "INSERT INTO products (id, name, category_id) VALUES (?, ?, ?)".into(),
         vec![
            Value::from(id),
            Value::from(format!("Product {id:02}")),
            Value::from(id % 2 + 1),
         ],
      )
      .await
      .unwrap();
   }

   (Lister::new(Arc::clone(&db), config), db, temp_dir)
}

fn params(json: JsonValue) -> ListParams {
   serde_json::from_value(json).unwrap()
}

fn ids(data: &[querykit_sqlite::Row]) -> Vec<i64> {
   data.iter().map(|r| r["id"].as_i64().unwrap()).collect()
}

fn products() -> SelectQuery {
   SelectQuery::table("products")
}

// ─── Cursor Mode ───

#[tokio::test]
async fn cursor_mode_defaults_to_descending_pages_of_fifty() {
   let (lister, db, _temp) = create_lister(PagingConfig::default()).await;

   let response = lister.list(products(), &params(json!({})), "id").await.unwrap();
   assert_eq!(ids(&response.data), (1..=25).rev().collect::<Vec<_>>());

   // Everything fits on one page, so there is nothing to link to
   let body = serde_json::to_value(&response).unwrap();
   assert_eq!(body["pagination"], json!({}));

   db.remove().await.unwrap();
}

#[tokio::test]
async fn cursor_mode_walks_forward_and_back() {
   let (lister, db, _temp) = create_lister(PagingConfig::default()).await;

   let page1 = lister
      .list(
         products(),
         &params(json!({"per_page": 10, "sort_order": "asc"})),
         "id",
      )
      .await
      .unwrap();
   assert_eq!(ids(&page1.data), (1..=10).collect::<Vec<_>>());
   let Pagination::Cursor(envelope1) = &page1.pagination else {
      panic!("expected cursor pagination");
   };
   assert_eq!(envelope1.next, "eyJpZCI6MTAsInBvaW50c19uZXh0Ijp0cnVlfQ==");

   let body = serde_json::to_value(&page1).unwrap();
   assert_eq!(
      body["pagination"],
      json!({"next": "eyJpZCI6MTAsInBvaW50c19uZXh0Ijp0cnVlfQ=="})
   );

   let page2 = lister
      .list(
         products(),
         &params(json!({"cursor": envelope1.next, "per_page": 10, "sort_order": "asc"})),
         "id",
      )
      .await
      .unwrap();
   assert_eq!(ids(&page2.data), (11..=20).collect::<Vec<_>>());
   let Pagination::Cursor(envelope2) = &page2.pagination else {
      panic!("expected cursor pagination");
   };
   assert_eq!(
      CursorToken::decode(&envelope2.prev, "id").unwrap(),
      CursorToken::new(Value::Int(11), false)
   );

   let back = lister
      .list(
         products(),
         &params(json!({"cursor": envelope2.prev, "per_page": 10, "sort_order": "asc"})),
         "id",
      )
      .await
      .unwrap();
   assert_eq!(ids(&back.data), (1..=10).rev().collect::<Vec<_>>());

   db.remove().await.unwrap();
}

#[tokio::test]
async fn cursor_mode_with_restored_backward_order() {
   let config = PagingConfig {
      cursor: CursorOptions {
         backward_order: BackwardOrder::Restored,
         ..Default::default()
      },
      ..Default::default()
   };
   let (lister, db, _temp) = create_lister(config).await;

   let token = CursorToken::new(Value::Int(11), false).encode("id").unwrap();
   let back = lister
      .list(
         products(),
         &params(json!({"cursor": token, "per_page": 10, "sort_order": "asc"})),
         "id",
      )
      .await
      .unwrap();
   assert_eq!(ids(&back.data), (1..=10).collect::<Vec<_>>());

   db.remove().await.unwrap();
}

#[tokio::test]
async fn malformed_cursor_follows_decode_policy() {
   let (strict, db, _temp) = create_lister(PagingConfig::default()).await;
   let request = params(json!({"cursor": "%%%", "per_page": 5}));

   let err = strict.list(products(), &request, "id").await.unwrap_err();
   assert_eq!(err.error_code(), "MALFORMED_CURSOR_TOKEN");
   assert!(err.is_client_error());

   let lenient = Lister::new(
      Arc::clone(&db),
      PagingConfig {
         cursor: CursorOptions {
            decode_failure: DecodeFailure::FirstPage,
            ..Default::default()
         },
         ..Default::default()
      },
   );
   let response = lenient.list(products(), &request, "id").await.unwrap();
   assert_eq!(ids(&response.data), vec![25, 24, 23, 22, 21]);

   db.remove().await.unwrap();
}

// ─── Offset Mode ───

#[tokio::test]
async fn page_parameter_selects_offset_mode() {
   let (lister, db, _temp) = create_lister(PagingConfig::default()).await;

   let response = lister
      .list(products(), &params(json!({"page": 2, "per_page": 10})), "id")
      .await
      .unwrap();
   assert_eq!(ids(&response.data), (6..=15).rev().collect::<Vec<_>>());

   let body = serde_json::to_value(&response).unwrap();
   assert_eq!(
      body["pagination"],
      json!({"current_page": 2, "per_page": 10, "total_page": 3})
   );

   db.remove().await.unwrap();
}

#[tokio::test]
async fn oversized_per_page_uses_default() {
   let (lister, db, _temp) = create_lister(PagingConfig::default()).await;

   let response = lister
      .list(products(), &params(json!({"page": 1, "per_page": 500})), "id")
      .await
      .unwrap();
   assert_eq!(response.data.len(), 25);
   assert_eq!(
      response.pagination,
      Pagination::Offset(querykit_core::OffsetEnvelope {
         current_page: 1,
         per_page: 50,
         total_page: 1,
      })
   );

   db.remove().await.unwrap();
}

#[tokio::test]
async fn page_zero_is_a_client_error() {
   let (lister, db, _temp) = create_lister(PagingConfig::default()).await;

   let err = lister
      .list(products(), &params(json!({"page": 0})), "id")
      .await
      .unwrap_err();
   assert_eq!(err.error_code(), "INVALID_PAGE_NUMBER");
   assert!(err.is_client_error());

   db.remove().await.unwrap();
}

// ─── Filters and Preloads ───

#[tokio::test]
async fn filters_and_preloads_flow_through() {
   let (lister, db, _temp) = create_lister(PagingConfig {
      preload_limit: 3,
      ..Default::default()
   })
   .await;

   let query = SelectQuery::table("categories")
      .filter(Predicate::like("name", "%o%"))
      .apply(
         QueryModifier::new()
            .associate(Preload::new("products", "category_id", "id").order_by("id", SortOrder::Asc)),
      )
      .unwrap();

   let response = lister
      .list(query, &params(json!({"sort_order": "asc"})), "id")
      .await
      .unwrap();

   // Both names contain "o"; preload capped at three products overall
   assert_eq!(ids(&response.data), vec![1, 2]);
   let preloaded: usize = response
      .data
      .iter()
      .map(|c| c["products"].as_array().unwrap().len())
      .sum();
   assert_eq!(preloaded, 3);

   db.remove().await.unwrap();
}

#[tokio::test]
async fn unknown_key_field_is_a_backend_error() {
   let (lister, db, _temp) = create_lister(PagingConfig::default()).await;

   let err = lister
      .list(products(), &params(json!({})), "no_such_field")
      .await
      .unwrap_err();
   assert!(!err.is_client_error());

   db.remove().await.unwrap();
}

#[tokio::test]
async fn projection_without_key_field_is_a_backend_error() {
   let (lister, db, _temp) = create_lister(PagingConfig::default()).await;

   let query = products()
      .apply(QueryModifier::new().select(["name"]))
      .unwrap();
   let err = lister.list(query, &params(json!({})), "id").await.unwrap_err();
   assert_eq!(err.error_code(), "CURSOR_COLUMN_NOT_FOUND");
   assert!(!err.is_client_error());

   db.remove().await.unwrap();
}
