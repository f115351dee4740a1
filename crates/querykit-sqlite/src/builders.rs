//! Query builders that execute query descriptions

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

use querykit_core::{
   CursorPage, CursorPager, OffsetPage, OffsetPager, Preload, SelectQuery, SortOrder, Value,
};
use serde_json::Value as JsonValue;
use tracing::{debug, trace};

use crate::decode::{Row, bind_all, decode_rows};
use crate::{Error, Result, SqliteDatabase};

/// Render `query` (resolving any omit projection) and fetch its rows,
/// without preloads.
async fn fetch_rows(db: &SqliteDatabase, query: &SelectQuery) -> Result<Vec<Row>> {
   let pool = db.read_pool()?;
   let (sql, params) = query.to_sql()?;
   debug!(sql = %sql, params = params.len(), "Fetching rows");
   let rows = bind_all(&sql, params).fetch_all(pool).await?;
   let decoded = decode_rows(rows)?;
   trace!(count = decoded.len(), "Decoded rows");
   Ok(decoded)
}

/// Run each preload once for the whole set of parent rows and attach the
/// matching children to every parent under the preload's table name.
async fn attach_preloads(db: &SqliteDatabase, preloads: &[Preload], rows: &mut [Row]) -> Result<()> {
   for preload in preloads {
      let local_key = preload.local_key();

      let mut keys: Vec<Value> = Vec::new();
      for row in rows.iter() {
         let raw = row
            .get(local_key)
            .ok_or_else(|| Error::PreloadKeyNotFound {
               column: local_key.to_string(),
            })?;
         if let Some(key) = Value::from_json(raw)
            && !keys.contains(&key)
         {
            keys.push(key);
         }
      }

      let children = if keys.is_empty() {
         Vec::new()
      } else {
         let (sql, params) = preload.to_sql(&keys);
         db.fetch_sql(sql, params).await?
      };

      debug!(
         table = preload.table(),
         parents = rows.len(),
         children = children.len(),
         "Attaching preload"
      );

      for row in rows.iter_mut() {
         let key = row.get(local_key).cloned().unwrap_or(JsonValue::Null);
         let matched: Vec<JsonValue> = if key.is_null() {
            Vec::new()
         } else {
            children
               .iter()
               .filter(|child| child.get(preload.foreign_key()) == Some(&key))
               .map(|child| {
                  JsonValue::Object(child.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
               })
               .collect()
         };
         row.insert(preload.table().to_string(), JsonValue::Array(matched));
      }
   }
   Ok(())
}

/// Builder for SELECT queries returning every matching row
pub struct FetchAllBuilder {
   db: Arc<SqliteDatabase>,
   query: SelectQuery,
}

impl FetchAllBuilder {
   pub(crate) fn new(db: Arc<SqliteDatabase>, query: SelectQuery) -> Self {
      Self { db, query }
   }

   /// Cap every preload without an explicit limit.
   pub fn preload_limit(mut self, limit: u64) -> Self {
      self.query = self.query.default_preload_limit(limit);
      self
   }

   /// Execute the query and return all matching rows
   pub async fn execute(self) -> Result<Vec<Row>> {
      let query = self.db.resolve_projection(self.query).await?;
      let mut rows = fetch_rows(&self.db, &query).await?;
      attach_preloads(&self.db, query.preloads(), &mut rows).await?;
      Ok(rows)
   }
}

impl IntoFuture for FetchAllBuilder {
   type Output = Result<Vec<Row>>;
   type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

   fn into_future(self) -> Self::IntoFuture {
      Box::pin(self.execute())
   }
}

/// Builder for keyset (cursor) paginated SELECT queries
pub struct FetchCursorPageBuilder {
   db: Arc<SqliteDatabase>,
   query: SelectQuery,
   pager: CursorPager,
}

impl FetchCursorPageBuilder {
   pub(crate) fn new(db: Arc<SqliteDatabase>, query: SelectQuery, pager: CursorPager) -> Self {
      Self { db, query, pager }
   }

   /// Cap every preload without an explicit limit.
   pub fn preload_limit(mut self, limit: u64) -> Self {
      self.query = self.query.default_preload_limit(limit);
      self
   }

   /// Fetch `limit + 1` rows from the seek position and build the page.
   ///
   /// Preloads run after trimming, so the probe row never triggers one.
   pub async fn execute(self) -> Result<CursorPage<Row>> {
      let query = self.pager.apply(self.query)?;
      let query = self.db.resolve_projection(query).await?;

      let rows = fetch_rows(&self.db, &query).await?;
      let mut page = self.pager.paginate(rows)?;
      attach_preloads(&self.db, query.preloads(), &mut page.rows).await?;

      debug!(
         rows = page.rows.len(),
         has_more = page.has_more,
         first_page = self.pager.is_first_page(),
         "Fetched cursor page"
      );
      Ok(page)
   }
}

impl IntoFuture for FetchCursorPageBuilder {
   type Output = Result<CursorPage<Row>>;
   type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

   fn into_future(self) -> Self::IntoFuture {
      Box::pin(self.execute())
   }
}

/// Builder for page-number paginated SELECT queries
pub struct FetchOffsetPageBuilder {
   db: Arc<SqliteDatabase>,
   query: SelectQuery,
   page: i64,
   per_page: u64,
   order_fields: Vec<String>,
   sort_order: SortOrder,
}

impl FetchOffsetPageBuilder {
   pub(crate) fn new(db: Arc<SqliteDatabase>, query: SelectQuery, page: i64, per_page: u64) -> Self {
      Self {
         db,
         query,
         page,
         per_page,
         order_fields: Vec::new(),
         sort_order: SortOrder::Asc,
      }
   }

   /// Fields to order by; the sort order applies to all of them.
   pub fn order_by<I, S>(mut self, fields: I) -> Self
   where
      I: IntoIterator<Item = S>,
      S: Into<String>,
   {
      self.order_fields = fields.into_iter().map(Into::into).collect();
      self
   }

   pub fn sort_order(mut self, sort_order: SortOrder) -> Self {
      self.sort_order = sort_order;
      self
   }

   /// Cap every preload without an explicit limit.
   pub fn preload_limit(mut self, limit: u64) -> Self {
      self.query = self.query.default_preload_limit(limit);
      self
   }

   /// Count matching rows, then fetch the requested page.
   pub async fn execute(self) -> Result<OffsetPage<Row>> {
      // Validate the base query and page before paying for the count
      self.query.validate_pagination_base()?;
      OffsetPager::new(self.page, 0, Vec::<String>::new())
         .limit(self.per_page)
         .offset()?;

      let total_records = self.db.count(&self.query).await?;
      let pager = OffsetPager::new(self.page, total_records, self.order_fields)
         .limit(self.per_page)
         .sort_order(self.sort_order);

      let query = self.query.apply(pager.modifier()?)?;
      let query = self.db.resolve_projection(query).await?;

      let mut rows = fetch_rows(&self.db, &query).await?;
      attach_preloads(&self.db, query.preloads(), &mut rows).await?;

      let pagination = pager.pagination()?;
      debug!(
         page = pagination.current_page,
         total_pages = pagination.total_page,
         total_records,
         "Fetched offset page"
      );
      Ok(OffsetPage { rows, pagination })
   }
}

impl IntoFuture for FetchOffsetPageBuilder {
   type Output = Result<OffsetPage<Row>>;
   type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

   fn into_future(self) -> Self::IntoFuture {
      Box::pin(self.execute())
   }
}
