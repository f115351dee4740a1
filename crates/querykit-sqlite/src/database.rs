//! SQLite database with a pooled read side and a serialized write side

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use querykit_core::{CursorPager, SelectQuery, Value};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Row as _, Sqlite};
use tracing::{debug, warn};

use crate::builders::{FetchAllBuilder, FetchCursorPageBuilder, FetchOffsetPageBuilder};
use crate::decode::{Row, bind_all, decode_rows};
use crate::{Error, Result, SqliteDatabaseConfig, WriteGuard, schema};

/// Result returned from write operations (e.g. INSERT, UPDATE, DELETE).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteQueryResult {
   /// The number of rows affected by the write operation.
   pub rows_affected: u64,
   /// The last inserted row ID (SQLite ROWID).
   pub last_insert_id: i64,
}

/// SQLite database that runs query descriptions.
///
/// ## Architecture
///
/// - **`read_pool`**: read-only connections for concurrent reads (defaults to 6)
/// - **`write_conn`**: single-connection pool, so writes are serialized
///
/// WAL journal mode is enabled lazily on the first write. After
/// [`SqliteDatabase::close`] every operation fails with
/// [`Error::DatabaseClosed`].
#[derive(Debug)]
pub struct SqliteDatabase {
   read_pool: Pool<Sqlite>,
   write_conn: Pool<Sqlite>,
   wal_initialized: AtomicBool,
   closed: AtomicBool,
   path: PathBuf,
}

impl SqliteDatabase {
   /// Open (creating if missing) the database file at `path`.
   pub async fn connect(
      path: impl AsRef<Path>,
      custom_config: Option<SqliteDatabaseConfig>,
   ) -> Result<Arc<Self>> {
      let config = custom_config.unwrap_or_default();
      let path = path.as_ref().to_path_buf();

      if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
         tokio::fs::create_dir_all(parent).await?;
      }

      // Writer first so the file exists before any read-only connection opens
      let write_conn = SqlitePoolOptions::new()
         .max_connections(1)
         .idle_timeout(config.idle_timeout)
         .connect_with(
            SqliteConnectOptions::new()
               .filename(&path)
               .create_if_missing(true)
               .busy_timeout(config.busy_timeout),
         )
         .await?;

      let read_pool = SqlitePoolOptions::new()
         .max_connections(config.max_read_connections.max(1))
         .idle_timeout(config.idle_timeout)
         .connect_lazy_with(
            SqliteConnectOptions::new()
               .filename(&path)
               .read_only(true)
               .busy_timeout(config.busy_timeout),
         );

      debug!(path = %path.display(), max_read_connections = config.max_read_connections, "Opened SQLite database");

      Ok(Arc::new(Self {
         read_pool,
         write_conn,
         wal_initialized: AtomicBool::new(false),
         closed: AtomicBool::new(false),
         path,
      }))
   }

   pub fn path(&self) -> &Path {
      &self.path
   }

   fn ensure_open(&self) -> Result<()> {
      if self.closed.load(Ordering::Acquire) {
         return Err(Error::DatabaseClosed);
      }
      Ok(())
   }

   /// Read-only pool for concurrent queries.
   pub fn read_pool(&self) -> Result<&Pool<Sqlite>> {
      self.ensure_open()?;
      Ok(&self.read_pool)
   }

   /// Wait for exclusive write access.
   pub async fn acquire_writer(&self) -> Result<WriteGuard> {
      self.ensure_open()?;
      let mut conn = self.write_conn.acquire().await?;

      if !self.wal_initialized.load(Ordering::Acquire) {
         sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&mut *conn)
            .await?;
         self.wal_initialized.store(true, Ordering::Release);
         debug!(path = %self.path.display(), "Enabled WAL journal mode");
      }

      Ok(WriteGuard::new(conn))
   }

   /// Run a write statement on the write connection.
   pub async fn execute(&self, query: String, values: Vec<Value>) -> Result<WriteQueryResult> {
      let mut writer = self.acquire_writer().await?;
      debug!(sql = %query, params = values.len(), "Executing write");
      let result = bind_all(&query, values).execute(&mut *writer).await?;
      Ok(WriteQueryResult {
         rows_affected: result.rows_affected(),
         last_insert_id: result.last_insert_rowid(),
      })
   }

   /// Run raw SQL on the read pool and decode the rows.
   pub async fn fetch_sql(&self, query: String, values: Vec<Value>) -> Result<Vec<Row>> {
      let pool = self.read_pool()?;
      debug!(sql = %query, params = values.len(), "Fetching rows");
      let rows = bind_all(&query, values).fetch_all(pool).await?;
      decode_rows(rows)
   }

   /// Column names of `table` in declaration order.
   pub async fn table_columns(&self, table: &str) -> Result<Vec<String>> {
      schema::table_columns(self.read_pool()?, table).await
   }

   /// Fill in the column list an omit projection needs.
   pub(crate) async fn resolve_projection(&self, query: SelectQuery) -> Result<SelectQuery> {
      if !query.needs_columns() {
         return Ok(query);
      }
      let columns = self.table_columns(query.table_name()).await?;
      Ok(query.with_columns(columns))
   }

   /// Number of rows `query` matches, ignoring its projection, order, and paging.
   pub async fn count(&self, query: &SelectQuery) -> Result<u64> {
      let pool = self.read_pool()?;
      let (sql, params) = query.count_sql();
      debug!(sql = %sql, params = params.len(), "Counting rows");
      let row = bind_all(&sql, params).fetch_one(pool).await?;
      let count: i64 = row.try_get("count")?;
      Ok(u64::try_from(count).unwrap_or_default())
   }

   /// Fetch every row `query` describes, with preloads attached.
   pub fn fetch_all(self: &Arc<Self>, query: SelectQuery) -> FetchAllBuilder {
      FetchAllBuilder::new(Arc::clone(self), query)
   }

   /// Fetch one keyset page of `query`.
   pub fn fetch_cursor_page(
      self: &Arc<Self>,
      query: SelectQuery,
      pager: CursorPager,
   ) -> FetchCursorPageBuilder {
      FetchCursorPageBuilder::new(Arc::clone(self), query, pager)
   }

   /// Fetch page `page` (1-based) of `query`, `per_page` rows at a time.
   pub fn fetch_offset_page(
      self: &Arc<Self>,
      query: SelectQuery,
      page: i64,
      per_page: u64,
   ) -> FetchOffsetPageBuilder {
      FetchOffsetPageBuilder::new(Arc::clone(self), query, page, per_page)
   }

   /// Close both pools. Subsequent operations fail with [`Error::DatabaseClosed`].
   pub async fn close(&self) -> Result<()> {
      if self.closed.swap(true, Ordering::AcqRel) {
         return Ok(());
      }

      if self.wal_initialized.load(Ordering::Acquire)
         && let Err(e) = sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.write_conn)
            .await
      {
         warn!(path = %self.path.display(), error = %e, "WAL checkpoint on close failed");
      }

      self.read_pool.close().await;
      self.write_conn.close().await;
      debug!(path = %self.path.display(), "Closed SQLite database");
      Ok(())
   }

   /// Close the database and delete its files.
   pub async fn remove(&self) -> Result<()> {
      self.close().await?;

      let mut wal = self.path.clone().into_os_string();
      wal.push("-wal");
      let mut shm = self.path.clone().into_os_string();
      shm.push("-shm");

      for file in [self.path.clone(), PathBuf::from(wal), PathBuf::from(shm)] {
         match tokio::fs::remove_file(&file).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
         }
      }
      Ok(())
   }
}
