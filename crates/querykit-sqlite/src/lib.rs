//! # querykit-sqlite
//!
//! Executes `querykit-core` query descriptions against SQLite with SQLx.
//!
//! ## Core Types
//!
//! - **[`SqliteDatabase`]**: Separate read and write pools plus the query entry points
//! - **[`SqliteDatabaseConfig`]**: Configuration for connection pool settings
//! - **[`WriteGuard`]**: Exclusive handle on the write connection
//! - **[`Row`]**: A decoded row, column name to JSON value, in column order
//! - **[`Error`]**: Error type for database operations
//!
//! ## Architecture
//!
//! - **Dual pools**: read-only pool (max 6 connections) and write pool (max 1 connection)
//! - **Lazy WAL mode**: Write-Ahead Logging enabled on first write
//! - **Preloads**: one extra query per preload for the whole page, never per row
//! - **Omit projections**: resolved through `PRAGMA table_info`
//!
//! ## Example
//!
//! ```no_run
//! use querykit_core::{CursorOptions, CursorPager, CursorState, Predicate, SelectQuery, SortOrder};
//! use querykit_sqlite::SqliteDatabase;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!    let db = SqliteDatabase::connect("shop.db", None).await?;
//!
//!    let query = SelectQuery::table("products").filter(Predicate::greater_than("quantity", 0));
//!    let pager = CursorPager::new(
//!       CursorState::new("id", SortOrder::Desc, 50, None),
//!       CursorOptions::default(),
//!    )?;
//!
//!    let page = db.fetch_cursor_page(query, pager).await?;
//!    println!("{}", serde_json::to_string(&page.pagination)?);
//!    Ok(())
//! }
//! ```

mod builders;
mod config;
mod database;
mod decode;
mod error;
mod schema;
mod write_guard;

pub use builders::{FetchAllBuilder, FetchCursorPageBuilder, FetchOffsetPageBuilder};
pub use config::SqliteDatabaseConfig;
pub use database::{SqliteDatabase, WriteQueryResult};
pub use decode::Row;
pub use error::{Error, Result};
pub use write_guard::WriteGuard;
