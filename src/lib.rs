//! # querykit
//!
//! List endpoints over SQLite with composable filters and two paging modes:
//! page numbers (`page`, `per_page`) and opaque cursors (`cursor`).
//!
//! Predicates, modifiers, and the pagers live in [`querykit_core`]; query
//! execution lives in [`querykit_sqlite`]. This crate turns request
//! parameters into one or the other paging mode and shapes the response:
//!
//! ```json
//! {"data": [...], "pagination": {"next": "...", "prev": "..."}}
//! {"data": [...], "pagination": {"current_page": 2, "per_page": 10, "total_page": 3}}
//! ```
//!
//! # Example
//!
//! ```no_run
//! use querykit::{ListParams, Lister, PagingConfig};
//! use querykit_core::{Predicate, SelectQuery};
//! use querykit_sqlite::SqliteDatabase;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let db = SqliteDatabase::connect("shop.db", None).await?;
//! let lister = Lister::new(db, PagingConfig::default());
//!
//! let params: ListParams = serde_json::from_str(r#"{"per_page": 20}"#)?;
//! let query = SelectQuery::table("products").filter(Predicate::like("name", "%phone%"));
//! let response = lister.list(query, &params, "id").await?;
//! println!("{}", serde_json::to_string(&response)?);
//! # Ok(())
//! # }
//! ```

mod error;
mod list;
mod params;

pub use error::{Error, Result};
pub use list::{ListResponse, Lister, Pagination};
pub use params::{ListMode, ListParams, PagingConfig};
