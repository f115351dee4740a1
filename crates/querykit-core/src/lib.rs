//! # querykit-core
//!
//! Composable SQL predicates and pagination for list endpoints, with no
//! database I/O. Everything here produces query *descriptions*; a data-access
//! layer such as `querykit-sqlite` executes them.
//!
//! ## Core Types
//!
//! - **[`Predicate`]**: Immutable WHERE-clause tree rendered with `?` placeholders
//! - **[`QueryModifier`]**: Projection, filter, order, limit/offset, and associations
//! - **[`SelectQuery`]**: A base table with modifiers applied, renderable to SQL
//! - **[`OffsetPager`]**: Page-number pagination with `{current_page, per_page, total_page}` metadata
//! - **[`CursorPager`]**: Keyset pagination with opaque `{next, prev}` tokens
//! - **[`CursorToken`]**: The decoded form of a cursor token
//! - **[`Error`]**: Error type for query assembly and pagination
//!
//! ## Example
//!
//! ```
//! use querykit_core::{OffsetPager, Predicate, QueryModifier, SelectQuery, SortOrder};
//!
//! let pager = OffsetPager::new(2, 95, ["id"]).limit(10).sort_order(SortOrder::Desc);
//!
//! let query = SelectQuery::table("products")
//!    .filter(Predicate::equal("status", "Available"))
//!    .apply(pager.modifier().unwrap())
//!    .unwrap();
//!
//! let (sql, _) = query.to_sql().unwrap();
//! assert_eq!(
//!    sql,
//!    "SELECT * FROM products WHERE status = ? ORDER BY id DESC LIMIT 10 OFFSET 10"
//! );
//! ```

pub mod codec;
mod condition;
mod cursor;
mod error;
mod modifier;
mod offset;
mod order;
mod query;
mod value;

pub use codec::CursorToken;
pub use condition::{Combinator, Operand, Predicate};
pub use cursor::{
   BackwardOrder, CursorKey, CursorOptions, CursorPage, CursorPager, CursorQuery, CursorState,
   DecodeFailure, Direction, PageEnvelope, seek_operator,
};
pub use error::{Error, Result};
pub use modifier::{Association, Join, JoinKind, Preload, QueryModifier};
pub use offset::{OffsetEnvelope, OffsetPage, OffsetPager};
pub use order::{OrderTerm, SortOrder};
pub use query::{Projection, SelectQuery};
pub use value::Value;
