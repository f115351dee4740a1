//! List endpoint facade: request parameters in, `{data, pagination}` out.

use std::sync::Arc;

use querykit_core::{CursorPager, OffsetEnvelope, PageEnvelope, SelectQuery};
use querykit_sqlite::{Row, SqliteDatabase};
use serde::Serialize;
use tracing::debug;

use crate::params::{ListMode, ListParams, PagingConfig};
use crate::Result;

/// Pagination metadata, in whichever shape the request's mode produces.
///
/// Serializes untagged, as either `{"next","prev"}` or
/// `{"current_page","per_page","total_page"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Pagination {
   Cursor(PageEnvelope),
   Offset(OffsetEnvelope),
}

/// Response body for a list endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
   pub data: Vec<Row>,
   pub pagination: Pagination,
}

/// Runs list queries with request-driven paging.
#[derive(Debug, Clone)]
pub struct Lister {
   db: Arc<SqliteDatabase>,
   config: PagingConfig,
}

impl Lister {
   pub fn new(db: Arc<SqliteDatabase>, config: PagingConfig) -> Self {
      Self { db, config }
   }

   pub fn config(&self) -> &PagingConfig {
      &self.config
   }

   /// Page through `query` according to `params`.
   ///
   /// `key_field` is the cursor field in cursor mode and the order field in
   /// offset mode. It must be unique and totally ordered for cursor paging to
   /// be stable.
   pub async fn list(
      &self,
      query: SelectQuery,
      params: &ListParams,
      key_field: &str,
   ) -> Result<ListResponse> {
      let params = params.clone().normalized(&self.config);
      let mode = params.mode(&self.config, key_field)?;
      debug!(table = query.table_name(), mode = ?mode, "Listing rows");

      match mode {
         ListMode::Offset {
            page,
            per_page,
            sort_order,
         } => {
            let page = self
               .db
               .fetch_offset_page(query, page, per_page)
               .order_by([key_field])
               .sort_order(sort_order)
               .preload_limit(self.config.preload_limit)
               .await?;
            Ok(ListResponse {
               data: page.rows,
               pagination: Pagination::Offset(page.pagination),
            })
         }
         ListMode::Cursor(state) => {
            let pager = CursorPager::new(state, self.config.cursor)?;
            let page = self
               .db
               .fetch_cursor_page(query, pager)
               .preload_limit(self.config.preload_limit)
               .await?;
            Ok(ListResponse {
               data: page.rows,
               pagination: Pagination::Cursor(page.pagination),
            })
         }
      }
   }
}
