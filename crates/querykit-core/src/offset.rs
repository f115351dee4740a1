//! Offset (page number) pagination.
//!
//! Offset paging is simple but every page skips `(page - 1) * limit` rows on
//! the backend, which gets slower the deeper a client pages. Prefer
//! [`CursorPager`](crate::CursorPager) for large or unbounded lists.

use serde::{Deserialize, Serialize};

use crate::{Error, QueryModifier, Result, SortOrder};

fn is_zero(n: &u64) -> bool {
   *n == 0
}

/// Offset pagination metadata returned to clients.
///
/// Serializes as `{"current_page":…,"per_page":…,"total_page":…}`; zero
/// members are omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetEnvelope {
   #[serde(default, skip_serializing_if = "is_zero")]
   pub current_page: u64,
   #[serde(default, skip_serializing_if = "is_zero")]
   pub per_page: u64,
   #[serde(default, skip_serializing_if = "is_zero")]
   pub total_page: u64,
}

/// A page of rows fetched with offset pagination.
#[derive(Debug, Clone, Serialize)]
pub struct OffsetPage<R> {
   pub rows: Vec<R>,
   pub pagination: OffsetEnvelope,
}

/// Page/limit pagination over one or more order fields.
///
/// A single sort order applies to every order field.
#[derive(Debug, Clone)]
pub struct OffsetPager {
   order_fields: Vec<String>,
   page: i64,
   limit: u64,
   sort_order: SortOrder,
   total_records: u64,
}

impl OffsetPager {
   /// Create a pager for 1-based `page` over a result set of `total_records`.
   ///
   /// Defaults to a page size of 1 and ascending order; set both with
   /// [`OffsetPager::limit`] and [`OffsetPager::sort_order`].
   pub fn new<I, S>(page: i64, total_records: u64, order_fields: I) -> Self
   where
      I: IntoIterator<Item = S>,
      S: Into<String>,
   {
      Self {
         order_fields: order_fields.into_iter().map(Into::into).collect(),
         page,
         limit: 1,
         sort_order: SortOrder::Asc,
         total_records,
      }
   }

   pub fn limit(mut self, limit: u64) -> Self {
      self.limit = limit;
      self
   }

   pub fn sort_order(mut self, sort_order: SortOrder) -> Self {
      self.sort_order = sort_order;
      self
   }

   fn validate(&self) -> Result<()> {
      if self.page < 1 {
         return Err(Error::InvalidPageNumber(self.page));
      }
      if self.limit == 0 {
         return Err(Error::InvalidPageSize);
      }
      Ok(())
   }

   /// Rows to skip: `(page - 1) * limit`.
   pub fn offset(&self) -> Result<u64> {
      self.validate()?;
      // validate() guarantees page >= 1
      let skipped_pages = self.page.unsigned_abs() - 1;
      skipped_pages
         .checked_mul(self.limit)
         .ok_or(Error::InvalidPageNumber(self.page))
   }

   /// `ceil(total_records / limit)`.
   pub fn total_pages(&self) -> Result<u64> {
      self.validate()?;
      Ok(self.total_records.div_ceil(self.limit))
   }

   /// ORDER BY every order field, LIMIT, and OFFSET for the requested page.
   pub fn modifier(&self) -> Result<QueryModifier> {
      let offset = self.offset()?;
      let modifier = self
         .order_fields
         .iter()
         .fold(QueryModifier::new(), |m, field| {
            m.order_by(field.clone(), self.sort_order)
         });
      Ok(modifier.limit(self.limit).offset(offset))
   }

   /// Pagination metadata for the response.
   pub fn pagination(&self) -> Result<OffsetEnvelope> {
      Ok(OffsetEnvelope {
         current_page: self.page.unsigned_abs(),
         per_page: self.limit,
         total_page: self.total_pages()?,
      })
   }
}
