//! List request parameters and paging defaults.

use std::str::FromStr;

use querykit_core::{CursorOptions, CursorState, SortOrder, codec::is_blank_token};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Paging defaults applied to every list request.
///
/// # Examples
///
/// ```
/// use querykit::PagingConfig;
///
/// let config = PagingConfig {
///    max_page_size: 100,
///    ..Default::default()
/// };
/// assert_eq!(config.default_page_size, 50);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
   /// Page size used when `per_page` is missing, non-positive, or too large.
   ///
   /// Default: 50
   pub default_page_size: u64,

   /// Largest accepted `per_page`.
   ///
   /// Default: 50
   pub max_page_size: u64,

   /// Sort order used when `sort_order` is missing.
   ///
   /// Default: desc
   pub default_sort_order: SortOrder,

   /// Cap on preloaded rows for preloads without a limit of their own.
   ///
   /// Default: 500
   pub preload_limit: u64,

   /// Treat an unrecognized `sort_order` as ascending instead of rejecting it.
   ///
   /// Default: false
   pub lenient_sort_order: bool,

   /// Cursor decode and backward-order behavior.
   pub cursor: CursorOptions,
}

impl Default for PagingConfig {
   fn default() -> Self {
      Self {
         default_page_size: 50,
         max_page_size: 50,
         default_sort_order: SortOrder::Desc,
         preload_limit: 500,
         lenient_sort_order: false,
         cursor: CursorOptions::default(),
      }
   }
}

/// Paging parameters as they arrive on a list request.
///
/// `page` selects offset pagination; otherwise the request is cursor paged,
/// starting from the first page when `cursor` is missing or blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListParams {
   pub cursor: Option<String>,
   pub page: Option<i64>,
   pub per_page: Option<i64>,
   pub sort_order: Option<String>,
}

/// How a normalized request will be paged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListMode {
   Offset {
      page: i64,
      per_page: u64,
      sort_order: SortOrder,
   },
   Cursor(CursorState),
}

impl ListParams {
   /// Apply defaults: an out-of-range `per_page` becomes the default page
   /// size and a missing `sort_order` becomes the default sort order.
   pub fn normalized(mut self, config: &PagingConfig) -> Self {
      let in_range = self
         .per_page
         .and_then(|n| u64::try_from(n).ok())
         .is_some_and(|n| n > 0 && n <= config.max_page_size);
      if !in_range {
         self.per_page = i64::try_from(config.default_page_size).ok();
      }

      if self.sort_order.as_deref().is_none_or(|s| s.trim().is_empty()) {
         self.sort_order = Some(config.default_sort_order.to_string());
      }
      self
   }

   /// Whether a cursor request starts at the first page.
   pub fn is_cursor_first_page(&self) -> bool {
      self.cursor.as_deref().is_none_or(is_blank_token)
   }

   /// Resolve the paging mode for a result set keyed on `key_field`.
   ///
   /// Call on normalized parameters. An unrecognized `sort_order` is
   /// rejected with [`querykit_core::Error::InvalidSortOrder`] unless
   /// [`PagingConfig::lenient_sort_order`] is set.
   pub fn mode(&self, config: &PagingConfig, key_field: &str) -> Result<ListMode> {
      let sort_order = match self.sort_order.as_deref().map(str::trim) {
         None | Some("") => config.default_sort_order,
         Some(s) if config.lenient_sort_order => SortOrder::from_param_lossy(s),
         Some(s) => SortOrder::from_str(s).map_err(Error::Query)?,
      };
      let per_page = self
         .per_page
         .and_then(|n| u64::try_from(n).ok())
         .filter(|n| *n > 0)
         .unwrap_or(config.default_page_size);

      Ok(match self.page {
         Some(page) => ListMode::Offset {
            page,
            per_page,
            sort_order,
         },
         None => ListMode::Cursor(CursorState::new(
            key_field,
            sort_order,
            per_page,
            self.cursor.clone(),
         )),
      })
   }
}
