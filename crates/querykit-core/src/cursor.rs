//! Keyset (cursor) pagination over a single field.
//!
//! Instead of skipping rows with OFFSET, keyset pagination seeks from the
//! boundary value of the previous page, so every page costs the same no matter
//! how deep the client goes.
//!
//! # How It Works
//!
//! A [`CursorPager`] is in one of two states:
//!
//! - **First page** (no inbound token): `ORDER BY field <order> LIMIT limit+1`.
//! - **Subsequent page** (token present): the token's `points_next` flag picks
//!   a direction, and the seek operator and effective sort order come from
//!   this table:
//!
//! | points_next | declared | operator | effective |
//! |---|---|---|---|
//! | true  | asc  | `>` | asc  |
//! | true  | desc | `<` | desc |
//! | false | asc  | `<` | desc |
//! | false | desc | `>` | asc  |
//!
//! Every fetch asks for one extra row. If it comes back there is another page
//! in the direction of travel, and no separate count query is needed.
//!
//! Backward fetches come back in the flipped order. Whether they are handed
//! to the caller that way or restored to the declared order is controlled by
//! [`BackwardOrder`]; tokens are computed from the declared-order boundaries
//! either way.
//!
//! # Example
//!
//! ```
//! use querykit_core::{CursorOptions, CursorPager, CursorState, SelectQuery, SortOrder};
//!
//! let state = CursorState::new("id", SortOrder::Asc, 10, None);
//! let pager = CursorPager::new(state, CursorOptions::default()).unwrap();
//!
//! let query = pager.query().unwrap();
//! assert_eq!(query.probe_limit, 11);
//!
//! let (sql, _) = SelectQuery::table("products")
//!    .apply(query.modifier)
//!    .unwrap()
//!    .to_sql()
//!    .unwrap();
//! assert_eq!(sql, "SELECT * FROM products ORDER BY id ASC LIMIT 11");
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::codec::{CursorToken, is_blank_token};
use crate::{Error, Predicate, QueryModifier, Result, SelectQuery, SortOrder, Value};

/// Direction of travel encoded in an inbound token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
   Forward,
   Backward,
}

impl Direction {
   pub fn from_points_next(points_next: bool) -> Self {
      if points_next {
         Direction::Forward
      } else {
         Direction::Backward
      }
   }
}

/// Seek operator and effective sort order for a direction of travel.
pub fn seek_operator(direction: Direction, declared: SortOrder) -> (&'static str, SortOrder) {
   match (direction, declared) {
      (Direction::Forward, SortOrder::Asc) => (">", SortOrder::Asc),
      (Direction::Forward, SortOrder::Desc) => ("<", SortOrder::Desc),
      (Direction::Backward, SortOrder::Asc) => ("<", SortOrder::Desc),
      (Direction::Backward, SortOrder::Desc) => (">", SortOrder::Asc),
   }
}

/// Row order handed back for backward pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackwardOrder {
   /// Rows come back in the flipped order they were fetched in.
   #[default]
   AsFetched,
   /// Rows are reversed back to the declared sort order.
   Restored,
}

/// What to do with a token that cannot be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeFailure {
   /// Propagate [`Error::MalformedCursorToken`].
   #[default]
   Reject,
   /// Log a warning and serve the first page without a seek filter.
   FirstPage,
}

/// Behavior switches for cursor pagination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorOptions {
   pub backward_order: BackwardOrder,
   pub decode_failure: DecodeFailure,
}

/// Inbound cursor request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorState {
   /// Field the keyset is ordered and sought on.
   pub field: String,
   /// Declared sort order.
   pub sort_order: SortOrder,
   /// Page size.
   pub limit: u64,
   /// Opaque token from a previous envelope, if any.
   pub token: Option<String>,
}

impl CursorState {
   pub fn new(
      field: impl Into<String>,
      sort_order: SortOrder,
      limit: u64,
      token: Option<String>,
   ) -> Self {
      Self {
         field: field.into(),
         sort_order,
         limit,
         token,
      }
   }

   /// True when no usable token was supplied.
   pub fn is_first_page(&self) -> bool {
      self.token.as_deref().is_none_or(is_blank_token)
   }
}

/// Cursor pagination metadata returned to clients.
///
/// Serializes as `{"next":…,"prev":…}`; empty tokens are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEnvelope {
   #[serde(default, skip_serializing_if = "String::is_empty")]
   pub next: String,
   #[serde(default, skip_serializing_if = "String::is_empty")]
   pub prev: String,
}

/// A page of rows fetched with cursor pagination.
#[derive(Debug, Clone, Serialize)]
pub struct CursorPage<R> {
   pub rows: Vec<R>,
   pub pagination: PageEnvelope,
   /// Whether the probe row came back, i.e. more rows exist in the
   /// direction of travel.
   pub has_more: bool,
}

/// Query description for one cursor fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorQuery {
   /// Seek filter, effective ORDER BY, and `LIMIT probe_limit`.
   pub modifier: QueryModifier,
   /// Rows to request: the page size plus one probe row.
   pub probe_limit: u64,
}

/// Rows that can report their cursor field value.
pub trait CursorKey {
   fn cursor_value(&self, field: &str) -> Option<Value>;
}

impl CursorKey for IndexMap<String, JsonValue> {
   fn cursor_value(&self, field: &str) -> Option<Value> {
      self.get(field).and_then(Value::from_json)
   }
}

impl CursorKey for serde_json::Map<String, JsonValue> {
   fn cursor_value(&self, field: &str) -> Option<Value> {
      self.get(field).and_then(Value::from_json)
   }
}

#[derive(Debug, Clone, PartialEq)]
enum PageState {
   First,
   Subsequent { direction: Direction, boundary: Value },
}

/// Keyset pager for one request.
#[derive(Debug, Clone)]
pub struct CursorPager {
   field: String,
   sort_order: SortOrder,
   limit: u64,
   options: CursorOptions,
   state: PageState,
}

impl CursorPager {
   /// Resolve the inbound token and validate the request.
   pub fn new(state: CursorState, options: CursorOptions) -> Result<Self> {
      if state.limit == 0 {
         return Err(Error::InvalidPageSize);
      }

      let page_state = match state.token.as_deref().filter(|t| !is_blank_token(t)) {
         None => PageState::First,
         Some(raw) => match CursorToken::decode(raw, &state.field) {
            Ok(token) => PageState::Subsequent {
               direction: Direction::from_points_next(token.points_next),
               boundary: token.value,
            },
            Err(err) => match options.decode_failure {
               DecodeFailure::Reject => return Err(err),
               DecodeFailure::FirstPage => {
                  warn!(
                     field = %state.field,
                     error = %err,
                     "Ignoring malformed cursor token, serving first page"
                  );
                  PageState::First
               }
            },
         },
      };

      Ok(Self {
         field: state.field,
         sort_order: state.sort_order,
         limit: state.limit,
         options,
         state: page_state,
      })
   }

   pub fn is_first_page(&self) -> bool {
      self.state == PageState::First
   }

   /// Direction of travel, or `None` on the first page.
   pub fn direction(&self) -> Option<Direction> {
      match &self.state {
         PageState::First => None,
         PageState::Subsequent { direction, .. } => Some(*direction),
      }
   }

   /// Sort order the fetch actually uses.
   pub fn effective_sort_order(&self) -> SortOrder {
      match self.direction() {
         None => self.sort_order,
         Some(direction) => seek_operator(direction, self.sort_order).1,
      }
   }

   fn is_backward(&self) -> bool {
      self.direction() == Some(Direction::Backward)
   }

   /// Build the seek filter, ORDER BY, and probe LIMIT.
   pub fn query(&self) -> Result<CursorQuery> {
      let probe_limit = self.limit.checked_add(1).ok_or(Error::InvalidPageSize)?;
      let mut modifier = QueryModifier::new();

      if let PageState::Subsequent {
         direction,
         boundary,
      } = &self.state
      {
         let (op, _) = seek_operator(*direction, self.sort_order);
         modifier = modifier.filter(Predicate::seek(&self.field, op, boundary.clone()));
      }

      let effective = self.effective_sort_order();
      debug!(
         field = %self.field,
         declared = %self.sort_order,
         effective = %effective,
         probe_limit,
         first_page = self.is_first_page(),
         "Built cursor page query"
      );

      Ok(CursorQuery {
         modifier: modifier
            .order_by(self.field.clone(), effective)
            .limit(probe_limit),
         probe_limit,
      })
   }

   /// Apply [`CursorPager::query`] to `query`.
   ///
   /// `query` must not carry its own order terms, limit, or offset; the
   /// seek only holds when the cursor field is the sole ORDER BY term.
   pub fn apply(&self, query: SelectQuery) -> Result<SelectQuery> {
      query.validate_pagination_base()?;
      query.apply(self.query()?.modifier)
   }

   fn token(&self, value: Value, points_next: bool) -> Result<String> {
      CursorToken::new(value, points_next).encode(&self.field)
   }

   fn key_of<R: CursorKey>(&self, row: &R) -> Result<Value> {
      row.cursor_value(&self.field)
         .ok_or_else(|| Error::CursorColumnNotFound {
            column: self.field.clone(),
         })
   }

   /// Trim fetched rows to the page size and compute next/prev tokens.
   ///
   /// `rows` must be the result of running [`CursorPager::query`], in the
   /// order the backend returned them.
   ///
   /// On an empty subsequent page the inbound boundary value backs the token
   /// that points the way the client came. Seeks are exclusive, so following
   /// that token leaves out the boundary row itself: stepping back from an
   /// empty page past row 25 serves the rows before 25, not a page ending
   /// at 25.
   pub fn paginate<R: CursorKey>(&self, mut rows: Vec<R>) -> Result<CursorPage<R>> {
      let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
      let has_more = rows.len() > limit;
      rows.truncate(limit);

      // Boundaries in declared order; backward fetches arrive flipped
      let (head, tail) = if self.is_backward() {
         (rows.last(), rows.first())
      } else {
         (rows.first(), rows.last())
      };
      let head = head.map(|r| self.key_of(r)).transpose()?;
      let tail = tail.map(|r| self.key_of(r)).transpose()?;

      let mut pagination = PageEnvelope::default();
      match &self.state {
         PageState::First => {
            if let (true, Some(tail)) = (has_more, tail) {
               pagination.next = self.token(tail, true)?;
            }
         }
         PageState::Subsequent {
            direction: Direction::Forward,
            boundary,
         } => {
            if let (true, Some(tail)) = (has_more, tail) {
               pagination.next = self.token(tail, true)?;
            }
            let head = head.unwrap_or_else(|| boundary.clone());
            pagination.prev = self.token(head, false)?;
         }
         PageState::Subsequent {
            direction: Direction::Backward,
            boundary,
         } => {
            let tail = tail.unwrap_or_else(|| boundary.clone());
            pagination.next = self.token(tail, true)?;
            if let (true, Some(head)) = (has_more, head) {
               pagination.prev = self.token(head, false)?;
            }
         }
      }

      if self.is_backward() && self.options.backward_order == BackwardOrder::Restored {
         rows.reverse();
      }

      Ok(CursorPage {
         rows,
         pagination,
         has_more,
      })
   }
}
