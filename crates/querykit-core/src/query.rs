//! Query descriptions.
//!
//! A [`SelectQuery`] is what the data-access layer executes: a base table plus
//! everything the modifiers and pagers applied to it. It never touches a
//! database; [`SelectQuery::to_sql`] renders it to SQL text with `?`
//! placeholders and the values to bind, in placeholder order.

use crate::modifier::{Join, Preload};
use crate::order::build_order_by;
use crate::{Error, OrderTerm, Predicate, QueryModifier, Result, Value};

/// Which columns a query returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Projection {
   /// `SELECT *`
   #[default]
   All,
   /// `SELECT a, b, c`
   Columns(Vec<String>),
   /// Every known column except these.
   Omit(Vec<String>),
}

/// A SELECT statement under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
   table: String,
   known_columns: Option<Vec<String>>,
   pub(crate) projection: Projection,
   pub(crate) filter: Option<Predicate>,
   pub(crate) joins: Vec<Join>,
   pub(crate) order: Vec<OrderTerm>,
   pub(crate) limit: Option<u64>,
   pub(crate) offset: Option<u64>,
   pub(crate) preloads: Vec<Preload>,
}

impl SelectQuery {
   /// Start a query against `table`.
   pub fn table(table: impl Into<String>) -> Self {
      Self {
         table: table.into(),
         known_columns: None,
         projection: Projection::All,
         filter: None,
         joins: Vec::new(),
         order: Vec::new(),
         limit: None,
         offset: None,
         preloads: Vec::new(),
      }
   }

   /// Supply the table's column list, required to render an omit projection.
   pub fn with_columns<I, S>(mut self, columns: I) -> Self
   where
      I: IntoIterator<Item = S>,
      S: Into<String>,
   {
      self.known_columns = Some(columns.into_iter().map(Into::into).collect());
      self
   }

   /// AND a predicate into the WHERE clause.
   pub fn filter(mut self, predicate: Predicate) -> Self {
      self.filter = Some(match self.filter.take() {
         Some(existing) => Predicate::and([existing, predicate]),
         None => predicate,
      });
      self
   }

   /// Apply a modifier; see [`QueryModifier::apply`].
   pub fn apply(self, modifier: QueryModifier) -> Result<Self> {
      modifier.apply(self)
   }

   pub fn table_name(&self) -> &str {
      &self.table
   }

   pub fn projection(&self) -> &Projection {
      &self.projection
   }

   /// Whether rendering needs the table's column list first.
   pub fn needs_columns(&self) -> bool {
      matches!(self.projection, Projection::Omit(_)) && self.known_columns.is_none()
   }

   pub fn filter_predicate(&self) -> Option<&Predicate> {
      self.filter.as_ref()
   }

   pub fn order(&self) -> &[OrderTerm] {
      &self.order
   }

   pub fn limit(&self) -> Option<u64> {
      self.limit
   }

   pub fn offset(&self) -> Option<u64> {
      self.offset
   }

   pub fn preloads(&self) -> &[Preload] {
      &self.preloads
   }

   /// Fails with [`Error::InvalidPaginationQuery`] when the query already
   /// has order terms, a limit, or an offset. Pagers own those clauses.
   pub fn validate_pagination_base(&self) -> Result<()> {
      if !self.order.is_empty() || self.limit.is_some() || self.offset.is_some() {
         return Err(Error::InvalidPaginationQuery);
      }
      Ok(())
   }

   /// Cap every preload that has no limit of its own.
   pub fn default_preload_limit(mut self, limit: u64) -> Self {
      self.preloads = self
         .preloads
         .into_iter()
         .map(|p| match p.limit_value() {
            Some(_) => p,
            None => p.limit(limit),
         })
         .collect();
      self
   }

   fn projection_sql(&self) -> Result<String> {
      match &self.projection {
         Projection::All => Ok("*".to_string()),
         Projection::Columns(columns) if columns.is_empty() => Ok("*".to_string()),
         Projection::Columns(columns) => Ok(columns.join(", ")),
         Projection::Omit(omitted) => {
            let known = self
               .known_columns
               .as_ref()
               .ok_or_else(|| Error::UnresolvedProjection {
                  table: self.table.clone(),
               })?;
            let kept: Vec<&str> = known
               .iter()
               .filter(|c| !omitted.iter().any(|o| o == *c))
               .map(String::as_str)
               .collect();
            if kept.is_empty() {
               return Err(Error::UnresolvedProjection {
                  table: self.table.clone(),
               });
            }
            Ok(kept.join(", "))
         }
      }
   }

   /// `FROM`, joins, and WHERE, shared by the row and count queries.
   fn write_source(&self, sql: &mut String, params: &mut Vec<Value>) {
      sql.push_str(" FROM ");
      sql.push_str(&self.table);
      for join in &self.joins {
         join.write_to(sql, params);
      }
      if let Some(filter) = self.filter.as_ref().filter(|f| !f.is_empty()) {
         sql.push_str(" WHERE ");
         filter.write_to(sql, params);
      }
   }

   /// Render the row query.
   pub fn to_sql(&self) -> Result<(String, Vec<Value>)> {
      let mut sql = format!("SELECT {}", self.projection_sql()?);
      let mut params = Vec::new();
      self.write_source(&mut sql, &mut params);

      let order_by = build_order_by(&self.order);
      if !order_by.is_empty() {
         sql.push(' ');
         sql.push_str(&order_by);
      }

      match (self.limit, self.offset) {
         (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
         (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
         // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded
         (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
         (None, None) => {}
      }

      Ok((sql, params))
   }

   /// Render a `COUNT(*)` over the same source and filter, ignoring
   /// projection, order, limit, and offset.
   pub fn count_sql(&self) -> (String, Vec<Value>) {
      let mut sql = "SELECT COUNT(*) AS count".to_string();
      let mut params = Vec::new();
      self.write_source(&mut sql, &mut params);
      (sql, params)
   }
}
