//! Query modifiers and nested association builders.
//!
//! A [`QueryModifier`] collects projection, filter, limit, offset, order, and
//! association settings, then applies them to a [`SelectQuery`] in a fixed
//! order: projection, WHERE, limit, offset, order, then joins and preloads.
//!
//! Joins and preloads carry their own predicate. A join's predicate lands in
//! its `ON` clause and a preload's predicate in the preload's own query, so
//! neither ever leaks into the parent WHERE clause.

use crate::query::{Projection, SelectQuery};
use crate::{Error, OrderTerm, Predicate, Result, SortOrder, Value};

/// Join flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
   Inner,
   Left,
}

impl JoinKind {
   fn keyword(self) -> &'static str {
      match self {
         JoinKind::Inner => "INNER JOIN",
         JoinKind::Left => "LEFT JOIN",
      }
   }
}

/// `INNER|LEFT JOIN table ON <predicates ANDed>`
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
   kind: JoinKind,
   table: String,
   on: Predicate,
}

impl Join {
   pub fn inner(table: impl Into<String>, on: impl IntoIterator<Item = Predicate>) -> Self {
      Self::new(JoinKind::Inner, table, on)
   }

   pub fn left(table: impl Into<String>, on: impl IntoIterator<Item = Predicate>) -> Self {
      Self::new(JoinKind::Left, table, on)
   }

   pub fn new(
      kind: JoinKind,
      table: impl Into<String>,
      on: impl IntoIterator<Item = Predicate>,
   ) -> Self {
      Self {
         kind,
         table: table.into(),
         on: Predicate::and(on),
      }
   }

   pub fn table(&self) -> &str {
      &self.table
   }

   pub(crate) fn write_to(&self, sql: &mut String, params: &mut Vec<Value>) {
      sql.push(' ');
      sql.push_str(self.kind.keyword());
      sql.push(' ');
      sql.push_str(&self.table);
      if !self.on.is_empty() {
         sql.push_str(" ON ");
         self.on.write_to(sql, params);
      }
   }
}

/// Related rows loaded by a second query and attached to each parent row.
///
/// The preload query is
/// `SELECT * FROM table WHERE foreign_key IN (<parent local_key values>) AND (<filter>)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Preload {
   table: String,
   foreign_key: String,
   local_key: String,
   filter: Predicate,
   order: Vec<OrderTerm>,
   limit: Option<u64>,
}

impl Preload {
   /// Preload `table` rows whose `foreign_key` matches the parent's `local_key`.
   pub fn new(
      table: impl Into<String>,
      foreign_key: impl Into<String>,
      local_key: impl Into<String>,
   ) -> Self {
      Self {
         table: table.into(),
         foreign_key: foreign_key.into(),
         local_key: local_key.into(),
         filter: Predicate::and([]),
         order: Vec::new(),
         limit: None,
      }
   }

   /// Restrict preloaded rows; predicates are ANDed.
   pub fn filter(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
      self.filter = Predicate::and(std::iter::once(self.filter).chain(predicates));
      self
   }

   pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
      self.order.push(OrderTerm::new(field, order));
      self
   }

   /// Cap on the total number of preloaded rows across all parents.
   pub fn limit(mut self, limit: u64) -> Self {
      self.limit = Some(limit);
      self
   }

   pub fn table(&self) -> &str {
      &self.table
   }

   pub fn foreign_key(&self) -> &str {
      &self.foreign_key
   }

   pub fn local_key(&self) -> &str {
      &self.local_key
   }

   pub fn limit_value(&self) -> Option<u64> {
      self.limit
   }

   /// Render the preload query for the given parent key values.
   pub fn to_sql(&self, parent_keys: &[Value]) -> (String, Vec<Value>) {
      let condition = Predicate::and([
         Predicate::is_in(self.foreign_key.clone(), parent_keys.iter().cloned()),
         self.filter.clone(),
      ]);
      let (where_sql, params) = condition.render();

      let mut sql = format!("SELECT * FROM {} WHERE {}", self.table, where_sql);
      let order_by = crate::order::build_order_by(&self.order);
      if !order_by.is_empty() {
         sql.push(' ');
         sql.push_str(&order_by);
      }
      if let Some(limit) = self.limit {
         sql.push_str(&format!(" LIMIT {limit}"));
      }
      (sql, params)
   }
}

/// A nested builder attached to a modifier.
#[derive(Debug, Clone, PartialEq)]
pub enum Association {
   Join(Join),
   Preload(Preload),
}

impl From<Join> for Association {
   fn from(join: Join) -> Self {
      Association::Join(join)
   }
}

impl From<Preload> for Association {
   fn from(preload: Preload) -> Self {
      Association::Preload(preload)
   }
}

/// Projection, filter, paging, ordering, and associations to apply to a query.
///
/// # Example
///
/// ```
/// use querykit_core::{Join, Predicate, QueryModifier, SelectQuery, SortOrder};
///
/// let modifier = QueryModifier::new()
///    .select(["products.id", "products.name"])
///    .filter(Predicate::equal("products.status", "Available"))
///    .limit(20)
///    .order_by("products.id", SortOrder::Desc)
///    .associate(Join::inner(
///       "categories",
///       [Predicate::raw("categories.id = products.category_id", vec![])],
///    ));
///
/// let (sql, params) = SelectQuery::table("products")
///    .apply(modifier)
///    .unwrap()
///    .to_sql()
///    .unwrap();
///
/// assert_eq!(
///    sql,
///    "SELECT products.id, products.name FROM products \
///     INNER JOIN categories ON categories.id = products.category_id \
///     WHERE products.status = ? ORDER BY products.id DESC LIMIT 20"
/// );
/// assert_eq!(params.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryModifier {
   select: Option<Vec<String>>,
   omit: Option<Vec<String>>,
   filter: Option<Predicate>,
   limit: Option<u64>,
   offset: Option<u64>,
   order: Vec<OrderTerm>,
   associations: Vec<Association>,
}

impl QueryModifier {
   pub fn new() -> Self {
      Self::default()
   }

   /// Only return these columns. Cannot be combined with [`QueryModifier::omit`].
   pub fn select<I, S>(mut self, columns: I) -> Self
   where
      I: IntoIterator<Item = S>,
      S: Into<String>,
   {
      self.select = Some(columns.into_iter().map(Into::into).collect());
      self
   }

   /// Return every column except these. Cannot be combined with [`QueryModifier::select`].
   pub fn omit<I, S>(mut self, columns: I) -> Self
   where
      I: IntoIterator<Item = S>,
      S: Into<String>,
   {
      self.omit = Some(columns.into_iter().map(Into::into).collect());
      self
   }

   /// Add a WHERE predicate; repeated calls are ANDed.
   pub fn filter(mut self, predicate: Predicate) -> Self {
      self.filter = Some(match self.filter.take() {
         Some(existing) => Predicate::and([existing, predicate]),
         None => predicate,
      });
      self
   }

   pub fn limit(mut self, limit: u64) -> Self {
      self.limit = Some(limit);
      self
   }

   pub fn offset(mut self, offset: u64) -> Self {
      self.offset = Some(offset);
      self
   }

   /// Append an ORDER BY term.
   pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
      self.order.push(OrderTerm::new(field, order));
      self
   }

   /// Attach a join or preload builder.
   pub fn associate(mut self, association: impl Into<Association>) -> Self {
      self.associations.push(association.into());
      self
   }

   /// Fold `other` into `self`: its scalar settings win when set, filters
   /// are ANDed, and order terms and associations are appended.
   pub fn merge(mut self, other: QueryModifier) -> Self {
      if other.select.is_some() {
         self.select = other.select;
      }
      if other.omit.is_some() {
         self.omit = other.omit;
      }
      if let Some(filter) = other.filter {
         self = self.filter(filter);
      }
      if other.limit.is_some() {
         self.limit = other.limit;
      }
      if other.offset.is_some() {
         self.offset = other.offset;
      }
      self.order.extend(other.order);
      self.associations.extend(other.associations);
      self
   }

   pub fn limit_value(&self) -> Option<u64> {
      self.limit
   }

   pub fn offset_value(&self) -> Option<u64> {
      self.offset
   }

   pub fn order_terms(&self) -> &[OrderTerm] {
      &self.order
   }

   pub fn filter_predicate(&self) -> Option<&Predicate> {
      self.filter.as_ref()
   }

   /// Apply every setting to `query`.
   pub fn apply(self, mut query: SelectQuery) -> Result<SelectQuery> {
      match (self.select, self.omit) {
         (Some(_), Some(_)) => return Err(Error::IncompatibleProjection),
         (Some(columns), None) => query.projection = Projection::Columns(columns),
         (None, Some(columns)) => query.projection = Projection::Omit(columns),
         (None, None) => {}
      }

      if let Some(filter) = self.filter {
         query = query.filter(filter);
      }

      if let Some(limit) = self.limit {
         query.limit = Some(limit);
      }

      if let Some(offset) = self.offset {
         query.offset = Some(offset);
      }

      query.order.extend(self.order);

      for association in self.associations {
         match association {
            Association::Join(join) => query.joins.push(join),
            Association::Preload(preload) => query.preloads.push(preload),
         }
      }

      Ok(query)
   }
}
