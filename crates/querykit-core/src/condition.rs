//! Composable WHERE-clause predicates.
//!
//! A [`Predicate`] is an immutable tree: leaves hold a SQL fragment with `?`
//! placeholders and the values bound to them, groups hold a combinator
//! (`AND`/`OR`) and ordered children, and negations wrap a single child in
//! `NOT(...)`.
//!
//! Rendering walks the tree left to right. A child group is parenthesized only
//! when its own combinator differs from the parent's, which keeps `AND`/`OR`
//! precedence correct even though the output is plain concatenated text:
//!
//! ```
//! use querykit_core::Predicate;
//!
//! let p = Predicate::and([
//!    Predicate::equal("status", "Available"),
//!    Predicate::or([
//!       Predicate::less_than("price", 10),
//!       Predicate::is_null("price"),
//!    ]),
//! ]);
//!
//! let (sql, params) = p.render();
//! assert_eq!(sql, "status = ? AND (price < ? OR price IS NULL)");
//! assert_eq!(params.len(), 2);
//! ```
//!
//! Field names are interpolated verbatim; only values are bound. Callers must
//! not pass untrusted input as a field name.
//!
//! Built trees are never mutated, so a predicate may be cloned or shared
//! across threads freely.

use crate::Value;

/// Logical connective for a group of predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
   And,
   Or,
}

impl Combinator {
   fn separator(self) -> &'static str {
      match self {
         Combinator::And => " AND ",
         Combinator::Or => " OR ",
      }
   }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
   Leaf {
      fragment: String,
      params: Vec<Value>,
   },
   Group {
      combinator: Combinator,
      children: Vec<Predicate>,
   },
   Not(Box<Predicate>),
}

/// A composable boolean condition with bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
   node: Node,
}

/// First argument of [`Predicate::is_in_args`]: either a single scalar or a
/// sequence to be flattened.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
   Scalar(Value),
   List(Vec<Value>),
}

impl Operand {
   /// Flatten into a parameter list, followed by `rest` in order.
   pub fn flatten(self, rest: impl IntoIterator<Item = Value>) -> Vec<Value> {
      let mut values = match self {
         Operand::Scalar(v) => vec![v],
         Operand::List(vs) => vs,
      };
      values.extend(rest);
      values
   }
}

impl<T: Into<Value>> From<Vec<T>> for Operand {
   fn from(values: Vec<T>) -> Self {
      Operand::List(values.into_iter().map(Into::into).collect())
   }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Operand {
   fn from(values: [T; N]) -> Self {
      Operand::List(values.into_iter().map(Into::into).collect())
   }
}

impl<T: Clone + Into<Value>> From<&[T]> for Operand {
   fn from(values: &[T]) -> Self {
      Operand::List(values.iter().cloned().map(Into::into).collect())
   }
}

macro_rules! impl_scalar_operand {
   ($($ty:ty),*) => {
      $(
         impl From<$ty> for Operand {
            fn from(v: $ty) -> Self {
               Operand::Scalar(Value::from(v))
            }
         }
      )*
   };
}

impl_scalar_operand!(i8, i16, i32, i64, u8, u16, u32, bool, &str, String);

impl From<Value> for Operand {
   fn from(v: Value) -> Self {
      Operand::Scalar(v)
   }
}

/// Build an `IN` predicate from a sequence or from individual scalars.
///
/// `is_in!("id", vec![1, 2, 3])` and `is_in!("id", 1, 2, 3)` produce the same
/// predicate.
#[macro_export]
macro_rules! is_in {
   ($field:expr, $first:expr $(, $rest:expr)* $(,)?) => {
      $crate::Predicate::is_in_args($field, $first, vec![$($crate::Value::from($rest)),*])
   };
}

/// Build a `NOT IN` predicate; see [`is_in!`].
#[macro_export]
macro_rules! not_in {
   ($field:expr, $first:expr $(, $rest:expr)* $(,)?) => {
      $crate::Predicate::not_in_args($field, $first, vec![$($crate::Value::from($rest)),*])
   };
}

impl Predicate {
   fn leaf(fragment: String, params: Vec<Value>) -> Self {
      Self {
         node: Node::Leaf { fragment, params },
      }
   }

   fn binary(field: impl Into<String>, op: &str, value: Value) -> Self {
      Self::leaf(format!("{} {} ?", field.into(), op), vec![value])
   }

   /// Compare `field` against `value` using one of the keyset seek operators.
   pub(crate) fn seek(field: &str, op: &str, value: Value) -> Self {
      Self::binary(field, op, value)
   }

   /// `field = value`
   pub fn equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
      Self::binary(field, "=", value.into())
   }

   /// `field <> value`
   pub fn not_equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
      Self::binary(field, "<>", value.into())
   }

   /// `field > value`
   pub fn greater_than(field: impl Into<String>, value: impl Into<Value>) -> Self {
      Self::binary(field, ">", value.into())
   }

   /// `field >= value`
   pub fn greater_equal_than(field: impl Into<String>, value: impl Into<Value>) -> Self {
      Self::binary(field, ">=", value.into())
   }

   /// `field < value`
   pub fn less_than(field: impl Into<String>, value: impl Into<Value>) -> Self {
      Self::binary(field, "<", value.into())
   }

   /// `field <= value`
   pub fn less_equal_than(field: impl Into<String>, value: impl Into<Value>) -> Self {
      Self::binary(field, "<=", value.into())
   }

   /// `field LIKE pattern`
   pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
      Self::binary(field, "LIKE", Value::Text(pattern.into()))
   }

   /// `field NOT LIKE pattern`
   pub fn not_like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
      Self::binary(field, "NOT LIKE", Value::Text(pattern.into()))
   }

   /// `field IN (?, ?, …)` with one placeholder per value, in input order.
   ///
   /// An empty list matches nothing and renders as `1 = 0`.
   pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
   where
      I: IntoIterator<Item = V>,
      V: Into<Value>,
   {
      Self::membership(field.into(), "IN", values.into_iter().map(Into::into).collect())
   }

   /// `field NOT IN (?, ?, …)`.
   ///
   /// An empty list matches everything and renders as `1 = 1`.
   pub fn not_in<I, V>(field: impl Into<String>, values: I) -> Self
   where
      I: IntoIterator<Item = V>,
      V: Into<Value>,
   {
      Self::membership(
         field.into(),
         "NOT IN",
         values.into_iter().map(Into::into).collect(),
      )
   }

   /// `IN` with a leading operand that is flattened when it is a sequence and
   /// treated as one scalar otherwise; `rest` follows in order.
   pub fn is_in_args(
      field: impl Into<String>,
      first: impl Into<Operand>,
      rest: impl IntoIterator<Item = Value>,
   ) -> Self {
      Self::membership(field.into(), "IN", first.into().flatten(rest))
   }

   /// `NOT IN` counterpart of [`Predicate::is_in_args`].
   pub fn not_in_args(
      field: impl Into<String>,
      first: impl Into<Operand>,
      rest: impl IntoIterator<Item = Value>,
   ) -> Self {
      Self::membership(field.into(), "NOT IN", first.into().flatten(rest))
   }

   fn membership(field: String, op: &str, values: Vec<Value>) -> Self {
      if values.is_empty() {
         let constant = if op == "IN" { "1 = 0" } else { "1 = 1" };
         return Self::leaf(constant.to_string(), Vec::new());
      }
      let placeholders = vec!["?"; values.len()].join(", ");
      Self::leaf(format!("{field} {op} ({placeholders})"), values)
   }

   /// `field IS NULL`
   pub fn is_null(field: impl Into<String>) -> Self {
      Self::leaf(format!("{} IS NULL", field.into()), Vec::new())
   }

   /// `field IS NOT NULL`
   pub fn is_not_null(field: impl Into<String>) -> Self {
      Self::leaf(format!("{} IS NOT NULL", field.into()), Vec::new())
   }

   /// `field BETWEEN lower AND upper`
   pub fn between(
      field: impl Into<String>,
      lower: impl Into<Value>,
      upper: impl Into<Value>,
   ) -> Self {
      Self::leaf(
         format!("{} BETWEEN ? AND ?", field.into()),
         vec![lower.into(), upper.into()],
      )
   }

   /// `field NOT BETWEEN lower AND upper`
   pub fn not_between(
      field: impl Into<String>,
      lower: impl Into<Value>,
      upper: impl Into<Value>,
   ) -> Self {
      Self::leaf(
         format!("{} NOT BETWEEN ? AND ?", field.into()),
         vec![lower.into(), upper.into()],
      )
   }

   /// Caller-supplied fragment with `?` placeholders, used verbatim.
   pub fn raw(fragment: impl Into<String>, params: Vec<Value>) -> Self {
      Self::leaf(fragment.into(), params)
   }

   /// Join predicates with `AND`, left to right.
   pub fn and(children: impl IntoIterator<Item = Predicate>) -> Self {
      Self::group(Combinator::And, children)
   }

   /// Join predicates with `OR`, left to right.
   pub fn or(children: impl IntoIterator<Item = Predicate>) -> Self {
      Self::group(Combinator::Or, children)
   }

   fn group(combinator: Combinator, children: impl IntoIterator<Item = Predicate>) -> Self {
      Self {
         node: Node::Group {
            combinator,
            children: children.into_iter().filter(|c| !c.is_empty()).collect(),
         },
      }
   }

   /// Wrap in `NOT(...)`. The result carries no combinator of its own.
   #[allow(clippy::should_implement_trait)]
   pub fn not(inner: Predicate) -> Self {
      Self {
         node: Node::Not(Box::new(inner)),
      }
   }

   /// Whether the predicate renders to an empty fragment.
   pub fn is_empty(&self) -> bool {
      match &self.node {
         Node::Leaf { fragment, .. } => fragment.trim().is_empty(),
         Node::Group { children, .. } => children.iter().all(Predicate::is_empty),
         Node::Not(inner) => inner.is_empty(),
      }
   }

   /// The combinator that decides whether this predicate needs parentheses
   /// when embedded in a group.
   ///
   /// Leaves and negations have none. A group with a single child is
   /// transparent and reports its child's combinator.
   pub fn combinator(&self) -> Option<Combinator> {
      match &self.node {
         Node::Leaf { .. } | Node::Not(_) => None,
         Node::Group {
            combinator,
            children,
         } => match children.as_slice() {
            [] => None,
            [only] => only.combinator(),
            _ => Some(*combinator),
         },
      }
   }

   /// Render to a SQL fragment and its parameters in placeholder order.
   pub fn render(&self) -> (String, Vec<Value>) {
      let mut sql = String::new();
      let mut params = Vec::new();
      self.write_to(&mut sql, &mut params);
      (sql, params)
   }

   /// Rendered SQL fragment.
   pub fn fragment(&self) -> String {
      self.render().0
   }

   /// Bound parameters in placeholder order.
   pub fn params(&self) -> Vec<Value> {
      self.render().1
   }

   pub(crate) fn write_to(&self, sql: &mut String, params: &mut Vec<Value>) {
      match &self.node {
         Node::Leaf {
            fragment,
            params: values,
         } => {
            sql.push_str(fragment);
            params.extend(values.iter().cloned());
         }
         Node::Group {
            combinator,
            children,
         } => {
            if let [only] = children.as_slice() {
               only.write_to(sql, params);
               return;
            }
            for (i, child) in children.iter().enumerate() {
               if i > 0 {
                  sql.push_str(combinator.separator());
               }
               let wrap = child.combinator().is_some_and(|c| c != *combinator);
               if wrap {
                  sql.push('(');
               }
               child.write_to(sql, params);
               if wrap {
                  sql.push(')');
               }
            }
         }
         Node::Not(inner) => {
            if inner.is_empty() {
               return;
            }
            sql.push_str("NOT(");
            inner.write_to(sql, params);
            sql.push(')');
         }
      }
   }
}
