//! Sort order and ORDER BY terms.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Sort direction for an order term or a cursor field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
   /// Ascending order (smallest first)
   #[default]
   Asc,
   /// Descending order (largest first)
   Desc,
}

impl SortOrder {
   /// Return the opposite sort direction.
   pub fn reversed(self) -> Self {
      match self {
         SortOrder::Asc => SortOrder::Desc,
         SortOrder::Desc => SortOrder::Asc,
      }
   }

   /// SQL keyword for this direction.
   pub fn keyword(self) -> &'static str {
      match self {
         SortOrder::Asc => "ASC",
         SortOrder::Desc => "DESC",
      }
   }

   /// Lenient parse used for request parameters: anything other than `desc`
   /// falls back to ascending.
   pub fn from_param_lossy(s: &str) -> Self {
      s.parse().unwrap_or(SortOrder::Asc)
   }
}

impl FromStr for SortOrder {
   type Err = Error;

   fn from_str(s: &str) -> Result<Self, Self::Err> {
      match s.trim().to_ascii_lowercase().as_str() {
         "asc" => Ok(SortOrder::Asc),
         "desc" => Ok(SortOrder::Desc),
         _ => Err(Error::InvalidSortOrder(s.to_string())),
      }
   }
}

impl fmt::Display for SortOrder {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self {
         SortOrder::Asc => f.write_str("asc"),
         SortOrder::Desc => f.write_str("desc"),
      }
   }
}

/// One `field DIRECTION` entry of an ORDER BY clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
   pub field: String,
   pub order: SortOrder,
}

impl OrderTerm {
   pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
      Self {
         field: field.into(),
         order,
      }
   }

   pub fn asc(field: impl Into<String>) -> Self {
      Self::new(field, SortOrder::Asc)
   }

   pub fn desc(field: impl Into<String>) -> Self {
      Self::new(field, SortOrder::Desc)
   }
}

impl fmt::Display for OrderTerm {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(f, "{} {}", self.field, self.order.keyword())
   }
}

/// Render terms as an `ORDER BY` clause, or an empty string when there are none.
pub(crate) fn build_order_by(terms: &[OrderTerm]) -> String {
   if terms.is_empty() {
      return String::new();
   }
   let parts: Vec<String> = terms.iter().map(ToString::to_string).collect();
   format!("ORDER BY {}", parts.join(", "))
}
