//! Bindable scalar values.
//!
//! Predicates and cursor tokens only ever carry one of a closed set of scalar
//! kinds. Anything else is rejected when the value is created, not when the
//! backend tries to bind it.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::Error;

/// A scalar query parameter or cursor key.
///
/// Serializes as the bare JSON scalar (`true`, `10`, `1.5`, `"abc"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
   Bool(bool),
   Int(i64),
   Float(f64),
   Text(String),
}

impl Value {
   /// Convert a JSON scalar into a value.
   ///
   /// Returns `None` for `null`, arrays, objects, and integers outside the
   /// `i64` range that are also not representable as a finite float.
   pub fn from_json(json: &JsonValue) -> Option<Self> {
      match json {
         JsonValue::Bool(b) => Some(Value::Bool(*b)),
         JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
               Some(Value::Int(i))
            } else {
               n.as_f64().filter(|f| f.is_finite()).map(Value::Float)
            }
         }
         JsonValue::String(s) => Some(Value::Text(s.clone())),
         JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
      }
   }

   /// Convert into the equivalent JSON scalar.
   pub fn to_json(&self) -> JsonValue {
      match self {
         Value::Bool(b) => JsonValue::Bool(*b),
         Value::Int(i) => JsonValue::from(*i),
         Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
         Value::Text(s) => JsonValue::String(s.clone()),
      }
   }
}

macro_rules! impl_from_int {
   ($($ty:ty),*) => {
      $(
         impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
               Value::Int(i64::from(v))
            }
         }
      )*
   };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
   fn from(v: bool) -> Self {
      Value::Bool(v)
   }
}

impl From<&str> for Value {
   fn from(v: &str) -> Self {
      Value::Text(v.to_owned())
   }
}

impl From<String> for Value {
   fn from(v: String) -> Self {
      Value::Text(v)
   }
}

impl From<&String> for Value {
   fn from(v: &String) -> Self {
      Value::Text(v.clone())
   }
}

impl TryFrom<f64> for Value {
   type Error = Error;

   fn try_from(v: f64) -> Result<Self, Self::Error> {
      if v.is_finite() {
         Ok(Value::Float(v))
      } else {
         Err(Error::UnsupportedValue(v.to_string()))
      }
   }
}

impl TryFrom<u64> for Value {
   type Error = Error;

   fn try_from(v: u64) -> Result<Self, Self::Error> {
      i64::try_from(v)
         .map(Value::Int)
         .map_err(|_| Error::UnsupportedValue(v.to_string()))
   }
}

impl std::fmt::Display for Value {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      match self {
         Value::Bool(b) => write!(f, "{b}"),
         Value::Int(i) => write!(f, "{i}"),
         Value::Float(x) => write!(f, "{x}"),
         Value::Text(s) => write!(f, "{s}"),
      }
   }
}
