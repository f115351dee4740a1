//! Opaque cursor token encoding.
//!
//! A token is standard (padded) base64 over a compact JSON object. Keys are
//! written in sorted order so the same map always yields the same token.
//! An empty map encodes to the empty string, which means "no token".

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value as JsonValue};

use crate::{Error, Result, Value};

/// Untyped token contents.
pub type TokenMap = Map<String, JsonValue>;

/// Key carrying the traversal direction inside a token.
pub const POINTS_NEXT_KEY: &str = "points_next";

/// Encode a token map; an empty map yields `""`.
pub fn encode(map: &TokenMap) -> Result<String> {
   if map.is_empty() {
      return Ok(String::new());
   }
   let sorted: BTreeMap<&String, &JsonValue> = map.iter().collect();
   let json = serde_json::to_vec(&sorted)?;
   Ok(STANDARD.encode(json))
}

/// Decode a token produced by [`encode`].
pub fn decode(token: &str) -> Result<TokenMap> {
   let bytes = STANDARD
      .decode(token.trim())
      .map_err(|e| Error::MalformedCursorToken {
         reason: format!("invalid base64: {e}"),
      })?;
   serde_json::from_slice(&bytes).map_err(|e| Error::MalformedCursorToken {
      reason: format!("invalid JSON object: {e}"),
   })
}

/// Whether a raw token counts as absent.
///
/// Besides the empty string, the two-character JSON literal `""` is treated
/// as absent; some clients send an encoded empty string back verbatim.
pub fn is_blank_token(token: &str) -> bool {
   let token = token.trim();
   token.is_empty() || token == "\"\""
}

/// A decoded keyset position: the boundary value of the cursor field and the
/// direction to travel from it.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorToken {
   pub value: Value,
   pub points_next: bool,
}

impl CursorToken {
   pub fn new(value: Value, points_next: bool) -> Self {
      Self { value, points_next }
   }

   /// Encode as `base64({"<field>": value, "points_next": bool})`.
   pub fn encode(&self, field: &str) -> Result<String> {
      let mut map = TokenMap::new();
      map.insert(field.to_string(), self.value.to_json());
      map.insert(POINTS_NEXT_KEY.to_string(), JsonValue::Bool(self.points_next));
      encode(&map)
   }

   /// Decode and type-check against the declared cursor field.
   ///
   /// The field value must be a string, number, or boolean. A missing
   /// `points_next` means backward, matching tokens that only carried
   /// `"points_next": true` when moving forward.
   pub fn decode(token: &str, field: &str) -> Result<Self> {
      let map = decode(token)?;

      let raw = map.get(field).ok_or_else(|| Error::MalformedCursorToken {
         reason: format!("missing value for cursor field '{field}'"),
      })?;
      let value = Value::from_json(raw).ok_or_else(|| Error::MalformedCursorToken {
         reason: format!("cursor field '{field}' must be a string, number, or boolean"),
      })?;

      let points_next = match map.get(POINTS_NEXT_KEY) {
         None => false,
         Some(JsonValue::Bool(b)) => *b,
         Some(_) => {
            return Err(Error::MalformedCursorToken {
               reason: format!("'{POINTS_NEXT_KEY}' must be a boolean"),
            });
         }
      };

      Ok(Self { value, points_next })
   }
}
