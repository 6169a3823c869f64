//! Product identifiers.
//!
//! Supabase hands out numeric primary keys, while older cart snapshots and
//! form posts carry them as strings. [`ProductId`] accepts both on input and
//! always serializes as a string, so a cart written by one host reads back
//! equal in another.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a catalog product, unique within a cart.
///
/// # Example
///
/// ```rust
/// use alcary_core::ProductId;
///
/// let from_number: ProductId = serde_json::from_str("7").unwrap();
/// let from_text: ProductId = serde_json::from_str("\"7\"").unwrap();
/// assert_eq!(from_number, from_text);
/// assert_eq!(from_number.as_str(), "7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a product ID from its textual form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_owned())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the ID is blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read an ID from a loosely-typed JSON value (number or string).
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let id = match value {
            serde_json::Value::String(s) => Self::new(s.as_str()),
            serde_json::Value::Number(n) => Self::new(n.to_string()),
            _ => return None,
        };
        (!id.is_empty()).then_some(id)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Integer(i64),
            Unsigned(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self::new(s),
            Raw::Integer(n) => Self(n.to_string()),
            Raw::Unsigned(n) => Self(n.to_string()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_number_and_string_agree() {
        let a: ProductId = serde_json::from_str("42").unwrap();
        let b: ProductId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_serializes_as_string() {
        let id = ProductId::from(12);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"12\"");
    }

    #[test]
    fn test_from_value_rejects_blank_and_objects() {
        assert!(ProductId::from_value(&serde_json::json!("  ")).is_none());
        assert!(ProductId::from_value(&serde_json::json!({"id": 1})).is_none());
        assert_eq!(
            ProductId::from_value(&serde_json::json!(3)),
            Some(ProductId::from(3))
        );
    }
}
