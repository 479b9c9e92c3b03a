//! Value Objects for the variation configurator

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// SKU (Stock Keeping Unit) of a concrete, sellable variant
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sku(String);

impl Sku {
    pub const MAX_LEN: usize = 128;

    pub fn new(value: impl Into<String>) -> Result<Self, SkuError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(SkuError::Empty); }
        if value.len() > Self::MAX_LEN { return Err(SkuError::TooLong); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl TryFrom<String> for Sku {
    type Error = SkuError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Sku> for String {
    fn from(sku: Sku) -> Self { sku.0 }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkuError {
    #[error("SKU empty")]
    Empty,
    #[error("SKU too long")]
    TooLong,
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }
            pub fn as_str(&self) -> &str { &self.0 }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self { Self(s.to_string()) }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self { Self(s) }
        }
    };
}

string_id!(
    /// Identifier of a variation axis ("Size", "Color", ...)
    AxisId
);
string_id!(
    /// Identifier of one option on an axis; only unique within that axis
    OptionId
);

/// Canonical key of a combination: one option id per axis, in axis order.
///
/// Every matrix entry, enumerated combination and ledger slot goes through
/// [`CombinationKey::from_option_ids`], so the three always agree.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombinationKey(String);

impl CombinationKey {
    pub const SEPARATOR: char = '|';

    pub fn from_option_ids<'a, I>(option_ids: I) -> Self
    where
        I: IntoIterator<Item = &'a OptionId>,
    {
        let mut key = String::new();
        for (i, id) in option_ids.into_iter().enumerate() {
            if i > 0 { key.push(Self::SEPARATOR); }
            for c in id.as_str().chars() {
                if c == '\\' || c == Self::SEPARATOR { key.push('\\'); }
                key.push(c);
            }
        }
        Self(key)
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for CombinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for CombinationKey {
    fn from(s: &str) -> Self { Self(s.to_string()) }
}

/// Quantity as typed by a shopper, before clamping
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestedQuantity {
    Number(f64),
    Text(String),
}

impl RequestedQuantity {
    /// Committed value: `max(0, floor(n))`; anything non-numeric is 0.
    pub fn committed(&self) -> u32 {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        };
        if !value.is_finite() || value <= 0.0 { return 0; }
        let floored = value.floor();
        if floored >= u32::MAX as f64 { u32::MAX } else { floored as u32 }
    }
}

impl From<f64> for RequestedQuantity {
    fn from(n: f64) -> Self { Self::Number(n) }
}

impl From<i64> for RequestedQuantity {
    fn from(n: i64) -> Self { Self::Number(n as f64) }
}

impl From<u32> for RequestedQuantity {
    fn from(n: u32) -> Self { Self::Number(f64::from(n)) }
}

impl From<&str> for RequestedQuantity {
    fn from(s: &str) -> Self { Self::Text(s.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sku() {
        let sku = Sku::new("  child-001 ").unwrap();
        assert_eq!(sku.as_str(), "child-001");
        assert_eq!(Sku::new("   "), Err(SkuError::Empty));
        assert_eq!(Sku::new("x".repeat(129)), Err(SkuError::TooLong));
    }

    #[test]
    fn test_key_follows_axis_order() {
        let red = OptionId::from("red");
        let m = OptionId::from("m");
        let key = CombinationKey::from_option_ids([&red, &m]);
        assert_eq!(key.as_str(), "red|m");
        assert_ne!(key, CombinationKey::from_option_ids([&m, &red]));
    }

    #[test]
    fn test_key_escapes_separator() {
        let a = CombinationKey::from_option_ids([&OptionId::from("a|b"), &OptionId::from("c")]);
        let b = CombinationKey::from_option_ids([&OptionId::from("a"), &OptionId::from("b|c")]);
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "a\\|b|c");
    }

    #[test]
    fn test_requested_quantity_clamps() {
        assert_eq!(RequestedQuantity::from(-5i64).committed(), 0);
        assert_eq!(RequestedQuantity::from(3.7).committed(), 3);
        assert_eq!(RequestedQuantity::from("12").committed(), 12);
        assert_eq!(RequestedQuantity::from("abc").committed(), 0);
        assert_eq!(RequestedQuantity::from(f64::NAN).committed(), 0);
        assert_eq!(RequestedQuantity::from(f64::INFINITY).committed(), 0);
    }

    #[test]
    fn test_requested_quantity_deserializes_either_shape() {
        let n: RequestedQuantity = serde_json::from_str("2.5").unwrap();
        let s: RequestedQuantity = serde_json::from_str("\"4\"").unwrap();
        assert_eq!(n.committed(), 2);
        assert_eq!(s.committed(), 4);
    }
}
