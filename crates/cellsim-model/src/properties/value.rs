//! Property values and conversions to and from Rust types.

use serde::Serialize;
use std::fmt;

/// A dynamically typed property value, as read from YAML.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Signed integer.
    Integer(i64),
    /// Floating-point number.
    Float(f64),
    /// Text.
    String(String),
    /// Boolean flag.
    Bool(bool),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(x) => write!(f, "{}", x),
            PropertyValue::String(s) => write!(f, "\"{}\"", s),
            PropertyValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Conversion from a [`PropertyValue`] into a concrete type.
///
/// Returns `None` when the value has the wrong type or does not fit.
pub trait FromPropertyValue: Sized {
    /// Convert the value.
    fn from_property_value(value: &PropertyValue) -> Option<Self>;
}

/// Conversion from a concrete type into a [`PropertyValue`].
///
/// Fails with the value rendered as text when it has no representation,
/// such as an unsigned integer above `i64::MAX`.
pub trait ToPropertyValue {
    /// Convert the value.
    fn to_property_value(self) -> Result<PropertyValue, String>;
}

macro_rules! impl_integer_property {
    ($($ty:ty),*) => {
        $(
            impl FromPropertyValue for $ty {
                fn from_property_value(value: &PropertyValue) -> Option<Self> {
                    match value {
                        PropertyValue::Integer(i) => <$ty>::try_from(*i).ok(),
                        _ => None,
                    }
                }
            }

            impl ToPropertyValue for $ty {
                fn to_property_value(self) -> Result<PropertyValue, String> {
                    i64::try_from(self)
                        .map(PropertyValue::Integer)
                        .map_err(|_| self.to_string())
                }
            }
        )*
    };
}

impl_integer_property!(u32, u64, usize, i64);

impl FromPropertyValue for f64 {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Float(x) => Some(*x),
            PropertyValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl ToPropertyValue for f64 {
    fn to_property_value(self) -> Result<PropertyValue, String> {
        Ok(PropertyValue::Float(self))
    }
}

impl FromPropertyValue for bool {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl ToPropertyValue for bool {
    fn to_property_value(self) -> Result<PropertyValue, String> {
        Ok(PropertyValue::Bool(self))
    }
}

impl FromPropertyValue for String {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl ToPropertyValue for String {
    fn to_property_value(self) -> Result<PropertyValue, String> {
        Ok(PropertyValue::String(self))
    }
}

impl ToPropertyValue for &str {
    fn to_property_value(self) -> Result<PropertyValue, String> {
        Ok(PropertyValue::String(self.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widening_to_float() {
        assert_eq!(f64::from_property_value(&PropertyValue::Integer(1000)), Some(1000.0));
    }

    #[test]
    fn test_negative_integer_rejected_for_unsigned() {
        assert_eq!(u32::from_property_value(&PropertyValue::Integer(-1)), None);
        assert_eq!(usize::from_property_value(&PropertyValue::Integer(9)), Some(9));
    }

    #[test]
    fn test_unsigned_above_i64_has_no_value() {
        assert_eq!(u64::MAX.to_property_value(), Err("18446744073709551615".to_string()));
        assert_eq!((i64::MAX as u64).to_property_value(), Ok(PropertyValue::Integer(i64::MAX)));
        assert_eq!(7usize.to_property_value(), Ok(PropertyValue::Integer(7)));
    }

    #[test]
    fn test_wrong_type_rejected() {
        assert_eq!(bool::from_property_value(&PropertyValue::Integer(1)), None);
        assert_eq!(String::from_property_value(&PropertyValue::Bool(true)), None);
    }
}
