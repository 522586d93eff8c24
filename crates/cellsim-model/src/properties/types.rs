//! Property definitions and their metadata.

use super::value::PropertyValue;
use std::fmt;
use std::marker::PhantomData;

// ============================================================================
// Base Types
// ============================================================================

/// Type a property value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyBaseType {
    /// Integer values.
    Integer,
    /// Floating-point values. Integers are accepted as well.
    Float,
    /// Text values.
    String,
    /// Boolean values.
    Bool,
}

impl PropertyBaseType {
    /// Check whether `value` is acceptable for this type.
    pub fn matches(&self, value: &PropertyValue) -> bool {
        matches!(
            (self, value),
            (PropertyBaseType::Integer, PropertyValue::Integer(_))
                | (PropertyBaseType::Float, PropertyValue::Float(_))
                | (PropertyBaseType::Float, PropertyValue::Integer(_))
                | (PropertyBaseType::String, PropertyValue::String(_))
                | (PropertyBaseType::Bool, PropertyValue::Bool(_))
        )
    }
}

impl fmt::Display for PropertyBaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyBaseType::Integer => "integer",
            PropertyBaseType::Float => "float",
            PropertyBaseType::String => "string",
            PropertyBaseType::Bool => "bool",
        };
        write!(f, "{}", name)
    }
}

// ============================================================================
// Defaults
// ============================================================================

/// Built-in default of a property, usable in `const` context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyDefault {
    /// Integer default.
    Integer(i64),
    /// Floating-point default.
    Float(f64),
    /// Text default.
    String(&'static str),
    /// Boolean default.
    Bool(bool),
}

impl PropertyDefault {
    /// Convert to a runtime value.
    pub fn to_value(&self) -> PropertyValue {
        match self {
            PropertyDefault::Integer(i) => PropertyValue::Integer(*i),
            PropertyDefault::Float(x) => PropertyValue::Float(*x),
            PropertyDefault::String(s) => PropertyValue::String(s.to_string()),
            PropertyDefault::Bool(b) => PropertyValue::Bool(*b),
        }
    }

    const fn base_type(&self) -> PropertyBaseType {
        match self {
            PropertyDefault::Integer(_) => PropertyBaseType::Integer,
            PropertyDefault::Float(_) => PropertyBaseType::Float,
            PropertyDefault::String(_) => PropertyBaseType::String,
            PropertyDefault::Bool(_) => PropertyBaseType::Bool,
        }
    }
}

impl fmt::Display for PropertyDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

// ============================================================================
// Property Definitions
// ============================================================================

/// Untyped property metadata, shared by the registry and the CLI listing.
#[derive(Debug, Clone, Copy)]
pub struct PropertyDef {
    /// Full `/`-separated name.
    pub name: &'static str,
    /// User-facing description.
    pub description: &'static str,
    /// Built-in default.
    pub default: PropertyDefault,
    /// Unit of the value, if any.
    pub unit: Option<&'static str>,
    /// Accepted value type.
    pub value_type: PropertyBaseType,
}

impl PropertyDef {
    /// Namespace part of the name (`system` for `system/users`).
    pub fn namespace(&self) -> Option<&'static str> {
        self.name.rsplit_once('/').map(|(ns, _)| ns)
    }

    /// Built-in default as a runtime value.
    pub fn default_value(&self) -> PropertyValue {
        self.default.to_value()
    }
}

/// A property with compile-time type information.
///
/// `T` is the Rust type returned by
/// [`ResolvedProperties::get`](super::registry::ResolvedProperties::get).
#[derive(Debug)]
pub struct Property<T> {
    /// Untyped metadata.
    pub def: PropertyDef,
    _type: PhantomData<fn() -> T>,
}

impl<T> Property<T> {
    /// Define a property. The accepted type follows the default.
    pub const fn new(name: &'static str, description: &'static str, default: PropertyDefault) -> Self {
        Property {
            def: PropertyDef {
                name,
                description,
                default,
                unit: None,
                value_type: default.base_type(),
            },
            _type: PhantomData,
        }
    }

    /// Attach a unit.
    pub const fn with_unit(mut self, unit: &'static str) -> Self {
        self.def.unit = Some(unit);
        self
    }

    /// Full property name.
    pub const fn name(&self) -> &'static str {
        self.def.name
    }
}
