//! Property registry, lookup functions, and property set types.
//!
//! This module provides:
//! - [`ALL_PROPERTIES`] - Array of all registered property definitions
//! - Lookup functions for finding properties by name
//! - [`ResolvedProperties`] - A complete set of property values with defaults
//! - [`UnresolvedProperties`] - A partial set of properties from YAML parsing

use super::definitions::*;
use super::types::{Property, PropertyDef};
use super::value::{FromPropertyValue, PropertyValue, ToPropertyValue};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// ============================================================================
// All Properties Array (for runtime lookup)
// ============================================================================

/// All registered property definitions.
pub const ALL_PROPERTIES: &[&PropertyDef] = &[
    // System
    &SYSTEM_ACCESS_POINTS.def,
    &SYSTEM_USERS.def,
    &SYSTEM_CHANNELS.def,
    &SYSTEM_SIZE_M.def,
    &SYSTEM_BANDWIDTH_HZ.def,
    // Channel
    &CHANNEL_POLICY.def,
    &CHANNEL_AGGREGATION.def,
    // Propagation
    &PROPAGATION_SHADOWING.def,
    &PROPAGATION_SHADOWING_SIGMA.def,
    &PROPAGATION_FADING.def,
    // Power
    &POWER_CONTROL.def,
    &POWER_FIXED_W.def,
    &POWER_MAX_W.def,
    // Simulation
    &SIMULATION_TRIALS.def,
    &SIMULATION_SEED.def,
];

// ============================================================================
// Lookup Functions
// ============================================================================

/// Check if a property name is registered.
pub fn is_known_property(name: &str) -> bool {
    get_property_def(name).is_some()
}

/// Get a property definition by name.
pub fn get_property_def(name: &str) -> Option<&'static PropertyDef> {
    ALL_PROPERTIES.iter().find(|p| p.name == name).copied()
}

/// Get all known namespaces, sorted.
pub fn known_namespaces() -> Vec<&'static str> {
    let mut namespaces: Vec<&'static str> = ALL_PROPERTIES.iter().filter_map(|p| p.namespace()).collect();
    namespaces.sort();
    namespaces.dedup();
    namespaces
}

/// Get all properties in a given namespace.
pub fn properties_by_namespace(namespace: &str) -> impl Iterator<Item = &'static PropertyDef> + '_ {
    ALL_PROPERTIES
        .iter()
        .filter(move |p| p.namespace() == Some(namespace))
        .copied()
}

// ============================================================================
// Property Set Errors
// ============================================================================

/// Errors that can occur when manipulating a property set.
#[derive(Debug, Clone, Error)]
pub enum PropertySetError {
    /// Unknown property name.
    #[error("Unknown property: {0}. Run \"cellsim properties\" for the full list")]
    UnknownProperty(String),

    /// Unsupported YAML value.
    #[error("Unsupported value type for property {0}: {1}")]
    UnsupportedValueType(String, String),

    /// Type mismatch between expected and actual value.
    #[error("Type mismatch for property '{property}': expected {expected}, got {actual}")]
    TypeMismatch {
        /// Property name.
        property: String,
        /// Expected type.
        expected: String,
        /// Actual type.
        actual: String,
    },

    /// The stored value does not fit the property's Rust type.
    #[error("Value {value} of property '{property}' is out of range")]
    OutOfRange {
        /// Property name.
        property: String,
        /// Offending value.
        value: String,
    },
}

// ============================================================================
// Resolved Property Set
// ============================================================================

/// A complete set of property values: built-in defaults overridden by
/// whatever was loaded.
#[derive(Debug, Clone)]
pub struct ResolvedProperties {
    values: BTreeMap<&'static str, PropertyValue>,
}

impl ResolvedProperties {
    /// Create a new property set with all defaults.
    pub fn new() -> Self {
        let values = ALL_PROPERTIES
            .iter()
            .map(|p| (p.name, p.default_value()))
            .collect();
        Self { values }
    }

    /// Set a property value. The value type follows the property's type.
    ///
    /// Integers that do not fit the stored `i64` are rejected with
    /// [`PropertySetError::OutOfRange`].
    pub fn set<T: ToPropertyValue>(&mut self, prop: &Property<T>, value: T) -> Result<(), PropertySetError> {
        let value = value.to_property_value().map_err(|value| PropertySetError::OutOfRange {
            property: prop.def.name.to_string(),
            value,
        })?;
        self.values.insert(prop.def.name, value);
        Ok(())
    }

    /// Get a property value converted to its declared type.
    pub fn get<T: FromPropertyValue>(&self, prop: &Property<T>) -> Result<T, PropertySetError> {
        let value = self.get_raw(prop);
        T::from_property_value(&value).ok_or_else(|| PropertySetError::OutOfRange {
            property: prop.def.name.to_string(),
            value: value.to_string(),
        })
    }

    /// Get the raw value of a property.
    pub fn get_raw<T>(&self, prop: &Property<T>) -> PropertyValue {
        self.values
            .get(prop.def.name)
            .cloned()
            .unwrap_or_else(|| prop.def.default_value())
    }

    /// Apply unresolved properties to this resolved set (they take precedence).
    pub fn apply_unresolved(&mut self, unresolved: &UnresolvedProperties) {
        for (name, value) in &unresolved.values {
            self.values.insert(*name, value.clone());
        }
    }
}

impl Default for ResolvedProperties {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Unresolved Property Set
// ============================================================================

/// A partial set of property values parsed from one YAML document.
///
/// Only contains properties that were explicitly specified.
#[derive(Debug, Clone, Default)]
pub struct UnresolvedProperties {
    values: BTreeMap<&'static str, PropertyValue>,
}

impl UnresolvedProperties {
    /// Create a new empty unresolved property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of properties specified.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether nothing was specified.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check if a property was specified.
    pub fn contains<T>(&self, prop: &Property<T>) -> bool {
        self.values.contains_key(prop.def.name)
    }

    /// Insert a raw value by property name, checking name and type.
    pub fn insert(&mut self, name: &str, value: PropertyValue) -> Result<(), PropertySetError> {
        let def = get_property_def(name).ok_or_else(|| PropertySetError::UnknownProperty(name.to_string()))?;

        if !def.value_type.matches(&value) {
            return Err(PropertySetError::TypeMismatch {
                property: def.name.to_string(),
                expected: def.value_type.to_string(),
                actual: describe_value_type(&value).to_string(),
            });
        }

        self.values.insert(def.name, value);
        Ok(())
    }
}

/// Describe the type of a PropertyValue for error messages.
fn describe_value_type(value: &PropertyValue) -> &'static str {
    match value {
        PropertyValue::Integer(_) => "integer",
        PropertyValue::Float(_) => "float",
        PropertyValue::String(_) => "string",
        PropertyValue::Bool(_) => "bool",
    }
}

// ============================================================================
// Custom Deserializer for UnresolvedProperties
// ============================================================================

impl<'de> Deserialize<'de> for UnresolvedProperties {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(UnresolvedPropertiesVisitor)
    }
}

struct UnresolvedPropertiesVisitor;

impl<'de> Visitor<'de> for UnresolvedPropertiesVisitor {
    type Value = UnresolvedProperties;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a map of cellsim properties")
    }

    fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut result = UnresolvedProperties::new();

        while let Some((key, value)) = map.next_entry::<String, serde_yaml::Value>()? {
            process_yaml_property(&mut result, &key, &value).map_err(de::Error::custom)?;
        }

        Ok(result)
    }
}

/// Process a single YAML property, recursively flattening nested maps.
fn process_yaml_property(
    result: &mut UnresolvedProperties,
    prefix: &str,
    value: &serde_yaml::Value,
) -> Result<(), PropertySetError> {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let key = k
                    .as_str()
                    .ok_or_else(|| PropertySetError::UnsupportedValueType(prefix.to_string(), "non-string key".to_string()))?;
                let full_name = if prefix.is_empty() {
                    key.to_string()
                } else {
                    format!("{}/{}", prefix, key)
                };
                process_yaml_property(result, &full_name, v)?;
            }
            Ok(())
        }
        _ => {
            let prop_value = yaml_value_to_property(prefix, value)?;
            result.insert(prefix, prop_value)
        }
    }
}

/// Convert a scalar serde_yaml::Value to a PropertyValue.
fn yaml_value_to_property(name: &str, value: &serde_yaml::Value) -> Result<PropertyValue, PropertySetError> {
    match value {
        serde_yaml::Value::Bool(b) => Ok(PropertyValue::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(PropertyValue::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(PropertyValue::Float(f))
            } else {
                Err(PropertySetError::UnsupportedValueType(name.to_string(), format!("{:?}", n)))
            }
        }
        serde_yaml::Value::String(s) => Ok(PropertyValue::String(s.clone())),
        serde_yaml::Value::Null => Err(PropertySetError::UnsupportedValueType(name.to_string(), "null".to_string())),
        serde_yaml::Value::Sequence(_) => Err(PropertySetError::UnsupportedValueType(name.to_string(), "sequence".to_string())),
        serde_yaml::Value::Mapping(_) => Err(PropertySetError::UnsupportedValueType(name.to_string(), "nested mapping".to_string())),
        serde_yaml::Value::Tagged(_) => Err(PropertySetError::UnsupportedValueType(name.to_string(), "tagged value".to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================
