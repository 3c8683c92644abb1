//! Property types and values.
//!
//! Every property carries a declared type tag. Values are held either as
//! text (every non-binary type, in its canonical string form) or as raw
//! bytes for binary properties.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The declared type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    String,
    Binary,
    Long,
    Double,
    Date,
    Boolean,
    Name,
    Path,
    Reference,
    WeakReference,
    Uri,
    Decimal,
    Undefined,
}

impl PropertyType {
    /// The standard type name used in serialized output.
    pub fn name(&self) -> &'static str {
        match self {
            PropertyType::String => "String",
            PropertyType::Binary => "Binary",
            PropertyType::Long => "Long",
            PropertyType::Double => "Double",
            PropertyType::Date => "Date",
            PropertyType::Boolean => "Boolean",
            PropertyType::Name => "Name",
            PropertyType::Path => "Path",
            PropertyType::Reference => "Reference",
            PropertyType::WeakReference => "WeakReference",
            PropertyType::Uri => "URI",
            PropertyType::Decimal => "Decimal",
            PropertyType::Undefined => "undefined",
        }
    }

    /// Look up a type by its standard name.
    pub fn from_name(name: &str) -> Option<Self> {
        let ty = match name {
            "String" => PropertyType::String,
            "Binary" => PropertyType::Binary,
            "Long" => PropertyType::Long,
            "Double" => PropertyType::Double,
            "Date" => PropertyType::Date,
            "Boolean" => PropertyType::Boolean,
            "Name" => PropertyType::Name,
            "Path" => PropertyType::Path,
            "Reference" => PropertyType::Reference,
            "WeakReference" => PropertyType::WeakReference,
            "URI" => PropertyType::Uri,
            "Decimal" => PropertyType::Decimal,
            "undefined" => PropertyType::Undefined,
            _ => return None,
        };
        Some(ty)
    }

    /// Whether values of this type are raw bytes.
    pub fn is_binary(&self) -> bool {
        matches!(self, PropertyType::Binary)
    }

    /// Whether values of this type hold node identifiers.
    pub fn is_reference(&self) -> bool {
        matches!(self, PropertyType::Reference | PropertyType::WeakReference)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// Canonical string form of any non-binary value.
    Text(String),
    /// Raw bytes of a binary value.
    Binary(Vec<u8>),
}

impl Value {
    /// Get the text, `None` for binary values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Binary(_) => None,
        }
    }

    /// Get the value as bytes; text is returned as its UTF-8 encoding.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Value::Text(s) => s.as_bytes(),
            Value::Binary(b) => b,
        }
    }

    /// Returns true if this is a binary value.
    pub fn is_binary(&self) -> bool {
        matches!(self, Value::Binary(_))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Binary(b)
    }
}

/// A named, typed property as stored and transferred: single- or
/// multi-valued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyData {
    /// Property name.
    pub name: String,
    /// Declared type.
    pub property_type: PropertyType,
    /// Multi-valued flag.
    pub multiple: bool,
    /// Values; exactly one for a single-valued property.
    pub values: Vec<Value>,
}

impl PropertyData {
    /// A single-valued property.
    pub fn single(name: impl Into<String>, property_type: PropertyType, value: Value) -> Self {
        Self {
            name: name.into(),
            property_type,
            multiple: false,
            values: vec![value],
        }
    }

    /// A multi-valued property.
    pub fn multiple(name: impl Into<String>, property_type: PropertyType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            property_type,
            multiple: true,
            values,
        }
    }

    /// A single-valued `String` property.
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::single(name, PropertyType::String, Value::Text(value.into()))
    }

    /// A single-valued `Binary` property.
    pub fn binary(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::single(name, PropertyType::Binary, Value::Binary(bytes.into()))
    }
}
