//! Typed, identifier-keyed configuration values.
//!
//! Every property declares a [`PropertyKind`] when it is created. Binding a
//! value of another kind is rejected, and reading through a [`PropertyKey`]
//! of the wrong type reports a [`PropertyError::TypeMismatch`] instead of
//! coercing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

use crate::cancel::CancelToken;
use crate::error::PropertyError;
use crate::output::OutputSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Bool,
    String,
    StringList,
    Cancel,
    Output,
    Json,
}

impl PropertyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::String => "string",
            Self::StringList => "string_list",
            Self::Cancel => "cancel",
            Self::Output => "output",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bound property value.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    Bool(bool),
    String(String),
    StringList(Vec<String>),
    Cancel(CancelToken),
    Output(OutputSink),
    Json(serde_json::Value),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Bool(_) => PropertyKind::Bool,
            Self::String(_) => PropertyKind::String,
            Self::StringList(_) => PropertyKind::StringList,
            Self::Cancel(_) => PropertyKind::Cancel,
            Self::Output(_) => PropertyKind::Output,
            Self::Json(_) => PropertyKind::Json,
        }
    }
}

/// Rust types that can be stored in a property.
pub trait PropertyType: Sized {
    const KIND: PropertyKind;

    fn into_value(self) -> PropertyValue;

    fn from_value(value: &PropertyValue) -> Option<Self>;
}

macro_rules! property_type {
    ($ty:ty, $variant:ident) => {
        impl PropertyType for $ty {
            const KIND: PropertyKind = PropertyKind::$variant;

            fn into_value(self) -> PropertyValue {
                PropertyValue::$variant(self)
            }

            fn from_value(value: &PropertyValue) -> Option<Self> {
                match value {
                    PropertyValue::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }
        }
    };
}

property_type!(bool, Bool);
property_type!(String, String);
property_type!(Vec<String>, StringList);
property_type!(CancelToken, Cancel);
property_type!(OutputSink, Output);
property_type!(serde_json::Value, Json);

/// Compile-time typed handle to a property id.
pub struct PropertyKey<T> {
    id: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for PropertyKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PropertyKey<T> {}

impl<T> fmt::Debug for PropertyKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PropertyKey").field(&self.id).finish()
    }
}

impl<T: PropertyType> PropertyKey<T> {
    pub const fn new(id: &'static str) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn kind(&self) -> PropertyKind {
        T::KIND
    }

    /// Declare an unbound property of this key's type.
    pub fn declare(&self) -> Property {
        Property::new(self.id, T::KIND)
    }

    /// Declare a property already bound to `value`.
    pub fn bind(&self, value: T) -> Property {
        Property {
            value: Some(value.into_value()),
            ..self.declare()
        }
    }
}

/// A single named configuration value consumed by an operation.
#[derive(Debug, Clone)]
pub struct Property {
    id: String,
    kind: PropertyKind,
    value: Option<PropertyValue>,
    label: Option<String>,
    description: Option<String>,
    required: bool,
    internal: bool,
}

impl Property {
    pub fn new(id: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            id: id.into(),
            kind,
            value: None,
            label: None,
            description: None,
            required: false,
            internal: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the property as required at exec time.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the property as set by code rather than by a human caller.
    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    pub fn with_value(mut self, value: PropertyValue) -> Result<Self, PropertyError> {
        self.set(value)?;
        Ok(self)
    }

    /// Bind a value. The value's kind must equal the declared kind.
    pub fn set(&mut self, value: PropertyValue) -> Result<(), PropertyError> {
        if value.kind() != self.kind {
            return Err(PropertyError::TypeMismatch {
                id: self.id.clone(),
                expected: self.kind,
                found: value.kind(),
            });
        }
        self.value = Some(value);
        Ok(())
    }

    /// Read the bound value as `T`.
    ///
    /// `Ok(None)` means the property is declared but unbound.
    pub fn get<T: PropertyType>(&self) -> Result<Option<T>, PropertyError> {
        if T::KIND != self.kind {
            return Err(PropertyError::TypeMismatch {
                id: self.id.clone(),
                expected: T::KIND,
                found: self.kind,
            });
        }
        Ok(self.value.as_ref().and_then(T::from_value))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    pub fn value(&self) -> Option<&PropertyValue> {
        self.value.as_ref()
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_internal(&self) -> bool {
        self.internal
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}
