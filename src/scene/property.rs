//! Named, typed component properties.
//!
//! Array-valued properties are edited through [`WriteableArray`], a guard that
//! hands out a working copy of the buffer and writes it back when released.

use std::ops::{Deref, DerefMut};

use crate::error::{CaptureError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    UInt(u64),
    Real(f64),
    Text(String),
    Array(Vec<f64>),
}

impl PropertyValue {
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::UInt(_) => "uint",
            PropertyValue::Real(_) => "real",
            PropertyValue::Text(_) => "text",
            PropertyValue::Array(_) => "array",
        }
    }

    pub fn as_array(&self) -> Option<&[f64]> {
        match self {
            PropertyValue::Array(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<u64> for PropertyValue {
    fn from(v: u64) -> Self {
        PropertyValue::UInt(v)
    }
}

impl From<u32> for PropertyValue {
    fn from(v: u32) -> Self {
        PropertyValue::UInt(v as u64)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Real(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

impl From<Vec<f64>> for PropertyValue {
    fn from(v: Vec<f64>) -> Self {
        PropertyValue::Array(v)
    }
}

impl From<[f64; 3]> for PropertyValue {
    fn from(v: [f64; 3]) -> Self {
        PropertyValue::Array(v.to_vec())
    }
}

/// Components whose fields can be read and written by name.
pub trait HasProperties {
    fn property_names(&self) -> &'static [&'static str];

    fn get_property(&self, name: &str) -> Option<PropertyValue>;

    /// Writes a property. Rejects unknown names, wrong kinds and invalid values.
    fn set_property(&mut self, name: &str, value: PropertyValue) -> Result<()>;
}

/// Scoped mutable view of an array property.
///
/// The buffer is written back with [`commit`](Self::commit), or on drop if the
/// guard goes out of scope uncommitted (early returns and unwinding included).
/// A failed write-back on drop can only be logged; call `commit` to observe it.
pub struct WriteableArray<'a, T: HasProperties + ?Sized> {
    target: &'a mut T,
    name: String,
    buffer: Vec<f64>,
    committed: bool,
}

impl<'a, T: HasProperties + ?Sized> WriteableArray<'a, T> {
    pub fn new(target: &'a mut T, name: &str) -> Result<Self> {
        let buffer = match target.get_property(name) {
            Some(PropertyValue::Array(values)) => values,
            Some(other) => {
                return Err(CaptureError::scene(format!(
                    "property '{name}' holds a {} value, not an array",
                    other.kind()
                )))
            }
            None => return Err(CaptureError::scene(format!("unknown property '{name}'"))),
        };
        Ok(Self {
            target,
            name: name.to_string(),
            buffer,
            committed: false,
        })
    }

    pub fn commit(mut self) -> Result<()> {
        self.write_back()
    }

    fn write_back(&mut self) -> Result<()> {
        self.committed = true;
        let values = std::mem::take(&mut self.buffer);
        self.target
            .set_property(&self.name, PropertyValue::Array(values))
    }
}

impl<T: HasProperties + ?Sized> Deref for WriteableArray<'_, T> {
    type Target = Vec<f64>;
    fn deref(&self) -> &Vec<f64> {
        &self.buffer
    }
}

impl<T: HasProperties + ?Sized> DerefMut for WriteableArray<'_, T> {
    fn deref_mut(&mut self) -> &mut Vec<f64> {
        &mut self.buffer
    }
}

impl<T: HasProperties + ?Sized> Drop for WriteableArray<'_, T> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(err) = self.write_back() {
            log::error!("failed to commit array property '{}': {err}", self.name);
        }
    }
}

/// Runs `f` on a writable copy of array property `name` and commits the result.
pub fn with_array_mut<T, R>(target: &mut T, name: &str, f: impl FnOnce(&mut Vec<f64>) -> R) -> Result<R>
where
    T: HasProperties + ?Sized,
{
    let mut guard = WriteableArray::new(target, name)?;
    let out = f(&mut guard);
    guard.commit()?;
    Ok(out)
}

// Helpers for `HasProperties::set_property` implementations.

pub(crate) fn unknown(owner: &str, name: &str) -> CaptureError {
    CaptureError::scene(format!("{owner} has no property '{name}'"))
}

fn wrong_kind(name: &str, expected: &str, got: &PropertyValue) -> CaptureError {
    CaptureError::scene(format!(
        "property '{name}' expects a {expected} value, got {}",
        got.kind()
    ))
}

pub(crate) fn expect_bool(name: &str, value: PropertyValue) -> Result<bool> {
    match value {
        PropertyValue::Bool(v) => Ok(v),
        other => Err(wrong_kind(name, "bool", &other)),
    }
}

pub(crate) fn expect_uint(name: &str, value: PropertyValue) -> Result<u64> {
    match value {
        PropertyValue::UInt(v) => Ok(v),
        other => Err(wrong_kind(name, "uint", &other)),
    }
}

/// Accepts integers too, since scene files rarely distinguish `5` from `5.0`.
pub(crate) fn expect_real(name: &str, value: PropertyValue) -> Result<f64> {
    match value {
        PropertyValue::Real(v) if v.is_finite() => Ok(v),
        PropertyValue::UInt(v) => Ok(v as f64),
        PropertyValue::Real(v) => Err(CaptureError::scene(format!(
            "property '{name}' must be finite, got {v}"
        ))),
        other => Err(wrong_kind(name, "real", &other)),
    }
}

pub(crate) fn expect_text(name: &str, value: PropertyValue) -> Result<String> {
    match value {
        PropertyValue::Text(v) => Ok(v),
        other => Err(wrong_kind(name, "text", &other)),
    }
}

/// Array with finite entries and, if given, exactly `len` of them.
pub(crate) fn expect_array(name: &str, value: PropertyValue, len: Option<usize>) -> Result<Vec<f64>> {
    let values = match value {
        PropertyValue::Array(v) => v,
        other => return Err(wrong_kind(name, "array", &other)),
    };
    if let Some(len) = len {
        if values.len() != len {
            return Err(CaptureError::scene(format!(
                "property '{name}' expects {len} values, got {}",
                values.len()
            )));
        }
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(CaptureError::scene(format!(
            "property '{name}' contains non-finite values"
        )));
    }
    Ok(values)
}
