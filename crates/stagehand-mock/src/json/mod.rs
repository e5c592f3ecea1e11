//! JSON body descent for expectation matching.
//!
//! JSON expectations address values by a path of object fields and array
//! indices. Descent is strict about the inner steps of a path: a wrong
//! container type or a missing inner key is an error, because the test
//! author addressed a structure the body does not have. Only the final step
//! may be absent — that is the difference between "the key is not there"
//! and "the key is there with the value `null`", and the two must never be
//! conflated.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// One step of a JSON path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum JsonKey {
    /// A field of a JSON object.
    Field(String),
    /// An index into a JSON array.
    Index(usize),
}

impl From<&str> for JsonKey {
    fn from(field: &str) -> Self {
        Self::Field(field.into())
    }
}

impl From<String> for JsonKey {
    fn from(field: String) -> Self {
        Self::Field(field)
    }
}

impl From<usize> for JsonKey {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// A path into a JSON document.
pub type JsonPath = Vec<JsonKey>;

/// Renders a path in `foo.bar[2]` notation.
///
/// # Example
///
/// ```
/// use stagehand_mock::{JsonKey, format_path};
///
/// let path = vec![JsonKey::from("rules"), JsonKey::from(0), JsonKey::from("name")];
/// assert_eq!(format_path(&path), "rules[0].name");
/// ```
#[must_use]
pub fn format_path(path: &[JsonKey]) -> String {
    let mut rendered = String::new();
    for (position, key) in path.iter().enumerate() {
        match key {
            JsonKey::Index(index) => {
                use fmt::Write as _;
                let _ = write!(rendered, "[{index}]");
            }
            JsonKey::Field(field) => {
                if position > 0 {
                    rendered.push('.');
                }
                rendered.push_str(field);
            }
        }
    }
    rendered
}

/// Structural failures while descending into a JSON document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DescentError {
    /// A field step was applied to a value that is not an object.
    #[error("cannot resolve JSON key {path} in data: not an object on last level")]
    NotAnObject {
        /// Rendered path up to and including the offending step.
        path: String,
    },
    /// An index step was applied to a value that is not an array.
    #[error("cannot resolve JSON key {path} in data: not an array on last level")]
    NotAnArray {
        /// Rendered path up to and including the offending step.
        path: String,
    },
    /// An inner field of the path does not exist.
    #[error("cannot find JSON key {path} in data: key not present")]
    MissingKey {
        /// Rendered path up to and including the missing step.
        path: String,
    },
    /// An inner index of the path is out of bounds.
    #[error("cannot find JSON key {path} in data: index out of bounds")]
    IndexOutOfBounds {
        /// Rendered path up to and including the offending step.
        path: String,
    },
}

fn path_prefix(path: &[JsonKey], len: usize) -> String {
    let prefix: Vec<JsonKey> = path.iter().take(len).cloned().collect();
    format_path(&prefix)
}

/// Resolves `path` inside `data`.
///
/// Returns `Ok(Some(value))` when the full path resolves (a `null` value is
/// present like any other), `Ok(None)` when only the final step is missing,
/// and an error when an inner step cannot be resolved at all.
///
/// # Errors
///
/// Returns a [`DescentError`] when an inner step hits the wrong container
/// type, a missing field, or an out-of-bounds index, or when the final step
/// is applied to the wrong container type.
pub fn descend<'a>(data: &'a Value, path: &[JsonKey]) -> Result<Option<&'a Value>, DescentError> {
    let Some((last, inner)) = path.split_last() else {
        return Ok(Some(data));
    };

    let mut current = data;
    for (position, key) in inner.iter().enumerate() {
        let rendered = || path_prefix(path, position + 1);
        current = match key {
            JsonKey::Index(index) => {
                let Value::Array(items) = current else {
                    return Err(DescentError::NotAnArray { path: rendered() });
                };
                items
                    .get(*index)
                    .ok_or_else(|| DescentError::IndexOutOfBounds { path: rendered() })?
            }
            JsonKey::Field(field) => {
                let Value::Object(map) = current else {
                    return Err(DescentError::NotAnObject { path: rendered() });
                };
                map.get(field)
                    .ok_or_else(|| DescentError::MissingKey { path: rendered() })?
            }
        };
    }

    match last {
        JsonKey::Index(index) => {
            let Value::Array(items) = current else {
                return Err(DescentError::NotAnArray {
                    path: format_path(path),
                });
            };
            Ok(items.get(*index))
        }
        JsonKey::Field(field) => {
            let Value::Object(map) = current else {
                return Err(DescentError::NotAnObject {
                    path: format_path(path),
                });
            };
            Ok(map.get(field))
        }
    }
}

#[cfg(test)]
mod tests;
