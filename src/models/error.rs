//! Errors raised while reading a snapshot through the typed node layer.
//!
//! Every variant is detected synchronously at the point of access and is
//! never retried; callers decide whether a failure is fatal for them.

use crate::models::node::NodeKind;
use core::fmt;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A decoded value cannot be represented as a node.
    Data { path: String, reason: String },
    /// A required key is absent from a map-shaped node.
    Attribute { entity: &'static str, key: String },
    /// A key is present but holds a node of another kind.
    Type {
        entity: &'static str,
        key: String,
        expected: &'static str,
        found: NodeKind,
    },
    /// A view was built over a node of the wrong kind.
    Shape {
        entity: &'static str,
        expected: NodeKind,
        found: NodeKind,
    },
    /// An identity field is a string but not a valid encoding.
    Id {
        entity: &'static str,
        value: String,
        reason: String,
    },
    /// A caller-supplied reference instant lacks a UTC offset.
    Precondition(String),
    UnknownTimezone(String),
    EmptyTimetable,
    /// Calendar arithmetic left the representable range.
    OutOfRange(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Data { path, reason } => {
                if path.is_empty() {
                    write!(f, "unsupported value: {}", reason)
                } else {
                    write!(f, "unsupported value at {}: {}", path, reason)
                }
            }
            ModelError::Attribute { entity, key } => {
                write!(f, "{} attribute '{}' is missing", entity, key)
            }
            ModelError::Type {
                entity,
                key,
                expected,
                found,
            } => write!(
                f,
                "{} attribute '{}' is invalid type: expected {}, found {}",
                entity, key, expected, found
            ),
            ModelError::Shape {
                entity,
                expected,
                found,
            } => write!(f, "{} must be a {}, found {}", entity, expected, found),
            ModelError::Id { entity, value, reason } => {
                write!(f, "{} ID '{}' is invalid: {}", entity, value, reason)
            }
            ModelError::Precondition(s) => write!(f, "precondition violated: {}", s),
            ModelError::UnknownTimezone(tz) => write!(f, "unknown time zone '{}'", tz),
            ModelError::EmptyTimetable => write!(f, "schedule has an empty timetable"),
            ModelError::OutOfRange(s) => write!(f, "date out of range: {}", s),
        }
    }
}

impl Error for ModelError {}
