use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use super::int64;

/// A gNMI leaf value. Exactly one variant is populated per update.
///
/// Byte-typed variants (`bytesVal`, `jsonVal`, `jsonIetfVal`) keep the
/// base64 text of the proto3 JSON mapping; they are carried through but
/// never decoded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypedValue {
    StringVal(String),
    #[serde(with = "int64::signed")]
    IntVal(i64),
    #[serde(with = "int64::unsigned")]
    UintVal(u64),
    BoolVal(bool),
    DoubleVal(f64),
    FloatVal(f32),
    AsciiVal(String),
    BytesVal(String),
    JsonVal(String),
    JsonIetfVal(String),
}

/// Discriminant of [`TypedValue`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ValueKind {
    String,
    Int,
    Uint,
    Bool,
    Double,
    Float,
    Ascii,
    Bytes,
    Json,
    JsonIetf,
}

impl TypedValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::StringVal(_) => ValueKind::String,
            Self::IntVal(_) => ValueKind::Int,
            Self::UintVal(_) => ValueKind::Uint,
            Self::BoolVal(_) => ValueKind::Bool,
            Self::DoubleVal(_) => ValueKind::Double,
            Self::FloatVal(_) => ValueKind::Float,
            Self::AsciiVal(_) => ValueKind::Ascii,
            Self::BytesVal(_) => ValueKind::Bytes,
            Self::JsonVal(_) => ValueKind::Json,
            Self::JsonIetfVal(_) => ValueKind::JsonIetf,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::StringVal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::BoolVal(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UintVal(n) => Some(*n),
            _ => None,
        }
    }
}
