// ── Response walker ──
//
// Turns the flat (path, value) list of one Get into identity-tagged
// records, reading identity keys at the positions named by the template's
// binding table. Structural mismatches are reported per record so a single
// malformed entry never costs the rest of the response.

use std::fmt;
use std::marker::PhantomData;

use netstate_api::{TypedValue, Update, ValueKind};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::pathspec::{IdentityField, PathTemplate, TypedTemplate};

// ── Leaf values ─────────────────────────────────────────────────────

/// A Rust type a template leaf decodes into.
pub trait LeafValue: Sized {
    /// The only `TypedValue` variant accepted for this leaf.
    const KIND: ValueKind;

    fn from_typed(value: &TypedValue) -> Option<Self>;
}

impl LeafValue for String {
    const KIND: ValueKind = ValueKind::String;

    fn from_typed(value: &TypedValue) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

impl LeafValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_typed(value: &TypedValue) -> Option<Self> {
        value.as_bool()
    }
}

impl LeafValue for u64 {
    const KIND: ValueKind = ValueKind::Uint;

    fn from_typed(value: &TypedValue) -> Option<Self> {
        value.as_u64()
    }
}

// ── Identity ────────────────────────────────────────────────────────

/// Identity tuple of one extracted value, in binding order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Identity(Vec<(IdentityField, String)>);

impl Identity {
    pub fn new(values: Vec<(IdentityField, String)>) -> Self {
        Self(values)
    }

    pub fn get(&self, field: IdentityField) -> Option<&str> {
        self.0
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str())
    }

    /// Like [`get`](Self::get), but a missing field is a structural mismatch.
    pub fn require(&self, field: IdentityField) -> Result<&str, StructuralMismatch> {
        self.get(field)
            .ok_or_else(|| StructuralMismatch::MissingIdentityField {
                field,
                identity: self.to_string(),
            })
    }

    /// Ordered concatenation of the values of `fields`.
    pub fn key(&self, fields: &[IdentityField]) -> Result<IdentityKey, StructuralMismatch> {
        fields
            .iter()
            .map(|f| self.require(*f).map(str::to_owned))
            .collect::<Result<Vec<_>, _>>()
            .map(IdentityKey)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (field, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field}={value}")?;
        }
        f.write_str("}")
    }
}

/// Exact-match lookup key: identity values in a fixed field order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(Vec<String>);

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("|"))
    }
}

// ── Errors ──────────────────────────────────────────────────────────

/// A returned path does not have the shape its template promises.
/// Always recoverable per record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralMismatch {
    #[error("{path}: {len} elements, {field} expected at element {index}")]
    Truncated {
        path: String,
        len: usize,
        field: IdentityField,
        index: usize,
    },

    #[error("{path}: element {index} is '{found}', expected '{expected}'")]
    ElementMismatch {
        path: String,
        index: usize,
        expected: String,
        found: String,
    },

    #[error("{path}: element {index} has no key '{key}' for {field}")]
    MissingKey {
        path: String,
        index: usize,
        key: String,
        field: IdentityField,
    },

    #[error("identity {identity} has no {field}")]
    MissingIdentityField {
        field: IdentityField,
        identity: String,
    },
}

/// Failure to extract one record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WalkError {
    #[error(transparent)]
    Structural(#[from] StructuralMismatch),

    /// The leaf carried a different `TypedValue` variant than the template
    /// declares. This breaks the template's contract and is not skipped.
    #[error("{path}: expected {expected} value, got {found}")]
    ValueKind {
        path: String,
        expected: ValueKind,
        found: ValueKind,
    },
}

// ── Extraction ──────────────────────────────────────────────────────

/// One decoded value and the identity it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted<V> {
    pub identity: Identity,
    pub value: V,
}

/// Read the identity of `update` according to `template`'s bindings.
///
/// Only bound positions are inspected; other elements may carry anything.
pub fn extract_identity(template: &PathTemplate, update: &Update) -> Result<Identity, StructuralMismatch> {
    let elems = &update.path.elem;
    let mut values = Vec::with_capacity(template.bindings().len());

    for binding in template.bindings() {
        let Some(elem) = elems.get(binding.segment) else {
            return Err(StructuralMismatch::Truncated {
                path: update.path.to_string(),
                len: elems.len(),
                field: binding.field,
                index: binding.segment,
            });
        };
        if elem.name != binding.element {
            return Err(StructuralMismatch::ElementMismatch {
                path: update.path.to_string(),
                index: binding.segment,
                expected: binding.element.clone(),
                found: elem.name.clone(),
            });
        }
        let Some(value) = elem.key_value(&binding.key) else {
            return Err(StructuralMismatch::MissingKey {
                path: update.path.to_string(),
                index: binding.segment,
                key: binding.key.clone(),
                field: binding.field,
            });
        };
        values.push((binding.field, value.to_owned()));
    }

    Ok(Identity(values))
}

/// Extract one record: identity plus the leaf decoded as `V`.
pub fn extract<V: LeafValue>(template: &PathTemplate, update: &Update) -> Result<Extracted<V>, WalkError> {
    let identity = extract_identity(template, update)?;
    let value = V::from_typed(&update.val).ok_or_else(|| WalkError::ValueKind {
        path: update.path.to_string(),
        expected: V::KIND,
        found: update.val.kind(),
    })?;
    Ok(Extracted { identity, value })
}

/// Lazy walk over a response, one result per update, in transport order.
pub struct Walk<'a, V> {
    template: &'a PathTemplate,
    updates: std::slice::Iter<'a, Update>,
    _leaf: PhantomData<fn() -> V>,
}

/// Walk `updates` with the template and leaf type of `field`.
pub fn walk<'a, V: LeafValue>(field: &'a TypedTemplate<V>, updates: &'a [Update]) -> Walk<'a, V> {
    Walk {
        template: &field.template,
        updates: updates.iter(),
        _leaf: PhantomData,
    }
}

impl<V: LeafValue> Iterator for Walk<'_, V> {
    type Item = Result<Extracted<V>, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.updates.next().map(|u| extract(self.template, u))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.updates.size_hint()
    }
}

/// Records of a completed walk plus the count of skipped malformed ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walked<V> {
    pub records: Vec<Extracted<V>>,
    pub skipped: usize,
}

impl<V: LeafValue> Walk<'_, V> {
    /// Drain the walk, skipping structural mismatches (logged) and failing
    /// on the first value-kind violation.
    pub fn collect_records(self) -> Result<Walked<V>, WalkError> {
        let mut records = Vec::with_capacity(self.updates.len());
        let mut skipped = 0;
        for item in self {
            match item {
                Ok(record) => records.push(record),
                Err(WalkError::Structural(mismatch)) => {
                    warn!(error = %mismatch, "skipping malformed record");
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Walked { records, skipped })
    }
}
