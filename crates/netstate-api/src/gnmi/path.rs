use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One element of a gNMI path: a container or leaf name plus its keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathElem {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub key: BTreeMap<String, String>,
}

impl PathElem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: BTreeMap::new(),
        }
    }

    /// Builder-style key insertion.
    pub fn with_key(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.key.insert(name.into(), value.into());
        self
    }

    /// Value of the key `name`, if present.
    pub fn key_value(&self, name: &str) -> Option<&str> {
        self.key.get(name).map(String::as_str)
    }
}

/// A full gNMI path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default)]
    pub elem: Vec<PathElem>,
}

impl Path {
    pub fn new(elem: Vec<PathElem>) -> Self {
        Self { origin: None, elem }
    }

    pub fn len(&self) -> usize {
        self.elem.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elem.is_empty()
    }

    /// Prepend `prefix` to this path, as gNMI requires for notification
    /// prefixes. The prefix origin wins when both carry one.
    pub fn join_prefix(self, prefix: &Path) -> Path {
        if prefix.elem.is_empty() && prefix.origin.is_none() {
            return self;
        }
        let mut elem = prefix.elem.clone();
        elem.extend(self.elem);
        Path {
            origin: prefix.origin.clone().or(self.origin),
            elem,
        }
    }
}

/// Renders the XPath-like string form, e.g.
/// `/lldp/interfaces/interface[name=Ethernet1]/state`.
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(origin) = &self.origin {
            write!(f, "{origin}:")?;
        }
        if self.elem.is_empty() {
            return f.write_str("/");
        }
        for elem in &self.elem {
            write!(f, "/{}", elem.name)?;
            for (k, v) in &elem.key {
                write!(f, "[{k}=")?;
                for c in v.chars() {
                    if matches!(c, ']' | '\\') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("]")?;
            }
        }
        Ok(())
    }
}
