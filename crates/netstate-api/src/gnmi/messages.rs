use serde::{Deserialize, Serialize};
use strum::Display;

use super::int64;
use super::path::Path;
use super::value::TypedValue;

/// Which part of the data tree a Get addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    All,
    Config,
    #[default]
    State,
    Operational,
}

/// Value encoding requested from the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Encoding {
    Json,
    Bytes,
    Proto,
    Ascii,
    #[default]
    JsonIetf,
}

/// `gnmi.GetRequest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<Path>,
    pub path: Vec<Path>,
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub encoding: Encoding,
}

impl GetRequest {
    /// A single-path request, the only shape netstate issues.
    pub fn single(path: Path, data_type: DataType, encoding: Encoding) -> Self {
        Self {
            prefix: None,
            path: vec![path],
            data_type,
            encoding,
        }
    }
}

/// `gnmi.Update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub path: Path,
    pub val: TypedValue,
}

/// `gnmi.Notification`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default, with = "int64::signed")]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<Path>,
    #[serde(default)]
    pub update: Vec<Update>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delete: Vec<Path>,
}

/// `gnmi.GetResponse`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetResponse {
    #[serde(default)]
    pub notification: Vec<Notification>,
}

impl GetResponse {
    /// Flatten every notification into full-path updates, in order.
    ///
    /// Each notification's prefix is folded into its update paths.
    pub fn into_updates(self) -> Vec<Update> {
        let mut out = Vec::new();
        for notification in self.notification {
            let prefix = notification.prefix.unwrap_or_default();
            out.extend(notification.update.into_iter().map(|u| Update {
                path: u.path.join_prefix(&prefix),
                val: u.val,
            }));
        }
        out
    }
}

/// `gnmi.ModelData`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub version: String,
}

/// `gnmi.CapabilityResponse`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityResponse {
    #[serde(default)]
    pub supported_models: Vec<ModelData>,
    #[serde(default)]
    pub supported_encodings: Vec<Encoding>,
    #[serde(default, rename = "gNMIVersion")]
    pub gnmi_version: String,
}

impl CapabilityResponse {
    pub fn supports(&self, encoding: Encoding) -> bool {
        self.supported_encodings.contains(&encoding)
    }
}
