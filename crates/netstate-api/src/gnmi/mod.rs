// gNMI message types in their protobuf JSON mapping.
//
// Only the subset needed for Capabilities and Get is modelled. Field names
// follow the canonical proto3 JSON form (`stringVal`, `uintVal`, ...), so
// bodies produced by any conforming gateway deserialize without adapters.

mod int64;
mod messages;
mod path;
mod value;

pub use messages::{
    CapabilityResponse, DataType, Encoding, GetRequest, GetResponse, ModelData, Notification,
    Update,
};
pub use path::{Path, PathElem};
pub use value::{TypedValue, ValueKind};
