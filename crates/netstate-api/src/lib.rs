// netstate-api: gNMI data model and HTTP/JSON gateway client

pub mod error;
pub mod gateway;
pub mod gnmi;
pub mod transport;

pub use error::Error;
pub use gateway::GatewayClient;
pub use gnmi::{
    CapabilityResponse, DataType, Encoding, GetRequest, GetResponse, ModelData, Notification,
    Path, PathElem, TypedValue, Update, ValueKind,
};
