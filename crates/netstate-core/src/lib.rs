// netstate-core: path-addressed response decoding and cross-query correlation.
//
// Field specifications resolve into path templates, responses are walked
// against those templates to recover each value's identity, and results of
// independent queries are joined on shared identity into per-device
// snapshots.

pub mod config;
pub mod correlate;
pub mod device;
pub mod error;
pub mod pathspec;
pub mod poller;
pub mod snapshot;
pub mod walker;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{Credentials, DeviceConfig, QueryOptions, TlsVerification};
pub use correlate::{CorrelationIndex, JoinOutcome, JoinStats, Joined, Lookup};
pub use device::Device;
pub use error::CoreError;
pub use pathspec::{
    BGP_AFI_SAFI_ENABLED, BGP_PREFIXES_RECEIVED, BGP_SESSION_STATE, Binding, FieldSpec,
    IdentityField, LLDP_SYSTEM_NAME, PathQuery, PathSpecError, PathTemplate, Segment,
    SegmentKey, TypedTemplate,
};
pub use poller::{PollOutcome, poll_all, poll_with};
pub use snapshot::{
    AdjacencyRecord, DeviceSnapshot, FlatRecord, ReceivedRouteRecord, SessionRecord,
    SnapshotStats, StateSource, assemble,
};
pub use walker::{
    Extracted, Identity, IdentityKey, LeafValue, StructuralMismatch, Walk, WalkError, Walked, walk,
};
