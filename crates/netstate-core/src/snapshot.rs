// ── Snapshot assembly ──
//
// Runs the four built-in queries against one device, walks each response,
// joins AFI-SAFI enablement with received-prefix counts and produces the
// device's named result sets. A failed query fails the whole snapshot.

use std::future::Future;

use indexmap::IndexMap;
use netstate_api::Update;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::QueryOptions;
use crate::correlate::{CorrelationIndex, JoinStats, Joined};
use crate::error::CoreError;
use crate::pathspec::{
    BGP_AFI_SAFI_ENABLED, BGP_PREFIXES_RECEIVED, BGP_SESSION_STATE, IdentityField,
    LLDP_SYSTEM_NAME, PathQuery, TypedTemplate,
};
use crate::walker::{Extracted, LeafValue, StructuralMismatch, WalkError, Walked, walk};

// ── Transport seam ──────────────────────────────────────────────────

/// Anything that can fetch one state subtree and return its flat
/// (path, value) list with full paths.
pub trait StateSource {
    fn execute(&self, query: &PathQuery) -> impl Future<Output = Result<Vec<Update>, CoreError>> + Send;
}

// ── Records ─────────────────────────────────────────────────────────

/// A record rendered as ordered `name = value` pairs.
pub trait FlatRecord {
    fn fields(&self) -> IndexMap<&'static str, String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    pub vrf_name: String,
    pub neighbor_addr: String,
    pub session_state: String,
}

impl SessionRecord {
    fn from_extracted(rec: Extracted<String>) -> Result<Self, StructuralMismatch> {
        Ok(Self {
            vrf_name: rec.identity.require(IdentityField::VrfName)?.to_owned(),
            neighbor_addr: rec.identity.require(IdentityField::NeighborAddr)?.to_owned(),
            session_state: rec.value,
        })
    }
}

impl FlatRecord for SessionRecord {
    fn fields(&self) -> IndexMap<&'static str, String> {
        IndexMap::from([
            ("vrf_name", self.vrf_name.clone()),
            ("neighbor_addr", self.neighbor_addr.clone()),
            ("session_state", self.session_state.clone()),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceivedRouteRecord {
    pub vrf_name: String,
    pub neighbor_addr: String,
    pub safi: String,
    pub enabled: bool,
    pub prefixes_received: u64,
}

impl ReceivedRouteRecord {
    fn from_joined(joined: Joined<bool, u64>) -> Result<Self, StructuralMismatch> {
        Ok(Self {
            vrf_name: joined.identity.require(IdentityField::VrfName)?.to_owned(),
            neighbor_addr: joined.identity.require(IdentityField::NeighborAddr)?.to_owned(),
            safi: joined.identity.require(IdentityField::Safi)?.to_owned(),
            enabled: joined.source,
            prefixes_received: joined.target,
        })
    }
}

impl FlatRecord for ReceivedRouteRecord {
    fn fields(&self) -> IndexMap<&'static str, String> {
        IndexMap::from([
            ("vrf_name", self.vrf_name.clone()),
            ("neighbor_addr", self.neighbor_addr.clone()),
            ("safi", self.safi.clone()),
            ("enabled", self.enabled.to_string()),
            ("prefixes_received", self.prefixes_received.to_string()),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjacencyRecord {
    pub local_interface: String,
    pub neighbor_name: String,
}

impl AdjacencyRecord {
    fn from_extracted(rec: Extracted<String>) -> Result<Self, StructuralMismatch> {
        Ok(Self {
            local_interface: rec.identity.require(IdentityField::LocalInterface)?.to_owned(),
            neighbor_name: rec.value,
        })
    }
}

impl FlatRecord for AdjacencyRecord {
    fn fields(&self) -> IndexMap<&'static str, String> {
        IndexMap::from([
            ("local_interface", self.local_interface.clone()),
            ("neighbor_name", self.neighbor_name.clone()),
        ])
    }
}

// ── Snapshot ────────────────────────────────────────────────────────

/// Record counts dropped along the way; diagnostics only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotStats {
    /// Records skipped by the walker for structural mismatches.
    pub skipped: usize,
    pub join: JoinStats,
}

/// Normalized state of one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSnapshot {
    #[serde(skip)]
    pub target: String,
    pub bgp_neighbors: Vec<SessionRecord>,
    pub bgp_received_routes: Vec<ReceivedRouteRecord>,
    pub lldp_neighbors: Vec<AdjacencyRecord>,
    #[serde(skip)]
    pub stats: SnapshotStats,
}

impl DeviceSnapshot {
    /// Result sets in output order, each as flat records.
    pub fn result_sets(&self) -> [(&'static str, Vec<IndexMap<&'static str, String>>); 3] {
        [
            ("bgp_neighbors", flatten(&self.bgp_neighbors)),
            ("bgp_received_routes", flatten(&self.bgp_received_routes)),
            ("lldp_neighbors", flatten(&self.lldp_neighbors)),
        ]
    }

    pub fn record_count(&self) -> usize {
        self.bgp_neighbors.len() + self.bgp_received_routes.len() + self.lldp_neighbors.len()
    }
}

fn flatten<R: FlatRecord>(records: &[R]) -> Vec<IndexMap<&'static str, String>> {
    records.iter().map(FlatRecord::fields).collect()
}

// ── Assembly ────────────────────────────────────────────────────────

/// Fields joined between AFI-SAFI enablement and received-prefix counts.
const AFI_SAFI_KEY: [IdentityField; 3] = [
    IdentityField::VrfName,
    IdentityField::NeighborAddr,
    IdentityField::Safi,
];

/// Poll one device and build its snapshot.
///
/// All four queries run concurrently; the first failure cancels the rest
/// and is returned tagged with the failing query's name.
pub async fn assemble<S>(
    source: &S,
    target: &str,
    options: QueryOptions,
) -> Result<DeviceSnapshot, CoreError>
where
    S: StateSource + Sync,
{
    let session = BGP_SESSION_STATE.resolve()?;
    let enabled = BGP_AFI_SAFI_ENABLED.resolve()?;
    let received = BGP_PREFIXES_RECEIVED.resolve()?;
    let lldp = LLDP_SYSTEM_NAME.resolve()?;

    let session_query = session.query(options.data_type, options.encoding);
    let enabled_query = enabled.query(options.data_type, options.encoding);
    let received_query = received.query(options.data_type, options.encoding);
    let lldp_query = lldp.query(options.data_type, options.encoding);

    let (session_raw, enabled_raw, received_raw, lldp_raw) = tokio::try_join!(
        fetch(source, session.name, &session_query),
        fetch(source, enabled.name, &enabled_query),
        fetch(source, received.name, &received_query),
        fetch(source, lldp.name, &lldp_query),
    )?;

    let sessions = collect(&session, &session_raw)?;
    let enabled_walk = collect(&enabled, &enabled_raw)?;
    let received_walk = collect(&received, &received_raw)?;
    let adjacencies = collect(&lldp, &lldp_raw)?;

    let mut skipped =
        sessions.skipped + enabled_walk.skipped + received_walk.skipped + adjacencies.skipped;

    let index = CorrelationIndex::from_records(AFI_SAFI_KEY, enabled_walk.records);
    let joined = index.join(received_walk.records);
    skipped += index.malformed();

    let bgp_neighbors = convert(sessions.records, SessionRecord::from_extracted, &mut skipped);
    let bgp_received_routes =
        convert(joined.records, ReceivedRouteRecord::from_joined, &mut skipped);
    let lldp_neighbors = convert(adjacencies.records, AdjacencyRecord::from_extracted, &mut skipped);

    let snapshot = DeviceSnapshot {
        target: target.to_owned(),
        bgp_neighbors,
        bgp_received_routes,
        lldp_neighbors,
        stats: SnapshotStats {
            skipped,
            join: joined.stats,
        },
    };
    debug!(
        device = target,
        records = snapshot.record_count(),
        skipped,
        joined = joined.stats.joined,
        missed = joined.stats.missed,
        "snapshot assembled"
    );
    Ok(snapshot)
}

async fn fetch<S>(source: &S, name: &'static str, query: &PathQuery) -> Result<Vec<Update>, CoreError>
where
    S: StateSource + Sync,
{
    debug!(query = name, path = %query.path, "executing query");
    let updates = source.execute(query).await.map_err(|e| e.in_query(name))?;
    debug!(query = name, updates = updates.len(), "query returned");
    Ok(updates)
}

fn collect<V: LeafValue>(field: &TypedTemplate<V>, updates: &[Update]) -> Result<Walked<V>, CoreError> {
    walk(field, updates).collect_records().map_err(|e| match e {
        WalkError::ValueKind {
            path,
            expected,
            found,
        } => CoreError::ValueKind {
            query: field.name,
            path,
            expected,
            found,
        },
        WalkError::Structural(mismatch) => CoreError::Internal(mismatch.to_string()),
    })
}

fn convert<T, R>(
    records: Vec<T>,
    f: impl Fn(T) -> Result<R, StructuralMismatch>,
    skipped: &mut usize,
) -> Vec<R> {
    records
        .into_iter()
        .filter_map(|rec| match f(rec) {
            Ok(out) => Some(out),
            Err(mismatch) => {
                warn!(error = %mismatch, "dropping incomplete record");
                *skipped += 1;
                None
            }
        })
        .collect()
}
