// ── Cross-query correlation ──
//
// An index is built from one query's records (the source) keyed by a fixed
// list of identity fields, then consulted for each record of a second
// query (the target). Targets without a matching source entry are misses
// and are dropped silently. Targets whose identity lacks an index field
// are structural mismatches and are counted separately.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::pathspec::IdentityField;
use crate::walker::{Extracted, Identity, IdentityKey, StructuralMismatch};

/// Result of looking up one identity in a [`CorrelationIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a, V> {
    Hit(&'a V),
    Miss,
}

/// Source values keyed by the concatenation of `fields`.
#[derive(Debug, Clone)]
pub struct CorrelationIndex<V> {
    fields: Vec<IdentityField>,
    entries: HashMap<IdentityKey, V>,
    duplicates: usize,
    malformed: usize,
}

impl<V> CorrelationIndex<V> {
    pub fn new(fields: impl Into<Vec<IdentityField>>) -> Self {
        Self {
            fields: fields.into(),
            entries: HashMap::new(),
            duplicates: 0,
            malformed: 0,
        }
    }

    /// Build an index from walked source records.
    ///
    /// Records lacking an index field are skipped and counted.
    pub fn from_records(
        fields: impl Into<Vec<IdentityField>>,
        records: impl IntoIterator<Item = Extracted<V>>,
    ) -> Self {
        let mut index = Self::new(fields);
        for record in records {
            if let Err(mismatch) = index.insert(&record.identity, record.value) {
                warn!(error = %mismatch, "source record not indexed");
                index.malformed += 1;
            }
        }
        index
    }

    /// Insert one value. A repeated key replaces the earlier value and
    /// increments [`duplicates`](Self::duplicates).
    pub fn insert(&mut self, identity: &Identity, value: V) -> Result<(), StructuralMismatch> {
        let key = identity.key(&self.fields)?;
        if let Some(_previous) = self.entries.insert(key, value) {
            debug!(identity = %identity, "duplicate source identity, keeping last");
            self.duplicates += 1;
        }
        Ok(())
    }

    pub fn lookup(&self, identity: &Identity) -> Result<Lookup<'_, V>, StructuralMismatch> {
        let key = identity.key(&self.fields)?;
        Ok(self.entries.get(&key).map_or(Lookup::Miss, Lookup::Hit))
    }

    pub fn fields(&self) -> &[IdentityField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of source records that overwrote an existing key.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Number of source records skipped because their identity was incomplete.
    pub fn malformed(&self) -> usize {
        self.malformed
    }
}

impl<V: Clone> CorrelationIndex<V> {
    /// Attach the indexed source value to every target record that has one.
    ///
    /// Output order follows `targets`.
    pub fn join<T>(&self, targets: impl IntoIterator<Item = Extracted<T>>) -> JoinOutcome<V, T> {
        let mut records = Vec::new();
        let mut stats = JoinStats {
            duplicates: self.duplicates,
            ..JoinStats::default()
        };

        for target in targets {
            match self.lookup(&target.identity) {
                Ok(Lookup::Hit(source)) => {
                    stats.joined += 1;
                    records.push(Joined {
                        identity: target.identity,
                        source: source.clone(),
                        target: target.value,
                    });
                }
                Ok(Lookup::Miss) => stats.missed += 1,
                Err(mismatch) => {
                    warn!(error = %mismatch, "skipping target record");
                    stats.malformed += 1;
                }
            }
        }

        debug!(
            joined = stats.joined,
            missed = stats.missed,
            malformed = stats.malformed,
            duplicates = stats.duplicates,
            "join complete"
        );
        JoinOutcome { records, stats }
    }
}

/// One target record with its correlated source value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined<S, T> {
    pub identity: Identity,
    pub source: S,
    pub target: T,
}

/// Counters of one join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JoinStats {
    pub joined: usize,
    pub missed: usize,
    pub malformed: usize,
    /// Source duplicates resolved last-write-wins while building the index.
    pub duplicates: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome<S, T> {
    pub records: Vec<Joined<S, T>>,
    pub stats: JoinStats,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const AFI_KEY: [IdentityField; 3] = [
        IdentityField::VrfName,
        IdentityField::NeighborAddr,
        IdentityField::Safi,
    ];

    fn rec<V>(vrf: &str, nbr: &str, safi: &str, value: V) -> Extracted<V> {
        Extracted {
            identity: Identity::new(vec![
                (IdentityField::VrfName, vrf.into()),
                (IdentityField::NeighborAddr, nbr.into()),
                (IdentityField::Safi, safi.into()),
            ]),
            value,
        }
    }

    #[test]
    fn joins_only_enabled_families_present_in_index() {
        let index =
            CorrelationIndex::from_records(AFI_KEY, [rec("default", "10.0.0.1", "ipv4-unicast", true)]);
        let outcome = index.join([
            rec("default", "10.0.0.1", "ipv4-unicast", 42_u64),
            rec("default", "10.0.0.1", "ipv6-unicast", 7_u64),
        ]);

        assert_eq!(outcome.records.len(), 1);
        let joined = &outcome.records[0];
        assert_eq!(joined.identity.get(IdentityField::Safi), Some("ipv4-unicast"));
        assert!(joined.source);
        assert_eq!(joined.target, 42);
        assert_eq!(
            outcome.stats,
            JoinStats {
                joined: 1,
                missed: 1,
                malformed: 0,
                duplicates: 0,
            }
        );
    }

    #[test]
    fn one_record_per_matching_target() {
        let index = CorrelationIndex::from_records(
            AFI_KEY,
            [
                rec("default", "10.0.0.1", "ipv4-unicast", true),
                rec("default", "10.0.0.2", "ipv4-unicast", false),
                rec("red", "10.0.0.1", "ipv4-unicast", true),
            ],
        );
        let outcome = index.join([
            rec("red", "10.0.0.1", "ipv4-unicast", 1_u64),
            rec("default", "10.0.0.2", "ipv4-unicast", 2_u64),
            rec("blue", "10.0.0.1", "ipv4-unicast", 3_u64),
            rec("default", "10.0.0.1", "ipv4-unicast", 4_u64),
        ]);

        let got: Vec<_> = outcome
            .records
            .iter()
            .map(|j| (j.identity.get(IdentityField::VrfName).unwrap(), j.source, j.target))
            .collect();
        assert_eq!(got, vec![("red", true, 1), ("default", false, 2), ("default", true, 4)]);
        assert_eq!(outcome.stats.missed, 1);
    }

    #[test]
    fn duplicate_sources_last_write_wins() {
        let index = CorrelationIndex::from_records(
            AFI_KEY,
            [
                rec("default", "10.0.0.1", "ipv4-unicast", false),
                rec("default", "10.0.0.1", "ipv4-unicast", true),
            ],
        );
        assert_eq!(index.len(), 1);
        assert_eq!(index.duplicates(), 1);

        let probe = rec("default", "10.0.0.1", "ipv4-unicast", ()).identity;
        assert_eq!(index.lookup(&probe).unwrap(), Lookup::Hit(&true));

        let outcome = index.join([rec("default", "10.0.0.1", "ipv4-unicast", 9_u64)]);
        assert_eq!(outcome.stats.duplicates, 1);
    }

    #[test]
    fn incomplete_target_identity_is_malformed_not_missed() {
        let index =
            CorrelationIndex::from_records(AFI_KEY, [rec("default", "10.0.0.1", "ipv4-unicast", true)]);
        let partial = Extracted {
            identity: Identity::new(vec![
                (IdentityField::VrfName, "default".into()),
                (IdentityField::NeighborAddr, "10.0.0.1".into()),
            ]),
            value: 5_u64,
        };
        let outcome = index.join([partial]);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stats.malformed, 1);
        assert_eq!(outcome.stats.missed, 0);
    }

    #[test]
    fn incomplete_source_identity_is_not_indexed() {
        let partial = Extracted {
            identity: Identity::new(vec![(IdentityField::VrfName, "default".into())]),
            value: true,
        };
        let index = CorrelationIndex::from_records(AFI_KEY, [partial]);
        assert!(index.is_empty());
        assert_eq!(index.malformed(), 1);
    }

    #[test]
    fn empty_index_misses_everything() {
        let index: CorrelationIndex<bool> = CorrelationIndex::new(AFI_KEY);
        let outcome = index.join([rec("default", "10.0.0.1", "ipv4-unicast", 1_u64)]);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stats.missed, 1);
    }
}
