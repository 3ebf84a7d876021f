//! Label grouping
//!
//! Partitions records into label groups (RRSets) keyed by (name, type).
//! Groups keep their members sorted and de-duplicated, so two snapshots
//! built from the same records in any order compare equal.

use crate::model::{Label, Record};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// The records sharing one label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelGroup {
    records: Vec<Record>,
}

impl LabelGroup {
    /// Members in canonical order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the group has no members
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn insert(&mut self, record: Record) {
        if let Err(pos) = self.records.binary_search(&record) {
            self.records.insert(pos, record);
        }
    }
}

impl FromIterator<Record> for LabelGroup {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut group = LabelGroup::default();
        for record in iter {
            group.insert(record);
        }
        group
    }
}

/// Label → label group mapping for one side of a reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneSnapshot {
    groups: BTreeMap<Label, LabelGroup>,
}

impl ZoneSnapshot {
    /// Group `records` by label
    pub fn group(records: impl IntoIterator<Item = Record>) -> Self {
        let mut groups: BTreeMap<Label, LabelGroup> = BTreeMap::new();
        for record in records {
            groups.entry(record.label()).or_default().insert(record);
        }
        Self { groups }
    }

    /// The group for `label`, if present
    pub fn get(&self, label: &Label) -> Option<&LabelGroup> {
        self.groups.get(label)
    }

    /// Whether `label` has a group
    pub fn contains(&self, label: &Label) -> bool {
        self.groups.contains_key(label)
    }

    /// Labels in canonical order
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.groups.keys()
    }

    /// (label, group) pairs in canonical order
    pub fn iter(&self) -> btree_map::Iter<'_, Label, LabelGroup> {
        self.groups.iter()
    }

    /// Every record, grouped and in canonical order
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.groups.values().flat_map(|g| g.records.iter())
    }

    /// Number of label groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the snapshot has no groups
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Group `records` into a zone snapshot
pub fn group(records: impl IntoIterator<Item = Record>) -> ZoneSnapshot {
    ZoneSnapshot::group(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RecordData, RecordType};

    fn a(name: &str, ip: [u8; 4]) -> Record {
        Record::new(
            "example.com",
            name,
            300,
            RecordData::A {
                address: ip.into(),
            },
        )
    }

    fn cname(name: &str, target: &str) -> Record {
        Record::new(
            "example.com",
            name,
            300,
            RecordData::Cname {
                target: target.to_string(),
            },
        )
    }

    #[test]
    fn test_group_partitions_by_name_and_type() {
        let records = vec![
            a("www.example.com", [1, 2, 3, 4]),
            a("www.example.com", [5, 6, 7, 8]),
            a("api.example.com", [1, 1, 1, 1]),
            cname("ftp.example.com", "www.example.com"),
        ];
        let snapshot = group(records.clone());

        assert_eq!(snapshot.len(), 3);
        assert_eq!(
            snapshot
                .get(&Label::new("www.example.com", RecordType::A))
                .unwrap()
                .len(),
            2
        );

        // every record lands in exactly one group, under its own label
        let total: usize = snapshot.iter().map(|(_, g)| g.len()).sum();
        assert_eq!(total, records.len());
        for (label, g) in snapshot.iter() {
            assert!(g.records().iter().all(|r| &r.label() == label));
        }
    }

    #[test]
    fn test_group_is_order_independent() {
        let forward = vec![
            a("www.example.com", [1, 2, 3, 4]),
            a("www.example.com", [5, 6, 7, 8]),
            cname("ftp.example.com", "www.example.com"),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(group(forward), group(reversed));
    }

    #[test]
    fn test_group_normalises_case_and_trailing_dot() {
        let snapshot = group(vec![
            a("WWW.example.com", [1, 2, 3, 4]),
            a("www.example.com.", [5, 6, 7, 8]),
        ]);
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_group_collapses_duplicates() {
        let snapshot = group(vec![
            a("www.example.com", [1, 2, 3, 4]),
            a("www.example.com", [1, 2, 3, 4]),
        ]);
        assert_eq!(snapshot.records().count(), 1);
    }

    #[test]
    fn test_empty_group() {
        let snapshot = group(Vec::new());
        assert!(snapshot.is_empty());
        assert!(!snapshot.contains(&Label::new("www.example.com", RecordType::A)));
    }
}
