// # Diff Engine
//
// Classifies every label appearing in either the desired or the observed
// snapshot:
//
// | desired | observed | classification        |
// |---------|----------|-----------------------|
// | yes     | no       | `Added`               |
// | no      | yes      | `Removed`             |
// | yes     | yes, ≠   | `Modified`            |
// | yes     | yes, =   | unchanged (excluded)  |
//
// Each classified label carries description lines for the user. The lines
// are for messaging only and never influence planning.

pub mod group;

pub use group::{LabelGroup, ZoneSnapshot, group};

use crate::model::{Label, Record};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

/// How a label differs between desired and observed state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Desired but not observed
    Added,
    /// Observed but not desired
    Removed,
    /// Present on both sides with different record sets
    Modified,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeKind::Added => "added",
            ChangeKind::Removed => "removed",
            ChangeKind::Modified => "modified",
        })
    }
}

/// Classification and description of one label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Classification
    pub kind: ChangeKind,
    /// Description lines (`CREATE`, `DELETE`, `MODIFY`)
    pub details: Vec<String>,
}

impl Change {
    /// Human-readable message: the description lines joined by newlines
    pub fn message(&self) -> String {
        self.details.join("\n")
    }
}

/// Result of diffing two snapshots; unchanged labels are never present
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    changes: BTreeMap<Label, Change>,
}

impl Changeset {
    /// The change for `label`, if it differs
    pub fn get(&self, label: &Label) -> Option<&Change> {
        self.changes.get(label)
    }

    /// (label, change) pairs in label order
    pub fn iter(&self) -> btree_map::Iter<'_, Label, Change> {
        self.changes.iter()
    }

    /// Labels with the given classification, in label order
    pub fn labels_of(&self, kind: ChangeKind) -> impl Iterator<Item = &Label> {
        self.changes
            .iter()
            .filter(move |(_, c)| c.kind == kind)
            .map(|(l, _)| l)
    }

    /// Number of differing labels
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// `true` when no label differs: no corrections are needed
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Compare desired against observed state
pub fn diff(desired: &ZoneSnapshot, observed: &ZoneSnapshot) -> Changeset {
    let mut changes = BTreeMap::new();

    let labels: std::collections::BTreeSet<&Label> =
        desired.labels().chain(observed.labels()).collect();

    for label in labels {
        let change = match (desired.get(label), observed.get(label)) {
            (Some(want), None) => Change {
                kind: ChangeKind::Added,
                details: want.records().iter().map(|r| format!("CREATE {}", r)).collect(),
            },
            (None, Some(have)) => Change {
                kind: ChangeKind::Removed,
                details: have.records().iter().map(|r| format!("DELETE {}", r)).collect(),
            },
            (Some(want), Some(have)) if want != have => Change {
                kind: ChangeKind::Modified,
                details: describe_modification(have.records(), want.records()),
            },
            _ => continue,
        };
        tracing::debug!("{} {}", label, change.kind);
        changes.insert(label.clone(), change);
    }

    Changeset { changes }
}

/// Describe record-level differences inside one label.
///
/// Records whose data is unchanged but TTL differs pair up first; remaining
/// removed and added records pair up in order; leftovers are plain
/// creations or deletions.
fn describe_modification(old: &[Record], new: &[Record]) -> Vec<String> {
    let mut removed: Vec<&Record> = old.iter().filter(|r| !new.contains(r)).collect();
    let mut added: Vec<&Record> = new.iter().filter(|r| !old.contains(r)).collect();
    let mut details = Vec::new();

    removed.retain(|o| {
        match added.iter().position(|n| n.data() == o.data()) {
            Some(i) => {
                let n = added.remove(i);
                details.push(format!("MODIFY {} -> {}", o, n));
                false
            }
            None => true,
        }
    });

    let paired = removed.len().min(added.len());
    for (o, n) in removed.drain(..paired).zip(added.drain(..paired)) {
        details.push(format!("MODIFY {} -> {}", o, n));
    }
    details.extend(removed.into_iter().map(|r| format!("DELETE {}", r)));
    details.extend(added.into_iter().map(|r| format!("CREATE {}", r)));

    details
}
