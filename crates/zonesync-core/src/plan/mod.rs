// # Correction Planner
//
// Turns a `Changeset` into an ordered list of `Correction`s.
//
// ## Ordering
//
// 1. **Destructive pass**: delete every `Removed` label.
// 2. **Constructive pass**: create every `Added` label, update every
//    `Modified` label in place.
//
// Providers reject a write to (name, type) while a conflicting type still
// occupies the name (CNAME next to A, for instance). With every deletion
// ahead of every write, a label whose type changes in one run (www CNAME
// removed, www A added) always applies cleanly. `Modified` labels are never
// deleted: their endpoint still exists and is overwritten.
//
// Each correction owns copies of its zone, name, type and payload, so
// nothing done to the planning inputs afterwards can change what an already
// planned correction will do.

use crate::diff::{ChangeKind, Changeset, ZoneSnapshot, diff, group};
use crate::error::{Error, Result};
use crate::model::{Capabilities, Label, NativeRRSet, Record, RecordType, denormalize};
use crate::traits::DnsProvider;
use std::fmt;

/// Execution pass a correction belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Pass {
    /// Deletions
    Destructive,
    /// Creations and in-place updates
    Constructive,
}

/// A planned remote operation with owned target coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Create a record set
    Create {
        /// Zone (canonical)
        zone: String,
        /// Owner name (canonical)
        name: String,
        /// Record type
        record_type: RecordType,
        /// Native payload to write
        rrset: NativeRRSet,
    },
    /// Overwrite a record set in place
    Update {
        /// Zone (canonical)
        zone: String,
        /// Owner name (canonical)
        name: String,
        /// Record type
        record_type: RecordType,
        /// Native payload to write
        rrset: NativeRRSet,
    },
    /// Delete a record set
    Delete {
        /// Zone (canonical)
        zone: String,
        /// Owner name (canonical)
        name: String,
        /// Record type
        record_type: RecordType,
    },
}

impl Operation {
    /// Short verb for logs
    pub fn verb(&self) -> &'static str {
        match self {
            Operation::Create { .. } => "create",
            Operation::Update { .. } => "update",
            Operation::Delete { .. } => "delete",
        }
    }

    /// Pass this operation runs in
    pub fn pass(&self) -> Pass {
        match self {
            Operation::Delete { .. } => Pass::Destructive,
            Operation::Create { .. } | Operation::Update { .. } => Pass::Constructive,
        }
    }

    /// Target zone
    pub fn zone(&self) -> &str {
        match self {
            Operation::Create { zone, .. }
            | Operation::Update { zone, .. }
            | Operation::Delete { zone, .. } => zone,
        }
    }

    /// Target label
    pub fn label(&self) -> Label {
        match self {
            Operation::Create {
                name, record_type, ..
            }
            | Operation::Update {
                name, record_type, ..
            }
            | Operation::Delete {
                name, record_type, ..
            } => Label::new(name, *record_type),
        }
    }

    /// Run the operation: exactly one provider call
    pub async fn execute(&self, provider: &dyn DnsProvider) -> Result<()> {
        match self {
            Operation::Create {
                zone,
                name,
                record_type,
                rrset,
            } => provider.create_rrset(zone, name, *record_type, rrset).await,
            Operation::Update {
                zone,
                name,
                record_type,
                rrset,
            } => provider.update_rrset(zone, name, *record_type, rrset).await,
            Operation::Delete {
                zone,
                name,
                record_type,
            } => provider.delete_rrset(zone, name, *record_type).await,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} in {}", self.verb(), self.label(), self.zone())
    }
}

/// A planned, not yet executed mutation
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    /// Human-readable description of the change
    pub msg: String,
    /// The operation to run
    pub operation: Operation,
}

impl Correction {
    /// Pass this correction runs in
    pub fn pass(&self) -> Pass {
        self.operation.pass()
    }

    /// Execute against `provider`.
    ///
    /// Failures come back as [`Error::Mutation`] carrying this correction's
    /// message and the provider's error text verbatim.
    pub async fn apply(&self, provider: &dyn DnsProvider) -> Result<()> {
        self.operation
            .execute(provider)
            .await
            .map_err(|e| Error::mutation(self.msg.clone(), e.to_string()))
    }
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.msg)
    }
}

/// Build the ordered correction list for `changes`
///
/// # Errors
///
/// - [`Error::PlanningInvariant`] when an added or modified label has no
///   native form. A silently skipped label would report the zone as in sync
///   when it is not, so this aborts the whole plan.
/// - [`Error::Unsupported`] when a desired group cannot be written on this
///   provider.
pub fn plan(
    zone: &str,
    desired: &ZoneSnapshot,
    changes: &Changeset,
    capabilities: &Capabilities,
) -> Result<Vec<Correction>> {
    let zone = crate::model::fqdn(zone);
    let mut corrections = Vec::with_capacity(changes.len());

    // First pass: delete records to avoid coexisting conflicting types
    for label in changes.labels_of(ChangeKind::Removed) {
        let msg = message(changes, label);
        corrections.push(Correction {
            msg,
            operation: Operation::Delete {
                zone: zone.clone(),
                name: label.name.clone(),
                record_type: label.record_type,
            },
        });
    }

    // Second pass: create and update records
    for (label, change) in changes.iter() {
        let verb = match change.kind {
            ChangeKind::Removed => continue,
            ChangeKind::Added => "create",
            ChangeKind::Modified => "update",
        };

        let records = desired.get(label).map(|g| g.records()).unwrap_or_default();
        let rrset = denormalize(records, capabilities)?
            .ok_or_else(|| Error::planning_invariant(label.to_string(), verb))?;

        let zone = zone.clone();
        let name = label.name.clone();
        let record_type = label.record_type;
        let operation = if change.kind == ChangeKind::Added {
            Operation::Create {
                zone,
                name,
                record_type,
                rrset,
            }
        } else {
            Operation::Update {
                zone,
                name,
                record_type,
                rrset,
            }
        };

        corrections.push(Correction {
            msg: change.message(),
            operation,
        });
    }

    tracing::debug!("Planned {} correction(s) for {}", corrections.len(), zone);
    Ok(corrections)
}

fn message(changes: &Changeset, label: &Label) -> String {
    changes.get(label).map(|c| c.message()).unwrap_or_default()
}

/// Group, diff and plan in one call
///
/// `desired` and `observed` may be in any order; an empty result means the
/// zone is already in sync.
pub fn compute_corrections(
    zone: &str,
    desired: Vec<Record>,
    observed: Vec<Record>,
    capabilities: &Capabilities,
) -> Result<Vec<Correction>> {
    let desired = group(desired);
    let observed = group(observed);
    let changes = diff(&desired, &observed);
    if changes.is_empty() {
        return Ok(Vec::new());
    }
    plan(zone, &desired, &changes, capabilities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordData;

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
    fn test_type_change_deletes_before_create() {
        let corrections = compute_corrections(
            "example.com",
            vec![a("www.example.com", [1, 2, 3, 4])],
            vec![cname("www.example.com", "old.example.com")],
            &Capabilities::default(),
        )
        .unwrap();

        assert_eq!(corrections.len(), 2);
        assert!(matches!(
            &corrections[0].operation,
            Operation::Delete { name, record_type: RecordType::Cname, .. } if name == "www.example.com."
        ));
        assert!(matches!(
            &corrections[1].operation,
            Operation::Create { name, record_type: RecordType::A, .. } if name == "www.example.com."
        ));
    }

    #[test]
    fn test_deletes_precede_writes_regardless_of_label_order() {
        // "a." sorts before "z.", so label order alone would put the create first
        let corrections = compute_corrections(
            "example.com",
            vec![a("a.example.com", [1, 1, 1, 1]), a("m.example.com", [2, 2, 2, 2])],
            vec![
                a("m.example.com", [3, 3, 3, 3]),
                cname("z.example.com", "x.example.com"),
            ],
            &Capabilities::default(),
        )
        .unwrap();

        let passes: Vec<Pass> = corrections.iter().map(|c| c.pass()).collect();
        assert_eq!(
            passes,
            vec![Pass::Destructive, Pass::Constructive, Pass::Constructive]
        );
        assert_eq!(corrections[1].operation.verb(), "create");
        assert_eq!(corrections[2].operation.verb(), "update");
    }

    #[test]
    fn test_no_changes_no_corrections() {
        let corrections = compute_corrections(
            "example.com",
            vec![a("api.example.com", [5, 6, 7, 8])],
            vec![a("api.example.com", [5, 6, 7, 8])],
            &Capabilities::default(),
        )
        .unwrap();
        assert!(corrections.is_empty());
    }

    #[test]
    fn test_added_label_missing_from_desired_is_invariant_error() {
        let observed = group(Vec::new());
        let desired = group(vec![a("www.example.com", [1, 2, 3, 4])]);
        let changes = diff(&desired, &observed);

        // plan against a desired snapshot that lost the label after diffing
        let err = plan("example.com", &group(Vec::new()), &changes, &Capabilities::default())
            .unwrap_err();
        match err {
            Error::PlanningInvariant { label, operation } => {
                assert_eq!(label, "www.example.com. A");
                assert_eq!(operation, "create");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_corrections_own_their_payload() {
        let mut desired = vec![a("www.example.com", [1, 2, 3, 4])];
        let corrections =
            compute_corrections("example.com", desired.clone(), Vec::new(), &Capabilities::default())
                .unwrap();
        desired.clear();

        match &corrections[0].operation {
            Operation::Create { zone, rrset, .. } => {
                assert_eq!(zone, "example.com.");
                assert_eq!(rrset.ttl, 300);
                assert_eq!(rrset.resource_records.len(), 1);
            }
            other => panic!("unexpected operation: {other}"),
        }
        assert_eq!(corrections[0].msg, "CREATE www.example.com. 300 A 1.2.3.4");
    }

    #[test]
    fn test_unsupported_desired_group_fails_plan() {
        let caps = Capabilities {
            record_types: vec![RecordType::Cname],
            srv_empty_target: false,
        };
        let err = compute_corrections(
            "example.com",
            vec![a("www.example.com", [1, 2, 3, 4])],
            Vec::new(),
            &caps,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }
}
