// # zonesync-core
//
// Core library for declarative DNS zone reconciliation.
//
// ## Architecture Overview
//
// Given the desired contents of a zone and the zone a provider actually
// hosts, this library computes the smallest safely ordered list of
// corrections that turns one into the other, and applies them:
// - **Record Model** (`model`): canonical records, the native RRSet format,
//   provider capabilities
// - **Label Grouper / Diff Engine** (`diff`): records grouped by
//   (name, type), labels classified as added, removed or modified
// - **Correction Planner** (`plan`): deletions first, then creations and
//   updates, each correction owning its payload
// - **DnsProvider** (`traits`): capability interface of a provider backend
// - **Reconciler** (`engine`): bootstrap, fetch, plan, apply
// - **ProviderRegistry** (`registry`): providers constructed from config
//
// ## Design Principles
//
// 1. **Pure core**: grouping, diffing and planning do no I/O
// 2. **Plugin-Based**: providers are registered explicitly, no hard-coded if-else
// 3. **Library-First**: the binary is a thin wrapper over this crate
// 4. **Idempotency**: re-planning after a successful apply yields nothing

pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod model;
pub mod plan;
pub mod provider;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use config::{DomainConfig, EngineConfig, FailurePolicy, ProviderConfig, RecordConfig, ZonesyncConfig};
pub use diff::{ChangeKind, Changeset, ZoneSnapshot, diff, group};
pub use engine::{ApplyReport, EngineEvent, Reconciler};
pub use error::{Error, Result};
pub use model::{Capabilities, Label, NativeRRSet, Record, RecordData, RecordType};
pub use plan::{Correction, Operation, Pass, compute_corrections};
pub use provider::MemoryProvider;
pub use registry::ProviderRegistry;
pub use traits::{DnsProvider, DnsProviderFactory};
