//! Record model
//!
//! - [`Record`]: canonical DNS resource record
//! - [`Label`]: (name, type) identity of a record set
//! - [`NativeRRSet`]: provider-native record set, with [`normalize`] / [`denormalize`]
//! - [`Capabilities`]: what a provider can host, with [`audit_records`]

pub mod capabilities;
pub mod name;
pub mod native;
pub mod record;

pub use capabilities::{Capabilities, audit_records};
pub use name::{fqdn, qualify};
pub use native::{NativeRRSet, NativeResourceRecord, denormalize, normalize};
pub use record::{Label, Record, RecordData, RecordType};
