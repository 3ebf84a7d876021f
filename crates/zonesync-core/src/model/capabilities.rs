//! Provider capabilities and desired-record auditing

use crate::error::{Error, Result};
use crate::model::record::{Record, RecordData, RecordType};

/// What a provider backend can host
///
/// Consulted when auditing desired records and when converting a label
/// group into the provider's native form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    /// Record types the provider accepts
    pub record_types: Vec<RecordType>,
    /// Whether SRV records may use the null target `.`
    pub srv_empty_target: bool,
}

impl Capabilities {
    /// Whether the provider accepts `record_type`
    pub fn supports(&self, record_type: RecordType) -> bool {
        self.record_types.contains(&record_type)
    }

    /// Check a single record against these capabilities
    pub fn check(&self, record: &Record) -> Result<()> {
        if !self.supports(record.record_type()) {
            return Err(Error::unsupported(format!(
                "{}: provider does not support {} records",
                record.label(),
                record.record_type()
            )));
        }

        if let RecordData::Srv { target, .. } = record.data()
            && target == "."
            && !self.srv_empty_target
        {
            return Err(Error::unsupported(format!(
                "{}: provider does not support SRV records with empty targets",
                record.label()
            )));
        }

        // an empty content list is unreadable once written
        if let RecordData::Txt { strings } = record.data()
            && strings.is_empty()
        {
            return Err(Error::unsupported(format!(
                "{}: TXT record needs at least one string",
                record.label()
            )));
        }

        Ok(())
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            record_types: RecordType::ALL.to_vec(),
            srv_empty_target: true,
        }
    }
}

/// Reject desired records the provider cannot host
///
/// Runs before any network call so that an unsupported record fails the
/// whole run instead of one correction halfway through.
pub fn audit_records(records: &[Record], capabilities: &Capabilities) -> Result<()> {
    for record in records {
        capabilities.check(record)?;
    }
    Ok(())
}
