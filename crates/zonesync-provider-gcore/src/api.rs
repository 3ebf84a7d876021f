//! Wire types of the G-Core DNS API v2
//!
//! Record set payloads use [`zonesync_core::NativeRRSet`] directly; only
//! the zone-level shapes live here.

use serde::{Deserialize, Serialize};

/// `GET /v2/zones`
#[derive(Debug, Deserialize)]
pub(crate) struct ZoneList {
    #[serde(default)]
    pub zones: Vec<ZoneSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ZoneSummary {
    pub name: String,
}

/// `POST /v2/zones`
#[derive(Debug, Serialize)]
pub(crate) struct CreateZone<'a> {
    pub name: &'a str,
}

/// `GET /v2/zones/{zone}`
#[derive(Debug, Deserialize)]
pub(crate) struct ZoneDetails {
    #[serde(default)]
    pub records: Vec<ZoneRecord>,
}

/// One record set in a zone listing; content is fetched separately
#[derive(Debug, Deserialize)]
pub(crate) struct ZoneRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
}

/// Error body returned on non-2xx responses
#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub error: String,
}
