// # Native Record Sets
//
// The provider-native RRSet payload exchanged with provider adapters, and
// the conversions between it and canonical `Record`s.
//
// ## Wire shape
//
// ```json
// { "ttl": 300, "resource_records": [ { "content": [10, "mx1.example.com"], "enabled": true } ] }
// ```
//
// | type  | content                                  |
// |-------|------------------------------------------|
// | A     | `["192.0.2.1"]`                          |
// | AAAA  | `["2001:db8::1"]`                        |
// | CNAME | `["target.example.com"]`                 |
// | NS    | `["ns1.example.com"]`                    |
// | MX    | `[preference, "exchange"]`               |
// | SRV   | `[priority, weight, port, "target"]`     |
// | CAA   | `[flags, "tag", "value"]`                |
// | TXT   | `["string", ...]`                        |
//
// Numeric fields are accepted as JSON numbers or numeric strings.

use crate::error::{Error, Result};
use crate::model::capabilities::Capabilities;
use crate::model::name::without_dot;
use crate::model::record::{Label, Record, RecordData, RecordType};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::str::FromStr;

/// A provider-native record set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeRRSet {
    /// TTL shared by every record in the set
    #[serde(default)]
    pub ttl: u32,
    /// Member records
    #[serde(default)]
    pub resource_records: Vec<NativeResourceRecord>,
}

/// One member of a native record set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeResourceRecord {
    /// Positional record content
    pub content: Vec<Value>,
    /// Whether the record is served
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Convert a native record set into canonical records
///
/// Disabled members are not served, so they are left out of the observed
/// state; if they are still desired the planner will rewrite the set.
///
/// # Errors
///
/// `Error::Parse` when any member's content does not match the layout of
/// `record_type`.
pub fn normalize(
    native: &NativeRRSet,
    zone: &str,
    name: &str,
    record_type: RecordType,
) -> Result<Vec<Record>> {
    let label = Label::new(name, record_type);
    let mut records = Vec::with_capacity(native.resource_records.len());

    for rr in &native.resource_records {
        if !rr.enabled {
            tracing::debug!("Skipping disabled record in {}", label);
            continue;
        }
        let data = parse_content(&rr.content, record_type)
            .map_err(|msg| Error::parse(format!("{}: {}", label, msg)))?;
        records.push(Record::new(zone, name, native.ttl, data));
    }

    Ok(records)
}

/// Convert one label group into its native record set
///
/// Returns `Ok(None)` for an empty group.
///
/// # Errors
///
/// `Error::Unsupported` when the group cannot be expressed as a single
/// record set on this provider: members from different labels, TTLs that
/// differ inside the set, or a record the provider cannot host.
pub fn denormalize(records: &[Record], capabilities: &Capabilities) -> Result<Option<NativeRRSet>> {
    let Some(first) = records.first() else {
        return Ok(None);
    };
    let label = first.label();
    let ttl = first.ttl();

    let mut resource_records = Vec::with_capacity(records.len());
    for record in records {
        if record.label() != label {
            return Err(Error::unsupported(format!(
                "record set {} cannot contain {}",
                label,
                record.label()
            )));
        }
        if record.ttl() != ttl {
            return Err(Error::unsupported(format!(
                "{}: all records in a set must share one TTL (found {} and {})",
                label,
                ttl,
                record.ttl()
            )));
        }
        capabilities.check(record)?;

        resource_records.push(NativeResourceRecord {
            content: render_content(record.data()),
            enabled: true,
        });
    }

    Ok(Some(NativeRRSet {
        ttl,
        resource_records,
    }))
}

fn render_content(data: &RecordData) -> Vec<Value> {
    match data {
        RecordData::A { address } => vec![json!(address.to_string())],
        RecordData::Aaaa { address } => vec![json!(address.to_string())],
        RecordData::Cname { target } | RecordData::Ns { target } => {
            vec![json!(without_dot(target))]
        }
        RecordData::Mx {
            preference,
            exchange,
        } => vec![json!(preference), json!(without_dot(exchange))],
        RecordData::Srv {
            priority,
            weight,
            port,
            target,
        } => {
            // The null target stays "." on the wire
            let target = if target == "." { "." } else { without_dot(target) };
            vec![json!(priority), json!(weight), json!(port), json!(target)]
        }
        RecordData::Caa { flags, tag, value } => vec![json!(flags), json!(tag), json!(value)],
        RecordData::Txt { strings } => strings.iter().map(|s| json!(s)).collect(),
    }
}

fn parse_content(content: &[Value], record_type: RecordType) -> std::result::Result<RecordData, String> {
    let expected = match record_type {
        RecordType::A | RecordType::Aaaa | RecordType::Cname | RecordType::Ns => Some(1),
        RecordType::Mx => Some(2),
        RecordType::Caa => Some(3),
        RecordType::Srv => Some(4),
        RecordType::Txt => None,
    };
    match expected {
        Some(n) if content.len() != n => {
            return Err(format!(
                "expected {} content field(s), got {}",
                n,
                content.len()
            ));
        }
        None if content.is_empty() => return Err("TXT record has no strings".to_string()),
        _ => {}
    }

    let data = match record_type {
        RecordType::A => RecordData::A {
            address: parse_text(&content[0], "address")?,
        },
        RecordType::Aaaa => RecordData::Aaaa {
            address: parse_text(&content[0], "address")?,
        },
        RecordType::Cname => RecordData::Cname {
            target: text(&content[0], "target")?,
        },
        RecordType::Ns => RecordData::Ns {
            target: text(&content[0], "target")?,
        },
        RecordType::Mx => RecordData::Mx {
            preference: number(&content[0], "preference")?,
            exchange: text(&content[1], "exchange")?,
        },
        RecordType::Srv => RecordData::Srv {
            priority: number(&content[0], "priority")?,
            weight: number(&content[1], "weight")?,
            port: number(&content[2], "port")?,
            target: text(&content[3], "target")?,
        },
        RecordType::Caa => RecordData::Caa {
            flags: number(&content[0], "flags")?,
            tag: text(&content[1], "tag")?,
            value: text(&content[2], "value")?,
        },
        RecordType::Txt => RecordData::Txt {
            strings: content
                .iter()
                .map(|v| text(v, "text"))
                .collect::<std::result::Result<_, _>>()?,
        },
    };
    Ok(data)
}

fn text(value: &Value, field: &str) -> std::result::Result<String, String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("{} must be a string, got {}", field, value))
}

fn parse_text<T: FromStr>(value: &Value, field: &str) -> std::result::Result<T, String> {
    let raw = text(value, field)?;
    raw.trim()
        .parse()
        .map_err(|_| format!("invalid {} '{}'", field, raw))
}

fn number<T: TryFrom<u64>>(value: &Value, field: &str) -> std::result::Result<T, String> {
    let raw = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .ok_or_else(|| format!("invalid {} {}", field, value))?;

    T::try_from(raw).map_err(|_| format!("{} {} out of range", field, raw))
}
