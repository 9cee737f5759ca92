//! Filtered record type and extraction functions

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Source key of the nested agent sub-object
const AGENT_KEY: &str = "agent";

/// One search result reduced to the fields the harvester keeps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredRecord {
    /// `businessName`
    pub business_name: String,
    /// `registrationId`
    pub registration_id: String,
    /// `status`
    pub status: String,
    /// `filingDate`
    pub filing_date: String,
    /// `agent.name`
    pub agent_name: String,
    /// `agent.address`
    pub agent_address: String,
    /// `agent.email`
    pub agent_email: String,
}

/// Project one raw result record. Never fails.
pub fn extract(raw: &Value) -> FilteredRecord {
    let agent = raw.get(AGENT_KEY);

    FilteredRecord {
        business_name: string_field(Some(raw), "businessName"),
        registration_id: string_field(Some(raw), "registrationId"),
        status: string_field(Some(raw), "status"),
        filing_date: string_field(Some(raw), "filingDate"),
        agent_name: string_field(agent, "name"),
        agent_address: string_field(agent, "address"),
        agent_email: string_field(agent, "email"),
    }
}

/// Project every record of a page, preserving order
pub fn extract_all(raw: &[Value]) -> Vec<FilteredRecord> {
    raw.iter().map(extract).collect()
}

/// Read `key` from an object as a string, or empty
fn string_field(object: Option<&Value>, key: &str) -> String {
    object
        .and_then(|o| o.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
