//! Data model for the Event Hubs management plane.
//!
//! State records are the flat, serializable snapshots of remote resources
//! that modules return to the caller. Parameter structs carry the desired
//! configuration for create-or-update calls. Both are deliberately decoupled
//! from the ARM wire format, which lives in [`crate::client::arm`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Service tier of an Event Hub namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sku {
    /// Free tier with restricted capacity
    Free,
    /// Basic tier
    Basic,
    /// Standard tier with auto-inflate and capture support
    Standard,
}

impl Default for Sku {
    fn default() -> Self {
        Self::Free
    }
}

impl Sku {
    /// SKU name as the management plane spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sku::Free => "Free",
            Sku::Basic => "Basic",
            Sku::Standard => "Standard",
        }
    }

    /// Compares against a SKU name reported by the provider, ignoring case.
    pub fn matches(&self, reported: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(reported)
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sku {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Sku::Free),
            "basic" => Ok(Sku::Basic),
            "standard" => Ok(Sku::Standard),
            _ => Err(format!(
                "Invalid sku '{}'. Valid skus: free, basic, standard",
                s
            )),
        }
    }
}

/// Entity status of an event hub as accepted by the management plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityStatus {
    Active,
    Disabled,
    Restoring,
    SendDisabled,
    ReceiveDisabled,
    Creating,
    Deleting,
    Renaming,
    Unknown,
}

impl Default for EntityStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl EntityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Active => "Active",
            EntityStatus::Disabled => "Disabled",
            EntityStatus::Restoring => "Restoring",
            EntityStatus::SendDisabled => "SendDisabled",
            EntityStatus::ReceiveDisabled => "ReceiveDisabled",
            EntityStatus::Creating => "Creating",
            EntityStatus::Deleting => "Deleting",
            EntityStatus::Renaming => "Renaming",
            EntityStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(EntityStatus::Active),
            "disabled" => Ok(EntityStatus::Disabled),
            "restoring" => Ok(EntityStatus::Restoring),
            "senddisabled" => Ok(EntityStatus::SendDisabled),
            "receivedisabled" => Ok(EntityStatus::ReceiveDisabled),
            "creating" => Ok(EntityStatus::Creating),
            "deleting" => Ok(EntityStatus::Deleting),
            "renaming" => Ok(EntityStatus::Renaming),
            "unknown" => Ok(EntityStatus::Unknown),
            _ => Err(format!(
                "Invalid status '{}'. Valid statuses: Active, Disabled, Restoring, \
                 SendDisabled, ReceiveDisabled, Creating, Deleting, Renaming, Unknown",
                s
            )),
        }
    }
}

/// Normalizes a provider-reported location ("East US 2" -> "eastus2").
pub fn normalize_location(raw: &str) -> String {
    raw.replace(' ', "").to_lowercase()
}

/// Snapshot of an Event Hub namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamespaceState {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    /// Normalized location (spaces stripped, lowercased)
    pub location: Option<String>,
    /// SKU name as reported by the provider
    pub sku: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    pub provisioning_state: Option<String>,
    /// Namespace status ("Created" while provisioning, "Active" once usable)
    pub status: Option<String>,
    pub region: Option<String>,
    pub metric_id: Option<String>,
    pub service_bus_endpoint: Option<String>,
    pub scale_unit: Option<String>,
    pub enabled: Option<bool>,
    pub critical: Option<bool>,
    pub data_center: Option<String>,
    pub namespace_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_auto_inflate_enabled: Option<bool>,
    pub maximum_throughput_units: Option<i64>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub additional_properties: HashMap<String, serde_json::Value>,
}

/// Snapshot of an event hub inside a namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventHubState {
    pub name: Option<String>,
    #[serde(default)]
    pub partition_ids: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub message_retention_in_days: Option<i64>,
    pub partition_count: Option<i64>,
    pub status: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub additional_properties: HashMap<String, serde_json::Value>,
}

/// State record returned by a reconciliation, at either entity level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResourceState {
    Namespace(NamespaceState),
    EventHub(EventHubState),
}

impl ResourceState {
    /// Overwrites the record's status with the literal "Deleted".
    ///
    /// After a successful delete the provider response is not authoritative,
    /// so the reported status is forced regardless of what was fetched.
    pub fn mark_deleted(&mut self) {
        match self {
            ResourceState::Namespace(ns) => ns.status = Some("Deleted".to_string()),
            ResourceState::EventHub(eh) => eh.status = Some("Deleted".to_string()),
        }
    }

    pub fn status(&self) -> Option<&str> {
        match self {
            ResourceState::Namespace(ns) => ns.status.as_deref(),
            ResourceState::EventHub(eh) => eh.status.as_deref(),
        }
    }
}

impl From<NamespaceState> for ResourceState {
    fn from(state: NamespaceState) -> Self {
        ResourceState::Namespace(state)
    }
}

impl From<EventHubState> for ResourceState {
    fn from(state: EventHubState) -> Self {
        ResourceState::EventHub(state)
    }
}

/// Desired namespace configuration for a create-or-update call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamespaceParams {
    pub location: Option<String>,
    pub sku: Sku,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

/// Desired event hub configuration for a create-or-update call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventHubParams {
    pub location: Option<String>,
    pub message_retention_in_days: i64,
    pub partition_count: i64,
    pub status: EntityStatus,
}
