//! Shared test utilities and fixtures for the Hubble test suite.
//!
//! Provides parameter builders, contexts wired to the in-memory management
//! plane, and pre-existing resource fixtures.

#![allow(dead_code)]

use std::sync::Arc;

use hubble::client::memory::InMemoryClient;
use hubble::client::models::{EventHubState, NamespaceState};
use hubble::modules::{ModuleContext, ModuleParams};

/// Module name under test.
pub const MODULE: &str = "azure_eventhub";

/// Builds module params from a JSON literal.
pub fn make_params(value: serde_json::Value) -> ModuleParams {
    serde_json::from_value(value).expect("params literal must be a JSON object")
}

/// Context wired to the given in-memory client.
pub fn test_context(client: &Arc<InMemoryClient>) -> ModuleContext {
    ModuleContext::new().with_client(client.clone())
}

/// Context wired to the client with check mode enabled.
pub fn check_mode_context(client: &Arc<InMemoryClient>) -> ModuleContext {
    test_context(client).with_check_mode(true)
}

/// A namespace as the provider would report it.
pub fn existing_namespace(name: &str, sku: &str, tags: &[(&str, &str)]) -> NamespaceState {
    NamespaceState {
        name: Some(name.to_string()),
        resource_type: Some("Microsoft.EventHub/Namespaces".to_string()),
        location: Some("eastus".to_string()),
        sku: Some(sku.to_string()),
        tags: tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        provisioning_state: Some("Succeeded".to_string()),
        status: Some("Active".to_string()),
        ..Default::default()
    }
}

/// An event hub as the provider would report it.
pub fn existing_event_hub(name: &str, partition_count: i64, retention: i64) -> EventHubState {
    EventHubState {
        name: Some(name.to_string()),
        partition_ids: (0..partition_count).map(|i| i.to_string()).collect(),
        message_retention_in_days: Some(retention),
        partition_count: Some(partition_count),
        status: Some("Active".to_string()),
        ..Default::default()
    }
}
