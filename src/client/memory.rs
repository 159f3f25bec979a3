//! In-memory [`EventHubsClient`] implementation.
//!
//! A deterministic stand-in for the management plane, used by the test suite
//! and handy for rehearsing plans offline. It reflects prior mutations (a
//! created namespace is visible to subsequent reads) and records how many
//! mutating calls were made, so tests can assert that dry runs touch nothing.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::models::{
    normalize_location, EventHubParams, EventHubState, NamespaceParams, NamespaceState,
};
use super::{ClientError, ClientResult, EventHubsClient};

/// Counters for mutating operations, one per trait method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub namespace_writes: u32,
    pub namespace_deletes: u32,
    pub event_hub_writes: u32,
    pub event_hub_deletes: u32,
}

impl CallCounts {
    /// Total number of mutating calls observed.
    pub fn mutations(&self) -> u32 {
        self.namespace_writes
            + self.namespace_deletes
            + self.event_hub_writes
            + self.event_hub_deletes
    }
}

#[derive(Default)]
struct Inner {
    namespaces: HashMap<(String, String), NamespaceState>,
    event_hubs: HashMap<(String, String, String), EventHubState>,
    calls: CallCounts,
    mutation_failure: Option<String>,
}

/// In-memory management plane.
#[derive(Default)]
pub struct InMemoryClient {
    inner: Mutex<Inner>,
}

impl InMemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a namespace as pre-existing remote state.
    ///
    /// The key is taken from `state.name`; states without a name are ignored.
    pub fn seed_namespace(&self, resource_group: &str, state: NamespaceState) {
        let Some(name) = state.name.clone() else {
            return;
        };
        self.inner
            .lock()
            .namespaces
            .insert((resource_group.to_string(), name), state);
    }

    /// Seeds an event hub as pre-existing remote state under a namespace.
    pub fn seed_event_hub(&self, resource_group: &str, namespace: &str, state: EventHubState) {
        let Some(name) = state.name.clone() else {
            return;
        };
        self.inner.lock().event_hubs.insert(
            (resource_group.to_string(), namespace.to_string(), name),
            state,
        );
    }

    /// Snapshot of a stored namespace, if any.
    pub fn namespace(&self, resource_group: &str, namespace: &str) -> Option<NamespaceState> {
        self.inner
            .lock()
            .namespaces
            .get(&(resource_group.to_string(), namespace.to_string()))
            .cloned()
    }

    /// Snapshot of a stored event hub, if any.
    pub fn event_hub(
        &self,
        resource_group: &str,
        namespace: &str,
        name: &str,
    ) -> Option<EventHubState> {
        self.inner
            .lock()
            .event_hubs
            .get(&(
                resource_group.to_string(),
                namespace.to_string(),
                name.to_string(),
            ))
            .cloned()
    }

    /// Mutation call counters accumulated so far.
    pub fn calls(&self) -> CallCounts {
        self.inner.lock().calls
    }

    /// Makes every subsequent mutating call fail with a provider error.
    pub fn fail_mutations(&self, message: impl Into<String>) {
        self.inner.lock().mutation_failure = Some(message.into());
    }

    fn check_mutation_failure(inner: &Inner) -> ClientResult<()> {
        if let Some(message) = &inner.mutation_failure {
            return Err(ClientError::Cloud {
                status: 500,
                code: Some("InternalServerError".to_string()),
                message: message.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EventHubsClient for InMemoryClient {
    async fn get_namespace(
        &self,
        resource_group: &str,
        namespace: &str,
    ) -> ClientResult<NamespaceState> {
        self.namespace(resource_group, namespace)
            .ok_or_else(|| ClientError::not_found(resource_group, namespace))
    }

    async fn create_or_update_namespace(
        &self,
        resource_group: &str,
        namespace: &str,
        params: &NamespaceParams,
    ) -> ClientResult<NamespaceState> {
        let mut inner = self.inner.lock();
        inner.calls.namespace_writes += 1;
        Self::check_mutation_failure(&inner)?;

        let key = (resource_group.to_string(), namespace.to_string());
        let now = Utc::now();
        let existing = inner.namespaces.get(&key).cloned();

        let state = NamespaceState {
            name: Some(namespace.to_string()),
            resource_type: Some("Microsoft.EventHub/Namespaces".to_string()),
            location: params.location.as_deref().map(normalize_location),
            sku: Some(params.sku.as_str().to_string()),
            tags: params.tags.clone(),
            provisioning_state: Some("Succeeded".to_string()),
            status: Some("Active".to_string()),
            service_bus_endpoint: Some(format!(
                "https://{}.servicebus.windows.net:443/",
                namespace
            )),
            created_at: existing.as_ref().and_then(|s| s.created_at).or(Some(now)),
            updated_at: Some(now),
            ..Default::default()
        };

        inner.namespaces.insert(key, state.clone());
        Ok(state)
    }

    async fn delete_namespace(&self, resource_group: &str, namespace: &str) -> ClientResult<()> {
        let mut inner = self.inner.lock();
        inner.calls.namespace_deletes += 1;
        Self::check_mutation_failure(&inner)?;

        let key = (resource_group.to_string(), namespace.to_string());
        if inner.namespaces.remove(&key).is_none() {
            return Err(ClientError::not_found(resource_group, namespace));
        }
        // Deleting a namespace takes its event hubs with it.
        inner
            .event_hubs
            .retain(|(rg, ns, _), _| !(rg == resource_group && ns == namespace));
        Ok(())
    }

    async fn get_event_hub(
        &self,
        resource_group: &str,
        namespace: &str,
        name: &str,
    ) -> ClientResult<EventHubState> {
        self.event_hub(resource_group, namespace, name)
            .ok_or_else(|| ClientError::not_found(resource_group, name))
    }

    async fn create_or_update_event_hub(
        &self,
        resource_group: &str,
        namespace: &str,
        name: &str,
        params: &EventHubParams,
    ) -> ClientResult<EventHubState> {
        let mut inner = self.inner.lock();
        inner.calls.event_hub_writes += 1;
        Self::check_mutation_failure(&inner)?;

        let ns_key = (resource_group.to_string(), namespace.to_string());
        if !inner.namespaces.contains_key(&ns_key) {
            return Err(ClientError::not_found(resource_group, namespace));
        }

        let key = (
            resource_group.to_string(),
            namespace.to_string(),
            name.to_string(),
        );
        let now = Utc::now();
        let existing = inner.event_hubs.get(&key).cloned();

        let state = EventHubState {
            name: Some(name.to_string()),
            partition_ids: (0..params.partition_count).map(|i| i.to_string()).collect(),
            created_at: existing.as_ref().and_then(|s| s.created_at).or(Some(now)),
            updated_at: Some(now),
            message_retention_in_days: Some(params.message_retention_in_days),
            partition_count: Some(params.partition_count),
            status: Some(params.status.as_str().to_string()),
            ..Default::default()
        };

        inner.event_hubs.insert(key, state.clone());
        Ok(state)
    }

    async fn delete_event_hub(
        &self,
        resource_group: &str,
        namespace: &str,
        name: &str,
    ) -> ClientResult<()> {
        let mut inner = self.inner.lock();
        inner.calls.event_hub_deletes += 1;
        Self::check_mutation_failure(&inner)?;

        let key = (
            resource_group.to_string(),
            namespace.to_string(),
            name.to_string(),
        );
        if inner.event_hubs.remove(&key).is_none() {
            return Err(ClientError::not_found(resource_group, name));
        }
        Ok(())
    }
}
