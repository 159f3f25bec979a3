//! Cloud client capability for the Azure Event Hubs management plane.
//!
//! The [`EventHubsClient`] trait is the seam between reconciliation logic and
//! the provider. Modules receive a client through their execution context
//! rather than constructing one, so any implementation can be substituted:
//!
//! - [`arm::ArmClient`]: the real thing, speaking Azure Resource Manager REST
//! - [`memory::InMemoryClient`]: a deterministic double for tests and dry runs
//!
//! Absence is a first-class outcome here, not an exception: reads against a
//! missing entity return [`ClientError::NotFound`], which callers can match
//! without conflating it with provider failures.

pub mod arm;
pub mod memory;
pub mod models;

use async_trait::async_trait;
use thiserror::Error;

use models::{EventHubParams, EventHubState, NamespaceParams, NamespaceState};

/// Errors surfaced by management-plane clients.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The entity does not exist. Meaningful state for reconciliation.
    #[error("'{name}' not found in resource group '{resource_group}'")]
    NotFound {
        resource_group: String,
        name: String,
    },

    /// Any other provider failure. Fatal to the operation in progress.
    #[error("cloud request failed ({status}): {message}")]
    Cloud {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Token acquisition or credential problems.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A configured endpoint or authority URL could not be parsed.
    #[error("invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    /// Transport-level failure before any provider response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A long-running operation did not finish within the polling budget.
    #[error("operation did not complete after {attempts} polls")]
    OperationTimeout { attempts: u32 },
}

impl ClientError {
    pub fn not_found(resource_group: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            resource_group: resource_group.into(),
            name: name.into(),
        }
    }

    /// True when the error signals absence rather than failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Management-plane operations for Event Hub namespaces and event hubs.
///
/// Delete operations block until the provider-side operation completes;
/// long-running-operation polling is the implementation's concern.
#[async_trait]
pub trait EventHubsClient: Send + Sync {
    /// Fetches the current state of a namespace.
    async fn get_namespace(
        &self,
        resource_group: &str,
        namespace: &str,
    ) -> ClientResult<NamespaceState>;

    /// Creates a namespace or updates it in place. Returns the resulting state.
    async fn create_or_update_namespace(
        &self,
        resource_group: &str,
        namespace: &str,
        params: &NamespaceParams,
    ) -> ClientResult<NamespaceState>;

    /// Deletes a namespace and everything nested under it.
    async fn delete_namespace(&self, resource_group: &str, namespace: &str) -> ClientResult<()>;

    /// Fetches the current state of an event hub.
    async fn get_event_hub(
        &self,
        resource_group: &str,
        namespace: &str,
        name: &str,
    ) -> ClientResult<EventHubState>;

    /// Creates an event hub or updates it in place. Returns the resulting state.
    async fn create_or_update_event_hub(
        &self,
        resource_group: &str,
        namespace: &str,
        name: &str,
        params: &EventHubParams,
    ) -> ClientResult<EventHubState>;

    /// Deletes an event hub.
    async fn delete_event_hub(
        &self,
        resource_group: &str,
        namespace: &str,
        name: &str,
    ) -> ClientResult<()>;
}
