//! # Hubble - Declarative Azure Event Hubs Provisioning
//!
//! Hubble reconciles Azure Event Hub namespaces and event hubs against
//! desired-state plan files. Runs are idempotent: each resource is fetched,
//! compared to the desired state, and only mutated when something actually
//! differs. Check mode performs all reads and decisions without touching the
//! provider.
//!
//! ## Core Concepts
//!
//! - **Plans**: YAML-defined lists of resources reconciled in order
//! - **Modules**: Units of work that reconcile one resource kind
//! - **Cloud Client**: The management-plane capability injected into modules,
//!   with a real ARM implementation and an in-memory double
//! - **Check mode**: Dry runs that report what would change
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     CLI Interface                        │
//! │               (clap-based command parsing)               │
//! └──────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                      Plan Runner                         │
//! │          (sequential reconciliation, reporting)          │
//! └──────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                    Module Registry                       │
//! │           (azure_eventhub reconciliation logic)          │
//! └──────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                  EventHubsClient trait                   │
//! │        (ArmClient over REST / InMemoryClient double)     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use hubble::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let plan = Plan::from_file("plan.yml".as_ref())?;
//!     let registry = ModuleRegistry::with_builtins();
//!
//!     let client = Arc::new(ArmClient::new(credentials)?);
//!     let context = ModuleContext::new().with_client(client);
//!
//!     let report = run_plan(&plan, &registry, &context).await;
//!     println!("{} changed", report.changed_count());
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    // Cloud client
    pub use crate::client::arm::{ArmClient, ArmCredentials};
    pub use crate::client::memory::InMemoryClient;
    pub use crate::client::models::{
        EntityStatus, EventHubParams, EventHubState, NamespaceParams, NamespaceState,
        ResourceState, Sku,
    };
    pub use crate::client::{ClientError, ClientResult, EventHubsClient};

    // Error handling
    pub use crate::error::{Error, Result};

    // Module system
    pub use crate::modules::{
        Module, ModuleContext, ModuleOutput, ModuleRegistry, ModuleResult, ModuleStatus, ParamExt,
    };

    // Plans
    pub use crate::plan::{run_plan, Plan, PlanReport};
}

/// Error types and result aliases for Hubble operations.
pub mod error;

/// Cloud client capability for the Event Hubs management plane.
///
/// Defines the [`EventHubsClient`](client::EventHubsClient) trait together
/// with the ARM REST implementation and an in-memory test double.
pub mod client;

/// Built-in module implementations and the module framework.
///
/// Modules reconcile one resource kind each. Custom modules can be added by
/// implementing the [`Module`](modules::Module) trait.
pub mod modules;

/// Plan parsing, validation, and sequential execution.
pub mod plan;

/// Configuration management for credentials and endpoints.
pub mod config;

/// Output formatting and reporting utilities.
pub mod output;

/// Returns the current version of Hubble.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
