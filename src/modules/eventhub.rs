//! Azure Event Hub module for namespace and event hub management.
//!
//! This module reconciles Event Hub namespaces and the event hubs nested
//! inside them against a desired state:
//!
//! - Namespace creation, update, and deletion
//! - Event hub creation, update, and deletion
//! - Additive tag merging
//! - Dry-run support through check mode
//!
//! ## EventHubModule
//!
//! Manages Azure Event Hub lifecycle. When `name` is omitted the module
//! operates on the namespace alone; when set, it targets the event hub with
//! that name (ensuring the namespace on the way).
//!
//! ### Parameters
//!
//! | Parameter | Required | Description |
//! |-----------|----------|-------------|
//! | `resource_group` | Yes | Resource group name |
//! | `namespace_name` | Yes | Event Hub namespace name |
//! | `name` | No | Event hub name (omit to manage only the namespace) |
//! | `sku` | No | Namespace tier: free, basic, standard (default: free) |
//! | `partition_count` | No* | Partitions for the event hub, 1-32 (*required when state is present) |
//! | `message_retention_in_days` | No* | Message retention (*required when state is present) |
//! | `status` | No | Event hub status (default: Active) |
//! | `location` | No | Azure region for new resources |
//! | `tags` | No | Resource tags, merged additively into existing tags |
//! | `state` | No | Desired state: present, absent (default: present) |
//! | `wait` | No | Wait for namespace provisioning to settle (default: true) |
//! | `wait_timeout` | No | Provisioning wait budget in seconds (default: 600) |
//!
//! ### Example
//!
//! ```yaml
//! - resource_group: my-rg
//!   namespace_name: telemetry
//!   name: device-events
//!   sku: standard
//!   partition_count: 4
//!   message_retention_in_days: 7
//!   tags:
//!     env: production
//!   state: present
//! ```
//!
//! ### Change detection
//!
//! For an existing entity, `changed` is driven by the additive tag merge and,
//! for namespace-only operations, a case-insensitive SKU comparison. Attribute
//! drift on an existing event hub (partition_count, message_retention_in_days,
//! status) is not detected; those values only take effect at creation time.

use crate::client::models::{
    EntityStatus, EventHubParams, EventHubState, NamespaceParams, NamespaceState, ResourceState,
    Sku,
};
use crate::client::EventHubsClient;
use crate::modules::{
    Diff, Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleResult, ParamExt,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Namespace status reported while provisioning is still in flight.
const NAMESPACE_TRANSIENT_STATUS: &str = "Created";

/// Delay between namespace provisioning polls.
const NAMESPACE_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Represents the desired state of a namespace or event hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    /// Entity should exist
    Present,
    /// Entity should not exist
    Absent,
}

impl Default for DesiredState {
    fn default() -> Self {
        Self::Present
    }
}

impl DesiredState {
    fn from_str(s: &str) -> ModuleResult<Self> {
        match s.to_lowercase().as_str() {
            "present" => Ok(DesiredState::Present),
            "absent" => Ok(DesiredState::Absent),
            _ => Err(ModuleError::InvalidParameter(format!(
                "Invalid state '{}'. Valid states: present, absent",
                s
            ))),
        }
    }
}

/// Event Hub configuration parsed from module parameters
#[derive(Debug, Clone)]
struct EventHubConfig {
    resource_group: String,
    namespace_name: String,
    name: Option<String>,
    sku: Sku,
    partition_count: Option<i64>,
    message_retention_in_days: Option<i64>,
    status: EntityStatus,
    tags: HashMap<String, String>,
    location: Option<String>,
    state: DesiredState,
    wait: bool,
    wait_timeout: u64,
}

impl EventHubConfig {
    fn from_params(params: &ModuleParams) -> ModuleResult<Self> {
        let resource_group = params.get_string_required("resource_group")?;
        let namespace_name = params.get_string_required("namespace_name")?;

        let state = if let Some(s) = params.get_string("state")? {
            DesiredState::from_str(&s)?
        } else {
            DesiredState::default()
        };

        let sku = if let Some(s) = params.get_string("sku")? {
            s.parse::<Sku>().map_err(ModuleError::InvalidParameter)?
        } else {
            Sku::default()
        };

        let status = if let Some(s) = params.get_string("status")? {
            s.parse::<EntityStatus>()
                .map_err(ModuleError::InvalidParameter)?
        } else {
            EntityStatus::default()
        };

        let partition_count = params.get_i64("partition_count")?;
        if let Some(count) = partition_count {
            if !(1..=32).contains(&count) {
                return Err(ModuleError::InvalidParameter(format!(
                    "partition_count must be between 1 and 32, got {}",
                    count
                )));
            }
        }

        let message_retention_in_days = params.get_i64("message_retention_in_days")?;

        let config = Self {
            resource_group,
            namespace_name,
            name: params.get_string("name")?,
            sku,
            partition_count,
            message_retention_in_days,
            status,
            tags: params.get_string_map("tags")?.unwrap_or_default(),
            location: params.get_string("location")?,
            state,
            wait: params.get_bool_or("wait", true),
            wait_timeout: params.get_i64("wait_timeout")?.unwrap_or(600) as u64,
        };

        // Creating or updating always needs the event hub sizing parameters.
        if config.state == DesiredState::Present {
            if config.partition_count.is_none() {
                return Err(ModuleError::MissingParameter(
                    "partition_count is required when state is 'present'".to_string(),
                ));
            }
            if config.message_retention_in_days.is_none() {
                return Err(ModuleError::MissingParameter(
                    "message_retention_in_days is required when state is 'present'".to_string(),
                ));
            }
        }

        Ok(config)
    }

    /// Human-readable description of the targeted entity.
    fn target(&self) -> String {
        match &self.name {
            Some(name) => format!(
                "event hub '{}' in namespace '{}'",
                name, self.namespace_name
            ),
            None => format!("namespace '{}'", self.namespace_name),
        }
    }
}

/// Applies desired tags on top of the current set.
///
/// Desired keys overwrite; keys absent from the desired set are preserved.
/// Returns whether the merge altered the current set, and the merged result.
fn merge_tags(
    current: &HashMap<String, String>,
    desired: &HashMap<String, String>,
) -> (bool, HashMap<String, String>) {
    let mut merged = current.clone();
    let mut changed = false;
    for (key, value) in desired {
        if merged.get(key) != Some(value) {
            merged.insert(key.clone(), value.clone());
            changed = true;
        }
    }
    (changed, merged)
}

fn format_tags(tags: &HashMap<String, String>) -> String {
    let mut pairs: Vec<String> = tags.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    pairs.sort();
    pairs.join(",")
}

/// Azure Event Hub module for managing namespaces and event hubs
pub struct EventHubModule;

impl EventHubModule {
    /// Fetch namespace state, treating absence as `None`.
    async fn find_namespace(
        config: &EventHubConfig,
        client: &dyn EventHubsClient,
    ) -> ModuleResult<Option<NamespaceState>> {
        match client
            .get_namespace(&config.resource_group, &config.namespace_name)
            .await
        {
            Ok(state) => Ok(Some(state)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch event hub state, treating absence as `None`.
    async fn find_event_hub(
        config: &EventHubConfig,
        name: &str,
        client: &dyn EventHubsClient,
    ) -> ModuleResult<Option<EventHubState>> {
        match client
            .get_event_hub(&config.resource_group, &config.namespace_name, name)
            .await
        {
            Ok(state) => Ok(Some(state)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Create or update the namespace and wait for provisioning to settle.
    async fn ensure_namespace(
        config: &EventHubConfig,
        client: &dyn EventHubsClient,
    ) -> ModuleResult<NamespaceState> {
        let params = NamespaceParams {
            location: config.location.clone(),
            sku: config.sku,
            tags: config.tags.clone(),
        };

        let result = client
            .create_or_update_namespace(&config.resource_group, &config.namespace_name, &params)
            .await
            .map_err(|e| {
                ModuleError::ExecutionFailed(format!(
                    "Failed to create namespace '{}' in resource group '{}': {}",
                    config.namespace_name, config.resource_group, e
                ))
            })?;

        if config.wait {
            Self::wait_for_namespace(config, client).await?;
        }

        Ok(result)
    }

    /// Poll until the namespace leaves the transient provisioning status.
    ///
    /// The wait is bounded by `wait_timeout`; an operation that never settles
    /// fails instead of blocking forever.
    async fn wait_for_namespace(
        config: &EventHubConfig,
        client: &dyn EventHubsClient,
    ) -> ModuleResult<()> {
        let timeout = Duration::from_secs(config.wait_timeout);
        let start = Instant::now();

        tracing::debug!(
            namespace = %config.namespace_name,
            timeout_secs = config.wait_timeout,
            "waiting for namespace provisioning"
        );

        let mut state = client
            .get_namespace(&config.resource_group, &config.namespace_name)
            .await
            .map_err(|e| {
                ModuleError::ExecutionFailed(format!(
                    "Failed to create namespace '{}' in resource group '{}': {}",
                    config.namespace_name, config.resource_group, e
                ))
            })?;

        while state.status.as_deref() == Some(NAMESPACE_TRANSIENT_STATUS) {
            if start.elapsed() >= timeout {
                return Err(ModuleError::ExecutionFailed(format!(
                    "Timed out after {}s waiting for namespace '{}' in resource group '{}' to finish provisioning",
                    config.wait_timeout, config.namespace_name, config.resource_group
                )));
            }
            tokio::time::sleep(NAMESPACE_POLL_INTERVAL).await;
            state = client
                .get_namespace(&config.resource_group, &config.namespace_name)
                .await
                .map_err(|e| {
                    ModuleError::ExecutionFailed(format!(
                        "Failed to create namespace '{}' in resource group '{}': {}",
                        config.namespace_name, config.resource_group, e
                    ))
                })?;
        }

        Ok(())
    }

    /// Create or update the targeted event hub.
    async fn create_event_hub(
        config: &EventHubConfig,
        client: &dyn EventHubsClient,
    ) -> ModuleResult<EventHubState> {
        let name = config
            .name
            .as_deref()
            .ok_or_else(|| ModuleError::MissingParameter("name".to_string()))?;
        let message_retention_in_days = config.message_retention_in_days.ok_or_else(|| {
            ModuleError::MissingParameter("message_retention_in_days".to_string())
        })?;
        let partition_count = config
            .partition_count
            .ok_or_else(|| ModuleError::MissingParameter("partition_count".to_string()))?;

        let params = EventHubParams {
            location: config.location.clone(),
            message_retention_in_days,
            partition_count,
            status: config.status,
        };

        client
            .create_or_update_event_hub(
                &config.resource_group,
                &config.namespace_name,
                name,
                &params,
            )
            .await
            .map_err(|e| {
                ModuleError::ExecutionFailed(format!(
                    "Failed to create event hub '{}' in resource group '{}': {}",
                    name, config.resource_group, e
                ))
            })
    }

    /// Fetch current state, decide whether a change is needed, and apply it.
    async fn reconcile(
        &self,
        config: &EventHubConfig,
        client: &dyn EventHubsClient,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        tracing::debug!(target = %config.target(), state = ?config.state, "fetching current state");

        let mut namespace = Self::find_namespace(config, client).await?;
        let mut event_hub = None;
        if let Some(name) = &config.name {
            if namespace.is_some() {
                event_hub = Self::find_event_hub(config, name, client).await?;
            }
        }

        let exists = namespace.is_some() && (config.name.is_none() || event_hub.is_some());

        let mut changed = false;
        let mut diff: Option<Diff> = None;

        if !exists {
            changed = config.state == DesiredState::Present;
            if changed && context.diff_mode {
                diff = Some(Diff::new("absent", "present"));
            }
        } else if config.state == DesiredState::Absent {
            changed = true;
            if context.diff_mode {
                diff = Some(Diff::new("present", "absent"));
            }
        } else if let Some(ns_state) = namespace.as_mut() {
            // Tags are tracked on the namespace, so the merge always runs
            // against the namespace's current set.
            let (tags_changed, merged) = merge_tags(&ns_state.tags, &config.tags);
            if tags_changed {
                changed = true;
                if context.diff_mode {
                    diff = Some(
                        Diff::new(format_tags(&ns_state.tags), format_tags(&merged))
                            .with_details("tags"),
                    );
                }
            } else if config.name.is_none() {
                let current_sku = ns_state.sku.as_deref().unwrap_or_default();
                if !config.sku.matches(current_sku) {
                    changed = true;
                    if context.diff_mode {
                        diff = Some(Diff::new(current_sku.to_string(), config.sku.as_str()));
                    }
                }
            }
            ns_state.tags = merged;
        }

        // Pick the record to report: the event hub when one was targeted and
        // nothing changed, otherwise the namespace (possibly about to mutate).
        let mut state: ResourceState = if config.name.is_some() && !changed {
            match &event_hub {
                Some(hub) => ResourceState::EventHub(hub.clone()),
                None => ResourceState::Namespace(namespace.clone().unwrap_or_default()),
            }
        } else {
            ResourceState::Namespace(namespace.clone().unwrap_or_default())
        };

        if context.check_mode {
            let mut output = if changed {
                let verb = match config.state {
                    DesiredState::Present => "create or update",
                    DesiredState::Absent => "delete",
                };
                ModuleOutput::changed(format!("Would {} {}", verb, config.target()))
            } else {
                ModuleOutput::ok(format!("No change needed for {}", config.target()))
            };
            output = output.with_data("state", serde_json::to_value(&state).unwrap());
            if let Some(diff) = diff {
                output = output.with_diff(diff);
            }
            return Ok(output);
        }

        if !changed {
            let msg = match config.state {
                DesiredState::Present => {
                    format!("{} already in desired state", config.target())
                }
                DesiredState::Absent => format!("{} does not exist", config.target()),
            };
            return Ok(ModuleOutput::ok(msg).with_data("state", serde_json::to_value(&state).unwrap()));
        }

        let msg = match config.state {
            DesiredState::Present => {
                if config.name.is_none() {
                    let result = Self::ensure_namespace(config, client).await?;
                    state = ResourceState::Namespace(result);
                } else {
                    // The namespace path runs first so the hub always has a
                    // home to land in.
                    Self::ensure_namespace(config, client).await?;
                    let result = Self::create_event_hub(config, client).await?;
                    state = ResourceState::EventHub(result);
                }
                format!("Created or updated {}", config.target())
            }
            DesiredState::Absent => {
                if let Some(name) = &config.name {
                    client
                        .delete_event_hub(&config.resource_group, &config.namespace_name, name)
                        .await
                        .map_err(|e| {
                            ModuleError::ExecutionFailed(format!(
                                "Error deleting the event hub '{}' in resource group '{}': {}",
                                name, config.resource_group, e
                            ))
                        })?;
                } else {
                    client
                        .delete_namespace(&config.resource_group, &config.namespace_name)
                        .await
                        .map_err(|e| {
                            ModuleError::ExecutionFailed(format!(
                                "Error deleting the namespace '{}' in resource group '{}': {}",
                                config.namespace_name, config.resource_group, e
                            ))
                        })?;
                }
                state.mark_deleted();
                format!("Deleted {}", config.target())
            }
        };

        let mut output =
            ModuleOutput::changed(msg).with_data("state", serde_json::to_value(&state).unwrap());
        if let Some(diff) = diff {
            output = output.with_diff(diff);
        }
        Ok(output)
    }
}

#[async_trait::async_trait]
impl Module for EventHubModule {
    fn name(&self) -> &'static str {
        "azure_eventhub"
    }

    fn description(&self) -> &'static str {
        "Create, update, and delete Azure Event Hub namespaces and event hubs"
    }

    fn required_params(&self) -> &[&'static str] {
        &["resource_group", "namespace_name"]
    }

    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        EventHubConfig::from_params(params).map(|_| ())
    }

    async fn execute(
        &self,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let config = EventHubConfig::from_params(params)?;
        let client = context.client()?;
        self.reconcile(&config, client.as_ref(), context).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_params() -> ModuleParams {
        let mut params = ModuleParams::new();
        params.insert("resource_group".to_string(), serde_json::json!("test-rg"));
        params.insert("namespace_name".to_string(), serde_json::json!("test-ns"));
        params.insert("partition_count".to_string(), serde_json::json!(4));
        params.insert(
            "message_retention_in_days".to_string(),
            serde_json::json!(1),
        );
        params
    }

    #[test]
    fn test_desired_state_from_str() {
        assert_eq!(
            DesiredState::from_str("present").unwrap(),
            DesiredState::Present
        );
        assert_eq!(
            DesiredState::from_str("Absent").unwrap(),
            DesiredState::Absent
        );
        assert!(DesiredState::from_str("deleted").is_err());
    }

    #[test]
    fn test_config_parsing() {
        let mut params = base_params();
        params.insert("name".to_string(), serde_json::json!("test-hub"));
        params.insert("sku".to_string(), serde_json::json!("standard"));
        params.insert("status".to_string(), serde_json::json!("SendDisabled"));
        params.insert("location".to_string(), serde_json::json!("eastus"));
        params.insert(
            "tags".to_string(),
            serde_json::json!({"env": "production", "team": "data"}),
        );

        let config = EventHubConfig::from_params(&params).unwrap();
        assert_eq!(config.resource_group, "test-rg");
        assert_eq!(config.namespace_name, "test-ns");
        assert_eq!(config.name.as_deref(), Some("test-hub"));
        assert_eq!(config.sku, Sku::Standard);
        assert_eq!(config.status, EntityStatus::SendDisabled);
        assert_eq!(config.partition_count, Some(4));
        assert_eq!(config.message_retention_in_days, Some(1));
        assert_eq!(config.tags.get("env").map(String::as_str), Some("production"));
        assert_eq!(config.state, DesiredState::Present);
    }

    #[test]
    fn test_config_defaults() {
        let config = EventHubConfig::from_params(&base_params()).unwrap();
        assert_eq!(config.sku, Sku::Free);
        assert_eq!(config.status, EntityStatus::Active);
        assert_eq!(config.state, DesiredState::Present);
        assert!(config.name.is_none());
        assert!(config.wait);
        assert_eq!(config.wait_timeout, 600);
    }

    #[test]
    fn test_present_requires_sizing_params() {
        let mut params = base_params();
        params.remove("partition_count");
        let err = EventHubConfig::from_params(&params).unwrap_err();
        assert!(matches!(err, ModuleError::MissingParameter(_)));

        let mut params = base_params();
        params.remove("message_retention_in_days");
        let err = EventHubConfig::from_params(&params).unwrap_err();
        assert!(matches!(err, ModuleError::MissingParameter(_)));
    }

    #[test]
    fn test_absent_does_not_require_sizing_params() {
        let mut params = ModuleParams::new();
        params.insert("resource_group".to_string(), serde_json::json!("test-rg"));
        params.insert("namespace_name".to_string(), serde_json::json!("test-ns"));
        params.insert("state".to_string(), serde_json::json!("absent"));

        let config = EventHubConfig::from_params(&params).unwrap();
        assert_eq!(config.state, DesiredState::Absent);
        assert!(config.partition_count.is_none());
    }

    #[test]
    fn test_partition_count_range() {
        for count in [0, 33, -1] {
            let mut params = base_params();
            params.insert("partition_count".to_string(), serde_json::json!(count));
            let err = EventHubConfig::from_params(&params).unwrap_err();
            assert!(matches!(err, ModuleError::InvalidParameter(_)));
        }

        for count in [1, 32] {
            let mut params = base_params();
            params.insert("partition_count".to_string(), serde_json::json!(count));
            assert!(EventHubConfig::from_params(&params).is_ok());
        }
    }

    #[test]
    fn test_invalid_sku_and_status_rejected() {
        let mut params = base_params();
        params.insert("sku".to_string(), serde_json::json!("premium"));
        assert!(EventHubConfig::from_params(&params).is_err());

        let mut params = base_params();
        params.insert("status".to_string(), serde_json::json!("Halted"));
        assert!(EventHubConfig::from_params(&params).is_err());
    }

    #[test]
    fn test_merge_tags_additive_overwrite() {
        let current: HashMap<String, String> = [
            ("env".to_string(), "staging".to_string()),
            ("owner".to_string(), "data".to_string()),
        ]
        .into();
        let desired: HashMap<String, String> = [
            ("env".to_string(), "production".to_string()),
            ("cost".to_string(), "platform".to_string()),
        ]
        .into();

        let (changed, merged) = merge_tags(&current, &desired);
        assert!(changed);
        assert_eq!(merged.get("env").map(String::as_str), Some("production"));
        // keys absent from the desired set survive the merge
        assert_eq!(merged.get("owner").map(String::as_str), Some("data"));
        assert_eq!(merged.get("cost").map(String::as_str), Some("platform"));
    }

    #[test]
    fn test_merge_tags_no_change() {
        let current: HashMap<String, String> =
            [("env".to_string(), "production".to_string())].into();

        let (changed, merged) = merge_tags(&current, &current.clone());
        assert!(!changed);
        assert_eq!(merged, current);

        let (changed, merged) = merge_tags(&current, &HashMap::new());
        assert!(!changed);
        assert_eq!(merged, current);
    }

    #[test]
    fn test_format_tags_is_sorted() {
        let tags: HashMap<String, String> = [
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ]
        .into();
        assert_eq!(format_tags(&tags), "a=1,b=2");
    }

    #[test]
    fn test_module_metadata() {
        let module = EventHubModule;
        assert_eq!(module.name(), "azure_eventhub");
        assert_eq!(
            module.required_params(),
            &["resource_group", "namespace_name"]
        );
    }

    #[test]
    fn test_validate_params_rejects_missing_resource_group() {
        let module = EventHubModule;
        let mut params = base_params();
        params.remove("resource_group");
        assert!(module.validate_params(&params).is_err());
    }

    #[test]
    fn test_target_description() {
        let config = EventHubConfig::from_params(&base_params()).unwrap();
        assert_eq!(config.target(), "namespace 'test-ns'");

        let mut params = base_params();
        params.insert("name".to_string(), serde_json::json!("test-hub"));
        let config = EventHubConfig::from_params(&params).unwrap();
        assert_eq!(
            config.target(),
            "event hub 'test-hub' in namespace 'test-ns'"
        );
    }
}
