//! Desired-state plan files and their execution.
//!
//! A plan is a YAML document listing the resources to reconcile, in order.
//! Each entry is a parameter mapping for the Event Hub module:
//!
//! ```yaml
//! name: streaming platform
//! resources:
//!   - resource_group: prod-rg
//!     namespace_name: telemetry
//!     sku: standard
//!     partition_count: 4
//!     message_retention_in_days: 7
//!     state: present
//!   - resource_group: prod-rg
//!     namespace_name: telemetry
//!     name: device-events
//!     partition_count: 4
//!     message_retention_in_days: 7
//! ```
//!
//! Execution is sequential and stops at the first failure; results are
//! collected into a [`PlanReport`] for display.

use crate::error::{Error, Result};
use crate::modules::{
    ModuleContext, ModuleOutput, ModuleParams, ModuleRegistry, ModuleStatus, ParamExt,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Module invoked for every plan resource.
pub const RESOURCE_MODULE: &str = "azure_eventhub";

/// A desired-state plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    /// Optional display name for the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Resources reconciled in order
    #[serde(default)]
    pub resources: Vec<ModuleParams>,
}

impl Plan {
    /// Loads a plan from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::PlanParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_yaml::from_str(&raw).map_err(|e| Error::PlanParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Parses a plan from a YAML string.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Validates every resource against the module's parameter contract.
    pub fn validate(&self, registry: &ModuleRegistry) -> Result<()> {
        let mut problems = Vec::new();
        for (index, params) in self.resources.iter().enumerate() {
            if let Err(e) = registry.validate(RESOURCE_MODULE, params) {
                problems.push(format!(
                    "resource {} ({}): {}",
                    index + 1,
                    resource_label(params),
                    e
                ));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::PlanValidation(problems.join("; ")))
        }
    }
}

/// Display label for a resource: `namespace/hub` or just the namespace.
pub fn resource_label(params: &ModuleParams) -> String {
    let namespace = params
        .get_string("namespace_name")
        .ok()
        .flatten()
        .unwrap_or_else(|| "<unknown>".to_string());
    match params.get_string("name").ok().flatten() {
        Some(name) => format!("{}/{}", namespace, name),
        None => namespace,
    }
}

/// Outcome of one reconciled resource.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceReport {
    pub label: String,
    pub status: ModuleStatus,
    pub changed: bool,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<serde_json::Value>,
}

impl ResourceReport {
    fn from_output(label: String, mut output: ModuleOutput) -> Self {
        Self {
            label,
            status: output.status,
            changed: output.changed,
            msg: output.msg.clone(),
            state: output.data.remove("state"),
        }
    }

    fn failure(label: String, message: String) -> Self {
        Self {
            label,
            status: ModuleStatus::Failed,
            changed: false,
            msg: message,
            state: None,
        }
    }

    pub fn failed(&self) -> bool {
        self.status == ModuleStatus::Failed
    }
}

/// Aggregated results of a plan run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanReport {
    pub results: Vec<ResourceReport>,
}

impl PlanReport {
    pub fn failed(&self) -> bool {
        self.results.iter().any(ResourceReport::failed)
    }

    pub fn changed_count(&self) -> usize {
        self.results.iter().filter(|r| r.changed).count()
    }
}

/// Reconciles the plan's resources in order, stopping at the first failure.
pub async fn run_plan(
    plan: &Plan,
    registry: &ModuleRegistry,
    context: &ModuleContext,
) -> PlanReport {
    let mut report = PlanReport::default();
    for params in &plan.resources {
        let label = resource_label(params);
        tracing::info!(resource = %label, check_mode = context.check_mode, "reconciling");

        match registry.execute(RESOURCE_MODULE, params, context).await {
            Ok(output) => {
                report.results.push(ResourceReport::from_output(label, output));
            }
            Err(e) => {
                tracing::error!(resource = %label, error = %e, "reconciliation failed");
                report.results.push(ResourceReport::failure(label, e.to_string()));
                break;
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"
name: streaming platform
resources:
  - resource_group: rg1
    namespace_name: ns1
    sku: standard
    partition_count: 4
    message_retention_in_days: 7
  - resource_group: rg1
    namespace_name: ns1
    name: eh1
    partition_count: 4
    message_retention_in_days: 7
    state: present
"#;

    #[test]
    fn test_plan_parsing() {
        let plan = Plan::from_yaml(PLAN).unwrap();
        assert_eq!(plan.name.as_deref(), Some("streaming platform"));
        assert_eq!(plan.resources.len(), 2);
        assert_eq!(resource_label(&plan.resources[0]), "ns1");
        assert_eq!(resource_label(&plan.resources[1]), "ns1/eh1");
    }

    #[test]
    fn test_plan_validation() {
        let plan = Plan::from_yaml(PLAN).unwrap();
        let registry = ModuleRegistry::with_builtins();
        assert!(plan.validate(&registry).is_ok());
    }

    #[test]
    fn test_plan_validation_reports_resource_index() {
        let plan = Plan::from_yaml(
            r#"
resources:
  - namespace_name: ns1
    state: absent
"#,
        )
        .unwrap();
        let registry = ModuleRegistry::with_builtins();
        let err = plan.validate(&registry).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("resource 1"));
        assert!(message.contains("resource_group"));
    }

    #[test]
    fn test_empty_plan() {
        let plan = Plan::from_yaml("resources: []").unwrap();
        assert!(plan.resources.is_empty());
        let registry = ModuleRegistry::with_builtins();
        assert!(plan.validate(&registry).is_ok());
    }
}
