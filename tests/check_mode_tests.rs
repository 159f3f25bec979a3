//! Check mode (dry-run) tests for the Event Hub module.
//!
//! These tests verify that:
//! - Check mode never invokes a mutating operation, regardless of the
//!   computed changed value
//! - Check mode correctly reports what would change
//! - Check mode with diff mode shows before/after values

mod common;

use std::sync::Arc;

use common::*;
use hubble::client::memory::InMemoryClient;
use hubble::modules::ModuleRegistry;

#[tokio::test]
async fn test_check_mode_create_never_mutates() {
    let client = Arc::new(InMemoryClient::new());
    let registry = ModuleRegistry::with_builtins();
    let params = make_params(serde_json::json!({
        "resource_group": "rg1",
        "namespace_name": "ns1",
        "sku": "standard",
        "partition_count": 4,
        "message_retention_in_days": 7
    }));

    let output = registry
        .execute(MODULE, &params, &check_mode_context(&client))
        .await
        .unwrap();

    assert!(output.changed);
    assert!(output.msg.starts_with("Would create or update"));
    assert_eq!(client.calls().mutations(), 0);
    assert!(client.namespace("rg1", "ns1").is_none());
}

#[tokio::test]
async fn test_check_mode_delete_never_mutates() {
    let client = Arc::new(InMemoryClient::new());
    client.seed_namespace("rg1", existing_namespace("ns1", "Standard", &[]));
    let registry = ModuleRegistry::with_builtins();
    let params = make_params(serde_json::json!({
        "resource_group": "rg1",
        "namespace_name": "ns1",
        "state": "absent"
    }));

    let output = registry
        .execute(MODULE, &params, &check_mode_context(&client))
        .await
        .unwrap();

    assert!(output.changed);
    assert!(output.msg.starts_with("Would delete"));
    assert_eq!(client.calls().mutations(), 0);
    assert!(client.namespace("rg1", "ns1").is_some());
}

#[tokio::test]
async fn test_check_mode_noop_reports_unchanged() {
    let client = Arc::new(InMemoryClient::new());
    client.seed_namespace("rg1", existing_namespace("ns1", "Standard", &[]));
    let registry = ModuleRegistry::with_builtins();
    let params = make_params(serde_json::json!({
        "resource_group": "rg1",
        "namespace_name": "ns1",
        "sku": "standard",
        "partition_count": 4,
        "message_retention_in_days": 7
    }));

    let output = registry
        .execute(MODULE, &params, &check_mode_context(&client))
        .await
        .unwrap();

    assert!(!output.changed);
    assert_eq!(client.calls().mutations(), 0);
}

#[tokio::test]
async fn test_check_mode_invariant_across_resources() {
    // Dry runs perform reads and decisions only, whatever the resource asks for.
    let resources = [
        serde_json::json!({
            "resource_group": "rg1",
            "namespace_name": "ns1",
            "sku": "basic",
            "partition_count": 1,
            "message_retention_in_days": 1
        }),
        serde_json::json!({
            "resource_group": "rg1",
            "namespace_name": "existing",
            "sku": "standard",
            "partition_count": 4,
            "message_retention_in_days": 7,
            "tags": {"env": "prod"}
        }),
        serde_json::json!({
            "resource_group": "rg1",
            "namespace_name": "existing",
            "name": "eh1",
            "partition_count": 4,
            "message_retention_in_days": 1
        }),
        serde_json::json!({
            "resource_group": "rg1",
            "namespace_name": "existing",
            "state": "absent"
        }),
        serde_json::json!({
            "resource_group": "rg1",
            "namespace_name": "missing",
            "state": "absent"
        }),
    ];

    let client = Arc::new(InMemoryClient::new());
    client.seed_namespace("rg1", existing_namespace("existing", "Basic", &[]));
    let registry = ModuleRegistry::with_builtins();

    for resource in resources {
        let params = make_params(resource);
        registry
            .execute(MODULE, &params, &check_mode_context(&client))
            .await
            .unwrap();
    }

    assert_eq!(client.calls().mutations(), 0);
}

#[tokio::test]
async fn test_check_mode_event_hub_create() {
    let client = Arc::new(InMemoryClient::new());
    client.seed_namespace("rg1", existing_namespace("ns1", "Standard", &[]));
    let registry = ModuleRegistry::with_builtins();
    let params = make_params(serde_json::json!({
        "resource_group": "rg1",
        "namespace_name": "ns1",
        "name": "eh1",
        "partition_count": 4,
        "message_retention_in_days": 1
    }));

    let output = registry
        .execute(MODULE, &params, &check_mode_context(&client))
        .await
        .unwrap();

    assert!(output.changed);
    assert!(output.msg.contains("event hub 'eh1'"));
    assert_eq!(client.calls().mutations(), 0);
    assert!(client.event_hub("rg1", "ns1", "eh1").is_none());
}

#[tokio::test]
async fn test_check_mode_with_diff_shows_sku_change() {
    let client = Arc::new(InMemoryClient::new());
    client.seed_namespace("rg1", existing_namespace("ns1", "Basic", &[]));
    let registry = ModuleRegistry::with_builtins();
    let params = make_params(serde_json::json!({
        "resource_group": "rg1",
        "namespace_name": "ns1",
        "sku": "standard",
        "partition_count": 4,
        "message_retention_in_days": 7
    }));

    let context = check_mode_context(&client).with_diff_mode(true);
    let output = registry.execute(MODULE, &params, &context).await.unwrap();

    assert!(output.changed);
    let diff = output.diff.expect("diff mode should attach a diff");
    assert_eq!(diff.before, "Basic");
    assert_eq!(diff.after, "Standard");
}

#[tokio::test]
async fn test_check_mode_with_diff_shows_tag_change() {
    let client = Arc::new(InMemoryClient::new());
    client.seed_namespace("rg1", existing_namespace("ns1", "Standard", &[("env", "staging")]));
    let registry = ModuleRegistry::with_builtins();
    let params = make_params(serde_json::json!({
        "resource_group": "rg1",
        "namespace_name": "ns1",
        "sku": "standard",
        "partition_count": 4,
        "message_retention_in_days": 7,
        "tags": {"env": "prod"}
    }));

    let context = check_mode_context(&client).with_diff_mode(true);
    let output = registry.execute(MODULE, &params, &context).await.unwrap();

    assert!(output.changed);
    let diff = output.diff.expect("diff mode should attach a diff");
    assert_eq!(diff.before, "env=staging");
    assert_eq!(diff.after, "env=prod");
}

#[tokio::test]
async fn test_check_mode_reports_current_state() {
    let client = Arc::new(InMemoryClient::new());
    client.seed_namespace("rg1", existing_namespace("ns1", "Standard", &[]));
    client.seed_event_hub("rg1", "ns1", existing_event_hub("eh1", 2, 1));
    let registry = ModuleRegistry::with_builtins();
    let params = make_params(serde_json::json!({
        "resource_group": "rg1",
        "namespace_name": "ns1",
        "name": "eh1",
        "partition_count": 2,
        "message_retention_in_days": 1
    }));

    let output = registry
        .execute(MODULE, &params, &check_mode_context(&client))
        .await
        .unwrap();

    assert!(!output.changed);
    // the unchanged event hub record is reported as-is
    assert_eq!(output.data["state"]["name"], "eh1");
    assert_eq!(output.data["state"]["partition_count"], 2);
}
