//! Output formatting for plan runs.
//!
//! Provides human-readable console output with per-status coloring, plus a
//! machine-parseable JSON rendering of the same report.

use crate::error::Result;
use crate::modules::ModuleStatus;
use crate::plan::PlanReport;
use colored::Colorize;

/// Prints a run report in human-readable form.
pub fn print_human(report: &PlanReport, plan_name: Option<&str>) {
    if let Some(name) = plan_name {
        println!("{}", format!("PLAN [{}]", name).bold());
    }

    for result in &report.results {
        let line = format!("{}: [{}] {}", result.status, result.label, result.msg);
        match result.status {
            ModuleStatus::Changed => println!("{}", line.yellow()),
            ModuleStatus::Ok => println!("{}", line.green()),
            ModuleStatus::Failed => println!("{}", line.red()),
        }
    }

    let failed = report.results.iter().filter(|r| r.failed()).count();
    let ok = report.results.len() - failed;
    println!(
        "\n{} resource(s): {} ok, {} changed, {} failed",
        report.results.len(),
        ok,
        report.changed_count(),
        failed
    );
}

/// Renders a run report as pretty-printed JSON.
pub fn to_json(report: &PlanReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::ResourceReport;

    #[test]
    fn test_json_report_shape() {
        let report = PlanReport {
            results: vec![ResourceReport {
                label: "ns1".to_string(),
                status: ModuleStatus::Changed,
                changed: true,
                msg: "Created or updated namespace 'ns1'".to_string(),
                state: Some(serde_json::json!({"name": "ns1"})),
            }],
        };

        let rendered = to_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["results"][0]["label"], "ns1");
        assert_eq!(value["results"][0]["changed"], true);
        assert_eq!(value["results"][0]["status"], "changed");
        assert_eq!(value["results"][0]["state"]["name"], "ns1");
    }
}
