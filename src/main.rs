//! Hubble - Declarative Azure Event Hubs provisioning
//!
//! This is the main entry point for the Hubble CLI.

mod cli;

use clap::Parser;
use cli::{Cli, Commands, OutputFormat, PlanArgs};
use hubble::client::arm::ArmClient;
use hubble::config::Config;
use hubble::error::Result;
use hubble::modules::{ModuleContext, ModuleError, ModuleRegistry};
use hubble::output;
use hubble::plan::{run_plan, Plan};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    let exit_code = match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };

    std::process::exit(exit_code);
}

async fn run(cli: &Cli) -> Result<i32> {
    match &cli.command {
        Commands::Validate(args) => validate_plan(args).await,
        Commands::Apply(args) => {
            let check_mode = cli.check_mode;
            apply_plan(cli, args, check_mode).await
        }
        Commands::Check(args) => apply_plan(cli, args, true).await,
    }
}

/// Parse and validate a plan without touching the provider.
async fn validate_plan(args: &PlanArgs) -> Result<i32> {
    let plan = Plan::from_file(&args.plan)?;
    let registry = ModuleRegistry::with_builtins();
    plan.validate(&registry)?;
    println!("{} resource(s) valid", plan.resources.len());
    Ok(0)
}

/// Reconcile a plan, optionally in check mode.
async fn apply_plan(cli: &Cli, args: &PlanArgs, check_mode: bool) -> Result<i32> {
    let config = Config::load(cli.config.as_ref())?;
    let plan = Plan::from_file(&args.plan)?;
    let registry = ModuleRegistry::with_builtins();
    plan.validate(&registry)?;

    let mut builder = ArmClient::builder(config.credentials()?);
    if let Some(endpoint) = &config.azure.endpoint {
        builder = builder.endpoint(endpoint.as_str());
    }
    if let Some(authority) = &config.azure.authority {
        builder = builder.authority(authority.as_str());
    }
    let client = Arc::new(builder.build().map_err(ModuleError::from)?);

    let context = ModuleContext::new()
        .with_check_mode(check_mode)
        .with_diff_mode(cli.diff_mode)
        .with_client(client);

    tracing::info!(
        plan = %args.plan.display(),
        resources = plan.resources.len(),
        check_mode,
        "starting run"
    );

    let report = run_plan(&plan, &registry, &context).await;

    match cli.output {
        OutputFormat::Human => output::print_human(&report, plan.name.as_deref()),
        OutputFormat::Json => println!("{}", output::to_json(&report)?),
    }

    Ok(if report.failed() { 2 } else { 0 })
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(verbosity >= 3))
        .with(env_filter)
        .init();
}
