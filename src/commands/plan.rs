//! # Plan Command Implementation
//!
//! Prints the replication plan that `apply` would submit: one entry per
//! source bucket with its region, role name, rules and target buckets. The
//! plan is computed offline, without credentials and without any AWS call.

use anyhow::Result;
use clap::{Args, ValueEnum};
use std::fs;
use std::path::PathBuf;

use s3_replication::phases::{orchestrator, ReplicationPlan};

/// Output formats for the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlanFormat {
    Yaml,
    Json,
}

/// Print the replication plan
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the deployment descriptor (defaults to serverless.yml)
    #[arg(short, long, value_name = "PATH", env = "S3_REPLICATION_CONFIG")]
    pub config: Option<PathBuf>,

    /// Service name used in role names (overrides `service:` in the descriptor)
    #[arg(short, long, value_name = "NAME", env = "S3_REPLICATION_SERVICE")]
    pub service: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = PlanFormat::Yaml)]
    pub format: PlanFormat,

    /// Write the plan to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Serializes a plan in the requested format.
pub(crate) fn render(plan: &ReplicationPlan, format: PlanFormat) -> Result<String> {
    let rendered = match format {
        PlanFormat::Yaml => plan.to_yaml()?,
        PlanFormat::Json => plan.to_json()?,
    };
    Ok(rendered)
}

/// Execute the `plan` command.
pub fn execute(args: PlanArgs) -> Result<()> {
    let config_path = super::config_path(args.config);
    let deployment = super::load_deployment(&config_path)?;
    let service_name = deployment.service_name(args.service.as_deref())?;

    let plan = orchestrator::plan_offline(&deployment.replication, &service_name);
    let rendered = render(&plan, args.format)?;

    match args.output {
        Some(path) => {
            fs::write(&path, rendered)?;
            log::info!("Wrote replication plan to {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}
