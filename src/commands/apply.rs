//! Apply command implementation
//!
//! Runs the full replication pipeline against AWS:
//! 1. Expansion of the declarations
//! 2. Merging into one plan entry per source bucket
//! 3. Bucket existence checks (the run is skipped if any bucket is missing)
//! 4. Role creation and policy attachment
//! 5. Submission of the replication configurations

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;

use s3_replication::backend::aws::AwsBackend;
use s3_replication::backend::CloudContext;
use s3_replication::config::Deployment;
use s3_replication::output::{marker, OutputConfig};
use s3_replication::phases::{orchestrator, RunOutcome};

/// Arguments for the apply command
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Path to the deployment descriptor (defaults to serverless.yml)
    #[arg(short, long, value_name = "PATH", env = "S3_REPLICATION_CONFIG")]
    pub config: Option<PathBuf>,

    /// Service name used in role names (overrides `service:` in the descriptor)
    #[arg(short, long, value_name = "NAME", env = "S3_REPLICATION_SERVICE")]
    pub service: Option<String>,

    /// Region for the AWS clients (overrides `provider.region`)
    #[arg(short, long, value_name = "REGION", env = "AWS_REGION")]
    pub region: Option<String>,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the apply command
pub fn execute(args: ApplyArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let config_path = super::config_path(args.config);
    let deployment = super::load_deployment(&config_path)?;

    if deployment.replication.is_empty() {
        if !args.quiet {
            println!(
                "{} No replication declared in {}, nothing to do",
                marker(&out, "ℹ️", "[INFO]"),
                config_path.display()
            );
        }
        return Ok(());
    }

    let region = args.region.as_deref().or(deployment.region.as_deref());
    let backend = AwsBackend::connect(region)?;
    let cloud = CloudContext::from_backend(backend);

    run(&deployment, args.service.as_deref(), &cloud, &out, args.quiet)
}

/// Runs the pipeline against any backend and reports the outcome.
pub(crate) fn run(
    deployment: &Deployment,
    service_override: Option<&str>,
    cloud: &CloudContext,
    out: &OutputConfig,
    quiet: bool,
) -> Result<()> {
    let start_time = Instant::now();
    let service_name = deployment.service_name(service_override)?;

    if !quiet {
        println!(
            "{} S3 Replication for service {}",
            marker(out, "🔁", "[REPL]"),
            out.heading(&service_name)
        );
        println!();
    }

    match orchestrator::execute(&deployment.replication, &service_name, cloud) {
        Ok(RunOutcome::Applied(plan)) => {
            if !quiet {
                for entry in plan.iter() {
                    println!(
                        "   {} -> {} rule(s) via role {}",
                        out.bucket(&entry.source_bucket),
                        entry.rules.len(),
                        out.role(entry.role.as_deref().unwrap_or("-"))
                    );
                }
                println!(
                    "{} Configured {} bucket(s) in {:.2}s",
                    marker(out, "✅", "[OK]"),
                    plan.len(),
                    start_time.elapsed().as_secs_f64()
                );
            }
            Ok(())
        }
        Ok(RunOutcome::Skipped { missing_buckets }) => {
            if !quiet {
                println!(
                    "{} Replication not configured, missing bucket(s):",
                    marker(out, "⚠️", "[WARN]")
                );
                for bucket in &missing_buckets {
                    println!("   {}", out.bucket_ref(bucket));
                }
            }
            Ok(())
        }
        Err(e) => {
            if !quiet {
                println!("{} Apply failed", marker(out, "❌", "[ERR]"));
                println!();
            }
            Err(e.into())
        }
    }
}
