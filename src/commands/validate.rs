//! # Validate Command Implementation
//!
//! Checks a deployment descriptor without touching AWS:
//!
//! - **Parsing**: the descriptor must parse and carry a well-formed
//!   `custom.s3ReplicationPlugin` block.
//! - **Statistics**: counts declarations, buckets and resulting rules.
//! - **Redundant rules**: a source bucket that ends up with the same target
//!   more than once gets one rule per occurrence.
//! - **Role collisions**: with `replicationRolePrefixOverride`, source
//!   buckets in the same region share a role name, and the last one
//!   processed decides the role's inline policy.
//!
//! `--strict` turns warnings into a failure.

use anyhow::Result;
use clap::Args;
use std::collections::BTreeMap;
use std::path::PathBuf;

use s3_replication::config::{Deployment, ReplicationDeclaration};
use s3_replication::output::{marker, OutputConfig};
use s3_replication::phases::{orchestrator, preconditions};

/// Validate the replication settings of a deployment descriptor
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the deployment descriptor (defaults to serverless.yml)
    #[arg(short, long, value_name = "PATH", env = "S3_REPLICATION_CONFIG")]
    pub config: Option<PathBuf>,

    /// Service name used in role names (overrides `service:` in the descriptor)
    #[arg(short, long, value_name = "NAME", env = "S3_REPLICATION_SERVICE")]
    pub service: Option<String>,

    /// Use strict validation (fail on warnings).
    #[arg(long)]
    pub strict: bool,
}

/// Problems worth reporting in an otherwise valid descriptor.
pub(crate) fn find_warnings(deployment: &Deployment, service_name: &str) -> Vec<String> {
    let mut warnings = Vec::new();
    let settings = &deployment.replication;

    for decl in settings.declarations() {
        if let ReplicationDeclaration::OneDirectional { source, targets } = decl {
            if targets.iter().any(|target| target.name == source.name) {
                warnings.push(format!("Bucket {} lists itself as a target", source.name));
            }
        }
    }

    let plan = orchestrator::plan_offline(settings, service_name);

    for entry in plan.iter() {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for target in &entry.target_bucket_configs {
            *counts.entry(target.name.as_str()).or_default() += 1;
        }
        for (target, count) in counts.into_iter().filter(|(_, count)| *count > 1) {
            warnings.push(format!(
                "Bucket {} replicates to {} {} times (one rule each)",
                entry.source_bucket, target, count
            ));
        }
    }

    if settings.role_prefix_override().is_some() {
        let mut sources_by_role: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for entry in plan.iter() {
            if let Some(role) = entry.role.as_deref() {
                sources_by_role
                    .entry(role)
                    .or_default()
                    .push(entry.source_bucket.as_str());
            }
        }
        for (role, sources) in sources_by_role
            .into_iter()
            .filter(|(_, sources)| sources.len() > 1)
        {
            warnings.push(format!(
                "Role {} is shared by {}; its policy will only cover {}",
                role,
                sources.join(", "),
                sources.last().copied().unwrap_or_default()
            ));
        }
    }

    warnings
}

/// Execute the `validate` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let config_path = super::config_path(args.config);
    println!(
        "{} Validating configuration: {}",
        marker(&out, "🔍", "[SCAN]"),
        config_path.display()
    );

    let deployment = match super::load_deployment(&config_path) {
        Ok(deployment) => {
            println!(
                "{} Configuration file parsed successfully",
                marker(&out, "✅", "[OK]")
            );
            deployment
        }
        Err(e) => {
            println!(
                "{} Configuration parsing failed: {:#}",
                marker(&out, "❌", "[ERR]"),
                e
            );
            return Err(e);
        }
    };

    let mut warnings = Vec::new();
    let service_name = match deployment.service_name(args.service.as_deref()) {
        Ok(name) => name,
        Err(e) => {
            warnings.push(e.to_string());
            "<service>".to_string()
        }
    };

    let settings = &deployment.replication;
    let declarations = settings.declarations();
    let plan = orchestrator::plan_offline(settings, &service_name);
    let rule_count: usize = plan.iter().map(|entry| entry.rules.len()).sum();

    println!("\n{} Replication Summary:", marker(&out, "📊", "[INFO]"));
    println!(
        "   One-directional declarations: {}",
        settings.single_direction_replication.len()
    );
    println!(
        "   Bidirectional groups: {}",
        settings.bidirectional_groups().count()
    );
    println!(
        "   Buckets referenced: {}",
        preconditions::referenced_buckets(&declarations).len()
    );
    println!("   Source buckets: {}", plan.len());
    println!("   Replication rules: {}", rule_count);
    println!(
        "   Replication time control: {}",
        if settings.with_replication_time_control {
            "enabled"
        } else {
            "disabled"
        }
    );

    if declarations.is_empty() {
        warnings.push("No replication declared".to_string());
    }
    warnings.extend(find_warnings(&deployment, &service_name));

    for warning in &warnings {
        println!("{} {}", marker(&out, "⚠️", "[WARN]"), warning);
    }

    println!("\n{} Validation Result:", marker(&out, "🎯", "[RESULT]"));

    if !warnings.is_empty() && args.strict {
        println!(
            "{} Configuration has warnings (strict mode enabled)",
            marker(&out, "❌", "[ERR]")
        );
        anyhow::bail!("Configuration validation failed in strict mode");
    }

    if warnings.is_empty() {
        println!("{} Configuration is valid", marker(&out, "✅", "[OK]"));
    } else {
        println!(
            "{} Configuration is valid but has warnings",
            marker(&out, "⚠️", "[WARN]")
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use s3_replication::config;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_clean_descriptor_has_no_warnings() {
        let deployment = config::parse(
            r#"
service: svc
custom:
  s3ReplicationPlugin:
    bidirectionalReplicationBuckets:
      - eu-west-1: a
      - eu-west-2: b
"#,
        )
        .unwrap();
        assert!(find_warnings(&deployment, "svc").is_empty());
    }

    #[test]
    fn test_duplicate_target_warning() {
        let deployment = config::parse(
            r#"
custom:
  s3ReplicationPlugin:
    singleDirectionReplication:
      - sourceBucket:
          eu-west-1: a
        targetBuckets:
          - eu-west-2: b
    bidirectionalReplicationBuckets:
      - eu-west-1: a
      - eu-west-2: b
"#,
        )
        .unwrap();

        let warnings = find_warnings(&deployment, "svc");
        assert_eq!(warnings, vec!["Bucket a replicates to b 2 times (one rule each)"]);
    }

    #[test]
    fn test_role_collision_warning() {
        let deployment = config::parse(
            r#"
custom:
  s3ReplicationPlugin:
    replicationRolePrefixOverride: PFX
    singleDirectionReplication:
      - sourceBucket:
          eu-west-1: a
        targetBuckets:
          - eu-west-2: x
      - sourceBucket:
          eu-west-1: c
        targetBuckets:
          - eu-west-2: y
"#,
        )
        .unwrap();

        let warnings = find_warnings(&deployment, "svc");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Role PFX-eu-west-1-s3-rep-role is shared by a, c"));
    }

    #[test]
    fn test_self_target_warning() {
        let deployment = config::parse(
            r#"
custom:
  s3ReplicationPlugin:
    singleDirectionReplication:
      - sourceBucket:
          eu-west-1: a
        targetBuckets:
          - eu-west-1: a
"#,
        )
        .unwrap();

        let warnings = find_warnings(&deployment, "svc");
        assert_eq!(warnings, vec!["Bucket a lists itself as a target"]);
    }

    #[test]
    fn test_strict_fails_on_missing_service() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("serverless.yml");
        fs::write(
            &path,
            "custom:\n  s3ReplicationPlugin:\n    bidirectionalReplicationBuckets:\n      - eu-west-1: a\n      - eu-west-2: b\n",
        )
        .unwrap();

        let lenient = ValidateArgs {
            config: Some(path.clone()),
            service: None,
            strict: false,
        };
        assert!(execute(lenient, "never").is_ok());

        let strict = ValidateArgs {
            config: Some(path),
            service: None,
            strict: true,
        };
        assert!(execute(strict, "never").is_err());
    }
}
