//! Orchestrator for a complete replication run
//!
//! Coordinates the five phases behind a single entry point.

use log::info;

use super::roles::RoleNaming;
use super::{phase1, phase2, phase3, phase4, phase5, ReplicationPlan, RunOutcome};
use crate::backend::CloudContext;
use crate::config::ReplicationSettings;
use crate::error::Result;

/// Execute a complete replication run (Phases 1-5)
///
/// This orchestrates the whole pipeline:
/// 1. Expand declarations into (source, targets) pairs
/// 2. Merge the pairs into one plan entry per source bucket
/// 3. Check that every referenced bucket exists, skipping the run otherwise
/// 4. Create or reuse the replication roles and attach their policies
/// 5. Submit the replication configuration of each source bucket
///
/// Settings without any declaration complete immediately without contacting
/// the backend. A run skipped at phase 3 has made no changes.
pub fn execute(
    settings: &ReplicationSettings,
    service_name: &str,
    cloud: &CloudContext,
) -> Result<RunOutcome> {
    info!("Starting setting up the S3 Replication");

    let declarations = settings.declarations();
    if declarations.is_empty() {
        info!("No replication declared, nothing to do");
        return Ok(RunOutcome::Applied(ReplicationPlan::new()));
    }

    // Phase 1: Expansion
    let expanded = phase1::execute(&declarations);

    // Phase 2: Merging
    let mut plan = phase2::execute(expanded, settings.with_replication_time_control);

    // Phase 3: Preconditions
    let missing_buckets = phase3::execute(&declarations, cloud)?;
    if !missing_buckets.is_empty() {
        info!(
            "Skipping S3 Replication setup, {} bucket(s) missing",
            missing_buckets.len()
        );
        return Ok(RunOutcome::Skipped { missing_buckets });
    }

    // Phase 4: Roles
    let naming = RoleNaming {
        service_name,
        prefix_override: settings.role_prefix_override(),
    };
    phase4::execute(&mut plan, naming, cloud)?;

    // Phase 5: Submission
    let submitted = phase5::execute(&plan, cloud)?;

    info!(
        "Finished setting up the S3 Replication ({} bucket(s) configured)",
        submitted
    );
    Ok(RunOutcome::Applied(plan))
}

/// Builds the plan a run would apply without contacting any backend.
///
/// Role names are filled in exactly as the role phase would name them.
pub fn plan_offline(settings: &ReplicationSettings, service_name: &str) -> ReplicationPlan {
    let mut plan = ReplicationPlan::from_settings(settings);
    phase4::assign_names(
        &mut plan,
        RoleNaming {
            service_name,
            prefix_override: settings.role_prefix_override(),
        },
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::InMemoryBackend;
    use crate::config::{BucketRef, SingleDirectionReplication};

    fn settings() -> ReplicationSettings {
        ReplicationSettings {
            single_direction_replication: vec![SingleDirectionReplication {
                source_bucket: BucketRef::new("eu-west-1", "a"),
                target_buckets: vec![BucketRef::new("eu-west-2", "b")],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_settings_make_no_calls() {
        let backend = InMemoryBackend::new("acct");
        let cloud = CloudContext::from_backend(backend.clone());

        let outcome = execute(&ReplicationSettings::default(), "svc", &cloud).unwrap();
        assert_eq!(outcome, RunOutcome::Applied(ReplicationPlan::new()));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_full_run() {
        let backend = InMemoryBackend::new("acct").with_buckets(["a", "b"]);
        let cloud = CloudContext::from_backend(backend.clone());

        let plan = execute(&settings(), "svc", &cloud).unwrap().into_plan();
        assert_eq!(
            plan.get("a").unwrap().role.as_deref(),
            Some("svc-eu-west-1-a-s3-rep-role")
        );
        let stored = backend.replication_configuration("a").unwrap();
        assert_eq!(stored.role, "arn:aws:iam::acct:role/svc-eu-west-1-a-s3-rep-role");
        assert_eq!(stored.rules, plan.get("a").unwrap().rules);
    }

    #[test]
    fn test_missing_bucket_skips_run() {
        let backend = InMemoryBackend::new("acct").with_bucket("a");
        let cloud = CloudContext::from_backend(backend.clone());

        let outcome = execute(&settings(), "svc", &cloud).unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Skipped {
                missing_buckets: vec![BucketRef::new("eu-west-2", "b")]
            }
        );
        assert!(!backend.calls().iter().any(|call| call.is_mutation()));
    }

    #[test]
    fn test_skipped_run_logs_no_rule_creation() {
        testing_logger::setup();
        let backend = InMemoryBackend::new("acct").with_bucket("a");
        let cloud = CloudContext::from_backend(backend);

        assert!(execute(&settings(), "svc", &cloud).unwrap().is_skipped());

        testing_logger::validate(|captured_logs| {
            assert!(captured_logs
                .iter()
                .all(|log| !log.body.starts_with("Creating replication rule")));
            assert!(captured_logs
                .iter()
                .any(|log| log.body == "Skipping S3 Replication setup, 1 bucket(s) missing"));
        });
    }

    #[test]
    fn test_plan_offline_matches_applied_plan() {
        let backend = InMemoryBackend::new("acct").with_buckets(["a", "b"]);
        let cloud = CloudContext::from_backend(backend);

        let applied = execute(&settings(), "svc", &cloud).unwrap().into_plan();
        assert_eq!(plan_offline(&settings(), "svc"), applied);
    }
}
