//! Phase 5: Submission
//!
//! Puts one complete replication configuration on each source bucket of the
//! plan, in plan order. The configuration replaces whatever the bucket had
//! before, so a second run with the same settings submits an identical
//! document.

use log::info;

use super::{PlanEntry, ReplicationPlan};
use crate::backend::CloudContext;
use crate::error::{Error, Result};
use crate::policy::role_arn;
use crate::replication::ReplicationConfiguration;

/// Builds the configuration of one entry from its role and rules.
///
/// Fails when the role phase has not named the entry's role yet.
pub fn configuration_for(entry: &PlanEntry, account_id: &str) -> Result<ReplicationConfiguration> {
    let role = entry
        .role
        .as_deref()
        .ok_or_else(|| Error::ReplicationSubmit {
            bucket: entry.source_bucket.clone(),
            message: "no replication role assigned".to_string(),
        })?;

    Ok(ReplicationConfiguration {
        role: role_arn(account_id, role),
        rules: entry.rules.clone(),
    })
}

/// Execute Phase 5: submit every entry's configuration
///
/// Returns the number of buckets configured.
pub fn execute(plan: &ReplicationPlan, cloud: &CloudContext) -> Result<usize> {
    if plan.is_empty() {
        return Ok(0);
    }

    let account_id = cloud.account_id()?;
    let mut submitted = 0;

    for entry in plan.iter() {
        let configuration = configuration_for(entry, &account_id)?;
        for target in &entry.target_bucket_configs {
            info!(
                "Creating replication rule between {} and {} S3 buckets",
                entry.source_bucket, target.name
            );
        }
        cloud
            .storage()
            .put_bucket_replication(&entry.source_bucket, &entry.region, &configuration)?;
        info!(
            "Applied {} replication rule(s) to bucket {}",
            configuration.rules.len(),
            entry.source_bucket
        );
        submitted += 1;
    }

    Ok(submitted)
}
