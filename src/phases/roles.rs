//! Phase 4: Roles
//!
//! Ensures one replication role per plan entry and records its name in the
//! entry.
//!
//! For each entry the role phase:
//! 1. derives the role name (see [`replication_role_name`]),
//! 2. creates the role with the storage-service trust policy, treating
//!    "already exists" as success,
//! 3. (re)attaches the inline replication policy unconditionally, so the
//!    policy always reflects the entry's current targets.
//!
//! With a role prefix override, several source buckets in one region map to
//! the same role name. Each of them re-puts the same inline policy, and the
//! last entry processed determines its contents.

use log::info;

use super::ReplicationPlan;
use crate::backend::CloudContext;
use crate::error::{Error, Result};
use crate::policy::{
    assume_role_policy_document, replication_policy_document, replication_role_name, role_tags,
    REPLICATION_POLICY_NAME,
};

/// Role naming inputs shared by every entry of a run
#[derive(Debug, Clone, Copy)]
pub struct RoleNaming<'a> {
    pub service_name: &'a str,
    pub prefix_override: Option<&'a str>,
}

impl RoleNaming<'_> {
    pub fn role_name(&self, source_region: &str, source_bucket: &str) -> String {
        replication_role_name(
            self.service_name,
            source_region,
            source_bucket,
            self.prefix_override,
        )
    }
}

/// Fills in role names without touching any backend.
pub fn assign_names(plan: &mut ReplicationPlan, naming: RoleNaming<'_>) {
    for entry in plan.iter_mut() {
        entry.role = Some(naming.role_name(&entry.region, &entry.source_bucket));
    }
}

/// Execute Phase 4: create or update the replication role of every entry
pub fn execute(
    plan: &mut ReplicationPlan,
    naming: RoleNaming<'_>,
    cloud: &CloudContext,
) -> Result<()> {
    let trust_policy = assume_role_policy_document();
    let tags = role_tags();

    for entry in plan.iter_mut() {
        let role_name = naming.role_name(&entry.region, &entry.source_bucket);

        match cloud.iam().create_role(&role_name, &trust_policy, &tags) {
            Ok(()) => info!("Created replication role {}", role_name),
            Err(Error::RoleAlreadyExists { .. }) => {
                info!("Reusing existing replication role {}", role_name)
            }
            Err(e) => return Err(e),
        }

        let policy =
            replication_policy_document(&entry.source_bucket, &entry.target_bucket_configs);
        cloud
            .iam()
            .put_role_policy(&role_name, REPLICATION_POLICY_NAME, &policy)?;
        info!(
            "Attached {} to role {} for bucket {}",
            REPLICATION_POLICY_NAME, role_name, entry.source_bucket
        );

        entry.role = Some(role_name);
    }

    Ok(())
}
