//! Phase 3: Preconditions
//!
//! Before anything is changed, every bucket referenced by any declaration
//! (sources and targets of one-directional declarations, every member of
//! every bidirectional group) must exist and be owned by the caller's
//! account.
//!
//! A bucket reported absent is logged and remembered, and checking carries
//! on so that one run reports every missing bucket. Any other failure of a
//! check aborts immediately. The caller skips the whole run when the
//! returned list is non-empty; no partial replication setup is attempted.

use std::collections::HashSet;

use log::{debug, warn};

use crate::backend::CloudContext;
use crate::config::{BucketRef, ReplicationDeclaration};
use crate::error::Result;

/// Every distinct bucket named by the declarations, in first-seen order.
///
/// Buckets are compared by name.
pub fn referenced_buckets(declarations: &[ReplicationDeclaration]) -> Vec<&BucketRef> {
    let one_directional = declarations.iter().flat_map(|decl| match decl {
        ReplicationDeclaration::OneDirectional { source, targets } => {
            std::iter::once(source).chain(targets.iter()).collect::<Vec<_>>()
        }
        ReplicationDeclaration::Bidirectional { .. } => Vec::new(),
    });
    let bidirectional = declarations.iter().flat_map(|decl| match decl {
        ReplicationDeclaration::Bidirectional { members } => members.iter().collect::<Vec<_>>(),
        ReplicationDeclaration::OneDirectional { .. } => Vec::new(),
    });

    let mut seen = HashSet::new();
    one_directional
        .chain(bidirectional)
        .filter(|bucket| seen.insert(bucket.name.clone()))
        .collect()
}

/// Execute Phase 3: check that all referenced buckets exist
///
/// Returns the buckets that are missing (or owned by another account).
pub fn execute(
    declarations: &[ReplicationDeclaration],
    cloud: &CloudContext,
) -> Result<Vec<BucketRef>> {
    let buckets = referenced_buckets(declarations);
    if buckets.is_empty() {
        return Ok(Vec::new());
    }

    let account_id = cloud.account_id()?;
    let mut missing = Vec::new();

    for bucket in buckets {
        if cloud.storage().bucket_exists(bucket, &account_id)? {
            debug!("Bucket {} exists", bucket.name);
        } else {
            warn!(
                "Bucket {} does not exist yet. Replication will only be configured when all buckets exist",
                bucket.name
            );
            missing.push(bucket.clone());
        }
    }

    Ok(missing)
}
