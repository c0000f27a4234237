//! Phase 2: Merging
//!
//! Folds the expanded (source, targets) pairs into a [`ReplicationPlan`].
//!
//! The first pair for a source bucket creates its entry in the pair's
//! region. Every later pair for the same bucket appends to that entry: one
//! rule per new target, numbered from the entry's current rule count, and
//! the targets themselves are appended to `target_bucket_configs`.
//!
//! Targets are not de-duplicated. A bucket reached through both a
//! one-directional declaration and a bidirectional group gets two rules,
//! with distinct priorities.

use log::debug;

use super::{ReplicationPlan, SourceTargets};
use crate::replication::ReplicationRule;

/// Execute Phase 2: merge expanded pairs into a plan
///
/// `replication_time_control` is applied to every rule's destination.
pub fn execute(expanded: Vec<SourceTargets>, replication_time_control: bool) -> ReplicationPlan {
    expanded
        .into_iter()
        .fold(ReplicationPlan::new(), |mut plan, pair| {
            merge_pair(&mut plan, pair, replication_time_control);
            plan
        })
}

fn merge_pair(plan: &mut ReplicationPlan, pair: SourceTargets, replication_time_control: bool) {
    let entry = plan.entry(&pair.source_bucket, &pair.source_region);

    for target in &pair.targets {
        let priority = entry.rules.len() as u32;
        debug!(
            "Planned replication rule {} from {} to {}",
            priority, pair.source_bucket, target.name
        );
        entry.rules.push(ReplicationRule::new(
            &target.name,
            priority,
            replication_time_control,
        ));
    }

    entry.target_bucket_configs.extend(pair.targets);
}
