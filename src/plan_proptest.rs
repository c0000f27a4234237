//! Property-based tests for plan construction.
//!
//! Declarations are generated over a small pool of bucket names so that
//! source buckets recur across declarations.

#[cfg(test)]
mod proptest_tests {
    use crate::config::{BucketRef, ReplicationSettings, SingleDirectionReplication};
    use crate::phases::ReplicationPlan;
    use crate::policy::{bucket_arn, replication_role_name};
    use proptest::prelude::*;

    fn bucket() -> impl Strategy<Value = BucketRef> {
        (
            prop::sample::select(vec!["eu-west-1", "eu-west-2", "us-east-1"]),
            "[a-f]",
        )
            .prop_map(|(region, name)| BucketRef::new(region, format!("bucket-{name}")))
    }

    fn one_directional() -> impl Strategy<Value = SingleDirectionReplication> {
        (bucket(), prop::collection::vec(bucket(), 1..4)).prop_map(|(source, targets)| {
            SingleDirectionReplication {
                source_bucket: source,
                target_buckets: targets,
            }
        })
    }

    fn settings() -> impl Strategy<Value = ReplicationSettings> {
        (
            prop::collection::vec(one_directional(), 0..4),
            prop::collection::vec(prop::collection::vec(bucket(), 2..5), 0..3),
            any::<bool>(),
        )
            .prop_map(|(single, groups, rtc)| ReplicationSettings {
                single_direction_replication: single,
                bidirectional_replication_groups: groups,
                with_replication_time_control: rtc,
                ..Default::default()
            })
    }

    // ============================================================================
    // Priority properties
    // ============================================================================

    proptest! {
        /// Property: every entry's priorities are exactly 0..n in rule order
        #[test]
        fn priorities_are_contiguous_from_zero(settings in settings()) {
            let plan = ReplicationPlan::from_settings(&settings);
            for entry in plan.iter() {
                let priorities: Vec<u32> = entry.rules.iter().map(|r| r.priority).collect();
                let expected: Vec<u32> = (0..entry.rules.len() as u32).collect();
                prop_assert_eq!(priorities, expected);
            }
        }

        /// Property: rules and targetBucketConfigs line up one to one
        #[test]
        fn rules_follow_target_configs(settings in settings()) {
            let plan = ReplicationPlan::from_settings(&settings);
            for entry in plan.iter() {
                let destinations: Vec<String> =
                    entry.rules.iter().map(|r| r.destination.bucket.clone()).collect();
                let targets: Vec<String> =
                    entry.target_bucket_configs.iter().map(|t| bucket_arn(&t.name)).collect();
                prop_assert_eq!(destinations, targets);
            }
        }

        /// Property: the replication time control flag reaches every rule
        #[test]
        fn replication_time_control_is_uniform(settings in settings()) {
            let plan = ReplicationPlan::from_settings(&settings);
            for rule in plan.iter().flat_map(|entry| entry.rules.iter()) {
                prop_assert_eq!(
                    rule.destination.has_replication_time_control(),
                    settings.with_replication_time_control
                );
                prop_assert_eq!(
                    rule.destination.metrics.is_some(),
                    rule.destination.replication_time.is_some()
                );
            }
        }
    }

    // ============================================================================
    // Ordering properties
    // ============================================================================

    proptest! {
        /// Property: one-directional targets of a source come before any
        /// target it gets from a bidirectional group
        #[test]
        fn one_directional_rules_come_first(settings in settings()) {
            let plan = ReplicationPlan::from_settings(&settings);
            for entry in plan.iter() {
                let declared: Vec<&str> = settings
                    .single_direction_replication
                    .iter()
                    .filter(|decl| decl.source_bucket.name == entry.source_bucket)
                    .flat_map(|decl| decl.target_buckets.iter().map(|t| t.name.as_str()))
                    .collect();
                let leading: Vec<&str> = entry
                    .target_bucket_configs
                    .iter()
                    .take(declared.len())
                    .map(|t| t.name.as_str())
                    .collect();
                prop_assert_eq!(leading, declared);
            }
        }

        /// Property: a group of distinct members gives each member one rule
        /// per other member, in group order
        #[test]
        fn group_members_target_every_peer(
            members in prop::sample::subsequence(
                vec!["a", "b", "c", "d", "e"], 2..=5
            )
        ) {
            let group: Vec<BucketRef> =
                members.iter().map(|name| BucketRef::new("eu-west-1", *name)).collect();
            let settings = ReplicationSettings {
                bidirectional_replication_buckets: group,
                ..Default::default()
            };
            let plan = ReplicationPlan::from_settings(&settings);

            prop_assert_eq!(plan.len(), members.len());
            for member in &members {
                let targets: Vec<&str> = plan
                    .get(member)
                    .unwrap()
                    .target_bucket_configs
                    .iter()
                    .map(|t| t.name.as_str())
                    .collect();
                let peers: Vec<&str> =
                    members.iter().copied().filter(|peer| peer != member).collect();
                prop_assert_eq!(targets, peers);
            }
        }
    }

    // ============================================================================
    // Role naming properties
    // ============================================================================

    proptest! {
        /// Property: without an override the name embeds the bucket; with
        /// one it does not depend on the bucket
        #[test]
        fn role_name_shape(
            service in "[A-Za-z][A-Za-z0-9-]{0,10}",
            prefix in "[A-Za-z][A-Za-z0-9-]{0,10}",
            region in "[a-z]{2}-[a-z]{4,7}-[1-3]",
            first in "[a-z0-9-]{3,20}",
            second in "[a-z0-9-]{3,20}",
        ) {
            prop_assert_eq!(
                replication_role_name(&service, &region, &first, None),
                format!("{service}-{region}-{first}-s3-rep-role")
            );
            prop_assert_eq!(
                replication_role_name(&service, &region, &first, Some(&prefix)),
                replication_role_name(&service, &region, &second, Some(&prefix))
            );
        }
    }
}
