//! IAM naming and policy documents for replication roles.

use serde_json::json;

use crate::config::BucketRef;

/// ARN prefix of the object storage service
pub const S3_ARN_PREFIX: &str = "arn:aws:s3:::";

/// Suffix every replication role name ends with
pub const REPLICATION_ROLE_SUFFIX: &str = "s3-rep-role";

/// Name of the inline policy attached to each replication role
pub const REPLICATION_POLICY_NAME: &str = "s3-replication-policy";

/// Key and value of the tag put on roles created by this tool
pub const ROLE_TAG: &str = "SLS-S3-REPLICATION-PLUGIN";

const POLICY_VERSION: &str = "2012-10-17";

/// A key/value tag applied to a created role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTag {
    pub key: String,
    pub value: String,
}

/// Tags put on every replication role
pub fn role_tags() -> Vec<RoleTag> {
    vec![RoleTag {
        key: ROLE_TAG.to_string(),
        value: ROLE_TAG.to_string(),
    }]
}

/// ARN of a bucket
pub fn bucket_arn(bucket: &str) -> String {
    format!("{S3_ARN_PREFIX}{bucket}")
}

/// ARN matching every object of a bucket
pub fn bucket_objects_arn(bucket: &str) -> String {
    format!("{S3_ARN_PREFIX}{bucket}/*")
}

/// Computes the replication role name for a source bucket.
///
/// Without an override this is `{service}-{region}-{bucket}-s3-rep-role`.
/// With an override it is `{prefix}-{region}-s3-rep-role`: the bucket name
/// is dropped, so all source buckets of one region end up on the same role
/// and the last policy attached wins.
///
/// # Examples
///
/// ```
/// use s3_replication::policy::replication_role_name;
///
/// assert_eq!(replication_role_name("SVC", "r", "b", None), "SVC-r-b-s3-rep-role");
/// assert_eq!(replication_role_name("SVC", "r", "b", Some("PFX")), "PFX-r-s3-rep-role");
/// ```
pub fn replication_role_name(
    service_name: &str,
    source_region: &str,
    source_bucket: &str,
    prefix_override: Option<&str>,
) -> String {
    match prefix_override {
        Some(prefix) => format!("{prefix}-{source_region}-{REPLICATION_ROLE_SUFFIX}"),
        None => {
            format!("{service_name}-{source_region}-{source_bucket}-{REPLICATION_ROLE_SUFFIX}")
        }
    }
}

/// ARN of a role in the given account
pub fn role_arn(account_id: &str, role_name: &str) -> String {
    format!("arn:aws:iam::{account_id}:role/{role_name}")
}

/// Trust policy letting only the storage service assume the role.
pub fn assume_role_policy_document() -> String {
    json!({
        "Version": POLICY_VERSION,
        "Statement": [
            {
                "Effect": "Allow",
                "Principal": {
                    "Service": ["s3.amazonaws.com"]
                },
                "Action": ["sts:AssumeRole"]
            }
        ]
    })
    .to_string()
}

/// Permission policy for replicating `source_bucket` into `targets`.
///
/// Grants, in order: reading the replication configuration and listing the
/// source bucket; reading object versions (with ACL and tags) under the
/// source bucket; replicating objects, deletes and tags into every target.
pub fn replication_policy_document(source_bucket: &str, targets: &[BucketRef]) -> String {
    let target_arns: Vec<String> = targets
        .iter()
        .map(|target| bucket_objects_arn(&target.name))
        .collect();

    json!({
        "Version": POLICY_VERSION,
        "Statement": [
            {
                "Effect": "Allow",
                "Action": ["s3:GetReplicationConfiguration", "s3:ListBucket"],
                "Resource": [bucket_arn(source_bucket)]
            },
            {
                "Effect": "Allow",
                "Action": [
                    "s3:GetObjectVersionForReplication",
                    "s3:GetObjectVersionAcl",
                    "s3:GetObjectVersionTagging"
                ],
                "Resource": [bucket_objects_arn(source_bucket)]
            },
            {
                "Effect": "Allow",
                "Action": [
                    "s3:ReplicateObject",
                    "s3:ReplicateDelete",
                    "s3:ReplicateTags"
                ],
                "Resource": target_arns
            }
        ]
    })
    .to_string()
}
