//! AWS implementation of the backend collaborators.
//!
//! Credentials and the default region come from the standard `aws-config`
//! provider chain. The SDK clients are async; a private current-thread
//! `tokio` runtime drives each call to completion so the traits stay
//! blocking.
//!
//! S3 answers requests for a bucket in another region with a
//! `301 PermanentRedirect` that the SDK does not follow, so bucket calls go
//! through one S3 client per bucket region. STS and IAM are global and use
//! the default region.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::types as s3;
use log::debug;

use super::{IamOperations, IdentityOperations, StorageOperations};
use crate::config::BucketRef;
use crate::error::{Error, Result};
use crate::policy::RoleTag;
use crate::replication::{ReplicationConfiguration, ReplicationRule, Status};

struct AwsClients {
    runtime: tokio::runtime::Runtime,
    sdk_config: SdkConfig,
    sts: aws_sdk_sts::Client,
    iam: aws_sdk_iam::Client,
    /// region -> S3 client addressed to that region
    s3: Mutex<HashMap<String, aws_sdk_s3::Client>>,
}

/// Backend talking to STS, S3 and IAM.
#[derive(Clone)]
pub struct AwsBackend {
    inner: Arc<AwsClients>,
}

impl AwsBackend {
    /// Loads the shared SDK configuration and builds the service clients.
    ///
    /// `region` overrides the region from the environment/profile chain.
    pub fn connect(region: Option<&str>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let sdk_config = runtime.block_on(async {
            let mut loader = aws_config::defaults(BehaviorVersion::latest());
            if let Some(region) = region {
                loader = loader.region(Region::new(region.to_string()));
            }
            loader.load().await
        });
        debug!(
            "Loaded AWS configuration (region: {})",
            sdk_config
                .region()
                .map(|region| region.as_ref())
                .unwrap_or("<unset>")
        );

        Ok(Self::from_sdk_config(runtime, sdk_config))
    }

    fn from_sdk_config(runtime: tokio::runtime::Runtime, sdk_config: SdkConfig) -> Self {
        Self {
            inner: Arc::new(AwsClients {
                sts: aws_sdk_sts::Client::new(&sdk_config),
                iam: aws_sdk_iam::Client::new(&sdk_config),
                s3: Mutex::new(HashMap::new()),
                sdk_config,
                runtime,
            }),
        }
    }

    /// The S3 client addressed to `region`, built on first use.
    fn s3_client(&self, region: &str) -> Result<aws_sdk_s3::Client> {
        let mut clients = self.inner.s3.lock().map_err(|_| Error::LockPoisoned {
            context: "S3 client cache".to_string(),
        })?;
        let client = clients.entry(region.to_string()).or_insert_with(|| {
            debug!("Creating S3 client for region {}", region);
            let config = aws_sdk_s3::config::Builder::from(&self.inner.sdk_config)
                .region(Region::new(region.to_string()))
                .build();
            aws_sdk_s3::Client::from_conf(config)
        });
        Ok(client.clone())
    }
}

impl IdentityOperations for AwsBackend {
    fn account_id(&self) -> Result<String> {
        let output = self
            .inner
            .runtime
            .block_on(self.inner.sts.get_caller_identity().send())
            .map_err(|e| Error::Identity {
                message: DisplayErrorContext(&e).to_string(),
            })?;

        output
            .account()
            .map(str::to_string)
            .ok_or_else(|| Error::Identity {
                message: "caller identity has no account id".to_string(),
            })
    }
}

/// `NotFound` and `BadRequest` (an expected-owner mismatch) both mean the
/// bucket is not usable as ours.
fn bucket_is_absent(err: &SdkError<HeadBucketError>) -> bool {
    if err
        .as_service_error()
        .is_some_and(HeadBucketError::is_not_found)
    {
        return true;
    }
    if matches!(err.code(), Some("NotFound" | "BadRequest")) {
        return true;
    }
    matches!(
        err.raw_response().map(|response| response.status().as_u16()),
        Some(400 | 404)
    )
}

fn sdk_status(status: Status) -> s3::ReplicationRuleStatus {
    match status {
        Status::Enabled => s3::ReplicationRuleStatus::Enabled,
        Status::Disabled => s3::ReplicationRuleStatus::Disabled,
    }
}

fn sdk_rule(rule: &ReplicationRule) -> std::result::Result<s3::ReplicationRule, String> {
    let destination = &rule.destination;

    let metrics = destination
        .metrics
        .as_ref()
        .map(|metrics| {
            s3::Metrics::builder()
                .status(match metrics.status {
                    Status::Enabled => s3::MetricsStatus::Enabled,
                    Status::Disabled => s3::MetricsStatus::Disabled,
                })
                .event_threshold(
                    s3::ReplicationTimeValue::builder()
                        .minutes(metrics.event_threshold.minutes as i32)
                        .build(),
                )
                .build()
        })
        .transpose()
        .map_err(|e| e.to_string())?;

    let replication_time = destination
        .replication_time
        .as_ref()
        .map(|time| {
            s3::ReplicationTime::builder()
                .status(match time.status {
                    Status::Enabled => s3::ReplicationTimeStatus::Enabled,
                    Status::Disabled => s3::ReplicationTimeStatus::Disabled,
                })
                .time(
                    s3::ReplicationTimeValue::builder()
                        .minutes(time.time.minutes as i32)
                        .build(),
                )
                .build()
        })
        .transpose()
        .map_err(|e| e.to_string())?;

    let destination = s3::Destination::builder()
        .bucket(&destination.bucket)
        .set_metrics(metrics)
        .set_replication_time(replication_time)
        .build()
        .map_err(|e| e.to_string())?;

    let priority = i32::try_from(rule.priority)
        .map_err(|_| format!("rule priority {} out of range", rule.priority))?;

    s3::ReplicationRule::builder()
        .priority(priority)
        .status(sdk_status(rule.status))
        .filter(
            s3::ReplicationRuleFilter::builder()
                .prefix(&rule.filter.prefix)
                .build(),
        )
        .destination(destination)
        .delete_marker_replication(
            s3::DeleteMarkerReplication::builder()
                .status(match rule.delete_marker_replication.status {
                    Status::Enabled => s3::DeleteMarkerReplicationStatus::Enabled,
                    Status::Disabled => s3::DeleteMarkerReplicationStatus::Disabled,
                })
                .build(),
        )
        .build()
        .map_err(|e| e.to_string())
}

impl StorageOperations for AwsBackend {
    fn bucket_exists(&self, bucket: &BucketRef, expected_owner: &str) -> Result<bool> {
        let s3 = self.s3_client(&bucket.region)?;
        let result = self.inner.runtime.block_on(
            s3.head_bucket()
                .bucket(&bucket.name)
                .expected_bucket_owner(expected_owner)
                .send(),
        );

        match result {
            Ok(_) => Ok(true),
            Err(err) if bucket_is_absent(&err) => Ok(false),
            Err(err) => Err(Error::BucketCheck {
                bucket: bucket.name.clone(),
                message: DisplayErrorContext(&err).to_string(),
            }),
        }
    }

    fn put_bucket_replication(
        &self,
        bucket: &str,
        region: &str,
        configuration: &ReplicationConfiguration,
    ) -> Result<()> {
        let submit_error = |message: String| Error::ReplicationSubmit {
            bucket: bucket.to_string(),
            message,
        };

        let rules = configuration
            .rules
            .iter()
            .map(sdk_rule)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(submit_error)?;
        let sdk_configuration = s3::ReplicationConfiguration::builder()
            .role(&configuration.role)
            .set_rules(Some(rules))
            .build()
            .map_err(|e| submit_error(e.to_string()))?;

        let s3 = self.s3_client(region)?;
        self.inner
            .runtime
            .block_on(
                s3.put_bucket_replication()
                    .bucket(bucket)
                    .replication_configuration(sdk_configuration)
                    .send(),
            )
            .map_err(|e| submit_error(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }
}

impl IamOperations for AwsBackend {
    fn create_role(
        &self,
        role_name: &str,
        assume_role_policy: &str,
        tags: &[RoleTag],
    ) -> Result<()> {
        let role_error = |message: String| Error::RoleCreate {
            role: role_name.to_string(),
            message,
        };

        let tags = tags
            .iter()
            .map(|tag| {
                aws_sdk_iam::types::Tag::builder()
                    .key(&tag.key)
                    .value(&tag.value)
                    .build()
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| role_error(e.to_string()))?;

        let result = self.inner.runtime.block_on(
            self.inner
                .iam
                .create_role()
                .role_name(role_name)
                .assume_role_policy_document(assume_role_policy)
                .set_tags(Some(tags))
                .send(),
        );

        match result {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_entity_already_exists_exception()) =>
            {
                Err(Error::RoleAlreadyExists {
                    role: role_name.to_string(),
                })
            }
            Err(err) => Err(role_error(DisplayErrorContext(&err).to_string())),
        }
    }

    fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<()> {
        self.inner
            .runtime
            .block_on(
                self.inner
                    .iam
                    .put_role_policy()
                    .role_name(role_name)
                    .policy_name(policy_name)
                    .policy_document(policy_document)
                    .send(),
            )
            .map_err(|e| Error::PolicyAttach {
                role: role_name.to_string(),
                policy: policy_name.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }
}
