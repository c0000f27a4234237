//! # Replication Configuration Documents
//!
//! Typed model of the bucket replication configuration submitted to the
//! storage backend. Field names serialize in the backend's own schema
//! (`Destination`, `Priority`, `DeleteMarkerReplication`, ...), so the same
//! values can be printed by the CLI and handed to the SDK.

use serde::{Deserialize, Serialize};

use crate::policy::bucket_arn;

/// Threshold and replication time used by replication-time-control
pub const REPLICATION_TIME_MINUTES: u32 = 15;

/// Enabled/disabled switch used throughout the replication schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Enabled,
    Disabled,
}

/// A duration in minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimeValue {
    pub minutes: u32,
}

/// Replication metrics block of a destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Metrics {
    pub event_threshold: TimeValue,
    pub status: Status,
}

/// Replication time block of a destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicationTime {
    pub status: Status,
    pub time: TimeValue,
}

/// Where a rule replicates to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Destination {
    /// Destination bucket ARN
    pub bucket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_time: Option<ReplicationTime>,
}

impl Destination {
    /// Destination for `target_bucket`; the metrics and replication time
    /// blocks are both present when `replication_time_control` is set and
    /// both absent otherwise.
    pub fn new(target_bucket: &str, replication_time_control: bool) -> Self {
        let (metrics, replication_time) = if replication_time_control {
            (
                Some(Metrics {
                    event_threshold: TimeValue {
                        minutes: REPLICATION_TIME_MINUTES,
                    },
                    status: Status::Enabled,
                }),
                Some(ReplicationTime {
                    status: Status::Enabled,
                    time: TimeValue {
                        minutes: REPLICATION_TIME_MINUTES,
                    },
                }),
            )
        } else {
            (None, None)
        };

        Self {
            bucket: bucket_arn(target_bucket),
            metrics,
            replication_time,
        }
    }

    /// Whether replication-time-control is attached
    pub fn has_replication_time_control(&self) -> bool {
        self.metrics.is_some() && self.replication_time.is_some()
    }
}

/// Object filter of a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleFilter {
    /// Key prefix; the empty prefix matches every object
    pub prefix: String,
}

/// Delete marker replication switch of a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteMarkerReplication {
    pub status: Status,
}

/// One replication rule of a source bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicationRule {
    pub destination: Destination,
    pub status: Status,
    /// Unique within a bucket's configuration; assigned in insertion order
    pub priority: u32,
    pub filter: RuleFilter,
    pub delete_marker_replication: DeleteMarkerReplication,
}

impl ReplicationRule {
    /// An enabled rule replicating every object (and delete markers) into
    /// `target_bucket`.
    pub fn new(target_bucket: &str, priority: u32, replication_time_control: bool) -> Self {
        Self {
            destination: Destination::new(target_bucket, replication_time_control),
            status: Status::Enabled,
            priority,
            filter: RuleFilter {
                prefix: String::new(),
            },
            delete_marker_replication: DeleteMarkerReplication {
                status: Status::Enabled,
            },
        }
    }
}

/// The full, replace-style configuration submitted for one bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicationConfiguration {
    /// ARN of the role the storage service assumes
    pub role: String,
    pub rules: Vec<ReplicationRule>,
}
