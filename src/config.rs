//! # Configuration Schema and Parsing
//!
//! This module defines the data structures read from the deployment
//! descriptor (a `serverless.yml`-shaped YAML file) and the logic for
//! parsing it into typed replication settings.
//!
//! ## Descriptor Layout
//!
//! ```yaml
//! service: my-service
//! provider:
//!   region: eu-west-1
//! custom:
//!   s3ReplicationPlugin:
//!     singleDirectionReplication:
//!       - sourceBucket:
//!           eu-west-1: my-bucket-eu-west-1
//!         targetBuckets:
//!           - eu-west-2: my-bucket-eu-west-2
//!     bidirectionalReplicationBuckets:
//!       - eu-west-1: my-bucket-eu-west-1
//!       - us-east-1: my-bucket-us-east-1
//!     replicationRolePrefixOverride: my-prefix
//!     withReplicationTimeControl: true
//! ```
//!
//! Only `service`, `provider.region` and `custom.s3ReplicationPlugin` are
//! read; every other key of the descriptor is ignored. Inside the plugin
//! block unknown keys are rejected so that typos surface at load time.
//!
//! ## Bucket References
//!
//! A bucket is referenced as a single-entry mapping from region to bucket
//! name. [`BucketRef`] parses that shape into a typed pair and rejects
//! mappings with zero or several entries.

use crate::error::{Error, Result};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Default descriptor file name looked up by the CLI
pub const DEFAULT_CONFIG_FILE: &str = "serverless.yml";

/// A bucket identified by its region and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketRef {
    /// Region identifier (e.g. `eu-west-1`)
    pub region: String,
    /// Bucket name
    pub name: String,
}

impl BucketRef {
    pub fn new(region: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for BucketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.region)
    }
}

impl Serialize for BucketRef {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.region, &self.name)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for BucketRef {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = BTreeMap::<String, String>::deserialize(deserializer)?;
        if entries.len() != 1 {
            return Err(de::Error::custom(format!(
                "bucket reference must map exactly one region to a bucket name, found {} entries",
                entries.len()
            )));
        }

        let Some((region, name)) = entries.into_iter().next() else {
            return Err(de::Error::custom("empty bucket reference"));
        };
        if region.trim().is_empty() || name.trim().is_empty() {
            return Err(de::Error::custom(
                "bucket reference region and bucket name must not be empty",
            ));
        }

        Ok(Self { region, name })
    }
}

/// One-directional replication from a source bucket to a list of targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SingleDirectionReplication {
    /// Bucket objects are replicated from
    pub source_bucket: BucketRef,
    /// Buckets receiving the replicated objects, in rule order
    pub target_buckets: Vec<BucketRef>,
}

/// The `custom.s3ReplicationPlugin` block of the descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReplicationSettings {
    /// One-directional declarations
    #[serde(default, deserialize_with = "null_as_default")]
    pub single_direction_replication: Vec<SingleDirectionReplication>,
    /// A single bidirectional group: every member replicates to every other
    #[serde(default, deserialize_with = "null_as_default")]
    pub bidirectional_replication_buckets: Vec<BucketRef>,
    /// Additional bidirectional groups, processed after the flat group
    #[serde(default, deserialize_with = "null_as_default")]
    pub bidirectional_replication_groups: Vec<Vec<BucketRef>>,
    /// Replaces `{service}-{region}-{bucket}` in role names with
    /// `{prefix}-{region}`.
    ///
    /// The bucket name is dropped from the role name, so two source buckets
    /// in the same region share (and overwrite) one role.
    #[serde(default)]
    pub replication_role_prefix_override: Option<String>,
    /// Attach the 15 minute replication-time-control blocks to every rule
    #[serde(default, deserialize_with = "null_as_default")]
    pub with_replication_time_control: bool,
}

/// A replication relationship, in one of the two declaration styles.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplicationDeclaration {
    /// `source` replicates to each of `targets`
    OneDirectional {
        source: BucketRef,
        targets: Vec<BucketRef>,
    },
    /// Every member replicates to every other member
    Bidirectional { members: Vec<BucketRef> },
}

impl ReplicationSettings {
    /// Returns all declarations, one-directional ones first.
    pub fn declarations(&self) -> Vec<ReplicationDeclaration> {
        let one_directional = self.single_direction_replication.iter().map(|decl| {
            ReplicationDeclaration::OneDirectional {
                source: decl.source_bucket.clone(),
                targets: decl.target_buckets.clone(),
            }
        });

        let bidirectional = self
            .bidirectional_groups()
            .map(|members| ReplicationDeclaration::Bidirectional {
                members: members.to_vec(),
            });

        one_directional.chain(bidirectional).collect()
    }

    /// Iterates over the bidirectional groups: the flat group (if any) and
    /// then each listed group.
    pub fn bidirectional_groups(&self) -> impl Iterator<Item = &[BucketRef]> {
        let flat = (!self.bidirectional_replication_buckets.is_empty())
            .then_some(self.bidirectional_replication_buckets.as_slice());
        flat.into_iter()
            .chain(self.bidirectional_replication_groups.iter().map(Vec::as_slice))
    }

    /// Whether no replication is declared at all
    pub fn is_empty(&self) -> bool {
        self.single_direction_replication.is_empty() && self.bidirectional_groups().next().is_none()
    }

    /// The configured role prefix override; an empty string counts as unset.
    pub fn role_prefix_override(&self) -> Option<&str> {
        self.replication_role_prefix_override
            .as_deref()
            .filter(|prefix| !prefix.is_empty())
    }

    fn validate(&self) -> Result<()> {
        for (idx, decl) in self.single_direction_replication.iter().enumerate() {
            if decl.target_buckets.is_empty() {
                return Err(Error::ConfigParse {
                    message: format!(
                        "singleDirectionReplication entry {} (source {}) has no targetBuckets",
                        idx, decl.source_bucket.name
                    ),
                    hint: Some("List at least one target bucket or remove the entry".to_string()),
                });
            }
        }

        for (idx, group) in self.bidirectional_groups().enumerate() {
            if group.len() < 2 {
                return Err(Error::ConfigParse {
                    message: format!(
                        "bidirectional group {} has {} member(s), at least 2 are required",
                        idx,
                        group.len()
                    ),
                    hint: None,
                });
            }
        }

        Ok(())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `service` may be a plain string or a mapping with a `name` key
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ServiceName {
    Name(String),
    Detailed { name: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ProviderSection {
    #[serde(default)]
    region: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CustomSection {
    #[serde(default, rename = "s3ReplicationPlugin")]
    s3_replication_plugin: Option<ReplicationSettings>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawDescriptor {
    #[serde(default)]
    service: Option<ServiceName>,
    #[serde(default)]
    provider: Option<ProviderSection>,
    #[serde(default)]
    custom: Option<CustomSection>,
}

/// The parts of a deployment descriptor this tool works with
#[derive(Debug, Clone, PartialEq)]
pub struct Deployment {
    /// Name of the deploying service, if the descriptor has one
    pub service: Option<String>,
    /// `provider.region`, used as the default region for cloud clients
    pub region: Option<String>,
    /// The replication settings
    pub replication: ReplicationSettings,
}

impl Deployment {
    /// Resolves the service name, preferring an explicit override.
    pub fn service_name(&self, override_name: Option<&str>) -> Result<String> {
        override_name
            .map(str::to_string)
            .or_else(|| self.service.clone())
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| Error::ConfigParse {
                message: "No service name configured".to_string(),
                hint: Some("Set 'service:' in the descriptor or pass --service".to_string()),
            })
    }
}

/// Parses a deployment descriptor from a YAML string.
pub fn parse(yaml_content: &str) -> Result<Deployment> {
    let raw: RawDescriptor = serde_yaml::from_str(yaml_content)?;

    let replication = raw
        .custom
        .and_then(|custom| custom.s3_replication_plugin)
        .ok_or_else(|| Error::ConfigParse {
            message: "Missing custom.s3ReplicationPlugin block".to_string(),
            hint: Some(
                "Add a 'custom: { s3ReplicationPlugin: { ... } }' section to the descriptor"
                    .to_string(),
            ),
        })?;
    replication.validate()?;

    let service = raw.service.map(|service| match service {
        ServiceName::Name(name) => name,
        ServiceName::Detailed { name } => name,
    });

    Ok(Deployment {
        service,
        region: raw.provider.and_then(|provider| provider.region),
        replication,
    })
}

/// Reads and parses a deployment descriptor from disk.
pub fn from_file(path: &Path) -> Result<Deployment> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}
