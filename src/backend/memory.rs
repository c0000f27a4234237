//! In-memory backend for tests and dry runs.
//!
//! [`InMemoryBackend`] keeps buckets, roles, role policies and replication
//! configurations in shared state behind a cloneable handle. Every call is
//! recorded so tests can assert on the exact sequence of remote operations,
//! and any operation can be made to fail.
//!
//! A bucket may be placed in a region. Bucket requests addressed to any
//! other region fail with `PermanentRedirect`, as S3 does.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{IamOperations, IdentityOperations, StorageOperations};
use crate::config::BucketRef;
use crate::error::{Error, Result};
use crate::policy::RoleTag;
use crate::replication::ReplicationConfiguration;

/// The collaborator operations, used to select injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AccountId,
    BucketExists,
    CreateRole,
    PutRolePolicy,
    PutBucketReplication,
}

/// One call made against the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    AccountId,
    BucketExists {
        bucket: String,
        region: String,
        expected_owner: String,
    },
    CreateRole {
        role: String,
    },
    PutRolePolicy {
        role: String,
        policy: String,
    },
    PutBucketReplication {
        bucket: String,
        region: String,
    },
}

impl RecordedCall {
    pub fn operation(&self) -> Operation {
        match self {
            RecordedCall::AccountId => Operation::AccountId,
            RecordedCall::BucketExists { .. } => Operation::BucketExists,
            RecordedCall::CreateRole { .. } => Operation::CreateRole,
            RecordedCall::PutRolePolicy { .. } => Operation::PutRolePolicy,
            RecordedCall::PutBucketReplication { .. } => Operation::PutBucketReplication,
        }
    }

    /// Whether the call changes remote state
    pub fn is_mutation(&self) -> bool {
        matches!(
            self.operation(),
            Operation::CreateRole | Operation::PutRolePolicy | Operation::PutBucketReplication
        )
    }
}

/// A role as stored by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRole {
    pub assume_role_policy: String,
    pub tags: Vec<RoleTag>,
}

#[derive(Debug)]
struct StoredBucket {
    owner: String,
    /// `None` accepts requests addressed to any region
    region: Option<String>,
}

impl StoredBucket {
    fn check_region(&self, bucket: &str, region: &str) -> std::result::Result<(), String> {
        match &self.region {
            Some(home) if home != region => Err(format!(
                "PermanentRedirect: bucket {} is in {}, request sent to {}",
                bucket, home, region
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    account_id: String,
    buckets: HashMap<String, StoredBucket>,
    roles: HashMap<String, StoredRole>,
    /// (role, policy name) -> document
    role_policies: HashMap<(String, String), String>,
    replication: HashMap<String, ReplicationConfiguration>,
    failures: HashMap<Operation, String>,
    calls: Vec<RecordedCall>,
}

/// In-process fake of the identity, storage and IAM services.
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
}

impl InMemoryBackend {
    /// Creates an empty backend whose caller belongs to `account_id`.
    pub fn new(account_id: impl Into<String>) -> Self {
        let state = State {
            account_id: account_id.into(),
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Adds a bucket owned by the caller's account, reachable from any region.
    pub fn with_bucket(self, name: &str) -> Self {
        self.insert_own_bucket(name, None)
    }

    /// Adds a bucket owned by the caller's account, located in `region`.
    pub fn with_bucket_in(self, region: &str, name: &str) -> Self {
        self.insert_own_bucket(name, Some(region))
    }

    fn insert_own_bucket(self, name: &str, region: Option<&str>) -> Self {
        {
            let mut state = self.state();
            let bucket = StoredBucket {
                owner: state.account_id.clone(),
                region: region.map(str::to_string),
            };
            state.buckets.insert(name.to_string(), bucket);
        }
        self
    }

    /// Adds several buckets owned by the caller's account.
    pub fn with_buckets<'a, I>(self, names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .fold(self, |backend, name| backend.with_bucket(name))
    }

    /// Adds a bucket owned by another account.
    pub fn with_foreign_bucket(self, name: &str, owner: &str) -> Self {
        self.state().buckets.insert(
            name.to_string(),
            StoredBucket {
                owner: owner.to_string(),
                region: None,
            },
        );
        self
    }

    /// Adds a pre-existing role.
    pub fn with_role(self, name: &str, assume_role_policy: &str) -> Self {
        self.state().roles.insert(
            name.to_string(),
            StoredRole {
                assume_role_policy: assume_role_policy.to_string(),
                tags: Vec::new(),
            },
        );
        self
    }

    /// Makes every subsequent call of `operation` fail with `message`.
    pub fn fail_on(&self, operation: Operation, message: &str) {
        self.state()
            .failures
            .insert(operation, message.to_string());
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn role(&self, name: &str) -> Option<StoredRole> {
        self.state().roles.get(name).cloned()
    }

    pub fn role_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state().roles.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn role_policy(&self, role: &str, policy: &str) -> Option<String> {
        self.state()
            .role_policies
            .get(&(role.to_string(), policy.to_string()))
            .cloned()
    }

    pub fn replication_configuration(&self, bucket: &str) -> Option<ReplicationConfiguration> {
        self.state().replication.get(bucket).cloned()
    }

    /// Inspection access; a poisoned lock is recovered since the state is
    /// only a record.
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the state for a backend call, records it, and returns the
    /// injected failure message for its operation, if any.
    fn begin(&self, call: RecordedCall) -> Result<(MutexGuard<'_, State>, Option<String>)> {
        let mut state = self.state.lock().map_err(|_| Error::LockPoisoned {
            context: "in-memory backend state".to_string(),
        })?;
        let failure = state.failures.get(&call.operation()).cloned();
        state.calls.push(call);
        Ok((state, failure))
    }
}

impl IdentityOperations for InMemoryBackend {
    fn account_id(&self) -> Result<String> {
        let (state, failure) = self.begin(RecordedCall::AccountId)?;
        if let Some(message) = failure {
            return Err(Error::Identity { message });
        }
        Ok(state.account_id.clone())
    }
}

impl StorageOperations for InMemoryBackend {
    fn bucket_exists(&self, bucket: &BucketRef, expected_owner: &str) -> Result<bool> {
        let (state, failure) = self.begin(RecordedCall::BucketExists {
            bucket: bucket.name.clone(),
            region: bucket.region.clone(),
            expected_owner: expected_owner.to_string(),
        })?;
        let check_error = |message: String| Error::BucketCheck {
            bucket: bucket.name.clone(),
            message,
        };
        if let Some(message) = failure {
            return Err(check_error(message));
        }
        match state.buckets.get(&bucket.name) {
            Some(stored) => {
                stored
                    .check_region(&bucket.name, &bucket.region)
                    .map_err(check_error)?;
                Ok(stored.owner == expected_owner)
            }
            None => Ok(false),
        }
    }

    fn put_bucket_replication(
        &self,
        bucket: &str,
        region: &str,
        configuration: &ReplicationConfiguration,
    ) -> Result<()> {
        let (mut state, failure) = self.begin(RecordedCall::PutBucketReplication {
            bucket: bucket.to_string(),
            region: region.to_string(),
        })?;
        let submit_error = |message: String| Error::ReplicationSubmit {
            bucket: bucket.to_string(),
            message,
        };
        if let Some(message) = failure {
            return Err(submit_error(message));
        }
        match state.buckets.get(bucket) {
            Some(stored) => stored.check_region(bucket, region).map_err(submit_error)?,
            None => return Err(submit_error("NoSuchBucket".to_string())),
        }
        state
            .replication
            .insert(bucket.to_string(), configuration.clone());
        Ok(())
    }
}

impl IamOperations for InMemoryBackend {
    fn create_role(
        &self,
        role_name: &str,
        assume_role_policy: &str,
        tags: &[RoleTag],
    ) -> Result<()> {
        let (mut state, failure) = self.begin(RecordedCall::CreateRole {
            role: role_name.to_string(),
        })?;
        if let Some(message) = failure {
            return Err(Error::RoleCreate {
                role: role_name.to_string(),
                message,
            });
        }
        if state.roles.contains_key(role_name) {
            return Err(Error::RoleAlreadyExists {
                role: role_name.to_string(),
            });
        }
        state.roles.insert(
            role_name.to_string(),
            StoredRole {
                assume_role_policy: assume_role_policy.to_string(),
                tags: tags.to_vec(),
            },
        );
        Ok(())
    }

    fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<()> {
        let (mut state, failure) = self.begin(RecordedCall::PutRolePolicy {
            role: role_name.to_string(),
            policy: policy_name.to_string(),
        })?;
        if let Some(message) = failure {
            return Err(Error::PolicyAttach {
                role: role_name.to_string(),
                policy: policy_name.to_string(),
                message,
            });
        }
        if !state.roles.contains_key(role_name) {
            return Err(Error::PolicyAttach {
                role: role_name.to_string(),
                policy: policy_name.to_string(),
                message: "NoSuchEntity".to_string(),
            });
        }
        state.role_policies.insert(
            (role_name.to_string(), policy_name.to_string()),
            policy_document.to_string(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replication::ReplicationRule;

    #[test]
    fn test_bucket_exists_checks_owner() {
        let backend = InMemoryBackend::new("acct")
            .with_bucket("mine")
            .with_foreign_bucket("theirs", "other-acct");

        let bucket = |name: &str| BucketRef::new("eu-west-1", name);
        assert!(backend.bucket_exists(&bucket("mine"), "acct").unwrap());
        assert!(!backend.bucket_exists(&bucket("theirs"), "acct").unwrap());
        assert!(!backend.bucket_exists(&bucket("nowhere"), "acct").unwrap());
        assert_eq!(backend.calls().len(), 3);
    }

    #[test]
    fn test_bucket_requests_must_target_its_region() {
        let backend = InMemoryBackend::new("acct").with_bucket_in("us-east-1", "far");
        let config = ReplicationConfiguration {
            role: "arn".to_string(),
            rules: vec![ReplicationRule::new("t", 0, false)],
        };

        assert!(backend
            .bucket_exists(&BucketRef::new("us-east-1", "far"), "acct")
            .unwrap());
        let err = backend
            .bucket_exists(&BucketRef::new("eu-west-1", "far"), "acct")
            .unwrap_err();
        assert!(matches!(err, Error::BucketCheck { .. }));
        assert!(err.to_string().contains("PermanentRedirect"));

        let err = backend
            .put_bucket_replication("far", "eu-west-1", &config)
            .unwrap_err();
        assert!(err.to_string().contains("PermanentRedirect"));
        backend
            .put_bucket_replication("far", "us-east-1", &config)
            .unwrap();

        assert_eq!(
            backend.calls().last(),
            Some(&RecordedCall::PutBucketReplication {
                bucket: "far".to_string(),
                region: "us-east-1".to_string(),
            })
        );
    }

    #[test]
    fn test_create_role_twice_reports_already_exists() {
        let backend = InMemoryBackend::new("acct");
        backend.create_role("role", "{}", &[]).unwrap();

        let err = backend.create_role("role", "{}", &[]).unwrap_err();
        assert!(matches!(err, Error::RoleAlreadyExists { role } if role == "role"));
    }

    #[test]
    fn test_put_role_policy_overwrites() {
        let backend = InMemoryBackend::new("acct").with_role("role", "{}");
        backend.put_role_policy("role", "p", "first").unwrap();
        backend.put_role_policy("role", "p", "second").unwrap();

        assert_eq!(backend.role_policy("role", "p").as_deref(), Some("second"));
    }

    #[test]
    fn test_put_role_policy_requires_role() {
        let backend = InMemoryBackend::new("acct");
        let err = backend.put_role_policy("missing", "p", "doc").unwrap_err();
        assert!(err.to_string().contains("NoSuchEntity"));
    }

    #[test]
    fn test_put_bucket_replication_requires_bucket() {
        let backend = InMemoryBackend::new("acct").with_bucket("b");
        let config = ReplicationConfiguration {
            role: "arn".to_string(),
            rules: vec![ReplicationRule::new("t", 0, false)],
        };

        backend.put_bucket_replication("b", "eu-west-1", &config).unwrap();
        assert_eq!(backend.replication_configuration("b"), Some(config.clone()));

        let err = backend
            .put_bucket_replication("missing", "eu-west-1", &config)
            .unwrap_err();
        assert!(err.to_string().contains("NoSuchBucket"));
    }

    #[test]
    fn test_injected_failure_is_recorded() {
        let backend = InMemoryBackend::new("acct").with_bucket("b");
        backend.fail_on(Operation::BucketExists, "AccessDenied");

        let err = backend
            .bucket_exists(&BucketRef::new("eu-west-1", "b"), "acct")
            .unwrap_err();
        assert!(matches!(err, Error::BucketCheck { .. }));
        assert_eq!(backend.calls().len(), 1);
        assert!(!backend.calls()[0].is_mutation());
    }
}
