//! # Cloud Backend Collaborators
//!
//! This module defines the narrow interfaces a replication run uses to talk
//! to the outside world. Like the rest of the crate they are blocking; an
//! implementation may drive an async SDK internally.
//!
//! - **`IdentityOperations`**: resolves the caller's account id.
//! - **`StorageOperations`**: checks bucket existence/ownership and submits
//!   bucket replication configurations.
//! - **`IamOperations`**: creates replication roles and attaches their
//!   inline policies.
//!
//! [`CloudContext`] bundles one implementation of each and caches the
//! account id for the duration of a run. Two implementations ship with the
//! crate: [`aws::AwsBackend`] for the real services and
//! [`memory::InMemoryBackend`], an in-process fake for tests.

use std::sync::OnceLock;

use crate::config::BucketRef;
use crate::error::Result;
use crate::policy::RoleTag;
use crate::replication::ReplicationConfiguration;

pub mod aws;
pub mod memory;

/// Trait for identity lookups - allows mocking in tests
pub trait IdentityOperations: Send + Sync {
    /// Returns the account id of the caller's credentials.
    fn account_id(&self) -> Result<String>;
}

/// Trait for object storage operations
///
/// Bucket operations carry the bucket's region; requests must be sent to
/// that region's endpoint.
pub trait StorageOperations: Send + Sync {
    /// Checks that `bucket` exists and is owned by `expected_owner`.
    ///
    /// Returns `Ok(false)` when the backend reports the bucket as not found
    /// or as owned by someone else. Any other failure is an error.
    fn bucket_exists(&self, bucket: &BucketRef, expected_owner: &str) -> Result<bool>;

    /// Replaces the replication configuration of `bucket`, located in `region`.
    fn put_bucket_replication(
        &self,
        bucket: &str,
        region: &str,
        configuration: &ReplicationConfiguration,
    ) -> Result<()>;
}

/// Trait for identity and access management operations
pub trait IamOperations: Send + Sync {
    /// Creates a role assumable according to `assume_role_policy`.
    ///
    /// Must fail with [`Error::RoleAlreadyExists`](crate::error::Error::RoleAlreadyExists)
    /// when a role with this name already exists.
    fn create_role(&self, role_name: &str, assume_role_policy: &str, tags: &[RoleTag])
        -> Result<()>;

    /// Creates or overwrites the inline policy `policy_name` of a role.
    fn put_role_policy(&self, role_name: &str, policy_name: &str, policy_document: &str)
        -> Result<()>;
}

/// The collaborators of one replication run.
pub struct CloudContext {
    identity: Box<dyn IdentityOperations>,
    storage: Box<dyn StorageOperations>,
    iam: Box<dyn IamOperations>,
    account_id: OnceLock<String>,
}

impl CloudContext {
    /// Creates a context from separate collaborator implementations.
    pub fn new(
        identity: Box<dyn IdentityOperations>,
        storage: Box<dyn StorageOperations>,
        iam: Box<dyn IamOperations>,
    ) -> Self {
        Self {
            identity,
            storage,
            iam,
            account_id: OnceLock::new(),
        }
    }

    /// Creates a context where one backend provides every collaborator.
    pub fn from_backend<B>(backend: B) -> Self
    where
        B: IdentityOperations + StorageOperations + IamOperations + Clone + 'static,
    {
        Self::new(
            Box::new(backend.clone()),
            Box::new(backend.clone()),
            Box::new(backend),
        )
    }

    /// The caller's account id, looked up on first use and cached.
    ///
    /// A failed lookup is not cached; the next call retries.
    pub fn account_id(&self) -> Result<String> {
        if let Some(account_id) = self.account_id.get() {
            return Ok(account_id.clone());
        }

        let account_id = self.identity.account_id()?;
        Ok(self.account_id.get_or_init(|| account_id).clone())
    }

    pub fn storage(&self) -> &dyn StorageOperations {
        self.storage.as_ref()
    }

    pub fn iam(&self) -> &dyn IamOperations {
        self.iam.as_ref()
    }
}
