//! Shared test utilities for integration and E2E tests.
//!
//! Add `mod common;` to a test file and pull in the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new().with_config(descriptors::HYBRID);
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

use s3_replication::backend::memory::InMemoryBackend;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::descriptors;
    #[allow(unused_imports)]
    pub use super::{backend_with_all_buckets, TestFixture, ACCOUNT_ID, ALL_BUCKETS};
}

pub const ACCOUNT_ID: &str = "123456789012";

/// Every bucket named by the descriptors below, as (region, name)
pub const ALL_BUCKETS: [(&str, &str); 6] = [
    ("eu-west-1", "my-bucket-eu-west-1"),
    ("eu-west-2", "my-bucket-eu-west-2"),
    ("eu-west-1", "my-bucket-sec-eu-west-1"),
    ("eu-central-1", "my-bucket-eu-central-1"),
    ("us-east-2", "my-bucket-us-east-2"),
    ("us-east-1", "my-bucket-us-east-1"),
];

/// Deployment descriptors used across the suites.
#[allow(dead_code)]
pub mod descriptors {
    /// A plugin block with nothing declared.
    pub const EMPTY: &str = r#"
service: TEST-SERVICE
provider:
  region: eu-west-1
custom:
  s3ReplicationPlugin: {}
"#;

    /// Two one-directional declarations.
    pub const SINGLE_DIRECTION: &str = r#"
service: TEST-SERVICE
provider:
  region: eu-west-1
custom:
  s3ReplicationPlugin:
    singleDirectionReplication:
      - sourceBucket:
          eu-west-1: my-bucket-eu-west-1
        targetBuckets:
          - eu-west-2: my-bucket-eu-west-2
          - eu-west-1: my-bucket-sec-eu-west-1
      - sourceBucket:
          eu-central-1: my-bucket-eu-central-1
        targetBuckets:
          - us-east-2: my-bucket-us-east-2
"#;

    /// One bidirectional group of three buckets.
    pub const BIDIRECTIONAL: &str = r#"
service: TEST-SERVICE
provider:
  region: eu-west-1
custom:
  s3ReplicationPlugin:
    bidirectionalReplicationBuckets:
      - eu-west-1: my-bucket-eu-west-1
      - eu-central-1: my-bucket-eu-central-1
      - us-east-1: my-bucket-us-east-1
"#;

    /// Both kinds of declaration, sharing source buckets.
    pub const HYBRID: &str = r#"
service: TEST-SERVICE
provider:
  region: eu-west-1
custom:
  s3ReplicationPlugin:
    singleDirectionReplication:
      - sourceBucket:
          eu-west-1: my-bucket-eu-west-1
        targetBuckets:
          - eu-west-2: my-bucket-eu-west-2
          - eu-west-1: my-bucket-sec-eu-west-1
      - sourceBucket:
          eu-central-1: my-bucket-eu-central-1
        targetBuckets:
          - us-east-2: my-bucket-us-east-2
    bidirectionalReplicationBuckets:
      - eu-west-1: my-bucket-eu-west-1
      - eu-central-1: my-bucket-eu-central-1
      - us-east-1: my-bucket-us-east-1
"#;

    /// One-directional declarations with a role prefix override.
    pub const PREFIX_OVERRIDE: &str = r#"
service: TEST-SERVICE
custom:
  s3ReplicationPlugin:
    replicationRolePrefixOverride: OVERRIDE
    singleDirectionReplication:
      - sourceBucket:
          eu-west-1: my-bucket-eu-west-1
        targetBuckets:
          - eu-west-2: my-bucket-eu-west-2
"#;

    /// A bidirectional pair with replication time control.
    pub const TIME_CONTROL: &str = r#"
service: TEST-SERVICE
custom:
  s3ReplicationPlugin:
    withReplicationTimeControl: true
    bidirectionalReplicationBuckets:
      - eu-west-1: my-bucket-eu-west-1
      - us-east-1: my-bucket-us-east-1
"#;

    /// Not YAML at all.
    pub const INVALID_YAML: &str = "custom: [unclosed";
}

/// An in-memory backend where every bucket of [`ALL_BUCKETS`] exists in
/// its region.
#[allow(dead_code)]
pub fn backend_with_all_buckets() -> InMemoryBackend {
    ALL_BUCKETS
        .iter()
        .fold(InMemoryBackend::new(ACCOUNT_ID), |backend, (region, name)| {
            backend.with_bucket_in(region, name)
        })
}

/// A temporary directory holding a `serverless.yml`.
#[allow(dead_code)]
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Writes `serverless.yml` with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child("serverless.yml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("serverless.yml")
    }

    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// The `s3-replication` binary, run from the fixture directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("s3-replication");
        cmd.current_dir(self.path());
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
