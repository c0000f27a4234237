//! # S3 Cross-Bucket Replication
//!
//! This library turns a declarative description of replication between
//! storage buckets into a concrete setup: one IAM role per source bucket and
//! one replication configuration submitted to each source bucket. It backs
//! the `s3-replication` command-line tool and can be driven directly from
//! other programs.
//!
//! ## Quick Example
//!
//! ```
//! use s3_replication::config;
//! use s3_replication::phases::ReplicationPlan;
//!
//! let deployment = config::parse(r#"
//! service: shop
//! custom:
//!   s3ReplicationPlugin:
//!     bidirectionalReplicationBuckets:
//!       - eu-west-1: shop-eu
//!       - us-east-1: shop-us
//! "#).unwrap();
//!
//! let plan = ReplicationPlan::from_settings(&deployment.replication);
//! assert_eq!(plan.len(), 2);
//! assert_eq!(plan.get("shop-eu").unwrap().rules.len(), 1);
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`)**: The deployment descriptor and the
//!   replication settings it carries, with buckets written as
//!   `{region: bucket-name}`.
//! - **Replication documents (`replication`, `policy`)**: The replication
//!   rules submitted to the storage service, and the role names, ARNs and
//!   IAM policy documents derived from the settings.
//! - **Backends (`backend`)**: The identity, storage and IAM collaborators,
//!   with an AWS implementation and an in-memory fake.
//! - **Phases (`phases`)**: The pipeline that expands declarations, merges
//!   them into a per-bucket plan, checks preconditions, reconciles roles,
//!   and submits the configurations.
//!
//! ## Execution Flow
//!
//! The main entry point is [`phases::orchestrator::execute`]. A run either
//! applies the whole plan or, when any referenced bucket is missing, skips
//! without changing anything. Both role creation and submission are
//! idempotent: running again with the same settings yields the same state.

pub mod backend;
pub mod config;
pub mod error;
pub mod output;
pub mod phases;
pub mod policy;
pub mod replication;

mod plan_proptest;
