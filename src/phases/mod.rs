//! Implementation of the 5 phases of a replication run.
//!
//! ## Overview
//!
//! A run follows 5 phases:
//! 1. Expansion - Turn one-directional and bidirectional declarations into
//!    (source, targets) pairs
//! 2. Merging - Fold the pairs into one plan entry per source bucket, with
//!    priorities assigned in insertion order
//! 3. Preconditions - Check that every referenced bucket exists and is owned
//!    by the caller's account; a missing bucket skips the whole run
//! 4. Roles - Create (or reuse) one replication role per source bucket and
//!    attach its inline policy
//! 5. Submission - Put the full replication configuration on each source
//!    bucket
//!
//! Phases 1 and 2 are pure. Phases 3 to 5 go through the collaborators held
//! by [`CloudContext`](crate::backend::CloudContext) and issue their remote
//! calls one at a time.

use std::collections::HashMap;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::config::{BucketRef, ReplicationSettings};
use crate::error::Result;
use crate::replication::ReplicationRule;

// Phase modules
pub mod expand;
pub mod merge;
pub mod orchestrator;
pub mod preconditions;
pub mod roles;
pub mod submit;

// Re-export phase modules under their position in the pipeline
pub use expand as phase1;
pub use merge as phase2;
pub use preconditions as phase3;
pub use roles as phase4;
pub use submit as phase5;

/// A source bucket together with the targets one declaration gives it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTargets {
    pub source_bucket: String,
    pub source_region: String,
    pub targets: Vec<BucketRef>,
}

/// Accumulated replication setup of one source bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    /// Name of the source bucket (the plan key)
    #[serde(skip)]
    pub source_bucket: String,
    /// Region of the source bucket
    pub region: String,
    /// Replication role name, filled in by the role phase
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Rules with contiguous priorities starting at 0
    pub rules: Vec<ReplicationRule>,
    /// Every target contributed by any declaration, in rule order
    pub target_bucket_configs: Vec<BucketRef>,
}

impl PlanEntry {
    pub fn new(source_bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            source_bucket: source_bucket.into(),
            region: region.into(),
            role: None,
            rules: Vec::new(),
            target_bucket_configs: Vec::new(),
        }
    }
}

/// Mapping from source bucket name to its plan entry.
///
/// Iteration follows the order in which source buckets were first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplicationPlan {
    entries: Vec<PlanEntry>,
    index: HashMap<String, usize>,
}

impl ReplicationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, source_bucket: &str) -> Option<&PlanEntry> {
        self.index.get(source_bucket).map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, source_bucket: &str) -> bool {
        self.index.contains_key(source_bucket)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlanEntry> {
        self.entries.iter_mut()
    }

    /// Returns the entry for `source_bucket`, creating an empty one in
    /// `source_region` when the bucket is new. An existing entry keeps the
    /// region it was created with.
    pub fn entry(&mut self, source_bucket: &str, source_region: &str) -> &mut PlanEntry {
        let idx = match self.index.get(source_bucket) {
            Some(&idx) => idx,
            None => {
                self.entries
                    .push(PlanEntry::new(source_bucket, source_region));
                let idx = self.entries.len() - 1;
                self.index.insert(source_bucket.to_string(), idx);
                idx
            }
        };
        &mut self.entries[idx]
    }

    /// Builds the plan for a set of settings (phases 1 and 2).
    pub fn from_settings(settings: &ReplicationSettings) -> Self {
        let expanded = expand::execute(&settings.declarations());
        merge::execute(expanded, settings.with_replication_time_control)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Pretty-printed JSON, newline-terminated
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

impl Serialize for ReplicationPlan {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.source_bucket, entry)?;
        }
        map.end()
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Every phase ran; the plan carries the resolved role names
    Applied(ReplicationPlan),
    /// At least one referenced bucket is missing; nothing was changed
    Skipped { missing_buckets: Vec<BucketRef> },
}

impl RunOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, RunOutcome::Skipped { .. })
    }

    /// The applied plan, or an empty plan for a skipped run
    pub fn into_plan(self) -> ReplicationPlan {
        match self {
            RunOutcome::Applied(plan) => plan,
            RunOutcome::Skipped { .. } => ReplicationPlan::new(),
        }
    }
}
