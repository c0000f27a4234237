//! Phase 1: Expansion
//!
//! This is the first phase of a replication run. It normalises the two
//! declaration styles into a flat list of [`SourceTargets`]:
//!
//! - A one-directional declaration yields its source and targets verbatim.
//! - A bidirectional group of N members yields N pairs. Each member is the
//!   source once, with every other member as a target in group order.
//!   Members are excluded by position, not by value, so two identical
//!   entries in one group still target each other.
//!
//! All one-directional pairs are emitted before any bidirectional pair. The
//! merge phase numbers rules in this order, so the ordering decides rule
//! priorities.

use super::SourceTargets;
use crate::config::{BucketRef, ReplicationDeclaration};

/// Execute Phase 1: expand declarations into (source, targets) pairs
pub fn execute(declarations: &[ReplicationDeclaration]) -> Vec<SourceTargets> {
    let one_directional = declarations.iter().filter_map(|decl| match decl {
        ReplicationDeclaration::OneDirectional { source, targets } => Some(SourceTargets {
            source_bucket: source.name.clone(),
            source_region: source.region.clone(),
            targets: targets.clone(),
        }),
        ReplicationDeclaration::Bidirectional { .. } => None,
    });

    let bidirectional = declarations
        .iter()
        .filter_map(|decl| match decl {
            ReplicationDeclaration::Bidirectional { members } => Some(members),
            ReplicationDeclaration::OneDirectional { .. } => None,
        })
        .flat_map(|members| expand_group(members));

    one_directional.chain(bidirectional).collect()
}

fn expand_group(members: &[BucketRef]) -> impl Iterator<Item = SourceTargets> + '_ {
    members.iter().enumerate().map(move |(source_idx, source)| {
        let targets = members
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != source_idx)
            .map(|(_, member)| member.clone())
            .collect();

        SourceTargets {
            source_bucket: source.name.clone(),
            source_region: source.region.clone(),
            targets,
        }
    })
}
