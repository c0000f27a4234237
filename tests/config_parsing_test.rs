//! Deployment descriptor tests using datatest-stable for test data discovery
//!
//! Every file under `tests/testdata/valid` must parse into replication
//! settings that declare something and yield a consistent plan. Every file
//! under `tests/testdata/invalid` must be rejected.

use s3_replication::config::{parse, Deployment};
use s3_replication::phases::ReplicationPlan;
use std::path::Path;

fn load(path: &Path) -> datatest_stable::Result<String> {
    Ok(std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read test file {}: {}", path.display(), e))?)
}

/// Test that a valid descriptor parses and plans cleanly
fn test_valid_descriptor(path: &Path) -> datatest_stable::Result<()> {
    let content = load(path)?;
    let deployment: Deployment = parse(&content)
        .map_err(|e| format!("Failed to parse descriptor {}: {}", path.display(), e))?;

    assert!(
        !deployment.replication.is_empty(),
        "Descriptor {} should declare at least one replication",
        path.display()
    );
    assert!(
        deployment.service_name(None).is_ok(),
        "Descriptor {} should name its service",
        path.display()
    );

    let plan = ReplicationPlan::from_settings(&deployment.replication);
    assert!(!plan.is_empty(), "Plan for {} is empty", path.display());
    for entry in plan.iter() {
        assert_eq!(
            entry.rules.len(),
            entry.target_bucket_configs.len(),
            "Entry {} in {} has mismatched rules and targets",
            entry.source_bucket,
            path.display()
        );
    }

    Ok(())
}

/// Test that an invalid descriptor is rejected with a readable message
fn test_invalid_descriptor(path: &Path) -> datatest_stable::Result<()> {
    let content = load(path)?;
    match parse(&content) {
        Ok(_) => Err(format!("Descriptor {} should have been rejected", path.display()).into()),
        Err(e) => {
            assert!(
                !e.to_string().is_empty(),
                "Rejection of {} has an empty message",
                path.display()
            );
            Ok(())
        }
    }
}

datatest_stable::harness!(
    test_valid_descriptor,
    "tests/testdata/valid",
    r".*\.yml$",
    test_invalid_descriptor,
    "tests/testdata/invalid",
    r".*\.yml$"
);
