//! # CLI Command Implementations
//!
//! Each subcommand of `s3-replication` lives in its own module with:
//! - an `Args` struct deriving `clap::Args` for its options,
//! - an `execute` function that loads the descriptor and calls into the
//!   `s3_replication` library.
//!
//! `apply` is the only command that talks to AWS.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use s3_replication::config::{self, Deployment, DEFAULT_CONFIG_FILE};

pub mod apply;
pub mod completions;
pub mod plan;
pub mod validate;

/// Resolves the descriptor path, defaulting to `serverless.yml`.
pub(crate) fn config_path(config: Option<PathBuf>) -> PathBuf {
    config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Loads a deployment descriptor, with a clear error when it is absent.
pub(crate) fn load_deployment(path: &Path) -> Result<Deployment> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }
    config::from_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}
