//! # Error Handling
//!
//! This module defines the centralized error type for the `s3-replication`
//! library. It uses the `thiserror` library to build a single `Error` enum
//! covering every failure a replication run can run into, with messages that
//! name the bucket or role involved.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum representing all possible errors. Variants map
//!   onto the stages of a run:
//!   - configuration loading (`ConfigParse`, `Yaml`, `Io`)
//!   - the backend collaborators (`Identity`, `BucketCheck`, `RoleCreate`,
//!     `PolicyAttach`, `ReplicationSubmit`)
//!   - the one conflict that a run absorbs (`RoleAlreadyExists`)
//!   - plumbing (`LockPoisoned`, `Json`)
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! A missing bucket is deliberately not an error: the precondition phase
//! reports it as a skipped run instead.

use thiserror::Error;

/// Main error type for replication setup
#[derive(Error, Debug)]
pub enum Error {
    /// The deployment descriptor could not be turned into replication
    /// settings.
    ///
    /// Includes an optional hint about how to fix the descriptor.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// The caller's account identity could not be resolved.
    #[error("Identity lookup error: {message}")]
    Identity { message: String },

    /// The existence check for a bucket failed for a reason other than the
    /// bucket being absent (permissions, throttling, network).
    #[error("Bucket check error for {bucket}: {message}")]
    BucketCheck { bucket: String, message: String },

    /// A role with this name already exists.
    ///
    /// Backends report this from `create_role`; the role phase treats it as
    /// success.
    #[error("Role already exists: {role}")]
    RoleAlreadyExists { role: String },

    /// Creating the replication role failed.
    #[error("Role creation error for {role}: {message}")]
    RoleCreate { role: String, message: String },

    /// Attaching the inline permission policy to a role failed.
    #[error("Policy attach error for {role}/{policy}: {message}")]
    PolicyAttach {
        role: String,
        policy: String,
        message: String,
    },

    /// The storage backend rejected a replication configuration.
    #[error("Replication submit error for {bucket}: {message}")]
    ReplicationSubmit { bucket: String, message: String },

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
