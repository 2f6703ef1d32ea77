//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`MocapError`] covers every failure mode of a
//! conversion run:
//! - Structural problems with the skeleton topology
//! - Joints required by auxiliary synthesis or height estimation
//! - Invalid coordinate conventions and body heights
//! - BVH parsing and channel-layout errors
//!
//! All failures are deterministic given the input. There is no partial
//! result: a clip either resolves as a whole or the run fails.
//!
//! ```rust,ignore
//! use mocap_fk::errors::{MocapError, Result};
//!
//! fn load() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the crate.
#[derive(Error, Debug)]
pub enum MocapError {
    // ========================================================================
    // Topology & Skeleton Errors
    // ========================================================================
    /// Cycle, out-of-range parent, missing/multiple roots, duplicate names or
    /// mismatched array lengths. Detected once, when the data is loaded.
    #[error("Malformed topology: {0}")]
    MalformedTopology(String),

    /// A joint that auxiliary synthesis or height estimation depends on is
    /// absent from the skeleton.
    #[error("Missing required joint `{joint}` (required by {required_by})")]
    MissingRequiredJoint {
        /// Name of the joint that could not be found
        joint: String,
        /// Component that needs the joint
        required_by: &'static str,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// The basis matrix is not a proper rotation, or the scale is unusable.
    #[error("Invalid coordinate convention: {0}")]
    InvalidConvention(String),

    /// A fixed body height that is not a finite, positive number of meters.
    #[error("Invalid body height: {0}")]
    InvalidHeight(f64),

    /// A strategy that needs at least one resolved frame ran on an empty clip.
    #[error("Clip has no frames")]
    EmptyClip,

    // ========================================================================
    // Source Errors
    // ========================================================================
    /// BVH syntax error.
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// The file parsed, but its channel layout is not accepted by the source.
    #[error("Unsupported channel layout: {0}")]
    UnsupportedChannels(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl MocapError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Alias for `Result<T, MocapError>`.
pub type Result<T> = std::result::Result<T, MocapError>;
