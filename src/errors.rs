//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`MirageError`] covers all failure modes including:
//! - Asset classification and decoding failures
//! - AR camera / sensor acquisition failures
//! - Control calls that reference unknown objects or poses
//! - Lifecycle guard refusals and render context failures
//!
//! Apart from [`MirageError::RenderContextUnavailable`], every error is local:
//! the running scene keeps going and the caller decides whether to surface it.
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for `std::result::Result<T, MirageError>`.
//!
//! ```rust,ignore
//! use mirage::errors::{MirageError, Result};
//!
//! fn fade(engine: &mut Engine) -> Result<()> {
//!     engine.set_opacity("bunny.ply", 0.5)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the Mirage engine.
#[derive(Error, Debug)]
pub enum MirageError {
    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    /// The path carries an extension the loader refuses to decode.
    #[error("Unsupported asset '{path}': {reason}")]
    UnsupportedAsset {
        /// The rejected path
        path: String,
        /// Why it was rejected
        reason: String,
    },

    /// A single asset failed to decode. Other assets are unaffected.
    #[error("Failed to decode '{path}': {reason}")]
    DecodeFailure {
        /// The failing path
        path: String,
        /// Decoder message
        reason: String,
    },

    /// A decoded asset collided with an existing node name and was discarded.
    #[error("Duplicate asset '{0}' ignored")]
    DuplicateAsset(String),

    /// PLY parsing error.
    #[error("PLY parse error: {0}")]
    PlyError(String),

    /// glTF parsing or loading error.
    #[cfg(feature = "gltf")]
    #[error("glTF error: {0}")]
    GltfError(String),

    /// Image decoding error.
    #[error("Image decode error: {0}")]
    ImageDecodeError(String),

    // ========================================================================
    // AR Acquisition Errors
    // ========================================================================
    /// The device exposes no orientation sensor or camera.
    #[error("Sensor unavailable: {0}. Use a device with a gyroscope and a camera.")]
    SensorUnavailable(String),

    /// The user or platform refused access.
    #[error("Permission denied: {0}. Allow camera and motion access in the browser or system settings, then retry.")]
    PermissionDenied(String),

    /// Camera and sensor APIs require a secure origin.
    #[error("Insecure context: camera and motion sensors require HTTPS or localhost.")]
    InsecureContext,

    /// The camera stream could not be opened for a reason other than permissions.
    #[error("Camera unavailable: {0}. Close other applications using the camera and retry.")]
    CameraUnavailable(String),

    // ========================================================================
    // Control Surface Errors
    // ========================================================================
    /// A control call referenced an object that is not registered.
    #[error("No scene object named '{0}'")]
    MissingTarget(String),

    /// The camera pose store is full.
    #[error("Camera pose limit reached ({0} poses)")]
    PoseLimitReached(usize),

    /// A pose id did not match any stored pose.
    #[error("No saved camera pose with id {0}")]
    PoseNotFound(u32),

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Initialization requested while a scene is initializing or active.
    #[error("Scene is already {0}")]
    AlreadyRunning(&'static str),

    /// Automatic re-initialization refused after the first explicit start.
    #[error("Automatic start suppressed: the scene was already started once")]
    AutoStartSuppressed,

    /// No rendering context could be created. Initialization is aborted.
    #[error("Render context unavailable: {0}")]
    RenderContextUnavailable(String),

    /// The scene is not active.
    #[error("Scene is not active")]
    NotActive,

    // ========================================================================
    // I/O & Format Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A blocking decode task panicked or was cancelled.
    #[error("Task join error: {0}")]
    TaskJoinError(String),
}

impl MirageError {
    /// Returns `true` for errors that only warrant a warning.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::DuplicateAsset(_))
    }
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<image::ImageError> for MirageError {
    fn from(err: image::ImageError) -> Self {
        MirageError::ImageDecodeError(err.to_string())
    }
}

#[cfg(feature = "gltf")]
impl From<gltf::Error> for MirageError {
    fn from(err: gltf::Error) -> Self {
        MirageError::GltfError(err.to_string())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl From<tokio::task::JoinError> for MirageError {
    fn from(err: tokio::task::JoinError) -> Self {
        MirageError::TaskJoinError(err.to_string())
    }
}

/// Alias for `Result<T, MirageError>`.
pub type Result<T> = std::result::Result<T, MirageError>;
