//! Error types for world composition.
//!
//! Only structural and configuration problems are errors. Spatial problems
//! (no route, under-filled scatter, overlapping fallback placements) are
//! reported as data in the composition results and in
//! [`crate::validation`] reports.

use thiserror::Error;

/// Result type alias using [`GenError`].
pub type Result<T> = std::result::Result<T, GenError>;

/// Top-level error type for all structural composition errors.
#[derive(Debug, Error)]
pub enum GenError {
    /// A region references a biome that is not registered.
    #[error("Unknown biome: {0}")]
    UnknownBiome(String),

    /// An archetype reference layout could not be found.
    #[error("Missing archetype: {0}")]
    MissingArchetype(String),

    /// Two anchors in the same world share an id.
    #[error("Duplicate anchor id: {0}")]
    DuplicateAnchorId(String),

    /// Two regions in the same world share an id.
    #[error("Duplicate region id: {0}")]
    DuplicateRegionId(String),

    /// A connection, start point or compose option names an undeclared region.
    #[error("Unknown region '{region}' referenced by {context}")]
    UnknownRegion {
        /// The region id that was not found.
        region: String,
        /// Where the reference came from.
        context: String,
    },

    /// The world's start anchor does not exist in the start region.
    #[error("Start anchor '{anchor}' not found in region '{region}'")]
    UnknownStartAnchor {
        /// Start region id.
        region: String,
        /// Start anchor id.
        anchor: String,
    },

    /// A world slot names a child world instance that was not loaded.
    #[error("Anchor '{anchor}' references unknown world instance '{instance}'")]
    UnknownWorldInstance {
        /// Anchor carrying the slot.
        anchor: String,
        /// Missing instance id.
        instance: String,
    },

    /// A world instance names a template that was not loaded.
    #[error("World instance '{instance}' references unknown template '{template}'")]
    UnknownTemplate {
        /// Instance id.
        instance: String,
        /// Missing template id.
        template: String,
    },

    /// A declaration carries a value the composer cannot work with.
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    /// Failed to read a data file or directory.
    #[error("Failed to read '{path}': {message}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying IO error message.
        message: String,
    },

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Failed to encode a composition result.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}
