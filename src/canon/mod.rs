//! Canonicalization of raw feed records.
//!
//! Each submodule owns one concern (ids, colors, labels, directions,
//! headsign merges) and is driven by tables from the agency profile.
//! [`Canonicalizer`] runs them over a whole feed.

pub mod colors;
pub mod directions;
pub mod engine;
pub mod error;
pub mod ids;
pub mod merge;
pub mod normalize;

pub use engine::Canonicalizer;
pub use error::{
    CanonicalizeError, ColorLookupError, DirectionAssignmentError, HeadsignMergeError,
    IdentifierError,
};
