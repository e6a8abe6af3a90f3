//! Rule-driven canonicalization of GTFS feeds.
//!
//! A [`feed::Feed`] snapshot goes in, a [`models::CanonicalFeed`] comes out:
//! stable numeric ids, route colors, cleaned French labels, trusted
//! directions and merged headsigns. Agency-specific tables come from an
//! [`config::AgencyProfile`].

pub mod canon;
pub mod config;
pub mod feed;
pub mod models;
pub mod output;

pub use canon::{CanonicalizeError, Canonicalizer};
pub use config::{AgencyProfile, ConfigError};
pub use feed::{Feed, FeedError};
pub use models::CanonicalFeed;
pub use output::{write_output, OutputError};
