//! Audio decoding, feature extraction, corpus indexing, and similarity
//! search for consonance.
//!
//! The pipeline is: decode a file to mono PCM, reduce it to a
//! fixed-size [`Fingerprint`](consonance_core::Fingerprint), persist
//! fingerprints for a whole directory tree through the cache, then rank
//! cached entries by distance from a query fingerprint on a bounded
//! worker pool.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod audio;
pub mod cancel;
pub mod config;
pub mod error;
pub mod finder;
pub mod indexer;
pub mod open;
pub mod search;

pub use audio::{extract, FeatureConfig};
pub use cancel::CancelToken;
pub use config::Config;
pub use error::{Error, ExtractError, Result};
pub use finder::{Finder, SearchOutcome};
pub use indexer::{index_corpus, IndexOutcome, Progress};
pub use open::open_in_default_player;
pub use search::{SearchHit, SearchOptions};
