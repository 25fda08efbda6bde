//! Core domain model for consonance.
//!
//! This crate defines the audio fingerprint model, the on-disk
//! fingerprint cache, and the path portability layer that keeps a
//! cache usable after its corpus has been relocated.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod cache;
pub mod error;
pub mod fingerprint;
pub mod remap;

pub use cache::{FingerprintCache, FingerprintMap};
pub use error::{Error, Result};
pub use fingerprint::Fingerprint;
pub use remap::{remap_path, MappingStore, PathMapping};
