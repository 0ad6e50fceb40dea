//! # VerseCache Core
//!
//! Pure primitives for VerseCache: the corpus data model, canonical encoding
//! and content fingerprints.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over the book/chapter/verse hierarchy.
//!
//! ## Key Types
//!
//! - [`Snapshot`] - The full corpus at one point in time, the unit of replacement
//! - [`Book`], [`Chapter`], [`Verse`] - The corpus hierarchy
//! - [`Fingerprint`] - Blake3 digest of a value's canonical encoding
//!
//! ## Canonicalization
//!
//! Fingerprints are computed over deterministic CBOR. See the [`canonical`]
//! module. Two logically identical values always share a fingerprint, no
//! matter the key order or numeric spelling they arrived with.

pub mod canonical;
pub mod error;
pub mod fingerprint;
pub mod types;
pub mod validation;

pub use canonical::{canonical_bytes, from_canonical_bytes};
pub use error::{CoreError, ValidationError};
pub use fingerprint::{fingerprint, Fingerprint, FINGERPRINT_DOMAIN};
pub use types::{Book, BookSummary, Chapter, Snapshot, Verse};
pub use validation::validate_snapshot;
