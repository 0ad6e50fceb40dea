//! # VerseCache Testkit
//!
//! Testing utilities for VerseCache.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known documents with their expected canonical encoding
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Sample corpora and a wired-up memory store and source
//! - **HTTP**: A canned loopback server for exercising the HTTP source
//!
//! ## Golden Vectors
//!
//! Golden vectors pin the canonical encoding that every fingerprint is
//! computed over:
//!
//! ```rust
//! use versecache_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, _, fingerprint) in verify_all_vectors() {
//!     assert!(matches, "{}", name);
//!     println!("{}: {}", name, fingerprint.to_hex());
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use versecache_testkit::generators::SnapshotParams;
//!
//! proptest! {
//!     #[test]
//!     fn fingerprint_is_deterministic(params: SnapshotParams) {
//!         let copy = params.snapshot.clone();
//!         prop_assert_eq!(params.snapshot.fingerprint().unwrap(), copy.fingerprint().unwrap());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust
//! use versecache_testkit::fixtures::{full_corpus, john_snapshot};
//!
//! let corpus = full_corpus();
//! assert_eq!(corpus.len(), 66);
//! let john = john_snapshot("In the beginning...");
//! assert_eq!(john.books()[0].name, "John");
//! ```

pub mod fixtures;
pub mod generators;
pub mod http;
pub mod vectors;

pub use fixtures::{full_corpus, john_snapshot, sample_corpus, TestFixture, FIXTURE_URL};
pub use generators::SnapshotParams;
pub use http::CannedServer;
pub use vectors::{all_vectors, snapshot_from_vector, verify_all_vectors, GoldenVector};
