//! Content fingerprints.
//!
//! A fingerprint is the Blake3 hash of a domain prefix followed by the
//! canonical encoding of a value. It stands in for the value when deciding
//! whether two corpora are equal: the content itself is the version.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::canonical::canonical_bytes;
use crate::error::CoreError;

/// Domain separation prefix for fingerprint hashing.
pub const FINGERPRINT_DOMAIN: &[u8] = b"versecache-fingerprint-v1:";

/// A 32-byte Blake3 content fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Hash already-canonical bytes.
    pub fn of_canonical(canonical: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(FINGERPRINT_DOMAIN);
        hasher.update(canonical);
        Self(*hasher.finalize().as_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string. This is the persisted form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl FromStr for Fingerprint {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for Fingerprint {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Fingerprint {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Fingerprint any serializable value.
///
/// Pure: the same logical content yields the same fingerprint in every
/// process. Fails only when the value has no canonical encoding.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> Result<Fingerprint, CoreError> {
    let bytes = canonical_bytes(value)?;
    Ok(Fingerprint::of_canonical(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Book, Chapter, Snapshot, Verse};
    use proptest::prelude::*;

    fn john(text: &str) -> Snapshot {
        Snapshot::new(vec![Book::new(
            1,
            "John",
            "Jn",
            vec![Chapter::new(1, vec![Verse::new(1, text)])],
        )])
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let snapshot = john("In the beginning...");
        assert_eq!(
            fingerprint(&snapshot).unwrap(),
            fingerprint(&snapshot.clone()).unwrap()
        );
    }

    #[test]
    fn test_fingerprint_changes_with_verse_text() {
        let h1 = john("In the beginning...").fingerprint().unwrap();
        let h2 = john("In the beginning was...").fingerprint().unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_fingerprint_includes_domain() {
        let snapshot = john("x");
        let canonical = canonical_bytes(&snapshot).unwrap();
        let plain = Fingerprint(*blake3::hash(&canonical).as_bytes());
        assert_ne!(snapshot.fingerprint().unwrap(), plain);
    }

    #[test]
    fn test_fingerprint_hex_roundtrip() {
        let fp = Fingerprint::from_bytes([0x42; 32]);
        let hex = fp.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(Fingerprint::from_hex(&hex).unwrap(), fp);
        assert_eq!(hex.parse::<Fingerprint>().unwrap(), fp);
    }

    #[test]
    fn test_fingerprint_from_hex_rejects_short() {
        assert!(Fingerprint::from_hex("abcd").is_err());
    }

    #[test]
    fn test_fingerprint_display() {
        let fp = Fingerprint::from_bytes([0xab; 32]);
        assert_eq!(format!("{}", fp), "abababababababab");
        assert!(format!("{:?}", fp).starts_with("Fingerprint("));
    }

    #[test]
    fn test_empty_snapshot_has_fingerprint() {
        let empty = Snapshot::empty().fingerprint().unwrap();
        assert_ne!(empty, john("x").fingerprint().unwrap());
    }

    proptest! {
        #[test]
        fn test_distinct_texts_distinct_fingerprints(a in ".{0,40}", b in ".{0,40}") {
            prop_assume!(a != b);
            prop_assert_ne!(john(&a).fingerprint().unwrap(), john(&b).fingerprint().unwrap());
        }
    }
}
