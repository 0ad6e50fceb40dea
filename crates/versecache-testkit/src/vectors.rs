//! Golden test vectors for deterministic verification.
//!
//! These vectors pin the canonical encoding of snapshots byte for byte. A
//! change here changes every stored fingerprint, which forces a full
//! re-download on every client.

use versecache_core::{canonical_bytes, Fingerprint, Snapshot};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// The document as published.
    pub json: &'static str,
    /// Expected canonical CBOR encoding (hex).
    pub expected_canonical: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "empty corpus",
            json: "[]",
            expected_canonical: "80",
        },
        GoldenVector {
            name: "John 1:1",
            json: r#"[{"bookId": 1, "name": "John", "chapters": [
                {"chapterNumber": 1, "verses": [{"verseNumber": 1, "text": "In the beginning..."}]}
            ]}]"#,
            expected_canonical: "81a5646e616d65644a6f686e66626f6f6b49640168636861707465727381a2667665727365\
                                 7381a2647465787473496e2074686520626567696e6e696e672e2e2e6b76657273654e756d\
                                 626572016d636861707465724e756d626572016c616262726576696174696f6e606d746f74\
                                 616c436861707465727301",
        },
        GoldenVector {
            name: "John 1:1, legacy field names",
            json: r#"[{"BookID": 1, "BookName": "John", "TotalChapters": 1, "Chapters": [
                {"ChapterNumber": 1, "Verses": [{"VerseNumber": 1, "Text": "In the beginning was..."}]}
            ]}]"#,
            expected_canonical: "81a5646e616d65644a6f686e66626f6f6b49640168636861707465727381a2667665727365\
                                 7381a2647465787477496e2074686520626567696e6e696e67207761732e2e2e6b76657273\
                                 654e756d626572016d636861707465724e756d626572016c616262726576696174696f6e60\
                                 6d746f74616c436861707465727301",
        },
        GoldenVector {
            name: "two books, long verse, advertised chapter count",
            json: r#"[
                {"bookId": 1, "name": "Genesis", "abbreviation": "Gen", "chapters": [
                    {"chapterNumber": 1, "verses": [
                        {"verseNumber": 1, "text": "In the beginning God created the heaven and the earth."},
                        {"verseNumber": 2, "text": "And the earth was without form"}
                    ]}
                ]},
                {"bookId": 2, "name": "Exodus", "abbreviation": "Exod", "totalChapters": 40, "chapters": []}
            ]"#,
            expected_canonical: "82a5646e616d656747656e6573697366626f6f6b49640168636861707465727381a26676\
                                 657273657382a264746578747836496e2074686520626567696e6e696e6720476f642063\
                                 726561746564207468652068656176656e20616e64207468652065617274682e6b766572\
                                 73654e756d62657201a26474657874781e416e64207468652065617274682077617320776974\
                                 686f757420666f726d6b76657273654e756d626572026d636861707465724e756d626572016c\
                                 616262726576696174696f6e6347656e6d746f74616c436861707465727301a5646e616d6566\
                                 45786f64757366626f6f6b496402686368617074657273806c61626272657669617469\
                                 6f6e6445786f646d746f74616c43686170746572731828",
        },
    ]
}

/// Parse a vector's document.
pub fn snapshot_from_vector(vector: &GoldenVector) -> Snapshot {
    serde_json::from_str(vector.json).expect("golden vector JSON is a snapshot")
}

/// Verify all golden vectors.
///
/// Returns `(name, matches, actual canonical hex, fingerprint)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String, Fingerprint)> {
    all_vectors()
        .iter()
        .map(|v| {
            let snapshot = snapshot_from_vector(v);
            let bytes = canonical_bytes(&snapshot).expect("golden vector encodes");
            let actual = hex::encode(&bytes);

            (
                v.name.to_string(),
                actual == v.expected_canonical,
                actual,
                Fingerprint::of_canonical(&bytes),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, actual, _) in verify_all_vectors() {
            assert!(matches, "Vector '{}' encoded as {}", name, actual);
        }
    }

    #[test]
    fn test_vector_fingerprints_distinct() {
        let results = verify_all_vectors();
        for (i, a) in results.iter().enumerate() {
            for b in &results[i + 1..] {
                assert_ne!(a.3, b.3, "'{}' and '{}' share a fingerprint", a.0, b.0);
            }
        }
    }

    #[test]
    fn test_fingerprint_is_hash_of_canonical_bytes() {
        for vector in all_vectors() {
            let snapshot = snapshot_from_vector(&vector);
            let expected = Fingerprint::of_canonical(&hex::decode(vector.expected_canonical).unwrap());
            assert_eq!(snapshot.fingerprint().unwrap(), expected, "{}", vector.name);
        }
    }
}
