use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of hex characters kept from the SHA-256 digest.
pub const DIGEST_LEN: usize = 6;

/// Predecessor reference carried by the genesis record.
pub const GENESIS_PREDECESSOR: &str = "0";

/// Short hex tag identifying a record's content.
pub type RecordHash = String;

/// One entry in the chain.
///
/// `hash` is stored, not derived on read: tampering overwrites it and repair
/// recomputes it, so it can drift from [`Record::compute_hash`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    pub index: usize,
    pub payload: String,
    pub predecessor_hash: RecordHash,
    pub hash: RecordHash,
}

impl Record {
    /// Create a record; the hash is computed immediately.
    pub fn new(index: usize, payload: String, predecessor_hash: RecordHash) -> Self {
        let hash = digest(index, &payload, &predecessor_hash);
        Self {
            index,
            payload,
            predecessor_hash,
            hash,
        }
    }

    /// Digest of the record's current fields.
    pub fn compute_hash(&self) -> RecordHash {
        digest(self.index, &self.payload, &self.predecessor_hash)
    }

    /// Whether the stored hash matches the current fields. Says nothing about
    /// the link to the predecessor.
    pub fn verify(&self) -> bool {
        self.compute_hash() == self.hash
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 1
    }
}

/// Truncated SHA-256 of `index ++ payload ++ predecessor_hash`.
pub fn digest(index: usize, payload: &str, predecessor_hash: &str) -> RecordHash {
    let mut hasher = Sha256::new();
    hasher.update(index.to_string().as_bytes());
    hasher.update(payload.as_bytes());
    hasher.update(predecessor_hash.as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(DIGEST_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_genesis_digest() {
        let r = Record::new(1, "Genesis Block".into(), GENESIS_PREDECESSOR.into());
        assert_eq!(r.hash, "8a4499");
        assert_eq!(r.hash.len(), DIGEST_LEN);
        assert!(r.is_genesis());
    }

    #[test]
    fn digest_covers_all_fields() {
        let base = digest(2, "payload", "abc123");
        assert_ne!(base, digest(3, "payload", "abc123"));
        assert_ne!(base, digest(2, "payloaD", "abc123"));
        assert_ne!(base, digest(2, "payload", "abc124"));
    }

    #[test]
    fn compute_hash_is_idempotent() {
        let r = Record::new(4, "C to D: 10 units".into(), "a890f9".into());
        assert_eq!(r.compute_hash(), r.compute_hash());
        assert_eq!(r.compute_hash(), "18f426");
    }

    #[test]
    fn tampered_payload_fails_verify() {
        let mut r = Record::new(2, "original".into(), "8a4499".into());
        assert!(r.verify());
        r.payload = "tampered".into();
        assert!(!r.verify());
    }

    #[test]
    fn overwritten_hash_fails_verify() {
        let mut r = Record::new(2, "original".into(), "8a4499".into());
        r.hash = "XXXXX".into();
        assert!(!r.verify());
    }
}
