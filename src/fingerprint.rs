//! Content fingerprinting over canonical table text.

use alloy::primitives::FixedBytes;
use data_encoding::BASE32_NOPAD;
use sha2::{Digest, Sha256};

use crate::error::AttestError;
use crate::normalize::CanonicalTable;

/// Length of the encoded fingerprint in characters.
///
/// A 32-byte digest encodes to 52 base32 characters; keeping the first 31
/// retains 155 bits of the digest. That is far beyond accidental-collision
/// territory but BELOW the full 256-bit preimage strength, which is the
/// accepted trade-off for a fingerprint that fits a single `bytes32` slot as
/// readable ASCII. Changing this constant changes every published
/// fingerprint, so it is part of the wire contract, not a tuning knob.
pub const FINGERPRINT_LEN: usize = 31;

/// Width of the on-chain slot the encoded fingerprint is packed into.
pub const BYTES32_LEN: usize = 32;

/// A content fingerprint: the SHA-256 digest of canonical table text plus its
/// truncated base32 rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    digest: [u8; 32],
    encoded: String,
}

impl Fingerprint {
    /// Full untruncated digest.
    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    /// The 31-character identifier. Uppercase RFC 4648 base32 (`A-Z2-7`),
    /// no padding.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// Pack the encoded identifier into a `bytes32` slot, ASCII bytes first,
    /// zero-filled to the right.
    pub fn to_bytes32(&self) -> FixedBytes<32> {
        let mut slot = [0u8; BYTES32_LEN];
        slot[..self.encoded.len()].copy_from_slice(self.encoded.as_bytes());
        FixedBytes::from(slot)
    }
}

/// Derive the fingerprint of a normalized table.
///
/// Same canonical text, same fingerprint, on any machine at any time. An
/// empty table has no content to identify and is rejected.
pub fn fingerprint(table: &CanonicalTable) -> Result<Fingerprint, AttestError> {
    let text = table.text();
    if text.is_empty() {
        return Err(AttestError::EmptyInput);
    }

    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest: [u8; 32] = hasher.finalize().into();

    // 52 base32 characters for a 32-byte digest; the slice cannot be short.
    let full = BASE32_NOPAD.encode(&digest);
    let encoded = full[..FINGERPRINT_LEN].to_string();

    Ok(Fingerprint { digest, encoded })
}

/// Pack arbitrary text into a `bytes32` slot, zero-filled to the right.
/// Text longer than the slot is an error, never silently truncated.
pub fn pack_bytes32(text: &str) -> Result<FixedBytes<32>, AttestError> {
    let bytes = text.as_bytes();
    if bytes.len() > BYTES32_LEN {
        return Err(AttestError::SizeExceeded {
            len: bytes.len(),
            limit: BYTES32_LEN,
        });
    }
    let mut slot = [0u8; BYTES32_LEN];
    slot[..bytes.len()].copy_from_slice(bytes);
    Ok(FixedBytes::from(slot))
}

/// Recover the text packed into a `bytes32` slot, dropping the zero fill.
/// Non-UTF-8 residue is replaced rather than failing; this is a display
/// helper for data that may not have been written by this crate.
pub fn unpack_bytes32(slot: &FixedBytes<32>) -> String {
    let end = slot
        .iter()
        .rposition(|&b| b != 0)
        .map(|i| i + 1)
        .unwrap_or(0);
    String::from_utf8_lossy(&slot[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawUpload;
    use crate::normalize::normalize;

    fn table(bytes: &[u8]) -> CanonicalTable {
        normalize(&RawUpload::new("dataset.csv", bytes.to_vec())).unwrap()
    }

    #[test]
    fn test_known_fingerprint() {
        // SHA-256("a,b\n1,2\n3,4\n5,6\n"), base32, first 31 characters.
        let fp = fingerprint(&table(b"a,b\n1,2\n3,4\n5,6\n")).unwrap();
        assert_eq!(fp.encoded(), "4A3PRCFUBVUDMLP2DMBMUAQ6QHIT3FL");
        assert_eq!(
            hex::encode(fp.digest()),
            "e036f888b40d68362dfa1b02ca021e81d13d957874bba3bfd8fdf14c02bbaba7"
        );
    }

    #[test]
    fn test_fingerprint_length_and_alphabet() {
        let fp = fingerprint(&table(b"x,y\n")).unwrap();
        assert_eq!(fp.encoded().len(), FINGERPRINT_LEN);
        assert!(fp
            .encoded()
            .chars()
            .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c)));
        assert_eq!(fp.encoded(), "TRSTNU4PUN62LD5MAZRUE5D6NUQP3LH");
    }

    #[test]
    fn test_same_content_same_fingerprint() {
        let a = fingerprint(&table(b"a,b\n1,2\n")).unwrap();
        let b = fingerprint(&table(b"a,b\r\n1,2")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_content_different_fingerprint() {
        let a = fingerprint(&table(b"a,b\n1,2\n")).unwrap();
        let b = fingerprint(&table(b"a,b\n1,3\n")).unwrap();
        assert_ne!(a.encoded(), b.encoded());
    }

    #[test]
    fn test_empty_table_is_rejected() {
        let err = fingerprint(&table(b"")).unwrap_err();
        assert!(matches!(err, AttestError::EmptyInput));
    }

    #[test]
    fn test_bytes32_round_trip() {
        let fp = fingerprint(&table(b"a,b\n1,2\n")).unwrap();
        let slot = fp.to_bytes32();
        assert_eq!(slot[FINGERPRINT_LEN], 0);
        assert_eq!(unpack_bytes32(&slot), fp.encoded());
    }

    #[test]
    fn test_pack_rejects_oversized_text() {
        let err = pack_bytes32(&"A".repeat(33)).unwrap_err();
        assert!(matches!(
            err,
            AttestError::SizeExceeded { len: 33, limit: 32 }
        ));
    }

    #[test]
    fn test_pack_accepts_exact_fit() {
        let slot = pack_bytes32(&"B".repeat(32)).unwrap();
        assert_eq!(unpack_bytes32(&slot), "B".repeat(32));
    }
}
