use sha2::{Digest, Sha512};

/// BLAKE3 hash of arbitrary bytes, truncated to 32 bytes. Used for the
/// debit-IBAN hash carried in the database event header (spec.md §6) and
/// for internal lookup keys.
pub fn blake3_32(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// SHA-512 of arbitrary bytes. `recovery_data_hash` is specified in
/// spec.md §3 as "SHA-512 of recovery_data".
pub fn sha512(data: &[u8]) -> [u8; 64] {
    let mut hasher = Sha512::new();
    hasher.update(data);
    let out = hasher.finalize();
    let mut arr = [0u8; 64];
    arr.copy_from_slice(&out);
    arr
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha512_is_deterministic() {
        assert_eq!(sha512(b"hello"), sha512(b"hello"));
        assert_ne!(sha512(b"hello"), sha512(b"world"));
    }

    #[test]
    fn blake3_32_is_32_bytes_and_deterministic() {
        let a = blake3_32(b"iban-123");
        let b = blake3_32(b"iban-123");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }
}
