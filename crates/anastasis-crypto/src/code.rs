use anastasis_core::types::ChallengeCode;

use crate::hash::blake3_32;

/// Hash a challenge code the same way the client does before comparing
/// against the provider's stored value. spec.md §3 invariant: "Challenge
/// codes returned by `verify_challenge_code` are only compared by *hash*
/// of the numeric code; the plaintext code is never stored in the
/// challenge-feedback path."
pub fn hash_challenge_code(code: ChallengeCode) -> [u8; 32] {
    blake3_32(&code.0.to_le_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn different_codes_hash_differently() {
        assert_ne!(
            hash_challenge_code(ChallengeCode::new(1)),
            hash_challenge_code(ChallengeCode::new(2))
        );
    }

    #[test]
    fn same_code_hashes_the_same() {
        assert_eq!(
            hash_challenge_code(ChallengeCode::new(42)),
            hash_challenge_code(ChallengeCode::new(42))
        );
    }
}
