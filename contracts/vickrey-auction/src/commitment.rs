use commons::BidHash;
use concordium_std::*;
use sha3::{Digest, Keccak256};

/// Commitment of a sealed bid: `keccak256(value || nonce)`.
///
/// The value is hashed as its micro CCD amount in little-endian byte order,
/// which is the same encoding `concordium-std` serializes an `Amount` with, so
/// a bidder can recompute the commitment off-chain before calling `bid`.
pub fn create_hash(value: Amount, nonce: &[u8]) -> BidHash {
    let mut hasher = Keccak256::default();
    hasher.update(value.micro_ccd.to_le_bytes());
    hasher.update(nonce);
    BidHash(hasher.finalize().into())
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    const NONCE: &[u8] = b"secret";

    #[concordium_test]
    fn test_create_hash_known_digest() {
        let expected = [
            234, 246, 98, 82, 98, 59, 255, 215, 174, 152, 10, 55, 178, 37, 181, 118, 182, 143, 11,
            138, 87, 62, 80, 126, 179, 68, 39, 202, 239, 49, 49, 186,
        ];
        claim_eq!(
            create_hash(Amount::from_micro_ccd(1000), NONCE),
            BidHash(expected)
        );
    }

    #[concordium_test]
    fn test_create_hash_is_deterministic() {
        let value = Amount::from_micro_ccd(2000);
        claim_eq!(create_hash(value, NONCE), create_hash(value, NONCE));
    }

    #[concordium_test]
    fn test_create_hash_depends_on_value_and_nonce() {
        let base = create_hash(Amount::from_micro_ccd(1000), NONCE);

        claim_ne!(base, create_hash(Amount::from_micro_ccd(2000), NONCE));
        claim_ne!(base, create_hash(Amount::from_micro_ccd(1000), b"other"));
        claim_ne!(base, create_hash(Amount::from_micro_ccd(1000), &[]));
    }
}
