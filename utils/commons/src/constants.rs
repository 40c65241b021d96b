/// Tag for the Commit event of the Vickrey auction.
pub const COMMIT_TAG: u8 = u8::MAX - 23;

/// Tag for the BidReveal event of the Vickrey auction.
pub const REVEAL_TAG: u8 = u8::MAX - 24;

/// Length of a Keccak-256 commitment digest in bytes.
pub const BID_HASH_LENGTH: usize = 32;
