use super::*;

pub type ContractResult<A> = Result<A, CustomContractError>;

/// Keccak-256 digest binding a bidder to a bid value and a secret nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BidHash(pub [u8; BID_HASH_LENGTH]);

impl From<[u8; BID_HASH_LENGTH]> for BidHash {
    fn from(bytes: [u8; BID_HASH_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for BidHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serial for BidHash {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        out.write_all(&self.0)
    }
}

impl Deserial for BidHash {
    fn deserial<R: Read>(source: &mut R) -> ParseResult<Self> {
        let mut bytes = [0u8; BID_HASH_LENGTH];
        source.read_exact(&mut bytes)?;
        Ok(Self(bytes))
    }
}

impl schema::SchemaType for BidHash {
    fn get_type() -> schema::Type {
        schema::Type::Array(BID_HASH_LENGTH as u32, Box::new(schema::Type::U8))
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    #[concordium_test]
    fn test_bid_hash_is_serialized_without_length_prefix() {
        let hash = BidHash([7; BID_HASH_LENGTH]);
        let bytes = to_bytes(&hash);

        claim_eq!(bytes.len(), BID_HASH_LENGTH);
        claim_eq!(from_bytes::<BidHash>(&bytes), Ok(hash));
    }

    #[concordium_test]
    fn test_bid_hash_rejects_short_input() {
        let bytes = [1u8; BID_HASH_LENGTH - 1];
        claim!(from_bytes::<BidHash>(&bytes).is_err());
    }
}
