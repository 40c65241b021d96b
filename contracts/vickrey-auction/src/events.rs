use commons::{BidHash, COMMIT_TAG, REVEAL_TAG};
use concordium_std::*;

/// Commit event data.
#[derive(Debug, Serial)]
pub struct CommitEvent<'a> {
    /// Bidder address.
    pub bidder: &'a Address,
    /// Submitted commitment.
    pub hash: &'a BidHash,
}

/// Reveal event data.
#[derive(Debug, Serial)]
pub struct RevealEvent<'a> {
    /// Bidder address.
    pub bidder: &'a Address,
    /// Revealed bid value.
    pub value: Amount,
}

/// Tagged Custom event to be serialized for the event log.
#[derive(Debug)]
pub enum AuctionEvents<'a> {
    Commit(CommitEvent<'a>),
    BidReveal(RevealEvent<'a>),
}

impl<'a> AuctionEvents<'a> {
    pub fn commit(bidder: &'a Address, hash: &'a BidHash) -> Self {
        Self::Commit(CommitEvent { bidder, hash })
    }

    pub fn reveal(bidder: &'a Address, value: Amount) -> Self {
        Self::BidReveal(RevealEvent { bidder, value })
    }
}

impl<'a> Serial for AuctionEvents<'a> {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            AuctionEvents::Commit(event) => {
                out.write_u8(COMMIT_TAG)?;
                event.serial(out)
            }
            AuctionEvents::BidReveal(event) => {
                out.write_u8(REVEAL_TAG)?;
                event.serial(out)
            }
        }
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    #[concordium_test]
    fn test_reveal_event_layout() {
        let bidder = Address::Account(AccountAddress([3; 32]));
        let value = Amount::from_micro_ccd(1000);

        let mut expected = vec![REVEAL_TAG];
        expected.extend(to_bytes(&bidder));
        expected.extend(to_bytes(&value));

        claim_eq!(to_bytes(&AuctionEvents::reveal(&bidder, value)), expected);
    }

    #[concordium_test]
    fn test_commit_event_layout() {
        let bidder = Address::Account(AccountAddress([3; 32]));
        let hash = BidHash([9; 32]);

        let mut expected = vec![COMMIT_TAG];
        expected.extend(to_bytes(&bidder));
        expected.extend_from_slice(&hash.0);

        claim_eq!(to_bytes(&AuctionEvents::commit(&bidder, &hash)), expected);
    }
}
