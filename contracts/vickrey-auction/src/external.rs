use commons::BidHash;
use concordium_std::*;

use crate::state::AuctionPhase;

#[derive(Debug, Clone, SchemaType, Serialize)]
pub struct InitParams {
    /// Opaque identifier of the item being sold.
    pub item: Vec<u8>,
    /// Bidding closes and revealing opens at this time.
    pub reveal_start: Timestamp,
    /// Revealing closes at this time.
    pub reveal_finish: Timestamp,
}

/// Bid value together with the nonce it was committed with. Parameter of both
/// `createHash` and `reveal`.
#[derive(Debug, Clone, SchemaType, Serialize)]
pub struct BidOpening {
    pub value: Amount,
    pub nonce: Vec<u8>,
}

#[derive(Debug, Clone, SchemaType, Serialize)]
pub struct ViewBiddersParams {
    pub skip: u32,
    pub show: u32,
}

/// Commitment and revealed value of the current highest revealer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, SchemaType, Serialize)]
pub struct WinningBid {
    pub hash: BidHash,
    pub value: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, SchemaType, Serialize)]
pub struct BidView {
    pub hash: BidHash,
    pub revealed: bool,
    /// Present once the bid is revealed.
    pub value: Option<Amount>,
}

#[derive(Debug, Clone, PartialEq, Eq, SchemaType, Serialize)]
pub struct AuctionView {
    pub item: Vec<u8>,
    pub owner: AccountAddress,
    pub reveal_start: Timestamp,
    pub reveal_finish: Timestamp,
    pub phase: AuctionPhase,
    pub bid_count: u32,
    pub reveal_count: u32,
    pub price: Amount,
    pub winner: Option<Address>,
}
