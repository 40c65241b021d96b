use commons::{BidHash, CustomContractError};
use concordium_std::*;

use crate::commitment;
use crate::external::{AuctionView, BidView, WinningBid};

/// Auction phase, derived from the slot time on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub enum AuctionPhase {
    /// Commitments are accepted.
    Bidding,
    /// Commitments are opened.
    Revealing,
    /// The auction is read-only.
    Closed,
}

/// Bidding and revealing windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Schedule {
    /// Bidding closes and revealing opens.
    pub reveal_start: Timestamp,
    /// Revealing closes.
    pub reveal_finish: Timestamp,
}

impl Schedule {
    /// Validate the windows against the creation time.
    pub fn new(
        reveal_start: Timestamp,
        reveal_finish: Timestamp,
        slot_time: Timestamp,
    ) -> Result<Self, CustomContractError> {
        ensure!(reveal_start > slot_time, CustomContractError::InvalidSchedule);
        ensure!(
            reveal_finish > reveal_start,
            CustomContractError::InvalidSchedule
        );
        Ok(Self {
            reveal_start,
            reveal_finish,
        })
    }

    /// Get auction phase at given slot_time
    pub fn phase(&self, slot_time: Timestamp) -> AuctionPhase {
        if slot_time < self.reveal_start {
            AuctionPhase::Bidding
        } else if slot_time < self.reveal_finish {
            AuctionPhase::Revealing
        } else {
            AuctionPhase::Closed
        }
    }
}

/// Sealed bid of a single bidder.
#[derive(Debug, Clone, Serialize)]
pub struct Bid {
    /// Commitment submitted while bidding.
    pub hash: BidHash,
    /// Disclosed value. `None` until the bid is revealed.
    pub value: Option<Amount>,
}

/// Highest revealed bid so far.
#[derive(Debug, Clone, Copy, Serialize)]
struct Leader {
    bidder: Address,
    hash: BidHash,
    value: Amount,
}

/// The contract state.
#[derive(Serial, DeserialWithState)]
#[concordium(state_parameter = "S")]
pub struct State<S: HasStateApi> {
    /// Item being sold.
    item: Vec<u8>,
    /// Account that created the auction.
    owner: AccountAddress,
    /// Bidding and revealing windows.
    schedule: Schedule,
    /// One sealed bid per bidder.
    bids: StateMap<Address, Bid, S>,
    /// Bidders by insertion index.
    bid_order: StateMap<u32, Address, S>,
    /// Number of distinct bidders.
    bid_count: u32,
    /// Number of successful reveals.
    reveal_count: u32,
    /// Current highest revealer.
    leader: Option<Leader>,
    /// Second highest revealed value, the clearing price.
    second_value: Option<Amount>,
}

impl<S: HasStateApi> State<S> {
    /// Create a new auction with no bids.
    pub fn new(
        state_builder: &mut StateBuilder<S>,
        owner: AccountAddress,
        item: Vec<u8>,
        schedule: Schedule,
    ) -> Self {
        Self {
            item,
            owner,
            schedule,
            bids: state_builder.new_map(),
            bid_order: state_builder.new_map(),
            bid_count: 0,
            reveal_count: 0,
            leader: None,
            second_value: None,
        }
    }

    pub fn bid(
        &mut self,
        bidder: Address,
        hash: BidHash,
        slot_time: Timestamp,
    ) -> Result<(), CustomContractError> {
        ensure_eq!(
            self.schedule.phase(slot_time),
            AuctionPhase::Bidding,
            CustomContractError::WrongPhase
        );

        // Bidding again replaces the commitment, the bidder keeps its place
        if let Some(mut bid) = self.bids.get_mut(&bidder) {
            bid.get_mut().hash = hash;
            return Ok(());
        }

        self.bids.insert(bidder, Bid { hash, value: None });
        self.bid_order.insert(self.bid_count, bidder);
        self.bid_count += 1;

        Ok(())
    }

    pub fn reveal(
        &mut self,
        bidder: Address,
        value: Amount,
        nonce: &[u8],
        slot_time: Timestamp,
    ) -> Result<(), CustomContractError> {
        ensure_eq!(
            self.schedule.phase(slot_time),
            AuctionPhase::Revealing,
            CustomContractError::WrongPhase
        );

        let hash = {
            let mut entry = self
                .bids
                .get_mut(&bidder)
                .ok_or(CustomContractError::UnknownBidder)?;
            let bid = entry.get_mut();

            ensure!(bid.value.is_none(), CustomContractError::AlreadyRevealed);
            ensure!(
                commitment::create_hash(value, nonce) == bid.hash,
                CustomContractError::CommitmentMismatch
            );

            // Open the bid only after all checks
            bid.value = Some(value);
            bid.hash
        };

        self.reveal_count += 1;
        self.record_reveal(bidder, hash, value);

        Ok(())
    }

    /// Update the two highest values in reveal arrival order.
    fn record_reveal(&mut self, bidder: Address, hash: BidHash, value: Amount) {
        let candidate = Leader {
            bidder,
            hash,
            value,
        };

        match self.leader {
            None => self.leader = Some(candidate),
            Some(leader) if value > leader.value => {
                self.second_value = Some(leader.value);
                self.leader = Some(candidate);
            }
            Some(_) => {
                if self.second_value.map_or(true, |second| value > second) {
                    self.second_value = Some(value);
                }
            }
        }
    }

    pub fn phase(&self, slot_time: Timestamp) -> AuctionPhase {
        self.schedule.phase(slot_time)
    }

    pub fn is_open(&self, slot_time: Timestamp) -> bool {
        self.phase(slot_time) == AuctionPhase::Bidding
    }

    pub fn bid_count(&self) -> u32 {
        self.bid_count
    }

    pub fn owner(&self) -> AccountAddress {
        self.owner
    }

    /// Second highest revealed value. Zero while fewer than two bids are revealed.
    pub fn price(&self) -> Amount {
        self.second_value.unwrap_or_else(Amount::zero)
    }

    pub fn winner(&self) -> Option<Address> {
        self.leader.map(|leader| leader.bidder)
    }

    pub fn winning_bid(&self) -> Option<WinningBid> {
        self.leader.map(|leader| WinningBid {
            hash: leader.hash,
            value: leader.value,
        })
    }

    pub fn bid_of(&self, bidder: &Address) -> Option<BidView> {
        self.bids.get(bidder).map(|bid| BidView {
            hash: bid.hash,
            revealed: bid.value.is_some(),
            value: bid.value,
        })
    }

    /// Bidders in the order of their first bid.
    pub fn bidders(&self, skip: u32, show: u32) -> Vec<Address> {
        let end = skip.saturating_add(show).min(self.bid_count);
        (skip..end)
            .filter_map(|index| self.bid_order.get(&index).map(|bidder| *bidder))
            .collect()
    }

    pub fn view(&self, slot_time: Timestamp) -> AuctionView {
        AuctionView {
            item: self.item.clone(),
            owner: self.owner,
            reveal_start: self.schedule.reveal_start,
            reveal_finish: self.schedule.reveal_finish,
            phase: self.phase(slot_time),
            bid_count: self.bid_count,
            reveal_count: self.reveal_count,
            price: self.price(),
            winner: self.winner(),
        }
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_std::test_infrastructure::*;

    const OWNER: AccountAddress = AccountAddress([1; 32]);
    const ALICE: Address = Address::Account(AccountAddress([16; 32]));
    const BOB: Address = Address::Account(AccountAddress([17; 32]));
    const CAROL: Address = Address::Account(AccountAddress([18; 32]));
    const DAVE: Address = Address::Contract(ContractAddress {
        index: 19,
        subindex: 0,
    });

    const CREATED: u64 = 1_000;
    const REVEAL_START: u64 = 2_000;
    const REVEAL_FINISH: u64 = 4_000;

    const NONCE: &[u8] = b"nonce";

    fn time(millis: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(millis)
    }

    fn bidding_time() -> Timestamp {
        time(CREATED + 1)
    }

    fn reveal_time() -> Timestamp {
        time(REVEAL_START)
    }

    fn ccd(micro_ccd: u64) -> Amount {
        Amount::from_micro_ccd(micro_ccd)
    }

    fn hash(value: u64) -> BidHash {
        commitment::create_hash(ccd(value), NONCE)
    }

    fn new_state() -> State<TestStateApi> {
        let mut state_builder = TestStateBuilder::new();
        let schedule = Schedule::new(time(REVEAL_START), time(REVEAL_FINISH), time(CREATED))
            .expect_report("Valid schedule rejected");
        State::new(&mut state_builder, OWNER, b"item".to_vec(), schedule)
    }

    /// State where every bidder committed to its value during bidding.
    fn committed_state(bids: &[(Address, u64)]) -> State<TestStateApi> {
        let mut state = new_state();
        for (bidder, value) in bids {
            let result = state.bid(*bidder, hash(*value), bidding_time());
            claim_eq!(result, Ok(()));
        }
        state
    }

    #[concordium_test]
    fn test_schedule_validation() {
        claim_eq!(
            Schedule::new(time(CREATED), time(REVEAL_FINISH), time(CREATED)),
            Err(CustomContractError::InvalidSchedule),
            "Reveal start must be in the future"
        );
        claim_eq!(
            Schedule::new(time(CREATED - 1), time(REVEAL_FINISH), time(CREATED)),
            Err(CustomContractError::InvalidSchedule),
            "Reveal start in the past"
        );
        claim_eq!(
            Schedule::new(time(REVEAL_START), time(REVEAL_START), time(CREATED)),
            Err(CustomContractError::InvalidSchedule),
            "Reveal finish must be after reveal start"
        );
        claim_eq!(
            Schedule::new(time(REVEAL_START), time(REVEAL_START - 1), time(CREATED)),
            Err(CustomContractError::InvalidSchedule),
            "Reveal finish before reveal start"
        );
        claim!(Schedule::new(time(CREATED + 1), time(CREATED + 2), time(CREATED)).is_ok());
    }

    #[concordium_test]
    fn test_phase_boundaries() {
        let state = new_state();

        claim_eq!(state.phase(time(CREATED)), AuctionPhase::Bidding);
        claim_eq!(state.phase(time(REVEAL_START - 1)), AuctionPhase::Bidding);
        claim_eq!(state.phase(time(REVEAL_START)), AuctionPhase::Revealing);
        claim_eq!(state.phase(time(REVEAL_FINISH - 1)), AuctionPhase::Revealing);
        claim_eq!(state.phase(time(REVEAL_FINISH)), AuctionPhase::Closed);

        claim!(state.is_open(time(REVEAL_START - 1)));
        claim!(!state.is_open(time(REVEAL_START)));
    }

    #[concordium_test]
    fn test_new_state() {
        let state = new_state();

        claim_eq!(state.bid_count(), 0);
        claim!(state.is_open(time(CREATED)));
        claim_eq!(state.owner(), OWNER);
        claim_eq!(state.price(), Amount::zero());
        claim_eq!(state.winner(), None);
        claim_eq!(state.winning_bid(), None);
        claim_eq!(state.bidders(0, 10), Vec::<Address>::new());
    }

    #[concordium_test]
    fn test_rebid_replaces_commitment() {
        let mut state = committed_state(&[(ALICE, 100)]);

        // Same hash again
        claim_eq!(state.bid(ALICE, hash(100), bidding_time()), Ok(()));
        claim_eq!(state.bid_count(), 1);

        // Different hash overwrites the commitment
        claim_eq!(state.bid(ALICE, hash(300), bidding_time()), Ok(()));
        claim_eq!(state.bid_count(), 1);
        claim_eq!(state.bidders(0, 10), vec![ALICE]);

        claim_eq!(
            state.reveal(ALICE, ccd(100), NONCE, reveal_time()),
            Err(CustomContractError::CommitmentMismatch),
            "Old commitment must not be accepted"
        );
        claim_eq!(state.reveal(ALICE, ccd(300), NONCE, reveal_time()), Ok(()));
        claim_eq!(state.winner(), Some(ALICE));
    }

    #[concordium_test]
    fn test_bid_outside_bidding_phase() {
        let mut state = committed_state(&[(ALICE, 100)]);

        claim_eq!(
            state.bid(ALICE, hash(200), time(REVEAL_START)),
            Err(CustomContractError::WrongPhase)
        );
        claim_eq!(
            state.bid(BOB, hash(200), time(REVEAL_FINISH)),
            Err(CustomContractError::WrongPhase)
        );
        claim_eq!(state.bid_count(), 1);
        claim_eq!(state.bid_of(&BOB), None);
    }

    #[concordium_test]
    fn test_reveal_outside_revealing_phase() {
        let mut state = committed_state(&[(ALICE, 100)]);

        claim_eq!(
            state.reveal(ALICE, ccd(100), NONCE, time(REVEAL_START - 1)),
            Err(CustomContractError::WrongPhase)
        );
        claim_eq!(
            state.reveal(ALICE, ccd(100), NONCE, time(REVEAL_FINISH)),
            Err(CustomContractError::WrongPhase)
        );
        claim_eq!(state.winner(), None);
    }

    #[concordium_test]
    fn test_reveal_unknown_bidder() {
        let mut state = committed_state(&[(ALICE, 100)]);

        claim_eq!(
            state.reveal(BOB, ccd(100), NONCE, reveal_time()),
            Err(CustomContractError::UnknownBidder)
        );
    }

    #[concordium_test]
    fn test_reveal_mismatch_keeps_state() {
        let mut state = committed_state(&[(ALICE, 100), (BOB, 200)]);
        claim_eq!(state.reveal(ALICE, ccd(100), NONCE, reveal_time()), Ok(()));

        claim_eq!(
            state.reveal(BOB, ccd(201), NONCE, reveal_time()),
            Err(CustomContractError::CommitmentMismatch)
        );
        claim_eq!(
            state.reveal(BOB, ccd(200), b"wrong", reveal_time()),
            Err(CustomContractError::CommitmentMismatch)
        );

        claim_eq!(state.winner(), Some(ALICE));
        claim_eq!(state.price(), Amount::zero());
        claim_eq!(
            state.bid_of(&BOB),
            Some(BidView {
                hash: hash(200),
                revealed: false,
                value: None,
            })
        );

        // Corrected values are still accepted
        claim_eq!(state.reveal(BOB, ccd(200), NONCE, reveal_time()), Ok(()));
        claim_eq!(state.winner(), Some(BOB));
    }

    #[concordium_test]
    fn test_reveal_twice() {
        let mut state = committed_state(&[(ALICE, 100)]);

        claim_eq!(state.reveal(ALICE, ccd(100), NONCE, reveal_time()), Ok(()));
        claim_eq!(
            state.reveal(ALICE, ccd(100), NONCE, reveal_time()),
            Err(CustomContractError::AlreadyRevealed)
        );
        claim_eq!(state.view(reveal_time()).reveal_count, 1);
    }

    #[concordium_test]
    fn test_single_reveal_price_is_zero() {
        let mut state = committed_state(&[(ALICE, 1000)]);

        claim_eq!(state.reveal(ALICE, ccd(1000), NONCE, reveal_time()), Ok(()));

        claim_eq!(state.winner(), Some(ALICE));
        claim_eq!(
            state.winning_bid(),
            Some(WinningBid {
                hash: hash(1000),
                value: ccd(1000),
            })
        );
        claim_eq!(state.price(), Amount::zero());
    }

    #[concordium_test]
    fn test_second_price_independent_of_reveal_order() {
        let bids: [(Address, u64); 3] = [(ALICE, 1000), (BOB, 2000), (CAROL, 500)];
        let orders: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];

        for order in orders.iter() {
            let mut state = committed_state(&bids);
            for index in order.iter() {
                let (bidder, value) = bids[*index];
                claim_eq!(state.reveal(bidder, ccd(value), NONCE, reveal_time()), Ok(()));
            }

            claim_eq!(state.winner(), Some(BOB));
            claim_eq!(
                state.winning_bid(),
                Some(WinningBid {
                    hash: hash(2000),
                    value: ccd(2000),
                })
            );
            claim_eq!(state.price(), ccd(1000));
        }
    }

    #[concordium_test]
    fn test_tracker_steps() {
        let mut state = committed_state(&[(ALICE, 500), (BOB, 500), (CAROL, 300), (DAVE, 400)]);

        claim_eq!(state.reveal(ALICE, ccd(500), NONCE, reveal_time()), Ok(()));
        claim_eq!(state.price(), Amount::zero());

        // Equal value does not take the lead but sets the price
        claim_eq!(state.reveal(BOB, ccd(500), NONCE, reveal_time()), Ok(()));
        claim_eq!(state.winner(), Some(ALICE));
        claim_eq!(state.price(), ccd(500));

        // Lower values leave the tracker untouched
        claim_eq!(state.reveal(CAROL, ccd(300), NONCE, reveal_time()), Ok(()));
        claim_eq!(state.reveal(DAVE, ccd(400), NONCE, reveal_time()), Ok(()));
        claim_eq!(state.winner(), Some(ALICE));
        claim_eq!(state.price(), ccd(500));
    }

    #[concordium_test]
    fn test_second_value_raised_below_leader() {
        let mut state = committed_state(&[(ALICE, 900), (BOB, 100), (CAROL, 600)]);

        claim_eq!(state.reveal(ALICE, ccd(900), NONCE, reveal_time()), Ok(()));
        claim_eq!(state.reveal(BOB, ccd(100), NONCE, reveal_time()), Ok(()));
        claim_eq!(state.price(), ccd(100));
        claim_eq!(state.reveal(CAROL, ccd(600), NONCE, reveal_time()), Ok(()));
        claim_eq!(state.winner(), Some(ALICE));
        claim_eq!(state.price(), ccd(600));
    }

    #[concordium_test]
    fn test_bidders_paging() {
        let state = committed_state(&[(ALICE, 1), (BOB, 2), (CAROL, 3), (DAVE, 4)]);

        claim_eq!(state.bid_count(), 4);
        claim_eq!(state.bidders(0, 2), vec![ALICE, BOB]);
        claim_eq!(state.bidders(2, 2), vec![CAROL, DAVE]);
        claim_eq!(state.bidders(3, 10), vec![DAVE]);
        claim_eq!(state.bidders(4, 10), Vec::<Address>::new());
        claim_eq!(state.bidders(1, u32::MAX), vec![BOB, CAROL, DAVE]);
    }

    #[concordium_test]
    fn test_view() {
        let mut state = committed_state(&[(ALICE, 1000), (BOB, 2000)]);
        claim_eq!(state.reveal(ALICE, ccd(1000), NONCE, reveal_time()), Ok(()));
        claim_eq!(state.reveal(BOB, ccd(2000), NONCE, reveal_time()), Ok(()));

        claim_eq!(
            state.view(time(REVEAL_FINISH)),
            AuctionView {
                item: b"item".to_vec(),
                owner: OWNER,
                reveal_start: time(REVEAL_START),
                reveal_finish: time(REVEAL_FINISH),
                phase: AuctionPhase::Closed,
                bid_count: 2,
                reveal_count: 2,
                price: ccd(1000),
                winner: Some(BOB),
            }
        );
    }
}
