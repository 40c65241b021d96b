use commons::{BidHash, ContractResult};
use concordium_std::*;

use crate::commitment;
use crate::events::AuctionEvents;
use crate::external::*;
use crate::state::{AuctionPhase, Schedule, State};

/// Initialize the auction with no bids.
///
/// It rejects if:
/// - Fails to parse parameter;
/// - `reveal_start` is not after the current slot time;
/// - `reveal_finish` is not after `reveal_start`.
#[init(contract = "VickreyAuction", parameter = "InitParams")]
fn init<S: HasStateApi>(
    ctx: &impl HasInitContext,
    state_builder: &mut StateBuilder<S>,
) -> InitResult<State<S>> {
    let params = InitParams::deserial(&mut ctx.parameter_cursor())?;
    let schedule = Schedule::new(
        params.reveal_start,
        params.reveal_finish,
        ctx.metadata().slot_time(),
    )?;

    Ok(State::new(
        state_builder,
        ctx.init_origin(),
        params.item,
        schedule,
    ))
}

/// Function to commit to a sealed bid. Calling it again before the reveal
/// window opens replaces the commitment.
///
/// It rejects if:
/// - Fails to parse parameter;
/// - Bidding is closed;
/// - Fails to log `Commit` event.
#[receive(
    mutable,
    contract = "VickreyAuction",
    name = "bid",
    parameter = "BidHash",
    enable_logger
)]
fn bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let hash = BidHash::deserial(&mut ctx.parameter_cursor())?;
    let bidder = ctx.sender();

    host.state_mut()
        .bid(bidder, hash, ctx.metadata().slot_time())?;

    logger.log(&AuctionEvents::commit(&bidder, &hash))?;

    Ok(())
}

/// Function to open a sealed bid.
///
/// It rejects if:
/// - Fails to parse parameter;
/// - Called outside of the reveal window;
/// - Sender never placed a bid;
/// - Sender already revealed the bid;
/// - Value and nonce do not match the commitment;
/// - Fails to log `BidReveal` event.
#[receive(
    mutable,
    contract = "VickreyAuction",
    name = "reveal",
    parameter = "BidOpening",
    enable_logger
)]
fn reveal<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let params = BidOpening::deserial(&mut ctx.parameter_cursor())?;
    let bidder = ctx.sender();

    host.state_mut().reveal(
        bidder,
        params.value,
        &params.nonce,
        ctx.metadata().slot_time(),
    )?;

    // Event is logged only once the bid is opened and the winner updated
    logger.log(&AuctionEvents::reveal(&bidder, params.value))?;

    Ok(())
}

/// Function to compute the commitment for a bid value and a nonce.
#[receive(
    contract = "VickreyAuction",
    name = "createHash",
    parameter = "BidOpening",
    return_value = "BidHash"
)]
fn create_hash<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    _host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<BidHash> {
    let params = BidOpening::deserial(&mut ctx.parameter_cursor())?;
    Ok(commitment::create_hash(params.value, &params.nonce))
}

#[receive(contract = "VickreyAuction", name = "bidCount", return_value = "u32")]
fn bid_count<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<u32> {
    Ok(host.state().bid_count())
}

/// Whether bids are still accepted.
#[receive(contract = "VickreyAuction", name = "isOpen", return_value = "bool")]
fn is_open<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<bool> {
    Ok(host.state().is_open(ctx.metadata().slot_time()))
}

#[receive(
    contract = "VickreyAuction",
    name = "owner",
    return_value = "AccountAddress"
)]
fn owner<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<AccountAddress> {
    Ok(host.state().owner())
}

/// Clearing price: the second highest revealed value, zero until two bids are
/// revealed.
#[receive(contract = "VickreyAuction", name = "price", return_value = "Amount")]
fn price<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<Amount> {
    Ok(host.state().price())
}

#[receive(
    contract = "VickreyAuction",
    name = "winner",
    return_value = "Option<Address>"
)]
fn winner<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<Option<Address>> {
    Ok(host.state().winner())
}

#[receive(
    contract = "VickreyAuction",
    name = "getWinningBid",
    return_value = "Option<WinningBid>"
)]
fn get_winning_bid<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<Option<WinningBid>> {
    Ok(host.state().winning_bid())
}

#[receive(
    contract = "VickreyAuction",
    name = "phase",
    return_value = "AuctionPhase"
)]
fn phase<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<AuctionPhase> {
    Ok(host.state().phase(ctx.metadata().slot_time()))
}

/// Function to view the auction summary at the current slot time.
#[receive(
    contract = "VickreyAuction",
    name = "viewAuction",
    return_value = "AuctionView"
)]
fn view_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<AuctionView> {
    Ok(host.state().view(ctx.metadata().slot_time()))
}

/// Function to view the sealed bid of a single bidder.
///
/// It rejects if:
/// - Fails to parse parameter.
#[receive(
    contract = "VickreyAuction",
    name = "viewBid",
    parameter = "Address",
    return_value = "Option<BidView>"
)]
fn view_bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<Option<BidView>> {
    let bidder = Address::deserial(&mut ctx.parameter_cursor())?;
    Ok(host.state().bid_of(&bidder))
}

/// Function to list bidders in the order they first bid.
///
/// It rejects if:
/// - Fails to parse parameter.
#[receive(
    contract = "VickreyAuction",
    name = "viewBidders",
    parameter = "ViewBiddersParams",
    return_value = "Vec<Address>"
)]
fn view_bidders<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<Vec<Address>> {
    let params = ViewBiddersParams::deserial(&mut ctx.parameter_cursor())?;
    Ok(host.state().bidders(params.skip, params.show))
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use commons::CustomContractError;
    use concordium_std::test_infrastructure::*;

    const OWNER: AccountAddress = AccountAddress([1; 32]);
    const BIDDER_1: AccountAddress = AccountAddress([16; 32]);
    const BIDDER_2: AccountAddress = AccountAddress([17; 32]);
    const BIDDER_3: AccountAddress = AccountAddress([18; 32]);
    const NON_BIDDER: AccountAddress = AccountAddress([19; 32]);

    const ITEM: &[u8] = b"12345123451234512345";
    const NONCE: &[u8] = b"bidder nonce";

    const CREATED: u64 = 10_000;
    const REVEAL_START: u64 = 12_000;
    const REVEAL_FINISH: u64 = 14_000;

    fn time(millis: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(millis)
    }

    fn bidding_time() -> Timestamp {
        time(CREATED)
    }

    fn reveal_time() -> Timestamp {
        time(REVEAL_START + 1)
    }

    fn closed_time() -> Timestamp {
        time(REVEAL_FINISH)
    }

    fn init_params(reveal_start: u64, reveal_finish: u64) -> InitParams {
        InitParams {
            item: ITEM.to_vec(),
            reveal_start: time(reveal_start),
            reveal_finish: time(reveal_finish),
        }
    }

    fn opening(value: u64) -> BidOpening {
        BidOpening {
            value: Amount::from_micro_ccd(value),
            nonce: NONCE.to_vec(),
        }
    }

    fn commitment_of(value: u64) -> BidHash {
        commitment::create_hash(Amount::from_micro_ccd(value), NONCE)
    }

    fn try_init(params: &InitParams) -> InitResult<State<TestStateApi>> {
        let bytes = to_bytes(params);
        let mut ctx = TestInitContext::empty();
        ctx.set_init_origin(OWNER)
            .set_parameter(&bytes)
            .set_metadata_slot_time(time(CREATED));
        let mut state_builder = TestStateBuilder::new();
        init(&ctx, &mut state_builder)
    }

    fn default_host() -> TestHost<State<TestStateApi>> {
        let bytes = to_bytes(&init_params(REVEAL_START, REVEAL_FINISH));
        let mut ctx = TestInitContext::empty();
        ctx.set_init_origin(OWNER)
            .set_parameter(&bytes)
            .set_metadata_slot_time(time(CREATED));
        let mut state_builder = TestStateBuilder::new();

        let state =
            init(&ctx, &mut state_builder).expect_report("Failed during init_VickreyAuction");

        TestHost::new(state, state_builder)
    }

    fn call_bid(
        host: &mut TestHost<State<TestStateApi>>,
        logger: &mut TestLogger,
        sender: AccountAddress,
        hash: BidHash,
        slot_time: Timestamp,
    ) -> ContractResult<()> {
        let bytes = to_bytes(&hash);
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(sender))
            .set_parameter(&bytes)
            .set_metadata_slot_time(slot_time);
        bid(&ctx, host, logger)
    }

    fn call_reveal(
        host: &mut TestHost<State<TestStateApi>>,
        logger: &mut TestLogger,
        sender: AccountAddress,
        params: &BidOpening,
        slot_time: Timestamp,
    ) -> ContractResult<()> {
        let bytes = to_bytes(params);
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(sender))
            .set_parameter(&bytes)
            .set_metadata_slot_time(slot_time);
        reveal(&ctx, host, logger)
    }

    fn view_ctx<'a>(slot_time: Timestamp) -> TestReceiveContext<'a> {
        let mut ctx = TestReceiveContext::empty();
        ctx.set_metadata_slot_time(slot_time);
        ctx
    }

    #[concordium_test]
    fn test_init() {
        let host = default_host();
        let ctx = view_ctx(bidding_time());

        claim_eq!(bid_count(&ctx, &host), Ok(0));
        claim_eq!(is_open(&ctx, &host), Ok(true));
        claim_eq!(owner(&ctx, &host), Ok(OWNER));
        claim_eq!(price(&ctx, &host), Ok(Amount::zero()));
        claim_eq!(winner(&ctx, &host), Ok(None));
        claim_eq!(get_winning_bid(&ctx, &host), Ok(None));
        claim_eq!(phase(&ctx, &host), Ok(AuctionPhase::Bidding));
    }

    #[concordium_test]
    fn test_init_rejects_start_in_past() {
        let result = try_init(&init_params(CREATED - 1, REVEAL_FINISH));
        claim_eq!(
            result.err(),
            Some(CustomContractError::InvalidSchedule.into())
        );

        let result = try_init(&init_params(CREATED, REVEAL_FINISH));
        claim_eq!(
            result.err(),
            Some(CustomContractError::InvalidSchedule.into())
        );
    }

    #[concordium_test]
    fn test_init_rejects_finish_not_after_start() {
        let result = try_init(&init_params(REVEAL_START, REVEAL_START));
        claim_eq!(
            result.err(),
            Some(CustomContractError::InvalidSchedule.into())
        );
    }

    #[concordium_test]
    fn test_init_rejects_malformed_parameter() {
        let bytes = [0u8; 3];
        let mut ctx = TestInitContext::empty();
        ctx.set_init_origin(OWNER)
            .set_parameter(&bytes)
            .set_metadata_slot_time(time(CREATED));
        let mut state_builder = TestStateBuilder::new();

        let result = init(&ctx, &mut state_builder);
        claim!(result.is_err());
    }

    #[concordium_test]
    fn test_create_hash() {
        let host = default_host();
        let bytes = to_bytes(&opening(1000));
        let mut ctx = view_ctx(bidding_time());
        ctx.set_parameter(&bytes);

        let first = create_hash(&ctx, &host).expect_report("Failed to call createHash");
        let second = create_hash(&ctx, &host).expect_report("Failed to call createHash");

        claim_eq!(first, second);
        claim_eq!(first, commitment_of(1000));
        claim_ne!(first, commitment_of(1001));
    }

    #[concordium_test]
    fn test_bid_logs_commit() {
        let mut host = default_host();
        let mut logger = TestLogger::init();

        let result = call_bid(
            &mut host,
            &mut logger,
            BIDDER_1,
            commitment_of(1000),
            bidding_time(),
        );
        claim_eq!(result, Ok(()));

        claim_eq!(logger.logs.len(), 1, "Only one event should be logged");
        claim_eq!(
            logger.logs[0],
            to_bytes(&AuctionEvents::commit(
                &Address::Account(BIDDER_1),
                &commitment_of(1000)
            ))
        );
        claim_eq!(host.state().bid_count(), 1);
    }

    #[concordium_test]
    fn test_rebid_keeps_count() {
        let mut host = default_host();
        let mut logger = TestLogger::init();

        for _ in 0..2 {
            let result = call_bid(
                &mut host,
                &mut logger,
                BIDDER_1,
                commitment_of(1000),
                bidding_time(),
            );
            claim_eq!(result, Ok(()));
        }
        claim_eq!(bid_count(&view_ctx(bidding_time()), &host), Ok(1));

        let result = call_reveal(
            &mut host,
            &mut logger,
            BIDDER_1,
            &opening(1000),
            reveal_time(),
        );
        claim_eq!(result, Ok(()));
        claim_eq!(host.state().winner(), Some(Address::Account(BIDDER_1)));
    }

    #[concordium_test]
    fn test_bid_after_reveal_start() {
        let mut host = default_host();
        let mut logger = TestLogger::init();

        let result = call_bid(
            &mut host,
            &mut logger,
            BIDDER_1,
            commitment_of(1000),
            bidding_time(),
        );
        claim_eq!(result, Ok(()));

        for slot_time in [time(REVEAL_START), reveal_time(), closed_time()].iter() {
            let result = call_bid(
                &mut host,
                &mut logger,
                BIDDER_1,
                commitment_of(2000),
                *slot_time,
            );
            claim_eq!(result, Err(CustomContractError::WrongPhase));

            let result = call_bid(
                &mut host,
                &mut logger,
                BIDDER_2,
                commitment_of(2000),
                *slot_time,
            );
            claim_eq!(result, Err(CustomContractError::WrongPhase));
        }

        claim_eq!(logger.logs.len(), 1);
        claim_eq!(host.state().bid_count(), 1);
    }

    #[concordium_test]
    fn test_reveal_outside_window() {
        let mut host = default_host();
        let mut logger = TestLogger::init();

        let result = call_bid(
            &mut host,
            &mut logger,
            BIDDER_1,
            commitment_of(1000),
            bidding_time(),
        );
        claim_eq!(result, Ok(()));

        let result = call_reveal(
            &mut host,
            &mut logger,
            BIDDER_1,
            &opening(1000),
            time(REVEAL_START - 1),
        );
        claim_eq!(result, Err(CustomContractError::WrongPhase));

        let result = call_reveal(
            &mut host,
            &mut logger,
            BIDDER_1,
            &opening(1000),
            closed_time(),
        );
        claim_eq!(result, Err(CustomContractError::WrongPhase));

        claim_eq!(logger.logs.len(), 1, "Only the commit should be logged");
    }

    #[concordium_test]
    fn test_reveal_mismatch() {
        let mut host = default_host();
        let mut logger = TestLogger::init();

        let result = call_bid(
            &mut host,
            &mut logger,
            BIDDER_1,
            commitment_of(1000),
            bidding_time(),
        );
        claim_eq!(result, Ok(()));

        let result = call_reveal(
            &mut host,
            &mut logger,
            BIDDER_1,
            &opening(999),
            reveal_time(),
        );
        claim_eq!(result, Err(CustomContractError::CommitmentMismatch));

        let ctx = view_ctx(reveal_time());
        claim_eq!(winner(&ctx, &host), Ok(None));
        claim_eq!(price(&ctx, &host), Ok(Amount::zero()));

        let bytes = to_bytes(&Address::Account(BIDDER_1));
        let mut ctx = view_ctx(reveal_time());
        ctx.set_parameter(&bytes);
        claim_eq!(
            view_bid(&ctx, &host),
            Ok(Some(BidView {
                hash: commitment_of(1000),
                revealed: false,
                value: None,
            }))
        );
    }

    #[concordium_test]
    fn test_reveal_twice() {
        let mut host = default_host();
        let mut logger = TestLogger::init();

        let result = call_bid(
            &mut host,
            &mut logger,
            BIDDER_1,
            commitment_of(1000),
            bidding_time(),
        );
        claim_eq!(result, Ok(()));

        let result = call_reveal(
            &mut host,
            &mut logger,
            BIDDER_1,
            &opening(1000),
            reveal_time(),
        );
        claim_eq!(result, Ok(()));

        let result = call_reveal(
            &mut host,
            &mut logger,
            BIDDER_1,
            &opening(1000),
            reveal_time(),
        );
        claim_eq!(result, Err(CustomContractError::AlreadyRevealed));
    }

    #[concordium_test]
    fn test_reveal_without_bid() {
        let mut host = default_host();
        let mut logger = TestLogger::init();

        let result = call_reveal(
            &mut host,
            &mut logger,
            NON_BIDDER,
            &opening(1000),
            reveal_time(),
        );
        claim_eq!(result, Err(CustomContractError::UnknownBidder));
        claim!(logger.logs.is_empty());
    }

    #[concordium_test]
    fn test_single_reveal() {
        let mut host = default_host();
        let mut logger = TestLogger::init();

        let result = call_bid(
            &mut host,
            &mut logger,
            BIDDER_1,
            commitment_of(1000),
            bidding_time(),
        );
        claim_eq!(result, Ok(()));

        let result = call_reveal(
            &mut host,
            &mut logger,
            BIDDER_1,
            &opening(1000),
            reveal_time(),
        );
        claim_eq!(result, Ok(()));

        claim_eq!(logger.logs.len(), 2);
        claim_eq!(
            logger.logs[1],
            to_bytes(&AuctionEvents::reveal(
                &Address::Account(BIDDER_1),
                Amount::from_micro_ccd(1000)
            ))
        );

        let ctx = view_ctx(closed_time());
        claim_eq!(winner(&ctx, &host), Ok(Some(Address::Account(BIDDER_1))));
        claim_eq!(
            get_winning_bid(&ctx, &host),
            Ok(Some(WinningBid {
                hash: commitment_of(1000),
                value: Amount::from_micro_ccd(1000),
            }))
        );
        claim_eq!(price(&ctx, &host), Ok(Amount::zero()));
    }

    #[concordium_test]
    fn test_three_bidders() {
        let mut host = default_host();
        let mut logger = TestLogger::init();
        let bids: [(AccountAddress, u64); 3] = [(BIDDER_1, 1000), (BIDDER_2, 2000), (BIDDER_3, 500)];

        for (bidder, value) in bids.iter() {
            let result = call_bid(
                &mut host,
                &mut logger,
                *bidder,
                commitment_of(*value),
                bidding_time(),
            );
            claim_eq!(result, Ok(()));
        }

        for (bidder, value) in bids.iter() {
            let result = call_reveal(
                &mut host,
                &mut logger,
                *bidder,
                &opening(*value),
                reveal_time(),
            );
            claim_eq!(result, Ok(()));
        }

        let ctx = view_ctx(closed_time());
        claim_eq!(bid_count(&ctx, &host), Ok(3));
        claim_eq!(is_open(&ctx, &host), Ok(false));
        claim_eq!(phase(&ctx, &host), Ok(AuctionPhase::Closed));
        claim_eq!(winner(&ctx, &host), Ok(Some(Address::Account(BIDDER_2))));
        claim_eq!(
            get_winning_bid(&ctx, &host),
            Ok(Some(WinningBid {
                hash: commitment_of(2000),
                value: Amount::from_micro_ccd(2000),
            }))
        );
        claim_eq!(price(&ctx, &host), Ok(Amount::from_micro_ccd(1000)));

        let bytes = to_bytes(&ViewBiddersParams { skip: 0, show: 10 });
        let mut ctx = view_ctx(closed_time());
        ctx.set_parameter(&bytes);
        claim_eq!(
            view_bidders(&ctx, &host),
            Ok(vec![
                Address::Account(BIDDER_1),
                Address::Account(BIDDER_2),
                Address::Account(BIDDER_3),
            ])
        );

        let ctx = view_ctx(closed_time());
        claim_eq!(
            view_auction(&ctx, &host),
            Ok(AuctionView {
                item: ITEM.to_vec(),
                owner: OWNER,
                reveal_start: time(REVEAL_START),
                reveal_finish: time(REVEAL_FINISH),
                phase: AuctionPhase::Closed,
                bid_count: 3,
                reveal_count: 3,
                price: Amount::from_micro_ccd(1000),
                winner: Some(Address::Account(BIDDER_2)),
            })
        );
    }
}
