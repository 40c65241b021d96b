//! A sealed-bid second-price (Vickrey) auction for a single item.
//!
//! # Description
//! Bidders first commit to a bid by submitting the Keccak-256 hash of the bid
//! value and a secret nonce. Once the reveal window opens, every bidder
//! discloses the value and the nonce, the contract checks them against the
//! commitment and keeps track of the two highest revealed values. The highest
//! revealer wins and the clearing price is the second-highest revealed value.
//!
//! Phases are derived from the slot time on every call:
//! - before `reveal_start` only `bid` is accepted;
//! - within `[reveal_start, reveal_finish)` only `reveal` is accepted;
//! - from `reveal_finish` on the auction is read-only.
//!
//! The contract only records commitments, reveals, the winner and the price.
//! It never transfers CCD.
#![cfg_attr(not(feature = "std"), no_std)]

mod commitment;
mod contract;
mod events;
mod external;
mod state;
