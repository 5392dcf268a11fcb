//! Gasless order SDK for the Gelato relay routers of a perpetuals exchange.
//!
//! # Overview
//!
//! Orders are signed off-chain and submitted by the Gelato relay network,
//! which recovers its fee from the call in a designated fee token.
//!
//! Use [`permit::PermitSigner`] to sign EIP-2612 permits and
//! [`subaccount::SubaccountApprovalSigner`] to delegate trading to a
//! subaccount, then [`request::RelayRequestBuilder`] to assemble, hash, sign
//! and serialize the relayed router call, and
//! [`submit::RelaySubmissionClient`] to submit it and track the relay task.
//! [`gasless::GaslessClient`] wraps the whole flow.
//!
//! Chain state is read through [`reader::ChainReader`] and the relay network
//! is reached through [`submit::RelayApi`], both implemented for production
//! use ([`reader::RpcChainReader`], [`submit::GelatoRelayApi`]) and in memory
//! by the [`testing`] module.
//!
//! See `./tests` for examples.
//!
//! # Limitations/follow-ups
//!
//! * Only order actions are supported, deposits, withdrawals and swaps
//!   without an order are not.
//!
//! * Nonces are not tracked locally, see [`nonce::AccountLocks`] to
//!   serialize requests of one account.

pub mod abi;
pub mod encoder;
pub mod error;
pub mod gasless;
pub mod nonce;
pub mod permit;
pub mod reader;
pub mod request;
pub mod subaccount;
pub mod submit;
pub mod testing;
pub mod types;

use std::time::{SystemTime, UNIX_EPOCH};

use alloy::primitives::Address;

use crate::error::RelayError;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Chain the relay routers are deployed on.
pub struct Chain {
    chain_id: u64,
    relay_router: Address,
    subaccount_relay_router: Address,
}

impl Chain {
    pub fn custom(chain_id: u64, relay_router: Address, subaccount_relay_router: Address) -> Self {
        Self {
            chain_id,
            relay_router,
            subaccount_relay_router,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn relay_router(&self) -> Address {
        self.relay_router
    }

    pub fn subaccount_relay_router(&self) -> Address {
        self.subaccount_relay_router
    }
}

/// Current unix time in seconds, used for default deadlines.
pub fn unix_timestamp() -> Result<u64, RelayError> {
    unix_seconds(SystemTime::now())
}

fn unix_seconds(at: SystemTime) -> Result<u64, RelayError> {
    Ok(at.duration_since(UNIX_EPOCH)?.as_secs())
}
