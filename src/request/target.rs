use alloy::{
    primitives::{Address, U256},
    sol_types::Eip712Domain,
};

use crate::{Chain, types::SubaccountApproval};

/// EIP-712 domain name shared by both relay routers.
pub const ROUTER_DOMAIN_NAME: &str = "GmxBaseGelatoRelayRouter";

pub const ROUTER_DOMAIN_VERSION: &str = "1";

/// Who the relayed call acts for, and through which router.
///
/// * [`RelayTarget::Direct`] is signed by `account` itself and goes to the
///   relay router.
/// * [`RelayTarget::Subaccount`] is signed by `subaccount` on behalf of
///   `account` and goes to the subaccount relay router, carrying `approval`
///   ([`SubaccountApproval::empty`] if the subaccount is already active).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelayTarget {
    Direct {
        account: Address,
    },
    Subaccount {
        account: Address,
        subaccount: Address,
        approval: SubaccountApproval,
    },
}

impl RelayTarget {
    pub fn direct(account: Address) -> Self {
        Self::Direct { account }
    }

    pub fn subaccount(account: Address, subaccount: Address, approval: SubaccountApproval) -> Self {
        Self::Subaccount {
            account,
            subaccount,
            approval,
        }
    }

    /// Account whose position or order is acted on.
    pub fn account(&self) -> Address {
        match self {
            Self::Direct { account } | Self::Subaccount { account, .. } => *account,
        }
    }

    /// Address expected to sign the relayed call.
    pub fn signer(&self) -> Address {
        match self {
            Self::Direct { account } => *account,
            Self::Subaccount { subaccount, .. } => *subaccount,
        }
    }

    pub fn router(&self, chain: &Chain) -> Address {
        match self {
            Self::Direct { .. } => chain.relay_router(),
            Self::Subaccount { .. } => chain.subaccount_relay_router(),
        }
    }
}

/// EIP-712 domain of the relay router at `router`.
pub fn router_domain(chain_id: u64, router: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(ROUTER_DOMAIN_NAME.into()),
        Some(ROUTER_DOMAIN_VERSION.into()),
        Some(U256::from(chain_id)),
        Some(router),
        None,
    )
}
