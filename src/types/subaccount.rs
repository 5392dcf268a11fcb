use alloy::{
    primitives::{Address, B256, Bytes, U256, b256},
    sol_types::SolValue,
};

use crate::{
    abi::{router, typed},
    encoder::{EncodeStruct, StructLayout, StructValue, layouts},
};

/// `keccak256(abi.encode("SUBACCOUNT_ORDER_ACTION"))`, the action type
/// authorizing a subaccount to manage orders.
pub const SUBACCOUNT_ORDER_ACTION: B256 =
    b256!("0x2a0791687fd34f2095c484a9fa4e25057d3ef79a97fcd8c61436047a7bdf4cbe");

/// Computes [`SUBACCOUNT_ORDER_ACTION`] from its key string.
pub fn subaccount_order_action() -> B256 {
    alloy::primitives::keccak256("SUBACCOUNT_ORDER_ACTION".to_string().abi_encode())
}

/// Signed grant (or revocation) of trading rights to a subaccount.
///
/// `expires_at` and `max_allowed_count` are enforced by the router, not by
/// the signature; `max_allowed_count == 0` means unlimited.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubaccountApproval {
    pub subaccount: Address,
    pub should_add: bool,
    pub expires_at: U256,
    pub max_allowed_count: U256,
    pub action_type: B256,
    pub nonce: U256,
    pub deadline: U256,
    pub signature: Bytes,
}

impl SubaccountApproval {
    /// All-zero approval with an empty signature, passed when the subaccount
    /// is already active and no approval update is needed.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.signature.is_empty() && self.subaccount == Address::ZERO
    }

    /// EIP-712 `SubaccountApproval` message.
    pub fn message(&self) -> typed::SubaccountApproval {
        typed::SubaccountApproval {
            subaccount: self.subaccount,
            shouldAdd: self.should_add,
            expiresAt: self.expires_at,
            maxAllowedCount: self.max_allowed_count,
            actionType: self.action_type,
            nonce: self.nonce,
            deadline: self.deadline,
        }
    }
}

impl EncodeStruct for SubaccountApproval {
    const LAYOUT: &'static StructLayout = &layouts::SUBACCOUNT_APPROVAL;

    fn struct_value(&self) -> StructValue {
        StructValue::new()
            .with("subaccount", self.subaccount)
            .with("shouldAdd", self.should_add)
            .with("expiresAt", self.expires_at)
            .with("maxAllowedCount", self.max_allowed_count)
            .with("actionType", self.action_type)
            .with("nonce", self.nonce)
            .with("deadline", self.deadline)
            .with("signature", self.signature.clone())
    }
}

impl From<&SubaccountApproval> for router::SubaccountApproval {
    fn from(value: &SubaccountApproval) -> Self {
        Self {
            subaccount: value.subaccount,
            shouldAdd: value.should_add,
            expiresAt: value.expires_at,
            maxAllowedCount: value.max_allowed_count,
            actionType: value.action_type,
            nonce: value.nonce,
            deadline: value.deadline,
            signature: value.signature.clone(),
        }
    }
}
