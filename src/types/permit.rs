use alloy::{
    primitives::{Address, B256, Signature, SignatureError, U256},
    sol_types::{Eip712Domain, SolStruct},
};

use crate::{
    abi::{router, typed},
    encoder::{EncodeStruct, StructLayout, StructValue, layouts},
};

/// Signed EIP-2612 authorization for `spender` to move up to `value` of
/// `token` from `owner` until `deadline`.
///
/// The permit nonce it was signed over is not kept: it is consumed on-chain
/// by the first transaction using the permit and must be re-read before
/// signing another one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenPermit {
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
    pub deadline: U256,
    /// Recovery id, `27` or `28`.
    pub v: u8,
    pub r: B256,
    pub s: B256,
    pub token: Address,
}

impl TokenPermit {
    /// Builds a permit from a signature over the permit message, normalizing
    /// `v` to `27`/`28`.
    pub fn from_signature(
        owner: Address,
        spender: Address,
        value: U256,
        deadline: U256,
        token: Address,
        signature: &Signature,
    ) -> Self {
        Self {
            owner,
            spender,
            value,
            deadline,
            v: 27 + u8::from(signature.v()),
            r: B256::from(signature.r().to_be_bytes::<32>()),
            s: B256::from(signature.s().to_be_bytes::<32>()),
            token,
        }
    }

    pub fn signature(&self) -> Signature {
        Signature::new(
            U256::from_be_bytes(self.r.0),
            U256::from_be_bytes(self.s.0),
            self.v == 28,
        )
    }

    /// EIP-712 `Permit` message this permit authorizes, given the owner's
    /// permit nonce at signing time.
    pub fn message(&self, nonce: U256) -> typed::Permit {
        typed::Permit {
            owner: self.owner,
            spender: self.spender,
            value: self.value,
            nonce,
            deadline: self.deadline,
        }
    }

    /// Recovers the signer address of the permit.
    pub fn recover_signer(
        &self,
        domain: &Eip712Domain,
        nonce: U256,
    ) -> Result<Address, SignatureError> {
        let hash = self.message(nonce).eip712_signing_hash(domain);
        self.signature().recover_address_from_prehash(&hash)
    }
}

impl EncodeStruct for TokenPermit {
    const LAYOUT: &'static StructLayout = &layouts::TOKEN_PERMIT;

    fn struct_value(&self) -> StructValue {
        StructValue::new()
            .with("owner", self.owner)
            .with("spender", self.spender)
            .with("value", self.value)
            .with("deadline", self.deadline)
            .with("v", self.v)
            .with("r", self.r)
            .with("s", self.s)
            .with("token", self.token)
    }
}

impl From<&TokenPermit> for router::TokenPermit {
    fn from(value: &TokenPermit) -> Self {
        Self {
            owner: value.owner,
            spender: value.spender,
            value: value.value,
            deadline: value.deadline,
            v: value.v,
            r: value.r,
            s: value.s,
            token: value.token,
        }
    }
}
