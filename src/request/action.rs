use alloy::{
    primitives::{B256, Bytes, U256},
    signers::Signer,
    sol_types::{Eip712Domain, SolCall, SolStruct},
};

use super::RelayTarget;
use crate::{
    abi::{
        router::{self, GelatoRelayRouter, SubaccountGelatoRelayRouter},
        typed,
    },
    error::RelayError,
    types::{CreateOrderParams, UpdateOrderParams},
};

/// Order operation carried by a relayed call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelayAction {
    CreateOrder {
        collateral_delta_amount: U256,
        params: CreateOrderParams,
    },
    UpdateOrder {
        key: B256,
        params: UpdateOrderParams,
        increase_execution_fee: bool,
    },
    CancelOrder {
        key: B256,
    },
}

impl RelayAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateOrder { .. } => "createOrder",
            Self::UpdateOrder { .. } => "updateOrder",
            Self::CancelOrder { .. } => "cancelOrder",
        }
    }

    /// Signs the action's typed data bound to `relay_params_hash`, returning
    /// the signing hash alongside the signature.
    pub(crate) async fn sign<S: Signer + Sync>(
        &self,
        signer: &S,
        domain: &Eip712Domain,
        relay_params_hash: B256,
    ) -> Result<(B256, alloy::primitives::Signature), RelayError> {
        match self {
            Self::CreateOrder {
                collateral_delta_amount,
                params,
            } => {
                let message = params.message(*collateral_delta_amount, relay_params_hash);
                sign_message(signer, &message, domain).await
            }
            Self::UpdateOrder {
                key,
                params,
                increase_execution_fee,
            } => {
                let message = params.message(*key, *increase_execution_fee, relay_params_hash);
                sign_message(signer, &message, domain).await
            }
            Self::CancelOrder { key } => {
                let message = typed::CancelOrder {
                    key: *key,
                    relayParams: relay_params_hash,
                };
                sign_message(signer, &message, domain).await
            }
        }
    }

    /// Signing hash of the action's typed data, as the router recomputes it.
    pub fn signing_hash(&self, domain: &Eip712Domain, relay_params_hash: B256) -> B256 {
        match self {
            Self::CreateOrder {
                collateral_delta_amount,
                params,
            } => params
                .message(*collateral_delta_amount, relay_params_hash)
                .eip712_signing_hash(domain),
            Self::UpdateOrder {
                key,
                params,
                increase_execution_fee,
            } => params
                .message(*key, *increase_execution_fee, relay_params_hash)
                .eip712_signing_hash(domain),
            Self::CancelOrder { key } => typed::CancelOrder {
                key: *key,
                relayParams: relay_params_hash,
            }
            .eip712_signing_hash(domain),
        }
    }

    /// ABI-encoded router call, without the fee context suffix.
    pub(crate) fn calldata(&self, target: &RelayTarget, relay_params: router::RelayParams) -> Bytes {
        let encoded = match (target, self) {
            (
                RelayTarget::Direct { account },
                Self::CreateOrder {
                    collateral_delta_amount,
                    params,
                },
            ) => GelatoRelayRouter::createOrderCall {
                relayParams: relay_params,
                account: *account,
                collateralDeltaAmount: *collateral_delta_amount,
                params: params.into(),
            }
            .abi_encode(),
            (
                RelayTarget::Direct { account },
                Self::UpdateOrder {
                    key,
                    params,
                    increase_execution_fee,
                },
            ) => GelatoRelayRouter::updateOrderCall {
                relayParams: relay_params,
                account: *account,
                key: *key,
                params: params.into(),
                increaseExecutionFee: *increase_execution_fee,
            }
            .abi_encode(),
            (RelayTarget::Direct { account }, Self::CancelOrder { key }) => {
                GelatoRelayRouter::cancelOrderCall {
                    relayParams: relay_params,
                    account: *account,
                    key: *key,
                }
                .abi_encode()
            }
            (
                RelayTarget::Subaccount {
                    account,
                    subaccount,
                    approval,
                },
                Self::CreateOrder {
                    collateral_delta_amount,
                    params,
                },
            ) => SubaccountGelatoRelayRouter::createOrderCall {
                relayParams: relay_params,
                subaccountApproval: approval.into(),
                account: *account,
                subaccount: *subaccount,
                collateralDeltaAmount: *collateral_delta_amount,
                params: params.into(),
            }
            .abi_encode(),
            (
                RelayTarget::Subaccount {
                    account,
                    subaccount,
                    approval,
                },
                Self::UpdateOrder {
                    key,
                    params,
                    increase_execution_fee,
                },
            ) => SubaccountGelatoRelayRouter::updateOrderCall {
                relayParams: relay_params,
                subaccountApproval: approval.into(),
                account: *account,
                subaccount: *subaccount,
                key: *key,
                params: params.into(),
                increaseExecutionFee: *increase_execution_fee,
            }
            .abi_encode(),
            (
                RelayTarget::Subaccount {
                    account,
                    subaccount,
                    approval,
                },
                Self::CancelOrder { key },
            ) => SubaccountGelatoRelayRouter::cancelOrderCall {
                relayParams: relay_params,
                subaccountApproval: approval.into(),
                account: *account,
                subaccount: *subaccount,
                key: *key,
            }
            .abi_encode(),
        };
        Bytes::from(encoded)
    }
}

async fn sign_message<S: Signer + Sync, T: SolStruct + Send + Sync>(
    signer: &S,
    message: &T,
    domain: &Eip712Domain,
) -> Result<(B256, alloy::primitives::Signature), RelayError> {
    let hash = message.eip712_signing_hash(domain);
    let signature = signer.sign_typed_data(message, domain).await?;
    Ok((hash, signature))
}
