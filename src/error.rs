use std::fmt::Display;

use alloy::{
    contract,
    primitives::{Address, Bytes, hex},
    providers::PendingTransactionError,
    sol_types::{self, SolInterface},
    transports,
};

use crate::{abi::errors::RelayRouter::RelayRouterErrors, encoder::EncodingError, types};

/// Chain read failure, with router reverts decoded when known.
pub type RouterError = ProviderError<RelayRouterErrors>;

/// Call/transaction revert reason decoded by
/// the provided known ABI or in a generic raw form
/// if can not be decoded.
#[derive(Debug)]
pub enum RevertReason<R> {
    Known(R),
    Generic(String),
    Unknown,
}

/// Error returned by the RPC provider as a result of a contract call.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError<R> {
    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unexpected empty RPC response")]
    NullResp,

    #[error("call ran out of gas")]
    OutOfGas,

    #[error("call reverted: {0:?}")]
    Reverted(Box<RevertReason<R>>),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("call timed out")]
    Timeout,
}

/// Error surfaced by the relay pipeline. Nothing here is retried internally.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Token lacks EIP-2612 `DOMAIN_SEPARATOR`/`nonces`.
    #[error("token {0} does not support EIP-2612 permits")]
    UnsupportedPermit(Address),

    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Signer declined or failed to sign, surfaced as returned by the signer.
    #[error("signing rejected: {0}")]
    SigningRejected(#[from] alloy::signers::Error),

    #[error("signer {actual} can not act for {expected}")]
    SignerMismatch { expected: Address, actual: Address },

    #[error("chain read failed: {0}")]
    Chain(#[from] RouterError),

    #[error("relay api error: {0}")]
    RelayApi(#[from] crate::submit::RelayApiError),

    /// Terminal non-success state reported by the relay network.
    #[error("relay task {task_id} ended {state}: {message}")]
    RelayExecution {
        task_id: types::TaskId,
        state: String,
        message: String,
    },

    #[error("timed out waiting for relay task {0}")]
    Timeout(types::TaskId),

    #[error("system clock is before the unix epoch: {0}")]
    Clock(#[from] std::time::SystemTimeError),
}

impl<R> ProviderError<R> {
    /// Whether the call reached the contract and failed there, as opposed to
    /// a transport level failure.
    pub fn is_call_failure(&self) -> bool {
        matches!(self, Self::Reverted(_) | Self::Fatal(_) | Self::NullResp)
    }
}

impl<R: SolInterface> From<contract::Error> for ProviderError<R> {
    fn from(value: contract::Error) -> Self {
        match value {
            contract::Error::UnknownFunction(_) => Self::Fatal(value.to_string()),
            contract::Error::UnknownSelector(_) => Self::Fatal(value.to_string()),
            contract::Error::NotADeploymentTransaction => Self::Fatal(value.to_string()),
            contract::Error::ContractNotDeployed => Self::Fatal(value.to_string()),
            contract::Error::ZeroData(_, _) => Self::Fatal(value.to_string()),
            contract::Error::AbiError(_) => Self::Fatal(value.to_string()),
            contract::Error::TransportError(rpc_err) => Self::from(rpc_err),
            contract::Error::PendingTransactionError(err) => err.into(),
        }
    }
}

impl<R: SolInterface> From<PendingTransactionError> for ProviderError<R> {
    fn from(value: PendingTransactionError) -> Self {
        match value {
            PendingTransactionError::FailedToRegister => Self::Fatal(value.to_string()),
            PendingTransactionError::TransportError(rpc_err) => Self::from(rpc_err),
            PendingTransactionError::Recv(_) => Self::Transport(value.to_string()),
            PendingTransactionError::TxWatcher(err) => match err {
                alloy::providers::WatchTxError::Timeout => Self::Timeout,
            },
        }
    }
}

impl<E: Display, R: SolInterface> From<transports::RpcError<E>> for ProviderError<R> {
    fn from(value: transports::RpcError<E>) -> Self {
        match value {
            transports::RpcError::ErrorResp(ref resp) => {
                // Heuristic to determine if eth_call failed due to OutOfGas
                let msg = resp.message.to_ascii_lowercase();
                if (resp.code == -32603) && (msg.contains("gas") || msg.contains("oog")) {
                    Self::OutOfGas
                } else if (resp.code == -32600 || resp.code == -32601 || resp.code == -32602)
                    && (msg.contains("invalid") || msg.contains("not found"))
                {
                    Self::InvalidRequest(msg)
                } else if (resp.code == 3 || resp.code == -32000) && msg.contains("revert") {
                    Self::Reverted(Box::new(RevertReason::from(value)))
                } else {
                    Self::Transport(value.to_string())
                }
            }
            transports::RpcError::NullResp => Self::NullResp,
            _ => Self::Transport(value.to_string()),
        }
    }
}

impl<R: SolInterface> From<sol_types::Error> for ProviderError<R> {
    fn from(value: sol_types::Error) -> Self {
        Self::Fatal(value.to_string())
    }
}

impl<E: Display, R: SolInterface> From<transports::RpcError<E>> for RevertReason<R> {
    fn from(value: transports::RpcError<E>) -> Self {
        match value.as_error_resp() {
            Some(payload) => match payload.as_decoded_interface_error::<R>() {
                Some(known) => Self::Known(known),
                None => Self::Generic(value.to_string()),
            },
            None => Self::Generic(value.to_string()),
        }
    }
}

impl<R: SolInterface> From<Bytes> for RevertReason<R> {
    fn from(value: Bytes) -> Self {
        match R::abi_decode(&value) {
            Ok(known) => Self::Known(known),
            Err(_) => Self::Generic(value.to_string()),
        }
    }
}

impl<R: SolInterface> RevertReason<R> {
    /// Decodes the revert data embedded in a free-form diagnostic, such as a
    /// relay network's last check message (`"... reverted: 0x1234abcd..."`).
    pub fn from_message(message: &str) -> Self {
        let Some(start) = message.find("0x") else {
            return if message.is_empty() {
                Self::Unknown
            } else {
                Self::Generic(message.to_string())
            };
        };
        let data: String = message[start + 2..]
            .chars()
            .take_while(|c| c.is_ascii_hexdigit())
            .collect();
        match hex::decode(&data) {
            Ok(bytes) if bytes.len() >= 4 => Self::from(Bytes::from(bytes)),
            _ => Self::Generic(message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        primitives::U256,
        sol_types::{SolError, SolInterface},
    };

    use super::*;
    use crate::abi::errors::RelayRouter;

    #[test]
    fn test_revert_reason_from_relay_message() {
        let revert = RelayRouter::InvalidUserNonce {
            storedUserNonce: U256::from(4),
            userNonce: U256::from(3),
        };
        let message = format!(
            "Reverted with data: {}",
            Bytes::from(revert.abi_encode())
        );

        let reason = RevertReason::<RelayRouterErrors>::from_message(&message);
        assert!(matches!(
            reason,
            RevertReason::Known(RelayRouterErrors::InvalidUserNonce(ref e))
                if e.storedUserNonce == U256::from(4) && e.userNonce == U256::from(3)
        ));
    }

    #[test]
    fn test_revert_reason_from_plain_message() {
        assert!(matches!(
            RevertReason::<RelayRouterErrors>::from_message("execution reverted"),
            RevertReason::Generic(ref m) if m == "execution reverted"
        ));
        assert!(matches!(
            RevertReason::<RelayRouterErrors>::from_message(""),
            RevertReason::Unknown
        ));
    }

    #[test]
    fn test_revert_reason_from_bytes() {
        let data = RelayRouterErrors::DeadlinePassed(RelayRouter::DeadlinePassed {
            currentTimestamp: U256::from(2),
            deadline: U256::from(1),
        })
        .abi_encode();
        assert!(matches!(
            RevertReason::<RelayRouterErrors>::from(Bytes::from(data)),
            RevertReason::Known(RelayRouterErrors::DeadlinePassed(_))
        ));
    }
}
