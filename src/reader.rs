//! Read-only chain access needed to sign relayed calls.

use alloy::{
    primitives::{Address, B256, U256},
    providers::Provider,
};

use crate::{
    abi::{
        router::{GelatoRelayRouter, SubaccountGelatoRelayRouter},
        token::ERC20Permit,
    },
    error::RouterError,
};

/// On-chain values the signers and the request builder depend on.
///
/// Values are always read fresh, implementations must not cache nonces.
#[allow(async_fn_in_trait)]
pub trait ChainReader {
    /// EIP-2612 `DOMAIN_SEPARATOR()` of `token`.
    async fn domain_separator(&self, token: Address) -> Result<B256, RouterError>;

    /// EIP-2612 `nonces(owner)` of `token`.
    async fn permit_nonce(&self, token: Address, owner: Address) -> Result<U256, RouterError>;

    async fn token_name(&self, token: Address) -> Result<String, RouterError>;

    /// `userNonces(account)` of the relay `router`.
    async fn user_nonce(&self, router: Address, account: Address) -> Result<U256, RouterError>;

    /// `subaccountApprovalNonces(account)` of the subaccount relay `router`.
    async fn subaccount_approval_nonce(
        &self,
        router: Address,
        account: Address,
    ) -> Result<U256, RouterError>;
}

impl<T: ChainReader> ChainReader for &T {
    async fn domain_separator(&self, token: Address) -> Result<B256, RouterError> {
        (**self).domain_separator(token).await
    }

    async fn permit_nonce(&self, token: Address, owner: Address) -> Result<U256, RouterError> {
        (**self).permit_nonce(token, owner).await
    }

    async fn token_name(&self, token: Address) -> Result<String, RouterError> {
        (**self).token_name(token).await
    }

    async fn user_nonce(&self, router: Address, account: Address) -> Result<U256, RouterError> {
        (**self).user_nonce(router, account).await
    }

    async fn subaccount_approval_nonce(
        &self,
        router: Address,
        account: Address,
    ) -> Result<U256, RouterError> {
        (**self).subaccount_approval_nonce(router, account).await
    }
}

/// [`ChainReader`] over an RPC provider.
#[derive(Clone, Debug)]
pub struct RpcChainReader<P> {
    provider: P,
}

impl<P: Provider + Clone> RpcChainReader<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: Provider + Clone> ChainReader for RpcChainReader<P> {
    async fn domain_separator(&self, token: Address) -> Result<B256, RouterError> {
        let instance = ERC20Permit::new(token, self.provider.clone());
        Ok(instance.DOMAIN_SEPARATOR().call().await?)
    }

    async fn permit_nonce(&self, token: Address, owner: Address) -> Result<U256, RouterError> {
        let instance = ERC20Permit::new(token, self.provider.clone());
        Ok(instance.nonces(owner).call().await?)
    }

    async fn token_name(&self, token: Address) -> Result<String, RouterError> {
        let instance = ERC20Permit::new(token, self.provider.clone());
        Ok(instance.name().call().await?)
    }

    async fn user_nonce(&self, router: Address, account: Address) -> Result<U256, RouterError> {
        // Both routers expose the same getter
        let instance = GelatoRelayRouter::new(router, self.provider.clone());
        Ok(instance.userNonces(account).call().await?)
    }

    async fn subaccount_approval_nonce(
        &self,
        router: Address,
        account: Address,
    ) -> Result<U256, RouterError> {
        let instance = SubaccountGelatoRelayRouter::new(router, self.provider.clone());
        Ok(instance.subaccountApprovalNonces(account).call().await?)
    }
}
