//! Relay operations run on behalf of the configured signer.

use std::time::Duration;

use alloy::{
    primitives::{Address, B256, U256},
    providers::{DynProvider, ProviderBuilder},
    rpc::client::RpcClient,
    signers::{Signer, local::PrivateKeySigner},
};
use gasless_sdk::{
    Chain,
    gasless::GaslessClient,
    reader::RpcChainReader,
    request::{RelayAction, RelayIntent, RelayTarget},
    submit::{GelatoRelayApi, PollPolicy, RelayOutcome},
    types::{self, FeeParams},
};
use tracing::{info, warn};
use url::Url;

use crate::error::Result;

/// Relay client bound to one signer.
#[derive(Debug)]
pub struct RelayOperator {
    signer: PrivateKeySigner,
    client: GaslessClient<RpcChainReader<DynProvider>, GelatoRelayApi>,
    policy: PollPolicy,
}

impl RelayOperator {
    pub fn new(
        node_url: Url,
        signer: PrivateKeySigner,
        chain: Chain,
        api: GelatoRelayApi,
        timeout: Duration,
    ) -> Self {
        info!(
            account = %signer.address(),
            chain_id = chain.chain_id(),
            relay_router = %chain.relay_router(),
            "Initializing relay operator"
        );

        let rpc_client = RpcClient::new_http(node_url);
        let provider = DynProvider::new(ProviderBuilder::new().connect_client(rpc_client));

        Self {
            signer,
            client: GaslessClient::new(chain, RpcChainReader::new(provider), api),
            policy: PollPolicy::default().with_timeout(timeout),
        }
    }

    /// Wait for `task_id` to finish.
    pub async fn status(&self, task_id: types::TaskId) -> Result<()> {
        let outcome = self.client.await_relay_outcome(&task_id, self.policy).await?;
        self.report(&task_id, outcome)
    }

    /// Cancel order `order_key` of the signer's account, paying the relay
    /// fee in `fee_token`.
    pub async fn cancel(
        &self,
        order_key: B256,
        fee_token: Address,
        fee_amount: U256,
        validity_seconds: u64,
    ) -> Result<()> {
        let now = gasless_sdk::unix_timestamp()?;
        let intent = RelayIntent::new(
            now,
            RelayTarget::direct(self.signer.address()),
            RelayAction::CancelOrder { key: order_key },
            FeeParams::new(fee_token, fee_amount),
            U256::from(now + validity_seconds),
        );

        let request = self
            .client
            .build_and_sign_relay_request(&self.signer, intent)
            .await?;
        let task_id = self.client.submit(&request).await?;
        info!(%task_id, %order_key, "Cancellation submitted");

        let outcome = self.client.await_relay_outcome(&task_id, self.policy).await?;
        self.report(&task_id, outcome)
    }

    /// Sign a permit and print it as JSON.
    pub async fn sign_permit(
        &self,
        token: Address,
        spender: Address,
        value: U256,
        deadline: U256,
    ) -> Result<()> {
        let permit = self
            .client
            .sign_permit(&self.signer, token, spender, value, deadline)
            .await?;
        let output = serde_json::json!({
            "owner": permit.owner,
            "spender": permit.spender,
            "value": permit.value.to_string(),
            "deadline": permit.deadline.to_string(),
            "v": permit.v,
            "r": permit.r,
            "s": permit.s,
            "token": permit.token,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn report(&self, task_id: &types::TaskId, outcome: RelayOutcome) -> Result<()> {
        match &outcome {
            RelayOutcome::Success { tx_hash } => {
                info!(%task_id, ?tx_hash, "Relay task executed");
            }
            RelayOutcome::Reverted(message) => {
                let reason = outcome.revert_reason();
                warn!(%task_id, %message, ?reason, "Relay task reverted");
            }
            RelayOutcome::Cancelled(message) => {
                warn!(%task_id, %message, "Relay task cancelled");
            }
        }
        outcome.into_result(task_id)?;
        Ok(())
    }
}
