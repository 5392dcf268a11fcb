use alloy::{
    primitives::{Address, U256},
    signers::Signer,
};

use crate::{
    Chain,
    error::RelayError,
    permit::PermitSigner,
    reader::ChainReader,
    request::{RelayIntent, RelayRequestBuilder, SignedRelayRequest},
    submit::{PollPolicy, RelayApi, RelayOutcome, RelaySubmissionClient},
    subaccount::{SubaccountApprovalOptions, SubaccountApprovalSigner},
    types::{self, SubaccountApproval, TokenPermit},
};

/// Single entry point for gasless order flows on one chain.
///
/// Every call reads what it needs from the chain at call time, nothing is
/// cached between calls.
#[derive(Clone, Debug)]
pub struct GaslessClient<C, A> {
    chain: Chain,
    reader: C,
    submission: RelaySubmissionClient<A>,
}

impl<C: ChainReader, A: RelayApi> GaslessClient<C, A> {
    pub fn new(chain: Chain, reader: C, api: A) -> Self {
        Self {
            chain,
            reader,
            submission: RelaySubmissionClient::new(api),
        }
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn reader(&self) -> &C {
        &self.reader
    }

    pub async fn is_permit_supported(&self, token: Address) -> Result<bool, RelayError> {
        PermitSigner::new(&self.reader).probe_support(token).await
    }

    /// Signs an EIP-2612 permit of `token` held by `signer`.
    pub async fn sign_permit<S: Signer + Sync>(
        &self,
        signer: &S,
        token: Address,
        spender: Address,
        value: U256,
        deadline: U256,
    ) -> Result<TokenPermit, RelayError> {
        PermitSigner::new(&self.reader)
            .sign(signer, token, spender, value, deadline, self.chain.chain_id())
            .await
    }

    /// Signs an approval of `subaccount` by the main account `signer`.
    pub async fn sign_subaccount_approval<S: Signer + Sync>(
        &self,
        signer: &S,
        subaccount: Address,
        options: SubaccountApprovalOptions,
    ) -> Result<SubaccountApproval, RelayError> {
        SubaccountApprovalSigner::new(&self.reader, &self.chain)
            .sign(signer, subaccount, options)
            .await
    }

    /// Runs `intent` through the whole request pipeline.
    pub async fn build_and_sign_relay_request<S: Signer + Sync>(
        &self,
        signer: &S,
        intent: RelayIntent,
    ) -> Result<SignedRelayRequest, RelayError> {
        Ok(RelayRequestBuilder::new(&self.chain, intent)
            .assemble(&self.reader)
            .await?
            .hash()?
            .sign(signer)
            .await?
            .serialize())
    }

    pub async fn submit(&self, request: &SignedRelayRequest) -> Result<types::TaskId, RelayError> {
        self.submission.submit(request).await
    }

    /// Waits for the task to finish, sleeping on the tokio timer between
    /// status queries.
    pub async fn await_relay_outcome(
        &self,
        task_id: &types::TaskId,
        policy: PollPolicy,
    ) -> Result<RelayOutcome, RelayError> {
        self.submission
            .await_completion(task_id, policy, tokio::time::sleep)
            .await
    }
}
