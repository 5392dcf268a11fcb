//! Relay request pipeline.
//!
//! A [`RelayIntent`] moves through [`RelayRequestBuilder`] states, each
//! transition consuming the previous one:
//!
//! [`Collecting`] -> [`ParamsAssembled`] -> [`StructHashed`] ->
//! [`TypedDataSigned`] -> [`SignedRelayRequest`] (calldata serialized).
//!
//! The user nonce is read from the target router during assembly unless
//! pinned in the intent. Nothing is cached between requests.

mod action;
mod target;

pub use action::RelayAction;
pub use target::{ROUTER_DOMAIN_NAME, ROUTER_DOMAIN_VERSION, RelayTarget, router_domain};

use alloy::{
    primitives::{Address, B256, Bytes, Signature, U256},
    signers::Signer,
    sol_types::Eip712Domain,
};
use tracing::{debug, info};

use crate::{
    Chain,
    encoder::EncodeStruct,
    error::RelayError,
    reader::ChainReader,
    types::{ExternalCalls, FeeParams, OracleParams, RelayParams, RequestId, TokenPermit},
};

/// Everything the caller decides about a relayed call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayIntent {
    pub request_id: RequestId,
    pub target: RelayTarget,
    pub action: RelayAction,
    pub oracle_params: OracleParams,
    pub external_calls: ExternalCalls,
    pub token_permits: Vec<TokenPermit>,
    pub fee: FeeParams,
    /// Router user nonce, read from the chain when `None`.
    pub user_nonce: Option<U256>,
    pub deadline: U256,
}

/// Intent collected, nothing read or signed yet.
#[derive(Debug)]
pub struct Collecting {
    intent: RelayIntent,
}

/// Relay params assembled with the user nonce.
#[derive(Debug)]
pub struct ParamsAssembled {
    intent: RelayIntent,
    router: Address,
    relay_params: RelayParams,
}

#[derive(Debug)]
pub struct StructHashed {
    assembled: ParamsAssembled,
    relay_params_hash: B256,
}

#[derive(Debug)]
pub struct TypedDataSigned {
    hashed: StructHashed,
    signing_hash: B256,
    signature: Signature,
}

/// Typestate builder of a [`SignedRelayRequest`].
#[derive(Debug)]
pub struct RelayRequestBuilder<S> {
    chain: Chain,
    state: S,
}

/// Signed relay request, ready for submission.
#[derive(Clone, derive_more::Debug)]
pub struct SignedRelayRequest {
    request_id: RequestId,
    chain_id: u64,
    router: Address,
    target: RelayTarget,
    action: RelayAction,
    relay_params: RelayParams,
    relay_params_hash: B256,
    signing_hash: B256,
    signature: Signature,
    #[debug("{} bytes", calldata.len())]
    calldata: Bytes,
}

impl RelayIntent {
    /// Intent with empty oracle params, external calls and permits, reading
    /// the user nonce from the chain.
    pub fn new(
        request_id: RequestId,
        target: RelayTarget,
        action: RelayAction,
        fee: FeeParams,
        deadline: U256,
    ) -> Self {
        Self {
            request_id,
            target,
            action,
            oracle_params: OracleParams::default(),
            external_calls: ExternalCalls::default(),
            token_permits: vec![],
            fee,
            user_nonce: None,
            deadline,
        }
    }

    pub fn with_token_permits(mut self, permits: Vec<TokenPermit>) -> Self {
        self.token_permits = permits;
        self
    }

    pub fn with_oracle_params(mut self, oracle_params: OracleParams) -> Self {
        self.oracle_params = oracle_params;
        self
    }

    pub fn with_external_calls(mut self, external_calls: ExternalCalls) -> Self {
        self.external_calls = external_calls;
        self
    }

    /// Pins the user nonce instead of reading it from the router.
    pub fn with_user_nonce(mut self, nonce: U256) -> Self {
        self.user_nonce = Some(nonce);
        self
    }
}

impl<S> RelayRequestBuilder<S> {
    pub fn chain(&self) -> &Chain {
        &self.chain
    }
}

impl RelayRequestBuilder<Collecting> {
    pub fn new(chain: &Chain, intent: RelayIntent) -> Self {
        Self {
            chain: chain.clone(),
            state: Collecting { intent },
        }
    }

    /// Assembles relay params, reading the signer's user nonce from the
    /// target router unless pinned.
    pub async fn assemble<C: ChainReader>(
        self,
        reader: &C,
    ) -> Result<RelayRequestBuilder<ParamsAssembled>, RelayError> {
        let intent = self.state.intent;
        let router = intent.target.router(&self.chain);
        // Subaccount routers track the nonce of the subaccount
        let signer = intent.target.signer();
        let user_nonce = match intent.user_nonce {
            Some(nonce) => nonce,
            None => reader.user_nonce(router, signer).await?,
        };
        debug!(request_id = intent.request_id, %router, %signer, %user_nonce, "relay params assembled");

        let relay_params = RelayParams {
            oracle_params: intent.oracle_params.clone(),
            external_calls: intent.external_calls.clone(),
            token_permits: intent.token_permits.clone(),
            fee: intent.fee.clone(),
            user_nonce,
            deadline: intent.deadline,
        };
        Ok(RelayRequestBuilder {
            chain: self.chain,
            state: ParamsAssembled {
                intent,
                router,
                relay_params,
            },
        })
    }
}

impl RelayRequestBuilder<ParamsAssembled> {
    pub fn relay_params(&self) -> &RelayParams {
        &self.state.relay_params
    }

    pub fn router(&self) -> Address {
        self.state.router
    }

    /// Computes the relay params hash the action's typed data commits to.
    pub fn hash(self) -> Result<RelayRequestBuilder<StructHashed>, RelayError> {
        let relay_params_hash = self.state.relay_params.struct_hash()?;
        Ok(RelayRequestBuilder {
            chain: self.chain,
            state: StructHashed {
                assembled: self.state,
                relay_params_hash,
            },
        })
    }
}

impl RelayRequestBuilder<StructHashed> {
    pub fn relay_params_hash(&self) -> B256 {
        self.state.relay_params_hash
    }

    pub fn domain(&self) -> Eip712Domain {
        router_domain(self.chain.chain_id(), self.state.assembled.router)
    }

    /// Signs the action's typed data. `signer` must be the account acting
    /// for the target: the account itself, or its subaccount.
    pub async fn sign<S: Signer + Sync>(
        self,
        signer: &S,
    ) -> Result<RelayRequestBuilder<TypedDataSigned>, RelayError> {
        let target = &self.state.assembled.intent.target;
        if signer.address() != target.signer() {
            return Err(RelayError::SignerMismatch {
                expected: target.signer(),
                actual: signer.address(),
            });
        }

        let domain = self.domain();
        let (signing_hash, signature) = self
            .state
            .assembled
            .intent
            .action
            .sign(signer, &domain, self.state.relay_params_hash)
            .await?;
        debug!(
            request_id = self.state.assembled.intent.request_id,
            %signing_hash,
            "relay request signed"
        );
        Ok(RelayRequestBuilder {
            chain: self.chain,
            state: TypedDataSigned {
                hashed: self.state,
                signing_hash,
                signature,
            },
        })
    }
}

impl RelayRequestBuilder<TypedDataSigned> {
    pub fn signature(&self) -> &Signature {
        &self.state.signature
    }

    /// Serializes the router call with the signature attached to the relay
    /// params, followed by the `(router, feeToken, feeAmount)` fee context.
    pub fn serialize(self) -> SignedRelayRequest {
        let TypedDataSigned {
            hashed,
            signing_hash,
            signature,
        } = self.state;
        let StructHashed {
            assembled,
            relay_params_hash,
        } = hashed;
        let ParamsAssembled {
            intent,
            router,
            relay_params,
        } = assembled;

        let call = intent.action.calldata(
            &intent.target,
            relay_params.to_abi(Bytes::copy_from_slice(&signature.as_bytes())),
        );
        let mut calldata = Vec::with_capacity(call.len() + 72);
        calldata.extend_from_slice(&call);
        calldata.extend_from_slice(router.as_slice());
        calldata.extend_from_slice(relay_params.fee.fee_token.as_slice());
        calldata.extend_from_slice(&relay_params.fee.fee_amount.to_be_bytes::<32>());

        info!(
            request_id = intent.request_id,
            action = intent.action.name(),
            account = %intent.target.account(),
            %router,
            len = calldata.len(),
            "relay request serialized"
        );
        SignedRelayRequest {
            request_id: intent.request_id,
            chain_id: self.chain.chain_id(),
            router,
            target: intent.target,
            action: intent.action,
            relay_params,
            relay_params_hash,
            signing_hash,
            signature,
            calldata: Bytes::from(calldata),
        }
    }
}

impl SignedRelayRequest {
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn router(&self) -> Address {
        self.router
    }

    pub fn target(&self) -> &RelayTarget {
        &self.target
    }

    pub fn action(&self) -> &RelayAction {
        &self.action
    }

    pub fn relay_params(&self) -> &RelayParams {
        &self.relay_params
    }

    pub fn relay_params_hash(&self) -> B256 {
        self.relay_params_hash
    }

    /// EIP-712 hash the signature was produced over.
    pub fn signing_hash(&self) -> B256 {
        self.signing_hash
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Router calldata including the fee context suffix.
    pub fn calldata(&self) -> &Bytes {
        &self.calldata
    }

    pub fn fee_token(&self) -> Address {
        self.relay_params.fee.fee_token
    }

    pub fn fee_amount(&self) -> U256 {
        self.relay_params.fee.fee_amount
    }

    /// Recovers the signer from the signature and the signing hash.
    pub fn recover_signer(&self) -> Result<Address, alloy::primitives::SignatureError> {
        self.signature
            .recover_address_from_prehash(&self.signing_hash)
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        primitives::keccak256,
        sol_types::{SolCall, SolStruct},
    };

    use super::*;
    use crate::{
        abi::{
            router::{GelatoRelayRouter, SubaccountGelatoRelayRouter},
            typed,
        },
        testing::{self, MockChainReader},
        types::{CreateOrderParams, OrderType},
    };

    fn cancel_intent(target: RelayTarget) -> RelayIntent {
        RelayIntent::new(
            7,
            target,
            RelayAction::CancelOrder {
                key: B256::repeat_byte(0xee),
            },
            FeeParams::new(testing::FEE_TOKEN, U256::from(5)),
            U256::from(1999999999u64),
        )
    }

    async fn build(
        intent: RelayIntent,
        reader: &MockChainReader,
        signer: &(impl Signer + Sync),
    ) -> Result<SignedRelayRequest, RelayError> {
        Ok(RelayRequestBuilder::new(&testing::chain(), intent)
            .assemble(reader)
            .await?
            .hash()?
            .sign(signer)
            .await?
            .serialize())
    }

    #[tokio::test]
    async fn test_cancel_order_signing_hash() {
        let reader = MockChainReader::new(testing::CHAIN_ID);
        reader.set_user_nonce(testing::RELAY_ROUTER, testing::ACCOUNT, U256::from(3));
        let signer = testing::account_signer();

        let request = build(cancel_intent(RelayTarget::direct(testing::ACCOUNT)), &reader, &signer)
            .await
            .unwrap();

        assert_eq!(request.relay_params().user_nonce, U256::from(3));
        assert_eq!(reader.calls("user_nonce"), 1);
        let expected = typed::CancelOrder {
            key: B256::repeat_byte(0xee),
            relayParams: request.relay_params_hash(),
        }
        .eip712_signing_hash(&router_domain(testing::CHAIN_ID, testing::RELAY_ROUTER));
        assert_eq!(request.signing_hash(), expected);
        assert_eq!(request.recover_signer().unwrap(), testing::ACCOUNT);
    }

    #[tokio::test]
    async fn test_pinned_nonce_skips_chain_read() {
        let reader = MockChainReader::new(testing::CHAIN_ID);
        let signer = testing::account_signer();
        let intent =
            cancel_intent(RelayTarget::direct(testing::ACCOUNT)).with_user_nonce(U256::from(11));

        let request = build(intent, &reader, &signer).await.unwrap();
        assert_eq!(request.relay_params().user_nonce, U256::from(11));
        assert_eq!(reader.calls("user_nonce"), 0);
    }

    #[tokio::test]
    async fn test_calldata_carries_signature_and_fee_suffix() {
        let reader = MockChainReader::new(testing::CHAIN_ID);
        let signer = testing::account_signer();
        let request = build(cancel_intent(RelayTarget::direct(testing::ACCOUNT)), &reader, &signer)
            .await
            .unwrap();

        let calldata = request.calldata();
        let (call, suffix) = calldata.split_at(calldata.len() - 72);
        assert_eq!(&suffix[..20], testing::RELAY_ROUTER.as_slice());
        assert_eq!(&suffix[20..40], testing::FEE_TOKEN.as_slice());
        assert_eq!(U256::from_be_slice(&suffix[40..]), U256::from(5));

        let decoded = GelatoRelayRouter::cancelOrderCall::abi_decode(call).unwrap();
        assert_eq!(decoded.account, testing::ACCOUNT);
        assert_eq!(decoded.key, B256::repeat_byte(0xee));
        assert_eq!(
            decoded.relayParams.signature.as_ref(),
            request.signature().as_bytes().as_slice()
        );
        assert_eq!(decoded.relayParams.signature.len(), 65);
    }

    #[tokio::test]
    async fn test_signer_must_match_acting_account() {
        let reader = MockChainReader::new(testing::CHAIN_ID);

        let err = build(
            cancel_intent(RelayTarget::direct(testing::ACCOUNT)),
            &reader,
            &testing::subaccount_signer(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            RelayError::SignerMismatch { expected, actual }
                if expected == testing::ACCOUNT && actual == testing::SUBACCOUNT
        ));

        // Subaccount calls are signed by the subaccount, not the main account
        let target = RelayTarget::subaccount(
            testing::ACCOUNT,
            testing::SUBACCOUNT,
            crate::types::SubaccountApproval::empty(),
        );
        let err = build(cancel_intent(target), &reader, &testing::account_signer())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::SignerMismatch { .. }));
    }

    #[tokio::test]
    async fn test_subaccount_request_uses_subaccount_router() {
        let reader = MockChainReader::new(testing::CHAIN_ID);
        reader.set_user_nonce(testing::SUBACCOUNT_RELAY_ROUTER, testing::SUBACCOUNT, U256::from(9));
        let target = RelayTarget::subaccount(
            testing::ACCOUNT,
            testing::SUBACCOUNT,
            crate::types::SubaccountApproval::empty(),
        );
        let intent = RelayIntent::new(
            1,
            target,
            RelayAction::CreateOrder {
                collateral_delta_amount: U256::from(1000),
                params: CreateOrderParams {
                    order_type: OrderType::MarketIncrease,
                    is_long: true,
                    ..Default::default()
                },
            },
            FeeParams::new(testing::FEE_TOKEN, U256::from(5)),
            U256::from(1999999999u64),
        );

        let request = build(intent, &reader, &testing::subaccount_signer())
            .await
            .unwrap();
        assert_eq!(request.router(), testing::SUBACCOUNT_RELAY_ROUTER);
        assert_eq!(request.relay_params().user_nonce, U256::from(9));
        assert_eq!(request.recover_signer().unwrap(), testing::SUBACCOUNT);

        let call = &request.calldata()[..request.calldata().len() - 72];
        let decoded = SubaccountGelatoRelayRouter::createOrderCall::abi_decode(call).unwrap();
        assert_eq!(decoded.account, testing::ACCOUNT);
        assert_eq!(decoded.subaccount, testing::SUBACCOUNT);
        assert_eq!(decoded.collateralDeltaAmount, U256::from(1000));
        assert_eq!(decoded.params.orderType, 2);
        assert!(decoded.subaccountApproval.signature.is_empty());
    }

    #[tokio::test]
    async fn test_subaccount_nonce_keyed_by_subaccount() {
        let reader = MockChainReader::new(testing::CHAIN_ID);
        reader.set_user_nonce(testing::SUBACCOUNT_RELAY_ROUTER, testing::ACCOUNT, U256::from(2));
        reader.set_user_nonce(testing::SUBACCOUNT_RELAY_ROUTER, testing::SUBACCOUNT, U256::from(5));
        let target = RelayTarget::subaccount(
            testing::ACCOUNT,
            testing::SUBACCOUNT,
            crate::types::SubaccountApproval::empty(),
        );

        let request = build(cancel_intent(target), &reader, &testing::subaccount_signer())
            .await
            .unwrap();
        assert_eq!(request.relay_params().user_nonce, U256::from(5));

        let call = &request.calldata()[..request.calldata().len() - 72];
        let decoded = SubaccountGelatoRelayRouter::cancelOrderCall::abi_decode(call).unwrap();
        assert_eq!(decoded.relayParams.userNonce, U256::from(5));
    }

    #[tokio::test]
    async fn test_relay_params_hash_matches_encoder() {
        let reader = MockChainReader::new(testing::CHAIN_ID);
        let intent = cancel_intent(RelayTarget::direct(testing::ACCOUNT))
            .with_token_permits(vec![testing::token_permit()]);
        let hashed = RelayRequestBuilder::new(&testing::chain(), intent)
            .assemble(&reader)
            .await
            .unwrap()
            .hash()
            .unwrap();
        let encoded = hashed.state.assembled.relay_params.abi_encoded().unwrap();
        assert_eq!(hashed.relay_params_hash(), keccak256(&encoded));
    }
}
