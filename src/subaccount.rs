//! Subaccount approval signing.

use std::time::Duration;

use alloy::{
    primitives::{Address, B256, Bytes, U256},
    signers::Signer,
};
use tracing::info;

use crate::{
    Chain,
    error::RelayError,
    reader::ChainReader,
    request::router_domain,
    types::{SUBACCOUNT_ORDER_ACTION, SubaccountApproval},
    unix_timestamp,
};

/// Expiry used when none is given, far enough to never be reached.
pub const DEFAULT_EXPIRES_AT: u64 = 9999999999;

/// Validity of an approval signature when no deadline is given.
pub const DEFAULT_SIGNATURE_VALIDITY: Duration = Duration::from_secs(3600);

/// Terms of a subaccount approval.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubaccountApprovalOptions {
    /// `false` revokes the subaccount.
    pub should_add: bool,
    pub expires_at: U256,
    /// Zero means unlimited.
    pub max_allowed_count: U256,
    pub action_type: B256,
    /// Signature deadline, [`DEFAULT_SIGNATURE_VALIDITY`] after signing
    /// when `None`.
    pub deadline: Option<U256>,
}

/// Signs subaccount approvals for the subaccount relay router of a chain.
#[derive(Clone, Debug)]
pub struct SubaccountApprovalSigner<C> {
    reader: C,
    chain: Chain,
}

impl Default for SubaccountApprovalOptions {
    fn default() -> Self {
        Self {
            should_add: true,
            expires_at: U256::from(DEFAULT_EXPIRES_AT),
            max_allowed_count: U256::ZERO,
            action_type: SUBACCOUNT_ORDER_ACTION,
            deadline: None,
        }
    }
}

impl SubaccountApprovalOptions {
    pub fn revoke() -> Self {
        Self {
            should_add: false,
            ..Default::default()
        }
    }

    pub fn with_expires_at(mut self, expires_at: U256) -> Self {
        self.expires_at = expires_at;
        self
    }

    pub fn with_max_allowed_count(mut self, count: U256) -> Self {
        self.max_allowed_count = count;
        self
    }

    pub fn with_deadline(mut self, deadline: U256) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl<C: ChainReader> SubaccountApprovalSigner<C> {
    pub fn new(reader: C, chain: &Chain) -> Self {
        Self {
            reader,
            chain: chain.clone(),
        }
    }

    /// Signs an approval of `subaccount` by the main account `signer`, over
    /// the main account's current approval nonce.
    pub async fn sign<S: Signer + Sync>(
        &self,
        signer: &S,
        subaccount: Address,
        options: SubaccountApprovalOptions,
    ) -> Result<SubaccountApproval, RelayError> {
        let account = signer.address();
        let router = self.chain.subaccount_relay_router();
        let nonce = self
            .reader
            .subaccount_approval_nonce(router, account)
            .await?;
        let deadline = match options.deadline {
            Some(deadline) => deadline,
            None => U256::from(unix_timestamp()? + DEFAULT_SIGNATURE_VALIDITY.as_secs()),
        };

        let mut approval = SubaccountApproval {
            subaccount,
            should_add: options.should_add,
            expires_at: options.expires_at,
            max_allowed_count: options.max_allowed_count,
            action_type: options.action_type,
            nonce,
            deadline,
            signature: Bytes::new(),
        };
        let domain = router_domain(self.chain.chain_id(), router);
        let signature = signer
            .sign_typed_data(&approval.message(), &domain)
            .await?;
        approval.signature = Bytes::copy_from_slice(&signature.as_bytes());

        info!(
            %account,
            %subaccount,
            %nonce,
            should_add = approval.should_add,
            "subaccount approval signed"
        );
        Ok(approval)
    }
}

#[cfg(test)]
mod tests {
    use alloy::{primitives::Signature, sol_types::SolStruct};

    use super::*;
    use crate::testing::{self, MockChainReader};

    #[tokio::test]
    async fn test_sign_with_defaults() {
        let reader = MockChainReader::new(testing::CHAIN_ID);
        reader.set_subaccount_approval_nonce(
            testing::SUBACCOUNT_RELAY_ROUTER,
            testing::ACCOUNT,
            U256::from(2),
        );
        let approvals = SubaccountApprovalSigner::new(&reader, &testing::chain());
        let before = unix_timestamp().unwrap();

        let approval = approvals
            .sign(
                &testing::account_signer(),
                testing::SUBACCOUNT,
                SubaccountApprovalOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(approval.subaccount, testing::SUBACCOUNT);
        assert!(approval.should_add);
        assert_eq!(approval.expires_at, U256::from(DEFAULT_EXPIRES_AT));
        assert_eq!(approval.max_allowed_count, U256::ZERO);
        assert_eq!(approval.action_type, SUBACCOUNT_ORDER_ACTION);
        assert_eq!(approval.nonce, U256::from(2));
        let deadline = approval.deadline.to::<u64>();
        assert!(deadline >= before + 3600 && deadline <= unix_timestamp().unwrap() + 3600);
        assert_eq!(approval.signature.len(), 65);
        assert_eq!(reader.calls("subaccount_approval_nonce"), 1);
    }

    #[tokio::test]
    async fn test_signature_recovers_main_account() {
        let reader = MockChainReader::new(testing::CHAIN_ID);
        let approvals = SubaccountApprovalSigner::new(&reader, &testing::chain());
        let approval = approvals
            .sign(
                &testing::account_signer(),
                testing::SUBACCOUNT,
                SubaccountApprovalOptions::revoke().with_deadline(U256::from(1999999999u64)),
            )
            .await
            .unwrap();

        assert!(!approval.should_add);
        assert_eq!(approval.deadline, U256::from(1999999999u64));
        let hash = approval.message().eip712_signing_hash(&router_domain(
            testing::CHAIN_ID,
            testing::SUBACCOUNT_RELAY_ROUTER,
        ));
        let signature = Signature::try_from(approval.signature.as_ref()).unwrap();
        assert_eq!(
            signature.recover_address_from_prehash(&hash).unwrap(),
            testing::ACCOUNT
        );
    }
}
