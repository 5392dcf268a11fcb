//! EIP-2612 permit signing.

use alloy::{
    primitives::{Address, B256, U256},
    signers::Signer,
    sol_types::Eip712Domain,
};
use tracing::{debug, info, warn};

use crate::{error::RelayError, reader::ChainReader, types::TokenPermit};

/// EIP-712 domain version assumed for permit tokens.
pub const PERMIT_DOMAIN_VERSION: &str = "2";

/// EIP-712 domain of the permit token at `token`.
pub fn permit_domain(name: impl Into<String>, chain_id: u64, token: Address) -> Eip712Domain {
    let name: String = name.into();
    Eip712Domain::new(
        Some(name.into()),
        Some(PERMIT_DOMAIN_VERSION.into()),
        Some(U256::from(chain_id)),
        Some(token),
        None,
    )
}

/// Signs EIP-2612 permits for tokens readable through a [`ChainReader`].
#[derive(Clone, Debug)]
pub struct PermitSigner<C> {
    reader: C,
}

impl<C: ChainReader> PermitSigner<C> {
    pub fn new(reader: C) -> Self {
        Self { reader }
    }

    /// Whether `token` exposes `DOMAIN_SEPARATOR()` and `nonces(address)`.
    ///
    /// A call failure (revert, missing function, undecodable or empty
    /// response) reports `false`, transport failures are returned.
    pub async fn probe_support(&self, token: Address) -> Result<bool, RelayError> {
        Ok(self.probe(token).await?.is_some())
    }

    async fn probe(&self, token: Address) -> Result<Option<B256>, RelayError> {
        let (separator, nonce) = futures::join!(
            self.reader.domain_separator(token),
            self.reader.permit_nonce(token, Address::ZERO),
        );
        match (separator, nonce.map(|_| ())) {
            (Ok(separator), Ok(())) => Ok(Some(separator)),
            (Err(err), _) | (_, Err(err)) if !err.is_call_failure() => Err(err.into()),
            (Err(err), _) | (_, Err(err)) => {
                debug!(%token, %err, "token does not support permits");
                Ok(None)
            }
        }
    }

    /// Signs a permit for `spender` to move `value` of `token` from the
    /// signer until `deadline`.
    ///
    /// The owner's permit nonce is read at signing time; a permit becomes
    /// invalid once any other permit of the same owner is used first.
    pub async fn sign<S: Signer + Sync>(
        &self,
        signer: &S,
        token: Address,
        spender: Address,
        value: U256,
        deadline: U256,
        chain_id: u64,
    ) -> Result<TokenPermit, RelayError> {
        let Some(separator) = self.probe(token).await? else {
            return Err(RelayError::UnsupportedPermit(token));
        };

        let owner = signer.address();
        let (name, nonce) = futures::try_join!(
            self.reader.token_name(token),
            self.reader.permit_nonce(token, owner),
        )?;
        let domain = permit_domain(name, chain_id, token);
        if domain.separator() != separator {
            warn!(%token, "token domain separator differs from the version 2 permit domain");
        }

        let unsigned = TokenPermit {
            owner,
            spender,
            value,
            deadline,
            token,
            ..Default::default()
        };
        let signature = signer
            .sign_typed_data(&unsigned.message(nonce), &domain)
            .await?;
        info!(%owner, %token, %spender, %nonce, "token permit signed");

        Ok(TokenPermit::from_signature(
            owner, spender, value, deadline, token, &signature,
        ))
    }
}
