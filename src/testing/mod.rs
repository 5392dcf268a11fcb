//! Test fixtures and in-memory doubles of the chain and the relay network.
//!
//! [`MockChainReader`] serves token and router state from memory and counts
//! reads per method, [`StubRelayApi`] replays a scripted sequence of task
//! statuses. Signers use the well-known Anvil development keys.

use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use alloy::{
    primitives::{Address, B256, U256, address},
    signers::local::PrivateKeySigner,
};
use dashmap::{DashMap, DashSet};

use crate::{
    Chain,
    error::{ProviderError, RevertReason, RouterError},
    permit,
    reader::ChainReader,
    submit::{RelayApi, RelayApiError, SyncFeeRequest, TaskState, TaskStatus},
    types::{self, TokenPermit},
};

pub const CHAIN_ID: u64 = 42161;

/// Address of [`account_signer`].
pub const ACCOUNT: Address = address!("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
/// Address of [`subaccount_signer`].
pub const SUBACCOUNT: Address = address!("0x70997970c51812dc3a010c7d01b50e0d17dc79c8");

pub const RELAY_ROUTER: Address = address!("0x7777777777777777777777777777777777777777");
pub const SUBACCOUNT_RELAY_ROUTER: Address = address!("0x8888888888888888888888888888888888888888");
pub const FEE_TOKEN: Address = address!("0x6666666666666666666666666666666666666666");
pub const PERMIT_TOKEN: Address = address!("0xaf88d065e77c8cc2239327c5edb3a432268e5831");
pub const PERMIT_TOKEN_NAME: &str = "USD Coin";

const ACCOUNT_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const SUBACCOUNT_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

pub fn chain() -> Chain {
    Chain::custom(CHAIN_ID, RELAY_ROUTER, SUBACCOUNT_RELAY_ROUTER)
}

pub fn account_signer() -> PrivateKeySigner {
    signer(ACCOUNT_KEY)
}

pub fn subaccount_signer() -> PrivateKeySigner {
    signer(SUBACCOUNT_KEY)
}

fn signer(key: &str) -> PrivateKeySigner {
    key.parse().expect("valid development key")
}

/// Permit of [`ACCOUNT`] to [`RELAY_ROUTER`] with a fixed dummy signature.
pub fn token_permit() -> TokenPermit {
    TokenPermit {
        owner: ACCOUNT,
        spender: RELAY_ROUTER,
        value: U256::from(1000),
        deadline: U256::from(1999999999u64),
        v: 27,
        r: B256::repeat_byte(1),
        s: B256::repeat_byte(2),
        token: PERMIT_TOKEN,
    }
}

pub fn task_status(task_state: TaskState) -> TaskStatus {
    TaskStatus {
        task_state,
        last_check_message: None,
        transaction_hash: None,
    }
}

/// In-memory [`ChainReader`].
///
/// Tokens registered with [`Self::with_token`] are EIP-2612 capable, any
/// other token reverts on permit reads. Unset nonces read as zero.
#[derive(Debug)]
pub struct MockChainReader {
    chain_id: u64,
    token_names: DashMap<Address, String>,
    plain_tokens: DashSet<Address>,
    permit_nonces: DashMap<(Address, Address), U256>,
    user_nonces: DashMap<(Address, Address), U256>,
    approval_nonces: DashMap<(Address, Address), U256>,
    calls: DashMap<&'static str, usize>,
    offline: AtomicBool,
}

impl MockChainReader {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            token_names: DashMap::new(),
            plain_tokens: DashSet::new(),
            permit_nonces: DashMap::new(),
            user_nonces: DashMap::new(),
            approval_nonces: DashMap::new(),
            calls: DashMap::new(),
            offline: AtomicBool::new(false),
        }
    }

    /// Registers an EIP-2612 token.
    pub fn with_token(self, token: Address, name: &str) -> Self {
        self.token_names.insert(token, name.to_string());
        self
    }

    /// Registers an ERC-20 token without permit support: `name()` succeeds,
    /// permit getters revert.
    pub fn with_plain_token(self, token: Address, name: &str) -> Self {
        self.token_names.insert(token, name.to_string());
        self.plain_tokens.insert(token);
        self
    }

    pub fn set_permit_nonce(&self, token: Address, owner: Address, nonce: U256) {
        self.permit_nonces.insert((token, owner), nonce);
    }

    pub fn set_user_nonce(&self, router: Address, account: Address, nonce: U256) {
        self.user_nonces.insert((router, account), nonce);
    }

    pub fn set_subaccount_approval_nonce(&self, router: Address, account: Address, nonce: U256) {
        self.approval_nonces.insert((router, account), nonce);
    }

    /// Makes every read fail with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of reads of `method`, named after the [`ChainReader`] method.
    pub fn calls(&self, method: &str) -> usize {
        self.calls.get(method).map(|c| *c).unwrap_or_default()
    }

    fn record(&self, method: &'static str) -> Result<(), RouterError> {
        *self.calls.entry(method).or_default() += 1;
        if self.offline.load(Ordering::SeqCst) {
            return Err(ProviderError::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    fn permit_token(&self, token: Address) -> Result<String, RouterError> {
        match self.token_names.get(&token) {
            Some(name) if !self.plain_tokens.contains(&token) => Ok(name.clone()),
            _ => Err(ProviderError::Reverted(Box::new(RevertReason::Unknown))),
        }
    }
}

impl ChainReader for MockChainReader {
    async fn domain_separator(&self, token: Address) -> Result<B256, RouterError> {
        self.record("domain_separator")?;
        let name = self.permit_token(token)?;
        Ok(permit::permit_domain(name, self.chain_id, token).separator())
    }

    async fn permit_nonce(&self, token: Address, owner: Address) -> Result<U256, RouterError> {
        self.record("permit_nonce")?;
        self.permit_token(token)?;
        Ok(self
            .permit_nonces
            .get(&(token, owner))
            .map(|n| *n)
            .unwrap_or_default())
    }

    async fn token_name(&self, token: Address) -> Result<String, RouterError> {
        self.record("token_name")?;
        self.token_names
            .get(&token)
            .map(|n| n.clone())
            .ok_or(ProviderError::Reverted(Box::new(RevertReason::Unknown)))
    }

    async fn user_nonce(&self, router: Address, account: Address) -> Result<U256, RouterError> {
        self.record("user_nonce")?;
        Ok(self
            .user_nonces
            .get(&(router, account))
            .map(|n| *n)
            .unwrap_or_default())
    }

    async fn subaccount_approval_nonce(
        &self,
        router: Address,
        account: Address,
    ) -> Result<U256, RouterError> {
        self.record("subaccount_approval_nonce")?;
        Ok(self
            .approval_nonces
            .get(&(router, account))
            .map(|n| *n)
            .unwrap_or_default())
    }
}

/// Scripted [`RelayApi`].
///
/// Status queries replay the script in order and keep returning its last
/// entry once exhausted. A `None` entry fails the query.
#[derive(Debug)]
pub struct StubRelayApi {
    task_id: types::TaskId,
    script: Mutex<VecDeque<Option<TaskStatus>>>,
    submitted: Mutex<Vec<SyncFeeRequest>>,
    status_queries: AtomicUsize,
    reject_submissions: bool,
}

impl StubRelayApi {
    pub fn new(task_id: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            script: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(vec![]),
            status_queries: AtomicUsize::new(0),
            reject_submissions: false,
        }
    }

    pub fn with_status(self, status: TaskStatus) -> Self {
        self.script
            .lock()
            .expect("not poisoned")
            .push_back(Some(status));
        self
    }

    pub fn with_failed_query(self) -> Self {
        self.script.lock().expect("not poisoned").push_back(None);
        self
    }

    /// Answers every submission with HTTP 400.
    pub fn rejecting_submissions(mut self) -> Self {
        self.reject_submissions = true;
        self
    }

    pub fn submitted(&self) -> Vec<SyncFeeRequest> {
        self.submitted.lock().expect("not poisoned").clone()
    }

    pub fn status_queries(&self) -> usize {
        self.status_queries.load(Ordering::SeqCst)
    }
}

impl RelayApi for StubRelayApi {
    async fn call_with_sync_fee(
        &self,
        request: &SyncFeeRequest,
    ) -> Result<types::TaskId, RelayApiError> {
        if self.reject_submissions {
            return Err(RelayApiError::Status {
                status: 400,
                body: "invalid request".to_string(),
            });
        }
        self.submitted
            .lock()
            .expect("not poisoned")
            .push(request.clone());
        Ok(self.task_id.clone())
    }

    async fn task_status(&self, task_id: &types::TaskId) -> Result<TaskStatus, RelayApiError> {
        self.status_queries.fetch_add(1, Ordering::SeqCst);
        if *task_id != self.task_id {
            return Err(RelayApiError::Status {
                status: 404,
                body: format!("task {task_id} not found"),
            });
        }
        let mut script = self.script.lock().expect("not poisoned");
        let entry = if script.len() > 1 {
            script.pop_front().flatten()
        } else {
            match script.front() {
                Some(entry) => entry.clone(),
                None => Some(task_status(TaskState::CheckPending)),
            }
        };
        entry.ok_or(RelayApiError::Status {
            status: 503,
            body: "service unavailable".to_string(),
        })
    }
}
