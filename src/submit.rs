//! Submission of signed calldata to the relay network and tracking of the
//! resulting relay task.

use std::{fmt, time::Duration};

use alloy::primitives::{Address, B256, Bytes};
use serde::{Deserialize, Serialize, Serializer};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    abi::errors::RelayRouter::RelayRouterErrors,
    error::{RelayError, RevertReason},
    request::SignedRelayRequest,
    types,
};

/// Public Gelato relay endpoint.
pub const GELATO_RELAY_URL: &str = "https://api.gelato.digital";

/// Default interval between task status queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Failure of a single relay API call.
#[derive(Debug, thiserror::Error)]
pub enum RelayApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("relay api responded {status}: {body}")]
    Status { status: u16, body: String },
}

/// "Call with sync fee" submission: the relay executes `data` on `target`
/// and collects its fee in `fee_token` from the call itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFeeRequest {
    #[serde(serialize_with = "serialize_display")]
    pub chain_id: u64,
    pub target: Address,
    pub data: Bytes,
    pub fee_token: Address,
    /// Calldata already carries the fee context suffix.
    pub is_relay_context: bool,
}

/// Lifecycle state of a relay task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    CheckPending,
    ExecPending,
    WaitingForConfirmation,
    ExecSuccess,
    ExecReverted,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// Relay task status snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    pub task_state: TaskState,
    #[serde(default)]
    pub last_check_message: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
}

/// Terminal result of a relay task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelayOutcome {
    Success { tx_hash: Option<B256> },
    Reverted(String),
    Cancelled(String),
}

/// Status polling schedule. `timeout: None` waits indefinitely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Option<Duration>,
}

/// Relay network HTTP API.
#[allow(async_fn_in_trait)]
pub trait RelayApi {
    async fn call_with_sync_fee(
        &self,
        request: &SyncFeeRequest,
    ) -> Result<types::TaskId, RelayApiError>;

    async fn task_status(&self, task_id: &types::TaskId) -> Result<TaskStatus, RelayApiError>;
}

impl<T: RelayApi> RelayApi for &T {
    async fn call_with_sync_fee(
        &self,
        request: &SyncFeeRequest,
    ) -> Result<types::TaskId, RelayApiError> {
        (**self).call_with_sync_fee(request).await
    }

    async fn task_status(&self, task_id: &types::TaskId) -> Result<TaskStatus, RelayApiError> {
        (**self).task_status(task_id).await
    }
}

/// [`RelayApi`] of the Gelato relay.
#[derive(Clone, Debug)]
pub struct GelatoRelayApi {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

/// Submits signed relay requests and tracks their tasks to completion.
#[derive(Clone, Debug)]
pub struct RelaySubmissionClient<A> {
    api: A,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    task_id: types::TaskId,
}

#[derive(Deserialize)]
struct TaskStatusResponse {
    task: TaskStatus,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::ExecSuccess | TaskState::ExecReverted | TaskState::Cancelled
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskState::CheckPending => "CheckPending",
            TaskState::ExecPending => "ExecPending",
            TaskState::WaitingForConfirmation => "WaitingForConfirmation",
            TaskState::ExecSuccess => "ExecSuccess",
            TaskState::ExecReverted => "ExecReverted",
            TaskState::Cancelled => "Cancelled",
            TaskState::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

impl RelayOutcome {
    /// Terminal outcome of the task, `None` while it is still in progress.
    pub fn from_status(status: &TaskStatus) -> Option<Self> {
        let message = || status.last_check_message.clone().unwrap_or_default();
        match status.task_state {
            TaskState::ExecSuccess => Some(RelayOutcome::Success {
                tx_hash: status.transaction_hash,
            }),
            TaskState::ExecReverted => Some(RelayOutcome::Reverted(message())),
            TaskState::Cancelled => Some(RelayOutcome::Cancelled(message())),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RelayOutcome::Success { .. })
    }

    /// Router revert decoded from the relay's check message of a reverted
    /// task.
    pub fn revert_reason(&self) -> Option<RevertReason<RelayRouterErrors>> {
        match self {
            RelayOutcome::Reverted(message) => Some(RevertReason::from_message(message)),
            _ => None,
        }
    }

    /// Transaction hash of a successful task, or [`RelayError::RelayExecution`].
    pub fn into_result(self, task_id: &types::TaskId) -> Result<Option<B256>, RelayError> {
        match self {
            RelayOutcome::Success { tx_hash } => Ok(tx_hash),
            RelayOutcome::Reverted(message) => Err(RelayError::RelayExecution {
                task_id: task_id.clone(),
                state: TaskState::ExecReverted.to_string(),
                message,
            }),
            RelayOutcome::Cancelled(message) => Err(RelayError::RelayExecution {
                task_id: task_id.clone(),
                state: TaskState::Cancelled.to_string(),
                message,
            }),
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self { interval, timeout }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

impl GelatoRelayApi {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: None,
        }
    }

    /// Sends `key` as `X-API-Key` with every request.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("X-API-Key", key),
            None => builder,
        }
    }
}

impl RelayApi for GelatoRelayApi {
    async fn call_with_sync_fee(
        &self,
        request: &SyncFeeRequest,
    ) -> Result<types::TaskId, RelayApiError> {
        let url = self.endpoint("relays/v2/call-with-sync-fee");
        let response = self
            .authorize(self.client.post(&url))
            .json(request)
            .send()
            .await?;

        if response.status().is_success() {
            let submitted: SubmitResponse = response.json().await?;
            Ok(submitted.task_id)
        } else {
            Err(RelayApiError::Status {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }

    async fn task_status(&self, task_id: &types::TaskId) -> Result<TaskStatus, RelayApiError> {
        let url = self.endpoint(&format!("tasks/status/{task_id}"));
        let response = self.authorize(self.client.get(&url)).send().await?;

        if response.status().is_success() {
            let status: TaskStatusResponse = response.json().await?;
            Ok(status.task)
        } else {
            Err(RelayApiError::Status {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }
}

impl<A: RelayApi> RelaySubmissionClient<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Submits a signed relay request to its router.
    pub async fn submit(&self, request: &SignedRelayRequest) -> Result<types::TaskId, RelayError> {
        let task_id = self
            .submit_calldata(
                request.chain_id(),
                request.router(),
                request.calldata().clone(),
                request.fee_token(),
            )
            .await?;
        info!(request_id = request.request_id(), %task_id, "relay request submitted");
        Ok(task_id)
    }

    /// Submits raw calldata, which must already carry the fee context suffix.
    pub async fn submit_calldata(
        &self,
        chain_id: u64,
        target: Address,
        data: Bytes,
        fee_token: Address,
    ) -> Result<types::TaskId, RelayError> {
        let request = SyncFeeRequest {
            chain_id,
            target,
            data,
            fee_token,
            is_relay_context: false,
        };
        debug!(chain_id, %target, %fee_token, len = request.data.len(), "submitting calldata");
        Ok(self.api.call_with_sync_fee(&request).await?)
    }

    /// Polls the task status with `policy` until the task reaches a terminal
    /// state.
    ///
    /// Failed status queries are logged and polling continues. The timeout
    /// covers both the time spent in `sleep` and the wall clock, so it also
    /// applies to sleep functions that do not actually wait.
    pub async fn await_completion<S, SFut>(
        &self,
        task_id: &types::TaskId,
        policy: PollPolicy,
        sleep: S,
    ) -> Result<RelayOutcome, RelayError>
    where
        S: Fn(Duration) -> SFut,
        SFut: Future<Output = ()>,
    {
        let started = Instant::now();
        let mut slept = Duration::ZERO;
        loop {
            match self.api.task_status(task_id).await {
                Ok(status) => match RelayOutcome::from_status(&status) {
                    Some(outcome) => {
                        info!(%task_id, state = %status.task_state, "relay task finished");
                        return Ok(outcome);
                    }
                    None => debug!(%task_id, state = %status.task_state, "relay task pending"),
                },
                Err(err) => warn!(%task_id, %err, "relay task status query failed"),
            }

            let pause = match policy.timeout {
                None => policy.interval,
                Some(timeout) => {
                    let remaining = timeout.saturating_sub(started.elapsed().max(slept));
                    if remaining.is_zero() {
                        warn!(%task_id, ?timeout, "relay task timed out");
                        return Err(RelayError::Timeout(task_id.clone()));
                    }
                    policy.interval.min(remaining)
                }
            };
            sleep(pause).await;
            slept += pause;
        }
    }
}

fn serialize_display<T: fmt::Display, S: Serializer>(value: &T, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(value)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use alloy::primitives::b256;
    use tokio_test::assert_ok;

    use super::*;
    use crate::testing::{self, StubRelayApi};

    fn recording_sleep() -> (
        Arc<Mutex<Vec<Duration>>>,
        impl Fn(Duration) -> std::future::Ready<()>,
    ) {
        let log = Arc::new(Mutex::new(vec![]));
        let sleep = {
            let log = log.clone();
            move |d| {
                log.lock().unwrap().push(d);
                std::future::ready(())
            }
        };
        (log, sleep)
    }

    #[test]
    fn test_task_status_deserializes_gelato_payload() {
        let payload = r#"{
            "task": {
                "chainId": 42161,
                "taskId": "0xabc",
                "taskState": "ExecSuccess",
                "creationDate": "2025-01-01T00:00:00.000Z",
                "transactionHash": "0x1111111111111111111111111111111111111111111111111111111111111111"
            }
        }"#;
        let status: TaskStatusResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(status.task.task_state, TaskState::ExecSuccess);
        assert_eq!(status.task.last_check_message, None);
        assert_eq!(status.task.transaction_hash, Some(B256::repeat_byte(0x11)));
    }

    #[test]
    fn test_unknown_task_state_is_pending() {
        let status: TaskStatus =
            serde_json::from_str(r#"{"taskState":"Blacklisted","lastCheckMessage":"x"}"#).unwrap();
        assert_eq!(status.task_state, TaskState::Unknown);
        assert_eq!(RelayOutcome::from_status(&status), None);
    }

    #[test]
    fn test_sync_fee_request_wire_format() {
        let request = SyncFeeRequest {
            chain_id: 42161,
            target: testing::RELAY_ROUTER,
            data: Bytes::from(vec![0xab, 0xcd]),
            fee_token: testing::FEE_TOKEN,
            is_relay_context: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["chainId"], "42161");
        assert_eq!(json["data"], "0xabcd");
        assert_eq!(json["isRelayContext"], false);
        assert_eq!(
            json["feeToken"].as_str().unwrap().to_lowercase(),
            testing::FEE_TOKEN.to_string().to_lowercase()
        );
    }

    #[test]
    fn test_terminal_state_mapping() {
        let status = |task_state, msg: &str| TaskStatus {
            task_state,
            last_check_message: Some(msg.to_string()),
            transaction_hash: None,
        };
        assert_eq!(
            RelayOutcome::from_status(&status(TaskState::ExecReverted, "out of fee")),
            Some(RelayOutcome::Reverted("out of fee".to_string()))
        );
        assert_eq!(
            RelayOutcome::from_status(&status(TaskState::Cancelled, "expired")),
            Some(RelayOutcome::Cancelled("expired".to_string()))
        );
        assert_eq!(
            RelayOutcome::from_status(&status(TaskState::WaitingForConfirmation, "")),
            None
        );

        assert!(matches!(
            RelayOutcome::Reverted("out of fee".to_string()).revert_reason(),
            Some(RevertReason::Generic(_))
        ));
        assert!(RelayOutcome::Cancelled(String::new()).revert_reason().is_none());
        assert!(TaskState::Cancelled.is_terminal());
        assert!(!TaskState::Unknown.is_terminal());

        let err = RelayOutcome::Reverted("out of fee".to_string())
            .into_result(&"0x01".to_string())
            .unwrap_err();
        assert!(matches!(
            err,
            RelayError::RelayExecution { ref state, ref message, .. }
                if state == "ExecReverted" && message == "out of fee"
        ));
    }

    #[tokio::test]
    async fn test_await_completion_polls_until_terminal() {
        let tx_hash = b256!("0x2222222222222222222222222222222222222222222222222222222222222222");
        let api = StubRelayApi::new("0xtask")
            .with_status(testing::task_status(TaskState::CheckPending))
            .with_failed_query()
            .with_status(testing::task_status(TaskState::ExecPending))
            .with_status(TaskStatus {
                task_state: TaskState::ExecSuccess,
                last_check_message: None,
                transaction_hash: Some(tx_hash),
            });
        let client = RelaySubmissionClient::new(&api);
        let (slept, sleep) = recording_sleep();

        let outcome = assert_ok!(
            client
                .await_completion(&"0xtask".to_string(), PollPolicy::default(), sleep)
                .await
        );
        assert_eq!(
            outcome,
            RelayOutcome::Success {
                tx_hash: Some(tx_hash)
            }
        );
        assert_eq!(api.status_queries(), 4);
        assert_eq!(*slept.lock().unwrap(), vec![DEFAULT_POLL_INTERVAL; 3]);
    }

    #[tokio::test]
    async fn test_await_completion_times_out() {
        let api =
            StubRelayApi::new("0xtask").with_status(testing::task_status(TaskState::CheckPending));
        let client = RelaySubmissionClient::new(&api);
        let (slept, sleep) = recording_sleep();
        let policy = PollPolicy::default().with_timeout(Duration::from_secs(5));

        let err = client
            .await_completion(&"0xtask".to_string(), policy, sleep)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Timeout(ref id) if id == "0xtask"));
        assert_eq!(api.status_queries(), 4);
        assert_eq!(
            *slept.lock().unwrap(),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(2),
                Duration::from_secs(1)
            ]
        );
    }

    #[tokio::test]
    async fn test_submit_calldata_forwards_request() {
        let api = StubRelayApi::new("0xtask");
        let client = RelaySubmissionClient::new(&api);
        let task_id = client
            .submit_calldata(
                testing::CHAIN_ID,
                testing::RELAY_ROUTER,
                Bytes::from(vec![1, 2, 3]),
                testing::FEE_TOKEN,
            )
            .await
            .unwrap();
        assert_eq!(task_id, "0xtask");

        let submitted = api.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].target, testing::RELAY_ROUTER);
        assert!(!submitted[0].is_relay_context);
    }

    #[tokio::test]
    async fn test_submit_rejection_surfaces_api_error() {
        let api = StubRelayApi::new("0xtask").rejecting_submissions();
        let client = RelaySubmissionClient::new(&api);
        let err = client
            .submit_calldata(
                testing::CHAIN_ID,
                testing::RELAY_ROUTER,
                Bytes::new(),
                testing::FEE_TOKEN,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RelayError::RelayApi(RelayApiError::Status { status: 400, .. })
        ));
    }
}
