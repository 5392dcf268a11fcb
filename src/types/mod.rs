mod order;
mod permit;
mod relay;
mod subaccount;

pub use order::{
    CreateOrderAddresses, CreateOrderNumbers, CreateOrderParams, DecreasePositionSwapType,
    OrderType, UpdateOrderParams,
};
pub use permit::TokenPermit;
pub use relay::{ExternalCalls, FeeParams, OracleParams, RelayParams};
pub use subaccount::{SUBACCOUNT_ORDER_ACTION, SubaccountApproval, subaccount_order_action};

/// Caller-assigned ID of a relay request, used to correlate log events.
pub type RequestId = u64;

/// Relay network task ID.
pub type TaskId = String;
