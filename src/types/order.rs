use alloy::primitives::{Address, B256, U256};

use crate::abi::{router, typed};

/// Type of the order to create.
///
/// Swap orders:
/// * [`OrderType::MarketSwap`] swaps at the current price on execution.
/// * [`OrderType::LimitSwap`] swaps once the output reaches `min_output_amount`.
///
/// Increase orders:
/// * [`OrderType::MarketIncrease`] opens or increases a position at the current price.
/// * [`OrderType::LimitIncrease`] increases once the price reaches the trigger price.
/// * [`OrderType::StopIncrease`] increases once the price moves past the trigger price
///   in the adverse direction.
///
/// Decrease orders:
/// * [`OrderType::MarketDecrease`] closes or decreases a position at the current price.
/// * [`OrderType::LimitDecrease`] take-profit decrease at the trigger price.
/// * [`OrderType::StopLossDecrease`] stop-loss decrease at the trigger price.
/// * [`OrderType::Liquidation`] is keeper-only and can not be created by users.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum OrderType {
    #[default]
    MarketSwap = 0,
    LimitSwap = 1,
    MarketIncrease = 2,
    LimitIncrease = 3,
    MarketDecrease = 4,
    LimitDecrease = 5,
    StopLossDecrease = 6,
    Liquidation = 7,
    StopIncrease = 8,
}

/// Swap to perform when a position decrease pays out in two tokens.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum DecreasePositionSwapType {
    #[default]
    NoSwap = 0,
    SwapPnlTokenToCollateralToken = 1,
    SwapCollateralTokenToPnlToken = 2,
}

/// Addresses of the order, in on-chain field order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateOrderAddresses {
    pub receiver: Address,
    pub cancellation_receiver: Address,
    pub callback_contract: Address,
    pub ui_fee_receiver: Address,
    pub market: Address,
    pub initial_collateral_token: Address,
    pub swap_path: Vec<Address>,
}

/// Amounts of the order, in on-chain field order. USD values are 30-decimal
/// fixed point, token amounts are in token units.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateOrderNumbers {
    pub size_delta_usd: U256,
    pub initial_collateral_delta_amount: U256,
    pub trigger_price: U256,
    pub acceptable_price: U256,
    pub execution_fee: U256,
    pub callback_gas_limit: U256,
    pub min_output_amount: U256,
    pub valid_from_time: U256,
}

/// Order creation intent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateOrderParams {
    pub addresses: CreateOrderAddresses,
    pub numbers: CreateOrderNumbers,
    pub order_type: OrderType,
    pub decrease_position_swap_type: DecreasePositionSwapType,
    pub is_long: bool,
    pub should_unwrap_native_token: bool,
    pub auto_cancel: bool,
    pub referral_code: B256,
}

/// Changes to an existing order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateOrderParams {
    pub size_delta_usd: U256,
    pub acceptable_price: U256,
    pub trigger_price: U256,
    pub min_output_amount: U256,
    pub valid_from_time: U256,
    pub auto_cancel: bool,
}

impl CreateOrderParams {
    /// EIP-712 `CreateOrder` message binding these params to `relay_params_hash`.
    pub(crate) fn message(
        &self,
        collateral_delta_amount: U256,
        relay_params_hash: B256,
    ) -> typed::CreateOrder {
        let a = &self.addresses;
        let n = &self.numbers;
        typed::CreateOrder {
            collateralDeltaAmount: collateral_delta_amount,
            addresses: typed::CreateOrderAddresses {
                receiver: a.receiver,
                cancellationReceiver: a.cancellation_receiver,
                callbackContract: a.callback_contract,
                uiFeeReceiver: a.ui_fee_receiver,
                market: a.market,
                initialCollateralToken: a.initial_collateral_token,
                swapPath: a.swap_path.clone(),
            },
            numbers: typed::CreateOrderNumbers {
                sizeDeltaUsd: n.size_delta_usd,
                initialCollateralDeltaAmount: n.initial_collateral_delta_amount,
                triggerPrice: n.trigger_price,
                acceptablePrice: n.acceptable_price,
                executionFee: n.execution_fee,
                callbackGasLimit: n.callback_gas_limit,
                minOutputAmount: n.min_output_amount,
                validFromTime: n.valid_from_time,
            },
            orderType: U256::from(self.order_type as u8),
            decreasePositionSwapType: U256::from(self.decrease_position_swap_type as u8),
            isLong: self.is_long,
            shouldUnwrapNativeToken: self.should_unwrap_native_token,
            autoCancel: self.auto_cancel,
            referralCode: self.referral_code,
            relayParams: relay_params_hash,
        }
    }
}

impl UpdateOrderParams {
    pub(crate) fn message(
        &self,
        key: B256,
        increase_execution_fee: bool,
        relay_params_hash: B256,
    ) -> typed::UpdateOrder {
        typed::UpdateOrder {
            key,
            params: typed::UpdateOrderParams {
                sizeDeltaUsd: self.size_delta_usd,
                acceptablePrice: self.acceptable_price,
                triggerPrice: self.trigger_price,
                minOutputAmount: self.min_output_amount,
                validFromTime: self.valid_from_time,
                autoCancel: self.auto_cancel,
            },
            increaseExecutionFee: increase_execution_fee,
            relayParams: relay_params_hash,
        }
    }
}

impl From<&CreateOrderParams> for router::CreateOrderParams {
    fn from(value: &CreateOrderParams) -> Self {
        let a = &value.addresses;
        let n = &value.numbers;
        Self {
            addresses: router::CreateOrderAddresses {
                receiver: a.receiver,
                cancellationReceiver: a.cancellation_receiver,
                callbackContract: a.callback_contract,
                uiFeeReceiver: a.ui_fee_receiver,
                market: a.market,
                initialCollateralToken: a.initial_collateral_token,
                swapPath: a.swap_path.clone(),
            },
            numbers: router::CreateOrderNumbers {
                sizeDeltaUsd: n.size_delta_usd,
                initialCollateralDeltaAmount: n.initial_collateral_delta_amount,
                triggerPrice: n.trigger_price,
                acceptablePrice: n.acceptable_price,
                executionFee: n.execution_fee,
                callbackGasLimit: n.callback_gas_limit,
                minOutputAmount: n.min_output_amount,
                validFromTime: n.valid_from_time,
            },
            orderType: value.order_type as u8,
            decreasePositionSwapType: value.decrease_position_swap_type as u8,
            isLong: value.is_long,
            shouldUnwrapNativeToken: value.should_unwrap_native_token,
            autoCancel: value.auto_cancel,
            referralCode: value.referral_code,
        }
    }
}

impl From<&UpdateOrderParams> for router::UpdateOrderParams {
    fn from(value: &UpdateOrderParams) -> Self {
        Self {
            sizeDeltaUsd: value.size_delta_usd,
            acceptablePrice: value.acceptable_price,
            triggerPrice: value.trigger_price,
            minOutputAmount: value.min_output_amount,
            validFromTime: value.valid_from_time,
            autoCancel: value.auto_cancel,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::sol_types::SolStruct;

    use super::*;

    #[test]
    fn test_message_binds_relay_params_hash() {
        let params = CreateOrderParams {
            order_type: OrderType::MarketIncrease,
            is_long: true,
            ..Default::default()
        };
        let a = params.message(U256::from(10), B256::repeat_byte(1));
        let b = params.message(U256::from(10), B256::repeat_byte(2));
        assert_eq!(a.orderType, U256::from(2));
        assert_ne!(a.eip712_hash_struct(), b.eip712_hash_struct());
    }

    #[test]
    fn test_abi_params_keep_enum_discriminants() {
        let params = CreateOrderParams {
            order_type: OrderType::LimitDecrease,
            decrease_position_swap_type: DecreasePositionSwapType::SwapCollateralTokenToPnlToken,
            ..Default::default()
        };
        let abi = router::CreateOrderParams::from(&params);
        assert_eq!(abi.orderType, 5);
        assert_eq!(abi.decreasePositionSwapType, 2);
    }
}
