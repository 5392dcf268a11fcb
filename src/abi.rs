//! Solidity bindings of the relay router, the permit token interface and the
//! EIP-712 messages the routers verify.
//!
//! Struct layouts and function parameter orders mirror the deployed contracts;
//! the ABI tuple encoding ignores struct names, the EIP-712 type hashes do not.

#[allow(clippy::too_many_arguments)]
pub mod router {
    alloy::sol! {
        #[derive(Debug, Default, PartialEq, Eq)]
        struct OracleParams {
            address[] tokens;
            address[] providers;
            bytes[] data;
        }

        #[derive(Debug, Default, PartialEq, Eq)]
        struct ExternalCalls {
            address[] externalCallTargets;
            bytes[] externalCallDataList;
            address[] refundTokens;
            address[] refundReceivers;
        }

        #[derive(Debug, Default, PartialEq, Eq)]
        struct TokenPermit {
            address owner;
            address spender;
            uint256 value;
            uint256 deadline;
            uint8 v;
            bytes32 r;
            bytes32 s;
            address token;
        }

        #[derive(Debug, Default, PartialEq, Eq)]
        struct FeeParams {
            address feeToken;
            uint256 feeAmount;
            address[] feeSwapPath;
        }

        #[derive(Debug, Default, PartialEq, Eq)]
        struct RelayParams {
            OracleParams oracleParams;
            ExternalCalls externalCalls;
            TokenPermit[] tokenPermits;
            FeeParams fee;
            uint256 userNonce;
            uint256 deadline;
            bytes signature;
        }

        #[derive(Debug, Default, PartialEq, Eq)]
        struct SubaccountApproval {
            address subaccount;
            bool shouldAdd;
            uint256 expiresAt;
            uint256 maxAllowedCount;
            bytes32 actionType;
            uint256 nonce;
            uint256 deadline;
            bytes signature;
        }

        #[derive(Debug, Default, PartialEq, Eq)]
        struct CreateOrderAddresses {
            address receiver;
            address cancellationReceiver;
            address callbackContract;
            address uiFeeReceiver;
            address market;
            address initialCollateralToken;
            address[] swapPath;
        }

        #[derive(Debug, Default, PartialEq, Eq)]
        struct CreateOrderNumbers {
            uint256 sizeDeltaUsd;
            uint256 initialCollateralDeltaAmount;
            uint256 triggerPrice;
            uint256 acceptablePrice;
            uint256 executionFee;
            uint256 callbackGasLimit;
            uint256 minOutputAmount;
            uint256 validFromTime;
        }

        #[derive(Debug, Default, PartialEq, Eq)]
        struct CreateOrderParams {
            CreateOrderAddresses addresses;
            CreateOrderNumbers numbers;
            uint8 orderType;
            uint8 decreasePositionSwapType;
            bool isLong;
            bool shouldUnwrapNativeToken;
            bool autoCancel;
            bytes32 referralCode;
        }

        #[derive(Debug, Default, PartialEq, Eq)]
        struct UpdateOrderParams {
            uint256 sizeDeltaUsd;
            uint256 acceptablePrice;
            uint256 triggerPrice;
            uint256 minOutputAmount;
            uint256 validFromTime;
            bool autoCancel;
        }

        #[derive(Debug)]
        #[sol(rpc)]
        interface GelatoRelayRouter {
            function userNonces(address account) external view returns (uint256);

            function createOrder(
                RelayParams calldata relayParams,
                address account,
                uint256 collateralDeltaAmount,
                CreateOrderParams memory params
            ) external returns (bytes32);

            function updateOrder(
                RelayParams calldata relayParams,
                address account,
                bytes32 key,
                UpdateOrderParams calldata params,
                bool increaseExecutionFee
            ) external;

            function cancelOrder(
                RelayParams calldata relayParams,
                address account,
                bytes32 key
            ) external;
        }

        #[derive(Debug)]
        #[sol(rpc)]
        interface SubaccountGelatoRelayRouter {
            function userNonces(address account) external view returns (uint256);

            function subaccountApprovalNonces(address account) external view returns (uint256);

            function createOrder(
                RelayParams calldata relayParams,
                SubaccountApproval calldata subaccountApproval,
                address account,
                address subaccount,
                uint256 collateralDeltaAmount,
                CreateOrderParams memory params
            ) external returns (bytes32);

            function updateOrder(
                RelayParams calldata relayParams,
                SubaccountApproval calldata subaccountApproval,
                address account,
                address subaccount,
                bytes32 key,
                UpdateOrderParams calldata params,
                bool increaseExecutionFee
            ) external;

            function cancelOrder(
                RelayParams calldata relayParams,
                SubaccountApproval calldata subaccountApproval,
                address account,
                address subaccount,
                bytes32 key
            ) external;
        }
    }
}

pub mod errors {
    alloy::sol! {
        /// Reverts raised by the relay routers while verifying a relayed call.
        #[derive(Debug, PartialEq, Eq)]
        interface RelayRouter {
            error InvalidSignature(string signatureType);
            error InvalidUserNonce(uint256 storedUserNonce, uint256 userNonce);
            error DeadlinePassed(uint256 currentTimestamp, uint256 deadline);
            error InvalidPermitSpender(address spender, address expectedSpender);
            error InvalidSubaccountApprovalNonce(uint256 storedNonce, uint256 nonce);
            error SubaccountApprovalDeadlinePassed(uint256 currentTimestamp, uint256 deadline);
            error SubaccountApprovalExpired(address account, address subaccount, uint256 expiresAt, uint256 currentTimestamp);
            error MaxSubaccountActionCountExceeded(address account, address subaccount, uint256 count, uint256 maxCount);
            error UnexpectedRelayFeeToken(address feeToken, address expectedFeeToken);
            error InsufficientRelayFee(uint256 requiredRelayFee, uint256 availableFeeAmount);
        }
    }
}

pub mod token {
    alloy::sol! {
        /// Subset of an EIP-2612 capable ERC-20 token.
        #[derive(Debug)]
        #[sol(rpc)]
        interface ERC20Permit {
            function name() external view returns (string memory);
            function nonces(address owner) external view returns (uint256);
            function DOMAIN_SEPARATOR() external view returns (bytes32);
        }
    }
}

/// EIP-712 messages. Type names and field order are part of the type hash.
pub mod typed {
    alloy::sol! {
        #[derive(Debug, PartialEq, Eq)]
        struct Permit {
            address owner;
            address spender;
            uint256 value;
            uint256 nonce;
            uint256 deadline;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct SubaccountApproval {
            address subaccount;
            bool shouldAdd;
            uint256 expiresAt;
            uint256 maxAllowedCount;
            bytes32 actionType;
            uint256 nonce;
            uint256 deadline;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct CreateOrderAddresses {
            address receiver;
            address cancellationReceiver;
            address callbackContract;
            address uiFeeReceiver;
            address market;
            address initialCollateralToken;
            address[] swapPath;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct CreateOrderNumbers {
            uint256 sizeDeltaUsd;
            uint256 initialCollateralDeltaAmount;
            uint256 triggerPrice;
            uint256 acceptablePrice;
            uint256 executionFee;
            uint256 callbackGasLimit;
            uint256 minOutputAmount;
            uint256 validFromTime;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct CreateOrder {
            uint256 collateralDeltaAmount;
            CreateOrderAddresses addresses;
            CreateOrderNumbers numbers;
            uint256 orderType;
            uint256 decreasePositionSwapType;
            bool isLong;
            bool shouldUnwrapNativeToken;
            bool autoCancel;
            bytes32 referralCode;
            bytes32 relayParams;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct UpdateOrderParams {
            uint256 sizeDeltaUsd;
            uint256 acceptablePrice;
            uint256 triggerPrice;
            uint256 minOutputAmount;
            uint256 validFromTime;
            bool autoCancel;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct UpdateOrder {
            bytes32 key;
            UpdateOrderParams params;
            bool increaseExecutionFee;
            bytes32 relayParams;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct CancelOrder {
            bytes32 key;
            bytes32 relayParams;
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::{primitives::b256, sol_types::SolStruct};

    use super::typed;

    #[test]
    fn test_permit_type_hash() {
        assert_eq!(
            typed::Permit::eip712_encode_type(),
            "Permit(address owner,address spender,uint256 value,uint256 nonce,uint256 deadline)"
        );
        assert_eq!(
            typed::Permit::eip712_type_hash(&typed::Permit {
                owner: Default::default(),
                spender: Default::default(),
                value: Default::default(),
                nonce: Default::default(),
                deadline: Default::default(),
            }),
            b256!("0x6e71edae12b1b97f4d1f60370fef10105fa2faae0126114a169c64845d6126c9")
        );
    }

    #[test]
    fn test_create_order_encode_type_lists_referenced_structs() {
        assert_eq!(
            typed::CreateOrder::eip712_encode_type(),
            concat!(
                "CreateOrder(uint256 collateralDeltaAmount,CreateOrderAddresses addresses,",
                "CreateOrderNumbers numbers,uint256 orderType,uint256 decreasePositionSwapType,",
                "bool isLong,bool shouldUnwrapNativeToken,bool autoCancel,bytes32 referralCode,",
                "bytes32 relayParams)",
                "CreateOrderAddresses(address receiver,address cancellationReceiver,",
                "address callbackContract,address uiFeeReceiver,address market,",
                "address initialCollateralToken,address[] swapPath)",
                "CreateOrderNumbers(uint256 sizeDeltaUsd,uint256 initialCollateralDeltaAmount,",
                "uint256 triggerPrice,uint256 acceptablePrice,uint256 executionFee,",
                "uint256 callbackGasLimit,uint256 minOutputAmount,uint256 validFromTime)",
            )
        );
    }

    #[test]
    fn test_subaccount_approval_encode_type() {
        assert_eq!(
            typed::SubaccountApproval::eip712_encode_type(),
            concat!(
                "SubaccountApproval(address subaccount,bool shouldAdd,uint256 expiresAt,",
                "uint256 maxAllowedCount,bytes32 actionType,uint256 nonce,uint256 deadline)"
            )
        );
    }
}
