use alloy::primitives::{Address, Bytes, U256};

use super::TokenPermit;
use crate::{
    abi::router,
    encoder::{EncodeStruct, StructLayout, StructValue, layouts},
};

/// Price attestations for the tokens the action touches. Empty unless the
/// action swaps or otherwise needs fresh prices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OracleParams {
    pub tokens: Vec<Address>,
    pub providers: Vec<Address>,
    pub data: Vec<Bytes>,
}

/// Calls the router makes before charging the relay fee, e.g. an external
/// swap into the fee token. Empty by default.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExternalCalls {
    pub external_call_targets: Vec<Address>,
    pub external_call_data_list: Vec<Bytes>,
    pub refund_tokens: Vec<Address>,
    pub refund_receivers: Vec<Address>,
}

/// Relay fee reimbursement: `fee_amount` of `fee_token`, optionally swapped
/// from collateral along `fee_swap_path`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeeParams {
    pub fee_token: Address,
    pub fee_amount: U256,
    pub fee_swap_path: Vec<Address>,
}

/// Envelope of every relayed action.
///
/// `user_nonce` is the router's per-account counter; a reused nonce is
/// rejected on-chain rather than producing a different signature.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelayParams {
    pub oracle_params: OracleParams,
    pub external_calls: ExternalCalls,
    pub token_permits: Vec<TokenPermit>,
    pub fee: FeeParams,
    pub user_nonce: U256,
    pub deadline: U256,
}

impl FeeParams {
    pub fn new(fee_token: Address, fee_amount: U256) -> Self {
        Self {
            fee_token,
            fee_amount,
            fee_swap_path: vec![],
        }
    }
}

impl RelayParams {
    /// On-chain `RelayParams` carrying the action signature.
    pub fn to_abi(&self, signature: Bytes) -> router::RelayParams {
        router::RelayParams {
            oracleParams: (&self.oracle_params).into(),
            externalCalls: (&self.external_calls).into(),
            tokenPermits: self.token_permits.iter().map(Into::into).collect(),
            fee: (&self.fee).into(),
            userNonce: self.user_nonce,
            deadline: self.deadline,
            signature,
        }
    }
}

impl EncodeStruct for OracleParams {
    const LAYOUT: &'static StructLayout = &layouts::ORACLE_PARAMS;

    fn struct_value(&self) -> StructValue {
        StructValue::new()
            .with("tokens", self.tokens.clone())
            .with("providers", self.providers.clone())
            .with("data", self.data.clone())
    }
}

impl EncodeStruct for ExternalCalls {
    const LAYOUT: &'static StructLayout = &layouts::EXTERNAL_CALLS;

    fn struct_value(&self) -> StructValue {
        StructValue::new()
            .with("externalCallTargets", self.external_call_targets.clone())
            .with("externalCallDataList", self.external_call_data_list.clone())
            .with("refundTokens", self.refund_tokens.clone())
            .with("refundReceivers", self.refund_receivers.clone())
    }
}

impl EncodeStruct for FeeParams {
    const LAYOUT: &'static StructLayout = &layouts::FEE_PARAMS;

    fn struct_value(&self) -> StructValue {
        StructValue::new()
            .with("feeToken", self.fee_token)
            .with("feeAmount", self.fee_amount)
            .with("feeSwapPath", self.fee_swap_path.clone())
    }
}

impl EncodeStruct for RelayParams {
    const LAYOUT: &'static StructLayout = &layouts::RELAY_PARAMS_HASH_INPUT;

    fn struct_value(&self) -> StructValue {
        StructValue::new()
            .with("oracleParams", self.oracle_params.struct_value())
            .with("externalCalls", self.external_calls.struct_value())
            .with(
                "tokenPermits",
                self.token_permits
                    .iter()
                    .map(EncodeStruct::struct_value)
                    .collect::<Vec<_>>(),
            )
            .with("fee", self.fee.struct_value())
            .with("userNonce", self.user_nonce)
            .with("deadline", self.deadline)
    }
}

impl From<&OracleParams> for router::OracleParams {
    fn from(value: &OracleParams) -> Self {
        Self {
            tokens: value.tokens.clone(),
            providers: value.providers.clone(),
            data: value.data.clone(),
        }
    }
}

impl From<&ExternalCalls> for router::ExternalCalls {
    fn from(value: &ExternalCalls) -> Self {
        Self {
            externalCallTargets: value.external_call_targets.clone(),
            externalCallDataList: value.external_call_data_list.clone(),
            refundTokens: value.refund_tokens.clone(),
            refundReceivers: value.refund_receivers.clone(),
        }
    }
}

impl From<&FeeParams> for router::FeeParams {
    fn from(value: &FeeParams) -> Self {
        Self {
            feeToken: value.fee_token,
            feeAmount: value.fee_amount,
            feeSwapPath: value.fee_swap_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        hex,
        primitives::{B256, address, b256, keccak256},
        sol_types::SolValue,
    };

    use super::*;
    use crate::testing;

    fn scenario_params() -> RelayParams {
        RelayParams {
            oracle_params: OracleParams::default(),
            external_calls: ExternalCalls::default(),
            token_permits: vec![testing::token_permit()],
            fee: FeeParams::new(testing::FEE_TOKEN, U256::from(5)),
            user_nonce: U256::from(3),
            deadline: U256::from(1999999999u64),
        }
    }

    /// Same tuple as the router's `keccak256(abi.encode(oracleParams,
    /// externalCalls, tokenPermits, fee, userNonce, deadline))`, through the
    /// `sol!` generated static encoder.
    fn static_hash(params: &RelayParams) -> B256 {
        let abi = params.to_abi(Bytes::new());
        keccak256(
            (
                abi.oracleParams,
                abi.externalCalls,
                abi.tokenPermits,
                abi.fee,
                abi.userNonce,
                abi.deadline,
            )
                .abi_encode_params(),
        )
    }

    #[test]
    fn test_relay_params_hash_is_stable() {
        let params = scenario_params();
        assert_eq!(params.struct_hash(), params.struct_hash());
        assert_eq!(
            params.struct_hash().unwrap(),
            scenario_params().struct_hash().unwrap()
        );
    }

    #[test]
    fn test_relay_params_hash_matches_static_encoder() {
        let params = scenario_params();
        assert_eq!(params.struct_hash().unwrap(), static_hash(&params));

        let mut busy = scenario_params();
        busy.oracle_params = OracleParams {
            tokens: vec![address!("0x82af49447d8a07e3bd95bd0d56f35241523fbab1")],
            providers: vec![address!("0x3333333333333333333333333333333333333333")],
            data: vec![Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef])],
        };
        busy.external_calls = ExternalCalls {
            external_call_targets: vec![address!("0x4444444444444444444444444444444444444444")],
            external_call_data_list: vec![Bytes::from_static(&[1; 37])],
            refund_tokens: vec![testing::FEE_TOKEN],
            refund_receivers: vec![testing::ACCOUNT],
        };
        busy.fee.fee_swap_path = vec![address!("0x5555555555555555555555555555555555555555")];
        busy.token_permits.push(TokenPermit::default());
        assert_eq!(busy.struct_hash().unwrap(), static_hash(&busy));
    }

    #[test]
    fn test_relay_params_hash_golden() {
        assert_eq!(
            scenario_params().struct_hash().unwrap(),
            b256!("0x1d8b557789c3dd08d3071213d997527342ddce01527ef01852b4dad25c0ee051")
        );
    }

    #[test]
    fn test_empty_relay_params_encoding_head() {
        let encoded = RelayParams::default().abi_encoded().unwrap();
        // Six head words: four offsets (oracleParams, externalCalls,
        // tokenPermits, fee are dynamic) and two static nonces
        assert_eq!(
            &encoded[..6 * 32],
            hex!(
                "00000000000000000000000000000000000000000000000000000000000000c0"
                "0000000000000000000000000000000000000000000000000000000000000180"
                "0000000000000000000000000000000000000000000000000000000000000280"
                "00000000000000000000000000000000000000000000000000000000000002a0"
                "0000000000000000000000000000000000000000000000000000000000000000"
                "0000000000000000000000000000000000000000000000000000000000000000"
            )
            .as_slice()
        );
    }

    #[test]
    fn test_fee_amount_changes_hash() {
        let base = scenario_params().struct_hash().unwrap();
        let mut bumped = scenario_params();
        bumped.fee.fee_amount = U256::from(6);
        assert_ne!(base, bumped.struct_hash().unwrap());
    }

    #[test]
    fn test_every_field_changes_hash() {
        let base = scenario_params().struct_hash().unwrap();
        let other = address!("0x9999999999999999999999999999999999999999");
        let mutations: Vec<(&str, Box<dyn Fn(&mut RelayParams)>)> = vec![
            ("userNonce", Box::new(|p| p.user_nonce = U256::from(4))),
            ("deadline", Box::new(|p| p.deadline += U256::from(1))),
            ("fee.feeToken", Box::new(move |p| p.fee.fee_token = other)),
            ("fee.feeAmount", Box::new(|p| p.fee.fee_amount = U256::from(6))),
            (
                "fee.feeSwapPath",
                Box::new(move |p| p.fee.fee_swap_path.push(other)),
            ),
            (
                "oracleParams.tokens",
                Box::new(move |p| p.oracle_params.tokens.push(other)),
            ),
            (
                "oracleParams.providers",
                Box::new(move |p| p.oracle_params.providers.push(other)),
            ),
            (
                "oracleParams.data",
                Box::new(|p| p.oracle_params.data.push(Bytes::new())),
            ),
            (
                "externalCalls.externalCallTargets",
                Box::new(move |p| p.external_calls.external_call_targets.push(other)),
            ),
            (
                "externalCalls.externalCallDataList",
                Box::new(|p| p.external_calls.external_call_data_list.push(Bytes::new())),
            ),
            (
                "externalCalls.refundTokens",
                Box::new(move |p| p.external_calls.refund_tokens.push(other)),
            ),
            (
                "externalCalls.refundReceivers",
                Box::new(move |p| p.external_calls.refund_receivers.push(other)),
            ),
            (
                "tokenPermits.owner",
                Box::new(move |p| p.token_permits[0].owner = other),
            ),
            (
                "tokenPermits.spender",
                Box::new(move |p| p.token_permits[0].spender = other),
            ),
            (
                "tokenPermits.value",
                Box::new(|p| p.token_permits[0].value += U256::from(1)),
            ),
            (
                "tokenPermits.deadline",
                Box::new(|p| p.token_permits[0].deadline += U256::from(1)),
            ),
            ("tokenPermits.v", Box::new(|p| p.token_permits[0].v = 28)),
            (
                "tokenPermits.r",
                Box::new(|p| p.token_permits[0].r = B256::repeat_byte(0x0f)),
            ),
            (
                "tokenPermits.s",
                Box::new(|p| p.token_permits[0].s = B256::repeat_byte(0x0f)),
            ),
            (
                "tokenPermits.token",
                Box::new(move |p| p.token_permits[0].token = other),
            ),
            ("tokenPermits[]", Box::new(|p| p.token_permits.clear())),
        ];
        for (field, mutate) in mutations {
            let mut params = scenario_params();
            mutate(&mut params);
            assert_ne!(
                base,
                params.struct_hash().unwrap(),
                "{field} change kept the hash"
            );
        }
    }

    #[test]
    fn test_swapped_field_order_changes_hash() {
        use crate::encoder::{Field, FieldType, hash, layouts};

        const SWAPPED: StructLayout = StructLayout {
            name: "RelayParams",
            fields: &[
                Field {
                    name: "oracleParams",
                    ty: FieldType::Struct(&layouts::ORACLE_PARAMS),
                },
                Field {
                    name: "externalCalls",
                    ty: FieldType::Struct(&layouts::EXTERNAL_CALLS),
                },
                Field {
                    name: "tokenPermits",
                    ty: FieldType::Array(&FieldType::Struct(&layouts::TOKEN_PERMIT)),
                },
                Field {
                    name: "fee",
                    ty: FieldType::Struct(&layouts::FEE_PARAMS),
                },
                Field {
                    name: "deadline",
                    ty: FieldType::Uint(256),
                },
                Field {
                    name: "userNonce",
                    ty: FieldType::Uint(256),
                },
            ],
        };
        let params = scenario_params();
        assert_ne!(
            params.struct_hash().unwrap(),
            hash(&SWAPPED, &params.struct_value()).unwrap()
        );
    }
}
