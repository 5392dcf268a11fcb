//! Layouts of the structs the relay routers hash.

use super::{Field, FieldType, StructLayout};

const ADDRESS_ARRAY: FieldType = FieldType::Array(&FieldType::Address);
const BYTES_ARRAY: FieldType = FieldType::Array(&FieldType::Bytes);
const UINT256: FieldType = FieldType::Uint(256);

pub const ORACLE_PARAMS: StructLayout = StructLayout {
    name: "OracleParams",
    fields: &[
        Field {
            name: "tokens",
            ty: ADDRESS_ARRAY,
        },
        Field {
            name: "providers",
            ty: ADDRESS_ARRAY,
        },
        Field {
            name: "data",
            ty: BYTES_ARRAY,
        },
    ],
};

pub const EXTERNAL_CALLS: StructLayout = StructLayout {
    name: "ExternalCalls",
    fields: &[
        Field {
            name: "externalCallTargets",
            ty: ADDRESS_ARRAY,
        },
        Field {
            name: "externalCallDataList",
            ty: BYTES_ARRAY,
        },
        Field {
            name: "refundTokens",
            ty: ADDRESS_ARRAY,
        },
        Field {
            name: "refundReceivers",
            ty: ADDRESS_ARRAY,
        },
    ],
};

pub const TOKEN_PERMIT: StructLayout = StructLayout {
    name: "TokenPermit",
    fields: &[
        Field {
            name: "owner",
            ty: FieldType::Address,
        },
        Field {
            name: "spender",
            ty: FieldType::Address,
        },
        Field {
            name: "value",
            ty: UINT256,
        },
        Field {
            name: "deadline",
            ty: UINT256,
        },
        Field {
            name: "v",
            ty: FieldType::Uint(8),
        },
        Field {
            name: "r",
            ty: FieldType::FixedBytes(32),
        },
        Field {
            name: "s",
            ty: FieldType::FixedBytes(32),
        },
        Field {
            name: "token",
            ty: FieldType::Address,
        },
    ],
};

pub const FEE_PARAMS: StructLayout = StructLayout {
    name: "FeeParams",
    fields: &[
        Field {
            name: "feeToken",
            ty: FieldType::Address,
        },
        Field {
            name: "feeAmount",
            ty: UINT256,
        },
        Field {
            name: "feeSwapPath",
            ty: ADDRESS_ARRAY,
        },
    ],
};

/// Parameters hashed into `relayParams` of every signed action, in the order
/// the router recomputes them.
pub const RELAY_PARAMS_HASH_INPUT: StructLayout = StructLayout {
    name: "RelayParams",
    fields: &[
        Field {
            name: "oracleParams",
            ty: FieldType::Struct(&ORACLE_PARAMS),
        },
        Field {
            name: "externalCalls",
            ty: FieldType::Struct(&EXTERNAL_CALLS),
        },
        Field {
            name: "tokenPermits",
            ty: FieldType::Array(&FieldType::Struct(&TOKEN_PERMIT)),
        },
        Field {
            name: "fee",
            ty: FieldType::Struct(&FEE_PARAMS),
        },
        Field {
            name: "userNonce",
            ty: UINT256,
        },
        Field {
            name: "deadline",
            ty: UINT256,
        },
    ],
};

pub const SUBACCOUNT_APPROVAL: StructLayout = StructLayout {
    name: "SubaccountApproval",
    fields: &[
        Field {
            name: "subaccount",
            ty: FieldType::Address,
        },
        Field {
            name: "shouldAdd",
            ty: FieldType::Bool,
        },
        Field {
            name: "expiresAt",
            ty: UINT256,
        },
        Field {
            name: "maxAllowedCount",
            ty: UINT256,
        },
        Field {
            name: "actionType",
            ty: FieldType::FixedBytes(32),
        },
        Field {
            name: "nonce",
            ty: UINT256,
        },
        Field {
            name: "deadline",
            ty: UINT256,
        },
        Field {
            name: "signature",
            ty: FieldType::Bytes,
        },
    ],
};
