//! Deterministic `abi.encode` of declared struct layouts.
//!
//! A [`StructLayout`] fixes field names, order and ABI types exactly as the
//! verifying contract declares them. A [`StructValue`] only carries named
//! values; the encoded field order always comes from the layout, so a value
//! built in any order encodes identically.
//!
//! [`encode`] produces the same bytes as Solidity's `abi.encode(f1, .., fN)`
//! over the layout's top-level fields (nested structs are tuples, arrays and
//! bytes are length-prefixed). [`hash`] is keccak-256 of that encoding.

mod error;
pub mod layouts;

pub use error::EncodingError;

use std::{collections::BTreeMap, fmt};

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, B256, Bytes, U256, keccak256},
};

/// ABI type of a declared field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    Address,
    Bool,
    /// `uintN`, width in bits.
    Uint(usize),
    /// `bytesN`, length in bytes.
    FixedBytes(usize),
    Bytes,
    /// Dynamic array `T[]`.
    Array(&'static FieldType),
    Struct(&'static StructLayout),
}

/// Named field of a [`StructLayout`].
#[derive(Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
}

/// Ordered field list mirroring an on-chain struct or parameter tuple.
#[derive(Debug, PartialEq, Eq)]
pub struct StructLayout {
    pub name: &'static str,
    pub fields: &'static [Field],
}

/// Plain value matching a [`FieldType`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Address(Address),
    Bool(bool),
    Uint(U256),
    FixedBytes(Bytes),
    Bytes(Bytes),
    Array(Vec<Value>),
    Struct(StructValue),
}

/// Named field values of one struct instance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StructValue {
    fields: BTreeMap<&'static str, Value>,
}

/// Rust type with a fixed on-chain struct layout.
pub trait EncodeStruct {
    const LAYOUT: &'static StructLayout;

    fn struct_value(&self) -> StructValue;

    fn abi_encoded(&self) -> Result<Bytes, EncodingError> {
        encode(Self::LAYOUT, &self.struct_value())
    }

    fn struct_hash(&self) -> Result<B256, EncodingError> {
        hash(Self::LAYOUT, &self.struct_value())
    }
}

/// ABI-encodes `value` as the parameter tuple declared by `layout`.
pub fn encode(layout: &StructLayout, value: &StructValue) -> Result<Bytes, EncodingError> {
    let fields = to_sol_fields(layout, value, layout.name)?;
    Ok(DynSolValue::Tuple(fields).abi_encode_params().into())
}

/// keccak-256 of [`encode`].
pub fn hash(layout: &StructLayout, value: &StructValue) -> Result<B256, EncodingError> {
    encode(layout, value).map(keccak256)
}

fn to_sol_fields(
    layout: &StructLayout,
    value: &StructValue,
    path: &str,
) -> Result<Vec<DynSolValue>, EncodingError> {
    if let Some(extra) = value
        .fields
        .keys()
        .find(|name| !layout.fields.iter().any(|f| f.name == **name))
    {
        return Err(EncodingError::UnexpectedField(format!("{path}.{extra}")));
    }
    layout
        .fields
        .iter()
        .map(|field| {
            let field_path = format!("{path}.{}", field.name);
            let v = value
                .fields
                .get(field.name)
                .ok_or_else(|| EncodingError::MissingField(field_path.clone()))?;
            to_sol_value(&field.ty, v, &field_path)
        })
        .collect()
}

fn to_sol_value(ty: &FieldType, value: &Value, path: &str) -> Result<DynSolValue, EncodingError> {
    let mismatch = || EncodingError::TypeMismatch {
        path: path.to_string(),
        expected: ty.to_string(),
    };
    match (ty, value) {
        (FieldType::Address, Value::Address(a)) => Ok(DynSolValue::Address(*a)),
        (FieldType::Bool, Value::Bool(b)) => Ok(DynSolValue::Bool(*b)),
        (FieldType::Uint(bits), Value::Uint(u)) => {
            if u.bit_len() > *bits {
                return Err(EncodingError::Overflow {
                    path: path.to_string(),
                    bits: *bits,
                });
            }
            Ok(DynSolValue::Uint(*u, *bits))
        }
        (FieldType::FixedBytes(len), Value::FixedBytes(b)) => {
            if b.len() != *len || *len > 32 {
                return Err(EncodingError::InvalidFixedBytes {
                    path: path.to_string(),
                    expected: *len,
                    actual: b.len(),
                });
            }
            Ok(DynSolValue::FixedBytes(B256::right_padding_from(b), *len))
        }
        (FieldType::Bytes, Value::Bytes(b)) => Ok(DynSolValue::Bytes(b.to_vec())),
        (FieldType::Array(inner), Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| to_sol_value(inner, item, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(DynSolValue::Array),
        (FieldType::Struct(layout), Value::Struct(v)) => {
            to_sol_fields(layout, v, path).map(DynSolValue::Tuple)
        }
        _ => Err(mismatch()),
    }
}

impl StructValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets field `name`, replacing any previous value.
    pub fn with(mut self, name: &'static str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &'static str, value: impl Into<Value>) {
        self.fields.insert(name, value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }
}

impl StructLayout {
    /// Solidity tuple signature, e.g. `(address,uint256,address[])`.
    pub fn tuple_signature(&self) -> String {
        let inner: Vec<String> = self.fields.iter().map(|f| f.ty.to_string()).collect();
        format!("({})", inner.join(","))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Address => write!(f, "address"),
            FieldType::Bool => write!(f, "bool"),
            FieldType::Uint(bits) => write!(f, "uint{bits}"),
            FieldType::FixedBytes(len) => write!(f, "bytes{len}"),
            FieldType::Bytes => write!(f, "bytes"),
            FieldType::Array(inner) => write!(f, "{inner}[]"),
            FieldType::Struct(layout) => write!(f, "{}", layout.tuple_signature()),
        }
    }
}

impl From<Address> for Value {
    fn from(value: Address) -> Self {
        Value::Address(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<U256> for Value {
    fn from(value: U256) -> Self {
        Value::Uint(value)
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::Uint(U256::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Uint(U256::from(value))
    }
}

impl From<B256> for Value {
    fn from(value: B256) -> Self {
        Value::FixedBytes(Bytes::copy_from_slice(value.as_slice()))
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Bytes(value)
    }
}

impl From<StructValue> for Value {
    fn from(value: StructValue) -> Self {
        Value::Struct(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}
