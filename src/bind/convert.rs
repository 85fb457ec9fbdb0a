//! Conversions between JSON values and ABI values.
//!
//! Used wherever arguments arrive as JSON (the CLI, config files) and when
//! decoded results or events are printed.

use alloy::dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy::json_abi::Param;
use alloy::primitives::{Address, FixedBytes, I256, U256};
use serde_json::Value;
use std::str::FromStr;

use super::abi::value_in_range;
use super::error::{BindError, Result};

/// Converts method parameters given either as a JSON array (positional) or a
/// JSON object (by name) into ABI values.
pub fn values_from_json(inputs: &[Param], parameters: &Value) -> Result<Vec<DynSolValue>> {
    let describe = || -> String {
        inputs
            .iter()
            .map(|input| format!("{}: {}", input.name, input.ty))
            .collect::<Vec<_>>()
            .join(", ")
    };

    match parameters {
        Value::Null if inputs.is_empty() => Ok(Vec::new()),
        Value::Array(params) => {
            if params.len() != inputs.len() {
                return Err(BindError::Encoding(format!(
                    "parameter count mismatch: expected {}, got {}. Expected parameters: [{}]",
                    inputs.len(),
                    params.len(),
                    describe()
                )));
            }

            inputs
                .iter()
                .zip(params)
                .enumerate()
                .map(|(i, (input, value))| {
                    param_to_dyn_sol_value(value, input).map_err(|e| {
                        BindError::Encoding(format!(
                            "invalid parameter #{} ('{}' of type '{}'): {}",
                            i + 1,
                            input.name,
                            input.ty,
                            e
                        ))
                    })
                })
                .collect()
        }
        Value::Object(obj) => inputs
            .iter()
            .map(|input| {
                let value = obj.get(&input.name).ok_or_else(|| {
                    BindError::Encoding(format!(
                        "missing parameter '{}' of type '{}'. Expected parameters: {{{}}}",
                        input.name,
                        input.ty,
                        describe()
                    ))
                })?;
                param_to_dyn_sol_value(value, input).map_err(|e| {
                    BindError::Encoding(format!(
                        "invalid parameter '{}' of type '{}': {}",
                        input.name, input.ty, e
                    ))
                })
            })
            .collect(),
        other => Err(BindError::Encoding(format!(
            "parameters must be an array or an object with fields {{{}}}, got {}",
            describe(),
            other
        ))),
    }
}

/// Struct parameters carry `tuple` as their type string, so the type is
/// resolved from the full parameter description.
fn param_to_dyn_sol_value(value: &Value, input: &Param) -> Result<DynSolValue> {
    let ty = input
        .resolve()
        .map_err(|e| BindError::Encoding(format!("unsupported type '{}': {}", input.ty, e)))?;
    json_to_typed(value, &ty)
}

/// Converts one JSON value to an ABI value of the given Solidity type.
pub fn json_to_dyn_sol_value(value: &Value, sol_type: &str) -> Result<DynSolValue> {
    let ty = DynSolType::parse(sol_type)
        .map_err(|e| BindError::Encoding(format!("unsupported type '{}': {}", sol_type, e)))?;
    json_to_typed(value, &ty)
}

fn json_to_typed(value: &Value, ty: &DynSolType) -> Result<DynSolValue> {
    match ty {
        DynSolType::Address => {
            let s = value
                .as_str()
                .ok_or_else(|| BindError::Encoding("address must be a string".into()))?;
            let address = Address::from_str(s)
                .map_err(|e| BindError::Encoding(format!("invalid address '{}': {}", s, e)))?;
            Ok(DynSolValue::Address(address))
        }
        DynSolType::Bool => value
            .as_bool()
            .map(DynSolValue::Bool)
            .ok_or_else(|| BindError::Encoding("bool must be a boolean".into())),
        DynSolType::String => value
            .as_str()
            .map(|s| DynSolValue::String(s.to_string()))
            .ok_or_else(|| BindError::Encoding("string parameter must be a string".into())),
        DynSolType::Uint(bits) => checked(DynSolValue::Uint(json_to_u256(value)?, *bits), value),
        DynSolType::Int(bits) => checked(DynSolValue::Int(json_to_i256(value)?, *bits), value),
        DynSolType::Bytes => Ok(DynSolValue::Bytes(json_to_bytes(value)?)),
        DynSolType::FixedBytes(size) => {
            let bytes = json_to_bytes(value)?;
            if bytes.len() > *size {
                return Err(BindError::Encoding(format!(
                    "bytes{} value has {} bytes",
                    size,
                    bytes.len()
                )));
            }
            let mut word = [0u8; 32];
            word[..bytes.len()].copy_from_slice(&bytes);
            Ok(DynSolValue::FixedBytes(FixedBytes::from(word), *size))
        }
        DynSolType::Array(inner) => {
            let items = value
                .as_array()
                .ok_or_else(|| BindError::Encoding("array parameter must be an array".into()))?;
            let values = items
                .iter()
                .map(|item| json_to_typed(item, inner))
                .collect::<Result<Vec<_>>>()?;
            Ok(DynSolValue::Array(values))
        }
        DynSolType::FixedArray(inner, len) => {
            let items = value
                .as_array()
                .ok_or_else(|| BindError::Encoding("array parameter must be an array".into()))?;
            if items.len() != *len {
                return Err(BindError::Encoding(format!(
                    "expected {} array elements, got {}",
                    len,
                    items.len()
                )));
            }
            let values = items
                .iter()
                .map(|item| json_to_typed(item, inner))
                .collect::<Result<Vec<_>>>()?;
            Ok(DynSolValue::FixedArray(values))
        }
        DynSolType::Tuple(types) => {
            let items = value
                .as_array()
                .ok_or_else(|| BindError::Encoding("tuple parameter must be an array".into()))?;
            if items.len() != types.len() {
                return Err(BindError::Encoding(format!(
                    "expected {} tuple elements, got {}",
                    types.len(),
                    items.len()
                )));
            }
            let values = items
                .iter()
                .zip(types)
                .map(|(item, ty)| json_to_typed(item, ty))
                .collect::<Result<Vec<_>>>()?;
            Ok(DynSolValue::Tuple(values))
        }
        other => Err(BindError::Encoding(format!(
            "unsupported type '{}'",
            other.sol_type_name()
        ))),
    }
}

fn checked(number: DynSolValue, value: &Value) -> Result<DynSolValue> {
    if value_in_range(&number) {
        Ok(number)
    } else {
        Err(BindError::Encoding(format!(
            "{} is out of range for {}",
            value,
            number.sol_type_name().unwrap_or_default()
        )))
    }
}

fn json_to_u256(value: &Value) -> Result<U256> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| BindError::Encoding(format!("invalid uint value {}", n))),
        Value::String(s) => {
            let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) => U256::from_str_radix(hex, 16),
                None => U256::from_str_radix(s, 10),
            };
            parsed.map_err(|_| BindError::Encoding(format!("invalid uint string '{}'", s)))
        }
        _ => Err(BindError::Encoding("uint must be a number or string".into())),
    }
}

fn json_to_i256(value: &Value) -> Result<I256> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(I256::try_from)
            .and_then(|r| r.ok())
            .ok_or_else(|| BindError::Encoding(format!("invalid int value {}", n))),
        Value::String(s) => I256::from_dec_str(s)
            .map_err(|_| BindError::Encoding(format!("invalid int string '{}'", s))),
        _ => Err(BindError::Encoding("int must be a number or string".into())),
    }
}

fn json_to_bytes(value: &Value) -> Result<Vec<u8>> {
    let s = value
        .as_str()
        .ok_or_else(|| BindError::Encoding("bytes must be a hex string".into()))?;
    hex::decode(s.trim_start_matches("0x"))
        .map_err(|_| BindError::Encoding(format!("invalid hex string '{}'", s)))
}

/// Converts decoded return values to JSON. A single value is returned bare,
/// several values as an array.
pub fn dyn_sol_values_to_json(values: &[DynSolValue]) -> Value {
    match values {
        [] => Value::Null,
        [single] => dyn_sol_value_to_json(single),
        many => Value::Array(many.iter().map(dyn_sol_value_to_json).collect()),
    }
}

/// Converts a single ABI value to JSON. Integers become decimal strings so
/// that 256-bit values survive.
pub fn dyn_sol_value_to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Address(addr) => Value::String(format!("0x{:x}", addr)),
        DynSolValue::Uint(num, _) => Value::String(num.to_string()),
        DynSolValue::Int(num, _) => Value::String(num.to_string()),
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Bytes(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
        DynSolValue::FixedBytes(word, size) => {
            Value::String(format!("0x{}", hex::encode(&word[..*size])))
        }
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(dyn_sol_value_to_json).collect())
        }
        other => Value::String(format!("{:?}", other)),
    }
}
