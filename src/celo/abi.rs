//! Solidity ABI encoding and decoding for the primitive types the adapter
//! supports, plus function selector derivation.
//!
//! Static types occupy one 32-byte word. `string` and `bytes` use the
//! head/tail layout: the head carries the byte offset of the payload measured
//! from the start of the argument block, the tail carries a length word and the
//! payload right-padded to a word boundary.

use alloy::primitives::{keccak256, Address, U256};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::error::{CeloError, CeloResult};
use super::hex::{decode_hex_bytes, encode_hex_bytes, parse_quantity};
use super::utils;

pub const WORD: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum AbiType {
    Address,
    Uint256,
    Bool,
    Bytes32,
    String,
    Bytes,
}

impl AbiType {
    /// Name used in canonical function signatures.
    pub fn canonical(&self) -> &'static str {
        match self {
            AbiType::Address => "address",
            AbiType::Uint256 => "uint256",
            AbiType::Bool => "bool",
            AbiType::Bytes32 => "bytes32",
            AbiType::String => "string",
            AbiType::Bytes => "bytes",
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, AbiType::String | AbiType::Bytes)
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

impl FromStr for AbiType {
    type Err = CeloError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "address" => Ok(AbiType::Address),
            "uint256" | "uint" => Ok(AbiType::Uint256),
            "bool" => Ok(AbiType::Bool),
            "bytes32" => Ok(AbiType::Bytes32),
            "string" => Ok(AbiType::String),
            "bytes" => Ok(AbiType::Bytes),
            other => Err(CeloError::UnsupportedType(other.to_string())),
        }
    }
}

impl TryFrom<String> for AbiType {
    type Error = CeloError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A typed ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Address(Address),
    Uint(U256),
    Bool(bool),
    FixedBytes([u8; WORD]),
    String(String),
    Bytes(Vec<u8>),
}

impl AbiValue {
    pub fn abi_type(&self) -> AbiType {
        match self {
            AbiValue::Address(_) => AbiType::Address,
            AbiValue::Uint(_) => AbiType::Uint256,
            AbiValue::Bool(_) => AbiType::Bool,
            AbiValue::FixedBytes(_) => AbiType::Bytes32,
            AbiValue::String(_) => AbiType::String,
            AbiValue::Bytes(_) => AbiType::Bytes,
        }
    }

    /// Builds a value of type `ty` from a JSON parameter.
    pub fn from_json(ty: AbiType, value: &Value) -> CeloResult<Self> {
        match ty {
            AbiType::Address => {
                let s = value
                    .as_str()
                    .ok_or_else(|| CeloError::encoding("address must be a string"))?;
                Ok(AbiValue::Address(utils::validate_address(s)?))
            }
            AbiType::Uint256 => uint_from_json(value).map(AbiValue::Uint),
            AbiType::Bool => match value {
                Value::Bool(b) => Ok(AbiValue::Bool(*b)),
                Value::String(s) if s == "true" => Ok(AbiValue::Bool(true)),
                Value::String(s) if s == "false" => Ok(AbiValue::Bool(false)),
                _ => Err(CeloError::encoding("bool must be true or false")),
            },
            AbiType::Bytes32 => {
                let s = value
                    .as_str()
                    .ok_or_else(|| CeloError::encoding("bytes32 must be a hex string"))?;
                let bytes = decode_hex_bytes(s)?;
                if bytes.len() > WORD {
                    return Err(CeloError::encoding(format!(
                        "bytes32 value is {} bytes long",
                        bytes.len()
                    )));
                }
                let mut word = [0u8; WORD];
                word[..bytes.len()].copy_from_slice(&bytes);
                Ok(AbiValue::FixedBytes(word))
            }
            AbiType::String => value
                .as_str()
                .map(|s| AbiValue::String(s.to_string()))
                .ok_or_else(|| CeloError::encoding("string parameter must be a string")),
            AbiType::Bytes => {
                let s = value
                    .as_str()
                    .ok_or_else(|| CeloError::encoding("bytes must be a hex string"))?;
                Ok(AbiValue::Bytes(decode_hex_bytes(s)?))
            }
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            AbiValue::Bool(b) => Value::Bool(*b),
            other => Value::String(other.to_string()),
        }
    }
}

impl fmt::Display for AbiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiValue::Address(addr) => write!(f, "0x{:x}", addr),
            AbiValue::Uint(n) => write!(f, "{}", n),
            AbiValue::Bool(b) => write!(f, "{}", b),
            AbiValue::FixedBytes(word) => f.write_str(&encode_hex_bytes(word)),
            AbiValue::String(s) => f.write_str(s),
            AbiValue::Bytes(bytes) => f.write_str(&encode_hex_bytes(bytes)),
        }
    }
}

fn uint_from_json(value: &Value) -> CeloResult<U256> {
    match value {
        Value::Number(n) => n.as_u64().map(U256::from).ok_or_else(|| {
            CeloError::encoding(format!(
                "uint256 must be a non-negative integer, got {}",
                n
            ))
        }),
        Value::String(s) => {
            if s.trim_start().starts_with('-') {
                return Err(CeloError::encoding(format!(
                    "uint256 cannot be negative: {}",
                    s
                )));
            }
            parse_quantity(s).map_err(|e| CeloError::encoding(format!("uint256 {}", e)))
        }
        _ => Err(CeloError::encoding("uint256 must be a number or string")),
    }
}

/// Encodes a static value into its single 32-byte word.
pub fn encode_word(value: &AbiValue) -> CeloResult<[u8; WORD]> {
    let mut word = [0u8; WORD];
    match value {
        AbiValue::Address(addr) => word[12..].copy_from_slice(addr.as_slice()),
        AbiValue::Uint(n) => word = n.to_be_bytes::<WORD>(),
        AbiValue::Bool(b) => word[WORD - 1] = u8::from(*b),
        AbiValue::FixedBytes(bytes) => word = *bytes,
        AbiValue::String(_) | AbiValue::Bytes(_) => {
            return Err(CeloError::encoding(format!(
                "{} is dynamic and has no single-word encoding",
                value.abi_type()
            )))
        }
    }
    Ok(word)
}

fn usize_word(n: usize) -> [u8; WORD] {
    U256::from(n).to_be_bytes::<WORD>()
}

/// Length word followed by the payload right-padded to a word boundary.
fn encode_tail(payload: &[u8]) -> Vec<u8> {
    let padded = payload.len().div_ceil(WORD) * WORD;
    let mut out = Vec::with_capacity(WORD + padded);
    out.extend_from_slice(&usize_word(payload.len()));
    out.extend_from_slice(payload);
    out.resize(WORD + padded, 0);
    out
}

/// Encodes an argument list with the standard head/tail layout.
pub fn encode_params(values: &[AbiValue]) -> CeloResult<Vec<u8>> {
    let head_len = values.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for value in values {
        match value {
            AbiValue::String(s) => {
                head.extend_from_slice(&usize_word(head_len + tail.len()));
                tail.extend(encode_tail(s.as_bytes()));
            }
            AbiValue::Bytes(bytes) => {
                head.extend_from_slice(&usize_word(head_len + tail.len()));
                tail.extend(encode_tail(bytes));
            }
            static_value => head.extend_from_slice(&encode_word(static_value)?),
        }
    }

    head.extend(tail);
    Ok(head)
}

/// `name(type1,type2)` with canonical type names and no spaces.
pub fn function_signature(name: &str, inputs: &[AbiType]) -> CeloResult<String> {
    let name = name.trim();
    utils::validate_function_name(name)?;
    let args: Vec<&str> = inputs.iter().map(AbiType::canonical).collect();
    Ok(format!("{}({})", name, args.join(",")))
}

/// First four bytes of the Keccak-256 digest of a canonical signature.
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash.as_slice()[..4]);
    selector
}

pub fn selector_hex(signature: &str) -> String {
    encode_hex_bytes(&function_selector(signature))
}

/// `0x` + selector + encoded arguments.
pub fn encode_function_call(name: &str, args: &[AbiValue]) -> CeloResult<String> {
    let types: Vec<AbiType> = args.iter().map(AbiValue::abi_type).collect();
    let signature = function_signature(name, &types)?;
    let mut data = function_selector(&signature).to_vec();
    data.extend(encode_params(args)?);
    Ok(encode_hex_bytes(&data))
}

/// Sequential reader over a word-aligned return payload.
#[derive(Debug, Clone)]
pub struct AbiDecoder {
    data: Vec<u8>,
    offset: usize,
}

impl AbiDecoder {
    pub fn new(result_hex: &str) -> CeloResult<Self> {
        Self::with_offset(result_hex, 0)
    }

    /// Starts decoding at `offset` bytes into the payload.
    pub fn with_offset(result_hex: &str, offset: usize) -> CeloResult<Self> {
        Ok(Self {
            data: decode_hex_bytes(result_hex)?,
            offset,
        })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn word_at(&self, at: usize) -> CeloResult<&[u8]> {
        let end = at.checked_add(WORD);
        end.and_then(|end| self.data.get(at..end)).ok_or_else(|| {
            CeloError::encoding(format!(
                "result has {} bytes, cannot read a word at offset {}",
                self.data.len(),
                at
            ))
        })
    }

    fn usize_at(&self, at: usize) -> CeloResult<usize> {
        let value = U256::from_be_slice(self.word_at(at)?);
        if value > U256::from(self.data.len()) {
            return Err(CeloError::encoding(format!(
                "offset or length {} exceeds result size {}",
                value,
                self.data.len()
            )));
        }
        Ok(value.to::<usize>())
    }

    /// Decodes one value of type `ty` and advances by one word.
    pub fn next(&mut self, ty: AbiType) -> CeloResult<AbiValue> {
        let value = self.decode_at(self.offset, ty)?;
        self.offset += WORD;
        Ok(value)
    }

    pub fn decode_at(&self, at: usize, ty: AbiType) -> CeloResult<AbiValue> {
        let word = self.word_at(at)?;
        match ty {
            AbiType::Address => Ok(AbiValue::Address(Address::from_slice(&word[12..]))),
            AbiType::Uint256 => Ok(AbiValue::Uint(U256::from_be_slice(word))),
            AbiType::Bool => Ok(AbiValue::Bool(word[WORD - 1] & 1 == 1)),
            AbiType::Bytes32 => {
                let mut fixed = [0u8; WORD];
                fixed.copy_from_slice(word);
                Ok(AbiValue::FixedBytes(fixed))
            }
            AbiType::String => {
                let bytes = self.dynamic_payload(at)?;
                String::from_utf8(bytes)
                    .map(AbiValue::String)
                    .map_err(|e| CeloError::encoding(format!("string is not UTF-8: {}", e)))
            }
            AbiType::Bytes => self.dynamic_payload(at).map(AbiValue::Bytes),
        }
    }

    fn dynamic_payload(&self, at: usize) -> CeloResult<Vec<u8>> {
        let start = self.usize_at(at)?;
        let len = self.usize_at(start)?;
        let begin = start.saturating_add(WORD);
        self.data
            .get(begin..begin.saturating_add(len))
            .map(<[u8]>::to_vec)
            .ok_or_else(|| {
                CeloError::encoding(format!(
                    "dynamic value of {} bytes at offset {} overruns the result",
                    len, start
                ))
            })
    }
}

/// Decodes the single value at the start of an `eth_call` result.
pub fn decode_value(result_hex: &str, ty: AbiType) -> CeloResult<AbiValue> {
    AbiDecoder::new(result_hex)?.next(ty)
}

/// A contract function from the fixed allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedFunction {
    pub name: &'static str,
    pub inputs: &'static [AbiType],
    pub output: AbiType,
}

impl NamedFunction {
    pub fn signature(&self) -> String {
        let args: Vec<&str> = self.inputs.iter().map(AbiType::canonical).collect();
        format!("{}({})", self.name, args.join(","))
    }

    pub fn selector_hex(&self) -> String {
        selector_hex(&self.signature())
    }

    /// Encodes calldata after checking the arguments match the declared inputs.
    pub fn encode_call(&self, args: &[AbiValue]) -> CeloResult<String> {
        if args.len() != self.inputs.len() {
            return Err(CeloError::encoding(format!(
                "{} expects {} arguments, got {}",
                self.signature(),
                self.inputs.len(),
                args.len()
            )));
        }
        for (i, (arg, expected)) in args.iter().zip(self.inputs).enumerate() {
            if arg.abi_type() != *expected {
                return Err(CeloError::encoding(format!(
                    "argument #{} of {} must be {}, got {}",
                    i + 1,
                    self.signature(),
                    expected,
                    arg.abi_type()
                )));
            }
        }
        encode_function_call(self.name, args)
    }

    pub fn decode_output(&self, result_hex: &str) -> CeloResult<AbiValue> {
        decode_value(result_hex, self.output)
    }
}

pub mod functions {
    use super::{AbiType, NamedFunction};

    pub const BALANCE_OF: NamedFunction = NamedFunction {
        name: "balanceOf",
        inputs: &[AbiType::Address],
        output: AbiType::Uint256,
    };

    pub const TOTAL_SUPPLY: NamedFunction = NamedFunction {
        name: "totalSupply",
        inputs: &[],
        output: AbiType::Uint256,
    };

    pub const DECIMALS: NamedFunction = NamedFunction {
        name: "decimals",
        inputs: &[],
        output: AbiType::Uint256,
    };

    pub const NAME: NamedFunction = NamedFunction {
        name: "name",
        inputs: &[],
        output: AbiType::String,
    };

    pub const SYMBOL: NamedFunction = NamedFunction {
        name: "symbol",
        inputs: &[],
        output: AbiType::String,
    };

    pub const ALLOWANCE: NamedFunction = NamedFunction {
        name: "allowance",
        inputs: &[AbiType::Address, AbiType::Address],
        output: AbiType::Uint256,
    };

    pub const GET_ADDRESS_FOR_STRING: NamedFunction = NamedFunction {
        name: "getAddressForString",
        inputs: &[AbiType::String],
        output: AbiType::Address,
    };

    pub const GET_ACCOUNT_TOTAL_LOCKED_GOLD: NamedFunction = NamedFunction {
        name: "getAccountTotalLockedGold",
        inputs: &[AbiType::Address],
        output: AbiType::Uint256,
    };

    pub const GET_ACCOUNT_NONVOTING_LOCKED_GOLD: NamedFunction = NamedFunction {
        name: "getAccountNonvotingLockedGold",
        inputs: &[AbiType::Address],
        output: AbiType::Uint256,
    };

    pub const IS_ACCOUNT: NamedFunction = NamedFunction {
        name: "isAccount",
        inputs: &[AbiType::Address],
        output: AbiType::Bool,
    };

    pub const GET_TOTAL_VOTES: NamedFunction = NamedFunction {
        name: "getTotalVotes",
        inputs: &[],
        output: AbiType::Uint256,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HOLDER: &str = "0x742d35Cc6435C9c1c72c5E7b18BaB7e1DB7a5d6e";

    fn word_hex(hex_digits: &str) -> String {
        format!("{:0>64}", hex_digits)
    }

    #[test]
    fn test_known_selectors() {
        assert_eq!(selector_hex("balanceOf(address)"), "0x70a08231");
        assert_eq!(selector_hex("transfer(address,uint256)"), "0xa9059cbb");
        assert_eq!(selector_hex("getAddressForString(string)"), "0x853db323");
        assert_eq!(functions::TOTAL_SUPPLY.selector_hex(), "0x18160ddd");
        assert_eq!(functions::DECIMALS.selector_hex(), "0x313ce567");
        assert_eq!(functions::ALLOWANCE.selector_hex(), "0xdd62ed3e");
        assert_eq!(functions::GET_ACCOUNT_TOTAL_LOCKED_GOLD.selector_hex(), "0x30ec70f5");
        assert_eq!(functions::IS_ACCOUNT.selector_hex(), "0x25ca4c9c");
    }

    #[test]
    fn test_signature_canonicalizes_uint() {
        let ty: AbiType = "uint".parse().unwrap();
        assert_eq!(
            function_signature("transfer", &[AbiType::Address, ty]).unwrap(),
            "transfer(address,uint256)"
        );
        assert!(function_signature("bad name", &[]).is_err());
    }

    #[test]
    fn test_unsupported_type() {
        assert!(matches!(
            "int128".parse::<AbiType>(),
            Err(CeloError::UnsupportedType(t)) if t == "int128"
        ));
    }

    #[test]
    fn test_encode_balance_of() {
        let holder = AbiValue::from_json(AbiType::Address, &json!(HOLDER)).unwrap();
        let calldata = functions::BALANCE_OF.encode_call(&[holder]).unwrap();
        assert_eq!(
            calldata,
            format!(
                "0x70a08231{}",
                word_hex("742d35cc6435c9c1c72c5e7b18bab7e1db7a5d6e")
            )
        );
        assert_eq!(calldata.len(), 2 + 8 + 64);
    }

    #[test]
    fn test_encode_static_words() {
        assert_eq!(
            hex::encode(encode_word(&AbiValue::Bool(true)).unwrap()),
            word_hex("1")
        );
        assert_eq!(
            hex::encode(encode_word(&AbiValue::Uint(U256::from(1000u64))).unwrap()),
            word_hex("3e8")
        );
        let short = AbiValue::from_json(AbiType::Bytes32, &json!("0xcafe")).unwrap();
        assert_eq!(
            hex::encode(encode_word(&short).unwrap()),
            format!("cafe{}", "0".repeat(60))
        );
        assert!(encode_word(&AbiValue::String("x".into())).is_err());
    }

    #[test]
    fn test_uint_rejects_negative_and_overflow() {
        assert!(matches!(
            AbiValue::from_json(AbiType::Uint256, &json!(-1)),
            Err(CeloError::Encoding(_))
        ));
        assert!(matches!(
            AbiValue::from_json(AbiType::Uint256, &json!("-5")),
            Err(CeloError::Encoding(_))
        ));
        let too_big = format!("0x1{}", "0".repeat(64));
        assert!(matches!(
            AbiValue::from_json(AbiType::Uint256, &json!(too_big)),
            Err(CeloError::Encoding(_))
        ));
        assert_eq!(
            AbiValue::from_json(AbiType::Uint256, &json!("0xff")).unwrap(),
            AbiValue::Uint(U256::from(255u64))
        );
    }

    #[test]
    fn test_encode_dynamic_string() {
        let calldata =
            encode_function_call("getAddressForString", &[AbiValue::String("StableToken".into())])
                .unwrap();
        let expected = format!(
            "0x853db323{}{}{}",
            word_hex("20"),
            word_hex("b"),
            format!("{}{}", hex::encode("StableToken"), "0".repeat(64 - 22))
        );
        assert_eq!(calldata, expected);
    }

    #[test]
    fn test_encode_mixed_static_and_dynamic() {
        let encoded = encode_params(&[
            AbiValue::Uint(U256::from(1u64)),
            AbiValue::Bytes(vec![0xab; 33]),
            AbiValue::String(String::new()),
        ])
        .unwrap();
        let hex_out = hex::encode(&encoded);
        let words: Vec<&str> = (0..hex_out.len() / 64)
            .map(|i| &hex_out[i * 64..(i + 1) * 64])
            .collect();
        assert_eq!(words[0], word_hex("1"));
        assert_eq!(words[1], word_hex("60"));
        // 0x60 head + 0x20 length + 0x40 padded payload
        assert_eq!(words[2], word_hex("c0"));
        assert_eq!(words[3], word_hex("21"));
        assert_eq!(words[6], word_hex("0"));
        assert_eq!(words.len(), 7);
    }

    #[test]
    fn test_decode_values() {
        let address_word = format!("0x{}", word_hex("471ece3750da237f93b8e339c536989b8978a438"));
        assert_eq!(
            decode_value(&address_word, AbiType::Address)
                .unwrap()
                .to_string(),
            "0x471ece3750da237f93b8e339c536989b8978a438"
        );

        let amount = format!("0x{}", word_hex("de0b6b3a7640000"));
        assert_eq!(
            decode_value(&amount, AbiType::Uint256).unwrap().to_json(),
            json!("1000000000000000000")
        );

        let flag = format!("0x{}", word_hex("1"));
        assert_eq!(decode_value(&flag, AbiType::Bool).unwrap(), AbiValue::Bool(true));
        let even = format!("0x{}", word_hex("2"));
        assert_eq!(decode_value(&even, AbiType::Bool).unwrap(), AbiValue::Bool(false));

        let raw = format!("0x{}", "ab".repeat(32));
        assert_eq!(decode_value(&raw, AbiType::Bytes32).unwrap().to_string(), raw);
    }

    #[test]
    fn test_decoder_advances_by_word() {
        let payload = format!("0x{}{}", word_hex("5"), word_hex("1"));
        let mut decoder = AbiDecoder::new(&payload).unwrap();
        assert_eq!(decoder.next(AbiType::Uint256).unwrap().to_string(), "5");
        assert_eq!(decoder.offset(), 32);
        assert_eq!(decoder.next(AbiType::Bool).unwrap(), AbiValue::Bool(true));
        assert!(decoder.next(AbiType::Uint256).is_err());

        let second = AbiDecoder::with_offset(&payload, 32).unwrap();
        assert_eq!(second.decode_at(32, AbiType::Uint256).unwrap().to_string(), "1");

        let mut far = AbiDecoder::with_offset(&payload, usize::MAX - 8).unwrap();
        assert!(matches!(far.next(AbiType::Uint256), Err(CeloError::Encoding(_))));
    }

    #[test]
    fn test_decode_string_return() {
        let payload = format!(
            "0x{}{}{}",
            word_hex("20"),
            word_hex("4"),
            format!("{}{}", hex::encode("cUSD"), "0".repeat(56))
        );
        assert_eq!(
            functions::SYMBOL.decode_output(&payload).unwrap(),
            AbiValue::String("cUSD".into())
        );

        let truncated = format!("0x{}{}", word_hex("20"), word_hex("40"));
        assert!(decode_value(&truncated, AbiType::String).is_err());
    }

    #[test]
    fn test_named_function_checks_arguments() {
        assert!(functions::BALANCE_OF.encode_call(&[]).is_err());
        assert!(functions::BALANCE_OF
            .encode_call(&[AbiValue::Bool(true)])
            .is_err());
    }
}
