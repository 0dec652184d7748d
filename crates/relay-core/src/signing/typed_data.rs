//! Schema-driven EIP-712 struct hashing.
//!
//! The struct layout is not compiled in: it comes from the exchange settings
//! as a `types` map (struct name to ordered fields), the same shape wallets
//! receive in `eth_signTypedData_v4`.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{keccak256, Address, B256, I256, U256};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Eip712Domain;
use crate::types::u256_decimal;
use crate::{Error, Result};

/// One member of a typed struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedField {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TypedField {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

/// Struct name to ordered member list.
pub type TypedDataTypes = BTreeMap<String, Vec<TypedField>>;

/// Encodes structs described by a [`TypedDataTypes`] map.
#[derive(Debug, Clone, Copy)]
pub struct TypedDataEncoder<'a> {
    types: &'a TypedDataTypes,
}

impl<'a> TypedDataEncoder<'a> {
    pub fn new(types: &'a TypedDataTypes) -> Self {
        Self { types }
    }

    fn fields(&self, name: &str) -> Result<&'a [TypedField]> {
        self.types
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::typed_data(format!("unknown struct type {name}")))
    }

    fn is_struct(&self, kind: &str) -> bool {
        kind != "EIP712Domain" && self.types.contains_key(kind)
    }

    fn collect_dependencies(&self, name: &str, found: &mut BTreeSet<String>) -> Result<()> {
        for field in self.fields(name)? {
            let base = base_type(&field.kind);
            if self.is_struct(base) && found.insert(base.to_string()) {
                self.collect_dependencies(base, found)?;
            }
        }
        Ok(())
    }

    /// `Primary(type name,...)` followed by every referenced struct in
    /// alphabetical order.
    pub fn encode_type(&self, primary: &str) -> Result<String> {
        let mut deps = BTreeSet::new();
        self.collect_dependencies(primary, &mut deps)?;
        deps.remove(primary);

        let mut out = String::new();
        for name in std::iter::once(primary).chain(deps.iter().map(String::as_str)) {
            let members: Vec<String> = self
                .fields(name)?
                .iter()
                .map(|f| format!("{} {}", f.kind, f.name))
                .collect();
            out.push_str(&format!("{}({})", name, members.join(",")));
        }
        Ok(out)
    }

    pub fn type_hash(&self, primary: &str) -> Result<B256> {
        Ok(keccak256(self.encode_type(primary)?.as_bytes()))
    }

    /// `keccak256(typeHash || encodeData(data))`.
    pub fn hash_struct(&self, primary: &str, data: &Map<String, Value>) -> Result<B256> {
        let fields = self.fields(primary)?;
        let mut encoded = Vec::with_capacity(32 * (fields.len() + 1));
        encoded.extend_from_slice(self.type_hash(primary)?.as_slice());

        for field in fields {
            let value = data.get(&field.name).ok_or_else(|| {
                Error::typed_data(format!("missing field \"{}\" for {}", field.name, primary))
            })?;
            let word = self
                .encode_value(&field.kind, value)
                .map_err(|e| match e {
                    Error::TypedData { message } => {
                        Error::typed_data(format!("\"{}\": {}", field.name, message))
                    }
                    other => other,
                })?;
            encoded.extend_from_slice(word.as_slice());
        }

        Ok(keccak256(&encoded))
    }

    fn encode_value(&self, kind: &str, value: &Value) -> Result<B256> {
        if let Some(element) = array_element_type(kind) {
            let items = value
                .as_array()
                .ok_or_else(|| Error::typed_data(format!("expected array for {kind}")))?;
            let mut encoded = Vec::with_capacity(32 * items.len());
            for item in items {
                encoded.extend_from_slice(self.encode_value(element, item)?.as_slice());
            }
            return Ok(keccak256(&encoded));
        }

        if self.is_struct(kind) {
            let object = value
                .as_object()
                .ok_or_else(|| Error::typed_data(format!("expected object for {kind}")))?;
            return self.hash_struct(kind, object);
        }

        match kind {
            "address" => {
                let address: Address = value
                    .as_str()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| Error::typed_data("invalid address"))?;
                Ok(address.into_word())
            }
            "bool" => {
                let flag = match value {
                    Value::Bool(b) => *b,
                    Value::String(s) if s == "true" => true,
                    Value::String(s) if s == "false" => false,
                    _ => return Err(Error::typed_data("invalid bool")),
                };
                Ok(B256::from(U256::from(flag as u8).to_be_bytes::<32>()))
            }
            "string" => {
                let text = value
                    .as_str()
                    .ok_or_else(|| Error::typed_data("expected string"))?;
                Ok(keccak256(text.as_bytes()))
            }
            "bytes" => Ok(keccak256(decode_hex_value(value)?)),
            _ => {
                if let Some(size) = kind.strip_prefix("bytes") {
                    let size = parse_size(size, 1, 32, 1)
                        .ok_or_else(|| Error::typed_data(format!("unsupported type {kind}")))?;
                    let bytes = decode_hex_value(value)?;
                    if bytes.len() != size {
                        return Err(Error::typed_data(format!("expected {size} bytes")));
                    }
                    Ok(B256::right_padding_from(&bytes))
                } else if let Some(bits) = kind.strip_prefix("uint") {
                    let bits = parse_bits(bits)
                        .ok_or_else(|| Error::typed_data(format!("unsupported type {kind}")))?;
                    let number = unsigned_value(value)?;
                    if number.bit_len() > bits {
                        return Err(Error::typed_data(format!("value out of range for {kind}")));
                    }
                    Ok(B256::from(number.to_be_bytes::<32>()))
                } else if let Some(bits) = kind.strip_prefix("int") {
                    let bits = parse_bits(bits)
                        .ok_or_else(|| Error::typed_data(format!("unsupported type {kind}")))?;
                    let number = signed_value(value)?;
                    if !fits_signed(number, bits) {
                        return Err(Error::typed_data(format!("value out of range for {kind}")));
                    }
                    Ok(B256::from(number.into_raw().to_be_bytes::<32>()))
                } else {
                    Err(Error::typed_data(format!("unsupported type {kind}")))
                }
            }
        }
    }
}

/// `keccak256(0x19 0x01 || domainSeparator || hashStruct(message))`.
pub fn hash_typed_data(
    domain: &Eip712Domain,
    types: &TypedDataTypes,
    primary: &str,
    message: &Map<String, Value>,
) -> Result<B256> {
    let struct_hash = TypedDataEncoder::new(types).hash_struct(primary, message)?;

    let mut encoded = Vec::with_capacity(66);
    encoded.extend_from_slice(&[0x19, 0x01]);
    encoded.extend_from_slice(domain.separator().as_slice());
    encoded.extend_from_slice(struct_hash.as_slice());

    Ok(keccak256(&encoded))
}

fn base_type(kind: &str) -> &str {
    kind.split('[').next().unwrap_or(kind)
}

fn array_element_type(kind: &str) -> Option<&str> {
    if !kind.ends_with(']') {
        return None;
    }
    kind.rfind('[').map(|idx| &kind[..idx])
}

fn parse_size(text: &str, min: usize, max: usize, step: usize) -> Option<usize> {
    let n: usize = text.parse().ok()?;
    (n >= min && n <= max && n % step == 0).then_some(n)
}

fn parse_bits(text: &str) -> Option<usize> {
    if text.is_empty() {
        return Some(256);
    }
    parse_size(text, 8, 256, 8)
}

fn decode_hex_value(value: &Value) -> Result<Vec<u8>> {
    let text = value
        .as_str()
        .ok_or_else(|| Error::typed_data("expected hex string"))?;
    let digits = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(digits).map_err(|_| Error::typed_data("invalid hex"))
}

fn unsigned_value(value: &Value) -> Result<U256> {
    match value {
        Value::Number(n) => n.as_u64().map(U256::from),
        Value::String(s) => u256_decimal::parse(s),
        _ => None,
    }
    .ok_or_else(|| Error::typed_data("expected unsigned integer"))
}

fn signed_value(value: &Value) -> Result<I256> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|v| I256::try_from(v).ok()),
        Value::String(s) => I256::from_dec_str(s.trim()).ok(),
        _ => None,
    }
    .ok_or_else(|| Error::typed_data("expected integer"))
}

fn fits_signed(value: I256, bits: usize) -> bool {
    if bits == 256 {
        return true;
    }
    let bound = U256::from(1u8) << (bits - 1);
    let magnitude = value.unsigned_abs();
    if value.is_negative() {
        magnitude <= bound
    } else {
        magnitude < bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mail_types() -> TypedDataTypes {
        serde_json::from_value(json!({
            "EIP712Domain": [
                {"name": "name", "type": "string"},
                {"name": "version", "type": "string"},
                {"name": "chainId", "type": "uint256"},
                {"name": "verifyingContract", "type": "address"}
            ],
            "Person": [
                {"name": "name", "type": "string"},
                {"name": "wallet", "type": "address"}
            ],
            "Mail": [
                {"name": "from", "type": "Person"},
                {"name": "to", "type": "Person"},
                {"name": "contents", "type": "string"}
            ]
        }))
        .unwrap()
    }

    fn mail_message() -> Map<String, Value> {
        json!({
            "from": {"name": "Cow", "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826"},
            "to": {"name": "Bob", "wallet": "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB"},
            "contents": "Hello, Bob!"
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_encode_type_appends_dependencies() {
        let types = mail_types();
        let encoder = TypedDataEncoder::new(&types);
        assert_eq!(
            encoder.encode_type("Mail").unwrap(),
            "Mail(Person from,Person to,string contents)Person(string name,address wallet)"
        );
    }

    #[test]
    fn test_reference_mail_vector() {
        let types = mail_types();
        let encoder = TypedDataEncoder::new(&types);

        let struct_hash = encoder.hash_struct("Mail", &mail_message()).unwrap();
        let expected: B256 = "0xc52c0ee5d84264471806290a3f2c4cecfc5490626bf912d01f240d7a274b371e"
            .parse()
            .unwrap();
        assert_eq!(struct_hash, expected);

        let domain = Eip712Domain::custom(
            "Ether Mail",
            "1",
            1,
            "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC".parse().unwrap(),
        );
        let digest = hash_typed_data(&domain, &types, "Mail", &mail_message()).unwrap();
        let expected: B256 = "0xbe609aee343fb3c4b28e1df9e632fca64fcfaede20f02e86244efddf30957bd2"
            .parse()
            .unwrap();
        assert_eq!(digest, expected);
    }

    #[test]
    fn test_missing_field_is_reported() {
        let types = mail_types();
        let mut message = mail_message();
        message.remove("contents");
        let err = TypedDataEncoder::new(&types)
            .hash_struct("Mail", &message)
            .unwrap_err();
        assert!(err.to_string().contains("\"contents\""));
    }

    #[test]
    fn test_integer_ranges() {
        let mut types = TypedDataTypes::new();
        types.insert(
            "Num".into(),
            vec![TypedField::new("small", "uint8"), TypedField::new("signed", "int8")],
        );
        let encoder = TypedDataEncoder::new(&types);

        let ok = json!({"small": 255, "signed": "-128"});
        assert!(encoder.hash_struct("Num", ok.as_object().unwrap()).is_ok());

        let too_big = json!({"small": 256, "signed": 0});
        assert!(encoder.hash_struct("Num", too_big.as_object().unwrap()).is_err());

        let too_small = json!({"small": 0, "signed": "-129"});
        assert!(encoder.hash_struct("Num", too_small.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_negative_int_is_twos_complement() {
        let mut types = TypedDataTypes::new();
        types.insert("Neg".into(), vec![TypedField::new("v", "int256")]);
        let encoder = TypedDataEncoder::new(&types);
        let word = encoder.encode_value("int256", &json!(-1)).unwrap();
        assert_eq!(word, B256::repeat_byte(0xff));
    }

    #[test]
    fn test_arrays_and_fixed_bytes() {
        let mut types = TypedDataTypes::new();
        types.insert(
            "Batch".into(),
            vec![
                TypedField::new("ids", "uint256[]"),
                TypedField::new("tag", "bytes4"),
                TypedField::new("blob", "bytes"),
            ],
        );
        let encoder = TypedDataEncoder::new(&types);
        let a = json!({"ids": ["1", "2"], "tag": "0xdeadbeef", "blob": "0x01"});
        let b = json!({"ids": ["2", "1"], "tag": "0xdeadbeef", "blob": "0x01"});
        let ha = encoder.hash_struct("Batch", a.as_object().unwrap()).unwrap();
        let hb = encoder.hash_struct("Batch", b.as_object().unwrap()).unwrap();
        assert_ne!(ha, hb);

        let short_tag = json!({"ids": [], "tag": "0xdead", "blob": "0x"});
        assert!(encoder
            .hash_struct("Batch", short_tag.as_object().unwrap())
            .is_err());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut types = TypedDataTypes::new();
        types.insert("Odd".into(), vec![TypedField::new("x", "fixed128x18")]);
        let message = json!({"x": "1"});
        assert!(TypedDataEncoder::new(&types)
            .hash_struct("Odd", message.as_object().unwrap())
            .is_err());
    }
}
