//! Governed calls: operation selectors, positional arguments, and the encoded
//! payload a ballot carries until execution.
//!
//! A selector is a function signature string such as `"addWallet(uint256,string,address)"`.
//! It is parsed once into a [`Selector`] so argument lists can be type-checked
//! at proposal time. Targets decode a [`Call`] into their own typed operation
//! enum; anything they do not recognise fails closed with
//! [`CallError::UnknownSelector`].

use std::fmt;

use jointer_types::Address;
use serde::{Deserialize, Serialize};

use crate::error::CallError;

/// A parameter type accepted in selectors.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbiType {
    /// Unsigned integer of the given bit width (`uint8` .. `uint256`).
    Uint(u16),
    /// Fixed-size unsigned integer array, e.g. `uint8[4]`.
    UintArray(u16, usize),
    Bool,
    Address,
    /// Dynamic address array, `address[]`.
    AddressArray,
    String,
    Bytes32,
}

impl AbiType {
    /// Parse one parameter type, ignoring surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self, CallError> {
        let s = raw.trim();
        let unsupported = || CallError::UnsupportedType(s.to_string());
        match s {
            "bool" => return Ok(Self::Bool),
            "address" => return Ok(Self::Address),
            "address[]" => return Ok(Self::AddressArray),
            "string" => return Ok(Self::String),
            "bytes32" => return Ok(Self::Bytes32),
            _ => {}
        }
        let rest = s.strip_prefix("uint").ok_or_else(unsupported)?;
        let (width, array) = match rest.find('[') {
            Some(open) => {
                let len = rest[open + 1..]
                    .strip_suffix(']')
                    .and_then(|n| n.parse::<usize>().ok())
                    .filter(|n| *n > 0)
                    .ok_or_else(unsupported)?;
                (&rest[..open], Some(len))
            }
            None => (rest, None),
        };
        let bits = if width.is_empty() {
            256
        } else {
            width.parse::<u16>().map_err(|_| unsupported())?
        };
        if bits == 0 || bits > 256 || bits % 8 != 0 {
            return Err(unsupported());
        }
        Ok(match array {
            Some(len) => Self::UintArray(bits, len),
            None => Self::Uint(bits),
        })
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(bits) => write!(f, "uint{bits}"),
            Self::UintArray(bits, len) => write!(f, "uint{bits}[{len}]"),
            Self::Bool => f.write_str("bool"),
            Self::Address => f.write_str("address"),
            Self::AddressArray => f.write_str("address[]"),
            Self::String => f.write_str("string"),
            Self::Bytes32 => f.write_str("bytes32"),
        }
    }
}

/// A parsed operation signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selector {
    pub name: String,
    pub params: Vec<AbiType>,
}

impl Selector {
    pub fn parse(signature: &str) -> Result<Self, CallError> {
        let malformed = || CallError::MalformedSelector(signature.to_string());
        let s = signature.trim();
        let open = s.find('(').ok_or_else(malformed)?;
        let inner = s[open + 1..].strip_suffix(')').ok_or_else(malformed)?;
        let name = s[..open].trim();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(malformed());
        }
        let params = if inner.trim().is_empty() {
            Vec::new()
        } else {
            inner
                .split(',')
                .map(AbiType::parse)
                .collect::<Result<Vec<_>, _>>()?
        };
        Ok(Self {
            name: name.to_string(),
            params,
        })
    }

    /// Canonical signature: no whitespace, full type names.
    pub fn signature(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{p}")?;
        }
        f.write_str(")")
    }
}

/// A positional argument value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgValue {
    Uint(u128),
    UintArray(Vec<u128>),
    Bool(bool),
    Address(Address),
    AddressArray(Vec<Address>),
    Text(String),
    Bytes32([u8; 32]),
}

fn fits(value: u128, bits: u16) -> bool {
    bits >= 128 || value < (1u128 << bits)
}

impl ArgValue {
    /// Whether this value is acceptable for a parameter of type `ty`.
    pub fn matches(&self, ty: &AbiType) -> bool {
        match (self, ty) {
            (Self::Uint(v), AbiType::Uint(bits)) => fits(*v, *bits),
            (Self::UintArray(vs), AbiType::UintArray(bits, len)) => {
                vs.len() == *len && vs.iter().all(|v| fits(*v, *bits))
            }
            (Self::Bool(_), AbiType::Bool)
            | (Self::Address(_), AbiType::Address)
            | (Self::AddressArray(_), AbiType::AddressArray)
            | (Self::Text(_), AbiType::String)
            | (Self::Bytes32(_), AbiType::Bytes32) => true,
            _ => false,
        }
    }

    /// Build an argument from its JSON form, as proposers submit it.
    ///
    /// Integers may be JSON numbers or decimal strings (values beyond 2^53
    /// do not survive JSON numbers); addresses and `bytes32` are hex strings.
    pub fn from_json(ty: &AbiType, value: &serde_json::Value, index: usize) -> Result<Self, CallError> {
        use serde_json::Value;
        let bad = || CallError::ArgumentType {
            index,
            expected: ty.to_string(),
        };
        let uint = |v: &Value| -> Option<u128> {
            match v {
                Value::Number(n) => n.as_u64().map(u128::from),
                Value::String(s) => s.trim().parse::<u128>().ok(),
                _ => None,
            }
        };
        let address = |v: &Value| -> Option<Address> { v.as_str().and_then(|s| Address::from_hex(s).ok()) };

        let arg = match ty {
            AbiType::Uint(_) => Self::Uint(uint(value).ok_or_else(bad)?),
            AbiType::UintArray(..) => Self::UintArray(
                value
                    .as_array()
                    .ok_or_else(bad)?
                    .iter()
                    .map(uint)
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(bad)?,
            ),
            AbiType::Bool => Self::Bool(value.as_bool().ok_or_else(bad)?),
            AbiType::Address => Self::Address(address(value).ok_or_else(bad)?),
            AbiType::AddressArray => Self::AddressArray(
                value
                    .as_array()
                    .ok_or_else(bad)?
                    .iter()
                    .map(address)
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(bad)?,
            ),
            AbiType::String => Self::Text(value.as_str().ok_or_else(bad)?.to_string()),
            AbiType::Bytes32 => {
                let s = value.as_str().ok_or_else(bad)?;
                let bytes = hex_bytes32(s.strip_prefix("0x").unwrap_or(s)).ok_or_else(bad)?;
                Self::Bytes32(bytes)
            }
        };
        if arg.matches(ty) {
            Ok(arg)
        } else {
            Err(bad())
        }
    }
}

fn hex_bytes32(s: &str) -> Option<[u8; 32]> {
    hex::decode(s).ok()?.try_into().ok()
}

/// What a successfully executed call handed back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallReturn {
    Unit,
    /// Id of a newly created record (rule, group, channel, wallet).
    Id(u64),
}

/// A fully type-checked call against one target contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub target: Address,
    pub selector: Selector,
    pub args: Vec<ArgValue>,
}

impl Call {
    pub fn new(target: Address, selector: Selector, args: Vec<ArgValue>) -> Result<Self, CallError> {
        if args.len() != selector.params.len() {
            return Err(CallError::ArgumentCount {
                selector: selector.signature(),
                expected: selector.params.len(),
                got: args.len(),
            });
        }
        for (index, (arg, ty)) in args.iter().zip(&selector.params).enumerate() {
            if !arg.matches(ty) {
                return Err(CallError::ArgumentType {
                    index,
                    expected: ty.to_string(),
                });
            }
        }
        Ok(Self {
            target,
            selector,
            args,
        })
    }

    /// Build a call from JSON positional arguments.
    pub fn from_json(
        target: Address,
        selector: Selector,
        args: &[serde_json::Value],
    ) -> Result<Self, CallError> {
        if args.len() != selector.params.len() {
            return Err(CallError::ArgumentCount {
                selector: selector.signature(),
                expected: selector.params.len(),
                got: args.len(),
            });
        }
        let values = selector
            .params
            .iter()
            .zip(args)
            .enumerate()
            .map(|(i, (ty, v))| ArgValue::from_json(ty, v, i))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(target, selector, values)
    }

    /// Opaque payload stored on the ballot.
    pub fn encode(&self) -> Result<Vec<u8>, CallError> {
        bincode::serialize(self).map_err(|e| CallError::Encoding(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CallError> {
        bincode::deserialize(bytes).map_err(|e| CallError::Encoding(e.to_string()))
    }

    /// Canonical signature of the selector, the key targets dispatch on.
    pub fn signature(&self) -> String {
        self.selector.signature()
    }

    /// The error a target returns for a selector it does not implement.
    pub fn unknown(&self) -> CallError {
        CallError::UnknownSelector {
            target: self.target,
            selector: self.signature(),
        }
    }

    fn arg(&self, index: usize, expected: &str) -> Result<&ArgValue, CallError> {
        self.args.get(index).ok_or_else(|| CallError::ArgumentType {
            index,
            expected: expected.to_string(),
        })
    }

    fn mismatch(index: usize, expected: &str) -> CallError {
        CallError::ArgumentType {
            index,
            expected: expected.to_string(),
        }
    }

    pub fn uint(&self, index: usize) -> Result<u128, CallError> {
        match self.arg(index, "uint")? {
            ArgValue::Uint(v) => Ok(*v),
            _ => Err(Self::mismatch(index, "uint")),
        }
    }

    /// A `uint` argument that must fit in `u64` (ids, rates).
    pub fn uint64(&self, index: usize) -> Result<u64, CallError> {
        u64::try_from(self.uint(index)?).map_err(|_| Self::mismatch(index, "uint64"))
    }

    pub fn uint_array(&self, index: usize) -> Result<&[u128], CallError> {
        match self.arg(index, "uint[]")? {
            ArgValue::UintArray(v) => Ok(v),
            _ => Err(Self::mismatch(index, "uint[]")),
        }
    }

    pub fn boolean(&self, index: usize) -> Result<bool, CallError> {
        match self.arg(index, "bool")? {
            ArgValue::Bool(v) => Ok(*v),
            _ => Err(Self::mismatch(index, "bool")),
        }
    }

    pub fn address(&self, index: usize) -> Result<Address, CallError> {
        match self.arg(index, "address")? {
            ArgValue::Address(v) => Ok(*v),
            _ => Err(Self::mismatch(index, "address")),
        }
    }

    pub fn addresses(&self, index: usize) -> Result<&[Address], CallError> {
        match self.arg(index, "address[]")? {
            ArgValue::AddressArray(v) => Ok(v),
            _ => Err(Self::mismatch(index, "address[]")),
        }
    }

    pub fn text(&self, index: usize) -> Result<&str, CallError> {
        match self.arg(index, "string")? {
            ArgValue::Text(v) => Ok(v),
            _ => Err(Self::mismatch(index, "string")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_deployment_selectors() {
        let s = Selector::parse("addWallet(uint256,string,address)").unwrap();
        assert_eq!(s.name, "addWallet");
        assert_eq!(
            s.params,
            vec![AbiType::Uint(256), AbiType::String, AbiType::Address]
        );

        let s = Selector::parse("changeRuleMajority(uint256,uint8[4])").unwrap();
        assert_eq!(s.params[1], AbiType::UintArray(8, 4));
    }

    #[test]
    fn bytes32_from_hex_json() {
        let ty = AbiType::Bytes32;
        let encoded = format!("0x{}", "ab".repeat(32));
        assert_eq!(
            ArgValue::from_json(&ty, &json!(encoded), 0).unwrap(),
            ArgValue::Bytes32([0xab; 32])
        );
        assert!(ArgValue::from_json(&ty, &json!("ab".repeat(31)), 0).is_err());
        assert!(ArgValue::from_json(&ty, &json!("zz".repeat(32)), 0).is_err());
        assert!(ArgValue::from_json(&ty, &json!(7), 0).is_err());
    }

    #[test]
    fn whitespace_is_canonicalised() {
        let s = Selector::parse("addMainRecivingRule(uint256, uint256)").unwrap();
        assert_eq!(s.signature(), "addMainRecivingRule(uint256,uint256)");
    }

    #[test]
    fn no_argument_selector() {
        let s = Selector::parse("updateCloseTime()").unwrap();
        assert!(s.params.is_empty());
        assert_eq!(s.signature(), "updateCloseTime()");
    }

    #[test]
    fn malformed_selectors_rejected() {
        assert!(Selector::parse("addChannel").is_err());
        assert!(Selector::parse("(uint256)").is_err());
        assert!(Selector::parse("add Channel(string)").is_err());
        assert!(matches!(
            Selector::parse("f(int256)"),
            Err(CallError::UnsupportedType(_))
        ));
        assert!(Selector::parse("f(uint7)").is_err());
    }

    #[test]
    fn call_checks_argument_types() {
        let target = Address::from_label("gateway");
        let selector = Selector::parse("blockChannel(uint256,bool)").unwrap();
        let err = Call::new(
            target,
            selector.clone(),
            vec![ArgValue::Uint(0), ArgValue::Uint(1)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            CallError::ArgumentType {
                index: 1,
                expected: "bool".into()
            }
        );

        let err = Call::new(target, selector, vec![ArgValue::Uint(0)]).unwrap_err();
        assert!(matches!(err, CallError::ArgumentCount { expected: 2, got: 1, .. }));
    }

    #[test]
    fn uint8_width_is_enforced() {
        let selector = Selector::parse("changeRuleMajority(uint256,uint8[4])").unwrap();
        let target = Address::from_label("governance");
        assert!(Call::new(
            target,
            selector.clone(),
            vec![ArgValue::Uint(3), ArgValue::UintArray(vec![90, 0, 0, 0])]
        )
        .is_ok());
        assert!(Call::new(
            target,
            selector.clone(),
            vec![ArgValue::Uint(3), ArgValue::UintArray(vec![256, 0, 0, 0])]
        )
        .is_err());
        assert!(Call::new(
            target,
            selector,
            vec![ArgValue::Uint(3), ArgValue::UintArray(vec![90, 0, 0])]
        )
        .is_err());
    }

    #[test]
    fn json_arguments() {
        let bancor = Address::from_label("bancor");
        let selector = Selector::parse("addWallet(uint256,string,address)").unwrap();
        let call = Call::from_json(
            Address::from_label("gateway"),
            selector,
            &[json!(0), json!("Bancor"), json!(bancor.to_string())],
        )
        .unwrap();
        assert_eq!(call.uint64(0).unwrap(), 0);
        assert_eq!(call.text(1).unwrap(), "Bancor");
        assert_eq!(call.address(2).unwrap(), bancor);
    }

    #[test]
    fn json_large_integers_as_strings() {
        let selector = Selector::parse("setRate(uint256)").unwrap();
        let call = Call::from_json(
            Address::from_label("x"),
            selector,
            &[json!("340282366920938463463374607431768211455")],
        )
        .unwrap();
        assert_eq!(call.uint(0).unwrap(), u128::MAX);
        assert!(call.uint64(0).is_err());
    }

    #[test]
    fn payload_roundtrip() {
        let call = Call::new(
            Address::from_label("escrow"),
            Selector::parse("moveToGroup(address,uint256)").unwrap(),
            vec![ArgValue::Address(Address::from_label("alice")), ArgValue::Uint(2)],
        )
        .unwrap();
        let bytes = call.encode().unwrap();
        assert_eq!(Call::decode(&bytes).unwrap(), call);
    }

    #[test]
    fn accessor_type_mismatch() {
        let call = Call::new(
            Address::from_label("gateway"),
            Selector::parse("addChannel(string)").unwrap(),
            vec![ArgValue::Text("Crypto exchanges".into())],
        )
        .unwrap();
        assert!(call.uint(0).is_err());
        assert!(call.text(1).is_err());
    }
}
