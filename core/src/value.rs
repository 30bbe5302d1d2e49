//! Typed flag values.
//!
//! Every flag holds a [`Value`]: something that can be set from command-line
//! text, rendered back to text, and reports a short type tag. The tokenizer
//! only ever talks to this trait, so hosts can add their own scalar kinds
//! without touching the parser.
//!
//! # Examples
//!
//! ```
//! use argtree_core::{IntValue, Value};
//!
//! let mut threads = IntValue::new(2);
//! threads.set("8").unwrap();
//! assert_eq!(threads.get(), 8);
//! assert_eq!(threads.to_string(), "8");
//! assert_eq!(threads.type_name(), "int");
//! ```

use std::any::Any;
use std::fmt;
use std::net::{AddrParseError, IpAddr};
use std::num::ParseIntError;

use thiserror::Error;

/// Type tag reported by [`StringValue`].
pub const STRING_TYPE: &str = "string";
/// Type tag reported by [`IntValue`].
pub const INT_TYPE: &str = "int";
/// Type tag reported by [`BoolValue`]. Flags holding a value with this tag
/// never consume a following token.
pub const BOOL_TYPE: &str = "bool";
/// Type tag reported by [`IpValue`].
pub const IP_TYPE: &str = "IP";

/// Conversion failure while setting a value from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Text is not a base-10 integer in range.
    #[error("invalid int value {input:?}: {source}")]
    InvalidInt {
        input: String,
        #[source]
        source: ParseIntError,
    },
    /// Text is not one of the accepted boolean spellings.
    #[error("invalid bool value {0:?}")]
    InvalidBool(String),
    /// Text is neither an IPv4 nor an IPv6 address.
    #[error("invalid IP address: {input}")]
    InvalidIp {
        input: String,
        #[source]
        source: AddrParseError,
    },
    /// Failure reported by a host-defined value type.
    #[error("invalid {type_name} value {input:?}: {reason}")]
    Invalid {
        type_name: &'static str,
        input: String,
        reason: String,
    },
}

impl ValueError {
    /// Builds the free-form variant for host-defined [`Value`] types.
    pub fn custom(type_name: &'static str, input: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            type_name,
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Capability contract of a flag value.
///
/// `Display` renders the current state (used for help defaults and
/// reporting). [`as_any`](Value::as_any) lets the typed getters on
/// [`Context`](crate::Context) recover the concrete type.
pub trait Value: fmt::Display + fmt::Debug + Any {
    /// Replaces the held state with `text` parsed as this value's type.
    fn set(&mut self, text: &str) -> Result<(), ValueError>;

    /// Short tag naming the value's type (`"string"`, `"int"`, ...).
    fn type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
}

/// Free-form text value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringValue(String);

impl StringValue {
    pub fn new(default: impl Into<String>) -> Self {
        Self(default.into())
    }

    pub fn get(&self) -> &str {
        &self.0
    }
}

impl Value for StringValue {
    fn set(&mut self, text: &str) -> Result<(), ValueError> {
        self.0 = text.to_string();
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        STRING_TYPE
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for StringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signed integer value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntValue(i64);

impl IntValue {
    pub fn new(default: i64) -> Self {
        Self(default)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl Value for IntValue {
    fn set(&mut self, text: &str) -> Result<(), ValueError> {
        self.0 = text.parse().map_err(|source| ValueError::InvalidInt {
            input: text.to_string(),
            source,
        })?;
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        INT_TYPE
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for IntValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Boolean switch value.
///
/// Accepts `1`, `t`, `T`, `TRUE`, `true`, `True` and their `0`/`f`/`false`
/// counterparts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoolValue(bool);

impl BoolValue {
    pub fn new(default: bool) -> Self {
        Self(default)
    }

    pub fn get(&self) -> bool {
        self.0
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

impl Value for BoolValue {
    fn set(&mut self, text: &str) -> Result<(), ValueError> {
        self.0 = parse_bool(text).ok_or_else(|| ValueError::InvalidBool(text.to_string()))?;
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        BOOL_TYPE
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for BoolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// IPv4 or IPv6 address value. `None` is the zero address and renders empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IpValue(Option<IpAddr>);

impl IpValue {
    pub fn new(default: Option<IpAddr>) -> Self {
        Self(default)
    }

    /// Parses `default`, falling back to the zero address when it is not a
    /// valid address.
    pub fn parse_or_unset(default: &str) -> Self {
        Self(default.parse().ok())
    }

    pub fn get(&self) -> Option<IpAddr> {
        self.0
    }
}

impl Value for IpValue {
    fn set(&mut self, text: &str) -> Result<(), ValueError> {
        let addr = text.parse().map_err(|source| ValueError::InvalidIp {
            input: text.to_string(),
            source,
        })?;
        self.0 = Some(addr);
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        IP_TYPE
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for IpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(addr) => write!(f, "{addr}"),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn test_string_value_accepts_anything() {
        let mut value = StringValue::new("default");
        value.set("").unwrap();
        assert_eq!(value.get(), "");
        value.set("-looks-like-a-flag").unwrap();
        assert_eq!(value.to_string(), "-looks-like-a-flag");
    }

    #[test]
    fn test_int_value_rejects_garbage_and_keeps_previous() {
        let mut value = IntValue::new(53748191);
        let err = value.set("12x").unwrap_err();
        assert!(matches!(err, ValueError::InvalidInt { ref input, .. } if input == "12x"));
        assert_eq!(value.get(), 53748191);

        value.set("-4").unwrap();
        assert_eq!(value.get(), -4);
    }

    #[test]
    fn test_bool_value_spellings() {
        let mut value = BoolValue::default();
        for text in ["1", "t", "T", "TRUE", "true", "True"] {
            value.set(text).unwrap();
            assert!(value.get(), "{text} should parse as true");
        }
        for text in ["0", "f", "F", "FALSE", "false", "False"] {
            value.set(text).unwrap();
            assert!(!value.get(), "{text} should parse as false");
        }
        assert_eq!(
            value.set("yes"),
            Err(ValueError::InvalidBool("yes".to_string()))
        );
    }

    #[test]
    fn test_ip_value_parse_and_render() {
        let mut value = IpValue::parse_or_unset("127.0.0.1");
        assert_eq!(value.get(), Some(IpAddr::V4(Ipv4Addr::LOCALHOST)));

        value.set("::1").unwrap();
        assert_eq!(value.to_string(), "::1");

        let err = value.set("300.1.1.1").unwrap_err();
        assert_eq!(err.to_string(), "invalid IP address: 300.1.1.1");
    }

    #[test]
    fn test_ip_value_unparsable_default_is_unset() {
        let value = IpValue::parse_or_unset("not-an-ip");
        assert_eq!(value.get(), None);
        assert_eq!(value.to_string(), "");
    }

    #[test]
    fn test_type_tags() {
        assert_eq!(StringValue::default().type_name(), "string");
        assert_eq!(IntValue::default().type_name(), "int");
        assert_eq!(BoolValue::default().type_name(), "bool");
        assert_eq!(IpValue::default().type_name(), "IP");
    }
}
