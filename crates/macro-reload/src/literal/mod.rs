//! Strict literal values for macro variables.
//!
//! Variable options hold plain data only: numbers, strings, booleans, null,
//! and nested lists, tuples and mappings. Values are accepted only when they
//! also survive a lossless JSON round trip, so anything stored in a variable
//! scope can be handed to the template engine unchanged.

pub mod parser;

use serde_json::{Map, Number, Value};

use crate::error::LiteralError;

pub use parser::parse;

/// A parsed literal.
///
/// The parser accepts a slightly wider grammar than the encoder (sets and
/// non-string mapping keys); [`ensure_lossless`] rejects those.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`.
    UInt(u64),
    Float(f64),
    Str(String),
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    Set(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
}

impl Literal {
    /// Human-readable kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Bool(_) => "boolean",
            Literal::Int(_) | Literal::UInt(_) => "integer",
            Literal::Float(_) => "float",
            Literal::Str(_) => "string",
            Literal::List(_) => "list",
            Literal::Tuple(_) => "tuple",
            Literal::Set(_) => "set",
            Literal::Dict(_) => "mapping",
        }
    }

    /// Strict conversion to JSON. Tuples become arrays.
    pub fn to_json(&self) -> Result<Value, LiteralError> {
        Ok(match self {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => Value::from(*i),
            Literal::UInt(u) => Value::from(*u),
            Literal::Float(f) => Number::from_f64(*f)
                .map(Value::Number)
                .ok_or(LiteralError::NonFinite(*f))?,
            Literal::Str(s) => Value::String(s.clone()),
            Literal::List(items) | Literal::Tuple(items) => Value::Array(
                items
                    .iter()
                    .map(Literal::to_json)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Literal::Set(_) => return Err(LiteralError::Unsupported("set")),
            Literal::Dict(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    let Literal::Str(key) = key else {
                        return Err(LiteralError::NonStringKey(key.kind()));
                    };
                    map.insert(key.clone(), value.to_json()?);
                }
                Value::Object(map)
            }
        })
    }

    /// Converts an already-validated literal for display or status output.
    ///
    /// Values that cannot be encoded turn into `null`.
    pub fn to_json_lossy(&self) -> Value {
        self.to_json().unwrap_or(Value::Null)
    }
}

/// Encodes the literal to JSON text and decodes it again, failing unless the
/// decoded value equals the encoded one.
pub fn ensure_lossless(literal: &Literal) -> Result<Value, LiteralError> {
    let value = literal.to_json()?;
    let encoded = serde_json::to_string(&value)?;
    let decoded: Value = serde_json::from_str(&encoded)?;
    if decoded != value {
        return Err(LiteralError::NotLossless);
    }
    Ok(value)
}

/// Parses a variable value and checks that it round-trips.
pub fn parse_variable(text: &str) -> Result<Literal, LiteralError> {
    let literal = parse(text)?;
    ensure_lossless(&literal)?;
    Ok(literal)
}
