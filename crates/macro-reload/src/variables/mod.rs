//! Variable scopes and the lazy read-through proxies over them.

pub mod evaluator;
pub mod proxy;
pub mod store;

use serde_json::Value;

use crate::error::TemplateError;

pub use evaluator::ExpressionEvaluator;
pub use proxy::{ProxyDict, ProxyList, ProxyTuple, Resolved};
pub use store::{merge_scopes, VariableScope, VariableStore, VARIABLE_PREFIX};

/// Turns a string leaf of a variable into its current value.
pub trait Evaluate {
    fn evaluate(&self, source: &str) -> Result<Value, TemplateError>;
}

/// Returns strings unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl Evaluate for Verbatim {
    fn evaluate(&self, source: &str) -> Result<Value, TemplateError> {
        Ok(Value::String(source.to_string()))
    }
}
