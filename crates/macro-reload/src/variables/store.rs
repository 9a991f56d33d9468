use std::collections::BTreeMap;

use super::proxy::ProxyDict;
use super::Evaluate;
use crate::config::Section;
use crate::literal::{self, Literal};
use crate::report::ReloadReport;
use serde_json::{Map, Value};

/// Option prefix that marks a variable.
pub const VARIABLE_PREFIX: &str = "variable_";

/// Variable name (prefix stripped) to parsed literal.
pub type VariableScope = BTreeMap<String, Literal>;

/// A named variable scope: a macro's variables or the global scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableStore {
    name: String,
    scope: VariableScope,
}

impl VariableStore {
    pub fn new(name: impl Into<String>, scope: VariableScope) -> Self {
        Self {
            name: name.into(),
            scope,
        }
    }

    /// Parses every `variable_*` option of `section`.
    ///
    /// Options that are not strict literals, or that do not survive a JSON
    /// round trip, are reported and left out.
    pub fn parse(section: &Section, report: &mut ReloadReport) -> VariableScope {
        let mut scope = VariableScope::new();
        for (option, raw) in section.options_with_prefix(VARIABLE_PREFIX) {
            match literal::parse_variable(raw) {
                Ok(value) => {
                    scope.insert(option[VARIABLE_PREFIX.len()..].to_string(), value);
                }
                Err(e) => report.warn(format!(
                    "Option '{}' in section '{}' is not a valid literal: {}",
                    option,
                    section.key(),
                    e
                )),
            }
        }
        scope
    }

    pub fn from_section(section: &Section, report: &mut ReloadReport) -> Self {
        Self::new(section.key(), Self::parse(section, report))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> &VariableScope {
        &self.scope
    }

    pub fn replace(&mut self, scope: VariableScope) {
        self.scope = scope;
    }

    /// Sets a single variable. Only names already in the scope are accepted.
    pub fn set(&mut self, variable: &str, value: Literal) -> bool {
        match self.scope.get_mut(variable) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn proxy<'a>(&'a self, eval: &'a dyn Evaluate) -> ProxyDict<'a> {
        ProxyDict::over_scope(&self.scope, eval)
    }

    /// Raw values without evaluating string leaves.
    pub fn snapshot(&self) -> Value {
        Value::Object(
            self.scope
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json_lossy()))
                .collect::<Map<_, _>>(),
        )
    }
}

/// Config defaults overlaid with live values.
///
/// Keys come from `defaults` only; a live value wins where both define the
/// key.
pub fn merge_scopes(defaults: &VariableScope, live: &VariableScope) -> VariableScope {
    defaults
        .iter()
        .map(|(name, default)| {
            let value = live.get(name).unwrap_or(default);
            (name.clone(), value.clone())
        })
        .collect()
}
