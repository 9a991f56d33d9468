//! Lazy proxies over nested literals.
//!
//! A proxy borrows a node of a variable scope together with an evaluator.
//! Nothing is wrapped or evaluated up front: indexing a container yields a
//! new proxy over the child, and reaching a string leaf runs the evaluator
//! again on every access.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use super::Evaluate;
use crate::error::TemplateError;
use crate::literal::Literal;

/// Result of accessing one element through a proxy.
pub enum Resolved<'a> {
    Dict(ProxyDict<'a>),
    List(ProxyList<'a>),
    Tuple(ProxyTuple<'a>),
    Value(Value),
}

impl Resolved<'_> {
    /// Forces full recursive evaluation.
    pub fn to_value(&self) -> Result<Value, TemplateError> {
        match self {
            Resolved::Dict(dict) => dict.to_value(),
            Resolved::List(list) => list.to_value(),
            Resolved::Tuple(tuple) => tuple.to_value(),
            Resolved::Value(value) => Ok(value.clone()),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Resolved::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Debug for Resolved<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Dict(_) => f.write_str("Resolved::Dict(..)"),
            Resolved::List(_) => f.write_str("Resolved::List(..)"),
            Resolved::Tuple(_) => f.write_str("Resolved::Tuple(..)"),
            Resolved::Value(value) => write!(f, "Resolved::Value({})", value),
        }
    }
}

fn resolve<'a>(node: &'a Literal, eval: &'a dyn Evaluate) -> Result<Resolved<'a>, TemplateError> {
    Ok(match node {
        Literal::Dict(pairs) => Resolved::Dict(ProxyDict {
            entries: Entries::Pairs(pairs),
            eval,
        }),
        Literal::List(items) => Resolved::List(ProxyList { items, eval }),
        Literal::Tuple(items) => Resolved::Tuple(ProxyTuple { items, eval }),
        Literal::Str(source) => Resolved::Value(eval.evaluate(source)?),
        other => Resolved::Value(other.to_json_lossy()),
    })
}

#[derive(Clone, Copy)]
enum Entries<'a> {
    Scope(&'a BTreeMap<String, Literal>),
    Pairs(&'a [(Literal, Literal)]),
}

/// Proxy over a mapping: a whole scope or a nested dict literal.
#[derive(Clone, Copy)]
pub struct ProxyDict<'a> {
    entries: Entries<'a>,
    eval: &'a dyn Evaluate,
}

impl<'a> ProxyDict<'a> {
    pub fn over_scope(scope: &'a BTreeMap<String, Literal>, eval: &'a dyn Evaluate) -> Self {
        Self {
            entries: Entries::Scope(scope),
            eval,
        }
    }

    fn node(&self, key: &str) -> Option<&'a Literal> {
        match self.entries {
            Entries::Scope(scope) => scope.get(key),
            Entries::Pairs(pairs) => pairs
                .iter()
                .find(|(k, _)| matches!(k, Literal::Str(s) if s == key))
                .map(|(_, v)| v),
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<Resolved<'a>>, TemplateError> {
        self.node(key).map(|node| resolve(node, self.eval)).transpose()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.node(key).is_some()
    }

    pub fn keys(&self) -> Vec<&'a str> {
        match self.entries {
            Entries::Scope(scope) => scope.keys().map(String::as_str).collect(),
            Entries::Pairs(pairs) => pairs
                .iter()
                .filter_map(|(k, _)| match k {
                    Literal::Str(s) => Some(s.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, Result<Resolved<'a>, TemplateError>)> + 'a {
        let this = *self;
        this.keys().into_iter().filter_map(move |key| {
            this.node(key).map(|node| (key, resolve(node, this.eval)))
        })
    }

    pub fn to_value(&self) -> Result<Value, TemplateError> {
        let mut map = Map::new();
        for (key, resolved) in self.iter() {
            map.insert(key.to_string(), resolved?.to_value()?);
        }
        Ok(Value::Object(map))
    }
}

macro_rules! sequence_proxy {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy)]
        pub struct $name<'a> {
            items: &'a [Literal],
            eval: &'a dyn Evaluate,
        }

        impl<'a> $name<'a> {
            pub fn get(&self, index: usize) -> Result<Option<Resolved<'a>>, TemplateError> {
                self.items
                    .get(index)
                    .map(|node| resolve(node, self.eval))
                    .transpose()
            }

            pub fn len(&self) -> usize {
                self.items.len()
            }

            pub fn is_empty(&self) -> bool {
                self.items.is_empty()
            }

            pub fn iter(&self) -> impl Iterator<Item = Result<Resolved<'a>, TemplateError>> + 'a {
                let eval = self.eval;
                self.items.iter().map(move |node| resolve(node, eval))
            }

            pub fn to_value(&self) -> Result<Value, TemplateError> {
                self.iter()
                    .map(|resolved| resolved?.to_value())
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
        }

        impl fmt::Display for $name<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                display_forced(self.to_value(), f)
            }
        }
    };
}

sequence_proxy!(
    /// Proxy over a list literal.
    ProxyList
);
sequence_proxy!(
    /// Proxy over a tuple literal; renders as an array.
    ProxyTuple
);

fn display_forced(value: Result<Value, TemplateError>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Ok(value) => write!(f, "{}", value),
        Err(e) => write!(f, "<unevaluable: {}>", e),
    }
}

impl fmt::Display for ProxyDict<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display_forced(self.to_value(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::parse;
    use crate::variables::Verbatim;
    use serde_json::json;
    use std::cell::Cell;

    /// Evaluates every string to an increasing counter.
    struct Ticker(Cell<i64>);

    impl Evaluate for Ticker {
        fn evaluate(&self, _source: &str) -> Result<Value, TemplateError> {
            let next = self.0.get() + 1;
            self.0.set(next);
            Ok(json!(next))
        }
    }

    struct Failing;

    impl Evaluate for Failing {
        fn evaluate(&self, source: &str) -> Result<Value, TemplateError> {
            Err(TemplateError::Render {
                name: "variable".to_string(),
                message: format!("cannot evaluate {}", source),
            })
        }
    }

    fn scope(entries: &[(&str, &str)]) -> BTreeMap<String, Literal> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), parse(v).unwrap()))
            .collect()
    }

    #[test]
    fn test_nested_access() {
        let scope = scope(&[("cfg", "{'speeds': [10, 20], 'pos': (1, 2), 'name': 'x'}")]);
        let proxy = ProxyDict::over_scope(&scope, &Verbatim);

        let Some(Resolved::Dict(cfg)) = proxy.get("cfg").unwrap() else {
            panic!("expected a dict proxy");
        };
        let Some(Resolved::List(speeds)) = cfg.get("speeds").unwrap() else {
            panic!("expected a list proxy");
        };
        assert_eq!(speeds.len(), 2);
        assert_eq!(speeds.get(1).unwrap().unwrap().as_value(), Some(&json!(20)));
        assert!(matches!(cfg.get("pos").unwrap(), Some(Resolved::Tuple(_))));
        assert_eq!(cfg.get("name").unwrap().unwrap().as_value(), Some(&json!("x")));
        assert!(cfg.get("missing").unwrap().is_none());
        assert_eq!(cfg.keys(), vec!["speeds", "pos", "name"]);
    }

    #[test]
    fn test_strings_are_not_cached() {
        let scope = scope(&[("a", "'{{now}}'"), ("b", "3")]);
        let ticker = Ticker(Cell::new(0));
        let proxy = ProxyDict::over_scope(&scope, &ticker);

        let first = proxy.get("a").unwrap().unwrap().to_value().unwrap();
        let second = proxy.get("a").unwrap().unwrap().to_value().unwrap();
        assert_eq!(first, json!(1));
        assert_eq!(second, json!(2));

        // Non-string scalars never reach the evaluator.
        proxy.get("b").unwrap();
        assert_eq!(ticker.0.get(), 2);
    }

    #[test]
    fn test_wrapping_is_lazy() {
        let scope = scope(&[("list", "['a', 'b', 'c']")]);
        let ticker = Ticker(Cell::new(0));
        let proxy = ProxyDict::over_scope(&scope, &ticker);

        let Some(Resolved::List(list)) = proxy.get("list").unwrap() else {
            panic!("expected a list proxy");
        };
        assert_eq!(ticker.0.get(), 0);
        list.get(2).unwrap();
        assert_eq!(ticker.0.get(), 1);
    }

    #[test]
    fn test_to_value_forces_everything() {
        let scope = scope(&[("t", "(1, 'x')"), ("d", "{'k': None}")]);
        let proxy = ProxyDict::over_scope(&scope, &Verbatim);
        assert_eq!(
            proxy.to_value().unwrap(),
            json!({"d": {"k": null}, "t": [1, "x"]})
        );
        assert_eq!(proxy.to_string(), r#"{"d":{"k":null},"t":[1,"x"]}"#);
    }

    #[test]
    fn test_evaluation_errors_propagate() {
        let scope = scope(&[("a", "'boom'"), ("n", "[1, 'x']")]);
        let proxy = ProxyDict::over_scope(&scope, &Failing);

        assert!(proxy.get("a").is_err());
        assert!(proxy.to_value().is_err());
        assert!(proxy.to_string().starts_with("<unevaluable:"));

        let Some(Resolved::List(list)) = proxy.get("n").unwrap() else {
            panic!("expected a list proxy");
        };
        assert!(list.get(0).is_ok());
        assert!(list.get(1).is_err());
    }
}
