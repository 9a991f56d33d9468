//! Live objects created from config sections, keyed by full section name.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::error::RegistryError;
use crate::template::{CompiledTemplate, Fingerprint};
use crate::variables::VariableStore;

/// A callable macro bound to a command token.
#[derive(Debug, Clone)]
pub struct MacroEntity {
    pub name: String,
    /// Uppercase command token.
    pub alias: String,
    pub template: CompiledTemplate,
    pub fingerprint: Fingerprint,
    pub description: String,
    /// Slot the pre-existing handler of `alias` was moved to.
    pub rename_existing: Option<String>,
    pub variables: VariableStore,
}

/// A pure template body with no command binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEntity {
    pub name: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub enum LiveEntity {
    Macro(MacroEntity),
    Template(TemplateEntity),
}

impl LiveEntity {
    pub fn kind(&self) -> &'static str {
        match self {
            LiveEntity::Macro(_) => "macro",
            LiveEntity::Template(_) => "template",
        }
    }

    pub fn as_macro(&self) -> Option<&MacroEntity> {
        match self {
            LiveEntity::Macro(entity) => Some(entity),
            LiveEntity::Template(_) => None,
        }
    }

    pub fn as_macro_mut(&mut self) -> Option<&mut MacroEntity> {
        match self {
            LiveEntity::Macro(entity) => Some(entity),
            LiveEntity::Template(_) => None,
        }
    }

    pub fn as_template(&self) -> Option<&TemplateEntity> {
        match self {
            LiveEntity::Template(entity) => Some(entity),
            LiveEntity::Macro(_) => None,
        }
    }

    pub fn as_template_mut(&mut self) -> Option<&mut TemplateEntity> {
        match self {
            LiveEntity::Template(entity) => Some(entity),
            LiveEntity::Macro(_) => None,
        }
    }

    /// Status snapshot exposed to templates as `printer["<key>"]`.
    pub fn status(&self) -> Value {
        match self {
            LiveEntity::Macro(entity) => entity.variables.snapshot(),
            LiveEntity::Template(entity) => json!({ "template": entity.body }),
        }
    }
}

/// Object registry. Iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    objects: HashMap<String, LiveEntity>,
    order: Vec<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, key: &str) -> Option<&LiveEntity> {
        self.objects.get(key)
    }

    pub fn lookup_mut(&mut self, key: &str) -> Option<&mut LiveEntity> {
        self.objects.get_mut(key)
    }

    pub fn lookup_macro(&self, key: &str) -> Result<&MacroEntity, RegistryError> {
        self.lookup(key)
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))?
            .as_macro()
            .ok_or_else(|| RegistryError::WrongKind {
                key: key.to_string(),
                expected: "macro",
            })
    }

    pub fn lookup_macro_mut(&mut self, key: &str) -> Result<&mut MacroEntity, RegistryError> {
        self.objects
            .get_mut(key)
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))?
            .as_macro_mut()
            .ok_or_else(|| RegistryError::WrongKind {
                key: key.to_string(),
                expected: "macro",
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    pub fn load_instance(&mut self, key: &str, entity: LiveEntity) -> Result<(), RegistryError> {
        if self.objects.contains_key(key) {
            return Err(RegistryError::AlreadyLoaded(key.to_string()));
        }
        self.objects.insert(key.to_string(), entity);
        self.order.push(key.to_string());
        Ok(())
    }

    /// Keys of the form `<family> <name>`, in insertion order. A bare
    /// `<family>` root object is never included.
    pub fn list_by_family(&self, family: &str) -> Vec<String> {
        self.order
            .iter()
            .filter(|key| {
                key.split_once(' ')
                    .is_some_and(|(prefix, _)| prefix == family)
            })
            .cloned()
            .collect()
    }

    pub fn delete(&mut self, key: &str) -> Option<LiveEntity> {
        let removed = self.objects.remove(key)?;
        self.order.retain(|k| k != key);
        Some(removed)
    }

    pub fn keys(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(name: &str) -> LiveEntity {
        LiveEntity::Template(TemplateEntity {
            name: name.to_string(),
            body: String::new(),
        })
    }

    #[test]
    fn test_load_lookup_delete() {
        let mut registry = Registry::new();
        registry.load_instance("template a", template("a")).unwrap();
        assert_eq!(
            registry.load_instance("template a", template("a")),
            Err(RegistryError::AlreadyLoaded("template a".to_string()))
        );
        assert!(registry.lookup("template a").is_some());
        assert!(matches!(
            registry.lookup_macro("template a"),
            Err(RegistryError::WrongKind { .. })
        ));
        assert!(registry.delete("template a").is_some());
        assert!(registry.is_empty());
        assert!(registry.delete("template a").is_none());
    }

    #[test]
    fn test_list_by_family() {
        let mut registry = Registry::new();
        registry.load_instance("template", template("")).unwrap();
        registry.load_instance("template b", template("b")).unwrap();
        registry.load_instance("templates x", template("x")).unwrap();
        registry.load_instance("template a", template("a")).unwrap();
        assert_eq!(registry.list_by_family("template"), vec!["template b", "template a"]);
    }
}
