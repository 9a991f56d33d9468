//! Template engine seam.
//!
//! The reconcilers only need to syntax-check and render template bodies, so
//! they talk to a [`TemplateEngine`] trait object. [`HandlebarsEngine`] is
//! the implementation used by the printer shell.

pub mod context;
pub mod engine;
pub mod hash;
mod helpers;

use std::sync::Arc;

use serde_json::Value;

use crate::error::TemplateError;

pub use context::{ContextFactory, DefaultContext};
pub use engine::HandlebarsEngine;
pub use hash::Fingerprint;

/// A template body that passed the syntax check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplate {
    name: String,
    source: Arc<str>,
}

impl CompiledTemplate {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

pub trait TemplateEngine: Send + Sync {
    /// Syntax-checks `source` without keeping the result.
    fn parse(&self, name: &str, source: &str) -> Result<(), TemplateError>;

    fn compile(&self, name: &str, source: &str) -> Result<CompiledTemplate, TemplateError> {
        self.parse(name, source)?;
        Ok(CompiledTemplate {
            name: name.to_string(),
            source: Arc::from(source),
        })
    }

    fn render(&self, template: &CompiledTemplate, context: &Value) -> Result<String, TemplateError> {
        self.render_str(template.name(), template.source(), context)
    }

    fn render_str(&self, name: &str, source: &str, context: &Value) -> Result<String, TemplateError>;
}
