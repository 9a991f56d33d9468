use serde_json::Value;

use super::Evaluate;
use crate::error::TemplateError;
use crate::host::Host;
use crate::literal;
use crate::template::{ContextFactory, TemplateEngine};

/// Renders string leaves that contain template markup.
///
/// Every call builds a fresh default context. Rendered output that reads as
/// a literal becomes that value, anything else stays a string.
pub struct ExpressionEvaluator<'a> {
    engine: &'a dyn TemplateEngine,
    context: &'a dyn ContextFactory,
    host: &'a Host,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(engine: &'a dyn TemplateEngine, context: &'a dyn ContextFactory, host: &'a Host) -> Self {
        Self {
            engine,
            context,
            host,
        }
    }
}

impl Evaluate for ExpressionEvaluator<'_> {
    fn evaluate(&self, source: &str) -> Result<Value, TemplateError> {
        if !source.contains("{{") {
            return Ok(Value::String(source.to_string()));
        }

        let context = Value::Object(self.context.create_context(self.host));
        let rendered = self.engine.render_str("variable", source, &context)?;
        Ok(literal::parse(rendered.trim())
            .ok()
            .and_then(|parsed| parsed.to_json().ok())
            .unwrap_or(Value::String(rendered)))
    }
}
