use chrono::Local;
use serde_json::{json, Map, Value};

use crate::host::Host;

/// Builds the default rendering context for a template.
///
/// A fresh context is created for every render, so values such as the
/// current time or host status are never stale.
pub trait ContextFactory: Send {
    fn create_context(&self, host: &Host) -> Map<String, Value>;
}

/// Standard context: `now` plus, when enabled, the `printer` status.
#[derive(Debug, Clone, Copy)]
pub struct DefaultContext {
    expose_printer: bool,
}

impl DefaultContext {
    pub fn new(expose_printer: bool) -> Self {
        Self { expose_printer }
    }
}

impl Default for DefaultContext {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ContextFactory for DefaultContext {
    fn create_context(&self, host: &Host) -> Map<String, Value> {
        let now = Local::now();
        let mut context = Map::new();
        context.insert(
            "now".to_string(),
            json!({
                "iso": now.to_rfc3339(),
                "timestamp": now.timestamp(),
            }),
        );
        if self.expose_printer {
            context.insert("printer".to_string(), host.status());
        }
        context
    }
}
