use handlebars::{no_escape, Handlebars, Template};
use serde_json::Value;

use super::helpers;
use super::TemplateEngine;
use crate::config::{EngineOptions, ReloadSettings};
use crate::error::TemplateError;

/// Handlebars-backed engine with HTML escaping disabled.
pub struct HandlebarsEngine {
    registry: Handlebars<'static>,
    helpers: Vec<&'static str>,
}

impl HandlebarsEngine {
    pub fn new(options: EngineOptions, expose_print: bool) -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(no_escape);

        let toggles: [(bool, &[&'static str], fn(&mut Handlebars<'static>)); 7] = [
            (options.bool_filter, &["bool"], helpers::register_bool),
            (options.yes_no_filter, &["yesno"], helpers::register_yes_no),
            (options.on_off_filter, &["onoff"], helpers::register_on_off),
            (options.from_json_filter, &["fromjson"], helpers::register_from_json),
            (options.loop_controls_extension, &["take", "skip"], helpers::register_loop_controls),
            (options.do_extension, &["do"], helpers::register_do),
            (expose_print, &["print"], helpers::register_print),
        ];

        let mut enabled = Vec::new();
        for (on, names, register) in toggles {
            if on {
                register(&mut registry);
                enabled.extend_from_slice(names);
            }
        }
        log::debug!("Template helpers enabled: {}", enabled.join(", "));

        Self {
            registry,
            helpers: enabled,
        }
    }

    pub fn from_settings(settings: &ReloadSettings) -> Self {
        Self::new(settings.engine, settings.expose_print)
    }

    pub fn has_helper(&self, name: &str) -> bool {
        self.helpers.contains(&name)
    }
}

impl Default for HandlebarsEngine {
    fn default() -> Self {
        Self::from_settings(&ReloadSettings::default())
    }
}

impl TemplateEngine for HandlebarsEngine {
    fn parse(&self, name: &str, source: &str) -> Result<(), TemplateError> {
        Template::compile(source)
            .map(|_| ())
            .map_err(|e| TemplateError::Syntax {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    fn render_str(&self, name: &str, source: &str, context: &Value) -> Result<String, TemplateError> {
        self.registry
            .render_template(source, context)
            .map_err(|e| TemplateError::Render {
                name: name.to_string(),
                message: e.to_string(),
            })
    }
}
