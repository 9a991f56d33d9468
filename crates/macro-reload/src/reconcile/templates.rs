use std::sync::Arc;

use super::{Comparison, ReloadRequest, SectionPolicy};
use crate::config::Section;
use crate::error::{EntityError, RegistryError};
use crate::host::Host;
use crate::registry::{LiveEntity, TemplateEntity};
use crate::report::ReloadReport;
use crate::template::TemplateEngine;

pub const TEMPLATE_FAMILY: &str = "template";

/// Reconciles `[template]` sections. Bodies are replaced in place; no
/// command is ever bound.
pub struct TemplateReconciler {
    engine: Arc<dyn TemplateEngine>,
}

impl TemplateReconciler {
    pub fn new(engine: Arc<dyn TemplateEngine>) -> Self {
        Self { engine }
    }
}

fn body_of(section: &Section) -> String {
    section.get_or("template", "").to_string()
}

impl SectionPolicy for TemplateReconciler {
    type Desired = String;

    fn family(&self) -> &'static str {
        TEMPLATE_FAMILY
    }

    fn compare(
        &self,
        current: &LiveEntity,
        section: &Section,
        _request: &ReloadRequest,
        _report: &mut ReloadReport,
    ) -> Result<Comparison<String>, EntityError> {
        let current = current.as_template().ok_or_else(|| RegistryError::WrongKind {
            key: section.key().to_string(),
            expected: "template",
        })?;
        let body = body_of(section);
        if body == current.body {
            Ok(Comparison::Unchanged)
        } else {
            Ok(Comparison::Changed(body))
        }
    }

    fn add(
        &self,
        host: &mut Host,
        section: &Section,
        _report: &mut ReloadReport,
    ) -> Result<(), EntityError> {
        let body = body_of(section);
        self.engine.parse(section.key(), &body)?;
        host.objects.load_instance(
            section.key(),
            LiveEntity::Template(TemplateEntity {
                name: section.instance().unwrap_or_default().to_string(),
                body,
            }),
        )?;
        Ok(())
    }

    fn update(
        &self,
        host: &mut Host,
        key: &str,
        desired: String,
        _report: &mut ReloadReport,
    ) -> Result<bool, EntityError> {
        self.engine.parse(key, &desired)?;
        let entity = host
            .objects
            .lookup_mut(key)
            .and_then(LiveEntity::as_template_mut)
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))?;
        entity.body = desired;
        Ok(true)
    }

    fn remove(
        &self,
        host: &mut Host,
        key: &str,
        _report: &mut ReloadReport,
    ) -> Result<(), EntityError> {
        host.objects
            .delete(key)
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParsedConfig;
    use crate::reconcile::reconcile;
    use crate::template::HandlebarsEngine;

    fn sweep(host: &mut Host, text: &str) -> Vec<String> {
        let policy = TemplateReconciler::new(Arc::new(HandlebarsEngine::default()));
        let config = ParsedConfig::parse(text).unwrap();
        let mut report = ReloadReport::default();
        reconcile(&policy, host, &ReloadRequest::all(), &config, &mut report);
        report.messages().into_iter().map(str::to_string).collect()
    }

    fn body(host: &Host, key: &str) -> String {
        host.objects.lookup(key).unwrap().as_template().unwrap().body.clone()
    }

    #[test]
    fn test_lifecycle() {
        let mut host = Host::new();
        assert_eq!(sweep(&mut host, "[template t]\ntemplate: a\n"), vec!["Added template t"]);
        assert_eq!(sweep(&mut host, "[template t]\ntemplate: a\n"), Vec::<String>::new());
        assert_eq!(sweep(&mut host, "[template t]\ntemplate: b\n"), vec!["Updated template t"]);
        assert_eq!(body(&host, "template t"), "b");
        assert_eq!(sweep(&mut host, ""), vec!["Removed template t"]);
        assert!(host.objects.is_empty());
        assert!(!host.gcode.is_known("T"));
    }

    #[test]
    fn test_empty_default() {
        let mut host = Host::new();
        sweep(&mut host, "[template t]\n");
        assert_eq!(body(&host, "template t"), "");
    }

    #[test]
    fn test_bad_update_keeps_body() {
        let mut host = Host::new();
        sweep(&mut host, "[template t]\ntemplate: ok\n");
        let lines = sweep(&mut host, "[template t]\ntemplate: {{#if a}}x{{/each}}\n");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Failed to update template t:"));
        assert_eq!(body(&host, "template t"), "ok");
    }
}
