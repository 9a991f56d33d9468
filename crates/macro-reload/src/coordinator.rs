//! Reload entry point: read config, refresh globals, run both sweeps.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::{ConfigSource, ParsedConfig, SETTINGS_SECTION};
use crate::error::Result;
use crate::host::Host;
use crate::reconcile::{reconcile, MacroReconciler, ReloadRequest, TemplateReconciler};
use crate::report::ReloadReport;
use crate::template::TemplateEngine;
use crate::variables::VariableStore;

pub struct ReloadCoordinator {
    source: Box<dyn ConfigSource>,
    globals: ArcSwap<VariableStore>,
    macros: MacroReconciler,
    templates: TemplateReconciler,
}

impl ReloadCoordinator {
    pub fn new(source: Box<dyn ConfigSource>, engine: Arc<dyn TemplateEngine>) -> Self {
        Self {
            source,
            globals: ArcSwap::from_pointee(VariableStore::new(SETTINGS_SECTION, Default::default())),
            macros: MacroReconciler::new(Arc::clone(&engine)),
            templates: TemplateReconciler::new(engine),
        }
    }

    pub fn source(&self) -> &dyn ConfigSource {
        self.source.as_ref()
    }

    /// Current global variables. Callers keep a consistent snapshot even if
    /// a reload swaps in a new scope meanwhile.
    pub fn globals(&self) -> Arc<VariableStore> {
        self.globals.load_full()
    }

    /// Re-reads the config and reconciles. Config errors abort before any
    /// live object is touched.
    pub fn reload(&self, host: &mut Host, request: &ReloadRequest) -> Result<ReloadReport> {
        let config = self.source.read_full_config()?;
        Ok(self.apply(host, request, &config))
    }

    /// Reconciles against an already parsed config.
    pub fn apply(&self, host: &mut Host, request: &ReloadRequest, config: &ParsedConfig) -> ReloadReport {
        let span = tracing::info_span!(
            "reload",
            name = request.name.as_deref().unwrap_or("*"),
            variables = ?request.variables,
        );
        let _enter = span.enter();

        let mut report = ReloadReport::default();

        let globals = match config.section(SETTINGS_SECTION) {
            Some(section) => VariableStore::from_section(section, &mut report),
            None => VariableStore::new(SETTINGS_SECTION, Default::default()),
        };
        self.globals.store(Arc::new(globals));

        reconcile(&self.macros, host, request, config, &mut report);
        reconcile(&self.templates, host, request, config, &mut report);

        report.info("Reload complete");
        report
    }
}
