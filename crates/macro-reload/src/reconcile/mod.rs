//! Add / update / remove sweep over one config-section family.
//!
//! A policy supplies the family-specific pieces: how to compare a live
//! entity with its section and how to add, update or remove one. The sweep
//! itself is shared. Per-entity failures become report lines and never stop
//! the sweep.

pub mod macros;
pub mod templates;

use crate::config::{ParsedConfig, Section};
use crate::error::EntityError;
use crate::host::Host;
use crate::registry::LiveEntity;
use crate::report::{ChangeKind, ReloadReport};

pub use macros::MacroReconciler;
pub use templates::TemplateReconciler;

/// How macro variables are treated on update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableMode {
    /// Replace live values with config defaults.
    #[default]
    Reset,
    /// Keep live values, add config keys that are missing, drop the rest.
    Merge,
    /// Leave live variables alone.
    Manual,
}

impl From<i64> for VariableMode {
    fn from(value: i64) -> Self {
        match value {
            0 => VariableMode::Reset,
            1 => VariableMode::Merge,
            _ => VariableMode::Manual,
        }
    }
}

/// Parameters of one `MACRO_RELOAD`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadRequest {
    /// Restricts the sweep to one instance name, case-insensitively.
    pub name: Option<String>,
    pub variables: VariableMode,
}

impl ReloadRequest {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_variables(mut self, mode: VariableMode) -> Self {
        self.variables = mode;
        self
    }

    pub fn matches(&self, instance: &str) -> bool {
        self.name
            .as_deref()
            .is_none_or(|name| name.eq_ignore_ascii_case(instance))
    }
}

/// Outcome of comparing a live entity with its section.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison<D> {
    Unchanged,
    Changed(D),
}

pub trait SectionPolicy {
    /// Target state computed by `compare` and applied by `update`.
    type Desired;

    fn family(&self) -> &'static str;

    fn compare(
        &self,
        current: &LiveEntity,
        section: &Section,
        request: &ReloadRequest,
        report: &mut ReloadReport,
    ) -> Result<Comparison<Self::Desired>, EntityError>;

    fn add(
        &self,
        host: &mut Host,
        section: &Section,
        report: &mut ReloadReport,
    ) -> Result<(), EntityError>;

    /// Applies `desired`; returns whether anything actually changed.
    fn update(
        &self,
        host: &mut Host,
        key: &str,
        desired: Self::Desired,
        report: &mut ReloadReport,
    ) -> Result<bool, EntityError>;

    fn remove(
        &self,
        host: &mut Host,
        key: &str,
        report: &mut ReloadReport,
    ) -> Result<(), EntityError>;
}

/// Runs one sweep. Adds and updates happen in config order, then stale live
/// entities are removed in registry order.
pub fn reconcile<P: SectionPolicy + ?Sized>(
    policy: &P,
    host: &mut Host,
    request: &ReloadRequest,
    config: &ParsedConfig,
    report: &mut ReloadReport,
) {
    let family = policy.family();

    for section in config.sections_of(family) {
        let Some(instance) = section.instance() else {
            continue;
        };
        if !request.matches(instance) {
            continue;
        }
        let key = section.key();

        let comparison = match host.objects.lookup(key) {
            None => {
                match policy.add(host, section, report) {
                    Ok(()) => report.change(ChangeKind::Added, key),
                    Err(e) => report.error(format!("Failed to add {}: {}", key, e)),
                }
                continue;
            }
            Some(current) => policy.compare(current, section, request, report),
        };

        match comparison {
            Ok(Comparison::Unchanged) => log::debug!("{} is up to date", key),
            Ok(Comparison::Changed(desired)) => match policy.update(host, key, desired, report) {
                Ok(true) => report.change(ChangeKind::Updated, key),
                Ok(false) => log::debug!("{} left as is", key),
                Err(e) => report.error(format!("Failed to update {}: {}", key, e)),
            },
            Err(e) => report.error(format!("Failed to update {}: {}", key, e)),
        }
    }

    let stale: Vec<String> = host
        .objects
        .list_by_family(family)
        .into_iter()
        .filter(|key| {
            key.split_once(' ')
                .is_some_and(|(_, instance)| request.matches(instance))
        })
        .filter(|key| !config.has_section(key))
        .collect();

    for key in stale {
        match policy.remove(host, &key, report) {
            Ok(()) => report.change(ChangeKind::Removed, &key),
            Err(e) => report.error(format!("Failed to remove {}: {}", key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_mode_from_int() {
        assert_eq!(VariableMode::from(0), VariableMode::Reset);
        assert_eq!(VariableMode::from(1), VariableMode::Merge);
        assert_eq!(VariableMode::from(2), VariableMode::Manual);
        assert_eq!(VariableMode::from(-1), VariableMode::Manual);
    }

    #[test]
    fn test_request_filter() {
        assert!(ReloadRequest::all().matches("anything"));
        let request = ReloadRequest::named("Foo");
        assert!(request.matches("foo"));
        assert!(request.matches("FOO"));
        assert!(!request.matches("bar"));
    }
}
