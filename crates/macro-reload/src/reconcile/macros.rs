use std::sync::Arc;

use super::{Comparison, ReloadRequest, SectionPolicy, VariableMode};
use crate::config::Section;
use crate::error::{CommandError, EntityError, RegistryError};
use crate::gcode::{
    is_traditional, GCodeDispatch, Handler, SET_VARIABLE_COMMAND, SET_VARIABLE_HELP,
    SET_VARIABLE_KEY,
};
use crate::host::Host;
use crate::registry::{LiveEntity, MacroEntity};
use crate::report::ReloadReport;
use crate::template::{Fingerprint, TemplateEngine};
use crate::variables::{merge_scopes, VariableScope, VariableStore};

pub const MACRO_FAMILY: &str = "macro";
pub const DEFAULT_DESCRIPTION: &str = "G-Code macro";

/// Options of a `[macro <name>]` section, variables aside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDefinition {
    pub body: String,
    pub description: String,
    pub rename_existing: Option<String>,
}

impl MacroDefinition {
    pub fn from_section(section: &Section) -> Result<Self, EntityError> {
        Ok(Self {
            body: section.require("gcode")?.to_string(),
            description: section.get_or("description", DEFAULT_DESCRIPTION).to_string(),
            rename_existing: section
                .get("rename_existing")
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct DesiredMacro {
    pub definition: MacroDefinition,
    pub fingerprint: Fingerprint,
    /// `None` when variables are managed manually.
    pub variables: Option<VariableScope>,
}

/// Reconciles `[macro]` sections against live macros and the command table.
pub struct MacroReconciler {
    engine: Arc<dyn TemplateEngine>,
}

impl MacroReconciler {
    pub fn new(engine: Arc<dyn TemplateEngine>) -> Self {
        Self { engine }
    }

    fn template_name(key: &str) -> String {
        format!("{}:gcode", key)
    }
}

fn renamed_help(alias: &str) -> String {
    format!("Renamed builtin of '{}'", alias)
}

/// Both tokens must be traditional or both extended, and `target` must be
/// free.
fn check_rename(gcode: &GCodeDispatch, alias: &str, target: &str) -> Result<(), CommandError> {
    if is_traditional(alias) != is_traditional(target) {
        return Err(CommandError::RenameKindMismatch {
            command: alias.to_string(),
            target: target.to_string(),
        });
    }
    if gcode.is_registered(target) {
        return Err(CommandError::AlreadyRegistered(target.to_string()));
    }
    Ok(())
}

/// Moves whatever sits at `alias` to `target` and installs `handler` at
/// `alias`. Applies fully or not at all.
fn bind_rename(
    gcode: &mut GCodeDispatch,
    alias: &str,
    target: &str,
    handler: Handler,
    description: &str,
) -> Result<(), CommandError> {
    check_rename(gcode, alias, target)?;
    gcode.move_command(alias, target, Some(&renamed_help(alias)))?;
    gcode.register_command(alias, handler, false, Some(description))
}

impl SectionPolicy for MacroReconciler {
    type Desired = DesiredMacro;

    fn family(&self) -> &'static str {
        MACRO_FAMILY
    }

    fn compare(
        &self,
        current: &LiveEntity,
        section: &Section,
        request: &ReloadRequest,
        report: &mut ReloadReport,
    ) -> Result<Comparison<DesiredMacro>, EntityError> {
        let current = current.as_macro().ok_or_else(|| RegistryError::WrongKind {
            key: section.key().to_string(),
            expected: "macro",
        })?;
        let definition = MacroDefinition::from_section(section)?;
        let fingerprint = Fingerprint::of(&definition.body);

        let variables = match request.variables {
            VariableMode::Reset => Some(VariableStore::parse(section, report)),
            VariableMode::Merge => Some(merge_scopes(
                &VariableStore::parse(section, report),
                current.variables.scope(),
            )),
            VariableMode::Manual => None,
        };

        let unchanged = fingerprint == current.fingerprint
            && definition.description == current.description
            && definition.rename_existing == current.rename_existing
            && variables
                .as_ref()
                .is_none_or(|vars| vars == current.variables.scope());

        if unchanged {
            return Ok(Comparison::Unchanged);
        }
        Ok(Comparison::Changed(DesiredMacro {
            definition,
            fingerprint,
            variables,
        }))
    }

    fn add(
        &self,
        host: &mut Host,
        section: &Section,
        report: &mut ReloadReport,
    ) -> Result<(), EntityError> {
        let key = section.key();
        let name = section.instance().unwrap_or_default();
        let definition = MacroDefinition::from_section(section)?;
        let template = self
            .engine
            .compile(&Self::template_name(key), &definition.body)?;

        let alias = name.to_uppercase();
        let mux_value = name.to_lowercase();

        if host.objects.contains(key) {
            return Err(RegistryError::AlreadyLoaded(key.to_string()).into());
        }
        host.gcode
            .check_mux_value(SET_VARIABLE_COMMAND, SET_VARIABLE_KEY, &mux_value)?;
        match &definition.rename_existing {
            Some(target) => check_rename(&host.gcode, &alias, target)?,
            None if host.gcode.is_registered(&alias) => {
                return Err(CommandError::AlreadyRegistered(alias).into());
            }
            None => {}
        }

        let handler = Handler::Macro(key.to_string());
        match &definition.rename_existing {
            Some(target) => bind_rename(
                &mut host.gcode,
                &alias,
                target,
                handler,
                &definition.description,
            )?,
            None => host
                .gcode
                .register_command(&alias, handler, false, Some(&definition.description))?,
        }
        host.gcode.register_mux_command(
            SET_VARIABLE_COMMAND,
            SET_VARIABLE_KEY,
            &mux_value,
            Handler::SetVariable(key.to_string()),
            Some(SET_VARIABLE_HELP),
        )?;

        let entity = MacroEntity {
            name: name.to_string(),
            alias,
            fingerprint: Fingerprint::of(&definition.body),
            template,
            description: definition.description,
            rename_existing: definition.rename_existing,
            variables: VariableStore::from_section(section, report),
        };
        host.objects.load_instance(key, LiveEntity::Macro(entity))?;
        Ok(())
    }

    fn update(
        &self,
        host: &mut Host,
        key: &str,
        desired: DesiredMacro,
        report: &mut ReloadReport,
    ) -> Result<bool, EntityError> {
        let DesiredMacro {
            definition,
            fingerprint,
            variables,
        } = desired;
        let template = self
            .engine
            .compile(&Self::template_name(key), &definition.body)?;

        let current = host.objects.lookup_macro(key)?;
        let alias = current.alias.clone();
        let previous = current.rename_existing.clone();
        let mut rename = previous.clone();
        let mut changed = false;

        match (previous.as_deref(), definition.rename_existing.as_deref()) {
            (None, Some(target)) => {
                bind_rename(
                    &mut host.gcode,
                    &alias,
                    target,
                    Handler::Macro(key.to_string()),
                    &definition.description,
                )?;
                rename = Some(target.to_string());
                changed = true;
            }
            (Some(old), None) => {
                report.warn(format!(
                    "Cannot remove rename_existing '{}' from {} without a restart; keeping it",
                    old, key
                ));
            }
            (Some(old), Some(new)) if old != new => {
                if is_traditional(&alias) != is_traditional(new) {
                    return Err(CommandError::RenameKindMismatch {
                        command: alias,
                        target: new.to_string(),
                    }
                    .into());
                }
                host.gcode.move_command(old, new, None)?;
                rename = Some(new.to_string());
                changed = true;
            }
            _ => {}
        }

        let entity = host.objects.lookup_macro_mut(key)?;
        entity.rename_existing = rename;

        if entity.fingerprint != fingerprint {
            entity.template = template;
            entity.fingerprint = fingerprint;
            changed = true;
        }

        let description_changed = entity.description != definition.description;
        if description_changed {
            entity.description = definition.description.clone();
            changed = true;
        }

        if let Some(variables) = variables {
            if &variables != entity.variables.scope() {
                entity.variables.replace(variables);
                changed = true;
            }
        }

        if description_changed {
            host.gcode.set_help(&alias, &definition.description);
        }
        Ok(changed)
    }

    fn remove(
        &self,
        host: &mut Host,
        key: &str,
        _report: &mut ReloadReport,
    ) -> Result<(), EntityError> {
        let current = host.objects.lookup_macro(key)?;
        let alias = current.alias.clone();
        let mux_value = current.name.to_lowercase();
        let rename = current.rename_existing.clone();

        host.gcode.unregister_command(&alias);
        host.gcode
            .unregister_mux_value(SET_VARIABLE_COMMAND, &mux_value);

        if let Some(target) = rename {
            // A rename added on reload parks this macro's own handler at the
            // target; there is no original to restore.
            if host.gcode.lookup(&target) == Some(&Handler::Macro(key.to_string())) {
                host.gcode.unregister_command(&target);
                log::debug!("Dropped {} bound to {}", target, key);
            } else {
                if host.gcode.move_command(&target, &alias, None)?
                    && host.gcode.help(&alias) == Some(renamed_help(&alias).as_str())
                {
                    host.gcode.remove_help(&alias);
                }
                log::debug!("Restored {} from {}", alias, target);
            }
        }

        host.objects.delete(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParsedConfig;
    use crate::reconcile::reconcile;
    use crate::template::HandlebarsEngine;

    fn setup() -> (Host, MacroReconciler) {
        let mut host = Host::new();
        host.gcode.set_ready(true);
        host.gcode
            .register_command("G28", Handler::Native("G28".to_string()), false, Some("Home"))
            .unwrap();
        host.gcode
            .register_command("PAUSE", Handler::Native("PAUSE".to_string()), false, None)
            .unwrap();
        (host, MacroReconciler::new(Arc::new(HandlebarsEngine::default())))
    }

    fn sweep(host: &mut Host, policy: &MacroReconciler, text: &str, request: ReloadRequest) -> Vec<String> {
        let config = ParsedConfig::parse(text).unwrap();
        let mut report = ReloadReport::default();
        reconcile(policy, host, &request, &config, &mut report);
        report.messages().into_iter().map(str::to_string).collect()
    }

    #[test]
    fn test_add_registers_command_and_mux() {
        let (mut host, policy) = setup();
        let lines = sweep(
            &mut host,
            &policy,
            "[macro foo]\ngcode: G28\ndescription: Foo it\n",
            ReloadRequest::all(),
        );
        assert_eq!(lines, vec!["Added macro foo"]);
        assert_eq!(
            host.gcode.lookup("FOO"),
            Some(&Handler::Macro("macro foo".to_string()))
        );
        assert_eq!(host.gcode.help("FOO"), Some("Foo it"));
        assert!(host.gcode.mux_has_value(SET_VARIABLE_COMMAND, "foo"));
    }

    #[test]
    fn test_add_conflict_is_reported() {
        let (mut host, policy) = setup();
        let lines = sweep(&mut host, &policy, "[macro pause]\ngcode: M400\n", ReloadRequest::all());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Failed to add macro pause:"));
        assert!(host.objects.lookup("macro pause").is_none());
        assert!(!host.gcode.mux_has_value(SET_VARIABLE_COMMAND, "pause"));
    }

    #[test]
    fn test_missing_gcode_is_reported() {
        let (mut host, policy) = setup();
        let lines = sweep(&mut host, &policy, "[macro foo]\ndescription: x\n", ReloadRequest::all());
        assert!(lines[0].starts_with("Failed to add macro foo:"));
        assert!(lines[0].contains("gcode"));
    }

    #[test]
    fn test_rename_on_add() {
        let (mut host, policy) = setup();
        sweep(
            &mut host,
            &policy,
            "[macro g28]\nrename_existing: G28.1\ngcode: G28.1\n",
            ReloadRequest::all(),
        );
        assert_eq!(
            host.gcode.lookup("G28.1"),
            Some(&Handler::Native("G28".to_string()))
        );
        assert_eq!(host.gcode.help("G28.1"), Some("Home"));
        assert_eq!(
            host.gcode.lookup("G28"),
            Some(&Handler::Macro("macro g28".to_string()))
        );
    }

    #[test]
    fn test_rename_kind_mismatch() {
        let (mut host, policy) = setup();
        let lines = sweep(
            &mut host,
            &policy,
            "[macro g28]\nrename_existing: BASE_G28\ngcode: G28\n",
            ReloadRequest::all(),
        );
        assert!(lines[0].starts_with("Failed to add macro g28:"));
        assert_eq!(
            host.gcode.lookup("G28"),
            Some(&Handler::Native("G28".to_string()))
        );
    }

    #[test]
    fn test_remove_restores_renamed_builtin() {
        let (mut host, policy) = setup();
        sweep(
            &mut host,
            &policy,
            "[macro pause]\nrename_existing: BASE_PAUSE\ngcode: BASE_PAUSE\n",
            ReloadRequest::all(),
        );
        assert_eq!(host.gcode.help("BASE_PAUSE"), Some("Renamed builtin of 'PAUSE'"));

        let lines = sweep(&mut host, &policy, "", ReloadRequest::all());
        assert_eq!(lines, vec!["Removed macro pause"]);
        assert_eq!(
            host.gcode.lookup("PAUSE"),
            Some(&Handler::Native("PAUSE".to_string()))
        );
        assert!(!host.gcode.is_known("BASE_PAUSE"));
        assert_eq!(host.gcode.help("PAUSE"), None);
    }

    #[test]
    fn test_remove_after_rename_added_on_reload() {
        let (mut host, policy) = setup();
        sweep(&mut host, &policy, "[macro park]\ngcode: G28\n", ReloadRequest::all());
        sweep(
            &mut host,
            &policy,
            "[macro park]\nrename_existing: PARK_BASE\ngcode: G28\n",
            ReloadRequest::all(),
        );

        let lines = sweep(&mut host, &policy, "", ReloadRequest::all());
        assert_eq!(lines, vec!["Removed macro park"]);
        assert!(!host.gcode.is_known("PARK"));
        assert!(!host.gcode.is_known("PARK_BASE"));
    }

    #[test]
    fn test_refused_rename_removal() {
        let (mut host, policy) = setup();
        sweep(
            &mut host,
            &policy,
            "[macro pause]\nrename_existing: BASE_PAUSE\ngcode: BASE_PAUSE\n",
            ReloadRequest::all(),
        );
        let lines = sweep(&mut host, &policy, "[macro pause]\ngcode: BASE_PAUSE\n", ReloadRequest::all());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Cannot remove rename_existing"));
        assert!(host.gcode.is_registered("BASE_PAUSE"));
        let entity = host.objects.lookup_macro("macro pause").unwrap();
        assert_eq!(entity.rename_existing.as_deref(), Some("BASE_PAUSE"));
    }

    #[test]
    fn test_update_description_updates_help() {
        let (mut host, policy) = setup();
        sweep(&mut host, &policy, "[macro foo]\ngcode: G28\n", ReloadRequest::all());
        assert_eq!(host.gcode.help("FOO"), Some(DEFAULT_DESCRIPTION));

        let lines = sweep(
            &mut host,
            &policy,
            "[macro foo]\ngcode: G28\ndescription: New\n",
            ReloadRequest::all(),
        );
        assert_eq!(lines, vec!["Updated macro foo"]);
        assert_eq!(host.gcode.help("FOO"), Some("New"));
    }

    #[test]
    fn test_syntax_error_leaves_entity() {
        let (mut host, policy) = setup();
        sweep(&mut host, &policy, "[macro foo]\ngcode: G28\n", ReloadRequest::all());
        let before = host.objects.lookup_macro("macro foo").unwrap().fingerprint;

        let lines = sweep(
            &mut host,
            &policy,
            "[macro foo]\ngcode: {{#if x}}G28{{/each}}\n",
            ReloadRequest::all(),
        );
        assert!(lines[0].starts_with("Failed to update macro foo:"));
        assert_eq!(host.objects.lookup_macro("macro foo").unwrap().fingerprint, before);
    }
}
