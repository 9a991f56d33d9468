//! Minimal host process: command tables, builtins and macro execution.
//!
//! Native motion and heater commands are not executed; they are recorded so
//! callers can see what a macro expanded to.

use std::sync::Arc;

use serde_json::Value;

use crate::config::{ConfigSource, ReloadSettings};
use crate::coordinator::ReloadCoordinator;
use crate::error::{ExecutionError, Result};
use crate::gcode::{Builtin, GCodeCommand, Handler};
use crate::host::Host;
use crate::literal;
use crate::reconcile::{ReloadRequest, VariableMode};
use crate::report::ReloadReport;
use crate::template::{ContextFactory, DefaultContext, HandlebarsEngine, TemplateEngine};
use crate::variables::{ExpressionEvaluator, VariableStore};

const NATIVE_COMMANDS: &[&str] = &[
    "G0", "G1", "G4", "G28", "G90", "G91", "G92", "M104", "M106", "M107", "M109", "M117",
    "M140", "M190", "M400",
];

const BUILTINS: &[(&str, Builtin, bool, &str)] = &[
    (
        "MACRO_RELOAD",
        Builtin::MacroReload,
        false,
        "Reloads macros from config files",
    ),
    (
        "HELP",
        Builtin::Help,
        true,
        "Report the list of available extended G-Code commands",
    ),
    (
        "RESPOND",
        Builtin::Respond,
        false,
        "Echo the message prepended with a prefix",
    ),
];

pub struct Printer {
    host: Host,
    engine: Arc<HandlebarsEngine>,
    context: Box<dyn ContextFactory>,
    reload: ReloadCoordinator,
    startup_report: ReloadReport,
    responses: Vec<String>,
    executed: Vec<String>,
    call_stack: Vec<String>,
}

impl Printer {
    /// Reads the config, registers builtins and loads every macro and
    /// template.
    pub fn start(source: Box<dyn ConfigSource>) -> Result<Self> {
        Self::start_with(source, None)
    }

    /// Like [`Printer::start`] with a custom rendering context.
    pub fn start_with(
        source: Box<dyn ConfigSource>,
        context: Option<Box<dyn ContextFactory>>,
    ) -> Result<Self> {
        let config = source.read_full_config()?;
        let settings = ReloadSettings::from_config(&config)?;
        let engine = Arc::new(HandlebarsEngine::from_settings(&settings));
        let context =
            context.unwrap_or_else(|| Box::new(DefaultContext::new(settings.expose_printer)));

        let mut host = Host::new();
        for (command, builtin, when_not_ready, desc) in BUILTINS {
            host.gcode.register_command(
                command,
                Handler::Builtin(*builtin),
                *when_not_ready,
                Some(*desc),
            )?;
        }
        for command in NATIVE_COMMANDS {
            host.gcode
                .register_command(command, Handler::Native(command.to_string()), false, None)?;
        }

        let shared: Arc<dyn TemplateEngine> = engine.clone();
        let reload = ReloadCoordinator::new(source, shared);
        let startup_report = reload.apply(&mut host, &ReloadRequest::all(), &config);
        host.gcode.set_ready(true);
        log::info!("Printer ready with {} objects", host.objects.len());

        Ok(Self {
            host,
            engine,
            context,
            reload,
            startup_report,
            responses: Vec::new(),
            executed: Vec::new(),
            call_stack: Vec::new(),
        })
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn startup_report(&self) -> &ReloadReport {
        &self.startup_report
    }

    pub fn globals(&self) -> Arc<VariableStore> {
        self.reload.globals()
    }

    /// Drains the response lines produced since the last call.
    pub fn take_responses(&mut self) -> Vec<String> {
        std::mem::take(&mut self.responses)
    }

    /// Drains the native commands executed since the last call.
    pub fn take_executed(&mut self) -> Vec<String> {
        std::mem::take(&mut self.executed)
    }

    /// Runs a reload outside of a G-code command.
    pub fn reload(&mut self, request: &ReloadRequest) -> Result<ReloadReport> {
        self.reload.reload(&mut self.host, request)
    }

    /// Runs each line in order, stopping at the first error.
    pub fn run_script(&mut self, script: &str) -> std::result::Result<(), ExecutionError> {
        for line in script.lines() {
            self.run_line(line)?;
        }
        Ok(())
    }

    pub fn run_line(&mut self, line: &str) -> std::result::Result<(), ExecutionError> {
        let Some(cmd) = GCodeCommand::parse(line)? else {
            return Ok(());
        };
        let handler = self
            .host
            .gcode
            .lookup(cmd.command())
            .cloned()
            .ok_or_else(|| ExecutionError::UnknownCommand(cmd.command().to_string()))?;
        self.dispatch(handler, &cmd)
    }

    fn dispatch(&mut self, handler: Handler, cmd: &GCodeCommand) -> std::result::Result<(), ExecutionError> {
        match handler {
            Handler::Builtin(Builtin::MacroReload) => self.cmd_macro_reload(cmd),
            Handler::Builtin(Builtin::Help) => {
                let lines: Vec<String> = self
                    .host
                    .gcode
                    .help_entries()
                    .into_iter()
                    .map(|(command, help)| format!("{}: {}", command, help))
                    .collect();
                self.respond_info("Available extended commands:");
                for line in lines {
                    self.respond_info(&line);
                }
                Ok(())
            }
            Handler::Builtin(Builtin::Respond) => {
                let prefix = cmd.get_or("PREFIX", "echo:");
                let message = cmd.get_or("MSG", "");
                self.responses.push(format!("{} {}", prefix, message));
                Ok(())
            }
            Handler::Native(name) => {
                let line = format!("{} {}", name, cmd.raw_params());
                log::debug!("Executing {}", line.trim_end());
                self.executed.push(line.trim_end().to_string());
                Ok(())
            }
            Handler::Mux(command) => {
                let key = self
                    .host
                    .gcode
                    .mux_key(&command)
                    .unwrap_or_default()
                    .to_string();
                let value = cmd.require(&key)?.to_lowercase();
                let target = self
                    .host
                    .gcode
                    .mux_lookup(&command, &value)
                    .cloned()
                    .ok_or_else(|| ExecutionError::InvalidParameter {
                        command: command.clone(),
                        param: key,
                        value,
                    })?;
                self.dispatch(target, cmd)
            }
            Handler::SetVariable(key) => self.cmd_set_variable(&key, cmd),
            Handler::Macro(key) => self.run_macro(&key, cmd),
        }
    }

    fn respond_info(&mut self, message: &str) {
        self.responses.push(format!("// {}", message));
    }

    fn cmd_macro_reload(&mut self, cmd: &GCodeCommand) -> std::result::Result<(), ExecutionError> {
        let request = ReloadRequest {
            name: cmd
                .get("NAME")
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            variables: VariableMode::from(cmd.get_int("VARIABLES", 0)?),
        };
        let report = self
            .reload
            .reload(&mut self.host, &request)
            .map_err(|e| ExecutionError::Reload(Box::new(e)))?;
        for line in report.lines() {
            self.respond_info(&line.message);
        }
        Ok(())
    }

    fn cmd_set_variable(&mut self, key: &str, cmd: &GCodeCommand) -> std::result::Result<(), ExecutionError> {
        let variable = cmd.require("VARIABLE")?.to_lowercase();
        let raw = cmd.require("VALUE")?;
        let value = literal::parse_variable(raw).map_err(|source| ExecutionError::InvalidValue {
            value: raw.to_string(),
            source,
        })?;

        let entity = self.host.objects.lookup_macro_mut(key)?;
        if !entity.variables.set(&variable, value) {
            return Err(ExecutionError::UnknownVariable {
                macro_name: entity.name.clone(),
                variable,
            });
        }
        Ok(())
    }

    fn macro_context(
        &self,
        key: &str,
        cmd: &GCodeCommand,
    ) -> std::result::Result<Value, ExecutionError> {
        let entity = self.host.objects.lookup_macro(key)?;
        let eval = ExpressionEvaluator::new(self.engine.as_ref(), self.context.as_ref(), &self.host);

        let mut context = self.context.create_context(&self.host);
        if let Value::Object(variables) = entity.variables.proxy(&eval).to_value()? {
            context.extend(variables);
        }
        let globals = self.reload.globals();
        context.insert("global".to_string(), globals.proxy(&eval).to_value()?);
        context.insert("params".to_string(), cmd.params_json());
        context.insert(
            "rawparams".to_string(),
            Value::String(cmd.raw_params().to_string()),
        );
        Ok(Value::Object(context))
    }

    fn run_macro(&mut self, key: &str, cmd: &GCodeCommand) -> std::result::Result<(), ExecutionError> {
        let entity = self.host.objects.lookup_macro(key)?;
        if self.call_stack.iter().any(|k| k == key) {
            return Err(ExecutionError::Recursive(entity.alias.clone()));
        }
        let template = entity.template.clone();

        let context = self.macro_context(key, cmd)?;
        let script = self.engine.render(&template, &context)?;

        self.call_stack.push(key.to_string());
        let result = self.run_script(&script);
        self.call_stack.pop();
        result
    }
}
