//! Builders for config text.

#![allow(dead_code)]

/// Builder for one `[macro <name>]` section.
pub struct MacroBuilder {
    name: String,
    gcode: Vec<String>,
    description: Option<String>,
    rename_existing: Option<String>,
    variables: Vec<(String, String)>,
}

impl MacroBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            gcode: Vec::new(),
            description: None,
            rename_existing: None,
            variables: Vec::new(),
        }
    }

    /// Append one line to the macro body.
    pub fn line(mut self, line: &str) -> Self {
        self.gcode.push(line.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn rename_existing(mut self, target: &str) -> Self {
        self.rename_existing = Some(target.to_string());
        self
    }

    /// Add a `variable_<name>` option with the raw literal text.
    pub fn variable(mut self, name: &str, raw: &str) -> Self {
        self.variables.push((name.to_string(), raw.to_string()));
        self
    }

    pub fn build(&self) -> String {
        let mut out = format!("[macro {}]\n", self.name);
        if let Some(description) = &self.description {
            out.push_str(&format!("description: {}\n", description));
        }
        if let Some(target) = &self.rename_existing {
            out.push_str(&format!("rename_existing: {}\n", target));
        }
        for (name, raw) in &self.variables {
            out.push_str(&format!("variable_{}: {}\n", name, raw));
        }
        out.push_str("gcode:\n");
        for line in &self.gcode {
            out.push_str(&format!("  {}\n", line));
        }
        out
    }
}

/// Builder for a whole config file.
#[derive(Default)]
pub struct ConfigBuilder {
    sections: Vec<String>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_macro(mut self, builder: MacroBuilder) -> Self {
        self.sections.push(builder.build());
        self
    }

    pub fn template(mut self, name: &str, body: &str) -> Self {
        self.sections
            .push(format!("[template {}]\ntemplate: {}\n", name, body));
        self
    }

    /// Add a `[macro_reload]` section with the given raw options.
    pub fn settings(mut self, options: &[(&str, &str)]) -> Self {
        let mut section = "[macro_reload]\n".to_string();
        for (key, value) in options {
            section.push_str(&format!("{}: {}\n", key, value));
        }
        self.sections.push(section);
        self
    }

    pub fn include(mut self, pattern: &str) -> Self {
        self.sections.push(format!("[include {}]\n", pattern));
        self
    }

    /// Add arbitrary text verbatim.
    pub fn raw(mut self, text: &str) -> Self {
        self.sections.push(text.to_string());
        self
    }

    pub fn build(&self) -> String {
        self.sections.join("\n")
    }
}
