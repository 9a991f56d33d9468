use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ExecutionError;

static COMMAND_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.\d+)?$").unwrap());
static TRADITIONAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]\d+(\.\d+)?$").unwrap());
static EXTENDED_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][A-Za-z0-9_]*)=("[^"]*"|\S*)"#).unwrap()
});

/// True for classic `G28` / `M104.1` style commands.
pub fn is_traditional(command: &str) -> bool {
    TRADITIONAL.is_match(command)
}

/// One parsed line of G-code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GCodeCommand {
    command: String,
    params: BTreeMap<String, String>,
    raw_params: String,
}

impl GCodeCommand {
    /// Parses a line. Blank lines and comment-only lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, ExecutionError> {
        let line = line.trim();
        let (head, rest) = match line.find(char::is_whitespace) {
            Some(index) => (&line[..index], line[index..].trim()),
            None => (line, ""),
        };
        if head.is_empty() || head.starts_with(';') {
            return Ok(None);
        }
        if !COMMAND_TOKEN.is_match(head) {
            return Err(ExecutionError::Malformed(line.to_string()));
        }

        let command = head.to_uppercase();
        let raw_params = rest.to_string();
        let body = match rest.find(';') {
            Some(index) if is_traditional(&command) => rest[..index].trim(),
            _ => rest,
        };

        let mut params = BTreeMap::new();
        if is_traditional(&command) {
            for word in body.split_whitespace() {
                let mut chars = word.chars();
                if let Some(letter) = chars.next().filter(char::is_ascii_alphabetic) {
                    params.insert(letter.to_ascii_uppercase().to_string(), chars.as_str().to_string());
                }
            }
        } else {
            for caps in EXTENDED_PARAM.captures_iter(body) {
                let raw = &caps[2];
                let value = raw
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(raw);
                params.insert(caps[1].to_uppercase(), value.to_string());
            }
        }

        Ok(Some(Self {
            command,
            params,
            raw_params,
        }))
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Everything after the command word, unparsed.
    pub fn raw_params(&self) -> &str {
        &self.raw_params
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(&name.to_uppercase()).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    pub fn require(&self, name: &str) -> Result<&str, ExecutionError> {
        self.get(name).ok_or_else(|| ExecutionError::MissingParameter {
            command: self.command.clone(),
            param: name.to_uppercase(),
        })
    }

    pub fn get_int(&self, name: &str, default: i64) -> Result<i64, ExecutionError> {
        match self.get(name) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| ExecutionError::InvalidParameter {
                command: self.command.clone(),
                param: name.to_uppercase(),
                value: raw.to_string(),
            }),
        }
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parameters as a JSON object of strings, for template contexts.
    pub fn params_json(&self) -> Value {
        Value::Object(
            self.params
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect::<Map<_, _>>(),
        )
    }
}
