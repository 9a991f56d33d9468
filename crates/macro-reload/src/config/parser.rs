//! Line parser for Klipper-style config text.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::section::Section;
use crate::error::ConfigError;

static HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[([^\]]+)\]$").unwrap());
static OPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:=\s][^:=]*?)\s*[:=]\s?(.*)$").unwrap());
static INLINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s[#;].*$").unwrap());
static INCLUDE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^include\s+(.+)$").unwrap());

/// A top-level item of one config file, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Section(Section),
    Include(String),
}

struct PendingOption {
    key: String,
    lines: Vec<String>,
}

/// Parses the text of a single file. Includes are returned unresolved.
pub fn parse_str(text: &str, path: &Path) -> Result<Vec<Block>, ConfigError> {
    let mut blocks = Vec::new();
    let mut current: Option<Section> = None;
    let mut pending: Option<PendingOption> = None;

    let syntax = |line: usize, message: &str| ConfigError::Syntax {
        path: path.to_path_buf(),
        line,
        message: message.to_string(),
    };

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = raw.trim();

        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }
        let content = INLINE_COMMENT.replace(raw, "");
        let indented = raw.starts_with(|c: char| c.is_whitespace());

        if indented || trimmed.is_empty() {
            match pending.as_mut() {
                Some(option) => option.lines.push(content.trim().to_string()),
                None if trimmed.is_empty() => {}
                None => return Err(syntax(line_no, "unexpected indented line")),
            }
            continue;
        }

        flush(&mut current, &mut pending);

        if let Some(caps) = HEADER.captures(content.trim_end()) {
            if let Some(section) = current.take() {
                blocks.push(Block::Section(section));
            }
            let header = caps[1].trim();
            if let Some(include) = INCLUDE.captures(header) {
                blocks.push(Block::Include(include[1].trim().to_string()));
            } else {
                current = Some(Section::new(header)?);
            }
            continue;
        }

        let Some(caps) = OPTION.captures(content.trim_end()) else {
            return Err(syntax(line_no, "expected an option or a section header"));
        };
        if current.is_none() {
            return Err(syntax(line_no, "option outside of a section"));
        }
        pending = Some(PendingOption {
            key: caps[1].to_string(),
            lines: vec![caps[2].trim().to_string()],
        });
    }

    flush(&mut current, &mut pending);
    if let Some(section) = current {
        blocks.push(Block::Section(section));
    }
    Ok(blocks)
}

fn flush(current: &mut Option<Section>, pending: &mut Option<PendingOption>) {
    let (Some(section), Some(option)) = (current.as_mut(), pending.take()) else {
        return;
    };
    let lines = &option.lines;
    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(start, |i| i + 1);
    section.set(&option.key, lines[start..end].join("\n"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections(text: &str) -> Vec<Section> {
        parse_str(text, Path::new("printer.cfg"))
            .unwrap()
            .into_iter()
            .filter_map(|b| match b {
                Block::Section(s) => Some(s),
                Block::Include(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_basic_sections() {
        let parsed = sections(
            "[macro foo]\n\
             description: Says hi\n\
             gcode = RESPOND MSG=hi\n\
             \n\
             [template bar]\n\
             template: x\n",
        );
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].key(), "macro foo");
        assert_eq!(parsed[0].get("description"), Some("Says hi"));
        assert_eq!(parsed[0].get("gcode"), Some("RESPOND MSG=hi"));
        assert_eq!(parsed[1].get("template"), Some("x"));
    }

    #[test]
    fn test_multiline_values() {
        let parsed = sections(
            "[macro foo]\n\
             gcode:\n\
             \x20 G28\n\
             \n\
             \x20 G1 X10\n\
             \n\
             description: d\n",
        );
        assert_eq!(parsed[0].get("gcode"), Some("G28\n\nG1 X10"));
        assert_eq!(parsed[0].get("description"), Some("d"));
    }

    #[test]
    fn test_comments() {
        let parsed = sections(
            "# header comment\n\
             [macro foo]\n\
             ; another\n\
             gcode: G28 # home\n\
             description: a#b\n",
        );
        assert_eq!(parsed[0].get("gcode"), Some("G28"));
        assert_eq!(parsed[0].get("description"), Some("a#b"));
    }

    #[test]
    fn test_include_blocks() {
        let blocks = parse_str("[include macros/*.cfg]\n", Path::new("printer.cfg")).unwrap();
        assert_eq!(blocks, vec![Block::Include("macros/*.cfg".to_string())]);
    }

    #[test]
    fn test_syntax_errors() {
        let path = Path::new("printer.cfg");
        assert!(matches!(
            parse_str("gcode: G28\n", path),
            Err(ConfigError::Syntax { line: 1, .. })
        ));
        assert!(matches!(
            parse_str("[macro foo]\nnot an option\n", path),
            Err(ConfigError::Syntax { line: 2, .. })
        ));
        assert!(matches!(
            parse_str("[macro a b c]\n", path),
            Err(ConfigError::IllegalWhitespace(_))
        ));
    }
}
