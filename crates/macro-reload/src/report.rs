//! Per-reload audit trail.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLevel {
    Info,
    Warning,
    Error,
}

/// What happened to a live entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Updated,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub kind: ChangeKind,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLine {
    pub timestamp: DateTime<Utc>,
    pub level: ReportLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Change>,
}

/// Ordered report lines of one reload. Every line is mirrored to the log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReloadReport {
    lines: Vec<ReportLine>,
}

impl ReloadReport {
    fn push(&mut self, level: ReportLevel, message: String, change: Option<Change>) {
        match level {
            ReportLevel::Info => log::info!("{}", message),
            ReportLevel::Warning => log::warn!("{}", message),
            ReportLevel::Error => log::error!("{}", message),
        }
        self.lines.push(ReportLine {
            timestamp: Utc::now(),
            level,
            message,
            change,
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(ReportLevel::Info, message.into(), None);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(ReportLevel::Warning, message.into(), None);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ReportLevel::Error, message.into(), None);
    }

    /// Records a committed change as `Added <key>` / `Updated <key>` /
    /// `Removed <key>`.
    pub fn change(&mut self, kind: ChangeKind, key: &str) {
        let verb = match kind {
            ChangeKind::Added => "Added",
            ChangeKind::Updated => "Updated",
            ChangeKind::Removed => "Removed",
        };
        self.push(
            ReportLevel::Info,
            format!("{} {}", verb, key),
            Some(Change {
                kind,
                key: key.to_string(),
            }),
        );
    }

    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }

    pub fn messages(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.message.as_str()).collect()
    }

    pub fn changes(&self) -> impl Iterator<Item = &Change> {
        self.lines.iter().filter_map(|l| l.change.as_ref())
    }

    pub fn has_errors(&self) -> bool {
        self.lines.iter().any(|l| l.level == ReportLevel::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn extend(&mut self, other: ReloadReport) {
        self.lines.extend(other.lines);
    }
}
