//! Unified diffs between a formula file and a fresh render.

use chrono::{DateTime, Local};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::fmt;

/// Lines of context around each change.
const CONTEXT_LINES: usize = 3;

/// Timestamp format used in the `---` / `+++` header lines.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One classified line of a unified diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    /// `--- old` or `+++ new`
    Header(String),
    /// `@@ -a,b +c,d @@`
    Hunk(String),
    /// `+line`
    Added(String),
    /// `-line`
    Removed(String),
    /// ` line`
    Context(String),
}

impl DiffLine {
    /// The line as it appears in the diff, prefix included.
    pub fn text(&self) -> &str {
        match self {
            Self::Header(text)
            | Self::Hunk(text)
            | Self::Added(text)
            | Self::Removed(text)
            | Self::Context(text) => text,
        }
    }
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.text();
        match self {
            Self::Added(_) => write!(f, "{}", text.green()),
            Self::Removed(_) => write!(f, "{}", text.red()),
            Self::Header(_) if text.starts_with('+') => write!(f, "{}", text.green()),
            Self::Header(_) => write!(f, "{}", text.red()),
            Self::Hunk(_) | Self::Context(_) => f.write_str(text),
        }
    }
}

/// Difference between the text on disk and the text that would be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormulaDiff {
    /// Both sides hold the same lines.
    NoChanges,
    /// Unified diff lines, headers first.
    Changes(Vec<DiffLine>),
}

impl FormulaDiff {
    /// Diffs `old` (on disk since `old_time`) against `new` (rendered at `new_time`).
    ///
    /// Texts are compared line by line, so a missing final newline on either side
    /// is not a change. `label` names the file in both header lines.
    pub fn compute(
        label: &str,
        old: &str,
        new: &str,
        old_time: DateTime<Local>,
        new_time: DateTime<Local>,
    ) -> Self {
        let old_lines: Vec<&str> = old.lines().collect();
        let new_lines: Vec<&str> = new.lines().collect();
        if old_lines == new_lines {
            return Self::NoChanges;
        }

        let old_text = terminated(&old_lines);
        let new_text = terminated(&new_lines);
        let text_diff = TextDiff::from_lines(old_text.as_str(), new_text.as_str());
        let mut unified = text_diff.unified_diff();
        unified.context_radius(CONTEXT_LINES);

        let mut lines = vec![
            DiffLine::Header(format!("--- {label}\t{}", old_time.format(TIMESTAMP_FORMAT))),
            DiffLine::Header(format!("+++ {label}\t{}", new_time.format(TIMESTAMP_FORMAT))),
        ];

        for hunk in unified.iter_hunks() {
            lines.push(DiffLine::Hunk(hunk.header().to_string()));
            for change in hunk.iter_changes() {
                let value = change.value().trim_end_matches('\n');
                lines.push(match change.tag() {
                    ChangeTag::Insert => DiffLine::Added(format!("+{value}")),
                    ChangeTag::Delete => DiffLine::Removed(format!("-{value}")),
                    ChangeTag::Equal => DiffLine::Context(format!(" {value}")),
                });
            }
        }

        Self::Changes(lines)
    }

    pub fn has_changes(&self) -> bool {
        matches!(self, Self::Changes(_))
    }

    /// Diff lines; empty for [`FormulaDiff::NoChanges`].
    pub fn lines(&self) -> &[DiffLine] {
        match self {
            Self::NoChanges => &[],
            Self::Changes(lines) => lines,
        }
    }
}

impl fmt::Display for FormulaDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoChanges => write!(f, "{}", "No changes.".green()),
            Self::Changes(lines) => {
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\n")?;
                    }
                    write!(f, "{line}")?;
                }
                Ok(())
            }
        }
    }
}

fn terminated(lines: &[&str]) -> String {
    lines.iter().map(|line| format!("{line}\n")).collect()
}
