//! Line-oriented parser for rendered formulas.
//!
//! Reads back the subset of Ruby that the formula template produces. Every
//! non-blank line is matched against a small set of statement patterns,
//! depending on whether the parser is at the top level, inside a `resource`
//! block, or inside `def install`.
//!
//! Required statements are the class line, `desc`, `homepage` and
//! `depends_on "python@X"`. Statements this crate never renders are skipped with
//! a warning at the top level and inside `def install`; they will not survive a
//! rewrite. Inside `resource` blocks they are errors.

use regex::Regex;
use tracing::warn;

use super::{Completion, Formula, Head, Resource};
use crate::core::BrewerError;

/// Compiled statement patterns.
struct Grammar {
    repository: Regex,
    documentation: Regex,
    class: Regex,
    desc: Regex,
    homepage: Regex,
    head: Regex,
    revision: Regex,
    runtime: Regex,
    resource_start: Regex,
    url: Regex,
    sha256: Regex,
    install_start: Regex,
    completion: Regex,
}

/// A Ruby double-quoted literal with backslash escapes.
const STRING: &str = r#""((?:[^"\\]|\\.)*)""#;

impl Grammar {
    fn new() -> Result<Self, regex::Error> {
        let quoted = |prefix: &str| Regex::new(&format!(r"^{prefix}\s+{STRING}$"));

        Ok(Self {
            repository: Regex::new(r"^#\s*Repository:\s*(\S.*)$")?,
            documentation: Regex::new(r"^#\s*Documentation:\s*(\S.*)$")?,
            class: Regex::new(r"^class\s+([A-Za-z_][A-Za-z0-9_]*)\s*<\s*Formula$")?,
            desc: quoted("desc")?,
            homepage: quoted("homepage")?,
            head: Regex::new(&format!(
                r"^head\s+{STRING}(\s*,\s*:using\s*=>\s*:git)?(?:\s*,\s*branch:\s*{STRING})?$"
            ))?,
            revision: Regex::new(r"^revision\s+(\d+)$")?,
            runtime: Regex::new(r#"^depends_on\s+"python@([^"]+)"$"#)?,
            resource_start: Regex::new(&format!(r"^resource\s+{STRING}\s+do$"))?,
            url: quoted("url")?,
            sha256: quoted("sha256")?,
            install_start: Regex::new(r"^def\s+install$")?,
            completion: Regex::new(&format!(r"^(\w+)_completion\.install\s+{STRING}$"))?,
        })
    }
}

/// Reverses Ruby string escaping.
///
/// `\n`, `\r` and `\t` become the control characters; any other `\x` becomes `x`.
pub fn ruby_unescape(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => unescaped.push('\n'),
                Some('r') => unescaped.push('\r'),
                Some('t') => unescaped.push('\t'),
                Some(next) => unescaped.push(next),
                None => {}
            }
        } else {
            unescaped.push(c);
        }
    }
    unescaped
}

enum Block {
    TopLevel,
    Resource {
        start_line: usize,
        name: String,
        url: Option<String>,
        sha256: Option<String>,
    },
    Install {
        start_line: usize,
    },
}

#[derive(Default)]
struct Fields {
    repository_url: Option<String>,
    documentation_url: Option<String>,
    name: Option<String>,
    description: Option<String>,
    homepage: Option<String>,
    head: Option<Head>,
    revision: Option<u32>,
    runtime: Option<String>,
    resources: Vec<Resource>,
    completions: Vec<Completion>,
}

struct Parser<'a> {
    file: &'a str,
    grammar: Grammar,
    fields: Fields,
    block: Block,
    class_closed: bool,
}

impl<'a> Parser<'a> {
    fn error(&self, line: usize, reason: impl Into<String>) -> BrewerError {
        BrewerError::FormulaParseError {
            file: self.file.to_string(),
            line,
            reason: reason.into(),
        }
    }

    /// Stores `value` in `slot`, failing if the statement already appeared.
    fn set_once<T>(
        &self,
        slot: &mut Option<T>,
        value: T,
        line: usize,
        what: &str,
    ) -> Result<(), BrewerError> {
        if slot.is_some() {
            return Err(self.error(line, format!("duplicate {what}")));
        }
        *slot = Some(value);
        Ok(())
    }

    fn capture(regex: &Regex, text: &str) -> Option<String> {
        regex.captures(text).and_then(|c| c.get(1)).map(|m| ruby_unescape(m.as_str()))
    }

    fn line(&mut self, number: usize, text: &str) -> Result<(), BrewerError> {
        match std::mem::replace(&mut self.block, Block::TopLevel) {
            Block::TopLevel => self.top_level(number, text),
            Block::Resource {
                start_line,
                name,
                url,
                sha256,
            } => self.resource_line(number, text, start_line, name, url, sha256),
            Block::Install {
                start_line,
            } => self.install_line(number, text, start_line),
        }
    }

    fn top_level(&mut self, number: usize, text: &str) -> Result<(), BrewerError> {
        let mut fields = std::mem::take(&mut self.fields);
        let result = self.top_level_statement(number, text, &mut fields);
        self.fields = fields;
        result
    }

    fn top_level_statement(
        &mut self,
        number: usize,
        text: &str,
        fields: &mut Fields,
    ) -> Result<(), BrewerError> {
        let g = &self.grammar;

        if self.class_closed {
            return Err(self.error(number, format!("unexpected statement after class end: {text}")));
        }

        if let Some(url) = g.repository.captures(text).and_then(|c| c.get(1)) {
            let url = url.as_str().trim().to_string();
            return self.set_once(&mut fields.repository_url, url, number, "repository comment");
        }
        if let Some(url) = g.documentation.captures(text).and_then(|c| c.get(1)) {
            let url = url.as_str().trim().to_string();
            return self.set_once(&mut fields.documentation_url, url, number, "documentation comment");
        }
        if text.starts_with('#') {
            return Ok(());
        }

        if let Some(name) = g.class.captures(text).and_then(|c| c.get(1)) {
            let name = name.as_str().to_string();
            return self.set_once(&mut fields.name, name, number, "class definition");
        }
        if fields.name.is_none() {
            return Err(self.error(number, format!("expected formula class definition, found: {text}")));
        }

        if text.starts_with("include ") {
            return Ok(());
        }
        if let Some(description) = Self::capture(&g.desc, text) {
            return self.set_once(&mut fields.description, description, number, "desc");
        }
        if let Some(homepage) = Self::capture(&g.homepage, text) {
            return self.set_once(&mut fields.homepage, homepage, number, "homepage");
        }
        if let Some(captures) = g.head.captures(text) {
            let head = Head {
                url: captures.get(1).map(|m| ruby_unescape(m.as_str())).unwrap_or_default(),
                using_git: captures.get(2).is_some(),
                branch: captures.get(3).map(|m| ruby_unescape(m.as_str())),
            };
            return self.set_once(&mut fields.head, head, number, "head");
        }
        if let Some(revision) = g.revision.captures(text).and_then(|c| c.get(1)) {
            let revision = revision
                .as_str()
                .parse::<u32>()
                .map_err(|e| self.error(number, format!("invalid revision: {e}")))?;
            return self.set_once(&mut fields.revision, revision, number, "revision");
        }
        if let Some(version) = g.runtime.captures(text).and_then(|c| c.get(1)) {
            let version = version.as_str().to_string();
            return self.set_once(&mut fields.runtime, version, number, "python dependency");
        }
        if let Some(name) = Self::capture(&g.resource_start, text) {
            if fields.resources.iter().any(|r| r.name == name) {
                return Err(self.error(number, format!("duplicate resource '{name}'")));
            }
            self.block = Block::Resource {
                start_line: number,
                name,
                url: None,
                sha256: None,
            };
            return Ok(());
        }
        if g.install_start.is_match(text) {
            self.block = Block::Install {
                start_line: number,
            };
            return Ok(());
        }
        if text == "end" {
            self.class_closed = true;
            return Ok(());
        }

        warn!("{}:{}: skipping unsupported statement: {}", self.file, number, text);
        Ok(())
    }

    fn resource_line(
        &mut self,
        number: usize,
        text: &str,
        start_line: usize,
        name: String,
        mut url: Option<String>,
        mut sha256: Option<String>,
    ) -> Result<(), BrewerError> {
        if text == "end" {
            let url = url.ok_or_else(|| {
                self.error(start_line, format!("resource '{name}' has no url"))
            })?;
            self.fields.resources.push(Resource::rendered(&name, &url, sha256.as_deref()));
            return Ok(());
        }

        if let Some(value) = Self::capture(&self.grammar.url, text) {
            self.set_once(&mut url, value, number, "url in resource block")?;
        } else if let Some(value) = Self::capture(&self.grammar.sha256, text) {
            self.set_once(&mut sha256, value, number, "sha256 in resource block")?;
        } else {
            return Err(self.error(number, format!("unexpected statement in resource '{name}': {text}")));
        }

        self.block = Block::Resource {
            start_line,
            name,
            url,
            sha256,
        };
        Ok(())
    }

    fn install_line(&mut self, number: usize, text: &str, start_line: usize) -> Result<(), BrewerError> {
        if text == "end" {
            return Ok(());
        }

        if let Some(captures) = self.grammar.completion.captures(text) {
            let shell = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            let path = captures.get(2).map(|m| ruby_unescape(m.as_str())).unwrap_or_default();
            self.fields.completions.push(Completion::new(shell, &path));
        } else if text != "virtualenv_install_with_resources" {
            warn!("{}:{}: skipping unsupported install step: {}", self.file, number, text);
        }

        self.block = Block::Install {
            start_line,
        };
        Ok(())
    }

    fn finish(self) -> Result<Formula, BrewerError> {
        match self.block {
            Block::Resource {
                start_line,
                ref name,
                ..
            } => {
                return Err(self.error(start_line, format!("resource '{name}' is never closed")));
            }
            Block::Install {
                start_line,
            } => {
                return Err(self.error(start_line, "install block is never closed"));
            }
            Block::TopLevel => {}
        }

        let missing = |field: &str| BrewerError::FormulaFieldMissing {
            file: self.file.to_string(),
            field: field.to_string(),
        };

        let fields = self.fields;
        Ok(Formula {
            name: fields.name.ok_or_else(|| missing("class"))?,
            description: fields.description.ok_or_else(|| missing("desc"))?,
            homepage: fields.homepage.ok_or_else(|| missing("homepage"))?,
            head: fields.head,
            revision: fields.revision,
            completions: fields.completions,
            language_runtime_version: fields.runtime.ok_or_else(|| missing("depends_on \"python@...\""))?,
            resources: fields.resources,
            repository_url: fields.repository_url,
            documentation_url: fields.documentation_url,
        })
    }
}

/// Parses formula text into a [`Formula`].
///
/// `file` names the source in error messages. Line numbers in errors are 1-based.
///
/// # Errors
///
/// - [`BrewerError::FormulaParseError`] for malformed or duplicated statements and
///   unterminated blocks
/// - [`BrewerError::FormulaFieldMissing`] when a required statement is absent
pub fn parse_formula(text: &str, file: &str) -> Result<Formula, BrewerError> {
    let grammar = Grammar::new().map_err(|e| BrewerError::Other {
        message: format!("invalid formula grammar: {e}"),
    })?;

    let mut parser = Parser {
        file,
        grammar,
        fields: Fields::default(),
        block: Block::TopLevel,
        class_closed: false,
    };

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        parser.line(index + 1, line)?;
    }

    parser.finish()
}
