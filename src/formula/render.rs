//! Formula rendering with Tera.
//!
//! The template lives in `formula.rb.tera` next to this file and is compiled into
//! the binary. After Tera runs, two passes normalize the text: common indentation
//! is removed ([`dedent`]) and runs of blank lines are collapsed to one
//! ([`collapse_blank_lines`]). The result carries no trailing newline.

use regex::Regex;
use std::collections::HashMap;
use tera::{Context as TeraContext, Tera};

use super::Formula;
use crate::core::BrewerError;

const FORMULA_TEMPLATE: &str = include_str!("formula.rb.tera");

/// Escapes a value for a Ruby double-quoted string literal.
///
/// Backslashes, quotes and line-breaking control characters (`\n`, `\r`, `\t`)
/// are escaped, as is `#` when it would start an interpolation (`#{`, `#@`, `#$`).
/// Every value therefore stays on one line.
pub fn ruby_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '#' if matches!(chars.peek(), Some('{' | '@' | '$')) => escaped.push_str("\\#"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn ruby_escape_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let text = value.as_str().ok_or_else(|| tera::Error::msg("ruby_escape filter requires a string"))?;
    Ok(tera::Value::String(ruby_escape(text)))
}

/// Removes the whitespace prefix shared by every non-blank line.
///
/// Only spaces and tabs count as indentation. Lines holding nothing but spaces
/// and tabs become empty and do not take part in computing the prefix.
pub fn dedent(text: &str) -> String {
    let margin = text
        .split('\n')
        .filter(|line| !is_blank(line))
        .map(indentation)
        .reduce(|common, next| {
            let shared = common.bytes().zip(next.bytes()).take_while(|(a, b)| a == b).count();
            &common[..shared]
        })
        .unwrap_or("");

    text.split('\n')
        .map(|line| {
            if is_blank(line) {
                ""
            } else {
                line.strip_prefix(margin).unwrap_or(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_blank(line: &str) -> bool {
    line.trim_matches([' ', '\t']).is_empty()
}

fn indentation(line: &str) -> &str {
    &line[..line.len() - line.trim_start_matches([' ', '\t']).len()]
}

/// Collapses every run of three or more newlines into exactly two.
pub fn collapse_blank_lines(text: &str) -> Result<String, BrewerError> {
    let blank_runs = Regex::new(r"\n{3,}").map_err(|e| BrewerError::Other {
        message: e.to_string(),
    })?;
    Ok(blank_runs.replace_all(text, "\n\n").into_owned())
}

/// Renders `formula` to normalized text.
pub fn render(formula: &Formula) -> Result<String, BrewerError> {
    let mut tera = Tera::default();
    tera.register_filter("ruby_escape", ruby_escape_filter);

    let mut context = TeraContext::new();
    context.insert("formula", formula);

    let rendered = tera.render_str(FORMULA_TEMPLATE, &context).map_err(|e| {
        let mut reason = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            reason.push_str(&format!(": {cause}"));
            source = cause.source();
        }
        BrewerError::TemplateError {
            reason,
        }
    })?;

    let text = collapse_blank_lines(&dedent(&rendered))?;
    Ok(text.trim_end_matches('\n').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::tests::sample_formula;
    use crate::formula::{Completion, Head, Resource};

    #[test]
    fn test_render_minimal() {
        let text = render(&sample_formula()).unwrap();
        let expected = r#"class MyTool < Formula
  include Language::Python::Virtualenv

  desc "Does things"
  homepage "https://example.com"

  depends_on "python@3.9"

  resource "foo" do
    url "https://files/foo-1.0.tar.gz"
    sha256 "aaa"
  end

  def install
    virtualenv_install_with_resources
  end
end"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_all_fields() {
        let mut formula = sample_formula();
        formula.repository_url = Some("https://github.com/org/tool".to_string());
        formula.documentation_url = Some("https://docs.example".to_string());
        formula.head = Some(Head::new("git@github.com:org/tool.git", Some("main")));
        formula.revision = Some(2);
        formula.completions = vec![Completion::new("zsh", "completions/_tool")];
        formula.resources.push(Resource::from_version_control(
            "gitdep",
            "https://github.com/org/gitdep.git",
            "v1",
        ));

        let text = render(&formula).unwrap();
        let expected = r#"# Repository: https://github.com/org/tool
# Documentation: https://docs.example
class MyTool < Formula
  include Language::Python::Virtualenv

  desc "Does things"
  homepage "https://example.com"
  head "git@github.com:org/tool.git", :using => :git, branch: "main"
  revision 2

  depends_on "python@3.9"

  resource "foo" do
    url "https://files/foo-1.0.tar.gz"
    sha256 "aaa"
  end

  resource "gitdep" do
    url "https://github.com/org/gitdep/tarball/v1"
  end

  def install
    virtualenv_install_with_resources
    zsh_completion.install "completions/_tool"
  end
end"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn test_revision_zero_is_omitted() {
        let mut formula = sample_formula();
        formula.revision = Some(0);
        assert!(!render(&formula).unwrap().contains("revision"));
    }

    #[test]
    fn test_description_is_escaped() {
        let mut formula = sample_formula();
        formula.description = r#"Say "hi" to #{user} \o/ #1"#.to_string();
        let text = render(&formula).unwrap();
        assert!(text.contains(r#"desc "Say \"hi\" to \#{user} \\o/ #1""#));
    }

    #[test]
    fn test_dedent() {
        assert_eq!(dedent("    a\n      b\n    c"), "a\n  b\nc");
        assert_eq!(dedent("  a\n   \n  b"), "a\n\nb");
        assert_eq!(dedent("a\n  b"), "a\n  b");
        assert_eq!(dedent("\t x\n\t y"), "x\ny");
    }

    #[test]
    fn test_dedent_never_increases_indentation() {
        let text = "      deep\n  shallow\n    middle";
        let dedented = dedent(text);
        let indents: Vec<usize> =
            dedented.lines().map(|l| l.len() - l.trim_start().len()).collect();
        assert_eq!(indents, vec![4, 0, 2]);
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb").unwrap(), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb\n\n\nc").unwrap(), "a\n\nb\n\nc");
        assert_eq!(collapse_blank_lines("a\nb").unwrap(), "a\nb");
    }
}
