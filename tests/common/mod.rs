//! Shared fixtures for brewer integration tests.
//!
//! Every project here pins its dependencies to git repositories, so formulas can be
//! built without reaching a package index.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const PYPROJECT: &str = r#"
[tool.poetry]
name = "my-tool"
version = "0.3.0"
description = "Does things"
homepage = "https://example.com"
repository = "https://github.com/org/my-tool"

[tool.poetry.dependencies]
python = ">=3.10,<4"
rich-click = { git = "https://github.com/ewels/rich-click.git", branch = "main" }

[tool.brewer.git]
head = "https://github.com/org/my-tool.git"
branch = "main"

[tool.brewer.completions]
zsh = "completions/_my-tool"
"#;

/// Lockfile pinning `rich-click` (and its git-hosted `rich` dependency) to `reference`.
pub fn lockfile(reference: &str) -> String {
    format!(
        r#"
[[package]]
name = "rich"
version = "13.7.0"

[package.source]
type = "git"
url = "https://github.com/Textualize/rich.git"
reference = "v13.7.0"
resolved_reference = "d1c3a7e"

[[package]]
name = "rich-click"
version = "1.7.0"

[package.dependencies]
rich = ">=10.7"

[package.source]
type = "git"
url = "https://github.com/ewels/rich-click.git"
reference = "{reference}"
resolved_reference = "4f1c2d0"

[metadata]
lock-version = "2.0"
python-versions = ">=3.10,<4"
"#
    )
}

/// A Poetry project and tap directory in a temporary location.
pub struct TestProject {
    _temp: TempDir,
    pub root: PathBuf,
    pub tap: PathBuf,
}

impl TestProject {
    /// Creates a project with the default `pyproject.toml` and a lock at `main`.
    pub fn new() -> Self {
        Self::with_files(PYPROJECT, &lockfile("main"))
    }

    pub fn with_files(pyproject: &str, lock: &str) -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("my-tool");
        let tap = temp.path().join("tap");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&tap).unwrap();

        let project = Self {
            _temp: temp,
            root,
            tap,
        };
        project.write_pyproject(pyproject);
        project.write_lock(lock);
        project
    }

    pub fn write_pyproject(&self, content: &str) {
        fs::write(self.root.join("pyproject.toml"), content).unwrap();
    }

    pub fn write_lock(&self, content: &str) {
        fs::write(self.root.join("poetry.lock"), content).unwrap();
    }

    pub fn formula_path(&self) -> PathBuf {
        self.tap.join("my-tool.rb")
    }

    pub fn read_formula(&self) -> String {
        fs::read_to_string(self.formula_path()).unwrap()
    }

    /// Runs `brewer create` into the tap and returns the formula text.
    pub fn create_formula(&self) -> String {
        brewer()
            .arg("create")
            .arg(&self.root)
            .arg(self.formula_path())
            .assert()
            .success();
        self.read_formula()
    }
}

/// A `brewer` command with colors and progress disabled and no index reachable.
pub fn brewer() -> Command {
    let mut cmd = Command::cargo_bin("brewer").unwrap();
    cmd.env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("BREWER_MAX_PARALLEL")
        .env_remove("BREWER_TIMEOUT")
        .env("BREWER_INDEX_URL", "http://127.0.0.1:9/pypi")
        .arg("--no-progress");
    cmd
}

