use predicates::prelude::*;

use crate::common::{TestProject, brewer};

const EXPECTED: &str = r#"# Repository: https://github.com/org/my-tool
class MyTool < Formula
  include Language::Python::Virtualenv

  desc "Does things"
  homepage "https://example.com"
  head "https://github.com/org/my-tool.git", branch: "main"

  depends_on "python@3.10"

  resource "rich" do
    url "https://github.com/Textualize/rich/tarball/v13.7.0"
  end

  resource "rich-click" do
    url "https://github.com/ewels/rich-click/tarball/main"
  end

  def install
    virtualenv_install_with_resources
    zsh_completion.install "completions/_my-tool"
  end
end
"#;

#[test]
fn test_create_prints_formula() {
    let project = TestProject::new();

    brewer().arg("create").arg(&project.root).assert().success().stdout(EXPECTED);
    assert!(!project.formula_path().exists());
}

#[test]
fn test_create_accepts_pyproject_path() {
    let project = TestProject::new();

    brewer()
        .arg("create")
        .arg(project.root.join("pyproject.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("class MyTool < Formula"));
}

#[test]
fn test_create_writes_formula_file() {
    let project = TestProject::new();

    brewer()
        .arg("create")
        .arg(&project.root)
        .arg(project.formula_path())
        .assert()
        .success()
        .stdout(predicate::str::contains("with 2 resources"));

    assert_eq!(project.read_formula(), EXPECTED);
}

#[test]
fn test_create_quiet_prints_nothing() {
    let project = TestProject::new();

    brewer()
        .arg("create")
        .arg(&project.root)
        .arg(project.formula_path())
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert!(project.formula_path().is_file());
}

#[test]
fn test_create_excludes_configured_dependencies() {
    let pyproject = format!(
        "{}\n[tool.brewer.dependencies]\nexclude = [\"Rich_Click\"]\n",
        crate::common::PYPROJECT
    );
    let project = TestProject::with_files(&pyproject, &crate::common::lockfile("main"));

    brewer()
        .arg("create")
        .arg(&project.root)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"resource "rich" do"#))
        .stdout(predicate::str::contains(r#"resource "rich-click""#).not());
}

#[test]
fn test_create_pep621_project() {
    let pyproject = r#"
[project]
name = "my_tool"
description = "PEP 621 metadata"
requires-python = ">=3.11"
dependencies = ["rich-click @ git+https://github.com/ewels/rich-click.git@main"]

[project.urls]
Homepage = "https://example.org"
Documentation = "https://docs.example.org"
"#;
    let project = TestProject::with_files(pyproject, &crate::common::lockfile("main"));

    brewer()
        .arg("create")
        .arg(&project.root)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "# Documentation: https://docs.example.org\nclass MyTool < Formula",
        ))
        .stdout(predicate::str::contains(r#"homepage "https://example.org""#))
        .stdout(predicate::str::contains(r#"depends_on "python@3.11""#));
}
