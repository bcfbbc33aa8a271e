use predicates::prelude::*;
use std::fs;

use crate::common::{PYPROJECT, TestProject, brewer, lockfile};

#[test]
fn test_missing_project_file() {
    let project = TestProject::new();
    fs::remove_file(project.root.join("pyproject.toml")).unwrap();

    brewer()
        .arg("create")
        .arg(&project.root)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Project file not found"));
}

#[test]
fn test_missing_lockfile() {
    let project = TestProject::new();
    fs::remove_file(project.root.join("poetry.lock")).unwrap();

    brewer()
        .arg("create")
        .arg(&project.root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Lockfile not found"));
}

#[test]
fn test_missing_python_requirement() {
    let project = TestProject::with_files(
        &PYPROJECT.replace("python = \">=3.10,<4\"\n", ""),
        &lockfile("main"),
    );

    brewer()
        .arg("create")
        .arg(&project.root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no python version requirement"));
}

#[test]
fn test_circular_lock_dependencies() {
    let lock = lockfile("main").replace(
        "version = \"13.7.0\"\n",
        "version = \"13.7.0\"\n\n[package.dependencies]\nrich-click = \"*\"\n",
    );
    let project = TestProject::with_files(PYPROJECT, &lock);

    brewer()
        .arg("create")
        .arg(&project.root)
        .arg(project.formula_path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Circular dependency detected"));

    assert!(!project.formula_path().exists());
}

#[test]
fn test_unsupported_source() {
    let lock = lockfile("main").replace("type = \"git\"\nurl = \"https://github.com/Textualize/rich.git\"", "type = \"directory\"\nurl = \"../rich\"");
    let project = TestProject::with_files(PYPROJECT, &lock);

    brewer()
        .arg("create")
        .arg(&project.root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported source type 'directory'"));
}

#[test]
fn test_registry_lookup_failure_writes_nothing() {
    let lock = lockfile("main").replace(
        "[package.source]\ntype = \"git\"\nurl = \"https://github.com/Textualize/rich.git\"\nreference = \"v13.7.0\"\nresolved_reference = \"d1c3a7e\"\n",
        "",
    );
    let project = TestProject::with_files(PYPROJECT, &lock);

    brewer()
        .arg("create")
        .arg(&project.root)
        .arg(project.formula_path())
        .args(["--timeout", "2"])
        .assert()
        .failure();

    assert!(!project.formula_path().exists());
}

#[test]
fn test_update_missing_formula() {
    let project = TestProject::new();

    brewer()
        .arg("update")
        .arg(&project.root)
        .arg(project.formula_path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Formula file not found"));
}

#[test]
fn test_update_malformed_formula_is_untouched() {
    let project = TestProject::new();
    let broken = "class MyTool < Formula\n  desc \"Does things\"\n  resource \"rich\" do\n  end\nend\n";
    fs::write(project.formula_path(), broken).unwrap();

    brewer()
        .arg("update")
        .arg(&project.root)
        .arg(project.formula_path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(project.formula_path().display().to_string()));

    assert_eq!(project.read_formula(), broken);
}

#[test]
fn test_invalid_pyproject() {
    let project = TestProject::with_files("[tool.poetry\nname = ", &lockfile("main"));

    brewer()
        .arg("create")
        .arg(&project.root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid project file"));
}

#[test]
fn test_invalid_completion_shell() {
    let project = TestProject::with_files(
        &PYPROJECT.replace("zsh = ", "\"z sh\" = "),
        &lockfile("main"),
    );

    brewer()
        .arg("create")
        .arg(&project.root)
        .arg(project.formula_path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid completion shell 'z sh'"));
    assert!(!project.formula_path().exists());
}
