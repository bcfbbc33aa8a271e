use predicates::prelude::*;
use std::fs;

use crate::common::{TestProject, brewer, lockfile};

#[test]
fn test_update_unchanged_keeps_revision_absent() {
    let project = TestProject::new();
    let created = project.create_formula();

    brewer()
        .arg("update")
        .arg(&project.root)
        .arg(project.formula_path())
        .assert()
        .success()
        .stdout(predicate::str::contains("resources unchanged"));

    assert_eq!(project.read_formula(), created);
    assert!(!created.contains("revision"));
}

#[test]
fn test_update_bumps_revision_when_lock_moves() {
    let project = TestProject::new();
    project.create_formula();
    project.write_lock(&lockfile("v1.7.0"));

    brewer()
        .arg("update")
        .arg(&project.root)
        .arg(project.formula_path())
        .assert()
        .success()
        .stdout(predicate::str::contains("to revision 1"));

    let formula = project.read_formula();
    assert!(formula.contains("  revision 1\n"));
    assert!(formula.contains(r#"url "https://github.com/ewels/rich-click/tarball/v1.7.0""#));
    assert!(!formula.contains("tarball/main"));

    // A second move increments the existing revision
    project.write_lock(&lockfile("v1.8.0"));
    brewer()
        .arg("update")
        .arg(&project.root)
        .arg(project.formula_path())
        .assert()
        .success();
    assert!(project.read_formula().contains("  revision 2\n"));
}

#[test]
fn test_update_refreshes_metadata_without_revision() {
    let project = TestProject::new();
    project.create_formula();
    project.write_pyproject(
        &crate::common::PYPROJECT.replace("Does things", "Does \"more\" things"),
    );

    brewer()
        .arg("update")
        .arg(&project.root)
        .arg(project.formula_path())
        .assert()
        .success();

    let formula = project.read_formula();
    assert!(formula.contains(r#"desc "Does \"more\" things""#));
    assert!(!formula.contains("revision"));
}

#[test]
fn test_update_diff_does_not_write() {
    let project = TestProject::new();
    let created = project.create_formula();
    project.write_lock(&lockfile("v1.7.0"));

    brewer()
        .arg("update")
        .arg(&project.root)
        .arg(project.formula_path())
        .arg("--diff")
        .assert()
        .success()
        .stdout(predicate::str::contains("--- "))
        .stdout(predicate::str::contains("+++ "))
        .stdout(predicate::str::contains("@@ "))
        .stdout(predicate::str::contains("\n+  revision 1\n"))
        .stdout(predicate::str::contains(
            "\n-    url \"https://github.com/ewels/rich-click/tarball/main\"\n",
        ))
        .stdout(predicate::str::contains(
            "\n+    url \"https://github.com/ewels/rich-click/tarball/v1.7.0\"\n",
        ));

    assert_eq!(project.read_formula(), created);
}

#[test]
fn test_update_diff_reports_no_changes() {
    let project = TestProject::new();
    project.create_formula();

    brewer()
        .arg("update")
        .arg(&project.root)
        .arg(project.formula_path())
        .arg("--diff")
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes."));
}

#[test]
fn test_update_preserves_existing_revision_when_unchanged() {
    let project = TestProject::new();
    let created = project.create_formula();
    let with_revision = created.replace(
        "  head \"https://github.com/org/my-tool.git\", branch: \"main\"\n",
        "  head \"https://github.com/org/my-tool.git\", branch: \"main\"\n  revision 4\n",
    );
    fs::write(project.formula_path(), &with_revision).unwrap();

    brewer()
        .arg("update")
        .arg(&project.root)
        .arg(project.formula_path())
        .assert()
        .success();

    assert_eq!(project.read_formula(), with_revision);
}
