use rocq_stats::config::{load_project_dir, ProjectConfig};
use rocq_stats::source::Checkout;
use std::fs;
use tempfile::tempdir;

const PINNED: &str = r#"
name: fourcolor
title: Four Colour Theorem
description: Formal proof of the four colour theorem
source:
  repo: https://github.com/rocq-community/fourcolor.git
  branch: master
  commit: 4f3b2a1
  directories:
    - theories
    - proofs
index: README.md
"#;

#[test]
fn test_parse_full_config() {
    let config = ProjectConfig::from_yaml_str(PINNED).unwrap();

    assert_eq!(config.name, "fourcolor");
    assert_eq!(config.title, "Four Colour Theorem");
    assert_eq!(config.source.branch, "master");
    assert_eq!(config.source.commit.as_deref(), Some("4f3b2a1"));
    assert_eq!(config.source.directories, vec!["theories", "proofs"]);
    assert_eq!(config.index.as_deref(), Some("README.md"));
}

#[test]
fn test_links_use_pinned_commit() {
    let config = ProjectConfig::from_yaml_str(PINNED).unwrap();

    assert_eq!(config.revision(), "4f3b2a1");
    assert_eq!(config.github_slug().as_deref(), Some("rocq-community/fourcolor"));
    assert_eq!(
        config.blob_base().as_deref(),
        Some("https://github.com/rocq-community/fourcolor/blob/4f3b2a1")
    );
    assert_eq!(
        config.raw_base().as_deref(),
        Some("https://raw.githubusercontent.com/rocq-community/fourcolor/4f3b2a1")
    );
}

#[test]
fn test_optional_fields_default() {
    let yaml = r#"
name: tiny
title: Tiny
source:
  repo: git@github.com:someone/tiny
  branch: main
"#;
    let config = ProjectConfig::from_yaml_str(yaml).unwrap();

    assert!(config.description.is_empty());
    assert!(config.source.commit.is_none());
    assert!(config.source.directories.is_empty());
    assert!(config.index.is_none());
    assert_eq!(config.revision(), "main");
    assert_eq!(
        config.blob_base().as_deref(),
        Some("https://github.com/someone/tiny/blob/main")
    );
}

#[test]
fn test_non_github_repo_has_no_links() {
    let yaml = r#"
name: elsewhere
title: Elsewhere
source:
  repo: https://gitlab.example.org/team/elsewhere.git
  branch: main
"#;
    let config = ProjectConfig::from_yaml_str(yaml).unwrap();
    assert!(config.github_slug().is_none());
    assert!(config.blob_base().is_none());
    assert!(config.raw_base().is_none());
}

#[test]
fn test_missing_required_field_is_an_error() {
    let yaml = "name: broken\ntitle: Broken\n";
    assert!(ProjectConfig::from_yaml_str(yaml).is_err());
}

#[test]
fn test_load_project_dir() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("b.yml"), PINNED.replace("fourcolor", "second")).unwrap();
    fs::write(dir.path().join("a.yaml"), PINNED).unwrap();
    fs::write(dir.path().join("notes.txt"), "not a project").unwrap();

    let configs = load_project_dir(dir.path()).unwrap();
    let names: Vec<&str> = configs.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["fourcolor", "second"]);
}

#[test]
fn test_load_project_dir_reports_bad_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("bad.yaml"), "name: [unclosed").unwrap();

    let error = load_project_dir(dir.path()).unwrap_err();
    assert!(format!("{:#}", error).contains("bad.yaml"));
}

#[test]
fn test_local_checkout() {
    let dir = tempdir().unwrap();
    let checkout = Checkout::local(dir.path()).unwrap();
    assert_eq!(checkout.root(), dir.path());

    assert!(Checkout::local(dir.path().join("missing")).is_err());
}
