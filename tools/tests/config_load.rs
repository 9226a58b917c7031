use std::fs;
use std::path::PathBuf;

use stellar_dataset::{Layout, Split};
use stellar_tools::ToolConfig;

fn write_temp_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("stellar-tools.toml");
    fs::write(&path, contents).expect("write temp config");
    path
}

#[test]
fn loads_minimal_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_temp_config(&dir, "dataset_dir = \"/data/stellar\"\n");
    let cfg = ToolConfig::from_path(&path).expect("load config");
    assert_eq!(cfg.dataset_dir, PathBuf::from("/data/stellar"));
    assert_eq!(cfg.dataset.layout, Layout::Simple);
    assert_eq!(cfg.remover.program, "rembg");
    assert_eq!(cfg.log_filter, "info");
    assert!(cfg.warnings().is_empty());
}

#[test]
fn loads_sections() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_temp_config(
        &dir,
        r#"
log_filter = "stellar_dataset=debug"

[dataset]
layout = "targeted"
split = "val"
held_out_from = 150

[remover]
program = "matte"
args = ["--stdio"]

[masks]
workers = 4

[prompts]
catalog = "cfg/prompts.json"
"#,
    );
    let cfg = ToolConfig::from_path(&path).expect("load config");
    assert_eq!(cfg.dataset.layout, Layout::Targeted);
    assert_eq!(cfg.dataset.split, Split::Val);
    assert_eq!(cfg.dataset.held_out_from, 150);
    assert_eq!(cfg.remover.program, "matte");
    assert_eq!(cfg.remover.args, vec!["--stdio".to_string()]);
    assert_eq!(cfg.mask_workers, Some(4));
    assert_eq!(cfg.prompts_catalog, PathBuf::from("cfg/prompts.json"));
    assert_eq!(cfg.objects_list, PathBuf::from("prompts/objects.txt"));
    assert_eq!(cfg.log_filter, "stellar_dataset=debug");
}

#[test]
fn split_without_targeted_layout_warns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_temp_config(&dir, "[dataset]\nsplit = \"test\"\n");
    let cfg = ToolConfig::from_path(&path).expect("load config");
    assert_eq!(cfg.warnings().len(), 1);
}

#[test]
fn malformed_config_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_temp_config(&dir, "[dataset]\nlayout = \"spiral\"\n");
    assert!(ToolConfig::from_path(&path).is_err());
}
