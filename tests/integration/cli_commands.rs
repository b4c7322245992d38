//! CLI route table against a temporary workspace.

use clap::Parser;
use sitesmith::cli::{Cli, RunContext};
use tempfile::TempDir;

fn run(dir: &TempDir, args: &[&str]) -> sitesmith::cli::CommandOutput {
    let mut argv = vec!["sitesmith", "--quiet"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    let context = RunContext::new(dir.path().to_path_buf(), None).unwrap();
    context.execute(&cli.command).unwrap()
}

#[test]
fn catalog_json_lists_builtin_roles() {
    let dir = TempDir::new().unwrap();
    let output = run(&dir, &["catalog", "--json"]);
    let value: serde_json::Value = serde_json::from_str(&output.text).unwrap();
    assert_eq!(value["version"], "2024.3");
    assert_eq!(value["roles"].as_array().unwrap().len(), 10);
}

#[test]
fn validate_accepts_a_clean_document() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("index.html"),
        "<!DOCTYPE html><html lang=\"en\"><head><title>Bakery</title></head>\
         <body><section><h1>Fresh bread</h1><img src=\"loaf.jpg\" alt=\"A loaf\"></section></body></html>",
    )
    .unwrap();
    let output = run(&dir, &["validate", "index.html", "--json"]);
    assert!(output.success);
    let value: serde_json::Value = serde_json::from_str(&output.text).unwrap();
    assert_eq!(value["passed"], true);
}

#[test]
fn validate_flags_images_without_alt_as_warning() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("index.html"),
        "<!DOCTYPE html><html><head><title>Bakery</title></head>\
         <body><section><h1>Fresh bread</h1><img src=\"loaf.jpg\"></section></body></html>",
    )
    .unwrap();
    let output = run(&dir, &["validate", "index.html"]);
    assert!(output.success);
    assert!(output.text.contains("warning"));
}
