//! Fixture runner: `fixtures/<case>/{universe.json, options.json?, expected.json}`.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use regex::Regex;
use serde::Deserialize;
use wire_schema::{CollectOptions, Collector, StaticUniverse};

/// run resolver fixtures and compare against their expectations
#[derive(Parser, Debug)]
struct Args {
    /// only run cases whose directory name matches this regex
    #[arg(long)]
    filter: Option<String>,

    /// fixture root (defaults to the crate's own fixtures)
    #[arg(long)]
    fixtures: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Expected {
    Error { error: String },
    Names {
        #[serde(default)]
        objects: Vec<String>,
        #[serde(default)]
        enums: Vec<String>,
        #[serde(default)]
        generics: Vec<String>,
        #[serde(default)]
        unions: Vec<String>,
    },
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let source = std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let de = &mut serde_json::Deserializer::from_str(&source);
    serde_path_to_error::deserialize(de).map_err(|e| format!("{}: at {}: {}", path.display(), e.path(), e.inner()))
}

fn run_case(dir: &Path) -> Result<(), String> {
    let source = std::fs::read_to_string(dir.join("universe.json")).map_err(|e| e.to_string())?;
    let universe = StaticUniverse::from_str(&source).map_err(|e| e.to_string())?;
    let options_path = dir.join("options.json");
    let options: CollectOptions =
        if options_path.exists() { read_json(&options_path)? } else { CollectOptions::default() };
    let expected: Expected = read_json(&dir.join("expected.json"))?;

    let result = Collector::new(&universe, options).collect_all();
    match (expected, result) {
        (Expected::Error { error }, Err(actual)) if actual.kind() == error => Ok(()),
        (Expected::Error { error }, Err(actual)) => Err(format!("expected {error}, got {}: {actual}", actual.kind())),
        (Expected::Error { error }, Ok(_)) => Err(format!("expected {error}, resolution succeeded")),
        (Expected::Names { .. }, Err(actual)) => Err(format!("unexpected {}: {actual}", actual.kind())),
        (Expected::Names { objects, enums, generics, unions }, Ok(schema)) => {
            let actual = schema.names();
            let expected = [objects, enums, generics, unions];
            let labels = ["objects", "enums", "generics", "unions"];
            let mut diffs = Vec::new();
            for ((label, want), got) in labels.iter().zip(&expected).zip(&actual) {
                if want.iter().map(String::as_str).ne(got.iter().copied()) {
                    diffs.push(format!("{label}: expected {want:?}, got {got:?}"));
                }
            }
            if diffs.is_empty() { Ok(()) } else { Err(diffs.join("\n")) }
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let filter = match args.filter.as_deref().map(Regex::new).transpose() {
        Ok(filter) => filter,
        Err(error) => {
            eprintln!("{} invalid --filter: {error}", "error:".red().bold());
            return ExitCode::FAILURE;
        }
    };
    let root = args.fixtures.unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures"));
    let mut cases: Vec<PathBuf> = match std::fs::read_dir(&root) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).filter(|p| p.is_dir()).collect(),
        Err(error) => {
            eprintln!("{} {}: {error}", "error:".red().bold(), root.display());
            return ExitCode::FAILURE;
        }
    };
    cases.sort();

    let (mut passed, mut failed) = (0, 0);
    for dir in cases {
        let name = dir.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        if filter.as_ref().is_some_and(|re| !re.is_match(&name)) {
            continue;
        }
        match run_case(&dir) {
            Ok(()) => {
                passed += 1;
                println!("{} {name}", "PASS".green().bold());
            }
            Err(reason) => {
                failed += 1;
                println!("{} {name}", "FAIL".red().bold());
                for line in reason.lines() {
                    println!("     {line}");
                }
            }
        }
    }
    println!("{passed} passed, {failed} failed");
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
