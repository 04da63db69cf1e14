//! CLI: type universe files → (schema | roots | check)
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use wire_schema::{CollectOptions, Collector, Schema, StaticUniverse, TypeRef};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// resolve serialization schemas (keyed objects, enums, generics, unions) from described types
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// log filter, e.g. `debug` or `wire_schema::collect=trace` (falls back to RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// resolve and write the schema as JSON
    Collect(CollectOut),
    /// list the root types the universe exposes
    Roots(RootsOut),
    /// resolve and print a summary, failing on the first resolution error
    Check(CheckOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to the universe document inside each input (e.g. /payload/universe)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is merged as a universe document
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct ResolverSettings {
    /// JSON options file; the flags below override or extend it
    #[arg(long)]
    options: Option<PathBuf>,

    /// key every object by member name
    #[arg(long)]
    force_name_keyed: bool,

    /// treat an unkeyed eligible member as an error
    #[arg(long)]
    require_explicit_keys: bool,

    /// canonical full name to exclude from the graph (repeatable)
    #[arg(long = "ignore-type")]
    ignore_types: Vec<String>,

    /// namespace built-in formatter names are rendered in
    #[arg(long)]
    formatter_namespace: Option<String>,
}

#[derive(clap::Parser, Debug)]
struct CollectOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    resolver_settings: ResolverSettings,

    /// resolve only from these types instead of the discovered roots (repeatable)
    #[arg(long = "root")]
    roots: Vec<TypeRef>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct RootsOut {
    #[command(flatten)]
    input_settings: InputSettings,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    resolver_settings: ResolverSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_process(&self, mut apply: impl FnMut(serde_json::Value) -> Result<()>) -> Result<()> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;
            let json_value = serde_json::from_str::<serde_json::Value>(&source)
                .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
            let json_value = match self.json_pointer.as_deref() {
                None => json_value,
                Some(pointer) => json_value
                    .pointer(pointer)
                    .cloned()
                    .ok_or_else(|| anyhow!("JSON pointer {pointer} selects nothing in {source_path_str}"))?,
            };
            match self.jq_expr.as_ref() {
                None => apply(json_value).with_context(|| format!("in {source_path_str}"))?,
                Some(jq_expr) => {
                    let results = crate::jq_exec::run_jaq(jq_expr, &json_value).with_context(|| {
                        format!("failed to apply jq expression to source file ({source_path_str})")
                    })?;
                    for json_value in results {
                        apply(json_value).with_context(|| format!("in {source_path_str}"))?;
                    }
                }
            }
        }
        Ok(())
    }

    fn load_universe(&self) -> Result<StaticUniverse> {
        let mut universe = StaticUniverse::new();
        self.load_process(|value| Ok(universe.merge_value(value)?))?;
        tracing::debug!(types = universe.len(), "universe loaded");
        Ok(universe)
    }
}

impl ResolverSettings {
    fn load(&self) -> Result<CollectOptions> {
        let mut options = match self.options.as_ref() {
            None => CollectOptions::default(),
            Some(path) => load_options_file(path)?,
        };
        options.force_name_keyed |= self.force_name_keyed;
        options.require_explicit_keys |= self.require_explicit_keys;
        options.ignored_type_names.extend(self.ignore_types.iter().cloned());
        if let Some(namespace) = self.formatter_namespace.as_ref() {
            options.formatter_namespace = namespace.clone();
        }
        Ok(options)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn log_level(&self) -> Option<&str> {
        self.log_level.as_deref()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Collect(target) => {
                let universe = target.input_settings.load_universe()?;
                let options = target.resolver_settings.load()?;
                let collector = Collector::new(&universe, options);
                let schema = if target.roots.is_empty() {
                    collector.collect_all()?
                } else {
                    collector.collect(target.roots.iter().cloned())?
                };
                let schema_src = serde_json::to_string_pretty(&schema)?;
                match target.out.as_ref() {
                    Some(out) => write_output(out, &schema_src)?,
                    None => println!("{schema_src}"),
                }
                Ok(())
            }
            Command::Roots(target) => {
                let universe = target.input_settings.load_universe()?;
                let options = CollectOptions::default();
                for root in Collector::new(&universe, options).root_types() {
                    println!("{root}");
                }
                Ok(())
            }
            Command::Check(target) => {
                let universe = target.input_settings.load_universe()?;
                let options = target.resolver_settings.load()?;
                let schema = Collector::new(&universe, options).collect_all()?;
                print_summary(&schema);
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn print_summary(schema: &Schema) {
    println!("{} {} entries", "ok".green().bold(), schema.len());
    let [objects, enums, generics, unions] = schema.names();
    for (label, names) in [("objects", objects), ("enums", enums), ("generics", generics), ("unions", unions)] {
        println!("  {} {}", format!("{label}:").bold(), names.len());
        for name in names {
            println!("    {name}");
        }
    }
}

fn load_options_file(path: &Path) -> Result<CollectOptions> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read options file ({})", path.display()))?;
    let options = wire_schema::path_de::from_str_with_path(&source)
        .with_context(|| format!("invalid options file ({})", path.display()))?;
    Ok(options)
}

fn write_output(out: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
