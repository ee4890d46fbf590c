//! ang-codegen CLI
//!
//! Commands:
//!   emit      - Generate the Go backend tree from a schema
//!   families  - List artifact families
//!   schema    - Print the JSON schema of ang.yaml
//!   version   - Print the generator version

use ang_codegen::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "emit" => cmd_emit(&args[2..]),
        "families" => cmd_families(),
        "schema" => cmd_schema(),
        "version" | "--version" | "-v" => {
            println!("ang-codegen {}", VERSION);
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            Err(Error::Config(format!("unknown command {:?}", cmd)))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

/// `RUST_LOG` filter (default `info`), human-readable events on stderr
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);
    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}

fn print_usage() {
    println!(
        r#"
ang-codegen - Go backend emitter for ang schemas

USAGE:
    ang-codegen <COMMAND> [OPTIONS]

COMMANDS:
    emit <schema.json|yaml>          Generate the backend tree
    families                         List artifact families in emission order
    schema                           Print the JSON schema of ang.yaml
    version                          Print the generator version

EMIT OPTIONS:
    --config <file>                  Config file (default: ./ang.yaml when present)
    --out <dir>                      Output root
    --module <path>                  Go module path
    --templates <dir>                Template overlay directory
    --lenient                        Write unparsable output as-is instead of failing
    --gofmt                          Format with an external gofmt
    --micro                          One main per service instead of one server
    --only <a,b,...>                 Emit only these families

LOGGING:
    RUST_LOG=debug ang-codegen emit schema.json

EXAMPLES:
    ang-codegen emit schema.json --out backend --module github.com/acme/market
    ang-codegen emit schema.yaml --micro --only service_main,contract_tests
"#
    );
}

/// Value following `flag`, if any
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// Parse `--only a,b` into families
fn parse_families(args: &[String]) -> Result<Option<Vec<ArtifactFamily>>> {
    let Some(list) = flag_value(args, "--only") else {
        return Ok(None);
    };
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| {
            ArtifactFamily::from_name(name).ok_or_else(|| {
                Error::Config(format!(
                    "unknown family {:?} (see `ang-codegen families`)",
                    name
                ))
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn cmd_emit(args: &[String]) -> Result<()> {
    let Some(schema_path) = args.first().filter(|a| !a.starts_with("--")) else {
        return Err(Error::Config(
            "Usage: ang-codegen emit <schema.json|yaml> [--out DIR] [--module M]".into(),
        ));
    };

    let base = match flag_value(args, "--config") {
        Some(path) => EmitterConfig::load(Path::new(path))?,
        None => EmitterConfig::load_from_dir(Path::new("."))?.unwrap_or_default(),
    };
    let overrides = ConfigOverrides {
        output_dir: flag_value(args, "--out").map(PathBuf::from),
        go_module: flag_value(args, "--module").map(str::to_string),
        template_dir: flag_value(args, "--templates").map(PathBuf::from),
        format_mode: has_flag(args, "--lenient").then_some(FormatMode::Lenient),
        formatter: has_flag(args, "--gofmt").then_some(FormatterKind::Gofmt),
        layout: has_flag(args, "--micro").then_some(Layout::Microservices),
        families: parse_families(args)?,
    };
    let config = base.merge(overrides);
    config.validate()?;

    let schema = Schema::load(Path::new(schema_path))?;
    let out_dir = config.output_dir.clone();
    let generation = generate(schema, config, CancelToken::new())?;

    println!(
        "{}: {} written, {} unchanged ({})",
        out_dir.display(),
        generation.report.written.len(),
        generation.report.unchanged.len(),
        generation.stamp.input_hash
    );
    for path in &generation.report.written {
        println!("  + {}", path);
    }

    if !generation.missing_impls.is_empty() {
        println!();
        println!(
            "{} method(s) have no implementation; fill the ANG:BEGIN_CUSTOM regions or add a .manual.go override:",
            generation.missing_impls.len()
        );
        for missing in &generation.missing_impls {
            println!("  - {}", missing);
        }
    }
    Ok(())
}

fn cmd_families() -> Result<()> {
    for family in ArtifactFamily::ALL {
        println!("{:<18} templates/{}.jinja", family.name(), family.template());
    }
    Ok(())
}

fn cmd_schema() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&EmitterConfig::json_schema())?);
    Ok(())
}
