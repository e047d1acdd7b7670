use std::path::{Component, Path, PathBuf};
use std::sync::Once;

static TRACE_INIT: Once = Once::new();
const DEFAULT_TRACE_FILTER: &str = "lowr_core=info,lowr_cli=info";

use anyhow::Context;
use clap::{Parser, Subcommand};
use lowr_core::{
    CompileOptions, Compiler,
    ast::Unit,
    typ::SemanticErrors,
    vm::{Outcome, Vm},
};


#[derive(Debug, Parser)]
#[command(name = "lowr", author, version, about = "Check, lower and run units on the lowr stack VM", long_about = None)]
struct CliArgs {
    /// TOML file with compile options
    #[arg(long, global = true, value_name = "FILE", value_parser = parse_sanitized_path)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run semantic checks and report every error
    Check {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
    },
    /// Lower a unit to bytecode
    Compile {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
        /// Write the code unit as JSON here instead of printing a listing
        #[arg(short, long, value_name = "OUT", value_parser = parse_sanitized_path)]
        output: Option<PathBuf>,
        /// Print the listing even when writing to OUT
        #[arg(long)]
        listing: bool,
    },
    /// Compile and execute a unit on the reference VM
    Run {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the tree as a labelled JSON dump
    Dump {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
    },
}

fn sanitize_path(raw: &str) -> anyhow::Result<PathBuf> {
    let p = Path::new(raw);

    for comp in p.components() {
        if matches!(comp, Component::ParentDir) {
            return Err(anyhow::anyhow!(
                "Parent directory components ('..') are not allowed in file paths."
            ));
        }
    }

    Ok(p.to_path_buf())
}

fn parse_sanitized_path(raw: &str) -> Result<PathBuf, String> {
    sanitize_path(raw).map_err(|e| e.to_string())
}

fn env_toggle_enabled(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    !(trimmed.eq_ignore_ascii_case("0") || trimmed.eq_ignore_ascii_case("false") || trimmed.eq_ignore_ascii_case("off"))
}

/// `LOWR_TRACE=1` means "use RUST_LOG or the default"; anything else is a filter.
fn filter_expr_from(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("1")
        || trimmed.eq_ignore_ascii_case("true")
        || trimmed.eq_ignore_ascii_case("on")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn maybe_init_tracing() {
    let raw = match std::env::var("LOWR_TRACE") {
        Ok(value) => value,
        Err(_) => return,
    };

    if !env_toggle_enabled(&raw) {
        return;
    }

    TRACE_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::fmt;

        let filter_expr = filter_expr_from(&raw).or_else(|| std::env::var("RUST_LOG").ok());

        let builder = fmt().with_writer(std::io::stderr);

        let builder = match filter_expr.and_then(|expr| EnvFilter::try_new(expr).ok()) {
            Some(filter) => builder.with_env_filter(filter),
            None => builder.with_env_filter(DEFAULT_TRACE_FILTER),
        };

        let _ = builder.try_init();
    });
}

fn load_unit(path: &Path) -> anyhow::Result<Unit> {
    let src =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file '{}'", path.display()))?;
    serde_json::from_str(&src).with_context(|| format!("'{}' is not a valid unit", path.display()))
}

fn load_options(config: Option<&Path>) -> anyhow::Result<CompileOptions> {
    match config {
        Some(path) => CompileOptions::from_path(path),
        None => Ok(CompileOptions::default()),
    }
}

/// Prints semantic errors one per line and exits; other errors go back to the caller.
fn report_semantic(err: anyhow::Error) -> anyhow::Error {
    if let Some(errors) = err.downcast_ref::<SemanticErrors>() {
        for e in &errors.errors {
            eprintln!("error: {}", e);
        }
        if errors.suppressed > 0 {
            eprintln!("error: {} more not shown", errors.suppressed);
        }
        eprintln!("{} error(s)", errors.total());
        std::process::exit(1);
    }
    err
}

fn render_outcome(outcome: &Outcome) -> String {
    let mut out = String::new();
    if let Some(value) = outcome.value {
        out.push_str(&format!("return {}\n", value));
    }
    for (name, value) in &outcome.fields {
        out.push_str(&format!("{} = {}\n", name, value));
    }
    out
}

fn main() -> anyhow::Result<()> {
    maybe_init_tracing();

    let CliArgs { config, command } = CliArgs::parse();
    let options = load_options(config.as_deref())?;
    let compiler = Compiler::new(options);

    match command {
        Commands::Check { file } => {
            let unit = load_unit(&file)?;
            let diagnostics = compiler.check(&unit);
            diagnostics.into_result().map_err(report_semantic)?;
            println!("{}: ok", unit.name);
        }
        Commands::Compile { file, output, listing } => {
            let unit = load_unit(&file)?;
            let code = compiler.compile(&unit).map_err(report_semantic)?;
            if std::env::var_os("LOWR_DEBUG_BYTECODE").is_some() {
                eprintln!("-- bytecode for {} --", file.display());
                eprint!("{}", code);
            }
            match output {
                Some(out) => {
                    let json = serde_json::to_string_pretty(&code)?;
                    std::fs::write(&out, json).with_context(|| format!("Failed to write '{}'", out.display()))?;
                    if listing {
                        print!("{}", code);
                    }
                }
                None => print!("{}", code),
            }
        }
        Commands::Run { file, json } => {
            let unit = load_unit(&file)?;
            let code = compiler.compile(&unit).map_err(report_semantic)?;
            let outcome = Vm::from_options(&compiler.options().vm).run(&code)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print!("{}", render_outcome(&outcome));
            }
        }
        Commands::Dump { file } => {
            let unit = load_unit(&file)?;
            println!("{}", unit.dump().to_json()?);
        }
    }

    Ok(())
}
