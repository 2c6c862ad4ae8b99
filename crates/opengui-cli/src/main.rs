use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use opengui_core::{adapter, Example, Form, FormDocument, Response};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

mod interactive;

/// OpenGUI: dynamic forms from the command line
///
/// Fill in forms interactively, or check values and requests against them.
#[derive(Parser)]
#[command(name = "opengui", version, about, long_about = None)]
struct Cli {
    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask every question of a form on stdin/stdout
    Ask {
        /// Path to a YAML or JSON form document
        #[arg(required_unless_present = "example", conflicts_with = "example")]
        spec: Option<PathBuf>,
        /// Use the built-in example wizard
        #[arg(long)]
        example: bool,
        /// JSON file of values to start from
        #[arg(long)]
        values: Option<PathBuf>,
    },

    /// Respond to an options request (always 200 with the annotated form)
    Options {
        /// Path to a JSON request body
        request: PathBuf,
        /// Form document to use instead of the example wizard
        #[arg(long)]
        spec: Option<PathBuf>,
    },

    /// Respond to a submit request (201 when valid, 400 otherwise)
    Submit {
        /// Path to a JSON request body
        request: PathBuf,
        /// Form document to use instead of the example wizard
        #[arg(long)]
        spec: Option<PathBuf>,
    },

    /// Build and validate a form document, printing the result
    Check {
        /// Path to a YAML or JSON form document
        spec: PathBuf,
        /// JSON file of values to validate
        #[arg(long)]
        values: Option<PathBuf>,
        /// JSON file of prior values, used by readonly fields
        #[arg(long)]
        originals: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_json(path: &Path) -> Result<Value> {
    let contents = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse JSON in {}", path.display()))
}

fn read_values(path: Option<&Path>) -> Result<Map<String, Value>> {
    match path {
        None => Ok(Map::new()),
        Some(path) => match read_json(path)? {
            Value::Object(values) => Ok(values),
            other => anyhow::bail!("Values in {} must be a JSON object, got {}", path.display(), other),
        },
    }
}

fn load_document(path: &Path) -> Result<FormDocument> {
    FormDocument::from_path(path).with_context(|| format!("Failed to load form {}", path.display()))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn ask<F: Form>(form: F, values: Map<String, Value>) -> Result<i32> {
    let stdin = io::stdin();
    let done = interactive::ask(form, values, stdin.lock(), io::stdout())?;
    println!();
    print_json(&Value::Object(done))?;
    Ok(0)
}

fn respond(response: Response) -> Result<i32> {
    eprintln!("status: {}", response.status);
    print_json(&response.body)?;
    Ok(if response.is_success() { 0 } else { 1 })
}

fn handle<H>(request: &Path, spec: Option<&Path>, handler: H) -> Result<i32>
where
    H: Fn(&dyn Form, &Value) -> Result<Response, opengui_core::FieldsError>,
{
    let request = read_json(request)?;
    let response = match spec {
        Some(spec) => {
            let document = load_document(spec)?;
            handler(&document as &dyn Form, &request)?
        }
        None => handler(&Example as &dyn Form, &request)?,
    };
    respond(response)
}

fn run(command: Commands) -> Result<i32> {
    match command {
        Commands::Ask { spec, example: _, values } => {
            let values = read_values(values.as_deref())?;
            match spec {
                Some(spec) => ask(load_document(&spec)?, values),
                None => ask(Example, values),
            }
        }
        Commands::Options { request, spec } => {
            handle(&request, spec.as_deref(), |form, request| adapter::options(form, request))
        }
        Commands::Submit { request, spec } => {
            handle(&request, spec.as_deref(), |form, request| adapter::submit(form, request))
        }
        Commands::Check { spec, values, originals } => {
            let document = load_document(&spec)?;
            let values = read_values(values.as_deref())?;
            let originals = read_values(originals.as_deref())?;
            let mut fields = document.fields(&values, &originals)?;
            let valid = fields.validate(true);
            print_json(&fields.to_dict())?;
            Ok(if valid { 0 } else { 1 })
        }
        Commands::Version => {
            println!("opengui {} (opengui-core {})", env!("CARGO_PKG_VERSION"), opengui_core::VERSION);
            Ok(0)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            2
        }
    };

    process::exit(exit_code);
}
