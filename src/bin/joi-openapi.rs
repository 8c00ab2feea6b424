//! joi-openapi CLI
//!
//! Command-line interface for converting schema descriptions to OpenAPI.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use joi_openapi::{
    convert_value, load_schema, load_schema_auto, parse_components, Components, ConvertError,
};
use serde_json::json;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "joi-openapi")]
#[command(about = "Convert validation schema descriptions into OpenAPI schema objects")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a schema description into an OpenAPI fragment and its components
    Convert {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        /// Existing components file; named schemas already defined there are referenced, not redefined
        #[arg(long)]
        components: Option<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Convert {
            schema,
            components,
            output,
            pretty,
        } => run_convert(&schema, components.as_deref(), output, pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_convert(
    schema_source: &str,
    components_path: Option<&Path>,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let schema = load_schema_auto(schema_source).map_err(report)?;

    let existing = match components_path {
        Some(path) => load_schema(path)
            .and_then(|value| parse_components(&value))
            .map_err(|e| {
                eprintln!("Error loading components: {}", e);
                e.exit_code() as u8
            })?,
        None => Components::new(),
    };

    let conversion = convert_value(&schema, &existing).map_err(report)?;

    let document = json!({
        "schema": conversion.fragment_value(),
        "components": conversion.components,
    });

    let json_output = if pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn report(e: ConvertError) -> u8 {
    eprintln!("Error: {}", e);
    e.exit_code() as u8
}
