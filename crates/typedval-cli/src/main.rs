//! typedval CLI: inspect the type catalogue and encode, decode, or hash values.

mod literal;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use typedval_core::{TypeRegistry, TypeSystemConfig};
use typedval_operators::OperatorRegistry;
use typedval_value::{SerializableValue, TypedValue};

use crate::literal::parse_literal;

#[derive(Parser)]
#[command(name = "typedval")]
#[command(about = "Typed values: encode, decode, and hash (type, value) pairs", long_about = None)]
struct Cli {
    /// YAML file with a type-system config (overrides TYPEDVAL_* variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log operator resolution at debug level
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered types with representation, width, and capabilities
    Types,

    /// Encode a JSON literal as a serialized envelope
    Encode {
        /// Type signature, e.g. `bigint` or `array(varchar)`
        #[arg(short = 't', long = "type")]
        type_signature: String,

        /// JSON literal; `null` for a null value
        #[arg(short, long)]
        value: String,
    },

    /// Decode a serialized envelope and print its display string
    Decode {
        /// Envelope JSON
        #[arg(short, long)]
        input: String,
    },

    /// Print the hash of a typed value
    Hash {
        #[arg(short = 't', long = "type")]
        type_signature: String,

        #[arg(short, long)]
        value: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Types => {
            let ops = bootstrap(&config)?;
            print!("{}", list_types(ops.types()));
        }
        Commands::Encode {
            type_signature,
            value,
        } => {
            config.extra_types.push(type_signature.clone());
            let ops = bootstrap(&config)?;
            let tv = build_value(&ops, &type_signature, &value)?;
            println!("{}", tv.to_serializable()?.to_json()?);
        }
        Commands::Decode { input } => {
            let ops = bootstrap_for_envelope(config, &input)?;
            let envelope = SerializableValue::from_json(&input)?;
            let tv = TypedValue::from_serializable(&ops, &envelope)?;
            println!("{}", tv.to_display_string()?);
        }
        Commands::Hash {
            type_signature,
            value,
        } => {
            config.extra_types.push(type_signature.clone());
            let ops = bootstrap(&config)?;
            let tv = build_value(&ops, &type_signature, &value)?;
            println!("{:016x}", tv.hash_code()?);
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<TypeSystemConfig> {
    let Some(path) = path else {
        return Ok(TypeSystemConfig::from_env());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: TypeSystemConfig = serde_yaml::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    debug!(path = %path.display(), ?config, "loaded config");
    Ok(config)
}

fn bootstrap(config: &TypeSystemConfig) -> Result<OperatorRegistry> {
    let types = TypeRegistry::bootstrap(config).context("failed to bootstrap type registry")?;
    debug!(types = types.len(), "type registry ready");
    Ok(OperatorRegistry::new(Arc::new(types)))
}

/// The envelope names its own type, which may be parametric and absent from
/// the config.
fn bootstrap_for_envelope(mut config: TypeSystemConfig, input: &str) -> Result<OperatorRegistry> {
    let envelope = SerializableValue::from_json(input).context("input is not a valid envelope")?;
    config.extra_types.push(envelope.type_signature);
    bootstrap(&config)
}

fn build_value(ops: &OperatorRegistry, type_signature: &str, literal: &str) -> Result<TypedValue> {
    let ty = ops.types().describe(type_signature)?;
    let native = parse_literal(&ty, literal)?;
    Ok(TypedValue::new(ops, ty, native)?)
}

fn list_types(types: &TypeRegistry) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<32} {:<10} {:>5}  {:<10} {:<9}\n",
        "TYPE", "KIND", "WIDTH", "COMPARABLE", "ORDERABLE"
    ));
    for ty in types.types() {
        let width = ty
            .fixed_width()
            .map_or_else(|| "-".to_string(), |w| w.to_string());
        out.push_str(&format!(
            "{:<32} {:<10} {:>5}  {:<10} {:<9}\n",
            ty.signature(),
            ty.kind().to_string(),
            width,
            ty.is_comparable(),
            ty.is_orderable()
        ));
    }
    out
}
