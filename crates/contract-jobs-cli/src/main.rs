//! cjobs - inspection tools for the contract job engine
//!
//! Runs single engine stages against the local filesystem, without a
//! chain. Useful for checking a job's inputs before it runs.
//!
//! ## Commands
//!
//! - `resolve`: show where a contract would be found, and how
//! - `compile`: compile a source with `solc` and list deployable objects
//! - `encode`: encode a function call against a saved ABI
//! - `decode`: decode return bytes against a saved ABI

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, Level};

use contract_gateway::{Libraries, SolcCompiler};
use contract_jobs::abi::{decode_return, encode_call};
use contract_jobs::{
    compile, init_tracing, return_value, AbiSource, AbiStore, ArtifactResolver, ContextConfig,
    TracingObserver, Variable,
};

#[derive(Parser)]
#[command(name = "cjobs")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Contract job engine inspection tools", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Context configuration file (TOML). Defaults come from CJOBS_* variables.
    #[arg(long, global = true)]
    context: Option<PathBuf>,

    /// Directory of saved ABIs
    #[arg(long, global = true, env = "CJOBS_ABI_PATH")]
    abi_path: Option<PathBuf>,

    /// Directory of binaries, also searched for contracts
    #[arg(long, global = true, env = "CJOBS_BIN_PATH")]
    bin_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show where a contract resolves to
    Resolve {
        /// Contract identifier as written in a deploy job
        contract: String,
    },

    /// Compile a contract source and list its objects
    Compile {
        /// Contract identifier as written in a deploy job
        contract: String,

        /// Library address, as NAME=ADDRESS (repeatable)
        #[arg(short, long = "lib", value_parser = parse_library)]
        libraries: Vec<(String, String)>,

        /// solc binary to run
        #[arg(long, env = "SOLC_PATH", default_value = "solc")]
        solc: PathBuf,

        /// Enable the solc optimizer
        #[arg(long)]
        optimize: bool,
    },

    /// Encode a function call
    Encode {
        /// Saved ABI name, deployed address or ABI file
        abi: String,

        /// Function name or full signature; `()` for the fallback
        function: String,

        /// Arguments, one per parameter
        args: Vec<String>,
    },

    /// Decode a function's return bytes
    Decode {
        /// Saved ABI name, deployed address or ABI file
        abi: String,

        /// Function name or full signature
        function: String,

        /// Return bytes as hex
        data: String,

        /// Number of inputs, to pick between overloads of a bare name
        #[arg(long, default_value = "0")]
        arity: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let config = load_config(&cli)?;
    debug!(abi_path = %config.abi_path.display(), bin_path = %config.bin_path.display(), "context loaded");

    match cli.command {
        Commands::Resolve { contract } => cmd_resolve(&config, &contract),
        Commands::Compile {
            contract,
            libraries,
            solc,
            optimize,
        } => cmd_compile(&config, &contract, libraries, solc, optimize).await,
        Commands::Encode {
            abi,
            function,
            args,
        } => cmd_encode(&config, &abi, &function, &args),
        Commands::Decode {
            abi,
            function,
            data,
            arity,
        } => cmd_decode(&config, &abi, &function, &data, arity),
    }
}

fn load_config(cli: &Cli) -> Result<ContextConfig> {
    let mut config = match &cli.context {
        Some(path) => ContextConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load context from {}", path.display()))?,
        None => ContextConfig::from_env(),
    };
    if let Some(path) = &cli.abi_path {
        config.abi_path = path.clone();
    }
    if let Some(path) = &cli.bin_path {
        config.bin_path = path.clone();
    }
    Ok(config)
}

fn parse_library(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, address)) if !name.is_empty() && !address.is_empty() => {
            Ok((name.to_string(), address.to_string()))
        }
        _ => Err(format!("expected NAME=ADDRESS, got {:?}", raw)),
    }
}

/// ABI source for a command-line argument: an address, a file, or a name.
fn abi_source(raw: &str) -> AbiSource {
    match AbiSource::for_call("", raw) {
        AbiSource::ByName(name) if Path::new(&name).is_file() => AbiSource::ByOverride(name),
        other => other,
    }
}

fn cmd_resolve(config: &ContextConfig, contract: &str) -> Result<()> {
    let resolved = ArtifactResolver::default().resolve(contract, &config.bin_path)?;
    println!("Path:      {}", resolved.path.display());
    println!("Kind:      {:?}", resolved.kind);
    println!("Found by:  {}", resolved.found_by);
    Ok(())
}

#[derive(Serialize)]
struct ObjectSummary<'a> {
    name: &'a str,
    bytecode_bytes: usize,
}

async fn cmd_compile(
    config: &ContextConfig,
    contract: &str,
    libraries: Vec<(String, String)>,
    solc: PathBuf,
    optimize: bool,
) -> Result<()> {
    let resolved = ArtifactResolver::default().resolve(contract, &config.bin_path)?;
    let libraries: Libraries = libraries.into_iter().collect();
    let mut compiler = SolcCompiler::new(solc);
    if optimize {
        compiler = compiler.with_optimizer();
    }

    let output = compile::compile(&compiler, &TracingObserver, &resolved.path, &libraries)
        .await
        .with_context(|| format!("Failed to compile {}", resolved.path.display()))?;

    if output.objects.is_empty() {
        bail!("{} has no deployable objects", resolved.path.display());
    }
    let summary: Vec<ObjectSummary> = output
        .objects
        .iter()
        .map(|o| ObjectSummary {
            name: &o.name,
            bytecode_bytes: o.bytecode.trim().len() / 2,
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    if !output.skipped.is_empty() {
        println!("Skipped (no bytecode): {}", output.skipped.join(", "));
    }
    Ok(())
}

fn cmd_encode(config: &ContextConfig, abi: &str, function: &str, args: &[String]) -> Result<()> {
    let store = AbiStore::new(&config.abi_path);
    let data = encode_call(&store, &abi_source(abi), function, args)?;
    println!("0x{}", hex::encode(data));
    Ok(())
}

fn cmd_decode(
    config: &ContextConfig,
    abi: &str,
    function: &str,
    data: &str,
    arity: usize,
) -> Result<()> {
    let raw = hex::decode(data.trim().trim_start_matches("0x"))
        .map_err(|e| anyhow!("return data is not hex: {}", e))?;
    let store = AbiStore::new(&config.abi_path);
    let variables: Vec<Variable> = decode_return(&store, &abi_source(abi), function, arity, &raw)?;
    for variable in &variables {
        println!("{} = {}", variable.name, variable.value);
    }
    println!("Result: {}", return_value(&variables));
    Ok(())
}
