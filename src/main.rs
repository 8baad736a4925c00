use std::{fs::read_to_string, path::PathBuf, process::ExitCode, time::Instant};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use solpp_typecheck::{
    ast::ast::SourceUnit,
    config::{AbiCoderVersion, CheckerSettings, EvmVersion},
    display_error,
    type_checker::type_checker::type_check,
};

/// Type checks a name-linked Solidity++ AST.
#[derive(Parser, Debug)]
#[command(name = "solpp-check", version, about)]
struct Args {
    /// JSON AST produced by the frontend.
    ast: PathBuf,

    /// Target EVM version, e.g. `london`.
    #[arg(long)]
    evm_version: Option<EvmVersion>,

    /// Default ABI coder for files without a pragma.
    #[arg(long)]
    abi_coder: Option<AbiCoderVersion>,

    /// JSON file with checker settings. Flags take precedence.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Source text, used to print line excerpts.
    #[arg(long)]
    source: Option<PathBuf>,

    /// Print diagnostics and annotations as JSON.
    #[arg(long)]
    json: bool,
}

fn load_settings(args: &Args) -> anyhow::Result<CheckerSettings> {
    let mut settings = match &args.settings {
        Some(path) => {
            let contents = read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&contents).with_context(|| format!("invalid settings in {}", path.display()))?
        }
        None => CheckerSettings::default(),
    };
    if let Some(evm_version) = args.evm_version {
        settings.evm_version = evm_version;
    }
    if let Some(abi_coder) = args.abi_coder {
        settings = settings.with_abi_coder(abi_coder);
    }
    Ok(settings)
}

fn run(args: Args) -> anyhow::Result<bool> {
    let settings = load_settings(&args)?;

    let contents = read_to_string(&args.ast).with_context(|| format!("failed to read {}", args.ast.display()))?;
    let source: SourceUnit =
        serde_json::from_str(&contents).with_context(|| format!("{} is not a valid AST", args.ast.display()))?;
    let source_text = match &args.source {
        Some(path) => Some(read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?),
        None => None,
    };

    let start = Instant::now();
    let result = type_check(&source, settings).context("type checker aborted")?;
    tracing::info!(elapsed = ?start.elapsed(), passed = result.passed, "type checked");

    if args.json {
        let output = serde_json::json!({
            "passed": result.passed,
            "diagnostics": result.diagnostics,
            "annotations": result.annotations,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let file = args
            .source
            .as_ref()
            .map_or_else(|| source.path.clone(), |path| path.display().to_string());
        for diagnostic in &result.diagnostics {
            print!("{}", display_error(diagnostic, &file, source_text.as_deref()));
            println!("{}\n", diagnostic.message());
        }
    }
    Ok(result.passed)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("error: {:#}", error);
            ExitCode::from(2)
        }
    }
}
