//! Entrypoint to the `cohesionc` binary.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use dotenvy::dotenv;
use human_panic::setup_panic;
use log::{debug, error, info, LevelFilter};

use cohesion_ast::Aggregate;
use specifications::Config;

#[derive(Parser)]
#[clap(name = "cohesionc", author, about = "Compiles a cohesion source file into a workflow state machine plus helper functions.")]
struct Arguments {
    /// The source file to compile.
    #[clap(name = "SOURCE", help = "The input source file to compile.")]
    source: PathBuf,

    /// Path to the JSON config file.
    #[clap(short, long, default_value = "./config.json", help = "Path to the JSON configuration file.")]
    config: PathBuf,

    /// Output directory.
    #[clap(short, long, default_value = "build", help = "Directory to write the compiled workflow, graph, and helper-function files to.")]
    output: PathBuf,

    /// Shows debug prints.
    #[clap(short, long, help = "If given, shows additional prints in the log.", env = "DEBUG")]
    verbose: bool,
}

fn main() -> ExitCode {
    dotenv().ok();
    let args = Arguments::parse();

    let mut logger = env_logger::builder();
    logger.format_module_path(false);
    if args.verbose {
        logger.filter_module("cohesion", LevelFilter::Debug).init();
    } else {
        logger.filter_module("cohesion", LevelFilter::Warn).init();
        setup_panic!(human_panic::Metadata {
            name: "cohesionc".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            authors: env!("CARGO_PKG_AUTHORS").replace(':', ", ").into(),
            homepage: "".into(),
        });
    }
    info!("cohesionc v{}", env!("CARGO_PKG_VERSION"));

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Arguments) -> Result<(), RunError> {
    debug!("loading config from '{}'", args.config.display());
    let config = Config::load(&args.config).map_err(|err| RunError::Config { source: args.config.clone(), err: err.to_string() })?;

    debug!("reading source from '{}'", args.source.display());
    let source = fs::read_to_string(&args.source).map_err(|err| RunError::Read { path: args.source.clone(), err })?;

    let agg = cohesion_ast::compile(&source, &config)?;

    debug!("writing output to '{}'", args.output.display());
    write_output(&args.output, &agg)?;

    info!("wrote {} workflow(s) to '{}'", agg.workflows.len(), args.output.display());
    Ok(())
}

/// Writes everything a successful compile produced. Only called once the
/// whole pipeline (through pass elimination) has already succeeded, so a
/// compile failure never leaves a partially written output directory.
fn write_output(output: &PathBuf, agg: &Aggregate) -> Result<(), RunError> {
    fs::create_dir_all(output).map_err(|err| RunError::Write { path: output.clone(), err })?;

    for workflow in &agg.workflows {
        let path = output.join(format!("{}.sfn.json", workflow.name));
        let json = serde_json::to_string_pretty(workflow).map_err(|err| RunError::Serialize { workflow: workflow.name.clone(), err })?;
        fs::write(&path, json).map_err(|err| RunError::Write { path, err })?;
    }

    for (name, graph) in &agg.graphs {
        let path = output.join(format!("{name}.graph.json"));
        let json = serde_json::to_string_pretty(graph).map_err(|err| RunError::Serialize { workflow: name.clone(), err })?;
        fs::write(&path, json).map_err(|err| RunError::Write { path, err })?;
    }

    let functions_path = output.join("functions.py");
    let functions_src = cohesion_ast::emit::helpers::render(agg);
    fs::write(&functions_path, functions_src).map_err(|err| RunError::Write { path: functions_path, err })?;

    Ok(())
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("failed to load config '{source}': {err}")]
    Config { source: PathBuf, err: String },
    #[error("failed to read source file '{path}': {err}")]
    Read { path: PathBuf, err: std::io::Error },
    #[error(transparent)]
    Compile(#[from] cohesion_ast::CompileError),
    #[error("failed to serialize workflow '{workflow}': {err}")]
    Serialize { workflow: String, err: serde_json::Error },
    #[error("failed to write '{path}': {err}")]
    Write { path: PathBuf, err: std::io::Error },
}
