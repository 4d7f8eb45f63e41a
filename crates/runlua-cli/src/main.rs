use clap::Parser;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use runlua_core::{
    rlimit, CliOverrides, ModuleLoader, Outcome, ReadErrorPolicy, Runner, RunnerConfig,
};

/// runlua - run a Lua script file in an embedded interpreter
#[derive(Parser, Debug)]
#[command(name = "runlua")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Script file to execute
    #[arg(value_name = "FILE")]
    script: PathBuf,

    /// Grant the script a module loader rooted at the working directory
    #[arg(short, long)]
    modules: bool,

    /// With --modules, root the module loader at DIR instead
    #[arg(long, value_name = "DIR")]
    module_root: Option<PathBuf>,

    /// Set a resource limit before the script runs (repeatable)
    #[arg(short = 'r', long = "rlimit", value_name = "NAME=VALUE")]
    rlimit: Vec<String>,

    /// Fail on unreadable script files instead of silently skipping them
    #[arg(long)]
    strict_reads: bool,

    /// Path to a runlua.json configuration file
    #[arg(short, long, value_name = "FILE")]
    project: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Host diagnostics go to stderr; stdout belongs to the script.
    // Set RUST_LOG=debug to trace the read/compile/run phases.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let mut limits = rlimit::defaults();
    for spec in &cli.rlimit {
        rlimit::parse(&mut limits, spec)?;
    }
    rlimit::apply(&limits)?;

    let options = &config.runner;
    let loader = if options.modules {
        Some(match &options.module_root {
            Some(root) => ModuleLoader::rooted_at(root),
            None => ModuleLoader::current_dir()?,
        })
    } else {
        None
    };

    debug!("input: {}", cli.script.display());
    let runner = Runner::with_capability(options, loader)?;

    match runner.run(&cli.script) {
        Ok(Outcome::Ran) => {
            debug!("done: {}", cli.script.display());
        }
        Ok(Outcome::Skipped) => {
            debug!("skipped unreadable script: {}", cli.script.display());
        }
        Err(err) => {
            eprintln!("runlua: {err}");
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Load configuration from file (if any) and merge CLI flags over it
fn load_config(cli: &Cli) -> anyhow::Result<RunnerConfig> {
    let mut config = if let Some(ref project) = cli.project {
        RunnerConfig::from_file(project)
            .map_err(|e| anyhow::anyhow!("Failed to load config file: {e}"))?
    } else {
        // Pick up runlua.json from the working directory when present
        let default_path = PathBuf::from("runlua.json");
        if default_path.exists() {
            RunnerConfig::from_file(&default_path)
                .map_err(|e| anyhow::anyhow!("Failed to load runlua.json: {e}"))?
        } else {
            RunnerConfig::default()
        }
    };

    let mut overrides = CliOverrides::default();
    if cli.modules {
        overrides.modules = Some(true);
    }
    if let Some(ref root) = cli.module_root {
        overrides.module_root = Some(root.to_string_lossy().to_string());
    }
    if cli.strict_reads {
        overrides.read_errors = Some(ReadErrorPolicy::Fail);
    }
    config.merge(&overrides);

    Ok(config)
}
