use clap::{Parser, Subcommand, ValueEnum};
use folio_build::aggregate::{Aggregator, BuildContext};
use folio_build::{cache, catalogue, config, output};
use std::path::{Path, PathBuf};

/// File the project list is written to, under the public directory.
const PROJECTS_FILENAME: &str = "projects.json";

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    /// No logging output
    None,
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Progress, warning, and error messages
    Info,
    /// Everything above plus per-request detail
    Debug,
    /// All messages
    Trace,
}

#[derive(clap::Args, Clone)]
struct BuildArgs {
    /// Ignore cached images and regenerate every one of them
    #[arg(long)]
    no_cache: bool,
}

#[derive(Parser)]
#[command(name = "folio-build")]
#[command(about = "Build-time data pipeline for a developer portfolio")]
#[command(long_about = "\
Build-time data pipeline for a developer portfolio

Reads the project catalogue, looks up live download counts, caches every
project image into the public directory and writes the enriched project
list as JSON for the page layer.

Source structure:

  site/
  ├── catalogue.toml     # [[skills]] and [[projects]]
  ├── config.toml        # Pipeline config (optional)
  └── public/            # Public assets; cached images land in images/cached/

Download counts come from the store detail page and the release API. The
release API token is read from GITHUB_TOKEN (see [releases] token_env).
Cached file names carry the run id from RUN_ID, or a digest of the
catalogue when it is unset.

Run 'folio-build gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory holding catalogue.toml and config.toml
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Where to write the project list (default: <public_dir>/projects.json)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch counts, cache images and write the project list
    Build(BuildArgs),
    /// Validate config and catalogue without touching the network
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match cli.command {
        Command::Build(args) => {
            let (catalogue, raw) = catalogue::load_catalogue(&cli.source)?;
            let ctx = load_context(&cli.source, &raw, args.no_cache)?;
            let output_path = cli
                .output
                .clone()
                .unwrap_or_else(|| ctx.public_dir().join(PROJECTS_FILENAME));

            println!("==> Building {} (run {})", cli.source.display(), ctx.run_id);
            let aggregator = Aggregator::new(&ctx)?;
            let projects = aggregator.build(&catalogue).await;

            if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let json = serde_json::to_string_pretty(&projects)?;
            std::fs::write(&output_path, json)?;

            output::print_build_output(&projects, &aggregator.images().stats(), &output_path);
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let (catalogue, raw) = catalogue::load_catalogue(&cli.source)?;
            let ctx = load_context(&cli.source, &raw, false)?;
            output::print_check_output(&catalogue, &ctx.run_id);
            println!("==> Catalogue is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load config and derive the run id from the environment or the catalogue text.
fn load_context(source: &Path, catalogue_text: &str, force: bool) -> Result<BuildContext, config::ConfigError> {
    let config = config::load_config(source)?;
    let run_id = cache::resolve_run_id(&config.run_id_env, catalogue_text.as_bytes());
    Ok(BuildContext {
        config,
        source_root: source.to_path_buf(),
        run_id,
        force,
    })
}

fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .init();
}
