use repo_census::cli::commands::{CliArgs, Commands};
use repo_census::cli::handlers::{handle_get, handle_list, handle_probe, handle_run, handle_search};
use repo_census::cli::spinner::{spinner_bar, SpinnerLogWriter};
use repo_census::util::logging::{init_logging, init_logging_with_writer, parse_level, LoggingConfig};
use repo_census::{NAME, VERSION};

use clap::Parser;
use indicatif::ProgressBar;
use std::env;
use std::process;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    let spinner = match &args.command {
        Commands::Run(_) if !args.quiet => Some(spinner_bar()),
        _ => None,
    };
    init_logging_from_args(&args, spinner.clone());

    debug!("{} v{} starting", NAME, VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Run(run_args) => handle_run(run_args, spinner).await,
        Commands::List(list_args) => handle_list(list_args).await,
        Commands::Get(get_args) => handle_get(get_args).await,
        Commands::Search(search_args) => handle_search(search_args).await,
        Commands::Probe(probe_args) => handle_probe(probe_args).await,
    };

    process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs, spinner: Option<ProgressBar>) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        parse_level(&env::var("REPO_CENSUS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()))
    };

    let use_json = env::var("REPO_CENSUS_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    let config = LoggingConfig {
        level,
        use_json,
        ..Default::default()
    };
    match spinner {
        Some(bar) => init_logging_with_writer(config, SpinnerLogWriter::new(bar)),
        None => init_logging(config),
    }
}
