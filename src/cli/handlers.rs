//! Command handlers; each returns the process exit code

use super::commands::{GetArgs, ListArgs, ProbeArgs, RunArgs, SearchArgs};
use super::spinner::SpinnerHandler;
use crate::catalog::{EntryId, GithubSearchSource, PageSource, PaginationCursor};
use crate::config::CensusConfig;
use crate::extraction::{FeatureSchema, LlmExtractor};
use crate::pipeline::{Harvester, RunSummary};
use crate::progress::{LoggingHandler, ProgressHandler};
use crate::tools::{probe_server_tools, StdioServerParams, ToolSettings, ToolSystem, DEFAULT_PROBE_TIMEOUT};
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Runs a harvest; `spinner` is the bar the log writer already routes around,
/// or `None` for plain log progress.
pub async fn handle_run(args: &RunArgs, spinner: Option<ProgressBar>) -> i32 {
    let bar = spinner.clone();
    match run_harvest(args, spinner).await {
        Ok(summary) => {
            println!("{}", summary);
            0
        }
        Err(e) => {
            if let Some(bar) = bar {
                bar.finish_and_clear();
            }
            error!("Run failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn run_config(args: &RunArgs) -> Result<CensusConfig> {
    let mut config = CensusConfig::default();
    if let Some(output) = &args.output {
        config.output = output.clone();
    }
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }
    if let Some(max_pages) = args.max_pages {
        config.max_pages = Some(max_pages);
    }
    if let Some(timeout) = args.timeout {
        config.extraction_timeout = Duration::from_secs(timeout);
    }
    if let Some(provider) = args.provider {
        config.provider = provider.as_lower_str().to_string();
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if args.allow_server_probe {
        config.allow_server_probe = true;
    }

    config.validate().context("Invalid configuration")?;
    debug!("{}", config);
    Ok(config)
}

async fn run_harvest(args: &RunArgs, spinner: Option<ProgressBar>) -> Result<RunSummary> {
    let config = run_config(args)?;
    let schema = FeatureSchema::from(args.schema);
    let catalog = config.catalog()?;

    let source: Arc<dyn PageSource> = match &args.github {
        Some(query) => {
            info!(query = %query, "Walking GitHub search results");
            Arc::new(GithubSearchSource::new(
                query.clone(),
                config.github_token.clone(),
                config.http_timeout,
            )?)
        }
        None => Arc::new(catalog.clone()),
    };

    let tools = ToolSystem::standard(ToolSettings {
        catalog,
        github_token: config.github_token.clone(),
        github_api: None,
        http_timeout: config.http_timeout,
        probe_timeout: DEFAULT_PROBE_TIMEOUT,
        schema,
        allow_server_probe: config.allow_server_probe,
    })?;
    let client = Arc::new(config.create_llm_client()?);
    let extractor = LlmExtractor::new(client, Arc::new(tools), schema)
        .with_max_iterations(config.max_iterations);

    let progress: Arc<dyn ProgressHandler> = match spinner {
        Some(bar) => Arc::new(SpinnerHandler::with_bar(bar)),
        None => Arc::new(LoggingHandler),
    };

    let cursor = PaginationCursor::new(source).with_page_delay(config.page_delay);
    let harvester = Harvester::new(cursor, Arc::new(extractor), schema.header(), &config.output)
        .with_timeout(config.extraction_timeout)
        .with_progress(progress);

    let summary = harvester
        .run(config.page_size, config.max_pages)
        .await
        .with_context(|| format!("Harvest into {} aborted", config.output.display()))?;
    Ok(summary)
}

pub async fn handle_list(args: &ListArgs) -> i32 {
    let result = async {
        let catalog = CensusConfig::default().catalog()?;
        let entries = catalog
            .fetch_page(args.limit, args.offset)
            .await
            .context("Failed to fetch catalog page")?;
        for entry in &entries {
            println!(
                "{}\t{}\t{}\t{}",
                entry.full_name.as_deref().unwrap_or("-"),
                entry.stars.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                entry.url.as_deref().unwrap_or("-"),
                entry.id
            );
        }
        anyhow::Ok(())
    }
    .await;

    exit_code(result)
}

pub async fn handle_get(args: &GetArgs) -> i32 {
    let result = async {
        let catalog = CensusConfig::default().catalog()?;
        match catalog.get_entry(&EntryId::new(args.id.trim())).await {
            Some(entry) => println!("{}", serde_json::to_string_pretty(&entry)?),
            None => println!("Repository {} not found", args.id),
        }
        anyhow::Ok(())
    }
    .await;

    exit_code(result)
}

pub async fn handle_search(args: &SearchArgs) -> i32 {
    let result = async {
        let catalog = CensusConfig::default().catalog()?;
        let results = catalog.search(&args.query).await;
        println!("{}", results.url);
        println!("{}", serde_json::to_string_pretty(&results.results)?);
        anyhow::Ok(())
    }
    .await;

    exit_code(result)
}

pub async fn handle_probe(args: &ProbeArgs) -> i32 {
    let params = StdioServerParams::new(args.command.clone()).with_args(args.args.clone());
    let result = probe_server_tools(&params, Duration::from_secs(args.timeout))
        .await
        .map(|tools| {
            for tool in tools {
                println!("{}", tool);
            }
        });

    exit_code(result)
}

fn exit_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}
