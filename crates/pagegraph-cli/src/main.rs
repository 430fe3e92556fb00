//! `pagegraph` command-line tool
//!
//! Resolves a page graph through the disk cache and prints a summary or
//! dumps the record map as JSON.

use anyhow::{bail, Context};
use clap::ArgMatches;
use pagegraph_cache::{CachingTransport, DiskStore, Transport};
use pagegraph_core::{Config, Graph, HttpTransport, Resolver};
use pagegraph_record::{RecordId, Table};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli::build().get_matches();
    let Some((name, args)) = matches.subcommand() else {
        bail!("no command given");
    };
    init_tracing(args);

    let config = cli::load_config(args)?;
    match name {
        "download" => {
            let graph = resolve(args, &config).await?;
            print_summary(&graph);
        }
        "dump" => {
            let graph = resolve(args, &config).await?;
            dump(&graph, args.get_one::<PathBuf>("output"))?;
        }
        "clean-cache" => {
            let store = DiskStore::open(&config.cache_dir)
                .await
                .with_context(|| format!("failed to open cache at {}", config.cache_dir.display()))?;
            let entries = store.len().await?;
            store.wipe().await?;
            println!("Removed {entries} cached responses from {}", config.cache_dir.display());
        }
        other => bail!("unknown command '{other}'"),
    }
    Ok(())
}

fn init_tracing(args: &ArgMatches) {
    let filter = if cli::flag(args, "verbose") {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if args.get_one::<String>("log-format").map(String::as_str) == Some("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolve the requested page, through the disk cache unless disabled
async fn resolve(args: &ArgMatches, config: &Config) -> anyhow::Result<Graph> {
    let page = args
        .get_one::<RecordId>("page")
        .context("missing page argument")?
        .clone();
    let http = HttpTransport::new(config.http.clone())?;
    if config.http.token.is_none() {
        tracing::warn!("no session token given, private pages will be inaccessible");
    }

    if cli::flag(args, "no-cache") {
        return run(Arc::new(http), config, &page).await;
    }

    let store = DiskStore::open(&config.cache_dir)
        .await
        .with_context(|| format!("failed to open cache at {}", config.cache_dir.display()))?;
    let caching = Arc::new(CachingTransport::new(http, Arc::new(store)));
    let result = run(Arc::clone(&caching), config, &page).await;
    eprintln!("{}", caching.stats());
    result
}

async fn run<T: Transport + 'static>(
    transport: Arc<T>,
    config: &Config,
    page: &RecordId,
) -> anyhow::Result<Graph> {
    let resolver = Resolver::new(transport, config.resolver.clone());

    let token = resolver.cancellation_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling");
            token.cancel();
        }
    });

    let result = resolver
        .resolve(page)
        .await
        .with_context(|| format!("failed to resolve page {page}"));
    ctrl_c.abort();
    result
}

fn print_summary(graph: &Graph) {
    let title = graph
        .root()
        .map(|b| b.title())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "(untitled)".to_string());

    println!("Resolved \"{title}\" ({})", graph.root_id());
    println!("  pages:       {}", graph.pages().count());
    println!("  blocks:      {}", graph.records(Table::Block).count());
    println!("  collections: {}", graph.records(Table::Collection).count());
    println!("  comments:    {}", graph.records(Table::Comment).count());
    println!("  records:     {}", graph.len());
}

fn dump(graph: &Graph, output: Option<&PathBuf>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = std::io::BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, graph.record_map())?;
            writer.flush()?;
            tracing::info!(path = %path.display(), records = graph.len(), "record map written");
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, graph.record_map())?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
