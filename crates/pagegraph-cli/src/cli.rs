//! Command-line definition and settings

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use pagegraph_core::Config;
use pagegraph_record::RecordId;
use std::path::PathBuf;

pub(crate) fn build() -> Command {
    Command::new("pagegraph")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Download the complete content graph of a page")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Log at debug level"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_parser(["text", "json"])
                .default_value("text")
                .global(true)
                .help("Log line format"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .global(true)
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("cache-dir")
                .long("cache-dir")
                .value_parser(value_parser!(PathBuf))
                .global(true)
                .help("Directory holding cached responses [default: tmpdata/cache]"),
        )
        .subcommand(resolve_args(
            Command::new("download").about("Resolve a page and print a summary"),
        ))
        .subcommand(
            resolve_args(Command::new("dump").about("Resolve a page and write its record map as JSON"))
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_parser(value_parser!(PathBuf))
                        .help("Output file (stdout if omitted)"),
                ),
        )
        .subcommand(Command::new("clean-cache").about("Remove every cached response"))
}

fn resolve_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("page")
                .required(true)
                .value_parser(parse_page)
                .help("Page URL or ID"),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .env("NOTION_TOKEN")
                .hide_env_values(true)
                .help("Session token (token_v2 cookie)"),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .help("Service base URL"),
        )
        .arg(
            Arg::new("concurrency")
                .long("concurrency")
                .value_parser(value_parser!(usize))
                .help("Maximum branches fetched at once"),
        )
        .arg(
            Arg::new("no-recursive")
                .long("no-recursive")
                .action(ArgAction::SetTrue)
                .help("Do not expand sub-pages"),
        )
        .arg(
            Arg::new("no-cache")
                .long("no-cache")
                .action(ArgAction::SetTrue)
                .help("Bypass the response cache"),
        )
}

/// Accept a page URL or a bare ID
pub(crate) fn parse_page(input: &str) -> Result<RecordId, String> {
    RecordId::from_url(input).ok_or_else(|| format!("no page ID found in '{input}'"))
}

/// Configuration file (or defaults) with command-line overrides applied
pub(crate) fn load_config(args: &ArgMatches) -> anyhow::Result<Config> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(dir) = args.get_one::<PathBuf>("cache-dir") {
        config.cache_dir.clone_from(dir);
    }
    if let Some(token) = optional::<String>(args, "token") {
        config.http.token = Some(token);
    }
    if let Some(base_url) = optional::<String>(args, "base-url") {
        config.http.base_url = base_url;
    }
    if let Some(max) = optional::<usize>(args, "concurrency") {
        config.resolver.max_concurrent_branches = max;
    }
    if flag(args, "no-recursive") {
        config.resolver.recursive = false;
    }

    config.resolver.validate()?;
    Ok(config)
}

/// Value of an argument the subcommand may not define
fn optional<T: Clone + Send + Sync + 'static>(args: &ArgMatches, id: &str) -> Option<T> {
    args.try_get_one::<T>(id).ok().flatten().cloned()
}

pub(crate) fn flag(args: &ArgMatches, id: &str) -> bool {
    args.try_get_one::<bool>(id).ok().flatten().copied().unwrap_or(false)
}
