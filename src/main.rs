use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pagesift::config::Config;
use pagesift::index::{Corpus, IndexStore};
use pagesift::live::LiveSync;
use pagesift::output;
use pagesift::query::search;
use pagesift::templates::TemplateCache;
use pagesift::watch::WatchLedger;

/// Environment variable holding a `tracing` filter directive
const LOG_ENV: &str = "PAGESIFT_LOG";

#[derive(Parser)]
#[command(name = "pagesift")]
#[command(about = "Full-text search over a directory of Markdown pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Corpus root directory
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the pages and print one page of ranked results
    Search {
        /// Result page, starting at 1
        #[arg(short = 'n', long, default_value_t = 1)]
        page: usize,

        /// Print the result page as JSON
        #[arg(long)]
        json: bool,

        /// Search terms
        #[arg(required = true, trailing_var_arg = true)]
        terms: Vec<String>,
    },
    /// List every page with its title
    List,
    /// Count pages per hashtag
    Hashtags,
    /// Keep the index live and answer queries read from stdin
    Watch,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(dir) = cli.dir {
        config.root = dir;
    }

    let store = Arc::new(IndexStore::new(Corpus::new(&config.root)));
    store
        .load()
        .with_context(|| format!("Failed to index {}", config.root.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Search { page, json, terms } => {
            let query = terms.join(" ");
            let results = search(&store, &query, page, config.page_size);
            if json {
                output::write_json(&mut out, &results)?;
            } else {
                output::write_results(&mut out, &results)?;
            }
        }
        Commands::List => {
            output::write_titles(&mut out, &store.titles())?;
        }
        Commands::Hashtags => {
            output::write_hashtags(&mut out, &store.hashtag_counts())?;
        }
        Commands::Watch => {
            drop(out);
            run_watch(store, &config)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "pagesift=warn",
        1 => "pagesift=info",
        _ => "pagesift=debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Watch the corpus while answering one query per stdin line until EOF
fn run_watch(store: Arc<IndexStore>, config: &Config) -> Result<()> {
    let templates = Arc::new(TemplateCache::new(&config.root));
    if let Err(err) = templates.load_dir() {
        warn!(error = %err, "templates not loaded");
    }

    let ledger = Arc::new(WatchLedger::new(config.quiet_period()));
    let live = Arc::new(LiveSync::new(Arc::clone(&store), ledger, templates));
    let mut handle = live
        .watcher()
        .start()
        .context("Failed to start file watcher")?;
    info!(documents = store.len(), "ready for queries");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in stdin.lock().lines() {
        let query = line.context("Failed to read query")?;
        let query = query.trim();
        if query.is_empty() {
            continue;
        }
        let results = search(&store, query, 1, config.page_size);
        output::write_results(&mut out, &results)?;
        out.flush()?;
    }

    handle.stop();
    Ok(())
}
