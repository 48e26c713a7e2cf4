//! Seekify: metasearch from the command line
//!
//! Results are printed as JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use seekify::backends::{Category, SafeSearch, TimeLimit};
use seekify::config::{expand_proxy_alias, Settings, TlsVerify};
use seekify::{Search, SearchRequest};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "seekify", about = "A metasearch library and CLI", disable_version_flag = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Web search
    Text(SearchArgs),
    /// Image search
    Images(SearchArgs),
    /// News search
    News(SearchArgs),
    /// Video search
    Videos(SearchArgs),
    /// Book search
    Books(SearchArgs),
    /// Print the version
    Version,
}

#[derive(Args)]
struct SearchArgs {
    /// Search query
    #[arg(short, long)]
    query: String,
    /// Region code, e.g. us-en, uk-en, ru-ru
    #[arg(short, long)]
    region: Option<String>,
    /// Safe search level (on, moderate, off)
    #[arg(short, long)]
    safesearch: Option<SafeSearch>,
    /// Time limit (d, w, m, y)
    #[arg(short, long)]
    timelimit: Option<TimeLimit>,
    /// Maximum number of results (0 = all collected)
    #[arg(short, long)]
    max_results: Option<usize>,
    /// Page number
    #[arg(short, long, default_value_t = 1)]
    page: u32,
    /// Backend: auto, all, a key, or a comma separated list of keys
    #[arg(short, long)]
    backend: Option<String>,
    /// Write results to this JSON file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Proxy address (`tb` for Tor Browser)
    #[arg(long)]
    proxy: Option<String>,
    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
    /// TLS verification: true, false or a path to a PEM bundle
    #[arg(long)]
    verify: Option<String>,
}

impl SearchArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(proxy) = &self.proxy {
            settings.proxy = Some(expand_proxy_alias(proxy));
        }
        if let Some(timeout) = self.timeout {
            settings.timeout = timeout;
        }
        if let Some(verify) = &self.verify {
            settings.verify = TlsVerify::parse(verify);
        }
    }

    fn request(&self, settings: &Settings) -> SearchRequest {
        let mut request = SearchRequest::from_defaults(&self.query, &settings.defaults).with_page(self.page);
        if let Some(region) = &self.region {
            request = request.with_region(region);
        }
        if let Some(safesearch) = self.safesearch {
            request = request.with_safesearch(safesearch);
        }
        if let Some(timelimit) = self.timelimit {
            request = request.with_timelimit(timelimit);
        }
        if let Some(max) = self.max_results {
            request = request.with_max_results(max);
        }
        if let Some(backend) = &self.backend {
            request = request.with_backend(backend.as_str());
        }
        request
    }
}

async fn run(category: Category, args: SearchArgs) -> Result<()> {
    let mut settings = Settings::load().context("failed to load settings")?;
    args.apply(&mut settings);
    debug!("settings: {:?}", settings);

    let search = Search::new(&settings);
    let results = search.search(category, args.request(&settings)).await?;
    let json = serde_json::to_string_pretty(&results)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("{} results written to {}", results.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let (category, args) = match cli.command {
        Command::Version => {
            println!("{}", seekify::VERSION);
            return ExitCode::SUCCESS;
        }
        Command::Text(args) => (Category::Text, args),
        Command::Images(args) => (Category::Images, args),
        Command::News(args) => (Category::News, args),
        Command::Videos(args) => (Category::Videos, args),
        Command::Books(args) => (Category::Books, args),
    };

    match run(category, args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
