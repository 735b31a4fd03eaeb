//! go2web CLI - fetch a URL or search the web from the terminal

use clap::{ArgGroup, Parser};
use go2web::search::{self, MAX_RESULTS};
use go2web::{html_to_text, is_html, to_pretty_json, FetchRequest, Fetcher, SearchResult};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// go2web - Simple HTTP client
#[derive(Parser, Debug)]
#[command(name = "go2web")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("mode").required(true).args(["url", "search"])))]
struct Cli {
    /// Fetch and display content from URL
    #[arg(short = 'u', value_name = "URL")]
    url: Option<String>,

    /// Search the web and show the top 10 results
    #[arg(short = 's', value_name = "SEARCH_TERM", num_args = 1..)]
    search: Option<Vec<String>>,

    /// Negotiate and print JSON
    #[arg(long)]
    json: bool,

    /// Bypass the response cache
    #[arg(long)]
    no_cache: bool,

    /// Cache directory
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Seconds a cached response stays fresh
    #[arg(long, value_name = "SECS")]
    max_age: Option<u64>,

    /// Connect and read timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Log request details to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let fetcher = build_fetcher(&cli);

    if let Some(url) = cli.url.as_deref() {
        run_fetch(&fetcher, url, cli.json, !cli.no_cache).await;
    } else if let Some(terms) = cli.search.as_ref() {
        run_search(&fetcher, &terms.join(" "), cli.json, !cli.no_cache).await;
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "go2web=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn build_fetcher(cli: &Cli) -> Fetcher {
    let mut builder = Fetcher::builder();
    if let Some(dir) = &cli.cache_dir {
        builder = builder.cache_dir(dir.clone());
    }
    if let Some(secs) = cli.max_age {
        builder = builder.max_age(Duration::from_secs(secs));
    }
    if let Some(secs) = cli.timeout {
        builder = builder
            .connect_timeout(Duration::from_secs(secs))
            .read_timeout(Duration::from_secs(secs));
    }
    builder.build()
}

async fn run_fetch(fetcher: &Fetcher, url: &str, json: bool, use_cache: bool) {
    let mut request = FetchRequest::new(url).use_cache(use_cache);
    if json {
        request = request.json();
    }

    let body = match fetcher.fetch(&request).await {
        Ok(body) => body,
        Err(e) => fail(&e.to_string()),
    };

    match render_page(&body, json) {
        Ok(output) => writeln_safe(&output),
        Err(e) => fail(&e),
    }
}

async fn run_search(fetcher: &Fetcher, terms: &str, json: bool, use_cache: bool) {
    match search::search(fetcher, terms, use_cache).await {
        Ok(results) => writeln_safe(&render_results(&results, json)),
        Err(e) => fail(&e.to_string()),
    }
}

/// Render a fetched body for the terminal
///
/// JSON mode parses strictly; otherwise HTML is reduced to text and
/// anything else is printed as received.
fn render_page(body: &str, json: bool) -> Result<String, String> {
    if json {
        let value: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| format!("Response is not valid JSON: {}", e))?;
        return to_pretty_json(&value).map_err(|e| format!("Error serializing response: {}", e));
    }

    if is_html(body) {
        Ok(html_to_text(body))
    } else {
        Ok(body.to_string())
    }
}

/// Render search results as numbered text blocks or a JSON array
fn render_results(results: &[SearchResult], json: bool) -> String {
    if json {
        return to_pretty_json(results).unwrap_or_else(|_| "[]".to_string());
    }

    if results.is_empty() {
        return "No results found.".to_string();
    }

    results
        .iter()
        .take(MAX_RESULTS)
        .map(|r| format!("{}. {}\n   {}\n", r.index, r.title, r.url))
        .collect::<Vec<_>>()
        .join("\n")
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}
