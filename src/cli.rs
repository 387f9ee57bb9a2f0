use crate::config::{Placeholders, SearchConfig};
use crate::dom::{HeadingLevel, Node};
use crate::error::Result;
use crate::fetch::{Fetcher, FileFetcher, HttpFetcher, SearchIndexClient};
use crate::render::{
    Breakpoint, OptimizedPictures, RenderGeneration, ResultRenderer, ResultsContainer,
};
use crate::search::{Query, rank};
use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "blog-search")]
#[command(about = "Search a blog's query index from the command line", long_about = None)]
pub struct Cli {
    /// Log pipeline progress at DEBUG level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank index entries against a query and print the rendered results
    Query(QueryArgs),
}

#[derive(Debug, Clone, clap::Args)]
pub struct QueryArgs {
    pub text: String,
    /// Index URL, site-relative path (needs a base URL), or local JSON file
    #[arg(short, long)]
    pub source: Option<String>,
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Placeholders sheet (URL or local JSON file) for localized UI strings
    #[arg(long)]
    pub placeholders: Option<String>,
    /// Heading level for result titles, e.g. "H3"
    #[arg(long, value_parser = parse_heading)]
    pub heading: Option<HeadingLevel>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Html)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Html,
    Text,
}

fn parse_heading(raw: &str) -> std::result::Result<HeadingLevel, String> {
    HeadingLevel::from_tag(raw)
        .or_else(|| raw.parse().ok().and_then(HeadingLevel::new))
        .ok_or_else(|| format!("'{}' is not a heading level between H1 and H6", raw))
}

/// Pick a fetcher for `source`: HTTP for URLs and site-relative paths under a base URL,
/// the local filesystem otherwise. Returns the fetcher and the source name to request.
pub fn fetcher_for(source: &str, config: &SearchConfig) -> Result<(Arc<dyn Fetcher>, String)> {
    let base_url = config.base_url()?;
    let is_remote = source.starts_with("http://") || source.starts_with("https://");
    if is_remote || (base_url.is_some() && !Path::new(source).is_file()) {
        return Ok((Arc::new(HttpFetcher::new(base_url)), source.to_string()));
    }

    let path = Path::new(source);
    let root = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .with_context(|| format!("'{}' does not name a file", source))?;
    Ok((
        Arc::new(FileFetcher::new(root)),
        name.to_string_lossy().into_owned(),
    ))
}

/// Run one query end to end and return the printable output.
pub async fn execute_query(args: &QueryArgs) -> Result<String> {
    let mut config = match &args.config {
        Some(path) => SearchConfig::load(path)?,
        None => SearchConfig::default(),
    };
    if let Some(sheet) = &args.placeholders {
        let (fetcher, sheet) = fetcher_for(sheet, &config)?;
        config.placeholders = Placeholders::fetch(fetcher.as_ref(), &sheet).await;
    }
    let source = args.source.clone().unwrap_or_else(|| config.source.clone());
    let (fetcher, source) = fetcher_for(&source, &config)?;
    execute_query_with(args, &config, fetcher, &source).await
}

/// Run one query against an explicit fetcher.
pub async fn execute_query_with(
    args: &QueryArgs,
    config: &SearchConfig,
    fetcher: Arc<dyn Fetcher>,
    source: &str,
) -> Result<String> {
    let query = Query::parse_with_min_length(&args.text, config.min_term_length);
    if query.is_empty() {
        anyhow::bail!(
            "Query '{}' has no terms of at least {} characters",
            args.text,
            config.min_term_length
        );
    }

    let client = SearchIndexClient::new(fetcher, source);
    let entries = client.fetch().await.unwrap_or_default();
    let ranked = rank(query.terms(), &entries);
    tracing::info!("{} of {} entries match {:?}", ranked.len(), entries.len(), query.raw());

    if args.format == OutputFormat::Text {
        let mut out = String::new();
        for (i, entry) in ranked.iter().enumerate() {
            let _ = writeln!(out, "{:>3}. {}  {}", i + 1, entry.title, entry.path);
        }
        if ranked.is_empty() {
            out.push_str(config.placeholders.no_results());
            out.push('\n');
        }
        return Ok(out);
    }

    let heading = args.heading.unwrap_or_default();
    let container = ResultsContainer::shared(heading);
    let generation = RenderGeneration::new();
    let mut renderer = ResultRenderer::new(
        container.clone(),
        generation.clone(),
        config.placeholders.no_results(),
    )
    .with_breakpoints(vec![Breakpoint::width(config.image_width.clone())]);
    if config.optimize_images {
        renderer = renderer.with_pictures(Arc::new(OptimizedPictures::new(config.base_url()?)));
    }

    renderer
        .render(generation.advance(), &ranked, query.terms())
        .await;
    let html = Node::from(container.read().await.element().clone()).to_string();
    Ok(html + "\n")
}
