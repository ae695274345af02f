use crate::commands::{run_extract, run_harvest};
use clap::{Args, Parser, Subcommand};
use job_feed::error::AppError;
use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(
    name = "job-feed",
    about = "Render a recruiting portal and republish its openings as an RSS feed",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the listing page and publish the feed (default command)
    Run(RunArgs),
    /// Publish a feed from listing HTML saved earlier, without a browser
    Extract(ExtractArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Override the configured listing page URL
    #[arg(long, value_parser = parse_url)]
    pub(crate) url: Option<Url>,
    /// Override the configured feed output path
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Override the configured render timeout, in seconds
    #[arg(long)]
    pub(crate) timeout_secs: Option<u64>,
    /// Save the rendered listing page to this path
    #[arg(long)]
    pub(crate) dump_html: Option<PathBuf>,
    /// Skip opening detail pages for placeholder titles
    #[arg(long)]
    pub(crate) no_detail_lookup: bool,
    /// Print the run summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ExtractArgs {
    /// Rendered listing page to read
    #[arg(long)]
    pub(crate) html: PathBuf,
    /// Override the configured feed output path
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Print the run summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Run(RunArgs::default()));

    match command {
        Command::Run(args) => run_harvest(args),
        Command::Extract(args) => run_extract(args),
    }
}

fn parse_url(raw: &str) -> Result<Url, String> {
    Url::parse(raw.trim()).map_err(|err| format!("failed to parse '{raw}' as an absolute URL ({err})"))
}
