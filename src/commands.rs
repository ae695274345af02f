use crate::cli::{ExtractArgs, RunArgs};
use chrono::Utc;
use job_feed::config::AppConfig;
use job_feed::error::AppError;
use job_feed::render::{BrowserOptions, ChromiumRenderer};
use job_feed::telemetry;
use job_feed::workflows::{FeedHarvest, HarvestSummary};
use std::time::Duration;
use tracing::info;

pub(crate) fn run_harvest(args: RunArgs) -> Result<(), AppError> {
    let RunArgs {
        url,
        output,
        timeout_secs,
        dump_html,
        no_detail_lookup,
        json,
    } = args;

    let mut config = AppConfig::load()?;
    if let Some(url) = url {
        if config.feed.metadata.link == config.source.url {
            config.feed.metadata.link = url.clone();
        }
        config.source.url = url;
    }
    if let Some(output) = output {
        config.feed.output_path = output;
    }
    if let Some(secs) = timeout_secs {
        config.source.render_timeout = Duration::from_secs(secs);
    }
    if no_detail_lookup {
        config.source.detail_lookup = false;
    }

    telemetry::init(&config.telemetry)?;
    info!(
        environment = ?config.environment,
        url = %config.source.url,
        output = %config.feed.output_path.display(),
        "starting job feed harvest"
    );

    let harvest =
        FeedHarvest::new(&config.source, &config.feed)?.with_snapshot_path(dump_html);
    let renderer = ChromiumRenderer::launch(&BrowserOptions::from_source(&config.source))?;
    let outcome = harvest.run(&renderer, Utc::now());
    renderer.shutdown();

    report(&outcome?, json)
}

pub(crate) fn run_extract(args: ExtractArgs) -> Result<(), AppError> {
    let ExtractArgs { html, output, json } = args;

    let mut config = AppConfig::load()?;
    if let Some(output) = output {
        config.feed.output_path = output;
    }

    telemetry::init(&config.telemetry)?;
    info!(path = %html.display(), "publishing feed from saved page");

    let page = std::fs::read_to_string(&html)?;
    let summary = FeedHarvest::new(&config.source, &config.feed)?.run_from_html(&page, Utc::now())?;

    report(&summary, json)
}

fn report(summary: &HarvestSummary, json: bool) -> Result<(), AppError> {
    if json {
        let rendered = serde_json::to_string_pretty(summary).map_err(std::io::Error::from)?;
        println!("{rendered}");
        return Ok(());
    }

    println!("Job feed published");
    println!("Source: {}", summary.source);
    println!("Output: {}", summary.output_path.display());
    println!(
        "Cards: {} seen, {} published, {} skipped, {} duplicates, {} navigation links",
        summary.cards_seen,
        summary.published,
        summary.skipped,
        summary.duplicates,
        summary.navigation_filtered
    );
    if summary.detail_lookups > 0 {
        println!("Detail pages consulted: {}", summary.detail_lookups);
    }
    if summary.truncated {
        println!("Listing cap reached; later openings were not published");
    }

    if summary.postings.is_empty() {
        println!("\nOpenings: none");
    } else {
        println!("\nOpenings");
        for posting in &summary.postings {
            let location = posting
                .location
                .as_deref()
                .map(|location| format!(" ({location})"))
                .unwrap_or_default();
            println!("- {}{} | {}", posting.title, location, posting.url);
        }
    }

    Ok(())
}
