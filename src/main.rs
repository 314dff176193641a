mod classify;
mod config;
mod github;
mod readme;
mod render;

use std::collections::HashSet;
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

use classify::ClassifyRules;
use github::GitHubClient;

/// contrib-tracker — collects the merged pull requests a user authored in
/// other people's repositories, groups those repositories by topic, and
/// rewrites the contributions section of a profile README.
#[derive(Parser, Debug)]
#[command(name = "contrib-tracker", version, about)]
struct Cli {
    /// Path to the README containing the contribution markers
    #[arg(long, default_value = "README.md")]
    readme: PathBuf,

    /// GitHub login to collect merged PRs for (overrides the config file)
    #[arg(long)]
    user: Option<String>,

    /// Print the rendered markdown instead of patching the README
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // The tool runs from scheduled automation; a failed refresh must not
    // fail the hosting workflow, so errors become console text and the
    // process still exits 0.
    if let Err(err) = run(cli).await {
        println!("{} {}", "❌ Error:".red(), err);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::load()?;
    let user = config.username(cli.user.as_deref());
    let client = GitHubClient::new(config.github_token())?;

    let _run_span = info_span!("refresh", user = %user).entered();

    println!("Fetching merged PRs...");
    let prs = github::fetch_merged_prs(&client, &user).await?;
    println!("Found {} merged PRs", prs.len());

    let distinct: HashSet<&str> = prs.iter().map(|pr| pr.repository_url.as_str()).collect();
    println!("From {} unique repositories", distinct.len());

    let repos = github::resolve_repositories(&client, &prs).await?;
    debug!(repos = repos.len(), "resolved repository metadata");

    let rules = ClassifyRules::new();
    let grouped = classify::group_repositories(repos, &rules);
    for (category, bucket) in &grouped {
        if !bucket.is_empty() {
            println!("  {category}: {} repos", bucket.len());
        }
    }

    let mut markdown = render::contributions_markdown(&grouped, config.render.max_description);
    if markdown.trim().is_empty() {
        markdown = render::EMPTY_FALLBACK.to_string();
    }

    if cli.dry_run {
        info!("dry run, skipping README update");
        print!("{markdown}");
        return Ok(());
    }

    match readme::update(&cli.readme, &markdown) {
        Ok(()) => println!("{}", "✅ README updated successfully!".green()),
        Err(readme::ReadmeError::MarkerNotFound) => {
            println!("{}", "❌ Could not find markers in README".red());
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
