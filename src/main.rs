//! signatory-feed - browse the Reactive Manifesto signatories from a terminal

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signatory_feed::{
    config::{Args, Command},
    ClientConfig, Enricher, FeedController, FeedHandle, FeedSnapshot, ManifestoApi,
    ReqwestTransport, SessionController, View,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("signatory_feed={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match args.client_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    info!("Manifesto: {}", config.base_url);

    let api = ManifestoApi::new(ReqwestTransport::new(config.timeout())?, &config.base_url);
    let (feed, task) = FeedController::spawn(
        api.clone(),
        Enricher::new(config.version_schedule()),
        config.controller(),
    );

    match &args.command {
        Command::Total => {
            feed.refresh_total().await?;
            let snapshot = settle(&feed).await?;
            println!("{}", snapshot.total.unwrap_or_default());
        }
        Command::List { full } => {
            let view = if *full { View::FullList } else { View::Home };
            feed.initial_load(view).await?;
            print_roster(&settle(&feed).await?);
        }
        Command::Search { term } => {
            feed.set_term(term.as_str()).await?;
            print_roster(&settle(&feed).await?);
        }
        Command::Pages { count } => run_pages(&feed, &config, *count).await?,
        Command::Whoami => {
            let session = SessionController::new(api, feed.clone());
            match session.refresh_user().await? {
                Some(user) => println!(
                    "{} ({})",
                    user.identity.display_name(),
                    if user.has_signed() { "signed" } else { "not signed" }
                ),
                None => println!("not logged in"),
            }
        }
    }

    drop(feed);
    task.await?;
    Ok(())
}

async fn run_pages(feed: &FeedHandle, config: &ClientConfig, count: u32) -> anyhow::Result<()> {
    feed.refresh(config.default_page_size).await?;
    let mut snapshot = settle(feed).await?;

    for _ in 0..count {
        if !snapshot.has_more() {
            break;
        }
        feed.fetch_more().await?;
        snapshot = settle(feed).await?;
    }

    print_roster(&snapshot);
    Ok(())
}

async fn settle(feed: &FeedHandle) -> anyhow::Result<FeedSnapshot> {
    let snapshot = feed.settled().await?;
    if let Some(e) = &snapshot.last_error {
        anyhow::bail!("request failed: {}", e);
    }
    Ok(snapshot)
}

fn print_roster(snapshot: &FeedSnapshot) {
    for record in snapshot.roster.iter() {
        println!(
            "{:<32} {:<16} v{}",
            record.identity.display_name(),
            record.display_age,
            record.document_version.label
        );
    }
    if let Some(total) = snapshot.total {
        println!("{} of {} signatories", snapshot.roster.len(), total);
    } else {
        println!("{} signatories", snapshot.roster.len());
    }
    if snapshot.has_more() {
        println!("(more available)");
    }
}
