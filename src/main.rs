use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use svnindex::cli::{Cli, Command, CrawlArgs, DbArg};
use svnindex::config::{CrawlConfig, Settings};
use svnindex::logging;
use svnindex::model::{FileLocation, PathTree};
use svnindex::repository::crawler::{ProgressReporter, SpinnerProgress};
use svnindex::repository::{spawn_crawl, CrawlOutcome, Crawler, Database, SvnCli};
use svnindex::util::{format_count, format_timestamp, natural_sort};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    match cli.command {
        Command::Crawl(args) => run_crawl(args, settings, !cli.quiet).await,
        Command::Search { db, query } => {
            let db = open_db(&db).await?;
            let mut names: Vec<String> = db
                .search_files(&query)
                .await?
                .into_iter()
                .map(|node| node.name)
                .collect();
            names.sort_unstable();
            names.dedup();
            natural_sort(&mut names);
            for name in &names {
                println!("{name}");
            }
            eprintln!("{} matching file names", format_count(names.len() as u64));
            Ok(ExitCode::SUCCESS)
        }
        Command::Locate { db, name } => {
            let db = open_db(&db).await?;
            let mut locations = Vec::new();
            for node in db.nodes_named(&name).await? {
                locations.push(FileLocation {
                    id: node.id,
                    path: db.path_of(node.id).await?,
                });
            }

            let mut tree = PathTree::new("");
            for location in &locations {
                let parts: Vec<&str> = location.path.split('/').collect();
                tree.add_path(&parts);
            }
            for line in tree.render() {
                println!("{line}");
            }
            eprintln!("{} locations", format_count(tree.leaf_count() as u64));
            Ok(ExitCode::SUCCESS)
        }
        Command::Ls { db, id } => {
            let db = open_db(&db).await?;
            let children = match id {
                Some(id) => db.children_of(id as i64).await?,
                None => db.roots().await?,
            };
            for node in children {
                let more = if !node.is_file && db.has_children(node.id).await? {
                    " +"
                } else {
                    ""
                };
                println!("{:>10}  {}{}", node.id, node.display_name(), more);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Info { db } => {
            let db = open_db(&db).await?;
            match db.crawl_info().await {
                Some(info) => {
                    let status = db
                        .crawl_status()
                        .await
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    println!("Repository: {}", info.repository_url);
                    println!("Revision:   {}", info.revision);
                    println!("Root:       {}", info.root_marker);
                    println!("Status:     {}", status);
                    println!("Started:    {}", format_timestamp(info.started_at));
                    println!("Nodes:      {}", format_count(db.node_count().await?));
                }
                None => println!("The index is empty; run a crawl first."),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_crawl(args: CrawlArgs, settings: Settings, show_progress: bool) -> Result<ExitCode> {
    let settings = args.apply(settings);
    let config = CrawlConfig::new(&args.url, &args.revision, &settings);
    // Fail before touching the index
    config.validate()?;

    let db = Arc::new(open_db(&args.db).await?);
    let crawler = Crawler::new(SvnCli::new(settings.svn_program.clone()), config);
    let mut handle = spawn_crawl(crawler, Arc::clone(&db));
    let cancel = handle.cancel_token();

    let spinner = SpinnerProgress::new(show_progress);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(event) => spinner.report(event),
                None => break,
            },
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                eprintln!("Cancelling, waiting for the current directory to finish...");
                cancel.cancel();
            }
        }
    }

    // The spinner already reported the outcome
    Ok(match handle.join().await {
        Ok(CrawlOutcome::Finished(_)) => ExitCode::SUCCESS,
        Ok(CrawlOutcome::Cancelled(_)) => ExitCode::from(130),
        Err(e) => {
            tracing::debug!(class = ?e.class(), "crawl ended with error");
            ExitCode::FAILURE
        }
    })
}

/// Open (and if needed create) the index database
async fn open_db(arg: &DbArg) -> Result<Database> {
    let path = match &arg.path {
        Some(path) => path.clone(),
        None => default_db_path()?,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    tracing::debug!("Using index: {}", path.display());

    let path_str = path.to_str().context("Invalid path encoding")?;
    let db = Database::new(path_str).await?;
    db.init_schema().await?;
    Ok(db)
}

fn default_db_path() -> Result<PathBuf> {
    Ok(dirs::cache_dir()
        .context("Could not determine cache directory")?
        .join("svnindex")
        .join("index.db"))
}
