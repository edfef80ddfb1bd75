use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Settings;

#[derive(Parser, Debug)]
#[command(name = "svnindex", version, about = "Crawl a Subversion repository into a searchable index")]
pub struct Cli {
    /// Log debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the repository at a revision and rebuild the index
    Crawl(CrawlArgs),

    /// Unique file names containing QUERY
    Search {
        #[command(flatten)]
        db: DbArg,
        query: String,
    },

    /// Every location of a file name, as a folder tree
    Locate {
        #[command(flatten)]
        db: DbArg,
        name: String,
    },

    /// Children of a node (top level when ID is omitted)
    Ls {
        #[command(flatten)]
        db: DbArg,
        id: Option<u64>,
    },

    /// What the index holds and how its last crawl ended
    Info {
        #[command(flatten)]
        db: DbArg,
    },
}

#[derive(Args, Debug)]
pub struct DbArg {
    /// Index database (defaults to the platform cache directory)
    #[arg(long = "db", value_name = "FILE")]
    pub path: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Repository URL; must contain the root marker as a path segment
    pub url: String,

    /// Revision to crawl
    #[arg(short, long = "rev", default_value = "HEAD")]
    pub revision: String,

    #[command(flatten)]
    pub db: DbArg,

    /// Path segment where the repository root begins
    #[arg(long)]
    pub root_marker: Option<String>,

    /// Retries per directory on connection problems
    #[arg(long)]
    pub max_tries: Option<u32>,

    /// Depth from which directories are listed recursively
    #[arg(long)]
    pub max_level: Option<u32>,

    /// Seconds to wait between retries
    #[arg(long, value_name = "SECS")]
    pub retry_delay: Option<u64>,

    /// Subversion client executable
    #[arg(long, value_name = "PROGRAM")]
    pub svn: Option<String>,
}

impl CrawlArgs {
    /// Settings with the command line flags applied on top
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(marker) = &self.root_marker {
            settings.root_folder = marker.clone();
        }
        if let Some(max_tries) = self.max_tries {
            settings.max_tries = max_tries;
        }
        if let Some(max_level) = self.max_level {
            settings.max_level = max_level;
        }
        if let Some(delay) = self.retry_delay {
            settings.retry_delay_secs = delay;
        }
        if let Some(program) = &self.svn {
            settings.svn_program = program.clone();
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_flags_override_settings() {
        let cli = Cli::parse_from([
            "svnindex",
            "crawl",
            "https://host/repo/",
            "--rev",
            "12",
            "--max-level",
            "2",
            "--root-marker",
            "svn",
        ]);
        let Command::Crawl(args) = cli.command else {
            panic!("expected crawl");
        };
        assert_eq!(args.revision, "12");

        let settings = args.apply(Settings::default());
        assert_eq!(settings.max_level, 2);
        assert_eq!(settings.root_folder, "svn");
        assert_eq!(settings.max_tries, 1000);
    }

    #[test]
    fn test_ls_without_id() {
        let cli = Cli::parse_from(["svnindex", "ls", "--db", "index.db"]);
        match cli.command {
            Command::Ls { db, id } => {
                assert_eq!(db.path, Some(PathBuf::from("index.db")));
                assert_eq!(id, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
