use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Define CLI arguments
#[derive(Debug, Parser)]
#[command(
    version,
    about = "Offline-first site cache",
    long_about = "Runs the porchlight cache worker against a deployed site.\n\
                  \n\
                  Configuration is read from defaults, the TOML file named by PORCHLIGHT_CONFIG_FILE,\n\
                  then PORCHLIGHT_* environment variables. The flags below override the loaded values."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true, help = "Enable detailed debug logging")]
    pub verbose: bool,

    /// Override the cache database path
    #[arg(long, global = true, help = "Path to the SQLite cache database")]
    pub db: Option<PathBuf>,

    /// Override the worker scope
    #[arg(long, global = true, help = "Site scope URL, e.g. https://example.github.io/site/")]
    pub scope: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Precache critical pages and assets
    Install,

    /// Delete outdated buckets and enforce budgets
    Activate,

    /// Route a request through the worker
    Fetch {
        /// Absolute URL on the site origin, or path under the base path
        target: String,

        /// Issue the request as a page navigation
        #[arg(short, long)]
        navigate: bool,

        /// Print the response body
        #[arg(short, long)]
        body: bool,
    },

    /// Show bucket sizes and budgets
    Stats,

    /// Delete one bucket, or all buckets
    Purge {
        /// Full bucket name; all buckets when omitted
        #[arg(long)]
        bucket: Option<String>,
    },

    /// Render a page of a feed carousel as HTML
    Feed {
        #[arg(value_enum)]
        kind: FeedArg,

        /// Zero-based carousel page
        #[arg(short, long, default_value_t = 0)]
        page: usize,

        /// Cards per page
        #[arg(long, default_value_t = 3)]
        per_page: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FeedArg {
    Reviews,
    Posts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch() {
        let args = CliArgs::parse_from(["porchlight", "fetch", "about.html", "--navigate", "-v"]);
        assert!(args.verbose);
        match args.command {
            Command::Fetch { target, navigate, body } => {
                assert_eq!(target, "about.html");
                assert!(navigate);
                assert!(!body);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_feed_defaults() {
        let args = CliArgs::parse_from(["porchlight", "feed", "posts"]);
        match args.command {
            Command::Feed { kind, page, per_page } => {
                assert_eq!(kind, FeedArg::Posts);
                assert_eq!(page, 0);
                assert_eq!(per_page, 3);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_purge_and_overrides() {
        let args =
            CliArgs::parse_from(["porchlight", "purge", "--bucket", "porchlight-html-v1", "--db", "/tmp/c.sqlite"]);
        assert_eq!(args.db, Some(PathBuf::from("/tmp/c.sqlite")));
        assert!(matches!(args.command, Command::Purge { bucket: Some(ref b) } if b == "porchlight-html-v1"));
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        CliArgs::command().debug_assert();
    }
}
