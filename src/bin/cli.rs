//! kemono-mirror CLI
//!
//! Mirrors favorites or looked-up creators into the local `Creators/` tree.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgGroup, Parser};
use kemono_mirror::{
    error::Result,
    models::{Config, Site},
    pipeline::{self, Mirror},
    services::{CreatorDirectory, TerminalProgress},
    storage::{FavoritesCache, FileErrorLog},
    utils::http,
};

/// Kemono/Coomer post mirror
#[derive(Parser, Debug)]
#[command(name = "kemono-mirror", version, about = "Mirror Kemono and Coomer posts")]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["kemono", "coomer", "both", "user", "file"]),
))]
struct Cli {
    /// Mirror Kemono favorites
    #[arg(short, long)]
    kemono: bool,

    /// Mirror Coomer favorites
    #[arg(short, long)]
    coomer: bool,

    /// Mirror favorites of both sites
    #[arg(short, long)]
    both: bool,

    /// Mirror the creator with this username
    #[arg(short, long, value_name = "NAME")]
    user: Option<String>,

    /// Mirror every username listed in this file, one per line
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Delete the cached favorites of the selected site(s) and exit
    #[arg(short, long)]
    reset: bool,

    /// Path to the configuration file
    #[arg(long, default_value = "Config/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Sites selected by the favorites flags.
    fn sites(&self) -> Vec<Site> {
        if self.both {
            Site::ALL.to_vec()
        } else if self.kemono {
            vec![Site::Kemono]
        } else if self.coomer {
            vec![Site::Coomer]
        } else {
            Vec::new()
        }
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    config.validate()?;
    let config = Arc::new(config);

    let favorites = FavoritesCache::new(&config.paths.config_dir, config.sites.clone());

    if cli.reset {
        let sites = cli.sites();
        if sites.is_empty() {
            log::warn!("--reset needs -k, -c or -b");
        }
        for site in sites {
            favorites.reset(site).await?;
        }
        return Ok(());
    }

    let client = http::create_client(&config.fetch)?;
    let errors = Arc::new(FileErrorLog::new(&config.paths.error_log));
    let mirror = Mirror::new(Arc::clone(&config), client, errors)
        .with_progress(Arc::new(TerminalProgress::new()));
    let creators = CreatorDirectory::new(mirror.fetcher(), config.sites.clone());

    let ok = if let Some(username) = &cli.user {
        pipeline::run_user(&mirror, &creators, username).await
    } else if let Some(path) = &cli.file {
        pipeline::run_user_file(&mirror, &creators, path).await?
    } else {
        pipeline::run_favorites(&mirror, &favorites, &cli.sites()).await
    };

    if !ok {
        log::error!("Mirroring finished with failures, see the log above");
    }
    Ok(())
}
