use std::{
    env,
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::info;
use tracing_subscriber::EnvFilter;

use repobird_tui::{
    RunForm, SessionOutcome, UiOptions,
    io::{
        CommandClipboard, FileConfigLoader, GitContext, JsonFormStore, JsonHashHistory,
        JsonRepositoryHistory,
    },
    services::{RepositoryHistory, Services, VcsContext},
};

mod remote;

use remote::HttpRunService;

const DEFAULT_API_URL: &str = "https://api.repobird.ai";

#[derive(Debug, Parser)]
#[command(
    name = "repobird",
    version,
    about = "Compose and submit RepoBird runs from the terminal"
)]
struct Cli {
    /// Base URL of the RepoBird API
    #[arg(long = "api-url", env = "REPOBIRD_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// API key sent as a bearer token
    #[arg(long = "api-key", env = "REPOBIRD_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Task file (JSON, YAML or TOML) to preload into the form
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for the saved form and submitted-file hashes
    #[arg(long = "cache-dir", value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Log file; defaults to repobird.log inside the cache directory
    #[arg(long = "log-file", value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Log filter such as "info" or "repobird_tui=debug"; RUST_LOG wins when set
    #[arg(long = "log-level", value_name = "FILTER", default_value = "info")]
    log_level: String,

    /// Keep the form open after a run is created
    #[arg(long = "stay")]
    stay: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let cache_dir = cli.cache_dir.clone().unwrap_or_else(default_cache_dir);
    fs::create_dir_all(&cache_dir)
        .wrap_err_with(|| format!("failed to create {}", cache_dir.display()))?;
    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| cache_dir.join("repobird.log"));
    init_file_logging(&log_file, &cli.log_level)?;

    let git = Arc::new(GitContext::new());
    let repository_history = Arc::new(JsonRepositoryHistory::new(&cache_dir));
    let known_repositories = repository_history.load();
    let services = Services {
        runs: Arc::new(HttpRunService::new(&cli.api_url, cli.api_key.clone())),
        vcs: git.clone(),
        form_store: Arc::new(JsonFormStore::new(&cache_dir)),
        hash_history: Arc::new(JsonHashHistory::new(&cache_dir)),
        repository_history,
        config_loader: Arc::new(FileConfigLoader::new()),
        clipboard: Arc::new(CommandClipboard::new()),
    };

    let mut options = UiOptions::default()
        .with_exit_on_success(!cli.stay)
        .with_repository_history(known_repositories);
    match git.current_repo_and_branch() {
        Ok((repo, _)) => options = options.with_detected_repository(repo),
        Err(err) => info!(error = %err, "no repository detected"),
    }

    let mut form = RunForm::new(services).with_options(options);
    if let Some(path) = &cli.config {
        form = form.with_initial_config(path);
    }
    let outcome = form
        .run()
        .map_err(|err| eyre!(err))
        .wrap_err("run form failed")?;
    if let SessionOutcome::Submitted(run) = outcome {
        println!("{}", run.id);
    }
    Ok(())
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("repobird")
}

fn init_file_logging(path: &Path, level: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
