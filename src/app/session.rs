use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::runtime::{Builder, Handle};
use tracing::info;

use crate::{domain::Run, services::Services};

use super::{options::UiOptions, runtime::App};

/// How an interactive session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A run was created and the session was configured to exit on success.
    Submitted(Run),
    /// The user left through the Back action.
    Back,
    /// Force-quit.
    Quit,
}

/// Entry point for the interactive run form.
///
/// Must be called from synchronous code: the event loop blocks its thread.
/// When no tokio runtime is active, one is started for the background work
/// and shut down when the session ends.
#[derive(Debug)]
pub struct RunForm {
    services: Services,
    options: UiOptions,
    initial_config: Option<PathBuf>,
}

impl RunForm {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            options: UiOptions::default(),
            initial_config: None,
        }
    }

    pub fn with_options(mut self, options: UiOptions) -> Self {
        self.options = options;
        self
    }

    /// Preload a task file as if it had been picked in the file browser.
    pub fn with_initial_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.initial_config = Some(path.into());
        self
    }

    pub fn run(self) -> Result<SessionOutcome> {
        let RunForm {
            services,
            options,
            initial_config,
        } = self;

        let (owned_runtime, handle) = match Handle::try_current() {
            Ok(handle) => (None, handle),
            Err(_) => {
                let runtime = Builder::new_multi_thread()
                    .enable_all()
                    .thread_name("repobird-worker")
                    .build()
                    .context("failed to start async runtime")?;
                let handle = runtime.handle().clone();
                (Some(runtime), handle)
            }
        };

        let mut app = App::new(services, options, handle);
        if let Some(path) = initial_config {
            app.load_config(path);
        }
        let outcome = app.run();
        drop(app);
        if let Some(runtime) = owned_runtime {
            runtime.shutdown_background();
        }
        if let Ok(outcome) = &outcome {
            info!(?outcome, "session finished");
        }
        outcome
    }
}
