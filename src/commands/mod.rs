//! Command handlers
//!
//! Each command opens a [`Session`] (config, client, state), does its work
//! and saves state when it changed anything.

pub mod lifecycle;
pub mod state;

use anyhow::{Context as _, Result};
use declarative::{Address, ExecutionPlan, Provider};
use gitlab::Client;
use std::path::PathBuf;

use crate::Context;
use crate::config::Config;
use crate::state::StateFile;
use crate::{paths, progress, resource, ui};

/// Everything a command needs: configuration, a client and the state file.
pub struct Session {
    pub config: Config,
    pub provider: Provider<Client>,
    pub state: StateFile,
    state_path: PathBuf,
}

impl Session {
    /// Open a session from the paths in `ctx`.
    ///
    /// With `require_config`, a missing config file is an error; otherwise
    /// connection settings fall back to defaults and the environment.
    pub fn open(ctx: &Context, require_config: bool) -> Result<Self> {
        let config_path = paths::config_file(ctx.config.as_deref())?;
        let config = if require_config {
            Config::load(&config_path)?
        } else {
            Config::load_or_default(&config_path)?
        };

        let client =
            Client::new(&config.client_config()).context("Failed to set up GitLab client")?;
        let state_path = paths::state_file(ctx.state.as_deref())?;
        Self::new(config, client, state_path)
    }

    pub fn new(config: Config, client: Client, state_path: PathBuf) -> Result<Self> {
        let state = StateFile::load(&state_path)?;
        Ok(Self {
            config,
            provider: resource::provider(client),
            state,
            state_path,
        })
    }

    /// Re-read every instance in state; vanished instances are dropped.
    pub fn refresh(&mut self, quiet: bool) -> Result<Vec<Address>> {
        if self.state.resources.is_empty() {
            return Ok(Vec::new());
        }

        let spinner = progress::spinner(
            &format!(
                "Refreshing {}...",
                ui::count(self.state.resources.len(), "instance")
            ),
            quiet,
        );
        let report = declarative::refresh_all(&self.provider, &self.state.resources);
        spinner.finish_and_clear();
        let report = report?;

        for address in &report.vanished {
            ui::warn(&format!(
                "{address} no longer exists in GitLab; removed from state"
            ));
        }
        self.state.resources = report.state;
        Ok(report.vanished)
    }

    /// Refresh, then plan the configured instances against state.
    pub fn plan(&mut self, target: Option<&str>, quiet: bool) -> Result<ExecutionPlan> {
        let desired = self.config.desired()?;
        self.refresh(quiet)?;
        let plan = ExecutionPlan::build(&self.provider, &desired, &self.state.resources)?;
        Ok(plan.filter_by_target(target))
    }

    pub fn save(&mut self) -> Result<()> {
        self.state.save(&self.state_path)
    }
}

/// Parse a `<type>.<name>` address from the command line.
pub fn parse_address(address: &str) -> Result<Address> {
    Ok(address.parse::<Address>()?)
}
