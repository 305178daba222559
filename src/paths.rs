//! Where glvar keeps `glvar.toml` and `state.toml`
//!
//! Lookup order for each directory: the `GLVAR_*_DIR` override, then
//! `$XDG_*_HOME/glvar`, then the dotted directory under home. An explicit
//! `--config` / `--state` path skips the lookup entirely.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "glvar.toml";
pub const STATE_FILE: &str = "state.toml";

/// One of glvar's two directories.
struct Location {
    override_var: &'static str,
    xdg_var: &'static str,
    under_home: &'static [&'static str],
}

const CONFIG: Location = Location {
    override_var: "GLVAR_CONFIG_DIR",
    xdg_var: "XDG_CONFIG_HOME",
    under_home: &[".config", "glvar"],
};

const STATE: Location = Location {
    override_var: "GLVAR_STATE_DIR",
    xdg_var: "XDG_STATE_HOME",
    under_home: &[".local", "state", "glvar"],
};

impl Location {
    fn resolve(
        &self,
        var: impl Fn(&str) -> Option<String>,
        home: Option<PathBuf>,
    ) -> Result<PathBuf> {
        if let Some(dir) = var(self.override_var) {
            log::debug!("{} set, using {dir}", self.override_var);
            return Ok(expand(&dir));
        }
        if let Some(base) = var(self.xdg_var) {
            return Ok(PathBuf::from(base).join("glvar"));
        }
        let home = home.context("Could not determine home directory")?;
        Ok(self.under_home.iter().fold(home, |path, part| path.join(part)))
    }

    fn lookup(&self) -> Result<PathBuf> {
        self.resolve(|name| std::env::var(name).ok(), dirs::home_dir())
    }
}

/// Config file: the explicit path if given, else `<config dir>/glvar.toml`.
pub fn config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(expand(&path.to_string_lossy())),
        None => Ok(CONFIG.lookup()?.join(CONFIG_FILE)),
    }
}

/// State file: the explicit path if given, else `<state dir>/state.toml`.
pub fn state_file(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(expand(&path.to_string_lossy())),
        None => Ok(STATE.lookup()?.join(STATE_FILE)),
    }
}

/// Expand `~` and `$VARS`; an unexpandable path is used as written.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}
