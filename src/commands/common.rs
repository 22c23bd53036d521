use anyhow::{anyhow, bail, Context, Result};
use log::info;
use std::path::Path;
use structopt::StructOpt;
use varexp_lib::core::prelude::configure_global_thread_pool;
use varexp_lib::store::MatrixStore;

use super::STORE_EXTENSION;

/// Options shared by every subcommand.
#[derive(StructOpt, Debug, Clone)]
pub struct CommonArgs {
    #[structopt(short, long, default_value = "2", help = "Number of threads to use")]
    pub threads: usize,

    #[structopt(long, short = "v", help = "Verbose (debug) logging")]
    pub verbose: bool,
}

impl CommonArgs {
    /// Configure the rayon pool for this invocation.
    pub fn apply(&self) -> Result<()> {
        let active = configure_global_thread_pool(self.threads)?;
        info!("Rayon thread pool configured with {} threads", active);
        Ok(())
    }
}

/// Fail unless `path` exists.
pub fn require_input(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("Input file not found: {}", path.display());
    }
    Ok(())
}

/// Fail unless `path` ends with the store extension.
pub fn require_store_extension(path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext == STORE_EXTENSION => Ok(()),
        _ => bail!(
            "Store path {} must have a .{} extension",
            path.display(),
            STORE_EXTENSION
        ),
    }
}

pub fn load_store(path: &Path) -> Result<MatrixStore> {
    MatrixStore::load(path).with_context(|| format!("Failed to read store {}", path.display()))
}

pub fn save_store(store: &MatrixStore, path: &Path) -> Result<()> {
    store
        .save(path)
        .with_context(|| format!("Failed to write store {}", path.display()))
}

/// Parse a comma-separated list of 0-based positions, e.g. `6,25`.
pub fn parse_positions(list: &str) -> Result<Vec<usize>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .with_context(|| format!("Invalid position '{}' in '{}'", s, list))
        })
        .collect()
}

/// Split a `NAME=VALUE` argument.
pub fn parse_assignment(arg: &str) -> Result<(String, String)> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected NAME=VALUE, got '{}'", arg))?;
    if name.trim().is_empty() {
        bail!("Empty name in '{}'", arg);
    }
    Ok((name.trim().to_string(), value.trim().to_string()))
}
