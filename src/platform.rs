use std::env;
use std::path::PathBuf;

use anyhow::{Result, bail};

fn dirs_home() -> Option<PathBuf> {
    env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| env::var("USERPROFILE").ok().map(PathBuf::from))
}

/// Get the data directory for kbv (database, config file)
pub fn data_dir() -> Result<PathBuf> {
    let dir = if let Ok(xdg) = env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg).join("kbv")
    } else if let Some(home) = dirs_home() {
        if cfg!(target_os = "macos") {
            home.join("Library").join("Application Support").join("kbv")
        } else if cfg!(target_os = "windows") {
            home.join("AppData").join("Roaming").join("kbv")
        } else {
            home.join(".local").join("share").join("kbv")
        }
    } else {
        bail!("Cannot determine data directory");
    };

    Ok(dir)
}
