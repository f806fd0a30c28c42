use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$SITEBOOKS_HOME`, or `~/.sitebooks`
pub fn sitebooks_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SITEBOOKS_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".sitebooks"))
}

pub fn ensure_sitebooks_home() -> Result<PathBuf> {
    let dir = sitebooks_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
