use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::config::LoggingConfig;

pub fn ensure_log_dir(cfg: &LoggingConfig) -> Result<Option<PathBuf>> {
    cfg.logs_dir.as_deref().map(ensure_dir).transpose()
}

fn ensure_dir(path: &str) -> Result<PathBuf> {
    let dir = PathBuf::from(path);
    if !dir.exists() {
        fs::create_dir_all(&dir).with_context(|| format!("failed to create directory {}", path))?;
    }
    probe_writable(&dir)?;
    Ok(dir.canonicalize().unwrap_or(dir))
}

fn probe_writable(dir: &Path) -> Result<()> {
    let probe_file = dir.join(".write-test");
    fs::write(&probe_file, b"ok")
        .with_context(|| format!("directory {} is not writable", dir.display()))?;
    fs::remove_file(&probe_file)?;
    Ok(())
}
