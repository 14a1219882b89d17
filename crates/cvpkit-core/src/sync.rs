// ── Git-to-CVP configlet sync ──
//
// Each regular file directly under the configlet directory is one
// configlet, named after the file. The repository is the source of
// truth: CVP copies that differ are overwritten.

use std::path::{Path, PathBuf};

use cvpkit_api::PortalClient;
use serde::Serialize;
use strum::Display;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::{ConnectionConfig, RetryPolicy};
use crate::error::CoreError;
use crate::session::Cvp;

/// Files never treated as configlets unless overridden.
pub const DEFAULT_IGNORE: &[&str] = &["readme.md"];

/// Where configlet files come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncSource {
    /// Shallow clone of `branch` into a temporary directory.
    Git { repo: String, branch: String },
    /// An existing checkout.
    Local(PathBuf),
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub source: SyncSource,
    /// Configlet directory, relative to the source root.
    pub configlet_path: PathBuf,
    /// File names to skip, compared case-insensitively.
    pub ignore: Vec<String>,
    pub dry_run: bool,
}

impl SyncOptions {
    pub fn new(source: SyncSource) -> Self {
        Self {
            source,
            configlet_path: PathBuf::new(),
            ignore: DEFAULT_IGNORE.iter().map(|s| (*s).to_owned()).collect(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SyncAction {
    Added,
    Updated,
    UpToDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub name: String,
    pub action: SyncAction,
    /// Nothing was changed on CVP.
    pub dry_run: bool,
}

/// A configlet read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigletFile {
    pub name: String,
    pub config: String,
}

/// A source tree on disk. Temporary clones are removed on drop.
pub struct Checkout {
    root: PathBuf,
    _temp: Option<TempDir>,
}

impl Checkout {
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Materialize `source` on disk.
pub async fn fetch(source: &SyncSource) -> Result<Checkout, CoreError> {
    match source {
        SyncSource::Local(path) => Ok(Checkout {
            root: path.clone(),
            _temp: None,
        }),
        SyncSource::Git { repo, branch } => {
            let temp = tempfile::tempdir().map_err(|e| CoreError::io("temporary directory", e))?;
            let root = temp.path().join("repo");
            info!(%repo, %branch, "cloning configlet repository");

            let output = Command::new("git")
                .args(["clone", "--quiet", "--depth", "1", "--branch", branch, repo])
                .arg(&root)
                .output()
                .await
                .map_err(|e| CoreError::Git {
                    message: format!("cannot run git: {e}"),
                })?;
            if !output.status.success() {
                return Err(CoreError::Git {
                    message: format!(
                        "clone of {repo} ({branch}) failed: {}",
                        String::from_utf8_lossy(&output.stderr).trim()
                    ),
                });
            }
            Ok(Checkout {
                root,
                _temp: Some(temp),
            })
        }
    }
}

/// Read configlet files from `dir`, skipping `ignore` and anything that
/// is not a regular file. Sorted by name.
pub async fn read_configlets(dir: &Path, ignore: &[String]) -> Result<Vec<ConfigletFile>, CoreError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| CoreError::io(dir, e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| CoreError::io(dir, e))? {
        let file_type = entry.file_type().await.map_err(|e| CoreError::io(entry.path(), e))?;
        if !file_type.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            debug!(path = %entry.path().display(), "skipping non UTF-8 file name");
            continue;
        };
        if ignore.iter().any(|i| i.eq_ignore_ascii_case(&name)) {
            debug!(%name, "ignored");
            continue;
        }
        let config = tokio::fs::read_to_string(entry.path())
            .await
            .map_err(|e| CoreError::io(entry.path(), e))?;
        files.push(ConfigletFile { name, config });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// Bring one configlet on CVP in line with `file`.
pub async fn sync_configlet(
    portal: &PortalClient,
    file: &ConfigletFile,
    dry_run: bool,
) -> Result<SyncOutcome, CoreError> {
    let action = match portal.get_configlet_by_name(&file.name).await {
        Ok(existing) if existing.config == file.config => SyncAction::UpToDate,
        Ok(existing) => {
            if !dry_run {
                portal
                    .update_configlet(&existing.key, &file.name, &file.config)
                    .await?;
            }
            SyncAction::Updated
        }
        Err(e) if e.is_not_found() => {
            if !dry_run {
                portal.add_configlet(&file.name, &file.config).await?;
            }
            SyncAction::Added
        }
        Err(e) => return Err(e.into()),
    };

    info!(name = %file.name, %action, dry_run, "configlet synced");
    Ok(SyncOutcome {
        name: file.name.clone(),
        action,
        dry_run,
    })
}

/// Sync every file in order, stopping at the first error.
pub async fn sync_all(
    portal: &PortalClient,
    files: &[ConfigletFile],
    dry_run: bool,
) -> Result<Vec<SyncOutcome>, CoreError> {
    let mut outcomes = Vec::with_capacity(files.len());
    for file in files {
        outcomes.push(sync_configlet(portal, file, dry_run).await?);
    }
    Ok(outcomes)
}

/// Connect (waiting for CVP if needed), fetch the sources, and sync.
pub async fn run(
    config: ConnectionConfig,
    retry: RetryPolicy,
    opts: &SyncOptions,
) -> Result<Vec<SyncOutcome>, CoreError> {
    let cvp = Cvp::connect_with_retry(config, retry).await?;

    let result = async {
        let checkout = fetch(&opts.source).await?;
        let dir = checkout.root().join(&opts.configlet_path);
        let files = read_configlets(&dir, &opts.ignore).await?;
        info!(count = files.len(), dir = %dir.display(), "configlet files found");
        sync_all(cvp.portal(), &files, opts.dry_run).await
    }
    .await;

    cvp.disconnect().await;
    result
}
