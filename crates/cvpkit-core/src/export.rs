// ── Configlet builder export ──
//
// CVP exports configlet builders as a zip holding one JSON data file.
// Each builder's main script is written out as a standalone file named
// after the builder.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::CoreError;

const DATA_FILE_PREFIX: &str = "configletDataFile";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderScript {
    pub name: String,
    pub main_script: String,
}

#[derive(Deserialize)]
struct ExportFile {
    data: ExportData,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportData {
    #[serde(default)]
    configlet_builder: Vec<RawBuilder>,
}

#[derive(Deserialize)]
struct RawBuilder {
    name: String,
    main_script: MainScript,
}

/// Older exports inline the script, newer ones wrap it in `{"data": ...}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum MainScript {
    Inline(String),
    Wrapped { data: String },
}

impl From<MainScript> for String {
    fn from(script: MainScript) -> Self {
        match script {
            MainScript::Inline(s) | MainScript::Wrapped { data: s } => s,
        }
    }
}

fn extract_err(e: impl std::fmt::Display) -> CoreError {
    CoreError::ExtractFile {
        message: e.to_string(),
    }
}

/// Read every builder's main script out of an export zip.
pub fn read_export(zip_path: &Path) -> Result<Vec<BuilderScript>, CoreError> {
    let file = File::open(zip_path).map_err(|e| CoreError::io(zip_path, e))?;
    let mut archive = ZipArchive::new(file).map_err(extract_err)?;

    let member = archive
        .file_names()
        .find(|name| name.starts_with(DATA_FILE_PREFIX))
        .map(str::to_owned)
        .ok_or_else(|| CoreError::ExtractFile {
            message: format!("no {DATA_FILE_PREFIX} in {}", zip_path.display()),
        })?;
    debug!(%member, "reading configlet data file");

    let mut json = String::new();
    archive
        .by_name(&member)
        .map_err(extract_err)?
        .read_to_string(&mut json)
        .map_err(extract_err)?;

    let export: ExportFile = serde_json::from_str(&json).map_err(extract_err)?;
    Ok(export
        .data
        .configlet_builder
        .into_iter()
        .map(|b| BuilderScript {
            name: b.name,
            main_script: b.main_script.into(),
        })
        .collect())
}

/// What to do when a script file already exists.
pub enum Overwrite<'a> {
    Always,
    /// Ask; `false` stops the whole export.
    Ask(&'a mut dyn FnMut(&Path) -> bool),
}

/// A builder name must be a single plain file name so the script lands
/// directly inside the output directory.
fn script_file_name(name: &str) -> Result<&Path, CoreError> {
    let path = Path::new(name);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(path),
        _ => Err(CoreError::ValidationFailed {
            message: format!("builder name {name:?} is not a plain file name"),
        }),
    }
}

/// Write each script to `out_dir/{name}`. Returns the files written.
/// A refused overwrite stops the export; files written so far stay.
/// Names are checked before anything is written.
pub fn write_scripts(
    scripts: &[BuilderScript],
    out_dir: &Path,
    mut overwrite: Overwrite<'_>,
) -> Result<Vec<PathBuf>, CoreError> {
    let targets = scripts
        .iter()
        .map(|script| script_file_name(&script.name).map(|name| out_dir.join(name)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut written = Vec::new();
    for (script, target) in scripts.iter().zip(targets) {
        if target.is_file() {
            if let Overwrite::Ask(confirm) = &mut overwrite {
                if !confirm(&target) {
                    info!(file = %target.display(), "overwrite declined, stopping");
                    break;
                }
            }
        }
        fs::write(&target, &script.main_script).map_err(|e| CoreError::io(&target, e))?;
        info!(file = %target.display(), "created file");
        written.push(target);
    }
    Ok(written)
}

/// [`read_export`] then [`write_scripts`].
pub fn parse_export(
    zip_path: &Path,
    out_dir: &Path,
    overwrite: Overwrite<'_>,
) -> Result<Vec<PathBuf>, CoreError> {
    let scripts = read_export(zip_path)?;
    write_scripts(&scripts, out_dir, overwrite)
}
