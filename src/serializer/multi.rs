//! Multi-file save
//!
//! Writes each physical file of a logical tree to its own output file. The
//! include directives stay in place, so the saved set has the same include
//! graph as the one that was loaded.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info, warn};

use super::XsdSerializer;
use crate::error::{Error, Result};
use crate::locations::normalize_lexically;
use crate::model::XsdTree;

/// File name used for a main file that was never saved
pub const UNSAVED_FILE_NAME: &str = "schema.xsd";

/// What to do with a file that is about to be overwritten
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackupPolicy {
    /// Overwrite in place
    #[default]
    None,
    /// Copy the old content to `<file><suffix>` first
    Suffix(String),
}

impl BackupPolicy {
    /// Suffix backups with `.bak`
    pub fn bak() -> Self {
        BackupPolicy::Suffix(".bak".to_string())
    }
}

/// Where and how to save
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Directory to save into; `None` writes every file back to where it was loaded from
    pub output_dir: Option<PathBuf>,
    pub backup: BackupPolicy,
}

impl SaveOptions {
    /// Save in place
    pub fn new() -> Self {
        Self::default()
    }

    /// Save into `dir`, keeping the relative layout of the included files
    pub fn into_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: Some(dir.into()),
            ..Default::default()
        }
    }

    pub fn with_backup(mut self, backup: BackupPolicy) -> Self {
        self.backup = backup;
        self
    }
}

/// Outcome of a save, per source file
#[derive(Debug, Default)]
pub struct SaveReport {
    /// Keyed by the file's original path; values are the written path or the failure
    pub files: IndexMap<PathBuf, Result<PathBuf>>,
}

impl SaveReport {
    /// Check that every file was written
    pub fn is_success(&self) -> bool {
        self.files.values().all(|r| r.is_ok())
    }

    /// Paths that were written
    pub fn succeeded(&self) -> Vec<&Path> {
        self.files
            .values()
            .filter_map(|r| r.as_ref().ok())
            .map(PathBuf::as_path)
            .collect()
    }

    /// Files that failed, with their error
    pub fn failed(&self) -> Vec<(&Path, &Error)> {
        self.files
            .iter()
            .filter_map(|(path, r)| r.as_ref().err().map(|e| (path.as_path(), e)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Saves a tree as the set of files it was loaded from
#[derive(Debug, Clone, Default)]
pub struct MultiFileSerializer {
    serializer: XsdSerializer,
}

impl MultiFileSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_serializer(serializer: XsdSerializer) -> Self {
        Self { serializer }
    }

    /// Text of every physical file, keyed by original path
    ///
    /// The main file comes first; an unsaved main file is keyed by
    /// [`UNSAVED_FILE_NAME`].
    pub fn render(&self, tree: &XsdTree) -> IndexMap<PathBuf, String> {
        let mut out = IndexMap::new();
        let main = main_key(tree);
        out.insert(main.clone(), self.serializer.serialize_main_file(tree));
        for file in tree.files().filter(|f| !f.is_main()) {
            if file.path == main || out.contains_key(&file.path) {
                continue;
            }
            out.insert(file.path.clone(), self.serializer.serialize_file(tree, &file.path));
        }
        out
    }

    /// Output path of every physical file, keyed by original path
    pub fn plan(&self, tree: &XsdTree, options: &SaveOptions) -> Result<IndexMap<PathBuf, PathBuf>> {
        let main = main_key(tree);
        let main_out = match (&options.output_dir, tree.main_file()) {
            (Some(dir), Some(path)) => dir.join(path.file_name().unwrap_or(path.as_os_str())),
            (Some(dir), None) => dir.join(UNSAVED_FILE_NAME),
            (None, Some(path)) => path.to_path_buf(),
            (None, None) => {
                return Err(Error::Serialize(
                    "schema was never saved and no output directory was given".to_string(),
                ))
            }
        };

        let mut plan = IndexMap::new();
        plan.insert(main.clone(), main_out.clone());
        for file in tree.files().filter(|f| !f.is_main()) {
            if plan.contains_key(&file.path) {
                continue;
            }
            let target = match &options.output_dir {
                None => file.path.clone(),
                Some(dir) => {
                    let location = file.declared_location.as_deref().map(Path::new);
                    let including = file
                        .included_from
                        .as_ref()
                        .and_then(|p| plan.get(p))
                        .unwrap_or(&main_out);
                    match (location, including.parent()) {
                        (Some(loc), Some(parent)) if loc.is_relative() => normalize_lexically(&parent.join(loc)),
                        _ => dir.join(file.path.file_name().unwrap_or(file.path.as_os_str())),
                    }
                }
            };
            plan.insert(file.path.clone(), target);
        }
        Ok(plan)
    }

    /// Write every physical file of the tree
    ///
    /// Fails only when no main output path can be determined. Per-file
    /// failures are reported in the [`SaveReport`] and do not stop the
    /// remaining files.
    pub fn save(&self, tree: &XsdTree, options: &SaveOptions) -> Result<SaveReport> {
        let plan = self.plan(tree, options)?;
        let texts = self.render(tree);
        let mut report = SaveReport::default();

        for (original, target) in plan {
            let result = match texts.get(&original) {
                Some(text) => write_file(&target, text, &options.backup).map(|_| target.clone()),
                None => Err(Error::Serialize(format!("nothing rendered for {}", original.display()))),
            };
            match &result {
                Ok(path) => debug!("wrote {}", path.display()),
                Err(e) => warn!("failed to save {}: {}", original.display(), e),
            }
            report.files.insert(original, result);
        }

        info!(
            "saved {} of {} schema files",
            report.succeeded().len(),
            report.len()
        );
        Ok(report)
    }
}

fn main_key(tree: &XsdTree) -> PathBuf {
    tree.main_file()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(UNSAVED_FILE_NAME))
}

fn write_file(target: &Path, text: &str, backup: &BackupPolicy) -> Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    if let BackupPolicy::Suffix(suffix) = backup {
        if target.exists() {
            let mut name = target.as_os_str().to_os_string();
            name.push(suffix);
            fs::copy(target, PathBuf::from(name))?;
        }
    }
    fs::write(target, text)?;
    Ok(())
}
