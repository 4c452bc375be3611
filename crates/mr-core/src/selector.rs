//! Pending script selection
//!
//! Given a group folder and the group's checkpoint, decide which scripts
//! still need to run. Ordering is plain lexical comparison of the full file
//! name, so sequence- or timestamp-prefixed names sort chronologically.

use crate::config::MissingCheckpointPolicy;
use crate::error::{CoreError, CoreResult};
use crate::group::MigrationGroup;
use std::path::Path;

/// List every script in `folder` with the given extension, ascending.
///
/// Subdirectories and files with other extensions are ignored. File names
/// that are not valid UTF-8 cannot be ordered reliably and are skipped with
/// a warning.
pub fn list_scripts(folder: &Path, extension: &str) -> CoreResult<Vec<String>> {
    let suffix = format!(".{}", extension.trim_start_matches('.'));
    let entries = std::fs::read_dir(folder).map_err(|e| CoreError::IoWithPath {
        path: folder.display().to_string(),
        source: e,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            log::warn!(
                "Skipping script with non UTF-8 file name: {}",
                path.display()
            );
            continue;
        };
        if name.ends_with(&suffix) && name.len() > suffix.len() {
            names.push(name);
        }
    }

    names.sort_unstable();
    Ok(names)
}

/// Select the scripts of `group` that have not been applied yet.
///
/// With no checkpoint every script is pending. Otherwise only names strictly
/// greater than the checkpoint are returned, ascending. When the checkpoint
/// names a file that is no longer in the folder, `policy` decides between
/// failing, resuming after the recorded name, or reprocessing the folder.
pub fn select_pending(
    group: &MigrationGroup,
    extension: &str,
    checkpoint: Option<&str>,
    policy: MissingCheckpointPolicy,
) -> CoreResult<Vec<String>> {
    if !group.folder().is_dir() {
        return Err(CoreError::GroupFolderNotFound {
            group: group.name().to_string(),
            path: group.folder().display().to_string(),
        });
    }

    let scripts = list_scripts(group.folder(), extension)?;

    let Some(last) = checkpoint else {
        return Ok(scripts);
    };

    if scripts.binary_search_by(|name| name.as_str().cmp(last)).is_err() {
        match policy {
            MissingCheckpointPolicy::Fail => {
                return Err(CoreError::CheckpointFileMissing {
                    group: group.name().to_string(),
                    file: last.to_string(),
                    path: group.folder().display().to_string(),
                });
            }
            MissingCheckpointPolicy::Resume => {
                log::warn!(
                    "Checkpoint '{}' for group '{}' is not in {}; continuing with later files",
                    last,
                    group.name(),
                    group.folder().display()
                );
            }
            MissingCheckpointPolicy::Reprocess => {
                log::warn!(
                    "Checkpoint '{}' for group '{}' is not in {}; reprocessing every script",
                    last,
                    group.name(),
                    group.folder().display()
                );
                return Ok(scripts);
            }
        }
    }

    Ok(scripts
        .into_iter()
        .filter(|name| name.as_str() > last)
        .collect())
}

#[cfg(test)]
#[path = "selector_test.rs"]
mod tests;
