/// Filesystem → catalog reconciliation
///
/// One-directional merge: photos discovered on disk are appended to the
/// matching subject records. The reconciler creates subjects and appends
/// images; it never removes or reorders anything the catalog already
/// holds, and it never touches the sold flag.
use serde::Serialize;
use std::path::Path;
use std::sync::Mutex;

use super::scan;
use crate::error::{CatalogError, Result};
use crate::state::catalog::Catalog;
use crate::state::data::SubjectKind;

/// Runs are human-triggered and must not overlap; a second caller fails
/// fast instead of queueing.
static SYNC_GUARD: Mutex<()> = Mutex::new(());

/// A folder the run could not process. Nothing is dropped silently:
/// every folder that produced no catalog write for a non-trivial reason
/// shows up here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FolderIssue {
    pub folder: String,
    pub reason: String,
}

/// What one reconciliation run did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub subjects_created: usize,
    pub subjects_updated: usize,
    pub images_appended: usize,
    /// Folders passed over (unreadable, or unmatched in incremental mode)
    pub skipped: Vec<FolderIssue>,
    /// Folders whose catalog write failed; the run continued past them
    pub failed: Vec<FolderIssue>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SyncMode {
    /// Create missing subjects and append new images
    Full,
    /// Append new images to existing subjects only
    Incremental,
}

/// Scan every subject folder under `root` and merge the findings into
/// the catalog, creating subjects for folders it has never seen.
pub fn full_sync(catalog: &Catalog, root: &Path) -> Result<SyncReport> {
    sync(catalog, root, SyncMode::Full)
}

/// Like `full_sync`, but a folder with no matching subject is reported
/// as skipped instead of creating a record.
pub fn incremental_sync(catalog: &Catalog, root: &Path) -> Result<SyncReport> {
    sync(catalog, root, SyncMode::Incremental)
}

fn sync(catalog: &Catalog, root: &Path, mode: SyncMode) -> Result<SyncReport> {
    let _guard = SYNC_GUARD
        .try_lock()
        .map_err(|_| CatalogError::SyncInProgress)?;

    // A root that cannot be listed aborts the whole run
    let folders = scan::subject_folders(root)?;
    let prefix = scan::public_prefix(root);

    let mut report = SyncReport::default();

    for folder in folders {
        let files = match scan::image_files(&root.join(&folder)) {
            Ok(files) => files,
            Err(e) => {
                report.skipped.push(FolderIssue {
                    folder,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let candidates: Vec<String> = files
            .iter()
            .map(|f| scan::stored_path(&prefix, &folder, f))
            .collect();

        match reconcile_folder(catalog, &folder, candidates, mode) {
            Ok(Outcome::Created(appended)) => {
                report.subjects_created += 1;
                report.images_appended += appended;
            }
            Ok(Outcome::Updated(appended)) => {
                report.subjects_updated += 1;
                report.images_appended += appended;
            }
            Ok(Outcome::Unchanged) => {}
            Ok(Outcome::NoRecord) => report.skipped.push(FolderIssue {
                folder,
                reason: "no existing subject for this folder".to_string(),
            }),
            Err(e) => report.failed.push(FolderIssue {
                folder,
                reason: e.to_string(),
            }),
        }
    }

    Ok(report)
}

enum Outcome {
    Created(usize),
    Updated(usize),
    Unchanged,
    NoRecord,
}

fn reconcile_folder(
    catalog: &Catalog,
    folder: &str,
    candidates: Vec<String>,
    mode: SyncMode,
) -> Result<Outcome> {
    let kind = SubjectKind::from_folder(folder);

    let existing = match kind {
        SubjectKind::Puppy => catalog.puppy_by_name(&derived_name(folder))?,
        parent => catalog.parent(parent)?,
    };

    match existing {
        Some(subject) => {
            // Append-only diff by exact path match; existing entries keep
            // their order, new ones land at the end in scan order.
            let new_images: Vec<String> = candidates
                .into_iter()
                .filter(|c| !subject.images.contains(c))
                .collect();

            if new_images.is_empty() {
                return Ok(Outcome::Unchanged);
            }

            let appended = new_images.len();
            let mut images = subject.images;
            images.extend(new_images);
            catalog.update_images(subject.id, &images)?;

            Ok(Outcome::Updated(appended))
        }
        None => {
            if mode == SyncMode::Incremental {
                return Ok(Outcome::NoRecord);
            }

            let name = match kind.fixed_display_name() {
                Some(fixed) => fixed.to_string(),
                None => derived_name(folder),
            };

            let appended = candidates.len();
            catalog.insert_subject(&name, kind, &candidates, false)?;

            Ok(Outcome::Created(appended))
        }
    }
}

/// Puppy display name: the folder name with its first letter capitalized
fn derived_name(folder: &str) -> String {
    let mut chars = folder.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
