/// Photo folder scanning
///
/// The photo tree is one level deep: `<root>/<folder>/<file>`, one
/// folder per subject. This module lists those folders and files and
/// defines the filename ordering the catalog stores.
use std::cmp::Ordering;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::{CatalogError, Result};

/// Supported photo file extensions (compared case-insensitively)
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// List the immediate subdirectories of the photo root, sorted by name.
pub fn subject_folders(root: &Path) -> Result<Vec<String>> {
    let mut folders = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| directory_unreadable(root, e))?;
        if entry.file_type().is_dir() {
            folders.push(entry.file_name().to_string_lossy().to_string());
        }
    }

    folders.sort();
    Ok(folders)
}

/// List the photo filenames directly inside one subject folder, in
/// catalog order (see `image_order`). Non-image files are ignored.
pub fn image_files(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| directory_unreadable(dir, e))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let filename = entry.file_name().to_string_lossy().to_string();
        if let Some(extension) = Path::new(&filename).extension() {
            let ext = extension.to_string_lossy().to_lowercase();
            if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                files.push(filename);
            }
        }
    }

    files.sort_by(|a, b| image_order(a, b));
    Ok(files)
}

/// The path prefix stored in the database: "/" + the root's final
/// component. Scanning `public/dogs` (or plain `dogs`) therefore
/// produces rows like "/dogs/gray/image1.jpg".
pub fn public_prefix(root: &Path) -> String {
    match root.file_name() {
        Some(name) => format!("/{}", name.to_string_lossy()),
        None => String::from("/"),
    }
}

/// Build the stored path for one file
pub fn stored_path(prefix: &str, folder: &str, filename: &str) -> String {
    format!("{}/{}/{}", prefix, folder, filename)
}

/// Extract N from a filename containing `image<N>.`, if present.
/// `image12.jpg` → 12; `portrait.jpg` or `image.jpg` → None.
pub fn numeric_suffix(filename: &str) -> Option<u64> {
    let mut rest = filename;
    while let Some(pos) = rest.find("image") {
        let after = &rest[pos + "image".len()..];
        let digits: &str = &after[..after
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(after.len())];
        if !digits.is_empty() && after[digits.len()..].starts_with('.') {
            return digits.parse().ok();
        }
        rest = after;
    }
    None
}

/// Filename ordering for the stored image list.
///
/// Files with a numeric suffix sort first, by ascending number (so
/// `image2.jpg` comes before `image10.jpg`); files without one sort
/// after them, lexicographically among themselves. This keeps the order
/// total even when a folder mixes both shapes.
pub fn image_order(a: &str, b: &str) -> Ordering {
    match (numeric_suffix(a), numeric_suffix(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn directory_unreadable(path: &Path, err: walkdir::Error) -> CatalogError {
    CatalogError::DirectoryUnreadable {
        path: path.to_path_buf(),
        source: err
            .into_io_error()
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "directory walk failed")),
    }
}
