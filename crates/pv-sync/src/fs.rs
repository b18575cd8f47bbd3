//! File-system collaborator: path resolution under the sync root
//!
//! Only the slice the profile operations need — resolving a file's parent
//! directory and node name relative to a known root. Reading bytes for
//! hashing lives in [`pv_crypto::hash_file`].

use std::path::Path;

use pv_core::{PvError, PvResult};

/// Root-relative path of `file`'s parent directory, with forward slashes.
/// The empty string means the file sits directly under the root.
pub fn relative_parent_path(root: &Path, file: &Path) -> PvResult<String> {
    let parent = file.parent().ok_or_else(|| {
        PvError::StructuralViolation(format!("'{}' has no parent directory", file.display()))
    })?;
    let relative = parent.strip_prefix(root).map_err(|_| {
        PvError::StructuralViolation(format!(
            "'{}' is not under the sync root '{}'",
            file.display(),
            root.display()
        ))
    })?;
    Ok(relative.to_string_lossy().replace('\\', "/"))
}

/// The file's own name, as it appears in the tree.
pub fn node_name(file: &Path) -> PvResult<String> {
    file.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            PvError::StructuralViolation(format!("'{}' has no usable file name", file.display()))
        })
}
