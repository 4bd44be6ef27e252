use std::fs::{self, Metadata, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, ToolError};

/// Writes `contents` next to `path` first and renames it into place, so a
/// failed write leaves the previous file untouched.
///
/// Symlinks are followed and the link itself is kept. An existing target
/// keeps its mode and owner; when the owner cannot be carried over the file
/// is rewritten in place instead.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let target = resolve_symlink(path)?;
    let existing = match fs::metadata(&target) {
        Ok(metadata) => Some(metadata),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => return Err(ToolError::io(&target, e)),
    };

    let mut temp_name = target
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    temp_name.push(format!(".{}.tmp", std::process::id()));
    let temp_path = target.with_file_name(temp_name);

    if let Err(e) = write_temp(&temp_path, contents, existing.as_ref()) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    if let Some(metadata) = &existing {
        if let Err(e) = copy_owner(&temp_path, metadata) {
            log::debug!(
                "cannot keep owner of {} ({e}), rewriting in place",
                target.display()
            );
            let _ = fs::remove_file(&temp_path);
            return fs::write(&target, contents).map_err(|e| ToolError::io(&target, e));
        }
    }

    if let Err(e) = fs::rename(&temp_path, &target) {
        let _ = fs::remove_file(&temp_path);
        return Err(ToolError::io(target, e));
    }

    Ok(())
}

/// Final destination of `path`, following symlinks. Dangling links resolve
/// to the path they point at.
fn resolve_symlink(path: &Path) -> Result<PathBuf> {
    let is_link = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata.file_type().is_symlink(),
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => return Err(ToolError::io(path, e)),
    };
    if !is_link {
        return Ok(path.to_path_buf());
    }

    match fs::canonicalize(path) {
        Ok(target) => Ok(target),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let link = fs::read_link(path).map_err(|e| ToolError::io(path, e))?;
            Ok(match path.parent() {
                Some(parent) if link.is_relative() => parent.join(link),
                _ => link,
            })
        }
        Err(e) => Err(ToolError::io(path, e)),
    }
}

fn write_temp(temp_path: &Path, contents: &[u8], existing: Option<&Metadata>) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        // never wider than the file being replaced, even before set_permissions
        let mode = existing.map_or(0o666, |metadata| metadata.permissions().mode() & 0o7777);
        options.mode(mode);
    }

    let mut file = options
        .open(temp_path)
        .map_err(|e| ToolError::io(temp_path, e))?;
    file.write_all(contents)
        .and_then(|()| file.sync_all())
        .map_err(|e| ToolError::io(temp_path, e))?;

    if let Some(metadata) = existing {
        fs::set_permissions(temp_path, metadata.permissions())
            .map_err(|e| ToolError::io(temp_path, e))?;
    }
    Ok(())
}

#[cfg(unix)]
fn copy_owner(temp_path: &Path, metadata: &Metadata) -> std::io::Result<()> {
    use std::os::unix::fs::MetadataExt;

    let current = fs::metadata(temp_path)?;
    if current.uid() == metadata.uid() && current.gid() == metadata.gid() {
        return Ok(());
    }
    std::os::unix::fs::chown(temp_path, Some(metadata.uid()), Some(metadata.gid()))
}

#[cfg(not(unix))]
fn copy_owner(_temp_path: &Path, _metadata: &Metadata) -> std::io::Result<()> {
    Ok(())
}
