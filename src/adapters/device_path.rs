//! Serial device selection.
//!
//! A selector starting with `/` is taken as the device filename. Anything else is
//! matched as a substring against the symlinks in a by-id directory such as
//! `/dev/serial/by-id`, and must pick out exactly one of them.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DeviceError, DeviceResult};

/// Resolve `selector` to a device path.
///
/// # Errors
/// - [`DeviceError::DeviceDirectory`] if `by_id_dir` cannot be listed
/// - [`DeviceError::AmbiguousDevice`] if more than one entry matches
/// - [`DeviceError::NoDeviceMatch`] if nothing matches
pub fn resolve_device(selector: &str, by_id_dir: &Path) -> DeviceResult<PathBuf> {
    if selector.starts_with('/') {
        return Ok(PathBuf::from(selector));
    }

    let entries = fs::read_dir(by_id_dir).map_err(|source| DeviceError::DeviceDirectory {
        dir: by_id_dir.to_path_buf(),
        source,
    })?;

    let mut names: Vec<String> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DeviceError::DeviceDirectory {
            dir: by_id_dir.to_path_buf(),
            source,
        })?;
        let is_symlink = entry.file_type().map(|t| t.is_symlink()).unwrap_or(false);
        if !is_symlink {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.contains(selector) {
            names.push(name);
        }
    }
    // read_dir order is unspecified
    names.sort();

    match names.as_slice() {
        [] => Err(DeviceError::NoDeviceMatch {
            selector: selector.to_string(),
            dir: by_id_dir.to_path_buf(),
        }),
        [only] => Ok(by_id_dir.join(only)),
        [first, second, ..] => Err(DeviceError::AmbiguousDevice {
            selector: selector.to_string(),
            first: first.clone(),
            second: second.clone(),
        }),
    }
}
