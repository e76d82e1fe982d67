//! Renumbers the ordering prefixes of a content directory so they progress by
//! tens (`10 a.md`, `20 b.md`, ...), leaving room to insert new pages between
//! existing ones. Relative order is preserved.

use crate::util::{content_entries, starts_with_root_marker, strip_order_prefix};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Renames the non-root entries of `dir` to `<i*10> <name>`, zero-padded so
/// every prefix has the same width (two digits, three once there are ten or
/// more children). Recurses into sub-directories if `recursive` is set.
///
/// A directory whose first entry isn't the root marker is left untouched.
/// Returns the number of entries renamed.
pub fn renumber(dir: &Path, recursive: bool) -> io::Result<usize> {
    let entries = content_entries(dir)?;
    if !starts_with_root_marker(&entries) {
        debug!("Not renumbering {}: no root marker", dir.display());
        return Ok(0);
    }

    let children = &entries[1..];
    let width = std::cmp::max(2, (children.len() * 10).to_string().len());

    let mut plan: Vec<(PathBuf, PathBuf)> = Vec::new();
    let mut finals = Vec::with_capacity(children.len());
    for (i, child) in children.iter().enumerate() {
        let name = child
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("invalid file name: {:?}", child),
                )
            })?;
        let prefix = format!("{:0width$}", (i + 1) * 10, width = width);
        let renamed = dir.join(format!("{} {}", prefix, strip_order_prefix(name)));
        if &renamed != child {
            plan.push((child.clone(), renamed.clone()));
        }
        finals.push(renamed);
    }

    // Move through temporary names first so that no rename can clobber an
    // entry that has not been moved yet.
    let mut staged: Vec<(PathBuf, &PathBuf)> = Vec::with_capacity(plan.len());
    let mut counter = 0;
    for (from, to) in &plan {
        let temp = unused_name(dir, &mut counter);
        if let Err(err) = std::fs::rename(from, &temp) {
            report_staged(dir, &staged);
            return Err(err);
        }
        staged.push((temp, to));
    }
    for (i, (temp, to)) in staged.iter().enumerate() {
        debug!("Renumbering => {}", to.display());
        if let Err(err) = std::fs::rename(temp, to) {
            report_staged(dir, &staged[i..]);
            return Err(err);
        }
    }

    let mut moved = plan.len();
    if recursive {
        for entry in finals.iter().filter(|path| path.is_dir()) {
            moved += renumber(entry, true)?;
        }
    }
    Ok(moved)
}

/// Returns a hidden `.renumber-<n>` path in `dir` that no entry occupies.
fn unused_name(dir: &Path, counter: &mut usize) -> PathBuf {
    loop {
        let candidate = dir.join(format!(".renumber-{}", counter));
        *counter += 1;
        if std::fs::symlink_metadata(&candidate).is_err() {
            return candidate;
        }
    }
}

fn report_staged(dir: &Path, staged: &[(PathBuf, &PathBuf)]) {
    for (temp, to) in staged {
        error!(
            "Renumbering {} stopped: '{}' is still named '{}'",
            dir.display(),
            to.display(),
            temp.display()
        );
    }
}
