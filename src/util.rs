//! Helpers for the directory convention shared by [`crate::tree`] and
//! [`crate::renumber`]: which entries of a content directory count, how they
//! sort, and how their numeric ordering prefix is stripped.

use std::io;
use std::path::{Path, PathBuf};

/// The extension (without the dot) of content files.
pub const SOURCE_EXTENSION: &str = "md";

/// The reserved file name of a directory's own page.
pub const ROOT_MARKER: &str = "0.md";

/// Lists the entries of `dir` that take part in the page tree: content files
/// and sub-directories. Hidden entries (leading `.`) are skipped. The result
/// is sorted by full path, which within one directory is the file-name order.
pub fn content_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for result in std::fs::read_dir(dir)? {
        let entry = result?;
        let path = entry.path();
        if is_hidden(&path) {
            continue;
        }
        if entry.file_type()?.is_dir() || has_source_extension(&path) {
            entries.push(path);
        }
    }
    entries.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    Ok(entries)
}

/// Returns true if `entries` is non-empty and starts with the root marker.
pub fn starts_with_root_marker(entries: &[PathBuf]) -> bool {
    match entries.first() {
        Some(first) => first.is_file() && first.file_name() == Some(ROOT_MARKER.as_ref()),
        None => false,
    }
}

pub fn has_source_extension(path: &Path) -> bool {
    path.extension() == Some(SOURCE_EXTENSION.as_ref())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| name.starts_with('.'))
}

/// Strips a leading `<digits><space>` ordering prefix, e.g. `"10 Intro.md"`
/// becomes `"Intro.md"`. Names without such a prefix are returned unchanged.
pub fn strip_order_prefix(name: &str) -> &str {
    let digits = name.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 && name[digits..].starts_with(' ') {
        &name[digits + 1..]
    } else {
        name
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_strip_order_prefix() {
        assert_eq!("Intro.md", strip_order_prefix("10 Intro.md"));
        assert_eq!("Sub Section", strip_order_prefix("020 Sub Section"));
        assert_eq!("0.md", strip_order_prefix("0.md"));
        assert_eq!("3D Models.md", strip_order_prefix("3D Models.md"));
        assert_eq!("Plain.md", strip_order_prefix("Plain.md"));
    }

    #[test]
    fn test_content_entries_sorted_and_filtered() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("20 b.md"), "")?;
        std::fs::write(dir.path().join("0.md"), "")?;
        std::fs::write(dir.path().join("10 a.md"), "")?;
        std::fs::write(dir.path().join("image.png"), "")?;
        std::fs::write(dir.path().join(".hidden.md"), "")?;
        std::fs::create_dir(dir.path().join("15 sub"))?;

        let names: Vec<String> = content_entries(dir.path())?
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(vec!["0.md", "10 a.md", "15 sub", "20 b.md"], names);
        Ok(())
    }
}
