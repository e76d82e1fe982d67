//! Builds the page [`Tree`] from a source directory. Every directory must
//! contain a root-marker file (`0.md`) which becomes the directory's own page;
//! the remaining markdown files and sub-directories become its children, in
//! file-name order. Sub-directories are represented in the tree by their own
//! root page.

use crate::page::{link_name, Page, PageId};
use crate::util::{content_entries, starts_with_root_marker, ROOT_MARKER};
use std::fmt;
use std::io;
use std::ops::{Index, IndexMut};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The output name of the top-level root page.
pub const HOME_NAME: &str = "index";

/// The extension (without the dot) of output files.
pub const OUTPUT_EXTENSION: &str = "html";

/// An arena of [`Page`]s linked by [`PageId`]s. Pages are stored in
/// discovery order, which is the pre-order traversal of the tree.
#[derive(Debug)]
pub struct Tree {
    pages: Vec<Page>,
    root: PageId,
    source_directory: PathBuf,
}

impl Tree {
    /// Walks `source_directory` and returns the linked tree together with the
    /// flattened list of every page in pre-order (root first, then each child
    /// subtree in sibling order). Output paths are placed directly in
    /// `output_directory`.
    pub fn build(source_directory: &Path, output_directory: &Path) -> Result<(Tree, Vec<PageId>)> {
        let mut builder = Builder {
            source_directory,
            output_directory,
            pages: Vec::new(),
        };
        let root = builder.load_directory(source_directory, "")?;
        let flattened = (0..builder.pages.len()).map(PageId).collect();
        debug!(
            "discovered {} pages under {}",
            builder.pages.len(),
            source_directory.display()
        );
        Ok((
            Tree {
                pages: builder.pages,
                root,
                source_directory: source_directory.to_owned(),
            },
            flattened,
        ))
    }

    pub fn root(&self) -> PageId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn get(&self, id: PageId) -> Option<&Page> {
        self.pages.get(id.0)
    }

    /// Iterates over all pages in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (PageId, &Page)> {
        self.pages.iter().enumerate().map(|(i, p)| (PageId(i), p))
    }

    /// The source path relative to the source directory, for messages.
    pub fn relative_source(&self, id: PageId) -> &Path {
        let path = &self[id].source_path;
        path.strip_prefix(&self.source_directory).unwrap_or(path)
    }
}

impl Index<PageId> for Tree {
    type Output = Page;

    fn index(&self, id: PageId) -> &Page {
        &self.pages[id.0]
    }
}

impl IndexMut<PageId> for Tree {
    fn index_mut(&mut self, id: PageId) -> &mut Page {
        &mut self.pages[id.0]
    }
}

struct Builder<'a> {
    source_directory: &'a Path,
    output_directory: &'a Path,
    pages: Vec<Page>,
}

impl Builder<'_> {
    /// Loads `dir` and everything below it, returning the id of the
    /// directory's root page.
    fn load_directory(&mut self, dir: &Path, sequence_number: &str) -> Result<PageId> {
        let entries = content_entries(dir).map_err(|err| Error::ReadDirectory {
            path: dir.to_owned(),
            err,
        })?;
        if !starts_with_root_marker(&entries) {
            return Err(Error::MissingRootDocument {
                directory: dir.to_owned(),
            });
        }

        let root = self.push(&entries[0], sequence_number.to_owned())?;

        let mut children = Vec::with_capacity(entries.len() - 1);
        for (i, entry) in entries[1..].iter().enumerate() {
            let child_sequence_number = format!("{}.{}", sequence_number, i + 1);
            let child = if entry.is_dir() {
                self.load_directory(entry, &child_sequence_number)?
            } else {
                self.push(entry, child_sequence_number)?
            };
            self.pages[child.0].parent = Some(root);
            children.push(child);
        }

        for pair in children.windows(2) {
            self.pages[pair[0].0].next = Some(pair[1]);
            self.pages[pair[1].0].previous = Some(pair[0]);
        }
        self.pages[root.0].children = children;

        Ok(root)
    }

    fn push(&mut self, source_path: &Path, sequence_number: String) -> Result<PageId> {
        let output_name = self.output_name(source_path)?;
        let output_path = self.output_directory.join(link_name(&output_name));
        let id = PageId(self.pages.len());
        self.pages.push(Page::new(
            source_path.to_owned(),
            output_name,
            output_path,
            sequence_number,
        ));
        Ok(id)
    }

    /// Derives the output file name: root markers take the name of their
    /// directory (or [`HOME_NAME`] at the top), the ordering prefix is
    /// stripped, and the extension becomes [`OUTPUT_EXTENSION`].
    fn output_name(&self, source_path: &Path) -> Result<String> {
        let invalid = || Error::InvalidFileName(source_path.to_owned());

        let file_name = source_path.file_name().ok_or_else(invalid)?;
        let name = if file_name == ROOT_MARKER {
            let dir = source_path.parent().ok_or_else(invalid)?;
            if dir == self.source_directory {
                format!("{}.{}", HOME_NAME, crate::util::SOURCE_EXTENSION)
            } else {
                dir.file_name()
                    .ok_or_else(invalid)?
                    .to_str()
                    .ok_or_else(invalid)?
                    .to_owned()
            }
        } else {
            file_name.to_str().ok_or_else(invalid)?.to_owned()
        };

        let stripped =
            Path::new(crate::util::strip_order_prefix(&name)).with_extension(OUTPUT_EXTENSION);
        stripped
            .to_str()
            .map(str::to_owned)
            .ok_or_else(invalid)
    }
}

/// Represents the result of building a [`Tree`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error building a [`Tree`].
#[derive(Debug)]
pub enum Error {
    /// Returned when a directory is empty or its first entry isn't the root
    /// marker file. This is fatal for the whole build pass.
    MissingRootDocument { directory: PathBuf },

    /// Returned when a directory can't be listed.
    ReadDirectory { path: PathBuf, err: io::Error },

    /// Returned when a file name isn't valid UTF-8.
    InvalidFileName(PathBuf),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingRootDocument { directory } => write!(
                f,
                "Directory '{}' contains no {} file",
                directory.display(),
                ROOT_MARKER
            ),
            Error::ReadDirectory { path, err } => {
                write!(f, "Reading directory '{}': {}", path.display(), err)
            }
            Error::InvalidFileName(path) => write!(f, "invalid file name: {:?}", path),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingRootDocument { .. } => None,
            Error::ReadDirectory { err, .. } => Some(err),
            Error::InvalidFileName(_) => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use std::fs;

    /// Creates each relative path under `root`; paths ending in `/` are
    /// directories.
    pub(crate) fn fixture(root: &Path, paths: &[&str]) -> io::Result<()> {
        for path in paths {
            let full = root.join(path);
            if path.ends_with('/') {
                fs::create_dir_all(&full)?;
            } else {
                if let Some(parent) = full.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&full, "")?;
            }
        }
        Ok(())
    }

    fn names(tree: &Tree, ids: &[PageId]) -> Vec<String> {
        ids.iter().map(|id| tree[*id].output_name.clone()).collect()
    }

    /// Pre-order traversal computed from the child links alone.
    fn preorder(tree: &Tree) -> Vec<PageId> {
        let mut seen = vec![false; tree.len()];
        let mut out = Vec::with_capacity(tree.len());
        let mut stack = vec![tree.root()];
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.0], true) {
                continue;
            }
            out.push(id);
            stack.extend(tree[id].children.iter().rev());
        }
        out
    }

    #[test]
    fn test_build_small_book() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        fixture(
            dir.path(),
            &["0.md", "10 Intro.md", "20 Sub/0.md", "20 Sub/10 Leaf.md"],
        )?;
        let (tree, flattened) = Tree::build(dir.path(), Path::new("/out"))?;

        assert_eq!(
            vec!["index.html", "Intro.html", "Sub.html", "Leaf.html"],
            names(&tree, &flattened)
        );
        let sequence: Vec<&str> = flattened
            .iter()
            .map(|id| tree[*id].sequence_number.as_str())
            .collect();
        assert_eq!(vec!["", ".1", ".2", ".2.1"], sequence);

        let root = tree.root();
        assert_eq!(vec![PageId(1), PageId(2)], tree[root].children);
        assert_eq!(Some(root), tree[PageId(1)].parent);
        assert_eq!(Some(PageId(2)), tree[PageId(3)].parent);
        assert_eq!(Path::new("/out/Leaf.html"), tree[PageId(3)].output_path);
        Ok(())
    }

    #[test]
    fn test_flattened_is_preorder() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        fixture(
            dir.path(),
            &[
                "0.md",
                "10 A/0.md",
                "10 A/10 A1.md",
                "10 A/20 A2/0.md",
                "10 A/20 A2/10 Deep.md",
                "10 A/30 A3.md",
                "20 B.md",
                "30 C/0.md",
            ],
        )?;
        let (tree, flattened) = Tree::build(dir.path(), Path::new("out"))?;
        assert_eq!(preorder(&tree), flattened);
        assert_eq!(
            vec![
                "index.html",
                "A.html",
                "A1.html",
                "A2.html",
                "Deep.html",
                "A3.html",
                "B.html",
                "C.html",
            ],
            names(&tree, &flattened)
        );

        let mut unique = flattened.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(flattened.len(), unique.len());
        Ok(())
    }

    #[test]
    fn test_siblings_are_symmetric() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        fixture(
            dir.path(),
            &["0.md", "10 a.md", "20 b/0.md", "30 c.md", "40 d.md"],
        )?;
        let (tree, _) = Tree::build(dir.path(), Path::new("out"))?;
        let children = &tree[tree.root()].children;
        assert_eq!(None, tree[children[0]].previous);
        assert_eq!(None, tree[children[3]].next);
        for (id, page) in tree.iter() {
            if let Some(next) = page.next {
                assert_eq!(Some(id), tree[next].previous);
            }
            if let Some(previous) = page.previous {
                assert_eq!(Some(id), tree[previous].next);
            }
        }
        Ok(())
    }

    #[test]
    fn test_missing_root_document() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        fixture(dir.path(), &["0.md", "10 Sub/10 Orphan.md"])?;
        match Tree::build(dir.path(), Path::new("out")) {
            Err(Error::MissingRootDocument { directory }) => {
                assert_eq!(dir.path().join("10 Sub"), directory)
            }
            other => panic!("expected MissingRootDocument, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_empty_directory_is_missing_root() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        assert!(matches!(
            Tree::build(dir.path(), Path::new("out")),
            Err(Error::MissingRootDocument { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_entry_sorting_before_root_marker_fails() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        fixture(dir.path(), &["0.md", "0 First.md"])?;
        assert!(matches!(
            Tree::build(dir.path(), Path::new("out")),
            Err(Error::MissingRootDocument { .. })
        ));
        Ok(())
    }
}
