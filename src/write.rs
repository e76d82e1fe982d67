//! Templates pages and writes them to disk. Rendering happens entirely in
//! memory ([`Renderer::render_pages`]); the output directory is only touched
//! afterwards ([`Writer::write_pages`]) so a failed pass leaves the previous
//! output in place.

use crate::link::has_media_extension;
use crate::page::PageId;
use crate::tree::Tree;
use crate::value::{page_value, summary_value};
use gtmpl::{Template, Value};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Applies page templates. Templates are parsed on first use and cached for
/// the lifetime of the renderer, which is one build pass.
pub struct Renderer<'a> {
    /// The directory containing the page templates.
    pub templates_directory: &'a Path,

    /// Template files prepended to every page template.
    pub base_templates: &'a [PathBuf],

    /// The site metadata, available to templates as `site`.
    pub site: Value,

    templates: HashMap<String, Template>,
}

impl<'a> Renderer<'a> {
    pub fn new(
        templates_directory: &'a Path,
        base_templates: &'a [PathBuf],
        site: Value,
    ) -> Renderer<'a> {
        Renderer {
            templates_directory,
            base_templates,
            site,
            templates: HashMap::new(),
        }
    }

    /// Renders every page in `pages`, in order, into its `output` field.
    /// Every page template sees the summaries of all of `pages` as `pages`.
    pub fn render_pages(&mut self, tree: &mut Tree, pages: &[PageId]) -> Result<()> {
        let summaries = Value::Array(pages.iter().map(|id| summary_value(tree, *id)).collect());
        for id in pages {
            let output = self.render_page(tree, *id, &summaries).map_err(|err| Error::Render {
                page: tree[*id].source_path.clone(),
                err: Box::new(err),
            })?;
            tree[*id].output = output;
        }
        Ok(())
    }

    fn render_page(&mut self, tree: &Tree, id: PageId, summaries: &Value) -> Result<Vec<u8>> {
        let page = &tree[id];
        debug!(
            "  Rendering page {} => {}",
            tree.relative_source(id).display(),
            page.link_name()
        );
        let value = page_value(tree, id, &self.site, summaries);
        let template = self.template(&page.meta.template)?;
        let mut output = Vec::new();
        template.execute(&mut output, &gtmpl::Context::from(value)?)?;
        Ok(output)
    }

    fn template(&mut self, name: &str) -> Result<&Template> {
        if !self.templates.contains_key(name) {
            let files = self
                .base_templates
                .iter()
                .cloned()
                .chain(std::iter::once(self.templates_directory.join(name)));
            let template = parse_template(files)?;
            self.templates.insert(name.to_owned(), template);
        }
        Ok(&self.templates[name])
    }
}

// Loads the template file contents, joins them with a space, and parses the
// result into a template.
fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut sources = Vec::new();
    for template_file in template_files {
        let template_file = template_file.as_ref();
        let source =
            std::fs::read_to_string(template_file).map_err(|e| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            })?;
        sources.push(source);
    }

    let mut template = Template::default();
    template.parse(&sources.join(" ")).map_err(Error::ParseTemplate)?;
    Ok(template)
}

/// Prepares the output directory and writes rendered pages and assets to it.
pub struct Writer<'a> {
    /// The directory all output is written to. It is deleted and recreated.
    pub output_directory: &'a Path,

    /// The pages directory; media files found anywhere beneath it are copied
    /// into the root of the output directory.
    pub pages_directory: &'a Path,

    /// The theme's raw files, copied verbatim into the output directory.
    pub raw_files_directory: Option<&'a Path>,
}

impl Writer<'_> {
    /// Clears the output directory, copies raw and media files into it, and
    /// writes each page's output to its output path.
    pub fn write_pages(&self, tree: &Tree, pages: &[PageId]) -> Result<()> {
        info!("Preparing the output directory...");
        clear_directory(self.output_directory)?;
        if let Some(raw) = self.raw_files_directory {
            let count = copy_dir(raw, self.output_directory)?;
            debug!("  Copied {} files from raw files directory {}", count, raw.display());
        }
        let media = copy_media_files(self.pages_directory, self.output_directory)?;
        debug!("  Copied {} media files", media);

        info!("Writing HTML pages to disk...");
        for id in pages {
            let page = &tree[*id];
            debug!("  Writing page {}", page.link_name());
            std::fs::write(&page.output_path, &page.output).map_err(|err| Error::WritePage {
                path: page.output_path.clone(),
                err,
            })?;
        }
        Ok(())
    }
}

/// Deletes `dir` (if it exists) and recreates it empty. The directory is
/// renamed out of the way before deletion so a half-deleted tree is never
/// left at `dir`.
fn clear_directory(dir: &Path) -> Result<()> {
    let clean = |err| Error::Clean {
        path: dir.to_owned(),
        err,
    };
    if dir.exists() {
        info!("Deleting output directory {}", dir.display());
        let mut temp = dir.as_os_str().to_owned();
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        temp.push(format!("_temp_{}", nanos));
        let temp = PathBuf::from(temp);
        debug!("Renaming {} => {}", dir.display(), temp.display());
        std::fs::rename(dir, &temp).map_err(clean)?;
        std::fs::remove_dir_all(&temp).map_err(clean)?;
    }
    info!("Creating output directory {}", dir.display());
    std::fs::create_dir_all(dir).map_err(clean)
}

/// Recursively copies the contents of `src` into `dst`, returning the number
/// of files copied.
fn copy_dir(src: &Path, dst: &Path) -> Result<usize> {
    let mut count = 0;
    for result in WalkDir::new(src).min_depth(1) {
        let entry = result?;
        // strip_prefix can't fail; every entry is below `src`
        let target = dst.join(entry.path().strip_prefix(src).unwrap_or(entry.path()));
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
            count += 1;
        }
    }
    Ok(count)
}

/// Copies every media file below `src` directly into `dst`.
fn copy_media_files(src: &Path, dst: &Path) -> Result<usize> {
    let mut count = 0;
    for result in WalkDir::new(src) {
        let entry = result?;
        if entry.file_type().is_file() && has_media_extension(entry.path()) {
            std::fs::copy(entry.path(), dst.join(entry.file_name()))?;
            count += 1;
        }
    }
    Ok(count)
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-rendering or page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// An error during templating.
    Template(String),

    /// Wraps a failure to render a particular page.
    Render { page: PathBuf, err: Box<Error> },

    /// Returned for I/O problems while cleaning the output directory.
    Clean { path: PathBuf, err: io::Error },

    /// Returned when a page's output file can't be written.
    WritePage { path: PathBuf, err: io::Error },

    /// Returned for WalkDir I/O errors while copying files.
    WalkDir(walkdir::Error),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`].
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => write!(f, "Parsing template: {}", err),
            Error::Template(err) => err.fmt(f),
            Error::Render { page, err } => write!(
                f,
                "Error while rendering HTML for page {}: {}",
                page.display(),
                err
            ),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::WritePage { path, err } => {
                write!(f, "Writing '{}': {}", path.display(), err)
            }
            Error::WalkDir(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { err, .. } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::Template(_) => None,
            Error::Render { err, .. } => Some(err),
            Error::Clean { err, .. } => Some(err),
            Error::WritePage { err, .. } => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}
