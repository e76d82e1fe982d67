//! Exports the [`build_site`] function which stitches together one build
//! pass: discovering the page tree ([`crate::tree`]), loading every page
//! ([`crate::parser`]), filtering drafts and deferring index pages
//! ([`crate::filter`]), rendering ([`crate::write::Renderer`]) and finally
//! replacing the output directory ([`crate::write::Writer`]).

use crate::config::{check_directory, Config, Error as ConfigError};
use crate::filter::filter;
use crate::link::LinkRewriter;
use crate::page::PageId;
use crate::parser::{Error as ParseError, Loader};
use crate::resolver::NameResolver;
use crate::tree::{Error as TreeError, Tree};
use crate::write::{Error as WriteError, Renderer, Writer};
use gtmpl::Value;
use std::fmt;
use tracing::{debug, info};

/// Runs one build pass for `config`. Returns the tree together with the
/// published pages in the order they were rendered and written.
pub fn build_site(config: &Config) -> Result<(Tree, Vec<PageId>)> {
    check_directory(&config.pages_directory, "Pages directory")?;
    check_directory(&config.templates_directory, "Templates directory")?;

    debug!("  Input directory: {}", config.pages_directory.display());
    debug!("  Output directory: {}", config.output_directory.display());
    debug!("  Theme: {}", config.theme_name);

    let (mut tree, mut pages) = Tree::build(&config.pages_directory, &config.output_directory)?;
    let resolver = NameResolver::new(pages.iter().map(|id| &tree[*id]));

    info!("Loading {} markdown pages...", pages.len());
    let loader = Loader::new(&config.pages_directory, LinkRewriter::new(&resolver));
    for id in &pages {
        loader.load(&mut tree[*id])?;
    }

    filter(&tree, &mut pages);

    info!("Converting pages to HTML...");
    let mut renderer = Renderer::new(
        &config.templates_directory,
        &config.base_templates,
        Value::from(&config.site),
    );
    renderer.render_pages(&mut tree, &pages)?;

    Writer {
        output_directory: &config.output_directory,
        pages_directory: &config.pages_directory,
        raw_files_directory: config.raw_files_directory.as_deref(),
    }
    .write_pages(&tree, &pages)?;

    info!("Done. Processed {} pages.", pages.len());
    Ok((tree, pages))
}

/// The result of a build pass.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for a build pass. Errors can come from checking the
/// configured directories, building the page tree, loading pages, and
/// rendering or writing them.
#[derive(Debug)]
pub enum Error {
    /// Returned when a configured directory is missing at the start of a
    /// pass.
    Config(ConfigError),

    /// Returned when the page tree is malformed.
    Tree(TreeError),

    /// Returned for errors loading a page.
    Parse(ParseError),

    /// Returned for errors rendering pages or writing them to disk.
    Write(WriteError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Config(err) => err.fmt(f),
            Error::Tree(err) => err.fmt(f),
            Error::Parse(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(err) => Some(err),
            Error::Tree(err) => Some(err),
            Error::Parse(err) => Some(err),
            Error::Write(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    /// Converts [`ConfigError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: ConfigError) -> Error {
        Error::Config(err)
    }
}

impl From<TreeError> for Error {
    /// Converts [`TreeError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: TreeError) -> Error {
        Error::Tree(err)
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}
