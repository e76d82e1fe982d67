//! Defines the [`Page`] type, a single node of the document tree, and the
//! [`PageId`] handle used to refer to pages inside a [`crate::tree::Tree`].

use chrono::NaiveDateTime;
use std::fmt;
use std::path::PathBuf;

/// The template used for pages whose front matter doesn't name one.
pub const DEFAULT_TEMPLATE: &str = "page.html";

/// A stable handle to a [`Page`] stored in a [`crate::tree::Tree`]. Parent,
/// sibling and child relationships are expressed as [`PageId`]s rather than
/// references so the tree can be freely mutated page by page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageId(pub(crate) usize);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Metadata read from a page's front matter. See [`crate::parser`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Meta {
    pub title: String,
    pub short_title: Option<String>,
    pub description: String,
    pub timestamp: Option<NaiveDateTime>,
    pub is_draft: bool,
    pub is_blog_post: bool,
    pub is_index: bool,
    pub template: String,
    pub status: Option<String>,
}

/// A single document of the site. Paths and tree links are assigned by the
/// [`crate::tree`] builder; everything else is filled in by the later stages
/// of a build pass.
#[derive(Clone, Debug)]
pub struct Page {
    /// The markdown file this page is read from.
    pub source_path: PathBuf,

    /// The output file name before link normalization, e.g. `My Page.html`.
    pub output_name: String,

    /// Where the rendered page is written.
    pub output_path: PathBuf,

    /// Dotted position in the tree, e.g. `.2.1`. Empty for the root.
    pub sequence_number: String,

    pub parent: Option<PageId>,
    pub previous: Option<PageId>,
    pub next: Option<PageId>,
    pub children: Vec<PageId>,

    pub meta: Meta,

    /// The markdown body, front matter removed.
    pub raw_body: String,

    /// The body converted to HTML, before templating.
    pub rendered_body: String,

    /// The final templated page.
    pub output: Vec<u8>,
}

impl Page {
    pub(crate) fn new(
        source_path: PathBuf,
        output_name: String,
        output_path: PathBuf,
        sequence_number: String,
    ) -> Page {
        Page {
            source_path,
            output_name,
            output_path,
            sequence_number,
            parent: None,
            previous: None,
            next: None,
            children: Vec::new(),
            meta: Meta::default(),
            raw_body: String::new(),
            rendered_body: String::new(),
            output: Vec::new(),
        }
    }

    /// The name other pages use to link to this one: the output file name
    /// with spaces replaced by underscores.
    pub fn link_name(&self) -> String {
        link_name(&self.output_name)
    }

    /// The title used in navigation: the short title if there is one.
    pub fn nav_title(&self) -> &str {
        self.meta.short_title.as_deref().unwrap_or(&self.meta.title)
    }
}

pub(crate) fn link_name(output_name: &str) -> String {
    output_name.replace(' ', "_")
}
