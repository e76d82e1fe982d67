//! Loads page contents from disk: the YAML front matter becomes the page's
//! [`Meta`] and the markdown body is converted to HTML with its internal
//! links rewritten. See [`Loader::load`] for the expected file layout.

use crate::link::LinkRewriter;
use crate::markdown;
use crate::page::{Meta, Page, DEFAULT_TEMPLATE};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Loads [`Page`] contents from their source files.
pub struct Loader<'a> {
    /// The root of the pages directory, used to shorten paths in messages.
    source_directory: &'a Path,

    rewriter: LinkRewriter<'a>,
}

impl<'a> Loader<'a> {
    pub fn new(source_directory: &'a Path, rewriter: LinkRewriter<'a>) -> Loader<'a> {
        Loader {
            source_directory,
            rewriter,
        }
    }

    /// Reads `page.source_path` and fills in the page's metadata, raw body
    /// and rendered body. The file is structured as follows:
    ///
    /// 1. An optional YAML front matter block between `---` fences, with the
    ///    keys `title`, `short_title`, `description`, `timestamp`, `draft`,
    ///    `blog_post`, `index`, `template` and `status`
    /// 2. The markdown body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Getting Started
    /// timestamp: 2023-04-16
    /// ---
    /// # Hello
    ///
    /// See the [introduction](intro).
    /// ```
    pub fn load(&self, page: &mut Page) -> Result<()> {
        match self._load(page) {
            Ok(()) => Ok(()),
            Err(e) => Err(Error::Annotated(
                format!("loading page `{}`", self.relative(&page.source_path).display()),
                Box::new(e),
            )),
        }
    }

    fn _load(&self, page: &mut Page) -> Result<()> {
        debug!("  Loading page {}", self.relative(&page.source_path).display());

        use std::io::Read;
        let mut contents = String::new();
        File::open(&page.source_path)?.read_to_string(&mut contents)?;
        let input = markdown::strip_unpublished(&contents);

        let (frontmatter, body) = split_frontmatter(input)?;
        let frontmatter: Frontmatter = match frontmatter {
            Some(yaml) if !yaml.trim().is_empty() => serde_yaml::from_str(yaml)?,
            _ => Frontmatter::default(),
        };
        page.meta = frontmatter.into_meta(&page.output_name)?;
        page.raw_body = body.to_owned();

        let mut rendered = String::new();
        markdown::to_html(
            &mut rendered,
            &self.rewriter,
            self.relative(&page.source_path),
            &markdown::widen_sentence_spacing(body),
        );
        page.rendered_body = rendered;
        Ok(())
    }

    fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(self.source_directory).unwrap_or(path)
    }
}

/// Splits `input` into its front matter (if it starts with a `---` fence)
/// and its body.
fn split_frontmatter(input: &str) -> Result<(Option<&str>, &str)> {
    const FENCE: &str = "---";
    if !input.starts_with(FENCE) {
        return Ok((None, input));
    }
    let yaml_start = FENCE.len();
    match input[yaml_start..].find("\n---") {
        None => Err(Error::FrontmatterMissingEndFence),
        Some(offset) => {
            let yaml_stop = yaml_start + offset;
            let after_fence = yaml_stop + 1 + FENCE.len();
            let body = &input[after_fence..];
            // The closing fence's own line ending belongs to the fence.
            let body = body
                .strip_prefix("\r\n")
                .or_else(|| body.strip_prefix('\n'))
                .unwrap_or(body);
            Ok((Some(&input[yaml_start..yaml_stop]), body))
        }
    }
}

#[derive(Deserialize, Clone, Default)]
#[serde(default)]
struct Frontmatter {
    /// The title of the page, shown in the browser title bar and in inbound
    /// navigation links.
    title: Option<String>,

    /// A shorter title for navigation and tables of contents.
    short_title: Option<String>,

    /// A one-line description.
    description: String,

    #[serde(alias = "date")]
    timestamp: Option<String>,

    /// Drafts are never rendered.
    draft: bool,

    /// Blog posts are listed by date on index pages.
    blog_post: bool,

    /// Index pages are rendered after all other pages.
    index: bool,

    template: Option<String>,

    status: Option<String>,
}

impl Frontmatter {
    fn into_meta(self, output_name: &str) -> Result<Meta> {
        let timestamp = match &self.timestamp {
            Some(s) => Some(parse_timestamp(s)?),
            None => None,
        };
        Ok(Meta {
            title: self.title.unwrap_or_else(|| {
                Path::new(output_name)
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default()
            }),
            short_title: self.short_title,
            description: self.description,
            timestamp,
            is_draft: self.draft,
            is_blog_post: self.blog_post,
            is_index: self.index,
            template: self.template.unwrap_or_else(|| DEFAULT_TEMPLATE.to_owned()),
            status: self.status,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    for format in &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(timestamp);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| Error::InvalidTimestamp(s.to_owned()))
}

/// Represents the result of a [`Page`]-load operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`Page`].
#[derive(Debug)]
pub enum Error {
    /// Returned when a source file has an opening frontmatter fence (`---`)
    /// but no closing one.
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when the `timestamp` field isn't a recognized date.
    InvalidTimestamp(String),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::InvalidTimestamp(s) => write!(f, "invalid timestamp: {:?}", s),
            Error::Io(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::InvalidTimestamp(_) => None,
            Error::Io(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::resolver::NameResolver;

    fn load(dir: &Path, name: &str, output_name: &str, contents: &str) -> Result<Page> {
        let path = dir.join(name);
        std::fs::write(&path, contents)?;
        let mut page = Page::new(
            path,
            output_name.to_owned(),
            dir.join(output_name),
            String::new(),
        );
        let pages = vec![page.clone()];
        let resolver = NameResolver::new(&pages);
        Loader::new(dir, LinkRewriter::new(&resolver)).load(&mut page)?;
        Ok(page)
    }

    #[test]
    fn test_load_with_frontmatter() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let page = load(
            dir.path(),
            "10 Intro.md",
            "Intro.html",
            "---\ntitle: Introduction\nshort_title: Intro\ndescription: Where it starts\n\
             timestamp: 2023-04-16\nindex: true\nblog_post: true\nstatus: final\n---\n\
             # Hello\n\nBack to [me](intro).\n",
        )?;

        assert_eq!("Introduction", page.meta.title);
        assert_eq!(Some("Intro".to_owned()), page.meta.short_title);
        assert_eq!("Where it starts", page.meta.description);
        assert_eq!(
            NaiveDate::from_ymd_opt(2023, 4, 16).and_then(|d| d.and_hms_opt(0, 0, 0)),
            page.meta.timestamp
        );
        assert!(page.meta.is_index);
        assert!(!page.meta.is_draft);
        assert!(page.meta.is_blog_post);
        assert_eq!(DEFAULT_TEMPLATE, page.meta.template);
        assert_eq!(Some("final".to_owned()), page.meta.status);
        assert_eq!("# Hello\n\nBack to [me](intro).\n", page.raw_body);
        assert!(page.rendered_body.contains("<h1>Hello</h1>"));
        assert!(page.rendered_body.contains(r#"href="Intro.html""#));
        Ok(())
    }

    #[test]
    fn test_load_widens_sentence_spacing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let page = load(dir.path(), "10 Prose.md", "Prose.html", "It ended.  Then it began.\n")?;
        assert_eq!("It ended.  Then it began.\n", page.raw_body);
        assert!(page.rendered_body.contains("It ended.\u{2002} Then"), "{}", page.rendered_body);
        Ok(())
    }

    #[test]
    fn test_load_without_frontmatter() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let page = load(
            dir.path(),
            "20 Plain Page.md",
            "Plain Page.html",
            "Just text.\n#NoPublish\nnotes",
        )?;
        assert_eq!("Plain Page", page.meta.title);
        assert_eq!("Just text.\n", page.raw_body);
        assert!(!page.rendered_body.contains("notes"));
        Ok(())
    }

    #[test]
    fn test_missing_end_fence() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        match load(dir.path(), "0.md", "index.html", "---\ntitle: Broken\n") {
            Err(Error::Annotated(_, err)) => {
                assert!(matches!(*err, Error::FrontmatterMissingEndFence))
            }
            other => panic!("expected an annotated error, got {:?}", other.map(|p| p.meta)),
        }
        Ok(())
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2021-01-02").is_ok());
        assert!(parse_timestamp("2021-01-02 10:30").is_ok());
        assert!(parse_timestamp("2021-01-02T10:30:05").is_ok());
        assert!(matches!(parse_timestamp("yesterday"), Err(Error::InvalidTimestamp(_))));
    }
}
