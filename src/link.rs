//! Rewrites internal link targets to the output links of the pages they name.
//! External URLs and media files are left alone. Targets that name no known
//! page are reported and left unchanged; they never fail a build.

use crate::resolver::NameResolver;
use std::ops::Deref;
use std::path::Path;
use tracing::warn;
use url::Url;

/// Extensions (lowercase, without the dot) of media files. Links to them are
/// not page links, and [`crate::write`] copies them into the output.
pub const MEDIA_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "svg", "webp"];

pub struct LinkRewriter<'a> {
    resolver: &'a NameResolver,
}

impl<'a> LinkRewriter<'a> {
    pub fn new(resolver: &'a NameResolver) -> LinkRewriter<'a> {
        LinkRewriter { resolver }
    }

    /// Rewrites each internal target in `targets` in place. `source` names
    /// the document the targets come from and is only used in warnings.
    /// Returns the path part of every target that could not be resolved.
    pub fn rewrite<'t, T>(
        &self,
        source: &Path,
        targets: impl IntoIterator<Item = &'t mut T>,
    ) -> Vec<String>
    where
        T: Deref<Target = str> + From<String> + 't,
    {
        let mut unresolved = Vec::new();
        for target in targets {
            if is_external(target) || is_media(target) {
                continue;
            }
            let (path, fragment) = split_fragment(target);
            // Same-page anchors.
            if path.is_empty() {
                continue;
            }
            match self.resolver.resolve(path) {
                Some(resolved) => {
                    let rewritten = format!("{}{}", resolved, fragment);
                    *target = T::from(rewritten);
                }
                None => {
                    warn!("{}: Unknown link url '{}'", source.display(), path);
                    unresolved.push(path.to_owned());
                }
            }
        }
        unresolved
    }
}

/// True for targets carrying a URL scheme (`https:`, `mailto:`, ...).
pub fn is_external(target: &str) -> bool {
    Url::parse(target).is_ok()
}

/// True for targets whose path ends in one of [`MEDIA_EXTENSIONS`].
pub fn is_media(target: &str) -> bool {
    let (path, _) = split_fragment(target);
    let path = path.split('?').next().unwrap_or(path);
    has_media_extension(Path::new(path))
}

pub fn has_media_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            MEDIA_EXTENSIONS
                .iter()
                .any(|media| ext.eq_ignore_ascii_case(media))
        })
}

/// Splits `target` into its path and its `#fragment` (fragment keeps the
/// `#`; empty when absent).
fn split_fragment(target: &str) -> (&str, &str) {
    match target.find('#') {
        Some(i) => target.split_at(i),
        None => (target, ""),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::page::Page;
    use std::path::PathBuf;

    fn resolver() -> NameResolver {
        let pages: Vec<Page> = ["Intro.html", "Getting Started.html"]
            .iter()
            .map(|name| {
                Page::new(
                    PathBuf::from(name),
                    name.to_string(),
                    PathBuf::from(name),
                    String::new(),
                )
            })
            .collect();
        NameResolver::new(&pages)
    }

    #[test]
    fn test_rewrite_internal_links() {
        let resolver = resolver();
        let rewriter = LinkRewriter::new(&resolver);
        let mut targets: Vec<String> = vec![
            "intro".into(),
            "getting_started#install".into(),
            "https://example.org/intro".into(),
            "mailto:someone@example.org".into(),
            "diagram.PNG".into(),
            "#local".into(),
            "missing#part".into(),
        ];
        let unresolved = rewriter.rewrite(Path::new("10 a.md"), targets.iter_mut());

        assert_eq!(vec!["missing".to_owned()], unresolved);
        assert_eq!(
            vec![
                "Intro.html",
                "Getting_Started.html#install",
                "https://example.org/intro",
                "mailto:someone@example.org",
                "diagram.PNG",
                "#local",
                "missing#part",
            ],
            targets
        );
    }

    #[test]
    fn test_is_media() {
        assert!(is_media("photo.jpg"));
        assert!(is_media("img/photo.JPEG#x"));
        assert!(is_media("photo.png?v=2"));
        assert!(!is_media("intro"));
        assert!(!is_media("intro.html"));
    }

    #[test]
    fn test_is_external() {
        assert!(is_external("http://example.org"));
        assert!(is_external("ftp://example.org/file"));
        assert!(!is_external("intro"));
        assert!(!is_external("sub/page#frag"));
    }
}
