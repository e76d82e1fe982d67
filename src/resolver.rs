//! Maps the names authors use in internal links to the output link of the
//! page they refer to. A [`NameResolver`] is built once per build pass from
//! every discovered page, drafts included.

use crate::page::Page;
use std::collections::hash_map::{Entry, HashMap};
use tracing::warn;

#[derive(Debug, Default)]
pub struct NameResolver {
    names: HashMap<String, String>,
}

impl NameResolver {
    /// Builds a resolver from `pages`, keyed on each page's output name
    /// without extension, lowercased, spaces replaced by underscores. When two
    /// pages share a key the first one wins and the collision is logged.
    pub fn new<'a>(pages: impl IntoIterator<Item = &'a Page>) -> NameResolver {
        let mut names = HashMap::new();
        for page in pages {
            match names.entry(Self::key(&page.output_name)) {
                Entry::Vacant(entry) => {
                    entry.insert(page.link_name());
                }
                Entry::Occupied(entry) => warn!(
                    "{}: link name '{}' already refers to '{}'; ignoring this page for links",
                    page.source_path.display(),
                    entry.key(),
                    entry.get(),
                ),
            }
        }
        NameResolver { names }
    }

    /// Normalizes a page name or link target into a lookup key. A trailing
    /// `.html` or `.md` extension is ignored so links may name either the
    /// output or the source file.
    pub fn key(name: &str) -> String {
        let stem = [".html", ".md"]
            .iter()
            .find_map(|ext| {
                let cut = name.len().checked_sub(ext.len())?;
                match name.get(cut..) {
                    Some(tail) if tail.eq_ignore_ascii_case(ext) => Some(&name[..cut]),
                    _ => None,
                }
            })
            .unwrap_or(name);
        stem.to_lowercase().replace(' ', "_")
    }

    /// Looks `target` up case-insensitively.
    pub fn resolve(&self, target: &str) -> Option<&str> {
        self.names.get(&Self::key(target)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    fn page(source: &str, output_name: &str) -> Page {
        Page::new(
            PathBuf::from(source),
            output_name.to_owned(),
            PathBuf::from("out").join(output_name),
            String::new(),
        )
    }

    #[test]
    fn test_resolve_ignores_case_and_spaces() {
        let pages = vec![
            page("10 Intro.md", "Intro.html"),
            page("20 Big Topic.md", "Big Topic.html"),
        ];
        let resolver = NameResolver::new(&pages);
        assert_eq!(Some("Intro.html"), resolver.resolve("intro"));
        assert_eq!(Some("Intro.html"), resolver.resolve("INTRO"));
        assert_eq!(Some("Big_Topic.html"), resolver.resolve("big_topic"));
        assert_eq!(Some("Big_Topic.html"), resolver.resolve("Big Topic"));
        assert_eq!(Some("Big_Topic.html"), resolver.resolve("big_topic.html"));
        assert_eq!(Some("Intro.html"), resolver.resolve("Intro.md"));
        assert_eq!(None, resolver.resolve("outro"));
    }

    #[test]
    fn test_collision_first_wins() {
        let pages = vec![page("10 a/0.md", "Topic.html"), page("20 topic.md", "topic.html")];
        let resolver = NameResolver::new(&pages);
        assert_eq!(1, resolver.len());
        assert_eq!(Some("Topic.html"), resolver.resolve("topic"));
    }

    #[test]
    fn test_key() {
        assert_eq!("my_page", NameResolver::key("My Page.html"));
        assert_eq!("index", NameResolver::key("index.HTML"));
        assert_eq!("notes.txt", NameResolver::key("Notes.txt"));
        assert_eq!("", NameResolver::key(""));
    }
}
