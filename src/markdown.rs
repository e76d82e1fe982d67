use crate::link::LinkRewriter;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use regex::Regex;
use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;

// A full stop, optionally followed by closing quotes or a footnote
// reference, then two spaces.
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\.("*\[\^.+\]"*|"*)  "#).unwrap());

/// Converts markdown to HTML, appending the result to `out`. Link targets
/// are passed through `rewriter` before rendering; the unresolved ones are
/// returned.
///
/// * `source` is the path of the document being converted, used to identify
///   it in warnings.
/// * `markdown` is the document body without its front matter.
pub fn to_html(
    out: &mut String,
    rewriter: &LinkRewriter,
    source: &Path,
    markdown: &str,
) -> Vec<String> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut events: Vec<Event> = Parser::new_ext(markdown, options).collect();
    let unresolved = rewriter.rewrite(source, link_targets(&mut events));
    html::push_html(out, events.into_iter());
    unresolved
}

/// Yields a mutable reference to the destination of every link in `events`.
/// Images are not links and are skipped.
fn link_targets<'e, 'a>(events: &'e mut [Event<'a>]) -> impl Iterator<Item = &'e mut CowStr<'a>> {
    events.iter_mut().filter_map(|event| match event {
        Event::Start(Tag::Link(_, dest, _)) => Some(dest),
        _ => None,
    })
}

/// Keeps the wider gap authors leave between sentences: two spaces after a
/// full stop become an en space and a regular space.
pub fn widen_sentence_spacing(markdown: &str) -> Cow<'_, str> {
    SENTENCE_END.replace_all(markdown, ".${1}&ensp; ")
}

/// Drops everything from the first `#NoPublish` or `# NoPublish` marker
/// (ignoring case) to the end of `markdown`.
pub fn strip_unpublished(markdown: &str) -> &str {
    let lower = markdown.to_ascii_lowercase();
    let cut = ["#nopublish", "# nopublish"]
        .iter()
        .filter_map(|marker| lower.find(marker))
        .min();
    match cut {
        Some(i) => &markdown[..i],
        None => markdown,
    }
}
