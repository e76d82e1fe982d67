//! Converts pages and site metadata into template [`Value`]s.

use crate::config::Site;
use crate::page::PageId;
use crate::tree::Tree;
use gtmpl::Value;
use std::collections::HashMap;

const DATE_FORMAT: &str = "%Y-%m-%d";

impl From<&Site> for Value {
    fn from(site: &Site) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), Value::String(site.title.clone()));
        m.insert("author".to_owned(), Value::String(site.author.clone()));
        m.insert("description".to_owned(), Value::String(site.description.clone()));
        m.insert("generator".to_owned(), Value::String(site.generator.clone()));
        m.insert("recent_posts".to_owned(), Value::from(site.recent_posts as u64));
        m.insert("gtag".to_owned(), option_to_value(site.gtag.clone()));
        m.insert("ga_enabled".to_owned(), Value::Bool(site.ga_enabled()));
        Value::Object(m)
    }
}

fn option_to_value(opt: Option<String>) -> Value {
    match opt {
        Some(s) => Value::String(s),
        None => Value::Nil,
    }
}

/// A short reference to a page for navigation: `title`, `short_title` and
/// `link`.
pub fn link_value(tree: &Tree, id: PageId) -> Value {
    let page = &tree[id];
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("title".to_owned(), Value::String(page.meta.title.clone()));
    m.insert("short_title".to_owned(), Value::String(page.nav_title().to_owned()));
    m.insert("link".to_owned(), Value::String(page.link_name()));
    Value::Object(m)
}

fn optional_link(tree: &Tree, id: Option<PageId>) -> Value {
    match id {
        Some(id) => link_value(tree, id),
        None => Value::Nil,
    }
}

/// The per-page summary listed in the `pages` value: everything in
/// [`link_value`] plus `description`, `date`, `status` and
/// `sequence_number`.
pub fn summary_value(tree: &Tree, id: PageId) -> Value {
    let page = &tree[id];
    let mut value = link_value(tree, id);
    if let Value::Object(m) = &mut value {
        m.insert("description".to_owned(), Value::String(page.meta.description.clone()));
        m.insert(
            "date".to_owned(),
            option_to_value(page.meta.timestamp.map(|t| t.format(DATE_FORMAT).to_string())),
        );
        m.insert("status".to_owned(), option_to_value(page.meta.status.clone()));
        m.insert("sequence_number".to_owned(), Value::String(page.sequence_number.clone()));
        m.insert("is_index".to_owned(), Value::Bool(page.meta.is_index));
        m.insert("is_blog_post".to_owned(), Value::Bool(page.meta.is_blog_post));
    }
    value
}

/// The full template value for page `id`. `site` and `pages` are shared by
/// every page of a build pass.
pub fn page_value(tree: &Tree, id: PageId, site: &Value, pages: &Value) -> Value {
    let page = &tree[id];
    let mut value = summary_value(tree, id);
    if let Value::Object(m) = &mut value {
        m.insert("contents".to_owned(), Value::String(page.rendered_body.clone()));
        m.insert("markdown".to_owned(), Value::String(page.raw_body.clone()));
        m.insert("parent".to_owned(), optional_link(tree, page.parent));
        m.insert("previous".to_owned(), optional_link(tree, page.previous));
        m.insert("next".to_owned(), optional_link(tree, page.next));
        m.insert(
            "effective_previous".to_owned(),
            optional_link(tree, tree.effective_previous(id)),
        );
        m.insert("effective_next".to_owned(), optional_link(tree, tree.effective_next(id)));
        m.insert(
            "children".to_owned(),
            Value::Array(page.children.iter().map(|c| link_value(tree, *c)).collect()),
        );
        m.insert("site".to_owned(), site.clone());
        m.insert("pages".to_owned(), pages.clone());
    }
    value
}
