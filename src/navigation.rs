//! Depth-first "continue reading" navigation across the whole [`Tree`],
//! independent of the plain sibling links. Both directions cross subtree
//! boundaries: the page after a chapter's last leaf is the next chapter, and
//! the page before a chapter is the deepest last page of the chapter before.

use crate::page::PageId;
use crate::tree::Tree;
use tracing::warn;

impl Tree {
    /// The page that follows `id` in reading order: its first child, else its
    /// next sibling, else the next sibling of the nearest ancestor that has
    /// one. `None` at the end of the book.
    pub fn effective_next(&self, id: PageId) -> Option<PageId> {
        let page = self.get(id)?;
        if let Some(first) = page.children.first() {
            return Some(*first);
        }
        if page.next.is_some() {
            return page.next;
        }

        let mut ancestor = page.parent;
        // A well-formed tree is never deeper than it has pages.
        for _ in 0..self.len() {
            let current = self.get(ancestor?)?;
            if current.next.is_some() {
                return current.next;
            }
            ancestor = current.parent;
        }
        warn!("parent chain of page {} does not terminate", id);
        None
    }

    /// The page that precedes `id` in reading order: the last page of the
    /// previous sibling's subtree, else the parent. `None` at the root.
    pub fn effective_previous(&self, id: PageId) -> Option<PageId> {
        let page = self.get(id)?;
        match page.previous {
            Some(previous) => self.last_descendant(previous),
            None => page.parent,
        }
    }

    /// Follows last-child links down from `id` to the deepest last page.
    fn last_descendant(&self, id: PageId) -> Option<PageId> {
        let mut current = id;
        for _ in 0..self.len() {
            match self.get(current)?.children.last() {
                Some(last) => current = *last,
                None => return Some(current),
            }
        }
        warn!("child chain of page {} does not terminate", id);
        None
    }
}
