//! Publish-time filtering of the flattened page list. Drafts are dropped and
//! index pages are moved to the end so they are rendered after everything
//! they may summarize. Only the processing order changes; the tree links of
//! the pages are left as they are.

use crate::page::PageId;
use crate::tree::Tree;
use tracing::debug;

/// Removes draft pages from `pages` and moves index pages to the end, both
/// preserving relative order.
pub fn filter(tree: &Tree, pages: &mut Vec<PageId>) {
    publish_order(
        pages,
        |id| {
            let draft = tree[*id].meta.is_draft;
            if draft {
                debug!("  Skipping draft page {}", tree.relative_source(*id).display());
            }
            draft
        },
        |id| tree[*id].meta.is_index,
    );
}

/// The ordering policy behind [`filter`], over any item type.
pub fn publish_order<T>(
    items: &mut Vec<T>,
    mut is_draft: impl FnMut(&T) -> bool,
    mut is_index: impl FnMut(&T) -> bool,
) {
    items.retain(|item| !is_draft(item));

    let (others, indices): (Vec<T>, Vec<T>) = items.drain(..).partition(|item| !is_index(item));
    items.extend(others);
    items.extend(indices);
}
