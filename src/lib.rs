//! The library code for the `booker` book generator. A book is a directory of
//! markdown files whose names begin with an order prefix (`10 Intro.md`,
//! `20 Setup/`). Every directory, the top one included, has a `0.md` root
//! document standing for the directory itself.
//!
//! A build pass runs these stages in order ([`crate::build`]):
//!
//! 1. Discover the page tree and wire parent, sibling and child links
//!    ([`crate::tree`], [`crate::navigation`])
//! 2. Load every page: front matter and markdown, with links between pages
//!    rewritten to output names ([`crate::parser`], [`crate::resolver`],
//!    [`crate::link`])
//! 3. Drop drafts and move index pages to the end so they see every other
//!    page ([`crate::filter`])
//! 4. Render each page through its template and replace the output
//!    directory ([`crate::write`])
//!
//! [`crate::watch`] reruns the pass whenever a source file changes, and
//! [`crate::renumber`] rewrites order prefixes into evenly spaced ones.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod filter;
pub mod link;
pub mod markdown;
pub mod navigation;
pub mod page;
pub mod parser;
pub mod renumber;
pub mod resolver;
pub mod tree;
pub mod util;
pub mod value;
pub mod watch;
pub mod write;
