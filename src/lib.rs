//! # Folio
//!
//! Page generation for a small blog. Posts come from a content source (a
//! directory of markdown files, or a CMS JSON export); every build turns them
//! into one page per post, one page per tag, and a home page listing every
//! post.
//!
//! # Architecture: Plan, Then Emit
//!
//! ```text
//! 1. Query   ContentSource  →  Vec<ContentNode>   (allPosts, newest first)
//! 2. Plan    nodes          →  PagePlan           (post + tag instructions)
//! 3. Emit    PagePlan       →  dist/              (one HTML file per instruction)
//! 4. Finish  AllPosts       →  dist/index.html    (home page)
//! ```
//!
//! Planning is pure: it only reads the query result and never touches the
//! filesystem, so the whole routing layer is testable with an in-memory
//! source and a recording emitter. Emission goes through the [`emit::PageEmitter`]
//! trait, and the HTML emitter fetches each page's data through the same
//! source the plan was built from.
//!
//! A separate post-deploy step ([`deploy`]) runs an end-to-end test suite
//! against a deploy preview and reports the result as a commit status.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`content`] | Query types, the `ContentSource` trait, in-memory and JSON-export sources |
//! | [`scan`] | Markdown post discovery and the file-backed `MarkdownSource` |
//! | [`plan`] | Computes the page plan and drives emission (`create_pages`) |
//! | [`emit`] | `PageEmitter` trait and the HTML file emitter |
//! | [`render`] | Maud templates for post, tag and home pages |
//! | [`deploy`] | Deploy-preview verification and commit status reporting |
//! | [`config`] | `config.toml` loading, validation, and merging over defaults |
//! | [`types`] | Content nodes and page instructions shared between stages |
//! | [`naming`] | `YYYY-MM-DD-name` filename convention parser |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## All or Nothing
//!
//! A query that reports errors, a node without an id or slug, a repeated id,
//! two pages claiming the same path, or a path with an empty, `.` or `..`
//! segment abort the build before anything is emitted. A
//! partially generated site is never published.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time HTML
//! macro system. Malformed templates are build errors and every interpolated
//! value is escaped.

pub mod config;
pub mod content;
pub mod deploy;
pub mod emit;
pub mod naming;
pub mod output;
pub mod plan;
pub mod render;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
