//! Shared test utilities for the folio test suite.
//!
//! Provides content-node builders, a fixture copier, and path extractors for
//! asserting on page plans.
//!
//! # Usage
//!
//! ```rust
//! use crate::plan::build_post_pages;
//! use crate::test_helpers::*;
//!
//! let nodes = vec![
//!     dated_node("1", "older", &["rust"], "2020-01-01"),
//!     dated_node("2", "newer", &["rust", "web"], "2021-01-01"),
//! ];
//! // One page per node, in input order.
//! let pages = build_post_pages(&nodes);
//! assert_eq!(paths(&pages), vec!["/post/older", "/post/newer"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::scan::parse_date;
use crate::types::{ContentNode, PageInstruction};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Node builders
// =========================================================================

/// A post dated 2020-01-01 whose title equals its slug.
pub fn node(id: &str, slug: &str, tags: &[&str]) -> ContentNode {
    dated_node(id, slug, tags, "2020-01-01")
}

/// A post created (and last updated) on `date` (`YYYY-MM-DD`).
pub fn dated_node(id: &str, slug: &str, tags: &[&str], date: &str) -> ContentNode {
    let created_at =
        parse_date(date).unwrap_or_else(|| panic!("bad test date '{date}', want YYYY-MM-DD"));
    ContentNode {
        id: id.to_string(),
        slug: slug.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        title: slug.to_string(),
        excerpt: String::new(),
        created_at,
        updated_at: created_at,
        body: String::new(),
        time_to_read: 1,
    }
}

// =========================================================================
// Extractors
// =========================================================================

/// Paths of a list of page instructions, in order.
pub fn paths(pages: &[PageInstruction]) -> Vec<&str> {
    pages.iter().map(|p| p.path.as_str()).collect()
}
