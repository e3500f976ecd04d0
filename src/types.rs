//! Shared types passed between the content source, the plan builder, and
//! the emitter.
//!
//! Content nodes are read-only snapshots fetched once per build. Page
//! instructions are computed once from those snapshots and handed to an
//! emitter; nothing mutates either after generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Average reading speed used for [`ContentNode::time_to_read`].
pub const WORDS_PER_MINUTE: usize = 265;

/// One published blog post as returned by a content source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    pub id: String,
    pub slug: String,
    /// Distinct tags in order of first appearance.
    #[serde(default)]
    pub tags: Vec<String>,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Raw markdown body.
    #[serde(default)]
    pub body: String,
    /// Estimated reading time in minutes (never zero).
    #[serde(default)]
    pub time_to_read: u32,
}

impl ContentNode {
    /// Whether this node carries `tag` (exact, case-sensitive match).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Reading time for a markdown body: words / 265, rounded, at least 1 minute.
pub fn time_to_read(body: &str) -> u32 {
    let words = body.split_whitespace().count();
    let minutes = (words as f64 / WORDS_PER_MINUTE as f64).round() as u32;
    minutes.max(1)
}

/// Collapse repeated tags, keeping the first occurrence of each.
pub fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Link to the post immediately before or after another in chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingLink {
    pub slug: String,
    pub title: String,
}

/// Which renderer materializes a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Template {
    Post,
    Tag,
}

/// Per-template page context.
///
/// Serialized adjacently tagged so an instruction reads as
/// `{ "path": .., "template": "Post", "context": { .. } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "template", content = "context")]
pub enum PageContext {
    Post(PostContext),
    Tag(TagContext),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContext {
    pub id: String,
    pub slug: String,
    /// Newer neighbour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<SiblingLink>,
    /// Older neighbour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<SiblingLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagContext {
    pub slug: String,
}

/// A declarative request to materialize one static page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInstruction {
    /// Route, always starting with `/`.
    pub path: String,
    #[serde(flatten)]
    pub context: PageContext,
}

impl PageInstruction {
    pub fn template(&self) -> Template {
        match self.context {
            PageContext::Post(_) => Template::Post,
            PageContext::Tag(_) => Template::Tag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_to_read_never_zero() {
        assert_eq!(time_to_read(""), 1);
        assert_eq!(time_to_read("just a few words"), 1);
    }

    #[test]
    fn time_to_read_rounds_to_nearest_minute() {
        let body = "word ".repeat(WORDS_PER_MINUTE * 3 + 100);
        assert_eq!(time_to_read(&body), 3);
        let body = "word ".repeat(WORDS_PER_MINUTE * 3 + 200);
        assert_eq!(time_to_read(&body), 4);
    }

    #[test]
    fn dedup_tags_keeps_first_occurrence() {
        let tags = vec!["rust", "web", "rust", "Rust"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(dedup_tags(tags), vec!["rust", "web", "Rust"]);
    }

    #[test]
    fn template_follows_context() {
        let post = PageInstruction {
            path: "/post/a".to_string(),
            context: PageContext::Post(PostContext {
                id: "1".to_string(),
                slug: "a".to_string(),
                previous: None,
                next: None,
            }),
        };
        let tag = PageInstruction {
            path: "/tag/a".to_string(),
            context: PageContext::Tag(TagContext {
                slug: "a".to_string(),
            }),
        };
        assert_eq!(post.template(), Template::Post);
        assert_eq!(tag.template(), Template::Tag);
    }

    #[test]
    fn instruction_serializes_template_and_context() {
        let post = PageInstruction {
            path: "/post/hello-world".to_string(),
            context: PageContext::Post(PostContext {
                id: "1".to_string(),
                slug: "hello-world".to_string(),
                previous: None,
                next: None,
            }),
        };
        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "path": "/post/hello-world",
                "template": "Post",
                "context": { "id": "1", "slug": "hello-world" }
            })
        );
    }

    #[test]
    fn has_tag_is_case_sensitive() {
        let node = ContentNode {
            id: "1".to_string(),
            slug: "a".to_string(),
            tags: vec!["Rust".to_string()],
            title: "A".to_string(),
            excerpt: String::new(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
            body: String::new(),
            time_to_read: 1,
        };
        assert!(node.has_tag("Rust"));
        assert!(!node.has_tag("rust"));
    }
}
