//! Markdown post discovery.
//!
//! Walks the posts directory and turns every `.md` file into a
//! [`ContentNode`]. This is the file-backed [`ContentSource`] used by default.
//!
//! ## Directory Structure
//!
//! ```text
//! content/                             # Content root
//! ├── config.toml                      # Site configuration (optional)
//! └── posts/
//!     ├── 2020-05-01-hello-world.md    # Date and slug from the filename
//!     ├── notes/
//!     │   └── tooling.md               # Subdirectories are walked too
//!     └── 2021-02-11-draft.md          # draft = true → excluded
//! ```
//!
//! ## Front Matter
//!
//! An optional TOML block fenced by `+++` lines:
//!
//! ```text
//! +++
//! title = "Hello World"
//! slug = "hello-world"
//! tags = ["intro", "meta"]
//! excerpt = "First post."
//! created_at = 2020-05-01
//! updated_at = "2020-06-01T08:30:00Z"
//! +++
//! # Hello World
//! ...
//! ```
//!
//! Every key is optional:
//! - `slug` falls back to the filename with its date prefix stripped
//! - `created_at` falls back to the filename date (required one way or the other)
//! - `updated_at` falls back to `created_at`
//! - `title` falls back to the first `# heading`, then the filename display title
//! - `id` falls back to the path relative to the posts directory, minus `.md`
//!
//! ## Validation
//!
//! - Post ids must be unique
//! - Dates must be RFC 3339 or `YYYY-MM-DD`
//! - Unknown front matter keys are rejected

use crate::content::{ContentSource, Query, QueryError, QueryResponse, run_query};
use crate::naming::parse_post_name;
use crate::types::{self, ContentNode};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Invalid front matter in {path}: {source}")]
    FrontMatter {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Front matter opened but never closed in {0}")]
    UnterminatedFrontMatter(PathBuf),
    #[error("Invalid date {value:?} in {path}")]
    InvalidDate { path: PathBuf, value: String },
    #[error("No created_at in front matter or filename: {0}")]
    MissingDate(PathBuf),
    #[error("Duplicate post id {id:?} in {first} and {second}")]
    DuplicateId {
        id: String,
        first: String,
        second: String,
    },
}

/// A post as found on disk.
#[derive(Debug, Clone)]
pub struct ScannedPost {
    /// Path relative to the posts directory.
    pub source_path: String,
    pub draft: bool,
    pub node: ContentNode,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FrontMatter {
    id: Option<String>,
    slug: Option<String>,
    title: Option<String>,
    excerpt: Option<String>,
    tags: Vec<String>,
    created_at: Option<toml::Value>,
    updated_at: Option<toml::Value>,
    draft: bool,
}

const FENCE: &str = "+++";

/// Scan a posts directory. Drafts are included and flagged.
pub fn scan(posts_dir: &Path) -> Result<Vec<ScannedPost>, ScanError> {
    let mut posts = Vec::new();
    let mut seen_ids: HashMap<String, String> = HashMap::new();

    for entry in WalkDir::new(posts_dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        let is_markdown = entry.file_type().is_file()
            && path
                .extension()
                .map(|e| e.eq_ignore_ascii_case("md"))
                .unwrap_or(false);
        if !is_markdown {
            continue;
        }

        let rel = path
            .strip_prefix(posts_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        let post = parse_post(path, &rel)?;

        if let Some(first) = seen_ids.insert(post.node.id.clone(), rel.clone()) {
            return Err(ScanError::DuplicateId {
                id: post.node.id,
                first,
                second: rel,
            });
        }
        posts.push(post);
    }

    tracing::debug!(dir = %posts_dir.display(), count = posts.len(), "scanned posts");
    Ok(posts)
}

/// Parse one markdown file. `rel` is its path relative to the posts directory.
fn parse_post(path: &Path, rel: &str) -> Result<ScannedPost, ScanError> {
    let content = fs::read_to_string(path)?;
    let (front, body) = split_front_matter(&content)
        .ok_or_else(|| ScanError::UnterminatedFrontMatter(path.to_path_buf()))?;
    let front: FrontMatter = match front {
        Some(raw) => toml::from_str(raw).map_err(|source| ScanError::FrontMatter {
            path: path.to_path_buf(),
            source,
        })?,
        None => FrontMatter::default(),
    };

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let parsed = parse_post_name(&stem);

    let created_at = match &front.created_at {
        Some(value) => parse_date_value(path, value)?,
        None => parsed
            .date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .ok_or_else(|| ScanError::MissingDate(path.to_path_buf()))?,
    };
    let updated_at = match &front.updated_at {
        Some(value) => parse_date_value(path, value)?,
        None => created_at,
    };

    let slug = front.slug.unwrap_or_else(|| parsed.name.clone());
    let title = front
        .title
        .or_else(|| first_heading(body))
        .unwrap_or_else(|| parsed.display_title.clone());
    let id = front
        .id
        .unwrap_or_else(|| rel.strip_suffix(".md").unwrap_or(rel).to_string());

    Ok(ScannedPost {
        source_path: rel.to_string(),
        draft: front.draft,
        node: ContentNode {
            id,
            slug,
            tags: types::dedup_tags(front.tags),
            title,
            excerpt: front.excerpt.unwrap_or_default(),
            created_at,
            updated_at,
            time_to_read: types::time_to_read(body),
            body: body.to_string(),
        },
    })
}

/// Split `+++` front matter from the body.
///
/// Returns `None` when a fence is opened but never closed; `Some((None, ..))`
/// when the file has no front matter at all.
fn split_front_matter(content: &str) -> Option<(Option<&str>, &str)> {
    let Some(rest) = content.strip_prefix(FENCE) else {
        return Some((None, content));
    };
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            let front = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((Some(front), body));
        }
        offset += line.len();
    }
    None
}

fn first_heading(body: &str) -> Option<String> {
    body.lines()
        .find(|line| line.starts_with("# "))
        .map(|line| line.trim_start_matches("# ").trim().to_string())
}

/// Front matter dates may be TOML datetimes (`2020-05-01`) or strings.
fn parse_date_value(path: &Path, value: &toml::Value) -> Result<DateTime<Utc>, ScanError> {
    let raw = match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Datetime(dt) => dt.to_string(),
        other => other.to_string(),
    };
    parse_date(&raw).ok_or_else(|| ScanError::InvalidDate {
        path: path.to_path_buf(),
        value: raw,
    })
}

/// Parse RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC), or a bare date.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

// ============================================================================
// ContentSource implementation
// ============================================================================

/// Content source over a directory of markdown posts. Drafts are never served.
pub struct MarkdownSource {
    posts_dir: PathBuf,
    loaded: OnceLock<Result<Vec<ContentNode>, QueryError>>,
}

impl MarkdownSource {
    pub fn new(posts_dir: impl Into<PathBuf>) -> Self {
        Self {
            posts_dir: posts_dir.into(),
            loaded: OnceLock::new(),
        }
    }

    fn nodes(&self) -> &Result<Vec<ContentNode>, QueryError> {
        self.loaded.get_or_init(|| {
            if !self.posts_dir.is_dir() {
                return Err(QueryError::new(format!(
                    "content source unavailable: {} is not a directory",
                    self.posts_dir.display()
                )));
            }
            scan(&self.posts_dir)
                .map(|posts| {
                    posts
                        .into_iter()
                        .filter(|p| !p.draft)
                        .map(|p| p.node)
                        .collect()
                })
                .map_err(|e| QueryError::new(e.to_string()))
        })
    }
}

impl ContentSource for MarkdownSource {
    fn query(&self, query: &Query) -> QueryResponse {
        match self.nodes() {
            Ok(nodes) => QueryResponse::ok(run_query(nodes, query)),
            Err(e) => QueryResponse::failed(e.clone()),
        }
    }
}
