//! Content query gateway.
//!
//! Every read of content goes through [`ContentSource::query`], which takes a
//! declarative [`Query`] and answers with a uniform [`QueryResponse`]: a node
//! list plus a list of errors. Sources never panic and never return a partial
//! transport error type; an unreadable directory, a broken export file, or a
//! malformed front matter block all surface as entries in `errors`. Callers
//! decide what is fatal (for a build, any error is).
//!
//! ## Sources
//!
//! | Source | Backing data |
//! |--------|--------------|
//! | [`MarkdownSource`](crate::scan::MarkdownSource) | `.md` files with TOML front matter |
//! | [`JsonExportSource`] | a headless CMS export (`{ "items": [...] }`) |
//! | [`MemorySource`] | nodes held in memory |
//!
//! File-backed sources load once and memoize the result (including a load
//! failure) for the lifetime of the source value, so page renderers can
//! query repeatedly without re-reading disk.

use crate::config::{SiteConfig, SourceFormat};
use crate::types::{self, ContentNode};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// A declarative content query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Every published post, newest first.
    AllPosts,
    /// The post with this id (zero or one node).
    PostById(String),
    /// Posts carrying this exact tag, newest first.
    PostsTagged(String),
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::AllPosts => write!(f, "allPosts"),
            Query::PostById(id) => write!(f, "post(id: {id:?})"),
            Query::PostsTagged(tag) => write!(f, "allPosts(tag: {tag:?})"),
        }
    }
}

/// One error reported by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    pub message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Uniform answer to a [`Query`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    pub data: Vec<ContentNode>,
    pub errors: Vec<QueryError>,
}

impl QueryResponse {
    pub fn ok(data: Vec<ContentNode>) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }

    pub fn failed(error: QueryError) -> Self {
        Self {
            data: Vec::new(),
            errors: vec![error],
        }
    }

    /// Treat any reported error as failure of the whole query.
    pub fn into_result(self, query: &Query) -> Result<Vec<ContentNode>, QueryFailure> {
        if self.errors.is_empty() {
            Ok(self.data)
        } else {
            Err(QueryFailure {
                query: query.to_string(),
                errors: self.errors,
            })
        }
    }
}

/// A query answered with errors.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("query {query} failed: {}", join_messages(.errors))]
pub struct QueryFailure {
    pub query: String,
    pub errors: Vec<QueryError>,
}

fn join_messages(errors: &[QueryError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Anything that can answer content queries.
///
/// `Sync` so emitters can query from rayon workers.
pub trait ContentSource: Sync {
    fn query(&self, query: &Query) -> QueryResponse;
}

/// Answer a query against an already-loaded node list.
///
/// Shared by every source so query semantics are identical regardless of
/// where the nodes came from. The sort is stable: posts created at the same
/// instant keep their load order.
pub fn run_query(nodes: &[ContentNode], query: &Query) -> Vec<ContentNode> {
    let mut matched: Vec<ContentNode> = match query {
        Query::AllPosts => nodes.to_vec(),
        Query::PostById(id) => {
            return nodes.iter().filter(|n| &n.id == id).take(1).cloned().collect();
        }
        Query::PostsTagged(tag) => nodes.iter().filter(|n| n.has_tag(tag)).cloned().collect(),
    };
    matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    matched
}

// ============================================================================
// In-memory source
// ============================================================================

/// Source over nodes already in memory, optionally failing every query.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    nodes: Vec<ContentNode>,
    errors: Vec<QueryError>,
}

impl MemorySource {
    pub fn new(nodes: Vec<ContentNode>) -> Self {
        Self {
            nodes,
            errors: Vec::new(),
        }
    }

    /// A source whose every response carries `message` as an error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            nodes: Vec::new(),
            errors: vec![QueryError::new(message)],
        }
    }
}

impl ContentSource for MemorySource {
    fn query(&self, query: &Query) -> QueryResponse {
        if !self.errors.is_empty() {
            return QueryResponse {
                data: Vec::new(),
                errors: self.errors.clone(),
            };
        }
        QueryResponse::ok(run_query(&self.nodes, query))
    }
}

// ============================================================================
// JSON export source
// ============================================================================

/// Top-level shape of a CMS export file.
#[derive(Debug, Deserialize)]
struct ExportFile {
    items: Vec<ContentNode>,
}

/// Source backed by a headless CMS JSON export.
///
/// Dates are RFC 3339. Missing `time_to_read` is computed from the body and
/// repeated tags are collapsed.
pub struct JsonExportSource {
    path: PathBuf,
    loaded: OnceLock<Result<Vec<ContentNode>, QueryError>>,
}

impl JsonExportSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded: OnceLock::new(),
        }
    }

    fn nodes(&self) -> &Result<Vec<ContentNode>, QueryError> {
        self.loaded.get_or_init(|| load_export(&self.path))
    }
}

fn load_export(path: &Path) -> Result<Vec<ContentNode>, QueryError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        QueryError::new(format!("content source unavailable: {}: {e}", path.display()))
    })?;
    let export: ExportFile = serde_json::from_str(&content)
        .map_err(|e| QueryError::new(format!("malformed export {}: {e}", path.display())))?;
    let nodes = export
        .items
        .into_iter()
        .map(|mut node| {
            node.tags = types::dedup_tags(node.tags);
            if node.time_to_read == 0 {
                node.time_to_read = types::time_to_read(&node.body);
            }
            node
        })
        .collect::<Vec<_>>();
    tracing::debug!(path = %path.display(), count = nodes.len(), "loaded CMS export");
    Ok(nodes)
}

impl ContentSource for JsonExportSource {
    fn query(&self, query: &Query) -> QueryResponse {
        match self.nodes() {
            Ok(nodes) => QueryResponse::ok(run_query(nodes, query)),
            Err(e) => QueryResponse::failed(e.clone()),
        }
    }
}

/// Open the source selected by `[source] format` for a content root.
pub fn open_source(root: &Path, config: &SiteConfig) -> Box<dyn ContentSource> {
    match config.source.format {
        SourceFormat::Markdown => Box::new(crate::scan::MarkdownSource::new(
            root.join(&config.source.posts_dir),
        )),
        SourceFormat::Json => Box::new(JsonExportSource::new(
            root.join(&config.source.export_file),
        )),
    }
}
