//! Page plan construction.
//!
//! Given the posts returned by a [`ContentSource`], computes every page the
//! site needs:
//!
//! ```text
//! /post/{slug}   one per post   (template Post, context: id, slug, siblings)
//! /tag/{tag}     one per tag    (template Tag, context: slug = tag)
//! ```
//!
//! ## Passes
//!
//! The post pass and the tag pass read the same node list and share nothing
//! else, so [`build_plan`] runs them with `rayon::join`. Both must finish
//! before paths are checked for collisions.
//!
//! ## Failure
//!
//! A query that reports errors aborts the build before any instruction is
//! produced. The same goes for nodes without an id or slug, repeated ids,
//! colliding paths, and paths with empty, `.` or `..` segments.
//!
//! ## Tag Order
//!
//! Distinct tags are emitted in order of first appearance across the node
//! list. Consumers should only rely on completeness, not on order.
//!
//! ## Sibling Links
//!
//! Posts are ordered by creation date, newest first (ties keep input order).
//! `previous` points at the newer neighbour and `next` at the older one.
//! Instructions themselves keep input order.

use crate::content::{ContentSource, Query, QueryFailure};
use crate::emit::{EmitError, PageEmitter, emit_all};
use crate::types::{
    ContentNode, PageContext, PageInstruction, PostContext, SiblingLink, TagContext,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error(transparent)]
    Query(#[from] QueryFailure),
    #[error("Content node #{index} has no {field}")]
    MalformedNode { index: usize, field: &'static str },
    #[error("Duplicate page path: {0}")]
    DuplicatePath(String),
    #[error("Page path does not map to its own directory: {0:?}")]
    InvalidPath(String),
    #[error("Content nodes #{first} and #{second} share id {id:?}")]
    DuplicateId {
        id: String,
        first: usize,
        second: usize,
    },
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Page plan failed: {0}")]
    Plan(#[from] PlanError),
    #[error("Page emission failed: {0}")]
    Emit(#[from] EmitError),
}

/// Every page of one build.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PagePlan {
    pub posts: Vec<PageInstruction>,
    pub tags: Vec<PageInstruction>,
}

impl PagePlan {
    /// Post instructions followed by tag instructions.
    pub fn iter(&self) -> impl Iterator<Item = &PageInstruction> {
        self.posts.iter().chain(self.tags.iter())
    }

    pub fn len(&self) -> usize {
        self.posts.len() + self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn post_path(slug: &str) -> String {
    format!("/post/{slug}")
}

pub fn tag_path(tag: &str) -> String {
    format!("/tag/{tag}")
}

/// One Post instruction per node, in input order.
pub fn build_post_pages(nodes: &[ContentNode]) -> Vec<PageInstruction> {
    let siblings = sibling_links(nodes);
    nodes
        .iter()
        .zip(siblings)
        .map(|(node, (previous, next))| PageInstruction {
            path: post_path(&node.slug),
            context: PageContext::Post(PostContext {
                id: node.id.clone(),
                slug: node.slug.clone(),
                previous,
                next,
            }),
        })
        .collect()
}

/// One Tag instruction per distinct tag.
pub fn build_tag_pages(nodes: &[ContentNode]) -> Vec<PageInstruction> {
    distinct_tags(nodes)
        .into_iter()
        .map(|tag| PageInstruction {
            path: tag_path(tag),
            context: PageContext::Tag(TagContext {
                slug: tag.to_string(),
            }),
        })
        .collect()
}

/// Distinct tags across all nodes in order of first appearance.
/// Exact, case-sensitive comparison.
pub fn distinct_tags(nodes: &[ContentNode]) -> Vec<&str> {
    let mut seen = HashSet::new();
    nodes
        .iter()
        .flat_map(|n| n.tags.iter())
        .map(String::as_str)
        .filter(|t| seen.insert(*t))
        .collect()
}

/// `(previous, next)` for each node, indexed like `nodes`.
fn sibling_links(nodes: &[ContentNode]) -> Vec<(Option<SiblingLink>, Option<SiblingLink>)> {
    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by(|&a, &b| nodes[b].created_at.cmp(&nodes[a].created_at));

    let link = |idx: usize| SiblingLink {
        slug: nodes[idx].slug.clone(),
        title: nodes[idx].title.clone(),
    };

    let mut links = vec![(None, None); nodes.len()];
    for (pos, &idx) in order.iter().enumerate() {
        let previous = pos.checked_sub(1).map(|p| link(order[p]));
        let next = order.get(pos + 1).map(|&n| link(n));
        links[idx] = (previous, next);
    }
    links
}

/// Reject nodes that break the input contract (empty or repeated id, empty slug).
pub fn validate_nodes(nodes: &[ContentNode]) -> Result<(), PlanError> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (index, node) in nodes.iter().enumerate() {
        if node.id.trim().is_empty() {
            return Err(PlanError::MalformedNode { index, field: "id" });
        }
        if node.slug.trim().is_empty() {
            return Err(PlanError::MalformedNode {
                index,
                field: "slug",
            });
        }
        if let Some(first) = seen.insert(node.id.as_str(), index) {
            return Err(PlanError::DuplicateId {
                id: node.id.clone(),
                first,
                second: index,
            });
        }
    }
    Ok(())
}

/// A route is `/` followed by one or more non-empty segments, none of them
/// `.` or `..`. Anything else would not map to its own output directory.
pub fn is_valid_route(path: &str) -> bool {
    path.strip_prefix('/').is_some_and(|rest| {
        rest.split('/')
            .all(|segment| !matches!(segment, "" | "." | ".."))
    })
}

fn check_paths(plan: &PagePlan) -> Result<(), PlanError> {
    let mut seen = HashSet::new();
    for page in plan.iter() {
        if !is_valid_route(&page.path) {
            return Err(PlanError::InvalidPath(page.path.clone()));
        }
        if !seen.insert(page.path.as_str()) {
            return Err(PlanError::DuplicatePath(page.path.clone()));
        }
    }
    Ok(())
}

/// Query all posts and compute the full page plan.
pub fn build_plan(source: &dyn ContentSource) -> Result<PagePlan, PlanError> {
    let query = Query::AllPosts;
    let nodes = source.query(&query).into_result(&query)?;
    validate_nodes(&nodes)?;

    let (posts, tags) = rayon::join(|| build_post_pages(&nodes), || build_tag_pages(&nodes));
    let plan = PagePlan { posts, tags };
    check_paths(&plan)?;

    tracing::debug!(
        posts = plan.posts.len(),
        tags = plan.tags.len(),
        "page plan computed"
    );
    Ok(plan)
}

/// Build-time page generation hook: plan, hand every page to `emitter`, then
/// let it finish the site.
pub fn create_pages(
    source: &dyn ContentSource,
    emitter: &dyn PageEmitter,
) -> Result<PagePlan, BuildError> {
    let plan = build_plan(source)?;
    let written = emit_all(&plan, emitter)?;
    emitter.finish(&plan)?;
    tracing::info!(pages = written, "pages emitted");
    Ok(plan)
}
