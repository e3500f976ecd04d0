//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every entity (post, tag, page) is its semantic identity, a positional
//! index plus a title or route, with filesystem paths shown as secondary
//! context on indented lines.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Posts
//! 001 Hello World
//!     Slug: hello-world
//!     Source: 2020-05-01-hello-world.md
//!     Tags: intro
//! 002 Unfinished Thoughts [draft]
//!     Slug: unfinished-thoughts
//!     Source: 2021-06-01-unfinished-thoughts.md
//!
//! Tags
//! 001 intro (1 post)
//!
//! 1 published post, 1 draft, 1 tag
//! ```
//!
//! ## Plan
//!
//! ```text
//! Posts
//! 001 /post/hello-world
//!     Next: older-post
//!
//! Tags
//! 001 /tag/intro
//!
//! Planned 2 pages (1 post, 1 tag)
//! ```
//!
//! ## Build
//!
//! ```text
//! /post/hello-world → post/hello-world/index.html
//! /tag/intro → tag/intro/index.html
//!
//! Built 2 pages (1 post, 1 tag)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::deploy::DeployReport;
use crate::plan::PagePlan;
use crate::scan::ScannedPost;
use crate::types::PageContext;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 post`, `3 posts`
fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

/// Strip HTML tags from a string (simple angle-bracket stripping).
///
/// CMS exports may carry HTML in excerpts.
fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

// ============================================================================
// check
// ============================================================================

/// Format the content inventory: every post (drafts flagged) and every tag
/// carried by a published post.
pub fn format_check_output(posts: &[ScannedPost]) -> Vec<String> {
    let mut lines = vec!["Posts".to_string()];
    let ctx = indent(1);

    for (i, post) in posts.iter().enumerate() {
        let node = &post.node;
        let marker = if post.draft { " [draft]" } else { "" };
        lines.push(format!("{} {}{}", format_index(i + 1), node.title, marker));
        lines.push(format!("{ctx}Slug: {}", node.slug));
        lines.push(format!("{ctx}Source: {}", post.source_path));
        if !node.tags.is_empty() {
            lines.push(format!("{ctx}Tags: {}", node.tags.join(", ")));
        }
        let excerpt = strip_html_tags(&node.excerpt);
        if !excerpt.trim().is_empty() {
            lines.push(format!("{ctx}Excerpt: {}", truncate_desc(excerpt.trim(), 60)));
        }
    }

    let mut tags: Vec<(&str, usize)> = Vec::new();
    for post in posts.iter().filter(|p| !p.draft) {
        for tag in &post.node.tags {
            match tags.iter_mut().find(|(t, _)| *t == tag.as_str()) {
                Some((_, count)) => *count += 1,
                None => tags.push((tag.as_str(), 1)),
            }
        }
    }
    if !tags.is_empty() {
        lines.push(String::new());
        lines.push("Tags".to_string());
        for (i, (tag, count)) in tags.iter().enumerate() {
            lines.push(format!("{} {} ({})", format_index(i + 1), tag, plural(*count, "post")));
        }
    }

    let drafts = posts.iter().filter(|p| p.draft).count();
    lines.push(String::new());
    lines.push(format!(
        "{} published {}, {}, {}",
        posts.len() - drafts,
        if posts.len() - drafts == 1 { "post" } else { "posts" },
        plural(drafts, "draft"),
        plural(tags.len(), "tag")
    ));
    lines
}

pub fn print_check_output(posts: &[ScannedPost]) {
    for line in format_check_output(posts) {
        println!("{}", line);
    }
}

// ============================================================================
// plan
// ============================================================================

fn plan_summary(verb: &str, plan: &PagePlan) -> String {
    format!(
        "{} {} ({}, {})",
        verb,
        plural(plan.len(), "page"),
        plural(plan.posts.len(), "post"),
        plural(plan.tags.len(), "tag")
    )
}

/// Format the page plan: post routes with their sibling links, then tag routes.
pub fn format_plan_output(plan: &PagePlan) -> Vec<String> {
    let mut lines = Vec::new();
    let ctx = indent(1);

    if !plan.posts.is_empty() {
        lines.push("Posts".to_string());
        for (i, page) in plan.posts.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), page.path));
            if let PageContext::Post(post) = &page.context {
                if let Some(previous) = &post.previous {
                    lines.push(format!("{ctx}Previous: {}", previous.slug));
                }
                if let Some(next) = &post.next {
                    lines.push(format!("{ctx}Next: {}", next.slug));
                }
            }
        }
    }

    if !plan.tags.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Tags".to_string());
        for (i, page) in plan.tags.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), page.path));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(plan_summary("Planned", plan));
    lines
}

pub fn print_plan_output(plan: &PagePlan) {
    for line in format_plan_output(plan) {
        println!("{}", line);
    }
}

// ============================================================================
// build
// ============================================================================

/// Format the build result: each route and the file it was written to,
/// relative to the output directory.
pub fn format_build_output(plan: &PagePlan) -> Vec<String> {
    let mut lines: Vec<String> = plan
        .iter()
        .map(|page| {
            let relative = page.path.trim_matches('/');
            format!("{} \u{2192} {}/index.html", page.path, relative)
        })
        .collect();
    lines.push("/ \u{2192} index.html".to_string());
    lines.push(String::new());
    lines.push(plan_summary("Built", plan));
    lines
}

pub fn print_build_output(plan: &PagePlan) {
    for line in format_build_output(plan) {
        println!("{}", line);
    }
}

// ============================================================================
// verify-deploy
// ============================================================================

/// Format a passing deploy verification.
pub fn format_deploy_output(report: &DeployReport) -> Vec<String> {
    let mut lines = vec![report.title.clone()];
    lines.push(format!("{}URL: {}", indent(1), report.deploy_url));
    for (i, test) in report.tests.iter().enumerate() {
        lines.push(format!("{}{} {}", indent(1), format_index(i + 1), test.name));
    }
    lines.push(String::new());
    lines.push(format!("{} ({})", report.summary, plural(report.tests.len(), "test")));
    lines
}

pub fn print_deploy_output(report: &DeployReport) {
    for line in format_deploy_output(report) {
        println!("{}", line);
    }
}

pub fn format_deploy_skipped(reason: &str) -> String {
    format!("Skipping end-to-end tests: {reason}")
}
