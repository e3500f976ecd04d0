//! HTML templates for the two page kinds.
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating, so
//! every interpolated value is escaped unless wrapped in `PreEscaped`. Only
//! the stylesheet and rendered markdown bodies are inserted unescaped.
//!
//! ## Pages
//!
//! - **Post** (`/post/{slug}`): title, created and last-updated dates,
//!   time-to-read, markdown body, tag links, previous/next links
//! - **Tag** (`/tag/{tag}`): every post carrying the tag, newest first, with
//!   date, time-to-read and excerpt
//! - **Home** (`/`): every post, newest first, in the same list layout
//!
//! Post pages show dates as `May 01, 2020`; the listing pages use the shorter
//! ordinal form `May 1st 2020`.

use crate::config::SiteMeta;
use crate::plan::{post_path, tag_path};
use crate::types::{ContentNode, PostContext};
use chrono::{DateTime, Datelike, Utc};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Options, Parser, html as md_html};

const CSS: &str = include_str!("../static/style.css");

pub fn stylesheet() -> &'static str {
    CSS
}

/// `May 01, 2020`
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%B %d, %Y").to_string()
}

/// `May 1st 2020`, used by post listings.
pub fn format_listing_date(date: &DateTime<Utc>) -> String {
    let day = date.day();
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{} {}{} {}", date.format("%B"), day, suffix, date.year())
}

/// One popcorn per three minutes of reading (at least one), then the minutes.
///
/// ```text
/// 1 min  → 🍿 1 min
/// 6 min  → 🍿🍿 6 min
/// 10 min → 🍿🍿🍿 10 min
/// ```
pub fn format_time_to_read(minutes: u32) -> String {
    let buckets = (minutes as f64 / 3.0).round() as usize;
    format!("{} {} min", "\u{1F37F}".repeat(buckets.max(1)), minutes)
}

pub fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_HEADING_ATTRIBUTES;
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}

// ============================================================================
// Layout
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, site: &SiteMeta, css: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                @if !site.description.is_empty() {
                    meta name="description" content=(site.description);
                }
                title { (title) " | " (site.title) }
                style { (PreEscaped(css)) }
            }
            body {
                header.site-header {
                    a.site-title href=(site.url_for("/")) { (site.title) }
                }
                main { (content) }
                footer.site-footer {
                    @if !site.author.is_empty() {
                        "\u{00A9} " (site.author)
                    }
                }
            }
        }
    }
}

fn post_meta(post: &ContentNode, date: String) -> Markup {
    html! {
        time datetime=(post.created_at.to_rfc3339()) { (date) }
        span.separator { "\u{2022}" }
        span.time-to-read { (format_time_to_read(post.time_to_read)) }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders a post page.
pub fn render_post(post: &ContentNode, ctx: &PostContext, site: &SiteMeta, css: &str) -> Markup {
    let updated = format_date(&post.updated_at);

    let content = html! {
        article.post {
            header.post-header {
                h1 { (post.title) }
                div.post-meta {
                    (post_meta(post, format_date(&post.created_at)))
                    @if post.updated_at != post.created_at {
                        span.separator { "|" }
                        span aria-label={ "Last updated on " (updated) } {
                            "Last Updated: "
                            time datetime=(post.updated_at.to_rfc3339()) { (updated) }
                        }
                    }
                }
            }
            div.post-content {
                (PreEscaped(markdown_to_html(&post.body)))
            }
            @if !post.tags.is_empty() {
                ul.post-tags {
                    @for tag in &post.tags {
                        li { a href=(site.url_for(&tag_path(tag))) { "#" (tag) } }
                    }
                }
            }
            @if ctx.previous.is_some() || ctx.next.is_some() {
                nav.post-siblings {
                    @if let Some(previous) = &ctx.previous {
                        a.previous rel="prev" href=(site.url_for(&post_path(&previous.slug))) {
                            "\u{2190} " (previous.title)
                        }
                    }
                    @if let Some(next) = &ctx.next {
                        a.next rel="next" href=(site.url_for(&post_path(&next.slug))) {
                            (next.title) " \u{2192}"
                        }
                    }
                }
            }
        }
    };

    base_document(&post.title, site, css, content)
}

fn post_list(posts: &[ContentNode], site: &SiteMeta) -> Markup {
    html! {
        ul.post-list {
            @for post in posts {
                li {
                    h2 { a href=(site.url_for(&post_path(&post.slug))) { (post.title) } }
                    div.post-meta { (post_meta(post, format_listing_date(&post.created_at))) }
                    @if !post.excerpt.is_empty() {
                        p.excerpt { (post.excerpt) }
                    }
                }
            }
        }
    }
}

/// Renders a tag page listing `posts` in the given order.
pub fn render_tag(tag: &str, posts: &[ContentNode], site: &SiteMeta, css: &str) -> Markup {
    let title = format!("Tag: {tag}");

    let content = html! {
        h1.tag-title { (title) }
        (post_list(posts, site))
    };

    base_document(&title, site, css, content)
}

/// Renders the home page listing `posts` in the given order.
pub fn render_home(posts: &[ContentNode], site: &SiteMeta, css: &str) -> Markup {
    let content = html! {
        @if !site.description.is_empty() {
            p.site-description { (site.description) }
        }
        (post_list(posts, site))
    };

    base_document("Home", site, css, content)
}
