//! Page emission.
//!
//! A [`PageEmitter`] turns one [`PageInstruction`] into a built page. The
//! plan builder never looks at what an emitter does with an instruction; it
//! only needs every call to succeed.
//!
//! [`HtmlEmitter`] is the production emitter. Like a page query in a
//! framework-driven site, it resolves the data each template needs through
//! the same [`ContentSource`] the plan was built from:
//!
//! | Template | Query | Output |
//! |----------|-------|--------|
//! | Post | `PostById(context.id)` | `{output}/post/{slug}/index.html` |
//! | Tag | `PostsTagged(context.slug)` | `{output}/tag/{tag}/index.html` |
//! | Home | `AllPosts` | `{output}/index.html` |
//!
//! The home page is not part of the plan. It is written by
//! [`PageEmitter::finish`] once every planned page has been emitted.
//!
//! Emitting the same path twice overwrites the earlier file.

use crate::config::SiteMeta;
use crate::content::{ContentSource, Query, QueryFailure};
use crate::plan::{PagePlan, is_valid_route};
use crate::render;
use crate::types::{PageContext, PageInstruction};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Query(#[from] QueryFailure),
    #[error("No content with id {id:?} for page {path}")]
    MissingContent { path: String, id: String },
    #[error("Refusing to emit outside the output directory: {0}")]
    InvalidPath(String),
}

/// Materializes page instructions.
///
/// `Sync` so a plan can be emitted from a rayon pool.
pub trait PageEmitter: Sync {
    fn create_page(&self, page: &PageInstruction) -> Result<(), EmitError>;

    /// Called once after every page of `plan` was created.
    fn finish(&self, _plan: &PagePlan) -> Result<(), EmitError> {
        Ok(())
    }
}

/// Emit every instruction of `plan` in parallel, stopping at the first error.
///
/// Returns the number of pages emitted.
pub fn emit_all(plan: &PagePlan, emitter: &dyn PageEmitter) -> Result<usize, EmitError> {
    plan.posts
        .par_iter()
        .chain(plan.tags.par_iter())
        .try_for_each(|page| emitter.create_page(page))?;
    Ok(plan.len())
}

/// Renders pages to HTML files under an output directory.
pub struct HtmlEmitter<'a> {
    source: &'a dyn ContentSource,
    output_dir: PathBuf,
    site: SiteMeta,
    css: String,
}

impl<'a> HtmlEmitter<'a> {
    pub fn new(source: &'a dyn ContentSource, output_dir: &Path, site: SiteMeta) -> Self {
        Self {
            source,
            output_dir: output_dir.to_path_buf(),
            site,
            css: render::stylesheet().to_string(),
        }
    }

    /// File a route is written to: `/post/a` → `{output}/post/a/index.html`.
    ///
    /// Routes with empty, `.` or `..` segments are refused; they would land
    /// on another page's file or outside the output directory.
    pub fn output_file(&self, path: &str) -> Result<PathBuf, EmitError> {
        if !is_valid_route(path) {
            return Err(EmitError::InvalidPath(path.to_string()));
        }
        Ok(self.output_dir.join(&path[1..]).join("index.html"))
    }

    fn write(&self, file: &Path, html: String) -> Result<(), EmitError> {
        if let Some(dir) = file.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(file, html)?;
        Ok(())
    }

    fn render(&self, page: &PageInstruction) -> Result<String, EmitError> {
        let markup = match &page.context {
            PageContext::Post(ctx) => {
                let query = Query::PostById(ctx.id.clone());
                let node = self
                    .source
                    .query(&query)
                    .into_result(&query)?
                    .into_iter()
                    .next()
                    .ok_or_else(|| EmitError::MissingContent {
                        path: page.path.clone(),
                        id: ctx.id.clone(),
                    })?;
                render::render_post(&node, ctx, &self.site, &self.css)
            }
            PageContext::Tag(ctx) => {
                let query = Query::PostsTagged(ctx.slug.clone());
                let posts = self.source.query(&query).into_result(&query)?;
                render::render_tag(&ctx.slug, &posts, &self.site, &self.css)
            }
        };
        Ok(markup.into_string())
    }
}

impl PageEmitter for HtmlEmitter<'_> {
    fn create_page(&self, page: &PageInstruction) -> Result<(), EmitError> {
        let file = self.output_file(&page.path)?;
        let html = self.render(page)?;
        self.write(&file, html)?;
        tracing::debug!(path = %page.path, file = %file.display(), "page written");
        Ok(())
    }

    /// Writes the home page: every post, newest first.
    fn finish(&self, _plan: &PagePlan) -> Result<(), EmitError> {
        let query = Query::AllPosts;
        let posts = self.source.query(&query).into_result(&query)?;
        let html = render::render_home(&posts, &self.site, &self.css).into_string();
        let file = self.output_dir.join("index.html");
        self.write(&file, html)?;
        tracing::debug!(file = %file.display(), posts = posts.len(), "home page written");
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::content::MemorySource;
    use crate::plan::build_plan;
    use crate::test_helpers::{dated_node, node};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    /// Emitter that records instructions without materializing them.
    /// Uses Mutex so it is Sync and works under rayon.
    #[derive(Default)]
    pub struct RecordingEmitter {
        pub pages: Mutex<Vec<PageInstruction>>,
        fail_on: Option<String>,
        finished: AtomicBool,
    }

    impl RecordingEmitter {
        pub fn failing_on(path: &str) -> Self {
            Self {
                fail_on: Some(path.to_string()),
                ..Self::default()
            }
        }

        pub fn finished(&self) -> bool {
            self.finished.load(Ordering::SeqCst)
        }

        pub fn paths(&self) -> Vec<String> {
            self.pages
                .lock()
                .unwrap()
                .iter()
                .map(|p| p.path.clone())
                .collect()
        }
    }

    impl PageEmitter for RecordingEmitter {
        fn create_page(&self, page: &PageInstruction) -> Result<(), EmitError> {
            if self.fail_on.as_deref() == Some(page.path.as_str()) {
                return Err(EmitError::Io(std::io::Error::other("disk full")));
            }
            self.pages.lock().unwrap().push(page.clone());
            Ok(())
        }

        fn finish(&self, _plan: &PagePlan) -> Result<(), EmitError> {
            self.finished.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn sample_source() -> MemorySource {
        MemorySource::new(vec![
            node("1", "hello-world", &["intro"]),
            node("2", "second", &["intro", "rust"]),
        ])
    }

    #[test]
    fn emit_all_counts_pages() {
        let plan = build_plan(&sample_source()).unwrap();
        let emitter = RecordingEmitter::default();
        assert_eq!(emit_all(&plan, &emitter).unwrap(), 4);
        assert_eq!(emitter.paths().len(), 4);
    }

    #[test]
    fn output_file_maps_route_to_index_html() {
        let source = sample_source();
        let emitter = HtmlEmitter::new(&source, Path::new("/out"), SiteMeta::default());
        assert_eq!(
            emitter.output_file("/post/a").unwrap(),
            Path::new("/out/post/a/index.html")
        );
    }

    #[test]
    fn output_file_rejects_parent_segments() {
        let source = sample_source();
        let emitter = HtmlEmitter::new(&source, Path::new("/out"), SiteMeta::default());
        assert!(matches!(
            emitter.output_file("/post/../../etc"),
            Err(EmitError::InvalidPath(_))
        ));
    }

    #[test]
    fn output_file_rejects_routes_without_their_own_directory() {
        let source = sample_source();
        let emitter = HtmlEmitter::new(&source, Path::new("/out"), SiteMeta::default());
        for route in ["/tag/", "/tag/.", "/", "", "tag/a", "/tag//a"] {
            assert!(
                matches!(emitter.output_file(route), Err(EmitError::InvalidPath(_))),
                "{route:?} accepted"
            );
        }
    }

    #[test]
    fn finish_writes_home_page() {
        let tmp = TempDir::new().unwrap();
        let source = MemorySource::new(vec![
            dated_node("1", "older", &[], "2020-01-01"),
            dated_node("2", "newer", &[], "2021-06-01"),
        ]);
        let plan = build_plan(&source).unwrap();
        let emitter = HtmlEmitter::new(&source, tmp.path(), SiteMeta::default());
        emit_all(&plan, &emitter).unwrap();
        emitter.finish(&plan).unwrap();

        let home = fs::read_to_string(tmp.path().join("index.html")).unwrap();
        assert!(home.contains("<title>Home"));
        let newer = home.find(r#"href="/post/newer""#).unwrap();
        let older = home.find(r#"href="/post/older""#).unwrap();
        assert!(newer < older);
    }

    #[test]
    fn html_emitter_writes_post_and_tag_pages() {
        let tmp = TempDir::new().unwrap();
        let source = sample_source();
        let plan = build_plan(&source).unwrap();
        let emitter = HtmlEmitter::new(&source, tmp.path(), SiteMeta::default());
        emit_all(&plan, &emitter).unwrap();

        let post = fs::read_to_string(tmp.path().join("post/hello-world/index.html")).unwrap();
        assert!(post.contains("<h1>hello-world</h1>"));

        let tag = fs::read_to_string(tmp.path().join("tag/intro/index.html")).unwrap();
        assert!(tag.contains("Tag: intro"));
        assert!(tag.contains("/post/hello-world"));
        assert!(tag.contains("/post/second"));
        assert!(tmp.path().join("tag/rust/index.html").exists());
    }

    #[test]
    fn html_emitter_missing_post_is_error() {
        let tmp = TempDir::new().unwrap();
        let source = MemorySource::new(vec![]);
        let emitter = HtmlEmitter::new(&source, tmp.path(), SiteMeta::default());
        let page = PageInstruction {
            path: "/post/ghost".to_string(),
            context: PageContext::Post(crate::types::PostContext {
                id: "404".to_string(),
                slug: "ghost".to_string(),
                previous: None,
                next: None,
            }),
        };
        assert!(matches!(
            emitter.create_page(&page),
            Err(EmitError::MissingContent { .. })
        ));
    }

    #[test]
    fn html_emitter_query_error_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let source = MemorySource::failing("source unavailable");
        let emitter = HtmlEmitter::new(&source, tmp.path(), SiteMeta::default());
        let page = PageInstruction {
            path: "/tag/x".to_string(),
            context: PageContext::Tag(crate::types::TagContext {
                slug: "x".to_string(),
            }),
        };
        assert!(matches!(
            emitter.create_page(&page),
            Err(EmitError::Query(_))
        ));
    }
}
