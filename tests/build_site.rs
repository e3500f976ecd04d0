//! End-to-end build of the fixture site through the library API.
//!
//! Copies `fixtures/content/` into a temp directory, loads its config, builds
//! every page into a temp output directory, and checks the emitted HTML.
//!
//! Run with: cargo test --test build_site

use folio::config::{self, SourceFormat};
use folio::content::{self, Query};
use folio::emit::HtmlEmitter;
use folio::plan::{self, BuildError, PlanError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn copy_dir_recursive(src: &Path, dst: &Path) {
    for entry in fs::read_dir(src).unwrap() {
        let entry = entry.unwrap();
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            fs::create_dir_all(&dst_path).unwrap();
            copy_dir_recursive(&src_path, &dst_path);
        } else {
            fs::copy(&src_path, &dst_path).unwrap();
        }
    }
}

fn fixture_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path());
    tmp
}

fn read_page(out: &Path, route: &str) -> String {
    let file = out.join(route.trim_start_matches('/')).join("index.html");
    fs::read_to_string(&file).unwrap_or_else(|e| panic!("{}: {e}", file.display()))
}

#[test]
fn fixture_site_builds_every_page() {
    let root = fixture_site();
    let out = TempDir::new().unwrap();

    let config = config::load_config(root.path()).unwrap();
    assert_eq!(config.site.title, "Field Notes");
    let source = content::open_source(root.path(), &config);
    let emitter = HtmlEmitter::new(source.as_ref(), out.path(), config.site.clone());
    let plan = plan::create_pages(source.as_ref(), &emitter).unwrap();

    let mut routes: Vec<&str> = plan.iter().map(|p| p.path.as_str()).collect();
    routes.sort();
    assert_eq!(
        routes,
        vec![
            "/post/hello-world",
            "/post/rust-iterators",
            "/post/static-sites",
            "/tag/intro",
            "/tag/programming",
            "/tag/rust",
            "/tag/web",
        ]
    );
    for route in routes {
        assert!(out.path().join(&route[1..]).join("index.html").is_file());
    }
    assert!(!out.path().join("post/unfinished-thoughts").exists());
    assert!(!out.path().join("tag/notes").exists());
}

#[test]
fn post_pages_link_neighbours_by_date() {
    let root = fixture_site();
    let out = TempDir::new().unwrap();
    let config = config::load_config(root.path()).unwrap();
    let source = content::open_source(root.path(), &config);
    let emitter = HtmlEmitter::new(source.as_ref(), out.path(), config.site.clone());
    plan::create_pages(source.as_ref(), &emitter).unwrap();

    let newest = read_page(out.path(), "/post/static-sites");
    assert!(newest.contains("<title>Why Static Sites | Field Notes</title>"));
    assert!(!newest.contains(r#"rel="prev""#));
    assert!(newest.contains(r#"rel="next" href="/post/rust-iterators""#));

    let middle = read_page(out.path(), "/post/rust-iterators");
    assert!(middle.contains("<h1>Iterators in Rust</h1>"));
    assert!(middle.contains("Last Updated: "));
    assert!(middle.contains(r#"rel="prev" href="/post/static-sites""#));
    assert!(middle.contains(r#"rel="next" href="/post/hello-world""#));

    let oldest = read_page(out.path(), "/post/hello-world");
    assert!(oldest.contains(r#"rel="prev" href="/post/rust-iterators""#));
    assert!(!oldest.contains(r#"rel="next""#));
    assert!(oldest.contains("\u{00A9} Sam Rivera"));
}

#[test]
fn tag_pages_list_newest_first() {
    let root = fixture_site();
    let out = TempDir::new().unwrap();
    let config = config::load_config(root.path()).unwrap();
    let source = content::open_source(root.path(), &config);
    let emitter = HtmlEmitter::new(source.as_ref(), out.path(), config.site.clone());
    plan::create_pages(source.as_ref(), &emitter).unwrap();

    let programming = read_page(out.path(), "/tag/programming");
    assert!(programming.contains("Tag: programming"));
    let newer = programming.find("/post/static-sites").unwrap();
    let older = programming.find("/post/rust-iterators").unwrap();
    assert!(newer < older);
    assert!(!programming.contains("/post/hello-world\""));
}

#[test]
fn json_export_source_builds() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("config.toml"),
        "[source]\nformat = \"json\"\nexport_file = \"cms.json\"\n",
    )
    .unwrap();
    fs::write(
        root.path().join("cms.json"),
        r#"{
            "items": [
                {
                    "id": "5e1",
                    "slug": "from-the-cms",
                    "title": "From the CMS",
                    "tags": ["cms", "cms"],
                    "created_at": "2020-02-01T10:00:00Z",
                    "updated_at": "2020-02-01T10:00:00Z",
                    "body": "Exported **markdown**."
                }
            ]
        }"#,
    )
    .unwrap();

    let config = config::load_config(root.path()).unwrap();
    assert_eq!(config.source.format, SourceFormat::Json);
    let source = content::open_source(root.path(), &config);

    let nodes = source
        .query(&Query::AllPosts)
        .into_result(&Query::AllPosts)
        .unwrap();
    assert_eq!(nodes[0].tags, vec!["cms"]);
    assert_eq!(nodes[0].time_to_read, 1);

    let out = TempDir::new().unwrap();
    let emitter = HtmlEmitter::new(source.as_ref(), out.path(), config.site.clone());
    let plan = plan::create_pages(source.as_ref(), &emitter).unwrap();
    assert_eq!(plan.len(), 2);
    assert!(read_page(out.path(), "/post/from-the-cms").contains("<strong>markdown</strong>"));
}

#[test]
fn home_page_lists_every_post() {
    let root = fixture_site();
    let out = TempDir::new().unwrap();
    let config = config::load_config(root.path()).unwrap();
    let source = content::open_source(root.path(), &config);
    let emitter = HtmlEmitter::new(source.as_ref(), out.path(), config.site.clone());
    plan::create_pages(source.as_ref(), &emitter).unwrap();

    let home = fs::read_to_string(out.path().join("index.html")).unwrap();
    assert!(home.contains("<title>Home | Field Notes</title>"));
    let positions: Vec<usize> = ["static-sites", "rust-iterators", "hello-world"]
        .iter()
        .map(|slug| home.find(&format!(r#"href="/post/{slug}""#)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(!home.contains("/post/unfinished-thoughts"));

    let post = read_page(out.path(), "/post/hello-world");
    assert!(post.contains(r#"href="/""#));
}

#[test]
fn json_export_with_repeated_id_is_rejected() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("config.toml"), "[source]\nformat = \"json\"\n").unwrap();
    fs::write(
        root.path().join("export.json"),
        r#"{
            "items": [
                {"id": "1", "slug": "first", "title": "First", "created_at": "2020-01-01T00:00:00Z", "updated_at": "2020-01-01T00:00:00Z", "body": "a"},
                {"id": "1", "slug": "second", "title": "Second", "created_at": "2021-01-01T00:00:00Z", "updated_at": "2021-01-01T00:00:00Z", "body": "b"}
            ]
        }"#,
    )
    .unwrap();

    let out = TempDir::new().unwrap();
    let config = config::load_config(root.path()).unwrap();
    let source = content::open_source(root.path(), &config);
    let emitter = HtmlEmitter::new(source.as_ref(), out.path(), config.site.clone());
    let err = plan::create_pages(source.as_ref(), &emitter).unwrap_err();

    assert!(matches!(
        err,
        BuildError::Plan(PlanError::DuplicateId { ref id, .. }) if id == "1"
    ));
    assert!(!out.path().join("post").exists());
}

#[test]
fn missing_posts_directory_emits_nothing() {
    let root = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let dist = out.path().join("dist");

    let config = config::load_config(root.path()).unwrap();
    let source = content::open_source(root.path(), &config);
    let emitter = HtmlEmitter::new(source.as_ref(), &dist, config.site.clone());
    let err = plan::create_pages(source.as_ref(), &emitter).unwrap_err();

    assert!(matches!(err, BuildError::Plan(PlanError::Query(_))));
    assert!(err.to_string().contains("unavailable"));
    assert!(!dist.exists());
}
