use clap::{Parser, Subcommand};
use folio::config::{self, SiteConfig, SourceFormat};
use folio::content::{self, Query};
use folio::deploy::{self, DeployGate, GhostInspector, GithubStatuses};
use folio::emit::HtmlEmitter;
use folio::output;
use folio::plan;
use folio::scan::{self, ScannedPost};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("FOLIO_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("FOLIO_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Page generation for a markdown or CMS-backed blog")]
#[command(long_about = "\
Page generation for a markdown or CMS-backed blog

Every build queries all posts and emits one page per post and one page per
distinct tag:

  /post/{slug}   post page with previous/next links (newest first)
  /tag/{tag}     every post carrying the tag, newest first
  /              home page listing every post, newest first

Content structure:

  content/
  ├── config.toml                      # Site config (optional)
  ├── export.json                      # CMS export (when source.format = \"json\")
  └── posts/
      ├── 2020-05-01-hello-world.md    # Date and slug from the filename
      └── notes/tooling.md             # Subdirectories are walked too

Front matter is an optional +++ fenced TOML block (title, slug, tags, excerpt,
created_at, updated_at, id, draft). Drafts are listed by 'check' but never built.

Run 'folio gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Print debug diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute the page plan without writing anything
    Plan {
        /// Print the plan as JSON page instructions
        #[arg(long)]
        json: bool,
    },
    /// Plan and emit every page as HTML
    Build,
    /// Validate content and list posts and tags
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
    /// Run end-to-end tests against a deploy preview and report a commit status
    VerifyDeploy,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Plan { json } => {
            let config = config::load_config(&cli.source)?;
            init_thread_pool(&config.build);
            let source = content::open_source(&cli.source, &config);
            let plan = plan::build_plan(source.as_ref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                output::print_plan_output(&plan);
            }
        }
        Command::Build => {
            let config = config::load_config(&cli.source)?;
            init_thread_pool(&config.build);
            let source = content::open_source(&cli.source, &config);

            println!("==> Building {} → {}", cli.source.display(), cli.output.display());
            let emitter = HtmlEmitter::new(source.as_ref(), &cli.output, config.site.clone());
            let plan = plan::create_pages(source.as_ref(), &emitter)?;
            output::print_build_output(&plan);
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            let config = config::load_config(&cli.source)?;
            println!("==> Checking {}", cli.source.display());
            let posts = inventory(&cli.source, &config)?;
            output::print_check_output(&posts);
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::VerifyDeploy => {
            let config = config::load_config(&cli.source)?;
            match DeployGate::from_env()? {
                DeployGate::Skip(reason) => {
                    tracing::info!(%reason, "deploy verification skipped");
                    println!("{}", output::format_deploy_skipped(&reason));
                }
                DeployGate::Run(deploy_config) => {
                    let runner = GhostInspector::new(&config.deploy)?;
                    let reporter = GithubStatuses::new(&config.deploy)?;
                    let result =
                        deploy::verify_deploy(&deploy_config, &config.deploy, &runner, &reporter);
                    match result {
                        Ok(report) => output::print_deploy_output(&report),
                        Err(err) => {
                            tracing::error!(severity = ?err.severity(), "deploy verification failed");
                            return Err(err.into());
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

/// Diagnostics go to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "folio=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Initialize the rayon thread pool based on build config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(build: &config::BuildConfig) {
    let threads = config::effective_threads(build);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Every post the configured source knows about. Markdown sources include
/// drafts; a CMS export only ever holds published posts.
fn inventory(
    root: &Path,
    config: &SiteConfig,
) -> Result<Vec<ScannedPost>, Box<dyn std::error::Error>> {
    match config.source.format {
        SourceFormat::Markdown => Ok(scan::scan(&root.join(&config.source.posts_dir))?),
        SourceFormat::Json => {
            let source = content::open_source(root, config);
            let query = Query::AllPosts;
            let nodes = source.query(&query).into_result(&query)?;
            Ok(nodes
                .into_iter()
                .map(|node| ScannedPost {
                    source_path: config.source.export_file.clone(),
                    draft: false,
                    node,
                })
                .collect())
        }
    }
}
