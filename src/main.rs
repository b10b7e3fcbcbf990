use clap::{Parser, Subcommand};
use og_card::content::{self, SiteSource};
use og_card::{config, output, render};
use std::path::{Path, PathBuf};
use tracing::{Level, warn};
use tracing_subscriber::FmtSubscriber;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "og-card")]
#[command(about = "Social card image generator for static sites")]
#[command(long_about = "\
Social card image generator for static sites

Renders one PNG card per post, page or collection entry: the title in large
type, a metadata line (date, tags, custom fields), an optional thumbnail and
the site domain. Cards are written once; existing files are left alone unless
--force is given.

Site structure:

  site/
  ├── config.toml                  # [og_image] table configures the cards
  ├── about.md                     # Page (collection \"pages\")
  ├── _posts/
  │   └── 2024-01-05-hello.md      # Post (date from the file name)
  ├── _projects/
  │   └── og-card.md               # Entry of collection \"projects\"
  └── assets/images/og/posts/
      └── hello.png                # Rendered card

Front matter is TOML between +++ lines. An [og_image] table in front matter
overrides the site config for that item; og_image = false disables its card.

Run 'og-card gen-config' to print a documented [og_image] config.")]
#[command(version = version_string())]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Site config file [default: <source>/config.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log progress, not just warnings
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render cards for every configured collection
    Build {
        /// Re-render cards that already exist
        #[arg(long)]
        force: bool,

        /// Where to write the JSON render report [default: <output_dir>/manifest.json]
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Print the draw operations for one content file as JSON
    Plan {
        /// Content file, e.g. _posts/2024-01-05-hello.md
        file: PathBuf,
    },
    /// Validate the config and count collection items without rendering
    Check,
    /// Print a stock config with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let source = SiteSource::new(&cli.source);

    match &cli.command {
        Command::Build { force, manifest } => {
            let (mut site_config, config_path) = load_site_config(&cli)?;
            site_config.force |= *force;
            if !site_config.enabled {
                println!("==> Cards disabled in {}", config_path.display());
                return Ok(());
            }
            init_thread_pool(&site_config.processing);

            println!("==> Rendering cards in {}", cli.source.display());
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_render_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let report = render::render_site(&site_config, &source, Some(tx));
            printer.join().ok();
            output::print_report(&report);

            let manifest_path =
                manifest.clone().unwrap_or_else(|| manifest_default(&cli.source, &site_config));
            if let Some(parent) = manifest_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&manifest_path, serde_json::to_string_pretty(&report)?)?;

            let failures = report.failures();
            if failures > 0 {
                return Err(format!("{failures} card(s) failed").into());
            }
        }
        Command::Plan { file } => {
            let (site_config, _) = load_site_config(&cli)?;
            let ops = render::plan_item(&site_config, &source, file)?;
            println!("{}", serde_json::to_string_pretty(&ops)?);
        }
        Command::Check => {
            let (site_config, config_path) = load_site_config(&cli)?;
            let counts = content::count_items(&source, &site_config.collections);
            output::print_check(&site_config, &config_path, &counts);
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the site config and start logging.
///
/// Logging starts after the config is read so `verbose` in the file counts;
/// unknown keys are reported once the subscriber is up.
fn load_site_config(cli: &Cli) -> Result<(config::CardConfig, PathBuf), Box<dyn std::error::Error>> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.source.join("config.toml"));
    let (site_config, ignored) = config::read_config(&config_path)?;
    init_logging(cli.verbose || site_config.verbose)?;
    for key in ignored {
        warn!(key = %key, file = %config_path.display(), "ignoring unknown config key");
    }
    Ok((site_config, config_path))
}

fn init_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose { Level::INFO } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn manifest_default(root: &Path, config: &config::CardConfig) -> PathBuf {
    root.join(config.output_dir.trim_start_matches('/'))
        .join("manifest.json")
}
