// src/main.rs
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use promo_scraper::catalog::{build_categories, read_catalog};
use promo_scraper::config::{
    Settings, CATALOG_FILE, CATEGORIES_FILE, CATEGORY_DELAY, DATA_DIR, MAX_PRODUCTS_PER_CATEGORY,
    RAW_FILE,
};
use promo_scraper::crawl::CrawlLimits;
use promo_scraper::fetch::Fetcher;
use promo_scraper::images::download_images;
use promo_scraper::pipeline::{self, NormalizeContext, NormalizeOutcome, NormalizePaths};
use promo_scraper::report::CatalogReport;
use promo_scraper::source::SourceProfile;

#[derive(Parser)]
#[command(name = "promo_scraper")]
#[command(about = "Scrape promotional-product catalogs and normalize them for the storefront")]
#[command(version)]
struct Cli {
    /// Verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a source into a raw JSON dump
    Scrape(ScrapeArgs),

    /// Merge a raw dump into the catalog and regenerate categories
    Normalize(NormalizeArgs),

    /// Scrape, then normalize
    Pipeline {
        #[command(flatten)]
        scrape: ScrapeArgs,

        #[command(flatten)]
        normalize: NormalizeArgs,

        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show per-category counts for a catalog
    Stats {
        #[arg(long, default_value_os_t = default_path(CATALOG_FILE))]
        catalog: PathBuf,

        /// Also write the table as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Settings file with the category table
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Clone)]
struct ScrapeArgs {
    /// Source preset
    #[arg(long, default_value = "catalogospromocionales")]
    source: String,

    /// Raw dump to write
    #[arg(long, default_value_os_t = default_path(RAW_FILE))]
    out: PathBuf,

    #[arg(long)]
    max_categories: Option<usize>,

    #[arg(long, default_value_t = MAX_PRODUCTS_PER_CATEGORY)]
    max_products: usize,

    /// Pause between category pages
    #[arg(long, default_value_t = CATEGORY_DELAY.as_secs())]
    delay_secs: u64,
}

#[derive(Args, Clone)]
struct NormalizeArgs {
    /// Raw dump to read (defaults to the scrape output)
    #[arg(long)]
    input: Option<PathBuf>,

    #[arg(long, default_value_os_t = default_path(CATALOG_FILE))]
    catalog: PathBuf,

    #[arg(long, default_value_os_t = default_path(CATEGORIES_FILE))]
    categories: PathBuf,

    /// Copy the current files to a backups/ folder first
    #[arg(long)]
    backup: bool,

    /// Seed for reproducible SEO copy
    #[arg(long)]
    seed: Option<u64>,

    /// Mark the first N new products as featured
    #[arg(long, default_value_t = 0)]
    feature_first: usize,

    /// JSON settings (taxonomy, templates, matching, brand)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Download product images here
    #[arg(long)]
    images_dir: Option<PathBuf>,
}

fn default_path(file: &str) -> PathBuf {
    Path::new(DATA_DIR).join(file)
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(p) => Settings::load(p).with_context(|| format!("loading settings from {}", p.display())),
        None => Ok(Settings::default()),
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "s" | "si"))
}

async fn scrape(args: &ScrapeArgs) -> Result<()> {
    let Some(profile) = SourceProfile::preset(&args.source) else {
        bail!(
            "unknown source `{}` (available: {})",
            args.source,
            SourceProfile::preset_names().join(", ")
        );
    };
    let limits = CrawlLimits {
        max_categories: args.max_categories,
        max_products_per_category: args.max_products,
        delay: Duration::from_secs(args.delay_secs),
    };
    let summary = pipeline::run_scrape(profile, &args.out, &limits).await?;
    if !summary.categories_failed.is_empty() {
        warn!("Categories skipped: {}", summary.categories_failed.join(", "));
    }
    Ok(())
}

async fn normalize(args: &NormalizeArgs, raw: PathBuf) -> Result<NormalizeOutcome> {
    let ctx = NormalizeContext {
        settings: load_settings(args.config.as_deref())?,
        seed: args.seed,
        feature_first: args.feature_first,
    };
    let mut paths = NormalizePaths {
        raw,
        catalog: args.catalog.clone(),
        categories: args.categories.clone(),
        backup_dir: None,
    };
    if args.backup {
        paths = paths.with_default_backups();
    }

    let mut outcome = pipeline::load_and_normalize(&paths, &ctx)
        .with_context(|| format!("normalizing {}", paths.raw.display()))?;

    if let Some(dir) = &args.images_dir {
        let fetcher = Fetcher::new()?;
        let stats = download_images(&fetcher, &mut outcome.products, dir, Duration::ZERO).await;
        info!(
            "Images: {} downloaded, {} skipped, {} failed",
            stats.downloaded, stats.skipped, stats.failed
        );
        outcome.categories =
            build_categories(&outcome.products, &ctx.settings.taxonomy, &ctx.settings.brand);
    }

    pipeline::save(&outcome, &paths)?;
    let s = outcome.stats;
    info!(
        "Normalized {} raw records: {} new, {} merged, {} discarded; catalog has {} products in {} categories",
        s.raw, s.inserted, s.merged, s.discarded, s.total, s.categories
    );
    Ok(outcome)
}

fn stats(catalog: &Path, csv: Option<&Path>, config: Option<&Path>) -> Result<()> {
    let settings = load_settings(config)?;
    let products = read_catalog(catalog).with_context(|| format!("reading {}", catalog.display()))?;
    let report = CatalogReport::build(&products, &settings.taxonomy);
    println!("{report}");
    if let Some(path) = csv {
        report.write_csv(path)?;
        println!("Saved to {}", path.display());
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Scrape(args) => scrape(&args).await,
        Commands::Normalize(args) => {
            let raw = args.input.clone().unwrap_or_else(|| default_path(RAW_FILE));
            normalize(&args, raw).await.map(|_| ())
        }
        Commands::Pipeline { scrape: s, normalize: n, yes } => {
            if !yes && !confirm(&format!("Scrape `{}` and update {}?", s.source, n.catalog.display()))? {
                println!("Cancelled.");
                return Ok(());
            }

            println!("--- Step 1/2: scrape ---");
            if let Err(e) = scrape(&s).await {
                if !s.out.exists() {
                    return Err(e.context("scrape failed and there is no previous raw dump"));
                }
                warn!("Scrape failed ({:#}); continuing with the previous dump at {}", e, s.out.display());
            }

            println!("--- Step 2/2: normalize ---");
            let raw = n.input.clone().unwrap_or_else(|| s.out.clone());
            normalize(&n, raw).await.map(|_| ())
        }
        Commands::Stats { catalog, csv, config } => stats(&catalog, csv.as_deref(), config.as_deref()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("An error occurred: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
