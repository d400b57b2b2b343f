// src/pipeline.rs
//! Stage drivers. Scrape dumps raw records; normalize takes those plus the
//! existing catalog and writes the merged catalog and recomputed categories.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::catalog::{self, build_categories};
use crate::config::{BACKUP_DIR, CATALOG_FILE, CATEGORIES_FILE, DATA_DIR, RAW_FILE, Settings};
use crate::crawl::{crawl, CrawlLimits, CrawlSummary};
use crate::error::Result;
use crate::extract::{Discard, Extractor, SlugRegistry};
use crate::fetch::Fetcher;
use crate::merge::{Merger, Outcome};
use crate::model::{Category, NormalizedProduct, RawScrapedRecord};
use crate::seo::SeoGenerator;
use crate::source::{SelectorSource, SourceProfile};

/// Scrapes one source and dumps the raw records to `out`.
pub async fn run_scrape(
    profile: SourceProfile,
    out: &Path,
    limits: &CrawlLimits,
) -> Result<CrawlSummary> {
    let fetcher = Fetcher::new()?;
    let source = SelectorSource::new(profile)?;
    let (records, summary) = crawl(&fetcher, &source, limits).await?;

    catalog::write_json(out, &records)?;
    info!(
        "Scraped {} records from {}/{} categories into {}",
        summary.records,
        summary.categories_scraped,
        summary.categories_found,
        out.display()
    );
    Ok(summary)
}

#[derive(Debug, Clone, Default)]
pub struct NormalizeContext {
    pub settings: Settings,
    /// Fixed seed for reproducible copy; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// The first this-many records inserted by a run are marked `featured`.
    pub feature_first: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub raw: usize,
    pub discarded: usize,
    pub inserted: usize,
    pub merged: usize,
    pub total: usize,
    pub categories: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOutcome {
    pub products: Vec<NormalizedProduct>,
    pub categories: Vec<Category>,
    pub stats: NormalizeStats,
}

pub fn normalize(
    raw: &[RawScrapedRecord],
    existing: Vec<NormalizedProduct>,
    ctx: &NormalizeContext,
) -> NormalizeOutcome {
    let s = &ctx.settings;
    let mut seo = match ctx.seed {
        Some(seed) => SeoGenerator::seeded(&s.templates, &s.brand, &s.taxonomy, seed),
        None => SeoGenerator::from_entropy(&s.templates, &s.brand, &s.taxonomy),
    };
    let extractor = Extractor::new(&s.taxonomy);
    let merger = Merger::new(&s.matching);

    let mut registry = SlugRegistry::seeded(&existing);
    let mut products = existing;
    let mut stats = NormalizeStats { raw: raw.len(), ..Default::default() };

    for record in raw {
        let candidate = match extractor.extract(record, &mut registry) {
            Ok(p) => p,
            Err(Discard::NameTooShort(name)) => {
                debug!("discarded, name too short: {:?}", name);
                stats.discarded += 1;
                continue;
            }
            Err(Discard::EmptySlug(name)) => {
                warn!("discarded, no usable slug: {:?}", name);
                stats.discarded += 1;
                continue;
            }
        };

        let feature = stats.inserted < ctx.feature_first;
        let prepare = |p: &mut NormalizedProduct| {
            seo.fill(p);
            p.featured = feature;
        };
        match merger.absorb(&mut products, candidate, prepare) {
            Outcome::Merged(_) => stats.merged += 1,
            Outcome::Inserted(i) => {
                debug!("[NEW] {} ({})", products[i].name, products[i].category_id);
                stats.inserted += 1;
            }
        }
    }

    let categories = build_categories(&products, &s.taxonomy, &s.brand);
    stats.total = products.len();
    stats.categories = categories.len();

    NormalizeOutcome { products, categories, stats }
}

/// Where the normalize stage reads and writes.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizePaths {
    pub raw: PathBuf,
    pub catalog: PathBuf,
    pub categories: PathBuf,
    /// Back up both output files here before overwriting them.
    pub backup_dir: Option<PathBuf>,
}

impl Default for NormalizePaths {
    fn default() -> Self {
        let data = PathBuf::from(DATA_DIR);
        Self {
            raw: data.join(RAW_FILE),
            catalog: data.join(CATALOG_FILE),
            categories: data.join(CATEGORIES_FILE),
            backup_dir: None,
        }
    }
}

impl NormalizePaths {
    pub fn with_default_backups(mut self) -> Self {
        let base = self
            .catalog
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default();
        self.backup_dir = Some(base.join(BACKUP_DIR));
        self
    }
}

/// Reads the raw dump and the current catalog, then normalizes.
pub fn load_and_normalize(paths: &NormalizePaths, ctx: &NormalizeContext) -> Result<NormalizeOutcome> {
    let raw: Vec<RawScrapedRecord> = catalog::read_json(&paths.raw)?;
    info!("Loaded {} raw records from {}", raw.len(), paths.raw.display());

    let existing = catalog::read_catalog_or_empty(&paths.catalog)?;
    info!("Existing catalog: {} products", existing.len());

    Ok(normalize(&raw, existing, ctx))
}

/// Backs up (when asked) and writes the catalog and category files.
pub fn save(outcome: &NormalizeOutcome, paths: &NormalizePaths) -> Result<()> {
    if let Some(dir) = &paths.backup_dir {
        catalog::backup(&paths.catalog, dir)?;
        catalog::backup(&paths.categories, dir)?;
    }
    catalog::write_catalog(&paths.catalog, &outcome.products)?;
    catalog::write_categories(&paths.categories, &outcome.categories)?;
    info!(
        "Saved {} products to {} and {} categories to {}",
        outcome.products.len(),
        paths.catalog.display(),
        outcome.categories.len(),
        paths.categories.display()
    );
    Ok(())
}

pub fn run_normalize(paths: &NormalizePaths, ctx: &NormalizeContext) -> Result<NormalizeOutcome> {
    let outcome = load_and_normalize(paths, ctx)?;
    save(&outcome, paths)?;
    Ok(outcome)
}
