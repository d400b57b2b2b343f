// src/catalog.rs
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::classify::Taxonomy;
use crate::config::{BrandConfig, SEO_DESCRIPTION_MAX, SEO_TITLE_MAX};
use crate::error::{Result, ScraperError};
use crate::model::{Category, NormalizedProduct};
use crate::seo::truncate_with_ellipsis;

// --- JSON files ---

/// Reads a JSON array that must exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Err(ScraperError::MissingInput(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Writes pretty JSON through a temp file in the same directory, then renames
/// it over `path` so a crash never leaves a truncated file behind.
pub fn write_json<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "catalog.json".to_string());
    let tmp = dir.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    let result = (|| -> Result<()> {
        let mut out = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer_pretty(&mut out, items)?;
        out.write_all(b"\n")?;
        out.flush()?;
        out.get_ref().sync_all()?;
        Ok(())
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path)?;
    debug!("wrote {} records to {}", items.len(), path.display());
    Ok(())
}

pub fn read_catalog(path: &Path) -> Result<Vec<NormalizedProduct>> {
    read_json(path)
}

/// Existing catalog, or an empty one on the first run.
pub fn read_catalog_or_empty(path: &Path) -> Result<Vec<NormalizedProduct>> {
    match read_catalog(path) {
        Err(ScraperError::MissingInput(p)) => {
            info!("No existing catalog at {}, starting empty", p.display());
            Ok(Vec::new())
        }
        other => other,
    }
}

pub fn write_catalog(path: &Path, products: &[NormalizedProduct]) -> Result<()> {
    write_json(path, products)
}

pub fn write_categories(path: &Path, categories: &[Category]) -> Result<()> {
    write_json(path, categories)
}

/// Copies `path` to `{dir}/{stem}_backup_{YYYYmmdd_HHMMSS}.json`. Returns
/// `None` when there is nothing to back up yet.
pub fn backup(path: &Path, dir: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    fs::create_dir_all(dir)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "catalog".to_string());
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let mut target = dir.join(format!("{stem}_backup_{stamp}.json"));

    // two backups inside the same second
    let mut n = 1;
    while target.exists() {
        target = dir.join(format!("{stem}_backup_{stamp}_{n}.json"));
        n += 1;
    }

    fs::copy(path, &target)?;
    info!("[BACKUP] {} -> {}", path.display(), target.display());
    Ok(Some(target))
}

// --- Category aggregates ---

/// One entry per category present in `products`, most populated first.
pub fn build_categories(
    products: &[NormalizedProduct],
    taxonomy: &Taxonomy,
    brand: &BrandConfig,
) -> Vec<Category> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut images: HashMap<&str, &str> = HashMap::new();

    for p in products {
        let id = p.category_id.as_str();
        let count = counts.entry(id).or_insert_with(|| {
            order.push(id);
            0
        });
        *count += 1;
        if let Some(img) = p.images.iter().find(|i| !i.is_empty()) {
            images.entry(id).or_insert(img.as_str());
        }
    }

    let mut categories: Vec<Category> = order
        .into_iter()
        .map(|id| {
            let name = taxonomy.display_name(id);
            let lower = name.to_lowercase();
            let (icon, color) = match taxonomy.rule(id) {
                Some(r) => (r.icon.clone(), r.color.clone()),
                None => ("Package".to_string(), "#64748b".to_string()),
            };
            Category {
                id: id.to_string(),
                slug: id.to_string(),
                description: format!(
                    "Descubre {lower} personalizados con tu logo. Alta calidad y entrega rápida en {}.",
                    brand.region
                ),
                icon,
                color,
                story: format!(
                    "Ofrecemos {lower} promocionales de calidad premium, diseñados para que tu marca destaque. Personalización profesional garantizada."
                ),
                seo_title: truncate_with_ellipsis(
                    &format!("{name} {} | {}", brand.region, brand.short_name),
                    SEO_TITLE_MAX,
                ),
                seo_description: truncate_with_ellipsis(
                    &format!(
                        "{name} personalizados con logo. Alta calidad. Envíos en {}. ¡Cotiza por WhatsApp!",
                        brand.region
                    ),
                    SEO_DESCRIPTION_MAX,
                ),
                benefits: brand.category_benefits.clone(),
                image: images.get(id).map(|s| s.to_string()).unwrap_or_default(),
                product_count: counts[id],
                name,
            }
        })
        .collect();

    // stable: ties keep first-seen order
    categories.sort_by(|a, b| b.product_count.cmp(&a.product_count));
    categories
}
