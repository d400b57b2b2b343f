// src/config.rs
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::Taxonomy;
use crate::error::{Result, ScraperError};
use crate::merge::MatchPolicy;
use crate::seo::SeoTemplates;

// --- Configuration ---
pub const MAX_RETRIES: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_secs(2);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const CATEGORY_DELAY: Duration = Duration::from_secs(2);
pub const MAX_PRODUCTS_PER_CATEGORY: usize = 200;
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const MIN_NAME_LEN: usize = 3;
pub const MAX_ID_LEN: usize = 60;
pub const MAX_FEATURES: usize = 6;
pub const SEO_TITLE_MAX: usize = 60;
pub const SEO_DESCRIPTION_MAX: usize = 155;
pub const DEFAULT_CATEGORY_ID: &str = "variedades";

pub const DATA_DIR: &str = "data";
pub const RAW_FILE: &str = "productos_scraped.json";
pub const CATALOG_FILE: &str = "products.json";
pub const CATEGORIES_FILE: &str = "categories.json";
pub const BACKUP_DIR: &str = "backups";
pub const IMAGE_URL_PREFIX: &str = "/img/productos";

/// Store-facing strings that end up inside generated copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandConfig {
    pub store_name: String,
    pub short_name: String,
    pub region: String,
    pub contact_template: String,
    pub category_benefits: Vec<String>,
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            store_name: "KS Promocionales".to_string(),
            short_name: "KS".to_string(),
            region: "Ecuador".to_string(),
            contact_template: "Hola! Me interesa el {name}. ¿Podrían enviarme más información sobre personalización y cantidades mínimas?".to_string(),
            category_benefits: vec![
                "Personalización con tu logo".to_string(),
                "Alta calidad garantizada".to_string(),
                "Envíos en Ecuador".to_string(),
                "Precios competitivos".to_string(),
            ],
        }
    }
}

impl BrandConfig {
    pub fn contact_message(&self, name: &str) -> String {
        self.contact_template.replace("{name}", name)
    }
}

/// Everything the normalize stage treats as data rather than code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub taxonomy: Taxonomy,
    pub templates: SeoTemplates,
    pub matching: MatchPolicy,
    pub brand: BrandConfig,
}

impl Settings {
    /// Reads a JSON settings file; sections left out keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ScraperError::MissingInput(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.matching.overlap_threshold;
        if !(0.0..=1.0).contains(t) {
            return Err(ScraperError::Config(format!(
                "matching.overlap_threshold must be within 0..=1, got {t}"
            )));
        }
        if self.taxonomy.default_id.is_empty() {
            return Err(ScraperError::Config("taxonomy.default_id is empty".into()));
        }
        for rule in &self.taxonomy.rules {
            if crate::slug::slugify(&rule.id) != rule.id {
                return Err(ScraperError::Config(format!(
                    "category id `{}` is not a slug",
                    rule.id
                )));
            }
        }
        Ok(())
    }
}
