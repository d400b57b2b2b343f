// src/report.rs
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use csv::Writer;

use crate::classify::Taxonomy;
use crate::error::Result;
use crate::model::NormalizedProduct;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryStats {
    pub id: String,
    pub name: String,
    pub products: usize,
    pub with_images: usize,
    pub with_copy: usize,
}

impl CategoryStats {
    fn to_csv_record(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.products.to_string(),
            self.with_images.to_string(),
            self.with_copy.to_string(),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogReport {
    pub categories: Vec<CategoryStats>,
    pub total: usize,
    pub with_images: usize,
    pub featured: usize,
    pub bestsellers: usize,
}

impl CatalogReport {
    pub fn build(products: &[NormalizedProduct], taxonomy: &Taxonomy) -> Self {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut report = CatalogReport { total: products.len(), ..Default::default() };

        for p in products {
            let slot = *index.entry(p.category_id.as_str()).or_insert_with(|| {
                report.categories.push(CategoryStats {
                    id: p.category_id.clone(),
                    name: taxonomy.display_name(&p.category_id),
                    products: 0,
                    with_images: 0,
                    with_copy: 0,
                });
                report.categories.len() - 1
            });
            let stats = &mut report.categories[slot];
            stats.products += 1;
            if p.has_images() {
                stats.with_images += 1;
                report.with_images += 1;
            }
            if !p.short_description.is_empty() && !p.features.is_empty() {
                stats.with_copy += 1;
            }
            report.featured += usize::from(p.featured);
            report.bestsellers += usize::from(p.bestseller);
        }

        report.categories.sort_by(|a, b| b.products.cmp(&a.products));
        report
    }

    /// Percentage of products with at least one image.
    pub fn image_coverage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.with_images as f64 * 100.0 / self.total as f64
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut wtr = Writer::from_path(path)?;
        wtr.write_record(["Category ID", "Category", "Products", "With Images", "With Copy"])?;
        for c in &self.categories {
            wtr.write_record(&c.to_csv_record())?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl fmt::Display for CatalogReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<28} {:>8} {:>8}", "Category", "Products", "Images")?;
        for c in &self.categories {
            writeln!(f, "{:<28} {:>8} {:>8}", c.name, c.products, c.with_images)?;
        }
        writeln!(f, "{}", "-".repeat(46))?;
        writeln!(f, "Total products: {}", self.total)?;
        writeln!(f, "Image coverage: {:.1}%", self.image_coverage())?;
        write!(f, "Featured: {}  Bestsellers: {}", self.featured, self.bestsellers)
    }
}
